//! ofemo-notify library interface
//!
//! Submission pipeline for the site's forms: payload validation, primary
//! and fallback delivery channels, the fallback coordinator, the messaging
//! deep link, the consent/anti-repeat gate and the offer wizard.

pub mod channel;
pub mod config;
pub mod coordinator;
pub mod deep_link;
pub mod error;
pub mod flows;
pub mod gate;
pub mod payload;
pub mod wizard;

pub use crate::channel::{DeliveryChannel, DeliveryFailure, DeliveryResult};
pub use crate::coordinator::{Dispatcher, FallbackCoordinator, SideChannelOutcome, SubmissionReport};
pub use crate::error::{NotifyError, NotifyResult};
pub use crate::gate::FlowGate;
pub use crate::payload::{Flow, FormFields, SubmissionPayload};
pub use crate::wizard::{ExitIntentTrigger, OfferWizard, WizardState, WizardStep};
