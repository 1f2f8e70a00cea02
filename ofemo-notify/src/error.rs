//! Error types for ofemo-notify
//!
//! Delivery failures are not errors in this sense: channel clients fold them
//! into `DeliveryResult`. `NotifyError` covers everything that stops a
//! submission before it reaches the network (incomplete input, wizard misuse,
//! client construction, flag store I/O).

use crate::payload::Flow;
use crate::wizard::WizardError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Required fields missing; nothing was sent
    #[error("Incomplete {flow} submission, missing: {}", .missing.join(", "))]
    Incomplete {
        flow: Flow,
        missing: Vec<&'static str>,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Illegal wizard transition or unknown form field
    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    /// ofemo-common error (flag store, config)
    #[error("Common error: {0}")]
    Common(#[from] ofemo_common::Error),
}

/// Result type for submission flows
pub type NotifyResult<T> = Result<T, NotifyError>;
