//! Consent and anti-repeat gate
//!
//! Two kinds of persisted boolean flag decide whether a flow may run:
//! - **anti-repeat** (`freeWebsiteOfferShown`): the flow runs at most once per
//!   profile; once set, only clearing storage re-enables it
//! - **consent** (`analyticsConsent`): the flow runs on every qualifying page
//!   view, but only after the visitor opted in
//!
//! Flags are stored as the string `"true"`; absence means false. The gate
//! never resets a flag that is already `"true"`.

use ofemo_common::{KeyValueStore, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Popup shown once per profile
pub const OFFER_SHOWN_FLAG: &str = "freeWebsiteOfferShown";

/// Visitor opted in to analytics
pub const ANALYTICS_CONSENT_FLAG: &str = "analyticsConsent";

const TRUE: &str = "true";
const FALSE: &str = "false";

/// How a flag gates its flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Runs until the flag is set
    AntiRepeat,
    /// Runs only while the flag is set
    Consent,
}

/// Kind of a known flag; unknown names are treated as anti-repeat flags
pub fn flag_kind(flag: &str) -> FlagKind {
    match flag {
        ANALYTICS_CONSENT_FLAG => FlagKind::Consent,
        _ => FlagKind::AntiRepeat,
    }
}

/// Recorded analytics consent decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentStatus {
    Granted,
    Declined,
    Unset,
}

/// Flag gate over an injected store
#[derive(Clone)]
pub struct FlowGate {
    store: Arc<dyn KeyValueStore>,
}

impl FlowGate {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn is_set(&self, flag: &str) -> bool {
        self.store.get(flag).as_deref() == Some(TRUE)
    }

    /// Whether the flow gated by `flag` may run now
    pub fn may_run(&self, flag: &str) -> bool {
        match flag_kind(flag) {
            FlagKind::AntiRepeat => !self.is_set(flag),
            FlagKind::Consent => self.is_set(flag),
        }
    }

    /// Record that `flag` is true (idempotent)
    pub fn mark_run(&self, flag: &str) -> Result<()> {
        if self.is_set(flag) {
            return Ok(());
        }
        self.store.set(flag, TRUE)?;
        debug!(flag, "Flag set");
        Ok(())
    }

    /// Visitor tracking gate: consent only, independent of anti-repeat flags
    pub fn may_track(&self) -> bool {
        self.may_run(ANALYTICS_CONSENT_FLAG)
    }

    /// Offer popup gate
    pub fn may_show_offer(&self) -> bool {
        self.may_run(OFFER_SHOWN_FLAG)
    }

    /// Store the visitor's answer to the cookie banner
    ///
    /// A decline never overwrites an earlier grant.
    pub fn record_consent(&self, granted: bool) -> Result<()> {
        if granted {
            self.mark_run(ANALYTICS_CONSENT_FLAG)?;
            info!("Analytics consent granted");
            return Ok(());
        }

        if self.is_set(ANALYTICS_CONSENT_FLAG) {
            info!("Analytics consent already granted, decline ignored");
            return Ok(());
        }
        self.store.set(ANALYTICS_CONSENT_FLAG, FALSE)?;
        info!("Analytics consent declined");
        Ok(())
    }

    pub fn consent_status(&self) -> ConsentStatus {
        match self.store.get(ANALYTICS_CONSENT_FLAG).as_deref() {
            Some(TRUE) => ConsentStatus::Granted,
            Some(_) => ConsentStatus::Declined,
            None => ConsentStatus::Unset,
        }
    }
}
