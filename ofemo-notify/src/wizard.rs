//! Free-website offer popup: wizard state machine and exit-intent trigger
//!
//! Wizard states:
//! `Editing(One) → Editing(Two) → Editing(Three) → Submitting → Submitted → Closed`
//!
//! - `next` is guarded by the current step's required fields
//! - `prev` is unconstrained (steps 2 and 3 only)
//! - submitting is only possible from step 3, so a submit from step 1 or 2
//!   is rejected without changing state
//! - a failed delivery lands in `Failed`, which keeps the form contents and
//!   allows edit, back, resubmit or close
//! - `Submitted` closes itself after [`CONFIRMATION_DISPLAY`]
//! - `close` works from any state and discards the form contents

use crate::channel::{DeliveryFailure, DeliveryResult};
use crate::coordinator::{Dispatcher, SubmissionReport};
use crate::gate::{FlowGate, OFFER_SHOWN_FLAG};
use crate::payload::{is_complete, missing_fields, OfferPayload};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long the confirmation view stays before the popup closes itself
pub const CONFIRMATION_DISPLAY: Duration = Duration::from_secs(5);

/// Pointer must stay outside the viewport this long before the popup opens
pub const EXIT_INTENT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    /// Basic information (name, email, phone)
    One,
    /// Contact and social details (address, profile link)
    Two,
    /// Professional details (description, summary)
    Three,
}

impl WizardStep {
    pub const COUNT: u8 = 3;

    pub fn number(&self) -> u8 {
        match self {
            WizardStep::One => 1,
            WizardStep::Two => 2,
            WizardStep::Three => 3,
        }
    }

    fn next(&self) -> Option<WizardStep> {
        match self {
            WizardStep::One => Some(WizardStep::Two),
            WizardStep::Two => Some(WizardStep::Three),
            WizardStep::Three => None,
        }
    }

    fn prev(&self) -> Option<WizardStep> {
        match self {
            WizardStep::One => None,
            WizardStep::Two => Some(WizardStep::One),
            WizardStep::Three => Some(WizardStep::Two),
        }
    }
}

/// Wizard state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Editing(WizardStep),
    Submitting,
    Submitted { at: Instant },
    Failed { cause: Option<DeliveryFailure> },
    Closed,
}

impl WizardState {
    fn name(&self) -> &'static str {
        match self {
            WizardState::Editing(WizardStep::One) => "on step 1",
            WizardState::Editing(WizardStep::Two) => "on step 2",
            WizardState::Editing(WizardStep::Three) => "on step 3",
            WizardState::Submitting => "submitting",
            WizardState::Submitted { .. } => "submitted",
            WizardState::Failed { .. } => "failed",
            WizardState::Closed => "closed",
        }
    }
}

/// Rejected wizard action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Step {step} incomplete, missing: {}", .missing.join(", "))]
    StepIncomplete {
        step: u8,
        missing: Vec<&'static str>,
    },

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Unknown form field: {0}")]
    UnknownField(String),
}

/// Multi-step offer form
#[derive(Debug, Clone)]
pub struct OfferWizard {
    state: WizardState,
    fields: OfferPayload,
}

impl Default for OfferWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl OfferWizard {
    pub fn new() -> Self {
        Self {
            state: WizardState::Editing(WizardStep::One),
            fields: OfferPayload::default(),
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn fields(&self) -> &OfferPayload {
        &self.fields
    }

    pub fn is_open(&self) -> bool {
        self.state != WizardState::Closed
    }

    fn invalid(&self, action: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// Update one input by its form name (e.g. `fullName`)
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), WizardError> {
        match self.state {
            WizardState::Editing(_) | WizardState::Failed { .. } => {}
            _ => return Err(self.invalid("edit fields")),
        }
        let slot = self
            .fields
            .field_mut(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        *slot = value.into();
        Ok(())
    }

    /// Advance one step if the current step is complete
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let WizardState::Editing(step) = self.state else {
            return Err(self.invalid("advance"));
        };
        let Some(next) = step.next() else {
            return Err(self.invalid("advance"));
        };

        let missing = missing_fields(&self.fields, step.number());
        if !missing.is_empty() {
            return Err(WizardError::StepIncomplete {
                step: step.number(),
                missing,
            });
        }

        self.state = WizardState::Editing(next);
        debug!(step = next.number(), "Offer wizard advanced");
        Ok(next)
    }

    /// Go back one step; from `Failed`, return to step 3
    pub fn prev(&mut self) -> Result<WizardStep, WizardError> {
        let target = match self.state {
            WizardState::Editing(step) => step.prev(),
            WizardState::Failed { .. } => Some(WizardStep::Three),
            _ => None,
        };
        let Some(target) = target else {
            return Err(self.invalid("go back"));
        };
        self.state = WizardState::Editing(target);
        Ok(target)
    }

    /// Enter `Submitting` and hand out the payload snapshot
    pub fn begin_submit(&mut self) -> Result<OfferPayload, WizardError> {
        match self.state {
            WizardState::Editing(WizardStep::Three) | WizardState::Failed { .. } => {}
            _ => return Err(self.invalid("submit")),
        }

        for step in 1..=WizardStep::COUNT {
            if !is_complete(&self.fields, step) {
                return Err(WizardError::StepIncomplete {
                    step,
                    missing: missing_fields(&self.fields, step),
                });
            }
        }

        self.state = WizardState::Submitting;
        Ok(self.fields.clone())
    }

    /// Apply the coordinator's result
    pub fn finish_submit(&mut self, result: &DeliveryResult, now: Instant) -> Result<(), WizardError> {
        if self.state != WizardState::Submitting {
            return Err(self.invalid("finish submitting"));
        }

        self.state = if result.success {
            info!("Free website request submitted");
            WizardState::Submitted { at: now }
        } else {
            warn!(cause = ?result.error, "Free website request failed");
            WizardState::Failed {
                cause: result.error.clone(),
            }
        };
        Ok(())
    }

    /// Submit through `dispatcher` (begin, dispatch, finish)
    pub async fn submit(&mut self, dispatcher: &Dispatcher) -> Result<SubmissionReport, WizardError> {
        let payload = self.begin_submit()?;
        let report = dispatcher.dispatch(payload.into()).await;
        self.finish_submit(&report.delivery, Instant::now())?;
        Ok(report)
    }

    /// Close from any state, discarding in-progress input
    pub fn close(&mut self) {
        if self.state != WizardState::Closed {
            debug!(state = self.state.name(), "Offer wizard closed");
        }
        self.state = WizardState::Closed;
        self.fields = OfferPayload::default();
    }

    /// Close the confirmation view once it has been shown long enough
    pub fn poll_auto_close(&mut self, now: Instant) -> bool {
        match self.state {
            WizardState::Submitted { at }
                if now.saturating_duration_since(at) >= CONFIRMATION_DISPLAY =>
            {
                self.close();
                true
            }
            _ => false,
        }
    }

    /// Progress bar value, `round(step / 3 * 100)`
    pub fn progress_percent(&self) -> u8 {
        let step = match self.state {
            WizardState::Editing(step) => step.number(),
            _ => WizardStep::COUNT,
        };
        ((step as f64 / WizardStep::COUNT as f64) * 100.0).round() as u8
    }
}

/// Opens the offer popup when the pointer leaves through the top edge
///
/// Fires at most once per profile: firing sets the anti-repeat flag.
pub struct ExitIntentTrigger {
    gate: FlowGate,
    armed_at: Option<Instant>,
    showing: bool,
}

impl ExitIntentTrigger {
    pub fn new(gate: FlowGate) -> Self {
        Self {
            gate,
            armed_at: None,
            showing: false,
        }
    }

    /// Pointer left the document; arms the debounce for exits at or above the top edge
    pub fn pointer_left(&mut self, client_y: f64, now: Instant) -> bool {
        if client_y > 0.0 || self.showing || !self.gate.may_show_offer() {
            return false;
        }
        if self.armed_at.is_none() {
            self.armed_at = Some(now);
        }
        true
    }

    /// Pointer came back before the debounce elapsed
    pub fn pointer_entered(&mut self) {
        self.armed_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    /// Fire if armed long enough; returns true exactly when the popup opens
    pub fn poll(&mut self, now: Instant) -> ofemo_common::Result<bool> {
        let Some(armed_at) = self.armed_at else {
            return Ok(false);
        };
        if now.saturating_duration_since(armed_at) < EXIT_INTENT_DEBOUNCE {
            return Ok(false);
        }

        self.armed_at = None;
        if !self.gate.may_show_offer() {
            return Ok(false);
        }

        self.gate.mark_run(OFFER_SHOWN_FLAG)?;
        self.showing = true;
        info!("Exit intent detected, showing free website offer");
        Ok(true)
    }

    /// Popup closed by the visitor
    pub fn dismiss(&mut self) {
        self.showing = false;
    }
}
