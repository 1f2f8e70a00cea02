//! Named submission flows
//!
//! Each flow checks required fields before anything touches the network,
//! then hands the payload to the dispatcher. Visitor tracking additionally
//! requires analytics consent and silently does nothing without it.

use crate::coordinator::{Dispatcher, SubmissionReport};
use crate::error::{NotifyError, NotifyResult};
use crate::gate::FlowGate;
use crate::payload::{
    is_fully_complete, missing_fields, ContactPayload, FormFields, LeadCapturePayload,
    NewsletterPayload, OfferPayload, SubmissionPayload, VisitorPayload,
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sessions shorter than this are not worth reporting
pub const SESSION_REPORT_THRESHOLD: Duration = Duration::from_secs(10);

fn ensure_complete<P: FormFields>(payload: &P) -> NotifyResult<()> {
    if is_fully_complete(payload) {
        return Ok(());
    }
    let flow = payload.flow();
    let missing = (1..=flow.step_count())
        .flat_map(|step| missing_fields(payload, step))
        .collect();
    Err(NotifyError::Incomplete { flow, missing })
}

async fn validated<P>(dispatcher: &Dispatcher, payload: P) -> NotifyResult<SubmissionReport>
where
    P: FormFields + Into<SubmissionPayload>,
{
    ensure_complete(&payload)?;
    Ok(dispatcher.dispatch(payload.into()).await)
}

/// Contact section form
pub async fn contact(dispatcher: &Dispatcher, payload: ContactPayload) -> NotifyResult<SubmissionReport> {
    validated(dispatcher, payload).await
}

/// Newsletter subscription
pub async fn newsletter(
    dispatcher: &Dispatcher,
    payload: NewsletterPayload,
) -> NotifyResult<SubmissionReport> {
    validated(dispatcher, payload).await
}

/// Lead capture popup
pub async fn lead_capture(
    dispatcher: &Dispatcher,
    payload: LeadCapturePayload,
) -> NotifyResult<SubmissionReport> {
    validated(dispatcher, payload).await
}

/// Free-website request submitted without going through the wizard
pub async fn offer(dispatcher: &Dispatcher, payload: OfferPayload) -> NotifyResult<SubmissionReport> {
    validated(dispatcher, payload).await
}

/// Page view ping; `Ok(None)` when the visitor has not consented
pub async fn track_visit(
    dispatcher: &Dispatcher,
    gate: &FlowGate,
    payload: VisitorPayload,
) -> NotifyResult<Option<SubmissionReport>> {
    if !gate.may_track() {
        debug!("No analytics consent, visit not tracked");
        return Ok(None);
    }
    validated(dispatcher, payload).await.map(Some)
}

/// Time on page, reported locally when long enough
#[derive(Debug, Clone, Copy)]
pub struct VisitSession {
    started_at: Instant,
}

impl VisitSession {
    pub fn start(now: Instant) -> Self {
        Self { started_at: now }
    }

    /// End the session; logs and returns the duration if above the threshold
    pub fn end(self, now: Instant) -> Option<Duration> {
        let duration = now.saturating_duration_since(self.started_at);
        if duration > SESSION_REPORT_THRESHOLD {
            info!(duration_secs = duration.as_secs(), "Session duration");
            Some(duration)
        } else {
            None
        }
    }
}
