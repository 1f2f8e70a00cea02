//! Delivery channel clients
//!
//! A channel is one external delivery mechanism. Every channel call resolves
//! to a [`DeliveryResult`]; transport errors, deadlines, non-2xx statuses,
//! malformed bodies and remote-reported failures all collapse into
//! `success: false`. The [`DeliveryFailure`] variant is kept for logging only,
//! callers must not branch on it.
//!
//! # Channels
//! 1. **server** - site's own PHP handlers (primary)
//! 2. **emailjs** - EmailJS transactional API (fallback)

pub mod emailjs;
pub mod server;

pub use emailjs::EmailJsChannel;
pub use server::ServerChannel;

use crate::error::NotifyError;
use crate::payload::{Flow, FormFields, SubmissionPayload};
use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub(crate) const USER_AGENT: &str = "ofemo-notify/0.1.0 (https://ofemo.uk)";

/// Why a single channel call did not deliver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    /// Network unreachable, connection reset, TLS failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Explicit per-call deadline elapsed
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Remote answered but did not accept the submission
    #[error("Remote rejection{}: {message}", status_suffix(&.status))]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// 2xx response whose body could not be interpreted
    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

/// Outcome of a channel call or of a whole coordinated submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub success: bool,
    pub error: Option<DeliveryFailure>,
}

impl DeliveryResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(cause: DeliveryFailure) -> Self {
        Self {
            success: false,
            error: Some(cause),
        }
    }
}

impl From<Result<(), DeliveryFailure>> for DeliveryResult {
    fn from(result: Result<(), DeliveryFailure>) -> Self {
        match result {
            Ok(()) => DeliveryResult::succeeded(),
            Err(cause) => DeliveryResult::failed(cause),
        }
    }
}

/// One delivery mechanism
///
/// Implementations never return an error: every failure mode is reported
/// through `DeliveryResult { success: false, .. }`.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Channel name for provenance in logs
    fn name(&self) -> &'static str;

    async fn send(&self, payload: &SubmissionPayload) -> DeliveryResult;
}

/// JSON reply shape shared by the site handlers: `{ success, message? }`
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Build the shared HTTP client with transport timeout equal to the deadline
pub(crate) fn build_http_client(deadline: Duration) -> Result<reqwest::Client, NotifyError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(deadline)
        .build()
        .map_err(|e| NotifyError::HttpClient(e.to_string()))
}

/// Map a reqwest error to transport failure, keeping timeouts distinct
pub(crate) fn transport_failure(err: reqwest::Error, deadline: Duration) -> DeliveryFailure {
    if err.is_timeout() {
        DeliveryFailure::Timeout(deadline)
    } else {
        DeliveryFailure::Transport(err.to_string())
    }
}

/// Run one channel attempt under an explicit deadline, logging the outcome
pub(crate) async fn attempt<F>(
    channel: &'static str,
    payload: &SubmissionPayload,
    deadline: Duration,
    fut: F,
) -> DeliveryResult
where
    F: Future<Output = Result<(), DeliveryFailure>>,
{
    let flow = payload.flow();
    tracing::debug!(channel, flow = %flow, deadline_ms = deadline.as_millis() as u64, "Sending submission");

    let outcome = match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryFailure::Timeout(deadline)),
    };

    match &outcome {
        Ok(()) => tracing::info!(channel, flow = %flow, "Submission delivered"),
        Err(e) => tracing::warn!(channel, flow = %flow, error = %e, "Submission not delivered"),
    }

    outcome.into()
}

/// Generic failure message per flow when the remote gives none
pub(crate) fn default_failure_message(flow: Flow) -> &'static str {
    match flow {
        Flow::Contact => "Failed to send email",
        Flow::Newsletter => "Failed to subscribe",
        Flow::LeadCapture => "Failed to capture lead",
        Flow::Offer => "Failed to submit free website request",
        Flow::Visitor => "Failed to track visitor",
    }
}
