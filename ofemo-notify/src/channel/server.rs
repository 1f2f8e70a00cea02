//! Site handler client (primary channel)
//!
//! POSTs the payload as a JSON object to the flow's handler script on the
//! site, e.g. `https://ofemo.uk/contact-handler.php`. The handler answers
//! `{ "success": bool, "message"?: string }`.

use super::{
    attempt, build_http_client, default_failure_message, transport_failure, DeliveryChannel,
    DeliveryFailure, DeliveryResult, RemoteReply,
};
use crate::error::NotifyError;
use crate::payload::{Flow, FormFields, SubmissionPayload};
use async_trait::async_trait;
use ofemo_common::config::{DeliveryConfig, HandlerPaths};
use std::time::Duration;

/// Site handler client
pub struct ServerChannel {
    http_client: reqwest::Client,
    base_url: String,
    handlers: HandlerPaths,
    deadline: Duration,
}

impl ServerChannel {
    pub fn new(
        base_url: impl Into<String>,
        handlers: HandlerPaths,
        deadline: Duration,
    ) -> Result<Self, NotifyError> {
        Ok(Self {
            http_client: build_http_client(deadline)?,
            base_url: base_url.into(),
            handlers,
            deadline,
        })
    }

    pub fn from_config(config: &DeliveryConfig) -> Result<Self, NotifyError> {
        Self::new(
            config.server_base_url.clone(),
            config.handlers.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// Handler URL for a flow
    pub fn endpoint(&self, flow: Flow) -> String {
        let handler = match flow {
            Flow::Contact => &self.handlers.contact,
            Flow::Newsletter => &self.handlers.newsletter,
            Flow::LeadCapture => &self.handlers.lead_capture,
            Flow::Offer => &self.handlers.offer,
            Flow::Visitor => &self.handlers.visitor,
        };
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            handler.trim_start_matches('/')
        )
    }

    async fn post(&self, payload: &SubmissionPayload) -> Result<(), DeliveryFailure> {
        let flow = payload.flow();
        let url = self.endpoint(flow);

        let response = self
            .http_client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| transport_failure(e, self.deadline))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(e, self.deadline))?;

        interpret_reply(status.as_u16(), status.is_success(), &body, flow)
    }
}

/// Success iff 2xx AND the body says `success: true`
fn interpret_reply(
    status: u16,
    is_success: bool,
    body: &str,
    flow: Flow,
) -> Result<(), DeliveryFailure> {
    let reply = match serde_json::from_str::<RemoteReply>(body) {
        Ok(reply) => reply,
        Err(e) if is_success => return Err(DeliveryFailure::MalformedBody(e.to_string())),
        Err(_) => {
            let text = body.trim();
            return Err(DeliveryFailure::Remote {
                status: Some(status),
                message: if text.is_empty() {
                    default_failure_message(flow).to_string()
                } else {
                    text.to_string()
                },
            });
        }
    };

    if is_success && reply.success {
        return Ok(());
    }

    Err(DeliveryFailure::Remote {
        status: Some(status),
        message: reply
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_failure_message(flow).to_string()),
    })
}

#[async_trait]
impl DeliveryChannel for ServerChannel {
    fn name(&self) -> &'static str {
        "server"
    }

    async fn send(&self, payload: &SubmissionPayload) -> DeliveryResult {
        attempt(self.name(), payload, self.deadline, self.post(payload)).await
    }
}
