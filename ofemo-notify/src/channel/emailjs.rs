//! EmailJS REST client (fallback channel)
//!
//! Sends `{ service_id, template_id, user_id, template_params }` to the
//! EmailJS send endpoint. EmailJS answers a bare `OK` on success; a JSON
//! `{ "success": true }` body is accepted as well for proxies that wrap it.

use super::{
    attempt, build_http_client, default_failure_message, transport_failure, DeliveryChannel,
    DeliveryFailure, DeliveryResult, RemoteReply,
};
use crate::error::NotifyError;
use crate::payload::{Flow, FormFields, SubmissionPayload};
use async_trait::async_trait;
use ofemo_common::config::{EmailJsConfig, EmailJsTemplates};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Request envelope
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: BTreeMap<&'static str, String>,
}

/// EmailJS client
pub struct EmailJsChannel {
    http_client: reqwest::Client,
    endpoint: String,
    service_id: Option<String>,
    public_key: Option<String>,
    templates: EmailJsTemplates,
    deadline: Duration,
}

impl EmailJsChannel {
    /// Create client; `service_id`/`public_key` must already be resolved
    pub fn new(config: &EmailJsConfig, deadline: Duration) -> Result<Self, NotifyError> {
        Ok(Self {
            http_client: build_http_client(deadline)?,
            endpoint: config.endpoint.clone(),
            service_id: config.service_id.clone().filter(|s| !s.trim().is_empty()),
            public_key: config.public_key.clone().filter(|s| !s.trim().is_empty()),
            templates: config.templates.clone(),
            deadline,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.service_id.is_some() && self.public_key.is_some()
    }

    fn template_for(&self, flow: Flow) -> &str {
        match flow {
            Flow::Contact => self.templates.contact.as_str(),
            Flow::Newsletter => self.templates.newsletter.as_str(),
            Flow::LeadCapture => self.templates.lead_capture.as_str(),
            Flow::Offer => self.templates.offer.as_str(),
            Flow::Visitor => self.templates.visitor.as_str(),
        }
    }

    async fn post(&self, payload: &SubmissionPayload) -> Result<(), DeliveryFailure> {
        let (Some(service_id), Some(public_key)) = (&self.service_id, &self.public_key) else {
            return Err(DeliveryFailure::Remote {
                status: None,
                message: "EmailJS is not configured (service_id/public_key missing)".to_string(),
            });
        };

        let flow = payload.flow();
        let request = SendRequest {
            service_id: service_id.as_str(),
            template_id: self.template_for(flow),
            user_id: public_key.as_str(),
            template_params: payload.to_fields().into_iter().collect(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
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

fn interpret_reply(
    status: u16,
    is_success: bool,
    body: &str,
    flow: Flow,
) -> Result<(), DeliveryFailure> {
    let text = body.trim();

    if !is_success {
        return Err(DeliveryFailure::Remote {
            status: Some(status),
            message: if text.is_empty() {
                default_failure_message(flow).to_string()
            } else {
                text.to_string()
            },
        });
    }

    if text.eq_ignore_ascii_case("ok") {
        return Ok(());
    }

    match serde_json::from_str::<RemoteReply>(text) {
        Ok(reply) if reply.success => Ok(()),
        Ok(reply) => Err(DeliveryFailure::Remote {
            status: Some(status),
            message: reply
                .message
                .unwrap_or_else(|| default_failure_message(flow).to_string()),
        }),
        Err(e) => Err(DeliveryFailure::MalformedBody(e.to_string())),
    }
}

#[async_trait]
impl DeliveryChannel for EmailJsChannel {
    fn name(&self) -> &'static str {
        "emailjs"
    }

    async fn send(&self, payload: &SubmissionPayload) -> DeliveryResult {
        attempt(self.name(), payload, self.deadline, self.post(payload)).await
    }
}
