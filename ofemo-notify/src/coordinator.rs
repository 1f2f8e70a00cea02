//! Fallback coordination and submission dispatch
//!
//! `FallbackCoordinator` is a two-attempt chain: primary, then fallback only
//! if the primary did not deliver. There is no retry loop and no backoff: a
//! second send to a live endpoint is a duplicate email.
//!
//! `Dispatcher` runs every flow through the coordinator and, for the offer
//! flow on overall success, fires the messaging deep link. The deep link
//! outcome is reported in its own field of [`SubmissionReport`].

use crate::channel::{DeliveryChannel, DeliveryResult};
use crate::deep_link::{DeepLinkBuilder, LinkOpener, OpenError};
use crate::payload::{Flow, FormFields, SubmissionPayload};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Primary → fallback chain
#[derive(Clone)]
pub struct FallbackCoordinator {
    primary: Arc<dyn DeliveryChannel>,
    fallback: Arc<dyn DeliveryChannel>,
}

impl FallbackCoordinator {
    pub fn new(primary: Arc<dyn DeliveryChannel>, fallback: Arc<dyn DeliveryChannel>) -> Self {
        Self { primary, fallback }
    }

    /// Deliver through primary, or through fallback if primary fails
    ///
    /// Returns the primary's result on success (fallback never called),
    /// otherwise the fallback's result verbatim. The primary's failure cause
    /// is logged and dropped.
    pub async fn submit(&self, payload: &SubmissionPayload) -> DeliveryResult {
        let flow = payload.flow();

        let primary = self.primary.send(payload).await;
        if primary.success {
            return primary;
        }

        warn!(
            flow = %flow,
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            cause = ?primary.error,
            "Primary channel failed, trying fallback"
        );

        let fallback = self.fallback.send(payload).await;
        if !fallback.success {
            error!(
                flow = %flow,
                cause = ?fallback.error,
                "Both primary and fallback channels failed"
            );
        }
        fallback
    }
}

/// Best-effort side channel outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideChannelOutcome {
    /// Flow has no side channel, or delivery failed so it was not attempted
    NotApplicable,
    /// Link handed to the opener
    Opened { url: String },
    /// Opener refused or could not launch
    Failed { url: String, reason: OpenError },
}

impl SideChannelOutcome {
    pub fn attempted(&self) -> bool {
        !matches!(self, SideChannelOutcome::NotApplicable)
    }
}

/// Everything one submission produced
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    /// Correlates log lines of one submission
    pub submission_id: Uuid,
    pub flow: Flow,
    pub delivery: DeliveryResult,
    pub side_channel: SideChannelOutcome,
}

impl SubmissionReport {
    pub fn succeeded(&self) -> bool {
        self.delivery.success
    }
}

/// Runs submissions end to end
#[derive(Clone)]
pub struct Dispatcher {
    coordinator: FallbackCoordinator,
    links: DeepLinkBuilder,
    opener: Arc<dyn LinkOpener>,
}

impl Dispatcher {
    pub fn new(
        coordinator: FallbackCoordinator,
        links: DeepLinkBuilder,
        opener: Arc<dyn LinkOpener>,
    ) -> Self {
        Self {
            coordinator,
            links,
            opener,
        }
    }

    /// Deliver `payload`, consuming it
    pub async fn dispatch(&self, payload: SubmissionPayload) -> SubmissionReport {
        let submission_id = Uuid::new_v4();
        let flow = payload.flow();
        info!(submission_id = %submission_id, flow = %flow, "Dispatching submission");

        let delivery = self.coordinator.submit(&payload).await;

        let side_channel = match &payload {
            SubmissionPayload::Offer(offer) if delivery.success => {
                let url = self.links.offer_link(offer);
                match self.opener.open(&url) {
                    Ok(()) => {
                        info!(submission_id = %submission_id, "Opened messaging deep link");
                        SideChannelOutcome::Opened { url }
                    }
                    Err(reason) => {
                        warn!(submission_id = %submission_id, error = %reason, "Messaging deep link not opened");
                        SideChannelOutcome::Failed { url, reason }
                    }
                }
            }
            _ => SideChannelOutcome::NotApplicable,
        };

        SubmissionReport {
            submission_id,
            flow,
            delivery,
            side_channel,
        }
    }
}
