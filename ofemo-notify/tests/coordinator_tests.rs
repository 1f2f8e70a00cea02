//! Fallback coordinator and dispatcher tests
//! Test File: coordinator_tests.rs
//!
//! Channels are in-process mocks; no network involved.

mod helpers;

use helpers::{ada_offer, call_log, sample_contact, MockChannel};
use ofemo_notify::channel::{DeliveryFailure, DeliveryResult};
use ofemo_notify::coordinator::{Dispatcher, FallbackCoordinator, SideChannelOutcome};
use ofemo_notify::deep_link::{DeepLinkBuilder, OpenError, RecordingOpener};
use ofemo_notify::payload::{Flow, OfferPayload, SubmissionPayload};
use std::sync::Arc;
use std::time::Duration;

fn offline() -> DeliveryFailure {
    DeliveryFailure::Transport("connection refused".to_string())
}

#[tokio::test]
async fn test_primary_success_skips_fallback() {
    let log = call_log();
    let primary = MockChannel::ok("primary", &log);
    let fallback = MockChannel::ok("fallback", &log);
    let coordinator = FallbackCoordinator::new(primary.clone(), fallback.clone());

    let result = coordinator.submit(&sample_contact().into()).await;

    assert_eq!(result, DeliveryResult::succeeded());
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 0);
}

#[tokio::test]
async fn test_primary_failure_falls_back_in_order() {
    let log = call_log();
    let primary = MockChannel::failing("primary", &log, offline());
    let fallback = MockChannel::ok("fallback", &log);
    let coordinator = FallbackCoordinator::new(primary.clone(), fallback.clone());

    let payload: SubmissionPayload = sample_contact().into();
    let result = coordinator.submit(&payload).await;

    assert!(result.success);
    assert_eq!(result.error, None);
    assert_eq!(*log.lock().unwrap(), vec!["primary", "fallback"]);
    assert_eq!(fallback.received(), vec![payload]);
}

#[tokio::test]
async fn test_both_fail_reports_fallback_cause() {
    let log = call_log();
    let fallback_cause = DeliveryFailure::Timeout(Duration::from_secs(10));
    let primary = MockChannel::failing("primary", &log, offline());
    let fallback = MockChannel::failing("fallback", &log, fallback_cause.clone());
    let coordinator = FallbackCoordinator::new(primary.clone(), fallback.clone());

    let result = coordinator.submit(&sample_contact().into()).await;

    assert!(!result.success);
    assert_eq!(result.error, Some(fallback_cause));
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn test_no_retry_beyond_two_attempts() {
    let log = call_log();
    let primary = MockChannel::failing("primary", &log, offline());
    let fallback = MockChannel::failing("fallback", &log, offline());
    let coordinator = FallbackCoordinator::new(primary, fallback);

    coordinator.submit(&sample_contact().into()).await;

    assert_eq!(log.lock().unwrap().len(), 2);
}

fn dispatcher(
    primary: Arc<MockChannel>,
    fallback: Arc<MockChannel>,
    opener: Arc<RecordingOpener>,
) -> Dispatcher {
    Dispatcher::new(
        FallbackCoordinator::new(primary, fallback),
        DeepLinkBuilder::default(),
        opener,
    )
}

#[tokio::test]
async fn test_offer_success_opens_one_deep_link() {
    let log = call_log();
    let opener = Arc::new(RecordingOpener::new());
    let dispatcher = dispatcher(
        MockChannel::ok("primary", &log),
        MockChannel::ok("fallback", &log),
        opener.clone(),
    );

    let report = dispatcher.dispatch(ada_offer().into()).await;

    assert!(report.succeeded());
    assert_eq!(report.flow, Flow::Offer);

    let opened = opener.opened();
    assert_eq!(opened.len(), 1);
    let (prefix, encoded) = opened[0].split_once("?text=").unwrap();
    assert_eq!(prefix, "https://wa.me/447756183484");
    let text = urlencoding::decode(encoded).unwrap();
    assert!(text.contains("Name: Ada"));
    assert!(text.starts_with("New Free Website Request:"));

    assert_eq!(
        report.side_channel,
        SideChannelOutcome::Opened {
            url: opened[0].clone()
        }
    );
}

#[tokio::test]
async fn test_minimal_offer_end_to_end() {
    let log = call_log();
    let primary = MockChannel::ok("primary", &log);
    let fallback = MockChannel::ok("fallback", &log);
    let opener = Arc::new(RecordingOpener::new());
    let dispatcher = dispatcher(primary.clone(), fallback.clone(), opener.clone());

    let offer = OfferPayload {
        full_name: "Ada".to_string(),
        email: "a@x.io".to_string(),
        phone: "123".to_string(),
        address: "1 Road".to_string(),
        social_media_profile: "https://x.com/ada".to_string(),
        short_description: "desc".to_string(),
        professional_summary: "summary".to_string(),
    };

    let report = dispatcher.dispatch(offer.into()).await;

    assert_eq!(report.delivery, DeliveryResult::succeeded());
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 0);

    let opened = opener.opened();
    assert_eq!(opened.len(), 1);
    let (_, encoded) = opened[0].split_once("?text=").unwrap();
    let text = urlencoding::decode(encoded).unwrap();
    assert!(text.contains("Name: Ada"));
    assert!(text.contains("Description: desc"));
    assert!(text.ends_with("Professional Summary: summary"));
}

#[tokio::test]
async fn test_offer_via_fallback_still_opens_link() {
    let log = call_log();
    let opener = Arc::new(RecordingOpener::new());
    let dispatcher = dispatcher(
        MockChannel::failing("primary", &log, offline()),
        MockChannel::ok("fallback", &log),
        opener.clone(),
    );

    let report = dispatcher.dispatch(ada_offer().into()).await;

    assert!(report.succeeded());
    assert_eq!(opener.opened().len(), 1);
}

#[tokio::test]
async fn test_refused_link_does_not_change_delivery() {
    let log = call_log();
    let opener = Arc::new(RecordingOpener::refusing("popup blocked"));
    let dispatcher = dispatcher(
        MockChannel::ok("primary", &log),
        MockChannel::ok("fallback", &log),
        opener.clone(),
    );

    let report = dispatcher.dispatch(ada_offer().into()).await;

    assert!(report.succeeded());
    assert_eq!(report.delivery, DeliveryResult::succeeded());
    match report.side_channel {
        SideChannelOutcome::Failed { reason, .. } => {
            assert_eq!(reason, OpenError::Refused("popup blocked".to_string()))
        }
        other => panic!("expected failed side channel, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_offer_never_opens_link() {
    let log = call_log();
    let opener = Arc::new(RecordingOpener::new());
    let dispatcher = dispatcher(
        MockChannel::failing("primary", &log, offline()),
        MockChannel::failing("fallback", &log, offline()),
        opener.clone(),
    );

    let report = dispatcher.dispatch(ada_offer().into()).await;

    assert!(!report.succeeded());
    assert_eq!(report.side_channel, SideChannelOutcome::NotApplicable);
    assert!(opener.opened().is_empty());
}

#[tokio::test]
async fn test_other_flows_have_no_side_channel() {
    let log = call_log();
    let opener = Arc::new(RecordingOpener::new());
    let dispatcher = dispatcher(
        MockChannel::ok("primary", &log),
        MockChannel::ok("fallback", &log),
        opener.clone(),
    );

    let report = dispatcher.dispatch(sample_contact().into()).await;

    assert!(report.succeeded());
    assert!(!report.side_channel.attempted());
    assert!(opener.opened().is_empty());
}

#[tokio::test]
async fn test_each_dispatch_gets_its_own_id() {
    let log = call_log();
    let dispatcher = dispatcher(
        MockChannel::ok("primary", &log),
        MockChannel::ok("fallback", &log),
        Arc::new(RecordingOpener::new()),
    );

    let first = dispatcher.dispatch(sample_contact().into()).await;
    let second = dispatcher.dispatch(sample_contact().into()).await;
    assert_ne!(first.submission_id, second.submission_id);
}
