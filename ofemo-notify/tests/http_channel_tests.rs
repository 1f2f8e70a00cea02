//! HTTP channel integration tests
//! Test File: http_channel_tests.rs
//!
//! Site handler and EmailJS clients against a local axum stub.

mod helpers;

use axum::http::StatusCode;
use helpers::{ada_offer, sample_contact, spawn_stub, unused_base_url, StubReply};
use ofemo_common::config::{EmailJsConfig, HandlerPaths, TomlConfig};
use ofemo_notify::channel::{DeliveryChannel, DeliveryFailure, EmailJsChannel, ServerChannel};
use ofemo_notify::config::build_dispatcher_with_opener;
use ofemo_notify::coordinator::SideChannelOutcome;
use ofemo_notify::deep_link::RecordingOpener;
use ofemo_notify::payload::SubmissionPayload;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const DEADLINE: Duration = Duration::from_secs(2);

fn server_channel(base_url: &str) -> ServerChannel {
    ServerChannel::new(base_url, HandlerPaths::default(), DEADLINE).unwrap()
}

fn emailjs_config(endpoint: String) -> EmailJsConfig {
    EmailJsConfig {
        endpoint,
        service_id: Some("service_test".to_string()),
        public_key: Some("public_test".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_server_posts_json_to_flow_handler() {
    let stub = spawn_stub(StubReply::handler_ok()).await;
    let channel = server_channel(&stub.base_url);

    let result = channel.send(&sample_contact().into()).await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "/contact-handler.php");

    let body: Value = serde_json::from_str(&requests[0].1).unwrap();
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["subject"], "Hello");
}

#[tokio::test]
async fn test_server_offer_body_is_camel_case() {
    let stub = spawn_stub(StubReply::handler_ok()).await;
    let channel = server_channel(&stub.base_url);

    channel.send(&ada_offer().into()).await;

    let requests = stub.requests();
    assert_eq!(requests[0].0, "/offer-handler.php");
    let body: Value = serde_json::from_str(&requests[0].1).unwrap();
    assert_eq!(body["fullName"], "Ada");
    assert_eq!(body["socialMediaProfile"], "https://x.com/ada");
}

#[tokio::test]
async fn test_server_reported_failure() {
    let stub = spawn_stub(StubReply::new(
        StatusCode::OK,
        r#"{"success":false,"message":"Mailer unavailable"}"#,
    ))
    .await;

    let result = server_channel(&stub.base_url)
        .send(&sample_contact().into())
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error,
        Some(DeliveryFailure::Remote {
            status: Some(200),
            message: "Mailer unavailable".to_string()
        })
    );
}

#[tokio::test]
async fn test_server_error_status_fails() {
    let stub = spawn_stub(StubReply::new(StatusCode::INTERNAL_SERVER_ERROR, "")).await;

    let result = server_channel(&stub.base_url)
        .send(&sample_contact().into())
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error,
        Some(DeliveryFailure::Remote {
            status: Some(500),
            message: "Failed to send email".to_string()
        })
    );
}

#[tokio::test]
async fn test_server_slow_reply_times_out() {
    let stub = spawn_stub(StubReply::handler_ok().delayed(Duration::from_secs(2))).await;
    let deadline = Duration::from_millis(200);
    let channel = ServerChannel::new(&stub.base_url, HandlerPaths::default(), deadline).unwrap();

    let result = channel.send(&sample_contact().into()).await;

    assert!(!result.success);
    assert_eq!(result.error, Some(DeliveryFailure::Timeout(deadline)));
}

#[tokio::test]
async fn test_server_unreachable_is_transport_failure() {
    let base_url = unused_base_url().await;

    let result = server_channel(&base_url).send(&sample_contact().into()).await;

    assert!(!result.success);
    assert!(matches!(result.error, Some(DeliveryFailure::Transport(_))));
}

#[tokio::test]
async fn test_emailjs_sends_envelope() {
    let stub = spawn_stub(StubReply::emailjs_ok()).await;
    let channel = EmailJsChannel::new(&emailjs_config(stub.url("/api/v1.0/email/send")), DEADLINE).unwrap();

    let result = channel.send(&ada_offer().into()).await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
    let requests = stub.requests();
    assert_eq!(requests[0].0, "/api/v1.0/email/send");

    let body: Value = serde_json::from_str(&requests[0].1).unwrap();
    assert_eq!(body["service_id"], "service_test");
    assert_eq!(body["user_id"], "public_test");
    assert_eq!(body["template_id"], "template_free_website");
    assert_eq!(body["template_params"]["fullName"], "Ada");
    assert_eq!(body["template_params"]["professionalSummary"], "Mathematician");
}

#[tokio::test]
async fn test_emailjs_error_status_fails() {
    let stub = spawn_stub(StubReply::new(
        StatusCode::BAD_REQUEST,
        "The Public Key is invalid",
    ))
    .await;
    let channel = EmailJsChannel::new(&emailjs_config(stub.url("/send")), DEADLINE).unwrap();

    let result = channel.send(&sample_contact().into()).await;

    assert_eq!(
        result.error,
        Some(DeliveryFailure::Remote {
            status: Some(400),
            message: "The Public Key is invalid".to_string()
        })
    );
}

fn pipeline_config(server_base_url: String, emailjs_endpoint: String) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.delivery.server_base_url = server_base_url;
    config.delivery.timeout_ms = 2_000;
    config.emailjs = emailjs_config(emailjs_endpoint);
    config
}

#[tokio::test]
async fn test_pipeline_falls_back_to_emailjs() {
    let site = spawn_stub(StubReply::new(StatusCode::BAD_GATEWAY, "Bad Gateway")).await;
    let emailjs = spawn_stub(StubReply::emailjs_ok()).await;
    let opener = Arc::new(RecordingOpener::new());
    let dispatcher = build_dispatcher_with_opener(
        &pipeline_config(site.base_url.clone(), emailjs.url("/send")),
        opener.clone(),
    )
    .unwrap();

    let report = dispatcher.dispatch(ada_offer().into()).await;

    assert!(report.succeeded());
    assert_eq!(site.hits(), 1);
    assert_eq!(emailjs.hits(), 1);
    assert!(matches!(report.side_channel, SideChannelOutcome::Opened { .. }));
    assert_eq!(opener.opened().len(), 1);
}

#[tokio::test]
async fn test_pipeline_primary_success_leaves_emailjs_untouched() {
    let site = spawn_stub(StubReply::handler_ok()).await;
    let emailjs = spawn_stub(StubReply::emailjs_ok()).await;
    let dispatcher = build_dispatcher_with_opener(
        &pipeline_config(site.base_url.clone(), emailjs.url("/send")),
        Arc::new(RecordingOpener::new()),
    )
    .unwrap();

    let payload: SubmissionPayload = sample_contact().into();
    let report = dispatcher.dispatch(payload).await;

    assert!(report.succeeded());
    assert_eq!(site.hits(), 1);
    assert_eq!(emailjs.hits(), 0);
}

#[tokio::test]
async fn test_pipeline_total_failure() {
    let site = spawn_stub(StubReply::new(StatusCode::INTERNAL_SERVER_ERROR, "")).await;
    let emailjs = spawn_stub(StubReply::new(StatusCode::INTERNAL_SERVER_ERROR, "down")).await;
    let opener = Arc::new(RecordingOpener::new());
    let dispatcher = build_dispatcher_with_opener(
        &pipeline_config(site.base_url.clone(), emailjs.url("/send")),
        opener.clone(),
    )
    .unwrap();

    let report = dispatcher.dispatch(ada_offer().into()).await;

    assert!(!report.succeeded());
    assert_eq!(
        report.delivery.error,
        Some(DeliveryFailure::Remote {
            status: Some(500),
            message: "down".to_string()
        })
    );
    assert!(opener.opened().is_empty());
}
