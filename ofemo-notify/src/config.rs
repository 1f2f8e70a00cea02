//! Configuration resolution for ofemo-notify
//!
//! EmailJS credentials resolve ENV → TOML. Everything else comes from the
//! TOML file (or its defaults). The resolved config is turned into a ready
//! [`Dispatcher`] here so `main` only wires arguments.

use crate::channel::{EmailJsChannel, ServerChannel};
use crate::coordinator::{Dispatcher, FallbackCoordinator};
use crate::deep_link::{CommandOpener, DeepLinkBuilder, LinkOpener, RecordingOpener};
use crate::error::NotifyResult;
use ofemo_common::config::{EmailJsConfig, OpenerConfig, TomlConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const EMAILJS_SERVICE_ID_ENV: &str = "OFEMO_EMAILJS_SERVICE_ID";
pub const EMAILJS_PUBLIC_KEY_ENV: &str = "OFEMO_EMAILJS_PUBLIC_KEY";

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one credential from environment, then TOML
///
/// Warns when both sources carry a value; the environment wins.
pub fn resolve_credential(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in multiple sources: environment, TOML. Using environment (highest priority).",
            label
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", label);
        return Some(value);
    }
    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", label);
        return Some(value.to_string());
    }
    None
}

/// EmailJS section with credentials resolved
pub fn resolve_emailjs(config: &EmailJsConfig) -> EmailJsConfig {
    let resolved = EmailJsConfig {
        service_id: resolve_credential(
            "EmailJS service id",
            EMAILJS_SERVICE_ID_ENV,
            config.service_id.as_deref(),
        ),
        public_key: resolve_credential(
            "EmailJS public key",
            EMAILJS_PUBLIC_KEY_ENV,
            config.public_key.as_deref(),
        ),
        ..config.clone()
    };

    if resolved.service_id.is_none() || resolved.public_key.is_none() {
        warn!(
            "EmailJS fallback not configured; set {} and {} or [emailjs] in the TOML config",
            EMAILJS_SERVICE_ID_ENV, EMAILJS_PUBLIC_KEY_ENV
        );
    }
    resolved
}

/// Opener from config, or the platform default
pub fn build_opener(config: &OpenerConfig, dry_run: bool) -> Arc<dyn LinkOpener> {
    if dry_run {
        return Arc::new(RecordingOpener::new());
    }
    match config
        .command
        .as_deref()
        .and_then(CommandOpener::from_command_line)
    {
        Some(opener) => Arc::new(opener),
        None => Arc::new(CommandOpener::platform_default()),
    }
}

/// Server primary, EmailJS fallback, WhatsApp side channel
pub fn build_dispatcher_with_opener(
    config: &TomlConfig,
    opener: Arc<dyn LinkOpener>,
) -> NotifyResult<Dispatcher> {
    let deadline = Duration::from_millis(config.delivery.timeout_ms);
    let primary = ServerChannel::from_config(&config.delivery)?;
    let fallback = EmailJsChannel::new(&resolve_emailjs(&config.emailjs), deadline)?;

    Ok(Dispatcher::new(
        FallbackCoordinator::new(Arc::new(primary), Arc::new(fallback)),
        DeepLinkBuilder::from_config(&config.whatsapp),
        opener,
    ))
}

pub fn build_dispatcher(config: &TomlConfig, dry_run: bool) -> NotifyResult<Dispatcher> {
    build_dispatcher_with_opener(config, build_opener(&config.opener, dry_run))
}
