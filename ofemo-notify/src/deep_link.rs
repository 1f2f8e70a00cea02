//! Messaging deep link (tertiary notification)
//!
//! After a successful free-website request, a WhatsApp link carrying a
//! summary of the request is opened in a new browsing context. Opening is
//! best-effort: the outcome is reported next to the delivery result and
//! never changes it.

use crate::payload::OfferPayload;
use ofemo_common::config::WhatsAppConfig;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use thiserror::Error;

/// Link opener errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenError {
    /// Opener process could not be started
    #[error("Failed to launch opener '{0}': {1}")]
    Launch(String, String),

    /// Opener refused the link (popup blocked, no handler)
    #[error("Link not opened: {0}")]
    Refused(String),
}

/// Fixed multi-line summary of an offer request
pub fn whatsapp_summary(offer: &OfferPayload) -> String {
    format!(
        "New Free Website Request:\n\
         \n\
         Name: {}\n\
         Email: {}\n\
         Phone: {}\n\
         Address: {}\n\
         Social Media: {}\n\
         \n\
         Description: {}\n\
         \n\
         Professional Summary: {}",
        offer.full_name,
        offer.email,
        offer.phone,
        offer.address,
        offer.social_media_profile,
        offer.short_description,
        offer.professional_summary,
    )
}

/// `<base>/<recipient>?text=<percent-encoded text>`
pub fn build_link(base_url: &str, recipient: &str, text: &str) -> String {
    format!(
        "{}/{}?text={}",
        base_url.trim_end_matches('/'),
        recipient.trim_matches('/'),
        urlencoding::encode(text)
    )
}

/// Builds offer deep links for the configured recipient
#[derive(Debug, Clone)]
pub struct DeepLinkBuilder {
    base_url: String,
    recipient: String,
}

impl DeepLinkBuilder {
    pub fn new(base_url: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            recipient: recipient.into(),
        }
    }

    pub fn from_config(config: &WhatsAppConfig) -> Self {
        Self::new(config.base_url.clone(), config.recipient.clone())
    }

    pub fn offer_link(&self, offer: &OfferPayload) -> String {
        build_link(&self.base_url, &self.recipient, &whatsapp_summary(offer))
    }
}

impl Default for DeepLinkBuilder {
    fn default() -> Self {
        Self::from_config(&WhatsAppConfig::default())
    }
}

/// Opens a URL in a new browsing context
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), OpenError>;
}

/// Launches an external command with the URL as its last argument
///
/// The child is not waited on.
#[derive(Debug, Clone)]
pub struct CommandOpener {
    program: String,
    args: Vec<String>,
}

impl CommandOpener {
    /// Parse a command line such as `firefox --new-tab`
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Platform default opener
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self {
                program: "open".to_string(),
                args: Vec::new(),
            }
        } else if cfg!(target_os = "windows") {
            Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string(), "start".to_string(), String::new()],
            }
        } else {
            Self {
                program: "xdg-open".to_string(),
                args: Vec::new(),
            }
        }
    }
}

impl LinkOpener for CommandOpener {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        tracing::debug!(program = %self.program, "Opening link");
        Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
            .map_err(|e| OpenError::Launch(self.program.clone(), e.to_string()))
    }
}

/// Records links instead of opening them (dry runs, tests)
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
    refuse_with: Option<String>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opener that records the attempt and then refuses it
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            refuse_with: Some(reason.into()),
        }
    }

    /// Every URL passed to `open`, in call order
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(url.to_string());
        }
        match &self.refuse_with {
            Some(reason) => Err(OpenError::Refused(reason.clone())),
            None => Ok(()),
        }
    }
}
