//! Bootstrap configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `OFEMO_ROOT_FOLDER`
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! built-in defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "OFEMO_ROOT_FOLDER";

/// File name of the persisted flag profile inside the root folder
pub const FLAGS_FILE_NAME: &str = "flags.json";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the persisted flag profile (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub emailjs: EmailJsConfig,

    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    #[serde(default)]
    pub opener: OpenerConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Primary (server-side) delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Deadline applied to every single channel call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Base URL the handler paths are joined onto
    #[serde(default = "default_server_base_url")]
    pub server_base_url: String,

    #[serde(default)]
    pub handlers: HandlerPaths,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            server_base_url: default_server_base_url(),
            handlers: HandlerPaths::default(),
        }
    }
}

/// Server handler script per submission flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerPaths {
    pub contact: String,
    pub newsletter: String,
    pub lead_capture: String,
    pub offer: String,
    pub visitor: String,
}

impl Default for HandlerPaths {
    fn default() -> Self {
        Self {
            contact: "contact-handler.php".to_string(),
            newsletter: "newsletter-handler.php".to_string(),
            lead_capture: "lead-capture-handler.php".to_string(),
            offer: "offer-handler.php".to_string(),
            visitor: "visitor-handler.php".to_string(),
        }
    }
}

/// Fallback transactional email API (EmailJS) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJsConfig {
    #[serde(default = "default_emailjs_endpoint")]
    pub endpoint: String,

    /// EmailJS service id (may also come from `OFEMO_EMAILJS_SERVICE_ID`)
    #[serde(default)]
    pub service_id: Option<String>,

    /// EmailJS public key, sent as `user_id` (may also come from `OFEMO_EMAILJS_PUBLIC_KEY`)
    #[serde(default)]
    pub public_key: Option<String>,

    #[serde(default)]
    pub templates: EmailJsTemplates,
}

impl Default for EmailJsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_emailjs_endpoint(),
            service_id: None,
            public_key: None,
            templates: EmailJsTemplates::default(),
        }
    }
}

/// EmailJS template id per submission flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailJsTemplates {
    pub contact: String,
    pub newsletter: String,
    pub lead_capture: String,
    pub offer: String,
    pub visitor: String,
}

impl Default for EmailJsTemplates {
    fn default() -> Self {
        Self {
            contact: "template_contact".to_string(),
            newsletter: "template_newsletter".to_string(),
            lead_capture: "template_lead_capture".to_string(),
            offer: "template_free_website".to_string(),
            visitor: "template_visitor".to_string(),
        }
    }
}

/// Messaging deep link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_whatsapp_base_url")]
    pub base_url: String,

    #[serde(default = "default_whatsapp_recipient")]
    pub recipient: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            base_url: default_whatsapp_base_url(),
            recipient: default_whatsapp_recipient(),
        }
    }
}

/// External link opener settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenerConfig {
    /// Command used to open links (platform default when unset)
    #[serde(default)]
    pub command: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_server_base_url() -> String {
    "https://ofemo.uk".to_string()
}

fn default_emailjs_endpoint() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}

fn default_whatsapp_base_url() -> String {
    "https://wa.me".to_string()
}

fn default_whatsapp_recipient() -> String {
    "447756183484".to_string()
}

/// Default TOML location for a module: `<config dir>/ofemo/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ofemo").join(format!("{}.toml", module_name)))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

impl TomlConfig {
    /// Reject values that parse but cannot work
    pub fn validate(&self) -> Result<()> {
        if self.delivery.timeout_ms == 0 {
            return Err(Error::Config(
                "delivery.timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the effective config came from
///
/// Returned instead of logged so callers can report it once tracing is up.
#[derive(Debug)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file at this path, defaults used
    NotFound(PathBuf),
    /// Platform has no config directory, defaults used
    NoConfigDir,
    /// File present but unusable, defaults used
    Invalid(Error),
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::NotFound(path) => {
                info!("Config file {} not found, using built-in defaults", path.display())
            }
            ConfigSource::NoConfigDir => {
                warn!("No config directory available, using built-in defaults")
            }
            ConfigSource::Invalid(e) => warn!("{}; using built-in defaults", e),
        }
    }
}

/// Load TOML config, falling back to defaults when absent or invalid
///
/// Missing or invalid config files never cause termination.
pub fn load_or_default(path: Option<&Path>) -> (TomlConfig, ConfigSource) {
    let Some(path) = path else {
        return (TomlConfig::default(), ConfigSource::NoConfigDir);
    };

    if !path.exists() {
        return (TomlConfig::default(), ConfigSource::NotFound(path.to_path_buf()));
    }

    match load_toml_config(path) {
        Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
        Err(e) => (TomlConfig::default(), ConfigSource::Invalid(e)),
    }
}

/// Write TOML config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Root folder resolver following the priority order in the module docs
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_arg: None,
            toml_root: None,
        }
    }

    /// Set the command-line override (priority 1)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Take `root_folder` from a loaded TOML config (priority 3)
    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(module = %self.module_name, "Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!(module = %self.module_name, "Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!(module = %self.module_name, "Root folder from TOML: {}", path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!(module = %self.module_name, "Root folder (compiled default): {}", path.display());
        path
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ofemo"))
        .unwrap_or_else(|| PathBuf::from("./ofemo_data"))
}

/// Creates the root folder and locates files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create root folder directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Path of the persisted flag profile
    pub fn flags_path(&self) -> PathBuf {
        self.root_folder.join(FLAGS_FILE_NAME)
    }
}
