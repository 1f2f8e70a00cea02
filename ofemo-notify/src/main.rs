//! ofemo-notify - submit site forms from the command line
//!
//! Runs the same pipeline the site's forms use: required-field validation,
//! delivery through the site handlers with EmailJS as fallback, and the
//! WhatsApp deep link after a successful free-website request. Profile
//! flags (offer shown, analytics consent) persist in `flags.json` under the
//! root folder.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ofemo_common::config::{
    default_config_path, load_or_default, write_toml_config, LoggingConfig, RootFolderInitializer,
    RootFolderResolver, TomlConfig,
};
use ofemo_common::{JsonFileStore, KeyValueStore};
use ofemo_notify::config::build_dispatcher;
use ofemo_notify::coordinator::{Dispatcher, SideChannelOutcome, SubmissionReport};
use ofemo_notify::flows;
use ofemo_notify::gate::{ConsentStatus, FlowGate};
use ofemo_notify::payload::{
    ContactPayload, LeadCapturePayload, NewsletterPayload, VisitorPayload,
};
use ofemo_notify::wizard::{ExitIntentTrigger, OfferWizard, CONFIRMATION_DISPLAY, EXIT_INTENT_DEBOUNCE};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

const MODULE_NAME: &str = "ofemo-notify";

/// Command-line arguments for ofemo-notify
#[derive(Parser, Debug)]
#[command(name = "ofemo-notify")]
#[command(about = "Submission pipeline for the ofemo site forms")]
#[command(version)]
struct Args {
    /// Root folder holding the flag profile (also OFEMO_ROOT_FOLDER)
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: <config dir>/ofemo/ofemo-notify.toml)
    #[arg(short, long, global = true, env = "OFEMO_CONFIG")]
    config: Option<PathBuf>,

    /// Record deep links instead of launching an opener
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send the contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },

    /// Subscribe to the newsletter
    Newsletter {
        #[arg(long)]
        email: String,
        /// Where the signup form sits on the site
        #[arg(long, default_value = "footer")]
        source: String,
    },

    /// Submit the lead capture popup
    Lead {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "/")]
        page: String,
        #[arg(long, default_value = "")]
        referrer: String,
    },

    /// Request a free website through the three-step wizard
    Offer {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        social_media_profile: String,
        #[arg(long)]
        short_description: String,
        #[arg(long)]
        professional_summary: String,
        /// Exit right after delivery instead of holding the confirmation
        #[arg(long)]
        no_wait: bool,
    },

    /// Send a page view ping (requires analytics consent)
    Track {
        #[arg(long, default_value = "/")]
        page: String,
        #[arg(long, default_value = "")]
        referrer: String,
        #[arg(long, default_value = "")]
        user_agent: String,
        #[arg(long, default_value = "")]
        screen_resolution: String,
        #[arg(long, default_value = "")]
        time_zone: String,
        #[arg(long, default_value = "")]
        language: String,
    },

    /// Record or show the analytics consent decision
    Consent {
        #[command(subcommand)]
        action: ConsentAction,
    },

    /// Inspect or clear the flag profile
    Flags {
        #[command(subcommand)]
        action: FlagsAction,
    },

    /// Write a config file with every default spelled out
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Simulate the pointer leaving the page at vertical position CLIENT_Y
    ExitIntent {
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        client_y: f64,
    },
}

#[derive(Subcommand, Debug)]
enum ConsentAction {
    Grant,
    Decline,
    Status,
}

#[derive(Subcommand, Debug)]
enum FlagsAction {
    List,
    Clear,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(|| default_config_path(MODULE_NAME));
    let (config, config_source) = load_or_default(config_path.as_deref());

    init_tracing(&config.logging)?;

    info!(
        "Starting ofemo-notify v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    config_source.log();

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let store = Arc::new(
        JsonFileStore::open(initializer.flags_path()).context("Failed to open flag profile")?,
    );
    let gate = FlowGate::new(store.clone());

    match args.command {
        Command::Contact {
            name,
            email,
            subject,
            message,
        } => {
            let dispatcher = dispatcher(&config, args.dry_run)?;
            let payload = ContactPayload {
                name,
                email,
                subject,
                message,
            };
            let report = flows::contact(&dispatcher, payload).await?;
            finish(&report, "Thank you! Your message has been sent.")
        }

        Command::Newsletter { email, source } => {
            let dispatcher = dispatcher(&config, args.dry_run)?;
            let report = flows::newsletter(&dispatcher, NewsletterPayload::now(email, source)).await?;
            finish(&report, "Thanks for subscribing!")
        }

        Command::Lead {
            email,
            page,
            referrer,
        } => {
            let dispatcher = dispatcher(&config, args.dry_run)?;
            let payload = LeadCapturePayload::now(email, page, referrer);
            let report = flows::lead_capture(&dispatcher, payload).await?;
            finish(&report, "Thanks! We'll be in touch.")
        }

        Command::Offer {
            full_name,
            email,
            phone,
            address,
            social_media_profile,
            short_description,
            professional_summary,
            no_wait,
        } => {
            let dispatcher = dispatcher(&config, args.dry_run)?;
            let mut wizard = OfferWizard::new();
            wizard.set_field("fullName", full_name)?;
            wizard.set_field("email", email)?;
            wizard.set_field("phone", phone)?;
            wizard.next()?;
            wizard.set_field("address", address)?;
            wizard.set_field("socialMediaProfile", social_media_profile)?;
            wizard.next()?;
            wizard.set_field("shortDescription", short_description)?;
            wizard.set_field("professionalSummary", professional_summary)?;

            let report = wizard.submit(&dispatcher).await?;
            finish(&report, "Thank you! Your free website request has been received.")?;

            if !no_wait {
                tokio::time::sleep(CONFIRMATION_DISPLAY).await;
            }
            if wizard.poll_auto_close(Instant::now()) {
                info!("Offer confirmation closed");
            }
            Ok(())
        }

        Command::Track {
            page,
            referrer,
            user_agent,
            screen_resolution,
            time_zone,
            language,
        } => {
            let dispatcher = dispatcher(&config, args.dry_run)?;
            let payload = VisitorPayload {
                user_agent,
                screen_resolution,
                time_zone,
                language,
                ..VisitorPayload::now(page, referrer)
            };
            match flows::track_visit(&dispatcher, &gate, payload).await? {
                Some(report) => finish(&report, "Visit recorded."),
                None => {
                    println!("No analytics consent; visit not recorded.");
                    Ok(())
                }
            }
        }

        Command::Consent { action } => {
            match action {
                ConsentAction::Grant => gate.record_consent(true)?,
                ConsentAction::Decline => gate.record_consent(false)?,
                ConsentAction::Status => {}
            }
            let status = match gate.consent_status() {
                ConsentStatus::Granted => "granted",
                ConsentStatus::Declined => "declined",
                ConsentStatus::Unset => "not set",
            };
            println!("Analytics consent: {}", status);
            Ok(())
        }

        Command::Flags { action } => {
            match action {
                FlagsAction::List => {
                    let entries = store.entries();
                    if entries.is_empty() {
                        println!("(no flags set)");
                    }
                    for (key, value) in entries {
                        println!("{} = {}", key, value);
                    }
                }
                FlagsAction::Clear => {
                    store.clear().context("Failed to clear flag profile")?;
                    println!("Flag profile cleared: {}", store.path().display());
                }
            }
            Ok(())
        }

        Command::InitConfig { force } => {
            let Some(path) = config_path else {
                bail!("No config directory available; pass --config");
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            write_toml_config(&TomlConfig::default(), &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }

        Command::ExitIntent { client_y } => {
            let mut trigger = ExitIntentTrigger::new(gate);
            if !trigger.pointer_left(client_y, Instant::now()) {
                println!("Offer popup not shown.");
                return Ok(());
            }
            tokio::time::sleep(EXIT_INTENT_DEBOUNCE).await;
            if trigger.poll(Instant::now())? {
                println!("Offer popup shown.");
            } else {
                println!("Offer popup not shown.");
            }
            Ok(())
        }
    }
}

fn dispatcher(config: &TomlConfig, dry_run: bool) -> Result<Dispatcher> {
    build_dispatcher(config, dry_run).context("Failed to build delivery channels")
}

/// Print the outcome; delivery failure becomes a non-zero exit
fn finish(report: &SubmissionReport, success_message: &str) -> Result<()> {
    match &report.side_channel {
        SideChannelOutcome::Opened { url } => println!("Opened: {}", url),
        SideChannelOutcome::Failed { url, reason } => {
            println!("Could not open {} ({}); open it manually.", url, reason)
        }
        SideChannelOutcome::NotApplicable => {}
    }

    if report.succeeded() {
        println!("{}", success_message);
        return Ok(());
    }

    match &report.delivery.error {
        Some(cause) => bail!(
            "Submission {} failed: {}. Please try again later.",
            report.submission_id,
            cause
        ),
        None => bail!("Submission {} failed. Please try again later.", report.submission_id),
    }
}
