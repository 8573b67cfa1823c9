//! Onboarding CLI Application
//!
//! Command-line front end for onboarding-lib: check a domain before
//! onboarding, validate contact details, list the authors registered for a
//! domain and inspect the effective configuration.

mod ui;

use async_trait::async_trait;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use onboarding_lib::{
    is_valid_email, is_valid_phone, load_env_config, parse_domain, resolve_client_config,
    validate_domain, AuthorClient, ClientConfig, ConfigManager, Domain, EnvConfig, FileConfig,
    OnboardingError, TokenProvider, TokenSession, WhoisClient, WhoisResult,
};
use serde::Serialize;
use std::process;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Environment variable holding the token handed out on refresh.
const REFRESH_TOKEN_ENV: &str = "ONBOARD_REFRESH_TOKEN";

/// CLI arguments for onboarding
#[derive(Parser, Debug)]
#[command(name = "onboarding")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Publisher onboarding: domain checks, contact validation and author lookup")]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Use a specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Show debug logging on stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a domain and check whether it is still available
    Domain {
        /// Domain to check (e.g. example.com)
        #[arg(value_name = "DOMAIN")]
        domain: String,

        /// Only validate the syntax, skip the WHOIS lookup
        #[arg(long = "skip-whois")]
        skip_whois: bool,

        /// Output results in JSON format
        #[arg(short = 'j', long = "json")]
        json: bool,
    },

    /// Validate an email address and/or a phone number
    Contact {
        /// Email address to validate
        #[arg(long = "email", value_name = "EMAIL")]
        email: Option<String>,

        /// Phone number to validate
        #[arg(long = "phone", value_name = "PHONE")]
        phone: Option<String>,

        /// Output results in JSON format
        #[arg(short = 'j', long = "json")]
        json: bool,
    },

    /// List the authors registered for a domain
    Authors {
        /// Domain whose authors to list
        #[arg(value_name = "DOMAIN")]
        domain: String,

        /// Bearer token for the author service
        #[arg(long = "token", value_name = "TOKEN", env = "ONBOARD_TOKEN")]
        token: String,

        /// Output results in JSON format
        #[arg(short = 'j', long = "json")]
        json: bool,
    },

    /// Print the effective configuration after merging files and environment
    Config {
        /// Output results in JSON format
        #[arg(short = 'j', long = "json")]
        json: bool,
    },
}

/// Result of `onboarding domain`.
#[derive(Debug, Serialize)]
pub struct DomainReport {
    pub input: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<WhoisResult>,
}

impl DomainReport {
    fn passed(&self) -> bool {
        self.valid && self.available != Some(false)
    }
}

/// Result of `onboarding contact`.
#[derive(Debug, Serialize)]
pub struct ContactReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_valid: Option<bool>,
}

impl ContactReport {
    fn passed(&self) -> bool {
        self.email_valid != Some(false) && self.phone_valid != Some(false)
    }
}

/// Hands out the refresh token from the environment, once per call.
struct EnvTokenProvider;

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn fresh_token(&self) -> Result<Option<String>, OnboardingError> {
        Ok(std::env::var(REFRESH_TOKEN_ENV)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()))
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "onboarding CLI starting");

    match run(args).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose {
        "onboarding=debug,onboarding_lib=debug"
    } else {
        "onboarding=info,onboarding_lib=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    match &args.command {
        Command::Contact { email, phone, .. } if email.is_none() && phone.is_none() => {
            Err("You must specify --email, --phone or both".to_string())
        }
        Command::Authors { token, .. } if token.trim().is_empty() => {
            Err("The --token value must not be empty".to_string())
        }
        _ => Ok(()),
    }
}

/// Dispatch the subcommand. `Ok(false)` means the checked input was rejected.
async fn run(args: Args) -> Result<bool, OnboardingError> {
    let env_config = load_env_config(args.verbose);
    let file_config = load_file_config(&args, &env_config)?;
    let config = resolve_client_config(&file_config, &env_config);

    match args.command {
        Command::Domain {
            domain,
            skip_whois,
            json,
        } => {
            let report = check_domain(&config, &domain, skip_whois, json).await?;
            emit(&report, json, ui::print_domain_report)?;
            Ok(report.passed())
        }
        Command::Contact { email, phone, json } => {
            let report = check_contact(email, phone);
            emit(&report, json, ui::print_contact_report)?;
            Ok(report.passed())
        }
        Command::Authors {
            domain,
            token,
            json,
        } => {
            validate_domain(&domain)?;
            let parsed = parse_domain(&domain);
            let client = AuthorClient::with_config(&config.author_api_url, config.request_timeout)?;
            let session = TokenSession::new(token, Arc::new(EnvTokenProvider));

            let authors = session
                .run(|token| {
                    let client = &client;
                    let parsed = &parsed;
                    async move { client.fetch_authors(&token, parsed).await }
                })
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&authors)?);
            } else {
                ui::print_authors(&parsed.to_string(), &authors);
            }
            Ok(true)
        }
        Command::Config { json } => {
            emit(&config, json, ui::print_config)?;
            Ok(true)
        }
    }
}

/// Explicit `--config`, then `ONBOARD_CONFIG`, then discovery.
fn load_file_config(args: &Args, env_config: &EnvConfig) -> Result<FileConfig, OnboardingError> {
    let manager = ConfigManager::new(args.verbose);

    match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => manager.load_file(path),
        None => manager.discover_and_load(),
    }
}

async fn check_domain(
    config: &ClientConfig,
    input: &str,
    skip_whois: bool,
    quiet: bool,
) -> Result<DomainReport, OnboardingError> {
    let trimmed = input.trim();

    if let Err(e) = validate_domain(trimmed) {
        let reason = match e {
            OnboardingError::InvalidDomain { reason, .. } => reason,
            other => other.to_string(),
        };
        return Ok(DomainReport {
            input: input.to_string(),
            valid: false,
            reason: Some(reason),
            domain: None,
            available: None,
            whois: None,
        });
    }

    let mut report = DomainReport {
        input: input.to_string(),
        valid: true,
        reason: None,
        domain: Some(parse_domain(trimmed)),
        available: None,
        whois: None,
    };

    if skip_whois {
        return Ok(report);
    }

    let whois = WhoisClient::with_config(&config.whois_url, config.request_timeout)?;
    let spinner = (!quiet).then(|| ui::Spinner::start(format!("Looking up {}...", trimmed)));
    let (available, answer) = whois.check_availability(trimmed).await;
    if let Some(spinner) = spinner {
        spinner.stop().await;
    }

    report.available = Some(available);
    report.whois = answer;

    Ok(report)
}

fn check_contact(email: Option<String>, phone: Option<String>) -> ContactReport {
    ContactReport {
        email_valid: email.as_deref().map(is_valid_email),
        phone_valid: phone.as_deref().map(is_valid_phone),
        email,
        phone,
    }
}

fn emit<T: Serialize>(value: &T, json: bool, pretty: fn(&T)) -> Result<(), OnboardingError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        pretty(value);
    }
    Ok(())
}
