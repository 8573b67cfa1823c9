//! Configuration file parsing and management.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, TOML configuration files, and `ONBOARD_*` environment values.
//! [`resolve_client_config`] folds them into a [`ClientConfig`].

use crate::error::OnboardingError;
use crate::types::ClientConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Upstream service locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    /// Payment processor settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentConfig>,

    /// Wizard behaviour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizard: Option<WizardConfig>,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_api_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_api_url: Option<String>,

    /// Per-request timeout (as string, e.g. "5s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

/// `[payment]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishable_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

/// `[wizard]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WizardConfig {
    /// Redirect countdown after checkout (e.g. "10s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Returns
    ///
    /// The parsed and validated configuration, or an error if the file is
    /// missing, unreadable, not TOML or holds invalid values.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, OnboardingError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OnboardingError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            OnboardingError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            OnboardingError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        if self.verbose {
            tracing::info!(path = %path.display(), "loaded configuration file");
        }

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config, then `$HOME`, then the current directory; later files
    /// override earlier ones field by field. Files that fail to load are
    /// skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, OnboardingError> {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => merged_config = self.merge_configs(merged_config, config),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping configuration file"),
            }
        }

        Ok(merged_config)
    }

    /// Local configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./onboarding.toml", "./.onboarding.toml"]
            .into_iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".onboarding.toml", "onboarding.toml"]
            .into_iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// `$XDG_CONFIG_HOME/onboarding/config.toml`, falling back to `~/.config`.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let base = match env::var_os("XDG_CONFIG_HOME") {
            Some(xdg) => PathBuf::from(xdg),
            None => Path::new(&env::var_os("HOME")?).join(".config"),
        };

        let path = base.join("onboarding").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            api: merge_section(lower.api, higher.api, |l, h| ApiConfig {
                whois_url: h.whois_url.or(l.whois_url),
                author_api_url: h.author_api_url.or(l.author_api_url),
                payment_api_url: h.payment_api_url.or(l.payment_api_url),
                request_timeout: h.request_timeout.or(l.request_timeout),
            }),
            payment: merge_section(lower.payment, higher.payment, |l, h| PaymentConfig {
                publishable_key: h.publishable_key.or(l.publishable_key),
                price_id: h.price_id.or(l.price_id),
                success_url: h.success_url.or(l.success_url),
                cancel_url: h.cancel_url.or(l.cancel_url),
            }),
            wizard: merge_section(lower.wizard, higher.wizard, |l, h| WizardConfig {
                countdown: h.countdown.or(l.countdown),
            }),
        }
    }

    /// Validate URL schemes and duration strings.
    fn validate_config(&self, config: &FileConfig) -> Result<(), OnboardingError> {
        if let Some(api) = &config.api {
            for (name, url) in [
                ("api.whois_url", &api.whois_url),
                ("api.author_api_url", &api.author_api_url),
                ("api.payment_api_url", &api.payment_api_url),
            ] {
                if let Some(url) = url {
                    validate_url(name, url)?;
                }
            }

            if let Some(timeout) = &api.request_timeout {
                validate_duration("api.request_timeout", timeout)?;
            }
        }

        if let Some(payment) = &config.payment {
            for (name, url) in [
                ("payment.success_url", &payment.success_url),
                ("payment.cancel_url", &payment.cancel_url),
            ] {
                if let Some(url) = url {
                    validate_url(name, url)?;
                }
            }
        }

        if let Some(countdown) = config.wizard.as_ref().and_then(|w| w.countdown.as_ref()) {
            validate_duration("wizard.countdown", countdown)?;
        }

        Ok(())
    }
}

fn merge_section<T>(lower: Option<T>, higher: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (lower, higher) {
        (Some(l), Some(h)) => Some(merge(l, h)),
        (l, h) => h.or(l),
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), OnboardingError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(OnboardingError::config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )))
    }
}

fn validate_duration(field: &str, value: &str) -> Result<(), OnboardingError> {
    parse_duration_string(value).map(|_| ()).ok_or_else(|| {
        OnboardingError::config(format!(
            "{} must look like '5s', '30s' or '2m', got '{}'",
            field, value
        ))
    })
}

/// Configuration read from `ONBOARD_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub whois_url: Option<String>,
    pub author_api_url: Option<String>,
    pub payment_api_url: Option<String>,
    pub payment_key: Option<String>,
    pub price_id: Option<String>,
    pub countdown: Option<String>,
    pub timeout: Option<String>,
    /// Explicit config file path
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Recognised variables:
/// - `ONBOARD_WHOIS_URL`, `ONBOARD_AUTHOR_API_URL`, `ONBOARD_PAYMENT_API_URL`
/// - `ONBOARD_PAYMENT_KEY`, `ONBOARD_PRICE_ID`
/// - `ONBOARD_COUNTDOWN`, `ONBOARD_TIMEOUT` (e.g. "10s", "2m")
/// - `ONBOARD_CONFIG` (path to a TOML file)
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    env_config_from(|name| env::var(name).ok(), verbose)
}

/// Build an [`EnvConfig`] from an arbitrary variable lookup.
pub fn env_config_from<F>(lookup: F, verbose: bool) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let url = |name: &str| {
        let value = read(name)?;
        match validate_url(name, &value) {
            Ok(()) => {
                if verbose {
                    tracing::info!("Using {}={}", name, value);
                }
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", name, e);
                None
            }
        }
    };

    let duration = |name: &str| {
        let value = read(name)?;
        if parse_duration_string(&value).is_some() {
            if verbose {
                tracing::info!("Using {}={}", name, value);
            }
            Some(value)
        } else {
            tracing::warn!(
                "Ignoring {}='{}', use a format like '5s', '30s' or '2m'",
                name,
                value
            );
            None
        }
    };

    EnvConfig {
        whois_url: url("ONBOARD_WHOIS_URL"),
        author_api_url: url("ONBOARD_AUTHOR_API_URL"),
        payment_api_url: url("ONBOARD_PAYMENT_API_URL"),
        // Secrets are never echoed, even when verbose.
        payment_key: read("ONBOARD_PAYMENT_KEY"),
        price_id: read("ONBOARD_PRICE_ID"),
        countdown: duration("ONBOARD_COUNTDOWN"),
        timeout: duration("ONBOARD_TIMEOUT"),
        config: read("ONBOARD_CONFIG"),
    }
}

/// Fold file and environment layers over the defaults.
///
/// Environment values win over file values, which win over defaults.
pub fn resolve_client_config(file: &FileConfig, env_config: &EnvConfig) -> ClientConfig {
    let mut config = ClientConfig::default();

    let api = file.api.clone().unwrap_or_default();
    let payment = file.payment.clone().unwrap_or_default();
    let wizard = file.wizard.clone().unwrap_or_default();

    if let Some(url) = env_config.whois_url.clone().or(api.whois_url) {
        config = config.with_whois_url(url);
    }
    if let Some(url) = env_config.author_api_url.clone().or(api.author_api_url) {
        config = config.with_author_api_url(url);
    }
    if let Some(url) = env_config.payment_api_url.clone().or(api.payment_api_url) {
        config = config.with_payment_api_url(url);
    }
    if let Some(key) = env_config.payment_key.clone().or(payment.publishable_key) {
        config = config.with_payment_key(key);
    }
    if let Some(price_id) = env_config.price_id.clone().or(payment.price_id) {
        config = config.with_price_id(price_id);
    }
    if let Some(url) = payment.success_url {
        config.success_url = url;
    }
    if let Some(url) = payment.cancel_url {
        config.cancel_url = url;
    }
    if let Some(timeout) = env_config
        .timeout
        .as_deref()
        .or(api.request_timeout.as_deref())
        .and_then(parse_duration_string)
    {
        config = config.with_request_timeout(timeout);
    }
    if let Some(countdown) = env_config
        .countdown
        .as_deref()
        .or(wizard.countdown.as_deref())
        .and_then(parse_duration_string)
    {
        config = config.with_countdown(countdown);
    }

    config
}

/// Parse a duration string like "5s", "30s", "2m" or a bare "10".
///
/// Bare numbers are seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    let seconds = if let Some(secs) = value.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        value.parse::<u64>().ok()
    }?;

    Some(Duration::from_secs(seconds))
}
