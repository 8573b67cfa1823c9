//! # Onboarding Library
//!
//! Core of the publisher onboarding flow: a user picks a domain, enters
//! contact details, registers author profiles and buys a subscription.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use onboarding_lib::{is_valid_domain, parse_domain, WhoisClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = "example.com";
//!     if is_valid_domain(input) {
//!         let whois = WhoisClient::new("https://api.whois.vu/")?;
//!         let free = whois.is_available(input).await;
//!         let domain = parse_domain(input);
//!         println!("{} ({}/{}) available: {}",
//!             input, domain.second_level_domain, domain.top_level_domain, free);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Validation**: domain, email and phone predicates with no network access
//! - **WHOIS**: availability lookups that never fail loudly
//! - **Token refresh**: one refresh-and-retry for bearer-token calls
//! - **Wizard**: step sequencing and author form reducers

pub use auth::{with_token_refresh, TokenProvider, TokenSession};
pub use config::{
    env_config_from, load_env_config, parse_duration_string, resolve_client_config, ApiConfig,
    ConfigManager, EnvConfig, FileConfig, PaymentConfig, WizardConfig,
};
pub use error::OnboardingError;
pub use protocols::{AuthorClient, PaymentClient, WhoisClient};
pub use types::{
    Article, Author, Book, CheckoutRequest, CheckoutSession, ClientConfig, ContactInformation,
    Customer, CustomerAddress, CustomerRequest, Domain, SocialLink, Subscription,
    SubscriptionRequest, WhoisResult,
};
pub use utils::{is_valid_domain, is_valid_email, is_valid_phone, parse_domain, validate_domain};

// Public modules
pub mod wizard;

pub use wizard::{
    reduce_authors, AuthorEditor, AuthorListAction, Completion, DomainSubmission, FormAction,
    FormVisibility, OnboardingWizard, WizardSession, WizardStep,
};

// Internal modules - these are not part of the public API
mod auth;
mod config;
mod error;
mod protocols;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, OnboardingError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub features: Vec<&'static str>,
}

/// Get list of enabled features at compile time
#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "whois")]
    features.push("whois");

    #[cfg(feature = "payments")]
    features.push("payments");

    features
}
