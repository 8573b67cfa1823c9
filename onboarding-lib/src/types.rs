//! Core data types for the onboarding flow.
//!
//! This module defines the value objects held by a wizard session, the
//! projections of upstream API responses and the resolved client settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A domain split into its last two labels.
///
/// When the source string had fewer than two dot-separated labels both
/// fields are empty strings. `Domain::default()` is that empty value; it is
/// used both before a domain is entered and after parsing fails, and the two
/// cases are not told apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Label immediately left of the top-level domain (e.g. "example")
    pub second_level_domain: String,

    /// Rightmost label (e.g. "com")
    pub top_level_domain: String,
}

impl Domain {
    pub fn new<S: Into<String>, T: Into<String>>(second_level: S, top_level: T) -> Self {
        Self {
            second_level_domain: second_level.into(),
            top_level_domain: top_level.into(),
        }
    }

    /// True for the empty value produced by a failed parse.
    pub fn is_empty(&self) -> bool {
        self.second_level_domain.is_empty() && self.top_level_domain.is_empty()
    }

    /// Path fragment used by the author API: `<sld>/<tld>`.
    pub fn api_path(&self) -> String {
        format!("{}/{}", self.second_level_domain, self.top_level_domain)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            Ok(())
        } else {
            write!(f, "{}.{}", self.second_level_domain, self.top_level_domain)
        }
    }
}

/// Contact details collected in the second wizard step.
///
/// The type accepts any strings; required fields are checked when the
/// step is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInformation {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state_province: String,
    pub country: String,
    pub zip: String,
    pub email: String,
    pub telephone: String,
}

impl ContactInformation {
    /// Names of required fields that are blank, in form order.
    ///
    /// Every field except the second address line is required.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state_province", &self.state_province),
            ("country", &self.country),
            ("zip", &self.zip),
            ("email", &self.email),
            ("telephone", &self.telephone),
        ];

        fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Full name as sent to the payment processor.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Projection of a WHOIS service response.
///
/// Only `available` is interpreted; the literal `"yes"` means the domain
/// is free for registration. Registrar metadata is carried for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisResult {
    #[serde(default)]
    pub domain: String,

    #[serde(default)]
    pub available: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

impl WhoisResult {
    pub fn is_available(&self) -> bool {
        self.available == "yes"
    }
}

/// An article written by an author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
}

/// A published book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A social profile link (e.g. platform "mastodon").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// An author profile registered under a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default, rename = "socialLinks")]
    pub social_links: Vec<SocialLink>,
}

impl Author {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Payment processor customer creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRequest {
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub address: CustomerAddress,
}

/// Postal address in the payment processor's shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

impl From<&ContactInformation> for CustomerRequest {
    fn from(contact: &ContactInformation) -> Self {
        let line2 = contact.address_line2.trim();
        let phone = contact.telephone.trim();
        Self {
            email: contact.email.trim().to_string(),
            name: contact.full_name(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            address: CustomerAddress {
                line1: contact.address_line1.trim().to_string(),
                line2: (!line2.is_empty()).then(|| line2.to_string()),
                city: contact.city.trim().to_string(),
                state: contact.state_province.trim().to_string(),
                country: contact.country.trim().to_string(),
                postal_code: contact.zip.trim().to_string(),
            },
        }
    }
}

/// A customer as returned by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Subscription creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub customer_id: String,
    pub price_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// A subscription as returned by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

/// Checkout session creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Resolved settings for the onboarding clients.
///
/// Built from defaults, then a config file, then environment values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientConfig {
    /// WHOIS service root queried with `?q=<domain>`
    pub whois_url: String,

    /// Author API base; `<sld>/<tld>` is appended
    pub author_api_url: String,

    /// Payment processor API base; endpoint names are appended
    pub payment_api_url: String,

    /// Publishable key sent as bearer to the payment endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_key: Option<String>,

    /// Price identifier of the subscription plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,

    /// Where checkout redirects after payment
    pub success_url: String,

    /// Where checkout redirects when abandoned
    pub cancel_url: String,

    /// Optional per-request timeout; none means the caller decides
    #[serde(skip)]
    pub request_timeout: Option<Duration>,

    /// Redirect countdown shown once checkout is ready
    #[serde(skip)]
    pub countdown: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            whois_url: "https://api.whois.vu/".to_string(),
            author_api_url: "http://localhost:8080/api/authors/".to_string(),
            payment_api_url: "http://localhost:8080/api/payments/".to_string(),
            payment_key: None,
            price_id: None,
            success_url: "http://localhost:3000/onboarding/success".to_string(),
            cancel_url: "http://localhost:3000/onboarding/cancel".to_string(),
            request_timeout: None,
            countdown: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn with_whois_url<S: Into<String>>(mut self, url: S) -> Self {
        self.whois_url = url.into();
        self
    }

    pub fn with_author_api_url<S: AsRef<str>>(mut self, url: S) -> Self {
        self.author_api_url = ensure_trailing_slash(url.as_ref());
        self
    }

    pub fn with_payment_api_url<S: AsRef<str>>(mut self, url: S) -> Self {
        self.payment_api_url = ensure_trailing_slash(url.as_ref());
        self
    }

    pub fn with_payment_key<S: Into<String>>(mut self, key: S) -> Self {
        self.payment_key = Some(key.into());
        self
    }

    pub fn with_price_id<S: Into<String>>(mut self, price_id: S) -> Self {
        self.price_id = Some(price_id.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_countdown(mut self, countdown: Duration) -> Self {
        self.countdown = countdown;
        self
    }
}

/// Append `/` to a base URL unless it already ends with one.
pub(crate) fn ensure_trailing_slash(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
