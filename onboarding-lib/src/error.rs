//! Error handling for onboarding operations.
//!
//! This module defines the error type shared by the validators, the HTTP
//! clients, the token retry wrapper and the wizard.

use std::fmt;

/// Main error type for onboarding operations.
///
/// Validation predicates never produce this type; they return `bool`.
/// The Result-returning companions and every network call do.
#[derive(Debug, Clone)]
pub enum OnboardingError {
    /// Invalid domain name format
    InvalidDomain { domain: String, reason: String },

    /// Contact information failed submit-time checks
    InvalidContact { field: String, reason: String },

    /// Author profile failed submit-time checks
    InvalidAuthor { author: String, reason: String },

    /// Network-related errors (connection, DNS, TLS, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Non-2xx response from an upstream API
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// Credentials were rejected and could not be recovered
    Unauthorized { message: String },

    /// WHOIS service specific errors
    WhoisError { domain: String, message: String },

    /// JSON parsing errors for API responses
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration
    FileError { path: String, message: String },

    /// Timeout errors when operations take too long.
    ///
    /// `duration` is only known when the caller set the limit itself.
    Timeout {
        operation: String,
        duration: Option<std::time::Duration>,
    },

    /// A wizard step was submitted out of order
    InvalidStep { expected: String, actual: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl OnboardingError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid contact error.
    pub fn invalid_contact<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::InvalidContact {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid author error.
    pub fn invalid_author<A: Into<String>, R: Into<String>>(author: A, reason: R) -> Self {
        Self::InvalidAuthor {
            author: author.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new HTTP status error.
    pub fn http<U: Into<String>, B: Into<String>>(url: U, status: u16, body: B) -> Self {
        Self::Http {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a new unauthorized error.
    pub fn unauthorized<M: Into<String>>(message: M) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new WHOIS error.
    pub fn whois<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::WhoisError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Option<std::time::Duration>) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new wizard step error.
    pub fn invalid_step<E: Into<String>, A: Into<String>>(expected: E, actual: A) -> Self {
        Self::InvalidStep {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error means the bearer token was rejected.
    ///
    /// Only these errors make the token retry wrapper refresh and retry.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::Http { status: 401 | 403, .. }
        )
    }
}

impl fmt::Display for OnboardingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::InvalidContact { field, reason } => {
                write!(f, "Invalid contact field '{}': {}", field, reason)
            }
            Self::InvalidAuthor { author, reason } => {
                write!(f, "Invalid author '{}': {}", author, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Http { url, status, body } => {
                if body.is_empty() {
                    write!(f, "HTTP {} from {}", status, url)
                } else {
                    write!(f, "HTTP {} from {}: {}", status, url, body)
                }
            }
            Self::Unauthorized { message } => {
                write!(f, "Unauthorized: {}", message)
            }
            Self::WhoisError { domain, message } => {
                write!(f, "WHOIS error for '{}': {}", domain, message)
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration: Some(duration),
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Timeout {
                operation,
                duration: None,
            } => {
                write!(f, "Timeout during: {}", operation)
            }
            Self::InvalidStep { expected, actual } => {
                write!(
                    f,
                    "Wizard is at step '{}', cannot submit '{}'",
                    expected, actual
                )
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for OnboardingError {}

impl From<reqwest::Error> for OnboardingError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            Self::http(url, status.as_u16(), "")
        } else if err.is_timeout() {
            // reqwest does not report which limit fired
            Self::timeout("HTTP request", None)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_decode() {
            Self::ParseError {
                message: format!("Response body could not be decoded: {}", err),
                content: None,
            }
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for OnboardingError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<std::io::Error> for OnboardingError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
