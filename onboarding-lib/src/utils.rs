//! Validation and parsing helpers for wizard input.
//!
//! This module contains the pure predicates used by the wizard: domain
//! syntax, domain decomposition, email and phone checks. None of them touch
//! the network and none of them panic.

use crate::error::OnboardingError;
use crate::types::Domain;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Labels of 1-63 `[A-Za-z0-9-]` chars each followed by a dot, then an
    /// alphabetic label of 2+ chars, optionally one more (for `co.uk`).
    static ref DOMAIN_PATTERN: Regex =
        Regex::new(r"^(?:[A-Za-z0-9-]{1,63}\.)+[A-Za-z]{2,}(?:\.[A-Za-z]{2,})?$")
            .expect("domain pattern is valid");

    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");

    static ref PHONE_PATTERN: Regex =
        Regex::new(r"^\+?[0-9 ().\-]+$").expect("phone pattern is valid");
}

/// Minimum number of digits a phone number must carry.
const MIN_PHONE_DIGITS: usize = 7;

/// Check whether a string is a syntactically valid domain name.
///
/// The input is trimmed first. No normalisation is applied, so case is
/// kept as typed.
///
/// # Examples
///
/// ```
/// use onboarding_lib::is_valid_domain;
///
/// assert!(is_valid_domain("example.com"));
/// assert!(is_valid_domain("news.example.co.uk"));
/// assert!(!is_valid_domain("localhost"));
/// ```
pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN_PATTERN.is_match(domain.trim())
}

/// Validate a domain name and explain why it was rejected.
///
/// Accepts exactly the inputs `is_valid_domain` accepts; the reason is only
/// meant for user-facing messages.
///
/// # Returns
///
/// `Ok(())` if valid, `Err(OnboardingError::InvalidDomain)` if invalid.
pub fn validate_domain(domain: &str) -> Result<(), OnboardingError> {
    if is_valid_domain(domain) {
        return Ok(());
    }

    let trimmed = domain.trim();
    let reason = if trimmed.is_empty() {
        "Domain name cannot be empty"
    } else if !trimmed.contains('.') {
        "Domain name must contain at least one dot"
    } else if trimmed.starts_with('.') || trimmed.ends_with('.') {
        "Domain name cannot start or end with a dot"
    } else if trimmed.contains("..") {
        "Domain name cannot contain consecutive dots"
    } else if trimmed.split('.').any(|label| label.len() > 63) {
        "Domain labels must be at most 63 characters"
    } else if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        "Domain name may only contain letters, digits, hyphens and dots"
    } else {
        "Top-level domain must be at least two letters"
    };

    Err(OnboardingError::invalid_domain(trimmed, reason))
}

/// Split a domain into its second-level and top-level labels.
///
/// Only the last two labels are kept: `sub.example.co.uk` yields `co` and
/// `uk`. Inputs with fewer than two labels yield `Domain::default()`. The
/// input is not validated.
pub fn parse_domain(domain: &str) -> Domain {
    let labels: Vec<&str> = domain.trim().split('.').collect();

    match labels.as_slice() {
        [.., second_level, top_level] => Domain::new(*second_level, *top_level),
        _ => Domain::default(),
    }
}

/// Check for the `local@domain` shape, with a dot in the domain part.
///
/// No DNS or MX lookup is performed.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Check a phone number: optional leading `+`, then digits, spaces, dashes,
/// parentheses or periods, with at least seven digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
        && phone.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_domain() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("my-site.io"));
        assert!(is_valid_domain("example.co.uk"));
        assert!(is_valid_domain("a.b.example.org"));
        assert!(is_valid_domain("  padded.net  "));
        assert!(is_valid_domain("Example.COM"));
        assert!(is_valid_domain("123.example.com"));

        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("nodots"));
        assert!(!is_valid_domain("example..com"));
        assert!(!is_valid_domain(".example.com"));
        assert!(!is_valid_domain("example.com."));
        assert!(!is_valid_domain("example.c"));
        assert!(!is_valid_domain("example.c0m"));
        assert!(!is_valid_domain("exa_mple.com"));
    }

    #[test]
    fn test_label_length_limit() {
        let ok = format!("{}.com", "a".repeat(63));
        let too_long = format!("{}.com", "a".repeat(64));
        assert!(is_valid_domain(&ok));
        assert!(!is_valid_domain(&too_long));
    }

    #[test]
    fn test_validate_domain_agrees_with_predicate() {
        let inputs = [
            "example.com",
            "",
            "nodots",
            "example..com",
            ".com",
            "example.",
            "bad_char.com",
            "example.x",
            "sub.example.co.uk",
        ];

        for input in inputs {
            assert_eq!(
                validate_domain(input).is_ok(),
                is_valid_domain(input),
                "disagreement for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_validate_domain_reasons() {
        match validate_domain("nodots") {
            Err(OnboardingError::InvalidDomain { reason, .. }) => {
                assert!(reason.contains("dot"))
            }
            other => panic!("unexpected result: {:?}", other),
        }

        match validate_domain("") {
            Err(OnboardingError::InvalidDomain { reason, .. }) => {
                assert!(reason.contains("empty"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_domain() {
        assert_eq!(parse_domain("example.com"), Domain::new("example", "com"));
        assert_eq!(parse_domain("a.b.co.uk"), Domain::new("co", "uk"));
        assert_eq!(parse_domain("sub.example.co.uk"), Domain::new("co", "uk"));
        assert_eq!(parse_domain("  example.org "), Domain::new("example", "org"));
        assert_eq!(parse_domain("nodots"), Domain::default());
        assert_eq!(parse_domain(""), Domain::default());
    }

    #[test]
    fn test_parse_domain_degrades_on_malformed_input() {
        assert_eq!(parse_domain(".com"), Domain::new("", "com"));
        assert_eq!(parse_domain("example."), Domain::new("example", ""));
        assert!(parse_domain("   ").is_empty());
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));

        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("user@exa mple.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_is_valid_phone() {
        assert!(is_valid_phone("+1234567890"));
        assert!(is_valid_phone("(555) 123-4567"));
        assert!(is_valid_phone("+44 20.7946.0000"));

        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("+1 (555) abc-defg"));
        assert!(!is_valid_phone("123+4567890"));
        assert!(!is_valid_phone("() -- .."));
    }

    #[test]
    fn test_predicates_are_idempotent() {
        for input in ["example.com", "nodots", "test@example.com", "+1234567890"] {
            assert_eq!(is_valid_domain(input), is_valid_domain(input));
            assert_eq!(is_valid_email(input), is_valid_email(input));
            assert_eq!(is_valid_phone(input), is_valid_phone(input));
        }
    }
}
