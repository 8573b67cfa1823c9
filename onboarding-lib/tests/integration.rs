// onboarding-lib/tests/integration.rs

//! Integration tests for onboarding-lib exports and core functionality

use async_trait::async_trait;
use httpmock::prelude::*;
use onboarding_lib::{
    info, is_valid_domain, is_valid_email, is_valid_phone, parse_domain, with_token_refresh,
    AuthorClient, Domain, OnboardingError, TokenProvider, TokenSession, WhoisClient,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct StaticProvider {
    token: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl TokenProvider for StaticProvider {
    async fn fresh_token(&self) -> Result<Option<String>, OnboardingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.token.to_string()))
    }
}

#[test]
fn test_library_info() {
    let info = info();
    assert!(!info.version.is_empty());
    assert!(info.features.contains(&"whois"));
}

#[test]
fn test_documented_examples() {
    assert_eq!(parse_domain("example.com"), Domain::new("example", "com"));
    assert_eq!(parse_domain("a.b.co.uk"), Domain::new("co", "uk"));
    assert_eq!(parse_domain("nodots"), Domain::default());

    assert!(is_valid_email("test@example.com"));
    assert!(!is_valid_email("invalid-email"));
    assert!(is_valid_phone("+1234567890"));
    assert!(!is_valid_phone("12345"));
}

#[test]
fn test_dotted_labels_with_alpha_tld_are_valid() {
    let labels = ["a", "example", "my-site", "x1", "123"];
    let tlds = ["io", "com", "museum"];

    for label in labels {
        for tld in tlds {
            let domain = format!("{}.{}", label, tld);
            assert!(is_valid_domain(&domain), "{} should be valid", domain);
            assert!(
                !is_valid_domain(&format!("{}{}", label, tld)),
                "{}{} has no dot",
                label,
                tld
            );
        }
    }
}

#[test]
fn test_validated_domains_always_parse() {
    for input in ["example.com", "blog.example.org", "example.co.uk"] {
        assert!(is_valid_domain(input));
        assert!(!parse_domain(input).is_empty());
    }
}

#[test]
fn test_whois_network_error_does_not_propagate() {
    let whois = WhoisClient::new("http://127.0.0.1:1/").unwrap();
    assert!(!tokio_test::block_on(whois.is_available("example.com")));
}

#[tokio::test]
async fn test_author_lookup_refreshes_expired_token() {
    let server = MockServer::start_async().await;

    let stale = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/authors/example/com")
                .header("authorization", "Bearer stale");
            then.status(401).body("expired");
        })
        .await;
    let fresh = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/authors/example/com")
                .header("authorization", "Bearer fresh");
            then.status(200)
                .json_body(serde_json::json!([{ "name": "Ada Lovelace" }]));
        })
        .await;

    let provider = Arc::new(StaticProvider {
        token: "fresh",
        calls: AtomicUsize::new(0),
    });
    let session = TokenSession::new("stale", provider.clone());
    let client = AuthorClient::new(server.url("/authors")).unwrap();
    let domain = Domain::new("example", "com");

    let authors = session
        .run(|token| {
            let client = &client;
            let domain = &domain;
            async move { client.fetch_authors(&token, domain).await }
        })
        .await
        .unwrap();

    assert_eq!(authors.len(), 1);
    assert_eq!(session.token(), "fresh");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    stale.assert_async().await;
    fresh.assert_async().await;
}

#[tokio::test]
async fn test_forbidden_twice_refreshes_once() {
    let server = MockServer::start_async().await;
    let forbidden = server
        .mock_async(|when, then| {
            when.method(GET).path("/authors/example/com");
            then.status(403).body("no access");
        })
        .await;

    let provider = StaticProvider {
        token: "fresh",
        calls: AtomicUsize::new(0),
    };
    let client = AuthorClient::new(server.url("/authors/")).unwrap();
    let domain = Domain::new("example", "com");
    let mut refreshed = Vec::new();

    let result = with_token_refresh(
        |token| {
            let client = &client;
            let domain = &domain;
            async move { client.fetch_authors(&token, domain).await }
        },
        "stale",
        &provider,
        |token| refreshed.push(token.map(str::to_string)),
    )
    .await;

    assert_eq!(result.unwrap_err().status_code(), Some(403));
    assert_eq!(refreshed, vec![Some("fresh".to_string())]);
    assert_eq!(forbidden.hits_async().await, 2);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start_async().await;
    let missing = server
        .mock_async(|when, then| {
            when.method(GET).path("/authors/unknown/org");
            then.status(404);
        })
        .await;

    let provider = StaticProvider {
        token: "fresh",
        calls: AtomicUsize::new(0),
    };
    let client = AuthorClient::new(server.url("/authors/")).unwrap();
    let domain = Domain::new("unknown", "org");

    let result = with_token_refresh(
        |token| {
            let client = &client;
            let domain = &domain;
            async move { client.fetch_authors(&token, domain).await }
        },
        "token",
        &provider,
        |_| {},
    )
    .await;

    assert_eq!(result.unwrap_err().status_code(), Some(404));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(missing.hits_async().await, 1);
}
