//! WHOIS availability lookups over HTTP.
//!
//! The onboarding flow asks a third-party WHOIS service whether a domain is
//! still free before letting the user continue. The service answers with a
//! JSON document whose `available` field is the literal `"yes"` for free
//! domains.

use crate::error::OnboardingError;
use crate::types::WhoisResult;
use std::time::Duration;

/// Client for the WHOIS lookup service.
///
/// Requests are plain `GET <base_url>?q=<domain>` calls without credentials.
#[derive(Clone)]
pub struct WhoisClient {
    /// HTTP client for making WHOIS requests
    http_client: reqwest::Client,
    /// Service root the `q` parameter is appended to
    base_url: String,
}

impl WhoisClient {
    /// Create a new WHOIS client without a request timeout.
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self, OnboardingError> {
        Self::with_config(base_url, None)
    }

    /// Create a new WHOIS client with a custom timeout.
    pub fn with_timeout<S: Into<String>>(
        base_url: S,
        timeout: Duration,
    ) -> Result<Self, OnboardingError> {
        Self::with_config(base_url, Some(timeout))
    }

    /// Create a new WHOIS client, optionally bounding each request.
    pub fn with_config<S: Into<String>>(
        base_url: S,
        timeout: Option<Duration>,
    ) -> Result<Self, OnboardingError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            OnboardingError::network_with_source("Failed to create WHOIS HTTP client", e.to_string())
        })?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Look a domain up and return the service's answer.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError` if:
    /// - The request cannot be sent
    /// - The service answers with a non-2xx status
    /// - The body is not a JSON object with the expected fields
    pub async fn lookup(&self, domain: &str) -> Result<WhoisResult, OnboardingError> {
        tracing::debug!(domain, url = %self.base_url, "WHOIS lookup");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("q", domain)])
            .send()
            .await
            .map_err(|e| OnboardingError::whois(domain, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OnboardingError::http(&self.base_url, status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OnboardingError::whois(domain, format!("Failed to read body: {}", e)))?;

        let result: WhoisResult =
            serde_json::from_str(&body).map_err(|e| OnboardingError::ParseError {
                message: format!("WHOIS response for '{}' is not valid JSON: {}", domain, e),
                content: Some(body.clone()),
            })?;

        Ok(result)
    }

    /// Check whether a domain is free for registration.
    ///
    /// Any failure (network error, non-2xx status, malformed body) is
    /// reported as `false`: availability could not be confirmed. No retries
    /// are made.
    pub async fn is_available(&self, domain: &str) -> bool {
        self.check_availability(domain).await.0
    }

    /// Like [`is_available`](Self::is_available), also returning the
    /// service's answer when there was one.
    pub async fn check_availability(&self, domain: &str) -> (bool, Option<WhoisResult>) {
        match self.lookup(domain).await {
            Ok(result) => {
                let available = result.is_available();
                tracing::debug!(domain, available, "WHOIS answer");
                (available, Some(result))
            }
            Err(e) => {
                tracing::warn!(domain, error = %e, "WHOIS lookup failed, treating domain as unavailable");
                (false, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_available_yes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/").query_param("q", "fresh-name.com");
                then.status(200)
                    .json_body(serde_json::json!({ "domain": "fresh-name.com", "available": "yes" }));
            })
            .await;

        let client = WhoisClient::new(server.url("/")).unwrap();
        assert!(client.is_available("fresh-name.com").await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_available_no() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).json_body(serde_json::json!({
                    "domain": "example.com",
                    "available": "no",
                    "registrar": "RESERVED-Internet Assigned Numbers Authority"
                }));
            })
            .await;

        let client = WhoisClient::new(server.url("/")).unwrap();
        assert!(!client.is_available("example.com").await);

        let detail = client.lookup("example.com").await.unwrap();
        assert_eq!(detail.available, "no");
        assert!(detail.registrar.is_some());

        let (available, answer) = client.check_availability("example.com").await;
        assert!(!available);
        assert_eq!(answer, Some(detail));
    }

    #[tokio::test]
    async fn test_lookup_sends_no_credentials() {
        let server = MockServer::start_async().await;
        let with_auth = server
            .mock_async(|when, then| {
                when.method(GET).path("/").header_exists("authorization");
                then.status(200).json_body(serde_json::json!({ "available": "no" }));
            })
            .await;
        let anonymous = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).json_body(serde_json::json!({ "available": "yes" }));
            })
            .await;

        let client = WhoisClient::new(server.url("/")).unwrap();
        assert!(client.is_available("fresh-name.com").await);

        assert_eq!(with_auth.hits_async().await, 0);
        assert_eq!(anonymous.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_false() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(502).body("bad gateway");
            })
            .await;

        let client = WhoisClient::new(server.url("/")).unwrap();
        assert_eq!(client.check_availability("example.com").await, (false, None));

        let err = client.lookup("example.com").await.unwrap_err();
        assert_eq!(err.status_code(), Some(502));
    }

    #[tokio::test]
    async fn test_malformed_json_maps_to_false() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let client = WhoisClient::new(server.url("/")).unwrap();
        assert!(!client.is_available("example.com").await);
        assert!(matches!(
            client.lookup("example.com").await,
            Err(OnboardingError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_network_failure_maps_to_false() {
        // Nothing listens on port 9 (discard) on test machines.
        let client = WhoisClient::with_timeout("http://127.0.0.1:9/", Duration::from_secs(2)).unwrap();
        assert!(!client.is_available("example.com").await);
    }
}
