//! Author API client.
//!
//! Author profiles are scoped to a domain: the API path is the base URL
//! followed by `<second-level>/<top-level>`. Every call carries a bearer
//! token, so callers normally go through `TokenSession::run`.

use crate::error::OnboardingError;
use crate::types::{Author, Domain};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::time::Duration;

/// Client for the domain-scoped author API.
#[derive(Clone)]
pub struct AuthorClient {
    http_client: reqwest::Client,
    /// Base URL ending with `/`
    base_url: String,
}

impl AuthorClient {
    pub fn new<S: AsRef<str>>(base_url: S) -> Result<Self, OnboardingError> {
        Self::with_config(base_url, None)
    }

    pub fn with_config<S: AsRef<str>>(
        base_url: S,
        timeout: Option<Duration>,
    ) -> Result<Self, OnboardingError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            OnboardingError::network_with_source("Failed to create author HTTP client", e.to_string())
        })?;

        Ok(Self {
            http_client,
            base_url: crate::types::ensure_trailing_slash(base_url.as_ref()),
        })
    }

    /// URL of the author collection for a domain.
    pub fn domain_url(&self, domain: &Domain) -> String {
        format!("{}{}", self.base_url, domain.api_path())
    }

    /// Fetch the authors registered for a domain.
    ///
    /// # Errors
    ///
    /// A non-2xx answer becomes `OnboardingError::Http` with the status, so
    /// 401/403 are recognised by the token retry wrapper.
    pub async fn fetch_authors(
        &self,
        token: &str,
        domain: &Domain,
    ) -> Result<Vec<Author>, OnboardingError> {
        let url = self.domain_url(domain);
        tracing::debug!(%url, "fetching authors");

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OnboardingError::http(url, status.as_u16(), body));
        }

        Ok(response.json::<Vec<Author>>().await?)
    }

    /// Register an author profile under a domain and return the stored copy.
    pub async fn register_author(
        &self,
        token: &str,
        domain: &Domain,
        author: &Author,
    ) -> Result<Author, OnboardingError> {
        let url = self.domain_url(domain);
        tracing::debug!(%url, author = %author.name, "registering author");

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json")
            .json(author)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OnboardingError::http(url, status.as_u16(), body));
        }

        Ok(response.json::<Author>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_domain_url() {
        let client = AuthorClient::new("https://authors.example/api").unwrap();
        assert_eq!(
            client.domain_url(&Domain::new("example", "com")),
            "https://authors.example/api/example/com"
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_and_accept() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/authors/example/com")
                    .header("authorization", "Bearer tok-1")
                    .header("accept", "application/json");
                then.status(200).json_body(serde_json::json!([
                    { "name": "Ada Lovelace", "bio": "Analyst", "articles": [], "books": [], "socialLinks": [] }
                ]));
            })
            .await;

        let client = AuthorClient::new(server.url("/authors/")).unwrap();
        let authors = client
            .fetch_authors("tok-1", &Domain::new("example", "com"))
            .await
            .unwrap();

        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].name, "Ada Lovelace");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_surfaces_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/authors/example/com");
                then.status(401).body("token expired");
            })
            .await;

        let client = AuthorClient::new(server.url("/authors/")).unwrap();
        let err = client
            .fetch_authors("stale", &Domain::new("example", "com"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(401));
        assert!(err.is_auth_failure());
    }
}
