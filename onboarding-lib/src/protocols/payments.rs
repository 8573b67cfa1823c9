//! Payment processor client.
//!
//! Customers, subscriptions and checkout sessions are created with JSON
//! POSTs against the processor's API base. The publishable key, when
//! configured, travels as a bearer token.

use crate::error::OnboardingError;
use crate::types::{
    CheckoutRequest, CheckoutSession, Customer, CustomerRequest, Subscription,
    SubscriptionRequest,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Client for the payment processor endpoints.
#[derive(Clone)]
pub struct PaymentClient {
    http_client: reqwest::Client,
    /// Base URL ending with `/`
    base_url: String,
    /// Optional bearer credential
    api_key: Option<String>,
}

impl PaymentClient {
    pub fn new<S: AsRef<str>>(base_url: S, api_key: Option<String>) -> Result<Self, OnboardingError> {
        Self::with_config(base_url, api_key, None)
    }

    pub fn with_config<S: AsRef<str>>(
        base_url: S,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, OnboardingError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            OnboardingError::network_with_source("Failed to create payment HTTP client", e.to_string())
        })?;

        Ok(Self {
            http_client,
            base_url: crate::types::ensure_trailing_slash(base_url.as_ref()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub async fn create_customer(
        &self,
        request: &CustomerRequest,
    ) -> Result<Customer, OnboardingError> {
        self.post("customers", request).await
    }

    pub async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> Result<Subscription, OnboardingError> {
        self.post("subscriptions", request).await
    }

    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, OnboardingError> {
        self.post("checkout-sessions", request).await
    }

    /// POST a JSON body and decode the JSON answer.
    ///
    /// Non-2xx answers become `OnboardingError::Http` carrying the status
    /// and the response body text.
    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, OnboardingError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, "payment request");

        let mut request = self
            .http_client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OnboardingError::http(url, status.as_u16(), text));
        }

        Ok(response.json::<R>().await?)
    }
}
