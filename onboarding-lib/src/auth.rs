//! Bearer-token handling for authenticated API calls.
//!
//! Token-bearing operations are run through [`with_token_refresh`]: the
//! operation gets one attempt with the current token and, if the token is
//! rejected, exactly one more attempt with a fresh token obtained from an
//! injected [`TokenProvider`]. There is no backoff and no further retry.
//!
//! ```text
//! Start → Attempt1 ─┬─ Ok ───────────────────────────────→ Success
//!                   ├─ auth error → Refresh → Attempt2 ─┬→ Success
//!                   │                                   └→ Failure
//!                   └─ other error ─────────────────────→ Failure
//! ```

use crate::error::OnboardingError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Source of fresh bearer tokens.
///
/// Implementations wrap whatever authentication provider the host uses.
/// `Ok(None)` means the provider has no token to offer (e.g. the user is
/// signed out).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fresh_token(&self) -> Result<Option<String>, OnboardingError>;
}

/// Run `op` with `token`, refreshing and retrying once on an auth failure.
///
/// - On success of the first attempt the result is returned and
///   `on_token_refresh` is not called.
/// - On an error for which [`OnboardingError::is_auth_failure`] holds, a
///   fresh token is requested, passed to `on_token_refresh`, and `op` is
///   called once more with it. Whatever that second call returns is
///   returned unchanged.
/// - Any other error is returned immediately without a refresh.
///
/// If the provider yields no token, `on_token_refresh(None)` is called and
/// the original auth error is returned. If the provider itself fails, its
/// error is returned and the callback is not called.
pub async fn with_token_refresh<T, F, Fut, C>(
    mut op: F,
    token: &str,
    provider: &dyn TokenProvider,
    mut on_token_refresh: C,
) -> Result<T, OnboardingError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, OnboardingError>>,
    C: FnMut(Option<&str>),
{
    let first_error = match op(token.to_string()).await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if !first_error.is_auth_failure() {
        return Err(first_error);
    }

    tracing::warn!(error = %first_error, "bearer token rejected, requesting a fresh one");

    let fresh = provider.fresh_token().await?;
    on_token_refresh(fresh.as_deref());

    match fresh {
        Some(fresh) => op(fresh).await,
        None => Err(first_error),
    }
}

/// A bearer token plus the provider used to renew it.
///
/// `run` goes through [`with_token_refresh`] and keeps any refreshed token
/// for later calls.
pub struct TokenSession {
    provider: Arc<dyn TokenProvider>,
    token: Mutex<String>,
}

impl TokenSession {
    pub fn new<S: Into<String>>(token: S, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            token: Mutex::new(token.into()),
        }
    }

    /// The token the next call will start with.
    pub fn token(&self) -> String {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn store(&self, token: &str) {
        let mut current = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = token.to_string();
    }

    /// Run a token-bearing operation with one refresh-and-retry on auth failure.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, OnboardingError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, OnboardingError>>,
    {
        let current = self.token();
        with_token_refresh(op, &current, self.provider.as_ref(), |fresh| {
            if let Some(fresh) = fresh {
                self.store(fresh);
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        token: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new(token: Option<&'static str>) -> Self {
            Self {
                token,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn fresh_token(&self) -> Result<Option<String>, OnboardingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.token.map(str::to_string))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl TokenProvider for FailingProvider {
        async fn fresh_token(&self) -> Result<Option<String>, OnboardingError> {
            Err(OnboardingError::network("auth server unreachable"))
        }
    }

    fn unauthorized() -> OnboardingError {
        OnboardingError::http("https://api/authors/example/com", 401, "")
    }

    #[tokio::test]
    async fn test_success_skips_refresh() {
        let provider = CountingProvider::new(Some("fresh"));
        let mut refreshes = 0;

        let result = with_token_refresh(
            |token| async move { Ok::<_, OnboardingError>(token) },
            "initial",
            &provider,
            |_| refreshes += 1,
        )
        .await;

        assert_eq!(result.unwrap(), "initial");
        assert_eq!(refreshes, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auth_failure_then_success() {
        let provider = CountingProvider::new(Some("fresh"));
        let mut seen = Vec::new();
        let mut refreshed = Vec::new();

        let result = with_token_refresh(
            |token: String| {
                seen.push(token.clone());
                async move {
                    if token == "fresh" {
                        Ok(42)
                    } else {
                        Err(unauthorized())
                    }
                }
            },
            "stale",
            &provider,
            |fresh| refreshed.push(fresh.map(str::to_string)),
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(seen, vec!["stale".to_string(), "fresh".to_string()]);
        assert_eq!(refreshed, vec![Some("fresh".to_string())]);
    }

    #[tokio::test]
    async fn test_second_failure_propagates_after_single_refresh() {
        let provider = CountingProvider::new(Some("fresh"));
        let mut attempts = 0;
        let mut refreshes = 0;

        let result: Result<(), _> = with_token_refresh(
            |_| {
                attempts += 1;
                let attempt = attempts;
                async move {
                    if attempt == 1 {
                        Err(unauthorized())
                    } else {
                        Err(OnboardingError::http("https://api/x", 403, "still forbidden"))
                    }
                }
            },
            "stale",
            &provider,
            |_| refreshes += 1,
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(attempts, 2);
        assert_eq!(refreshes, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_auth_error_propagates_without_refresh() {
        let provider = CountingProvider::new(Some("fresh"));
        let mut attempts = 0;
        let mut refreshes = 0;

        let result: Result<(), _> = with_token_refresh(
            |_| {
                attempts += 1;
                async { Err(OnboardingError::http("https://api/x", 500, "boom")) }
            },
            "token",
            &provider,
            |_| refreshes += 1,
        )
        .await;

        assert_eq!(result.unwrap_err().status_code(), Some(500));
        assert_eq!(attempts, 1);
        assert_eq!(refreshes, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_without_token_reports_none() {
        let provider = CountingProvider::new(None);
        let mut attempts = 0;
        let mut refreshed = Vec::new();

        let result: Result<(), _> = with_token_refresh(
            |_| {
                attempts += 1;
                async { Err(unauthorized()) }
            },
            "stale",
            &provider,
            |fresh| refreshed.push(fresh.map(str::to_string)),
        )
        .await;

        assert!(result.unwrap_err().is_auth_failure());
        assert_eq!(attempts, 1);
        assert_eq!(refreshed, vec![None]);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let mut refreshes = 0;

        let result: Result<(), _> = with_token_refresh(
            |_| async { Err(unauthorized()) },
            "stale",
            &FailingProvider,
            |_| refreshes += 1,
        )
        .await;

        assert!(matches!(
            result,
            Err(OnboardingError::NetworkError { .. })
        ));
        assert_eq!(refreshes, 0);
    }

    #[tokio::test]
    async fn test_session_keeps_refreshed_token() {
        let provider = Arc::new(CountingProvider::new(Some("fresh")));
        let session = TokenSession::new("stale", provider.clone());

        let first = session
            .run(|token| async move {
                if token == "fresh" {
                    Ok(token)
                } else {
                    Err(unauthorized())
                }
            })
            .await
            .unwrap();
        assert_eq!(first, "fresh");
        assert_eq!(session.token(), "fresh");

        // The stored token is used straight away next time.
        let second = session
            .run(|token| async move { Ok::<_, OnboardingError>(token) })
            .await
            .unwrap();
        assert_eq!(second, "fresh");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
