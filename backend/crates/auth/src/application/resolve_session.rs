//! Resolve Session Use Case
//!
//! Turns the session cookie into an identity, refreshing the session when
//! it is about to expire. Never fails: every problem collapses to
//! "unauthenticated", with a cookie mutation when the stored session has to
//! change.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::domain::identity::Identity;
use crate::domain::provider::IdentityProvider;
use crate::domain::session::{CookieMutation, SessionTokens};

/// Outcome of session resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionResolution {
    pub identity: Option<Identity>,
    /// Tokens backing `identity`, after any rotation
    pub tokens: Option<SessionTokens>,
    /// Change the response must make to the session cookie
    pub mutation: Option<CookieMutation>,
}

impl SessionResolution {
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn cleared() -> Self {
        Self {
            mutation: Some(CookieMutation::Clear),
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Resolve session use case
pub struct ResolveSessionUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<P> ResolveSessionUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>, config: Arc<AuthConfig>) -> Self {
        Self { provider, config }
    }

    /// Resolve the raw session cookie value, if any
    pub async fn execute(&self, raw_cookie: Option<&str>) -> SessionResolution {
        self.execute_at(raw_cookie, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        raw_cookie: Option<&str>,
        now: DateTime<Utc>,
    ) -> SessionResolution {
        let Some(raw_cookie) = raw_cookie else {
            return SessionResolution::anonymous();
        };

        let stored = match SessionTokens::from_cookie_value(raw_cookie) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::debug!(error = %e, "Discarding unreadable session cookie");
                return SessionResolution::cleared();
            }
        };

        let mut mutation = None;
        let tokens = if stored.is_expiring(now, self.config.refresh_margin()) {
            if stored.refresh_token.is_empty() {
                tracing::debug!("Expiring session has no refresh token");
                return SessionResolution::cleared();
            }

            match self.provider.refresh_session(&stored.refresh_token).await {
                Ok(rotated) => {
                    let rotated = rotated.stamped(now);
                    tracing::debug!(expires_at = ?rotated.expires_at, "Session rotated");
                    mutation = Some(CookieMutation::Set(rotated.clone()));
                    rotated
                }
                Err(e) if e.is_rejection() => {
                    tracing::debug!(error = %e, "Refresh token rejected");
                    return SessionResolution::cleared();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Session refresh failed");
                    return SessionResolution::anonymous();
                }
            }
        } else {
            stored
        };

        match self.provider.get_user(&tokens.access_token).await {
            Ok(identity) => SessionResolution {
                identity: Some(identity),
                tokens: Some(tokens),
                mutation,
            },
            Err(e) => {
                if e.is_rejection() {
                    tracing::debug!(error = %e, "Access token rejected");
                } else {
                    tracing::warn!(error = %e, "Session verification failed");
                }
                SessionResolution {
                    identity: None,
                    tokens: None,
                    mutation,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::test_support::tokens;
    use crate::testing::FakeProvider;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn use_case(provider: &Arc<FakeProvider>) -> ResolveSessionUseCase<FakeProvider> {
        ResolveSessionUseCase::new(provider.clone(), Arc::new(AuthConfig::default()))
    }

    fn cookie(session: &SessionTokens) -> String {
        session.to_cookie_value().unwrap()
    }

    #[tokio::test]
    async fn test_no_cookie_is_anonymous() {
        let provider = Arc::new(FakeProvider::new());
        let resolution = use_case(&provider).execute_at(None, now()).await;

        assert_eq!(resolution, SessionResolution::anonymous());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_valid_session() {
        let provider = Arc::new(FakeProvider::new());
        let identity = provider.add_user("access-1", "anna@example.com");
        let session = tokens("access-1", "refresh-1", now().timestamp() + 3600);

        let resolution = use_case(&provider)
            .execute_at(Some(&cookie(&session)), now())
            .await;

        assert_eq!(resolution.identity, Some(identity));
        assert_eq!(resolution.tokens, Some(session));
        assert_eq!(resolution.mutation, None);
        assert_eq!(provider.calls(), vec!["get_user"]);
    }

    #[tokio::test]
    async fn test_malformed_cookie_is_cleared() {
        let provider = Arc::new(FakeProvider::new());
        let resolution = use_case(&provider)
            .execute_at(Some("base64-%%%"), now())
            .await;

        assert!(!resolution.is_authenticated());
        assert_eq!(resolution.mutation, Some(CookieMutation::Clear));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_expiring_session_is_rotated() {
        let provider = Arc::new(FakeProvider::new());
        let identity = provider.add_user("access-2", "anna@example.com");
        let rotated = tokens("access-2", "refresh-2", now().timestamp() + 3600);
        provider.add_refresh("refresh-1", rotated.clone());
        let stale = tokens("access-1", "refresh-1", now().timestamp() + 30);

        let resolution = use_case(&provider)
            .execute_at(Some(&cookie(&stale)), now())
            .await;

        assert_eq!(resolution.identity, Some(identity));
        assert_eq!(resolution.mutation, Some(CookieMutation::Set(rotated)));
        assert_eq!(provider.calls(), vec!["refresh_session", "get_user"]);
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_cookie() {
        let provider = Arc::new(FakeProvider::new());
        let expired = tokens("access-1", "revoked", now().timestamp() - 10);

        let resolution = use_case(&provider)
            .execute_at(Some(&cookie(&expired)), now())
            .await;

        assert!(!resolution.is_authenticated());
        assert_eq!(resolution.mutation, Some(CookieMutation::Clear));
    }

    #[tokio::test]
    async fn test_provider_outage_keeps_cookie() {
        let provider = Arc::new(FakeProvider::new());
        provider.set_outage(true);
        let expired = tokens("access-1", "refresh-1", now().timestamp() - 10);

        let resolution = use_case(&provider)
            .execute_at(Some(&cookie(&expired)), now())
            .await;

        assert!(!resolution.is_authenticated());
        assert_eq!(resolution.mutation, None);
    }

    #[tokio::test]
    async fn test_rotation_survives_failed_verification() {
        let provider = Arc::new(FakeProvider::new());
        let rotated = tokens("unknown-access", "refresh-2", now().timestamp() + 3600);
        provider.add_refresh("refresh-1", rotated.clone());
        let stale = tokens("access-1", "refresh-1", now().timestamp() - 10);

        let resolution = use_case(&provider)
            .execute_at(Some(&cookie(&stale)), now())
            .await;

        assert!(!resolution.is_authenticated());
        assert_eq!(resolution.mutation, Some(CookieMutation::Set(rotated)));
    }

    #[tokio::test]
    async fn test_rejected_access_token_without_rotation() {
        let provider = Arc::new(FakeProvider::new());
        let session = tokens("forged", "refresh-1", now().timestamp() + 3600);

        let resolution = use_case(&provider)
            .execute_at(Some(&cookie(&session)), now())
            .await;

        assert!(!resolution.is_authenticated());
        assert_eq!(resolution.mutation, None);
    }
}
