//! Adopt Session Use Case
//!
//! Implicit-flow logins hand tokens to the browser in the URL fragment. The
//! auth-handler page posts them here so they end up in the HttpOnly session
//! cookie like any other session, after the provider confirms them.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::sign_in::SignInOutput;
use crate::domain::provider::IdentityProvider;
use crate::domain::session::{SessionTokens, jwt_expiry};
use crate::error::{AuthError, AuthResult};

/// Tokens read from the fragment
pub struct AdoptSessionInput {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<i64>,
}

/// Adopt session use case
pub struct AdoptSessionUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
}

impl<P> AdoptSessionUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub async fn execute(&self, input: AdoptSessionInput) -> AuthResult<SignInOutput> {
        self.execute_at(input, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        input: AdoptSessionInput,
        now: DateTime<Utc>,
    ) -> AuthResult<SignInOutput> {
        if input.access_token.is_empty() {
            return Err(AuthError::InvalidInput(
                "No authentication data".to_string(),
            ));
        }

        let identity = self.provider.get_user(&input.access_token).await?;

        let expires_at = jwt_expiry(&input.access_token);
        let expires_in = match (input.expires_in, expires_at) {
            (Some(expires_in), _) => expires_in,
            (None, Some(expires_at)) => (expires_at - now.timestamp()).max(0),
            (None, None) => 0,
        };

        let tokens = SessionTokens {
            access_token: input.access_token,
            refresh_token: input.refresh_token,
            token_type: "bearer".to_string(),
            expires_in,
            expires_at,
            user: None,
        }
        .stamped(now);

        tracing::info!(user_id = %identity.user_id, "Session adopted from implicit flow");

        Ok(SignInOutput { identity, tokens })
    }
}
