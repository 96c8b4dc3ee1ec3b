//! Sign In Use Case
//!
//! Password sign-in against the identity provider.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::credentials::Email;
use crate::domain::identity::Identity;
use crate::domain::provider::IdentityProvider;
use crate::domain::session::SessionTokens;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub identity: Identity,
    /// Session to store in the cookie
    pub tokens: SessionTokens,
}

/// Sign in use case
pub struct SignInUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
}

impl<P> SignInUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let email = Email::new(input.email)?;
        if input.password.is_empty() {
            return Err(AuthError::InvalidInput("Password is required".to_string()));
        }

        let tokens = self
            .provider
            .sign_in_with_password(&email, &input.password)
            .await?
            .stamped(Utc::now());

        let identity = session_identity(self.provider.as_ref(), &tokens).await?;

        tracing::info!(user_id = %identity.user_id, "User signed in");

        Ok(SignInOutput { identity, tokens })
    }
}

/// Identity for a fresh session: the embedded user object when the provider
/// sent one, otherwise a `get_user` round trip.
pub(crate) async fn session_identity<P>(
    provider: &P,
    tokens: &SessionTokens,
) -> AuthResult<Identity>
where
    P: IdentityProvider,
{
    if let Some(user) = &tokens.user {
        match Identity::from_user_json(user) {
            Ok(identity) => return Ok(identity),
            Err(e) => tracing::debug!(error = %e, "Ignoring unreadable embedded user"),
        }
    }
    provider.get_user(&tokens.access_token).await
}
