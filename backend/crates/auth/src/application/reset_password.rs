//! Password Reset Use Cases
//!
//! Requesting a recovery email, and setting the new password once the user
//! is back with a recovery session.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::credentials::{Email, NewPassword};
use crate::domain::provider::IdentityProvider;
use crate::domain::session::SessionTokens;
use crate::error::{AuthError, AuthResult};

/// Request password reset use case
pub struct RequestPasswordResetUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<P> RequestPasswordResetUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>, config: Arc<AuthConfig>) -> Self {
        Self { provider, config }
    }

    pub async fn execute(&self, email: String) -> AuthResult<()> {
        let email = Email::new(email)?;
        let redirect_to = self.config.site_link(&self.config.reset_confirm_path);

        self.provider.recover_password(&email, &redirect_to).await?;

        tracing::info!("Password recovery email requested");
        Ok(())
    }
}

/// Update password use case
pub struct UpdatePasswordUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
}

impl<P> UpdatePasswordUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Change the password of the signed-in user
    pub async fn execute(
        &self,
        tokens: Option<&SessionTokens>,
        password: String,
    ) -> AuthResult<()> {
        let tokens = tokens.ok_or(AuthError::SessionMissing)?;
        let password = NewPassword::new(password)?;

        self.provider
            .update_password(&tokens.access_token, &password)
            .await?;

        tracing::info!("Password updated");
        Ok(())
    }
}
