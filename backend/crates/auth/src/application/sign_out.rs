//! Sign Out Use Case
//!
//! Revokes the session at the provider. Best effort: the caller clears the
//! cookies whatever happens here.

use std::sync::Arc;

use crate::domain::provider::IdentityProvider;
use crate::domain::session::SessionTokens;

/// Sign out use case
pub struct SignOutUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
}

impl<P> SignOutUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Returns whether the provider confirmed the revocation
    pub async fn execute(&self, tokens: Option<&SessionTokens>) -> bool {
        let Some(tokens) = tokens else {
            return false;
        };

        match self.provider.sign_out(&tokens.access_token).await {
            Ok(()) => {
                tracing::info!("User signed out");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider sign-out failed, clearing cookies anyway");
                false
            }
        }
    }
}
