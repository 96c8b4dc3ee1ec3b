//! Sign Up Use Case
//!
//! Registers a new account. Depending on the provider's settings the user is
//! either signed in straight away or sent a confirmation email that links
//! back to the callback route.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::credentials::{Email, NewPassword, PersonName};
use crate::domain::provider::{IdentityProvider, NewAccount, SignUpOutcome};
use crate::error::AuthResult;

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Sign up use case
pub struct SignUpUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<P> SignUpUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>, config: Arc<AuthConfig>) -> Self {
        Self { provider, config }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutcome> {
        let account = NewAccount {
            email: Email::new(input.email)?,
            password: NewPassword::new(input.password)?,
            first_name: input
                .first_name
                .map(|name| PersonName::new("First name", name))
                .transpose()?,
            last_name: input
                .last_name
                .map(|name| PersonName::new("Last name", name))
                .transpose()?,
            email_redirect_to: self.config.site_link(&self.config.callback_path),
        };

        let outcome = match self.provider.sign_up(&account).await? {
            SignUpOutcome::Session(tokens) => SignUpOutcome::Session(tokens.stamped(Utc::now())),
            pending => pending,
        };

        match &outcome {
            SignUpOutcome::Session(_) => tracing::info!("User signed up and signed in"),
            SignUpOutcome::ConfirmationPending(identity) => {
                tracing::info!(user_id = %identity.user_id, "User signed up, confirmation pending")
            }
        }

        Ok(outcome)
    }
}
