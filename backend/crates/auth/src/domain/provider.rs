//! Identity Provider Interface
//!
//! Everything the gate and the auth endpoints need from the hosted
//! identity service. Implementation is in the infrastructure layer.

use crate::domain::credentials::{Email, NewPassword, PersonName};
use crate::domain::identity::Identity;
use crate::domain::session::SessionTokens;
use crate::error::AuthResult;

/// Data for a new account
#[derive(Debug)]
pub struct NewAccount {
    pub email: Email,
    pub password: NewPassword,
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    /// Absolute URL the confirmation email links back to
    pub email_redirect_to: String,
}

/// Result of a sign-up
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// Confirmation disabled; the user is signed in straight away
    Session(SessionTokens),
    /// A confirmation email was sent
    ConfirmationPending(Identity),
}

/// Identity provider trait
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Verify an access token and return its user
    async fn get_user(&self, access_token: &str) -> AuthResult<Identity>;

    /// Exchange a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> AuthResult<SessionTokens>;

    /// Exchange a one-time authorization code (PKCE) for a session
    async fn exchange_code(&self, auth_code: &str, code_verifier: &str)
    -> AuthResult<SessionTokens>;

    /// Password grant
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> AuthResult<SessionTokens>;

    async fn sign_up(&self, account: &NewAccount) -> AuthResult<SignUpOutcome>;

    /// Send a password recovery email linking to `redirect_to`
    async fn recover_password(&self, email: &Email, redirect_to: &str) -> AuthResult<()>;

    /// Change the password of the user owning `access_token`
    async fn update_password(&self, access_token: &str, password: &NewPassword)
    -> AuthResult<()>;

    /// Revoke the session owning `access_token`
    async fn sign_out(&self, access_token: &str) -> AuthResult<()>;
}
