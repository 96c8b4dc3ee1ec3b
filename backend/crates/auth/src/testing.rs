//! In-memory identity provider for tests

use std::collections::HashMap;

use kernel::id::UserId;
use parking_lot::Mutex;

use crate::domain::credentials::{Email, NewPassword};
use crate::domain::identity::Identity;
use crate::domain::provider::{IdentityProvider, NewAccount, SignUpOutcome};
use crate::domain::session::SessionTokens;
use crate::error::{AuthError, AuthResult};

/// What the fake saw of a sign-up
#[derive(Debug, Clone)]
pub struct RecordedSignUp {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_redirect_to: String,
}

#[derive(Default)]
struct FakeState {
    users: HashMap<String, Identity>,
    refresh: HashMap<String, SessionTokens>,
    codes: HashMap<(String, String), SessionTokens>,
    passwords: HashMap<String, (String, SessionTokens)>,
    outage: bool,
    auto_confirm: bool,
    calls: Vec<String>,
    sign_ups: Vec<RecordedSignUp>,
    signed_out: Vec<String>,
    recoveries: Vec<(String, String)>,
    password_updates: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeProvider {
    state: Mutex<FakeState>,
}

fn rejected(status: u16, message: &str) -> AuthError {
    AuthError::Rejected {
        status,
        message: message.to_string(),
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user reachable through `access_token`
    pub fn add_user(&self, access_token: &str, email: &str) -> Identity {
        let identity = Identity::new(UserId::new()).with_email(email);
        self.state
            .lock()
            .users
            .insert(access_token.to_string(), identity.clone());
        identity
    }

    pub fn add_refresh(&self, refresh_token: &str, rotated: SessionTokens) {
        self.state
            .lock()
            .refresh
            .insert(refresh_token.to_string(), rotated);
    }

    pub fn add_code(&self, code: &str, verifier: &str, tokens: SessionTokens) {
        self.state
            .lock()
            .codes
            .insert((code.to_string(), verifier.to_string()), tokens);
    }

    pub fn add_password(&self, email: &str, password: &str, tokens: SessionTokens) {
        self.state
            .lock()
            .passwords
            .insert(email.to_string(), (password.to_string(), tokens));
    }

    /// Fail every call as if the provider were unreachable
    pub fn set_outage(&self, outage: bool) {
        self.state.lock().outage = outage;
    }

    /// Sign-ups return a session instead of waiting for confirmation
    pub fn set_auto_confirm(&self, auto_confirm: bool) {
        self.state.lock().auto_confirm = auto_confirm;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn last_sign_up(&self) -> Option<RecordedSignUp> {
        self.state.lock().sign_ups.last().cloned()
    }

    pub fn signed_out(&self) -> Vec<String> {
        self.state.lock().signed_out.clone()
    }

    pub fn recoveries(&self) -> Vec<(String, String)> {
        self.state.lock().recoveries.clone()
    }

    pub fn password_updates(&self) -> Vec<(String, String)> {
        self.state.lock().password_updates.clone()
    }

    fn enter(&self, call: &str) -> AuthResult<parking_lot::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock();
        state.calls.push(call.to_string());
        if state.outage {
            return Err(AuthError::Provider("connection refused".to_string()));
        }
        Ok(state)
    }
}

impl IdentityProvider for FakeProvider {
    async fn get_user(&self, access_token: &str) -> AuthResult<Identity> {
        let state = self.enter("get_user")?;
        state
            .users
            .get(access_token)
            .cloned()
            .ok_or_else(|| rejected(401, "invalid JWT"))
    }

    async fn refresh_session(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        let mut state = self.enter("refresh_session")?;
        state
            .refresh
            .remove(refresh_token)
            .ok_or_else(|| rejected(400, "Invalid Refresh Token: Refresh Token Not Found"))
    }

    async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> AuthResult<SessionTokens> {
        let mut state = self.enter("exchange_code")?;
        state
            .codes
            .remove(&(auth_code.to_string(), code_verifier.to_string()))
            .ok_or_else(|| rejected(400, "Invalid or expired code"))
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> AuthResult<SessionTokens> {
        let state = self.enter("sign_in_with_password")?;
        match state.passwords.get(email.as_str()) {
            Some((expected, tokens)) if expected == password => Ok(tokens.clone()),
            _ => Err(rejected(400, "Invalid login credentials")),
        }
    }

    async fn sign_up(&self, account: &NewAccount) -> AuthResult<SignUpOutcome> {
        let mut state = self.enter("sign_up")?;
        let email = account.email.as_str();

        if state
            .users
            .values()
            .any(|user| user.email.as_deref() == Some(email))
        {
            return Err(rejected(422, "User already registered"));
        }

        state.sign_ups.push(RecordedSignUp {
            email: email.to_string(),
            first_name: account.first_name.as_ref().map(|n| n.as_str().to_string()),
            last_name: account.last_name.as_ref().map(|n| n.as_str().to_string()),
            email_redirect_to: account.email_redirect_to.clone(),
        });

        let identity = Identity::new(UserId::new()).with_email(email);
        if state.auto_confirm {
            let access_token = format!("access-{}", identity.user_id);
            state.users.insert(access_token.clone(), identity.clone());
            Ok(SignUpOutcome::Session(SessionTokens {
                access_token,
                refresh_token: format!("refresh-{}", identity.user_id),
                token_type: "bearer".to_string(),
                expires_in: 3600,
                expires_at: None,
                user: serde_json::to_value(&identity).ok(),
            }))
        } else {
            Ok(SignUpOutcome::ConfirmationPending(identity))
        }
    }

    async fn recover_password(&self, email: &Email, redirect_to: &str) -> AuthResult<()> {
        let mut state = self.enter("recover_password")?;
        state
            .recoveries
            .push((email.as_str().to_string(), redirect_to.to_string()));
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &NewPassword) -> AuthResult<()> {
        let mut state = self.enter("update_password")?;
        state
            .password_updates
            .push((access_token.to_string(), password.expose().to_string()));
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        // Revocation is a network round trip; let other tasks run meanwhile
        tokio::task::yield_now().await;
        let mut state = self.enter("sign_out")?;
        state.signed_out.push(access_token.to_string());
        state.users.remove(access_token);
        Ok(())
    }
}
