//! Exchange Code Use Case
//!
//! Completes the redirect-based login: the provider sends the browser to the
//! callback route with a one-time code, which is swapped for a session.
//! Every outcome is a redirect.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::decision::is_safe_redirect;
use crate::domain::provider::IdentityProvider;
use crate::domain::session::SessionTokens;
use crate::error::AuthError;

/// Shown when the exchange fails for reasons other than a provider refusal
const GENERIC_FAILURE: &str = "Authentication failed";

/// Callback query and cookies
#[derive(Debug, Default)]
pub struct CallbackInput {
    pub code: Option<String>,
    pub redirect_to: Option<String>,
    /// PKCE verifier saved by the browser client when the login started
    pub code_verifier: Option<String>,
}

/// Where to send the browser, and what to store
#[derive(Debug, PartialEq)]
pub struct CallbackOutcome {
    pub location: String,
    pub tokens: Option<SessionTokens>,
    /// The verifier is single-use and should be removed
    pub clear_verifier: bool,
}

/// Exchange code use case
pub struct ExchangeCodeUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<P> ExchangeCodeUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>, config: Arc<AuthConfig>) -> Self {
        Self { provider, config }
    }

    pub async fn execute(&self, input: CallbackInput) -> CallbackOutcome {
        let Some(code) = input.code.filter(|code| !code.is_empty()) else {
            // Implicit-flow tokens arrive in the URL fragment, which only the
            // browser can read.
            return CallbackOutcome {
                location: self.config.auth_handler_path.clone(),
                tokens: None,
                clear_verifier: false,
            };
        };

        let result = match input.code_verifier.as_deref() {
            Some(verifier) if !verifier.is_empty() => {
                self.provider.exchange_code(&code, verifier).await
            }
            _ => Err(AuthError::CodeVerifierMissing),
        };

        match result {
            Ok(tokens) => {
                let target = input
                    .redirect_to
                    .filter(|target| is_safe_redirect(target))
                    .unwrap_or_else(|| self.config.dashboard_path.clone());

                tracing::info!(redirect_to = %target, "Authorization code exchanged");

                CallbackOutcome {
                    location: target,
                    tokens: Some(tokens.stamped(Utc::now())),
                    clear_verifier: true,
                }
            }
            Err(e) => {
                e.log();
                let message = match &e {
                    AuthError::Rejected { .. } | AuthError::CodeVerifierMissing => e.to_string(),
                    _ => GENERIC_FAILURE.to_string(),
                };
                CallbackOutcome {
                    location: format!(
                        "{}?error={}",
                        self.config.login_path,
                        urlencoding::encode(&message)
                    ),
                    tokens: None,
                    clear_verifier: false,
                }
            }
        }
    }
}
