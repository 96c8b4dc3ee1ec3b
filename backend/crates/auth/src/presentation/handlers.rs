//! HTTP Handlers
//!
//! The callback and `/api/auth/*` routes. They sit behind the gate as
//! passthrough routes, so each one reads and writes the session cookie
//! itself.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    AdoptSessionInput, AdoptSessionUseCase, CallbackInput, ExchangeCodeUseCase,
    RequestPasswordResetUseCase, ResolveSessionUseCase, SessionHandle, SessionResolution,
    SignInInput, SignInOutput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase,
    UpdatePasswordUseCase,
};
use crate::domain::identity::Identity;
use crate::domain::provider::{IdentityProvider, SignUpOutcome};
use crate::domain::session::SessionTokens;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AdoptSessionRequest, CallbackQuery, ResetPasswordRequest, SessionStatusResponse,
    SignInRequest, SignInResponse, SignUpRequest, SignUpResponse, UpdatePasswordRequest,
};
use crate::presentation::middleware::found;
use crate::presentation::session_cookie::{
    append_set_cookies, code_verifier_clear_cookies, mutation_cookies, read_code_verifier,
    read_session_cookie, session_clear_cookies, session_set_cookies,
};

/// Shared state for auth handlers
pub struct AuthAppState<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    pub provider: Arc<P>,
    pub config: Arc<AuthConfig>,
}

impl<P> Clone for AuthAppState<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Callback
// ============================================================================

/// GET /auth/callback
pub async fn callback<P>(
    State(state): State<AuthAppState<P>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let use_case = ExchangeCodeUseCase::new(state.provider.clone(), state.config.clone());

    let outcome = use_case
        .execute(CallbackInput {
            code: query.code,
            redirect_to: query.redirect_to,
            code_verifier: read_code_verifier(&headers, &state.config),
        })
        .await;

    let mut cookies = Vec::new();
    if let Some(tokens) = &outcome.tokens {
        cookies.extend(session_set_cookies(&headers, &state.config, tokens));
    }
    if outcome.clear_verifier {
        cookies.extend(code_verifier_clear_cookies(&headers, &state.config));
    }

    let mut response = found(&outcome.location);
    append_set_cookies(&mut response, &cookies);
    response
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<P>(
    State(state): State<AuthAppState<P>>,
    headers: HeaderMap,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Response>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.provider.clone());

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await
        .map_err(|e| match e {
            // Wrong credentials surface as 401 whatever status the provider used
            AuthError::Rejected { message, .. } => AuthError::Rejected {
                status: 401,
                message,
            },
            other => other,
        })?;

    Ok(signed_in_response(&headers, &state.config, output))
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<P>(
    State(state): State<AuthAppState<P>>,
    headers: HeaderMap,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<Response>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.provider.clone(), state.config.clone());

    let outcome = use_case
        .execute(SignUpInput {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;

    let response = match outcome {
        SignUpOutcome::Session(tokens) => {
            let user_id = tokens
                .user
                .as_ref()
                .and_then(|user| Identity::from_user_json(user).ok())
                .map(|identity| identity.user_id.to_string());
            let mut response = Json(SignUpResponse {
                confirmation_pending: false,
                user_id,
            })
            .into_response();
            append_set_cookies(
                &mut response,
                &session_set_cookies(&headers, &state.config, &tokens),
            );
            response
        }
        SignUpOutcome::ConfirmationPending(identity) => Json(SignUpResponse {
            confirmation_pending: true,
            user_id: Some(identity.user_id.to_string()),
        })
        .into_response(),
    };

    Ok(response)
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/auth/reset-password
pub async fn reset_password<P>(
    State(state): State<AuthAppState<P>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<StatusCode>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let use_case = RequestPasswordResetUseCase::new(state.provider.clone(), state.config.clone());
    use_case.execute(req.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/password
pub async fn update_password<P>(
    State(state): State<AuthAppState<P>>,
    headers: HeaderMap,
    Json(req): Json<UpdatePasswordRequest>,
) -> Response
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let (resolution, cookies) = resolve(&state, &headers).await;

    let use_case = UpdatePasswordUseCase::new(state.provider.clone());
    let mut response = match use_case
        .execute(resolution.tokens.as_ref(), req.password)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    };

    append_set_cookies(&mut response, &cookies);
    response
}

// ============================================================================
// Implicit Flow Session
// ============================================================================

/// POST /api/auth/session
pub async fn adopt_session<P>(
    State(state): State<AuthAppState<P>>,
    headers: HeaderMap,
    Json(req): Json<AdoptSessionRequest>,
) -> AuthResult<Response>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let use_case = AdoptSessionUseCase::new(state.provider.clone());

    let output = use_case
        .execute(AdoptSessionInput {
            access_token: req.access_token,
            refresh_token: req.refresh_token,
            expires_in: req.expires_in,
        })
        .await?;

    Ok(signed_in_response(&headers, &state.config, output))
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<P>(
    State(state): State<AuthAppState<P>>,
    session: SessionHandle,
    headers: HeaderMap,
) -> Response
where
    P: IdentityProvider + Send + Sync + 'static,
{
    // The gate does not resolve passthrough routes, so the handle starts
    // anonymous. Seed it so subscribers see the signed-in to signed-out edge.
    let (resolution, _) = resolve(&state, &headers).await;
    session.publish(resolution.identity.clone());

    // A session the provider no longer recognises is still revoked
    let tokens = resolution.tokens.or_else(|| {
        read_session_cookie(&headers, &state.config)
            .and_then(|raw| SessionTokens::from_cookie_value(&raw).ok())
    });

    SignOutUseCase::new(state.provider.clone())
        .execute(tokens.as_ref())
        .await;
    session.publish(None);

    let mut response = StatusCode::NO_CONTENT.into_response();
    append_set_cookies(
        &mut response,
        &session_clear_cookies(&headers, &state.config),
    );
    response
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/status
pub async fn session_status<P>(
    State(state): State<AuthAppState<P>>,
    headers: HeaderMap,
) -> Response
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let (resolution, cookies) = resolve(&state, &headers).await;

    let body = match (&resolution.identity, &resolution.tokens) {
        (Some(identity), tokens) => SessionStatusResponse {
            authenticated: true,
            user_id: Some(identity.user_id.to_string()),
            email: identity.email.clone(),
            expires_at: tokens.as_ref().and_then(SessionTokens::expiry),
        },
        (None, _) => SessionStatusResponse {
            authenticated: false,
            user_id: None,
            email: None,
            expires_at: None,
        },
    };

    let mut response = Json(body).into_response();
    append_set_cookies(&mut response, &cookies);
    response
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolve the request's session, returning the cookies its mutation needs
async fn resolve<P>(
    state: &AuthAppState<P>,
    headers: &HeaderMap,
) -> (SessionResolution, Vec<String>)
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let raw_cookie = read_session_cookie(headers, &state.config);
    let resolution = ResolveSessionUseCase::new(state.provider.clone(), state.config.clone())
        .execute(raw_cookie.as_deref())
        .await;

    let cookies = resolution
        .mutation
        .as_ref()
        .map(|mutation| mutation_cookies(headers, &state.config, mutation))
        .unwrap_or_default();

    (resolution, cookies)
}

fn signed_in_response(headers: &HeaderMap, config: &AuthConfig, output: SignInOutput) -> Response {
    let mut response = Json(SignInResponse {
        user_id: output.identity.user_id.to_string(),
        email: output.identity.email.clone(),
    })
    .into_response();
    append_set_cookies(
        &mut response,
        &session_set_cookies(headers, config, &output.tokens),
    );
    response
}
