//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::provider::IdentityProvider;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{GateState, route_gate};

/// Provider redirect target, mounted at `config.callback_path`
pub fn callback_router<P>(provider: Arc<P>, config: Arc<AuthConfig>) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let path = config.callback_path.clone();
    let state = AuthAppState { provider, config };

    Router::new()
        .route(&path, get(handlers::callback::<P>))
        .with_state(state)
}

/// JSON auth endpoints, meant to be nested at `/api/auth`
pub fn api_router<P>(provider: Arc<P>, config: Arc<AuthConfig>) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let state = AuthAppState { provider, config };

    Router::new()
        .route("/signin", post(handlers::sign_in::<P>))
        .route("/signup", post(handlers::sign_up::<P>))
        .route("/reset-password", post(handlers::reset_password::<P>))
        .route("/password", post(handlers::update_password::<P>))
        .route("/session", post(handlers::adopt_session::<P>))
        .route("/signout", post(handlers::sign_out::<P>))
        .route("/status", get(handlers::session_status::<P>))
        .with_state(state)
}

/// Callback plus `/api/auth/*` in one router
pub fn auth_router<P>(provider: Arc<P>, config: Arc<AuthConfig>) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    callback_router(provider.clone(), config.clone())
        .nest("/api/auth", api_router(provider, config))
}

/// Put the route gate in front of every route of `router`, fallback included
pub fn with_route_gate<P>(router: Router, provider: Arc<P>, config: Arc<AuthConfig>) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let state = GateState { provider, config };
    router.layer(axum::middleware::from_fn_with_state(
        state,
        route_gate::<P>,
    ))
}
