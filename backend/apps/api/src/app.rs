//! Router assembly
//!
//! Layer order, outermost first: tracing, security headers, route gate.
//! `/api/*` additionally gets CORS and rate limiting, and the provider
//! callback gets rate limiting.

use std::sync::Arc;

use auth::{AuthConfig, IdentityProvider, api_router, callback_router, with_route_gate};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use platform::rate_limit::{MemoryRateLimitStore, RateLimitState, rate_limit};
use platform::security::with_security_headers;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::pages::{pages_router, public_api_router};

pub fn build_router<P>(config: &ApiConfig, provider: Arc<P>) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let auth_config = Arc::new(config.auth());
    log_gate_config(&auth_config);

    // One store shared by the API and the callback
    let limiter = RateLimitState::new(MemoryRateLimitStore::new(), config.rate_limit.clone());

    let api = Router::new()
        .nest("/api/auth", api_router(provider.clone(), auth_config.clone()))
        .merge(public_api_router())
        .layer(axum::middleware::from_fn_with_state(
            limiter.clone(),
            rate_limit::<MemoryRateLimitStore>,
        ))
        .layer(cors(&config.frontend_origins));

    let callback = callback_router(provider.clone(), auth_config.clone()).layer(
        axum::middleware::from_fn_with_state(limiter, rate_limit::<MemoryRateLimitStore>),
    );

    let app = pages_router().merge(api).merge(callback);

    with_security_headers(with_route_gate(app, provider, auth_config))
        .layer(TraceLayer::new_for_http())
}

fn cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]))
        .allow_credentials(true)
}

fn log_gate_config(config: &AuthConfig) {
    tracing::info!(
        cookie = %config.session_cookie_name,
        secure = config.cookie_secure,
        login = %config.login_path,
        dashboard = %config.dashboard_path,
        "Route gate configured"
    );
}
