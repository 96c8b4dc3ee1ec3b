//! Route Gate Middleware
//!
//! Runs in front of every page and API route. Redirects requests the policy
//! refuses, forwards the rest with a [`SessionHandle`] in the extensions,
//! and writes any session rotation or clearing to whichever response goes
//! out.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::config::AuthConfig;
use crate::application::{GateUseCase, SessionHandle};
use crate::domain::provider::IdentityProvider;
use crate::presentation::session_cookie::{
    append_set_cookies, mutation_cookies, read_session_cookie,
};

/// Middleware state
pub struct GateState<P>
where
    P: IdentityProvider + Send + Sync + 'static,
{
    pub provider: Arc<P>,
    pub config: Arc<AuthConfig>,
}

impl<P> Clone for GateState<P>
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

/// `302 Found` to `location`
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Middleware applying the route access policy
pub async fn route_gate<P>(
    State(state): State<GateState<P>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    P: IdentityProvider + Send + Sync + 'static,
{
    let path = req.uri().path().to_string();
    let raw_cookie = read_session_cookie(req.headers(), &state.config);

    let gate = GateUseCase::new(state.provider.clone(), state.config.clone());
    let outcome = gate.evaluate(&path, raw_cookie.as_deref()).await;

    let cookies = outcome
        .resolution
        .mutation
        .as_ref()
        .map(|mutation| mutation_cookies(req.headers(), &state.config, mutation))
        .unwrap_or_default();

    let mut response = match outcome.redirect_location(&state.config) {
        Some(location) => {
            tracing::debug!(path = %path, location = %location, "Route gate redirect");
            found(&location)
        }
        None => {
            req.extensions_mut()
                .insert(SessionHandle::new(outcome.resolution.identity.clone()));
            req.extensions_mut().insert(outcome.classification);
            next.run(req).await
        }
    };

    append_set_cookies(&mut response, &cookies);
    response
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    /// The gate's handle, or an anonymous one on routes it does not cover
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .unwrap_or_else(SessionHandle::anonymous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SessionSource;
    use crate::domain::decision::RequestClassification;
    use crate::domain::route::RouteClass;
    use crate::domain::session::test_support::tokens;
    use crate::testing::FakeProvider;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::ServiceExt;

    fn app(provider: Arc<FakeProvider>) -> Router {
        let state = GateState {
            provider,
            config: Arc::new(AuthConfig::default()),
        };
        Router::new()
            .route(
                "/dashboard",
                get(|session: SessionHandle| async move {
                    session
                        .current()
                        .and_then(|identity| identity.email)
                        .unwrap_or_default()
                }),
            )
            .route(
                "/pricing",
                get(|Extension(classification): Extension<RequestClassification>| async move {
                    classification.route_class.to_string()
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                state,
                route_gate::<FakeProvider>,
            ))
    }

    #[tokio::test]
    async fn test_handler_receives_identity() {
        let provider = Arc::new(FakeProvider::new());
        provider.add_user("access-1", "anna@example.com");
        let cookie = tokens("access-1", "refresh-1", chrono::Utc::now().timestamp() + 3600)
            .to_cookie_value()
            .unwrap();

        let response = app(provider)
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .header(header::COOKIE, format!("sb-auth-token={cookie}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"anna@example.com");
    }

    #[tokio::test]
    async fn test_classification_in_extensions() {
        let response = app(Arc::new(FakeProvider::new()))
            .oneshot(Request::builder().uri("/pricing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], RouteClass::Public.to_string().as_bytes());
    }

    #[tokio::test]
    async fn test_redirect_is_302() {
        let response = app(Arc::new(FakeProvider::new()))
            .oneshot(Request::builder().uri("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/login?redirectTo=%2Fdashboard"
        );
    }

    #[tokio::test]
    async fn test_session_handle_defaults_to_anonymous() {
        let app = Router::new().route(
            "/",
            get(|session: SessionHandle| async move { session.current().is_none().to_string() }),
        );

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"true");
    }
}
