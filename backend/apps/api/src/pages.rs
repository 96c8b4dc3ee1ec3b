//! Placeholder pages
//!
//! Stand-ins for the rendered site. They exist so every route class has a
//! real downstream handler behind the gate.

use auth::{SessionHandle, SessionSource};
use axum::Json;
use axum::Router;
use axum::http::{StatusCode, Uri};
use axum::response::Html;
use axum::routing::get;
use serde_json::{Value, json};

pub fn pages_router() -> Router {
    Router::new()
        .route("/", get(|| page("ServiceFlow")))
        .route("/pricing", get(|| page("Pricing")))
        .route("/contact", get(|| page("Contact")))
        .route("/login", get(|| page("Sign in")))
        .route("/register", get(|| page("Create account")))
        .route("/reset-password", get(|| page("Reset password")))
        .route("/reset-password/confirm", get(|| page("Choose a new password")))
        .route("/verify-email", get(|| page("Check your inbox")))
        .route("/auth-handler", get(|| page("Signing you in")))
        .route("/dashboard", get(dashboard))
        .fallback(workspace_page)
}

/// Unauthenticated JSON endpoints under `/api/public`
pub fn public_api_router() -> Router {
    Router::new().route("/api/public/health", get(health))
}

async fn page(title: &'static str) -> Html<String> {
    Html(format!("<!doctype html><title>{title}</title><h1>{title}</h1>"))
}

// Pages that echo the session or the URL are plain text, so nothing the
// visitor controls is ever parsed as markup
async fn dashboard(session: SessionHandle) -> String {
    let greeting = session
        .current()
        .and_then(|identity| identity.email)
        .unwrap_or_else(|| "there".to_string());
    format!("Hello, {greeting}")
}

/// Anything else under the signed-in area
async fn workspace_page(uri: Uri, session: SessionHandle) -> (StatusCode, String) {
    if session.current().is_none() {
        return (StatusCode::NOT_FOUND, "Not found".to_string());
    }
    (StatusCode::OK, format!("ServiceFlow: {}", uri.path()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::Identity;
    use axum::body::Body;
    use axum::http::{Request, header};
    use kernel::id::UserId;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let response = public_api_router()
            .oneshot(
                Request::builder()
                    .uri("/api/public/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_fallback_without_session_is_not_found() {
        let response = pages_router()
            .oneshot(Request::builder().uri("/clients").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_workspace_page_is_not_html() {
        let request = Request::builder()
            .uri("/clients/%3Cscript%3Ealert(1)%3C%2Fscript%3E")
            .extension(SessionHandle::new(Some(
                Identity::new(UserId::new()).with_email("<b>anna</b>@example.com"),
            )))
            .body(Body::empty())
            .unwrap();

        let response = pages_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
    }

    #[tokio::test]
    async fn test_dashboard_greeting_is_not_html() {
        let request = Request::builder()
            .uri("/dashboard")
            .extension(SessionHandle::new(Some(
                Identity::new(UserId::new()).with_email("<script>@example.com"),
            )))
            .body(Body::empty())
            .unwrap();

        let response = pages_router().oneshot(request).await.unwrap();

        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Hello, <script>@example.com");
    }
}
