//! Auth (Route Access Gate) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Route classification, redirect policy, session types, provider trait
//! - `application/` - Use cases and application services
//! - `infra/` - Supabase Auth (GoTrue) client
//! - `presentation/` - Gate middleware, HTTP handlers, DTOs, router
//!
//! ## Request flow
//! 1. Classify the path (`StaticAsset`, `ApiAuthPassthrough`, `AuthOnly`,
//!    `Public`, `Protected`)
//! 2. Resolve the session cookie, refreshing it when close to expiry
//! 3. Redirect or forward according to the policy table
//! 4. Write any rotated or cleared session cookie on the way out
//!
//! ## Security Model
//! - The hosted identity provider verifies every access token
//! - Session cookies are HttpOnly and chunked like the browser client's
//! - Any failure while resolving a session means "not signed in"

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::session_source::{SessionHandle, SessionSource, SessionSubscription};
pub use domain::{Decision, Identity, IdentityProvider, RequestClassification, RouteClass};
pub use error::{AuthError, AuthResult};
pub use infra::supabase::{SupabaseConfig, SupabaseIdentityProvider};
pub use presentation::router::{api_router, auth_router, callback_router, with_route_gate};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
