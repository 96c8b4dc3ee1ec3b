//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, middleware and session cookie plumbing.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod session_cookie;

pub use handlers::AuthAppState;
pub use middleware::{GateState, route_gate};
pub use router::{api_router, auth_router, callback_router, with_route_gate};
