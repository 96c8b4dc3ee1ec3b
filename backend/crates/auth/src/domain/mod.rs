//! Domain Layer
//!
//! Route classification, redirect policy, session and identity types, and
//! the identity provider trait.

pub mod credentials;
pub mod decision;
pub mod identity;
pub mod provider;
pub mod route;
pub mod session;

// Re-exports
pub use decision::{Decision, RequestClassification};
pub use identity::Identity;
pub use provider::{IdentityProvider, NewAccount, SignUpOutcome};
pub use route::{RouteClass, RouteTable};
pub use session::{CookieMutation, SessionTokens};
