//! Shared Kernel - vocabulary shared by every ServiceFlow crate
//!
//! - Unified error type ([`error::app_error::AppError`]) and its HTTP mapping
//! - Error classification ([`error::kind::ErrorKind`])
//! - Typed UUID identifiers ([`id::Id`])
//!
//! Nothing here knows about routes, cookies or the identity provider.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
