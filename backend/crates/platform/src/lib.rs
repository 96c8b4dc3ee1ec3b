//! Platform Crate - Technical Infrastructure
//!
//! Shared HTTP plumbing with no knowledge of routes or sessions:
//! - Cookie reading/writing, including chunked values
//! - Client identification
//! - Rate limiting store and middleware
//! - Security response headers

pub mod client;
pub mod cookie;
pub mod rate_limit;
pub mod security;
