//! Infrastructure Layer
//!
//! Identity provider client.

pub mod supabase;

pub use supabase::{SupabaseConfig, SupabaseIdentityProvider};
