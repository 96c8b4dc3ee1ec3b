//! Application Layer
//!
//! Use cases and application services.

pub mod adopt_session;
pub mod config;
pub mod exchange_code;
pub mod gate;
pub mod reset_password;
pub mod resolve_session;
pub mod session_source;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// Re-exports
pub use adopt_session::{AdoptSessionInput, AdoptSessionUseCase};
pub use config::AuthConfig;
pub use exchange_code::{CallbackInput, CallbackOutcome, ExchangeCodeUseCase};
pub use gate::{GateOutcome, GateUseCase};
pub use reset_password::{RequestPasswordResetUseCase, UpdatePasswordUseCase};
pub use resolve_session::{ResolveSessionUseCase, SessionResolution};
pub use session_source::{SessionHandle, SessionSource, SessionSubscription};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpUseCase};
