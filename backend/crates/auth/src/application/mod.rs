//! Application Layer
//!
//! Use cases and application services.

pub mod change_password;
pub mod config;
pub mod refresh;
pub mod service;
pub mod session;
pub mod sign_in;
pub mod sign_out;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use config::AuthConfig;
pub use refresh::RefreshUseCase;
pub use service::AuthService;
pub use session::SessionManager;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
