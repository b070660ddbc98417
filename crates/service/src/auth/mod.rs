//! Accounts: registration, login with JWT sessions, password reset.
//!
//! Split into domain types, a persistence trait with SeaORM and in-memory
//! backends, and a framework-independent service.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use domain::{AuthSession, AuthUser, Claims, LoginInput, RegisterInput};
pub use errors::AuthError;
pub use repository::AuthRepository;
pub use service::{AuthConfig, AuthService};
