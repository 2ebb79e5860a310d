//! Authentication for the asset organizer
//!
//! Provides signup/login/logout/profile routes, JWT issuing and validation,
//! token revocation backed by Redis, and the bearer-token middleware used by
//! the API routes.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::AuthError;
pub use middleware::{AuthUser, auth_middleware};
pub use state::AuthState;
