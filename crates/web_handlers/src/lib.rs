//! # Web Handlers for the Users Service
//!
//! This crate provides the HTTP surface of the users service: handlers,
//! the admin guard, error shaping and the route table.

/// Authentication handlers (register, login, password reset, verify)
mod auth_handlers;
pub use auth_handlers::*;

/// User management handlers (list, get, edit, role, delete)
mod user_handlers;
pub use user_handlers::*;

/// JWKS and health handlers
mod jwks_handlers;
pub use jwks_handlers::*;

/// Role guard extractors
pub mod guards;

/// JSON, path and 404 error shaping
pub mod errors;

/// Route table
pub mod routes;

#[cfg(test)]
mod test_support;
