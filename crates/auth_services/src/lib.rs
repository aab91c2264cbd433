//! # Auth Services
//!
//! This crate provides the user account core of the users service.
//! It includes the user model and validation, password hashing, persistence,
//! RS256 token handling with JWKS key material, and request authentication.

/// RSA key material and its JWK/JWKS projection.
pub mod keys;
/// JWT token handling for access and password reset tokens.
pub mod jwt;
/// In-memory user store for tests and local development.
pub mod memory;
/// Middleware for request authentication and the authenticated caller extractor.
pub mod middleware;
/// PostgreSQL user store.
pub mod pg_store;
/// Service definitions for user management and authentication operations.
pub mod service;
/// Persistence trait for user accounts.
pub mod store;
/// Types and structures used in authentication services.
pub mod types;
/// Input validation rules shared by the account operations.
pub mod validation;
