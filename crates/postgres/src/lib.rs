//! # Postgres
//!
//! This crate provides the PostgreSQL plumbing of the users service: the
//! connection pool, a connectivity probe and the embedded schema migrations.

/// Database client for the users service.
pub mod database;
