//! # Taskdeck Shared Library
//!
//! This crate contains shared types, utilities, and business logic used by
//! the Taskdeck API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their owner-scoped operations
//! - `auth`: Session tokens and password hashing
//! - `db`: Connection pool and migration helpers
//! - `email`: Best-effort account notification emails

pub mod auth;
pub mod db;
pub mod email;
pub mod models;

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
