//! # Taskdesk Shared Library
//!
//! This crate contains shared types, utilities, and business logic used by
//! the Taskdesk API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and CRUD operations (users, tasks, documents)
//! - `auth`: Password hashing, session tokens, and request identity types
//! - `db`: PostgreSQL connection pool and migration runner
//! - `storage`: Remote object storage client and the attachment manager

pub mod auth;
pub mod db;
pub mod models;
pub mod storage;

/// Current version of the Taskdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
