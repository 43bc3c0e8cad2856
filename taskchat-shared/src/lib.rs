//! # TaskChat Shared Library
//!
//! This crate contains the data model, persistence, and authentication code
//! used by the TaskChat API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their read/create/update shapes
//! - `db`: Connection pool and schema bootstrap
//! - `auth`: Password hashing, JWT tokens, request authentication
//! - `llm`: Chat-completion client used by the chat endpoint
//! - `constants`: Status/priority values, pagination defaults, error messages

pub mod auth;
pub mod constants;
pub mod db;
pub mod llm;
pub mod models;

/// Current version of the TaskChat shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
