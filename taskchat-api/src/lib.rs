//! # TaskChat API Server Library
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Settings loaded from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Json/Query/Path extractors that reject with `ApiError`
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
