//! Library crate for concursillo-back, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Storage models and backends.
pub mod dao;
/// Request, response, and event payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route handlers.
pub mod routes;
/// Business logic services.
pub mod services;
/// Shared application state and core game types.
pub mod state;
