//! HTTP server implementation: configuration, telemetry, routing, and the
//! completion tasks behind the submission endpoint.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env argument parsing (`CliArgs`, `ServerConfig`).
//! - [`jobs`] - detached digest completion tasks and their fault boundary.
//! - [`routes`] - axum router, request handlers, and error mapping.
//! - [`telemetry`] - tracing subscriber setup.

pub mod config;
pub mod jobs;
pub mod routes;
pub mod telemetry;
