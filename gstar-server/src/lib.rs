//! HTTP server for the GSTAR backend.
//!
//! - `app`: composition root and shared state
//! - `api`: axum routes, extractors and error mapping
//! - `schemas`: request and response bodies
//! - `logging`: tracing subscriber setup

pub mod api;
pub mod app;
pub mod logging;
pub mod schemas;

pub use api::router;
pub use app::{AppBootstrap, AppState, bootstrap};
