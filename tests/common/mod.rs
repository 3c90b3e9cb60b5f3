//! Common helpers for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: mock map-service servers built on wiremock
//! - `log_capture`: in-process capture of tracing events
//! - `logger`: structured per-test logging

pub mod fixtures;
pub mod log_capture;
pub mod logger;
