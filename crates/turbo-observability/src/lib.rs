//! Observability infrastructure for TurboCommerce.
//!
//! This crate provides:
//! - `init_logging` - Install the `tracing` subscriber from a `LogConfig`
//! - `RequestId` - Unique request identifier for log correlation
//! - `request_span` - Root span carrying the request ID

mod logging;
mod request;

pub use logging::*;
pub use request::*;
