//! HTTP service for bakery orders.
//!
//! The `bakery` binary serves the order API; `bakery-setup` provisions the
//! database it talks to. Both share the logging setup in [`telemetry`].

pub mod apis;
pub mod server;
pub mod telemetry;
