//! Common types for the bakery order service.
//!
//! This crate holds the order domain model, the validated input types each
//! HTTP operation parses its body into, and the JSON bodies the API returns.

/// API response and error types.
pub mod api;
/// Order records, statuses and per-operation inputs.
pub mod order;
/// Input validation errors and field coercion.
pub mod validation;

pub use api::*;
pub use order::*;
pub use validation::*;
