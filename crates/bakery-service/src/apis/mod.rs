//! API implementations for the bakery service.

pub mod order;
