//! HTTP route handlers.

pub mod buckets;
pub mod health;
pub mod metrics;
