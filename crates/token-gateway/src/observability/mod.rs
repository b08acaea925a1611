//! Observability for the Token Gateway.
//!
//! Prometheus metric definitions and recording helpers.

pub mod metrics;
