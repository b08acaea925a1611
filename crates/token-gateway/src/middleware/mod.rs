//! HTTP middleware for the Token Gateway.
//!
//! - `http_metrics` - request count/latency for every response

pub mod http_metrics;

pub use http_metrics::http_metrics_middleware;
