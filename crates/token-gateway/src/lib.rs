//! Token Gateway Library
//!
//! A small HTTP gateway that issues signed LiveKit access tokens:
//!
//! - Viewer tokens (join + subscribe) on demand, no upstream check
//! - Publisher tokens (join + subscribe + publish) only when the target room
//!   exists upstream and has no active publisher
//! - The configured device list, where each device name is a room name
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> upstream room service
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Grants, claims and API bodies
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Identity, signing, upstream registry, admission

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
