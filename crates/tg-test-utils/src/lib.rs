//! # TG Test Utilities
//!
//! Shared test utilities for the Token Gateway.
//!
//! This crate provides:
//! - Server test harness (`TestGatewayServer` for E2E tests)
//! - Token helpers (`decode_token` for asserting on issued claims)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tg_test_utils::*;
//! use token_gateway::services::room_registry::mock::MockRoomRegistry;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestGatewayServer::spawn(Arc::new(MockRoomRegistry::empty())).await?;
//!
//!     let response = reqwest::get(format!("{}/health", server.url())).await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_helpers;

// Re-export commonly used items
pub use server_harness::*;
pub use token_helpers::*;
