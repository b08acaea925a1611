//! Service layer for the Token Gateway.
//!
//! # Components
//!
//! - `identity` - Participant identity generation
//! - `token_issuer` - Access token signing and viewer issuance
//! - `room_registry` - HTTP client for the upstream room listing
//! - `admission` - Publisher admission control (one publisher per room)

pub mod admission;
pub mod identity;
pub mod room_registry;
pub mod token_issuer;

pub use admission::{AdmissionController, AdmissionDecision, UpstreamCheck};
pub use room_registry::{LiveKitRoomClient, RoomRegistry, UpstreamError};
pub use token_issuer::{LiveKitSigner, SigningError, TokenIssuer, TokenSigner};
