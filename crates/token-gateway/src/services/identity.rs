//! Participant identity generation.
//!
//! Generated identities are `<prefix>-<8 lowercase hex chars>` with the suffix
//! drawn from the system CSPRNG. Uniqueness is best-effort only.

use crate::errors::GatewayError;
use ring::rand::{SecureRandom, SystemRandom};

/// Prefix for identities minted on the viewer path.
pub const VIEWER_IDENTITY_PREFIX: &str = "viewer";

/// Prefix for identities minted on the publisher path.
pub const PUBLISHER_IDENTITY_PREFIX: &str = "mobile-publisher";

/// Number of random bytes in the suffix (hex-encoded to twice as many chars).
const SUFFIX_BYTES: usize = 4;

/// Generate `<prefix>-<random hex>`.
pub fn generate_identity(prefix: &str) -> Result<String, GatewayError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; SUFFIX_BYTES];

    rng.fill(&mut bytes).map_err(|_| {
        tracing::error!(target: "tg.services.identity", "Failed to generate random bytes");
        GatewayError::Internal("identity generation failed".to_string())
    })?;

    Ok(format!("{}-{}", prefix, hex::encode(bytes)))
}

/// Use the caller's identity when it is non-empty, otherwise generate one.
pub fn resolve_identity(requested: Option<&str>, prefix: &str) -> Result<String, GatewayError> {
    match requested {
        Some(identity) if !identity.is_empty() => Ok(identity.to_string()),
        _ => generate_identity(prefix),
    }
}
