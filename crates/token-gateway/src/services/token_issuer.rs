//! Access token issuance.
//!
//! `TokenIssuer` turns an identity and a [`VideoGrant`] into a signed access
//! token ready to hand to a client. Signing sits behind the [`TokenSigner`]
//! trait; production uses [`LiveKitSigner`] (HS256 JWT keyed by the API
//! secret), tests substitute [`mock::MockTokenSigner`].
//!
//! Issuance is synchronous and does no I/O. The only failure modes are an
//! empty identity and an encoding failure, both of which indicate a local
//! defect rather than a transient condition and are never retried.

use crate::config::Config;
use crate::errors::GatewayError;
use crate::models::{AccessTokenClaims, TokenResponse, VideoGrant};
use crate::observability::metrics;
use crate::services::identity::{resolve_identity, VIEWER_IDENTITY_PREFIX};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("identity must not be empty")]
    EmptyIdentity,

    #[error("JWT encoding failed: {0}")]
    Encode(String),
}

/// Signing primitive: `(identity, grant, ttl) -> signed token string`.
pub trait TokenSigner: Send + Sync {
    fn sign(
        &self,
        identity: &str,
        grant: &VideoGrant,
        ttl: Duration,
    ) -> Result<String, SigningError>;
}

/// HS256 signer keyed by the LiveKit API key/secret pair.
pub struct LiveKitSigner {
    api_key: String,
    api_secret: SecretString,
}

impl LiveKitSigner {
    pub fn new(api_key: String, api_secret: SecretString) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_key.clone(), config.api_secret.clone())
    }
}

impl TokenSigner for LiveKitSigner {
    fn sign(
        &self,
        identity: &str,
        grant: &VideoGrant,
        ttl: Duration,
    ) -> Result<String, SigningError> {
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| SigningError::Encode("token TTL out of range".to_string()))?;

        let claims = AccessTokenClaims {
            iss: self.api_key.clone(),
            sub: identity.to_string(),
            nbf: now,
            exp: now.saturating_add(ttl_secs),
            video: grant.clone(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let key = EncodingKey::from_secret(self.api_secret.expose_secret().as_bytes());

        encode(&header, &claims, &key).map_err(|e| SigningError::Encode(e.to_string()))
    }
}

/// Builds client-facing tokens from an identity and a grant.
#[derive(Clone)]
pub struct TokenIssuer {
    signer: Arc<dyn TokenSigner>,
    server_url: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(signer: Arc<dyn TokenSigner>, server_url: String, ttl: Duration) -> Self {
        Self {
            signer,
            server_url,
            ttl,
        }
    }

    /// Sign `grant` for `identity`.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Signing(SigningError::EmptyIdentity)` for an empty identity
    /// - `GatewayError::Signing(SigningError::Encode)` if JWT encoding fails
    pub fn issue(&self, identity: &str, grant: VideoGrant) -> Result<TokenResponse, GatewayError> {
        if identity.is_empty() {
            return Err(SigningError::EmptyIdentity.into());
        }

        let token = self.signer.sign(identity, &grant, self.ttl)?;
        metrics::record_token_issued(grant.kind());

        Ok(TokenResponse {
            identity: identity.to_string(),
            token,
            server_url: self.server_url.clone(),
            room: grant.room,
        })
    }

    /// Viewer path: fresh `viewer-<hex>` identity, viewer grant, no upstream check.
    #[instrument(skip(self), fields(room = %room))]
    pub fn request_viewer_token(&self, room: &str) -> Result<TokenResponse, GatewayError> {
        let identity = resolve_identity(None, VIEWER_IDENTITY_PREFIX)?;
        let response = self.issue(&identity, VideoGrant::viewer(room))?;

        info!(
            target: "tg.services.token_issuer",
            room = %room,
            identity = %response.identity,
            "Viewer token issued"
        );

        Ok(response)
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

/// Mock signer module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every signing request and returns a recognizable fake token.
    #[derive(Default)]
    pub struct MockTokenSigner {
        call_count: AtomicUsize,
        calls: Mutex<Vec<(String, VideoGrant)>>,
        return_error: bool,
    }

    impl MockTokenSigner {
        /// Create a mock that always signs.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock whose every signing attempt fails.
        pub fn failing() -> Self {
            Self {
                return_error: true,
                ..Self::default()
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Identities and grants signed so far, in call order.
        pub fn calls(&self) -> Vec<(String, VideoGrant)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    impl TokenSigner for MockTokenSigner {
        fn sign(
            &self,
            identity: &str,
            grant: &VideoGrant,
            _ttl: Duration,
        ) -> Result<String, SigningError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if self.return_error {
                return Err(SigningError::Encode("mock signer failure".to_string()));
            }

            if let Ok(mut calls) = self.calls.lock() {
                calls.push((identity.to_string(), grant.clone()));
            }

            Ok(format!("mock.{}.{}", identity, grant.room))
        }
    }
}
