//! Upstream room registry client.
//!
//! The media server owns room state; the gateway only ever asks it one
//! question: which rooms exist and how many publishers each has. That query
//! sits behind the [`RoomRegistry`] trait so admission logic can be tested
//! against [`mock::MockRoomRegistry`].
//!
//! [`LiveKitRoomClient`] calls the Twirp JSON endpoint
//! `POST /twirp/livekit.RoomService/ListRooms`, authenticating with a
//! short-lived token carrying the `roomList` grant.
//!
//! # Security
//!
//! - The service token is minted per call and never logged
//! - Timeouts prevent hanging connections
//! - Errors are logged server-side; none are surfaced to clients

use crate::errors::GatewayError;
use crate::models::{ListRoomsResponse, RoomSnapshot, VideoGrant};
use crate::observability::metrics;
use crate::services::token_issuer::TokenSigner;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

/// Twirp path of the room listing RPC.
pub const LIST_ROOMS_PATH: &str = "/twirp/livekit.RoomService/ListRooms";

/// Identity placed in the room-list service token.
const SERVICE_IDENTITY: &str = "token-gateway";

/// Lifetime of the room-list service token (10 minutes).
const SERVICE_TOKEN_TTL: Duration = Duration::from_secs(600);

/// Upper bound on the TCP/TLS connect phase.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure to obtain a room snapshot from upstream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("upstream response could not be decoded: {0}")]
    Decode(String),

    #[error("could not sign upstream credential: {0}")]
    Auth(String),
}

impl UpstreamError {
    /// Metrics label for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Timeout => "timeout",
            UpstreamError::Status(_) => "status",
            UpstreamError::Decode(_) => "decode",
            UpstreamError::Auth(_) => "auth",
        }
    }
}

/// Room listing operation (enables mocking).
#[async_trait::async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Fetch every existing room with its current publisher count.
    async fn list_rooms(&self) -> Result<Vec<RoomSnapshot>, UpstreamError>;
}

/// HTTP client for the media server's room service.
#[derive(Clone)]
pub struct LiveKitRoomClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// HTTP(S) base URL of the media server API.
    base_url: String,

    /// Signs the per-call `roomList` credential.
    signer: Arc<dyn TokenSigner>,
}

impl LiveKitRoomClient {
    /// Create a new room client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - HTTP base URL (e.g., "https://demo.livekit.cloud")
    /// * `signer` - Signer holding the API key/secret
    /// * `timeout` - Overall bound on each room-list request
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the HTTP client cannot be built.
    pub fn new(
        base_url: String,
        signer: Arc<dyn TokenSigner>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .build()
            .map_err(|e| {
                error!(target: "tg.services.room_registry", error = %e, "Failed to build HTTP client");
                GatewayError::Internal("failed to build upstream HTTP client".to_string())
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    /// Mint the per-call `roomList` credential.
    fn service_token(&self) -> Result<String, UpstreamError> {
        let grant = VideoGrant::room_list();
        let token = self
            .signer
            .sign(SERVICE_IDENTITY, &grant, SERVICE_TOKEN_TTL)
            .map_err(|e| UpstreamError::Auth(e.to_string()))?;

        metrics::record_token_issued(grant.kind());
        Ok(token)
    }

    async fn fetch_rooms(&self) -> Result<Vec<RoomSnapshot>, UpstreamError> {
        let service_token = self.service_token()?;

        let url = format!("{}{}", self.base_url, LIST_ROOMS_PATH);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", service_token))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: ListRoomsResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Decode(e.to_string())
            }
        })?;

        Ok(body.rooms)
    }
}

#[async_trait::async_trait]
impl RoomRegistry for LiveKitRoomClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_rooms(&self) -> Result<Vec<RoomSnapshot>, UpstreamError> {
        let start = Instant::now();
        let result = self.fetch_rooms().await;
        let duration = start.elapsed();

        match &result {
            Ok(rooms) => {
                metrics::record_upstream_request("success", duration);
                debug!(
                    target: "tg.services.room_registry",
                    room_count = rooms.len(),
                    "Listed upstream rooms"
                );
            }
            Err(e) => {
                metrics::record_upstream_request(e.kind(), duration);
                warn!(target: "tg.services.room_registry", error = %e, "Room listing failed");
            }
        }

        result
    }
}

/// Mock room registry module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Rooms(Vec<RoomSnapshot>),
        Fail(UpstreamError),
        Hang(Duration),
    }

    /// Mock registry returning a fixed snapshot or a fixed failure.
    pub struct MockRoomRegistry {
        behavior: Behavior,
        call_count: AtomicUsize,
    }

    impl MockRoomRegistry {
        /// Create a mock that reports the given rooms.
        pub fn with_rooms(rooms: Vec<RoomSnapshot>) -> Self {
            Self {
                behavior: Behavior::Rooms(rooms),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Create a mock that reports no rooms at all.
        pub fn empty() -> Self {
            Self::with_rooms(Vec::new())
        }

        /// Create a mock whose query always fails with `error`.
        pub fn failing(error: UpstreamError) -> Self {
            Self {
                behavior: Behavior::Fail(error),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Create a mock that sleeps for `delay` before answering with no rooms.
        pub fn hanging(delay: Duration) -> Self {
            Self {
                behavior: Behavior::Hang(delay),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl RoomRegistry for MockRoomRegistry {
        async fn list_rooms(&self) -> Result<Vec<RoomSnapshot>, UpstreamError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            match &self.behavior {
                Behavior::Rooms(rooms) => Ok(rooms.clone()),
                Behavior::Fail(error) => Err(error.clone()),
                Behavior::Hang(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    #[cfg(test)]
    #[allow(clippy::unwrap_used)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_with_rooms() {
            let mock = MockRoomRegistry::with_rooms(vec![RoomSnapshot::new("a", 1)]);
            let rooms = mock.list_rooms().await.unwrap();

            assert_eq!(rooms, vec![RoomSnapshot::new("a", 1)]);
            assert_eq!(mock.call_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_failing() {
            let mock = MockRoomRegistry::failing(UpstreamError::Timeout);
            let result = mock.list_rooms().await;

            assert_eq!(result, Err(UpstreamError::Timeout));
            assert_eq!(mock.call_count(), 1);
        }
    }
}
