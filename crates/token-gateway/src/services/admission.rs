//! Publisher admission control.
//!
//! Enforces at most one live publisher per room. Before a publisher token is
//! minted, the upstream registry is asked for the current room snapshot:
//!
//! ```text
//! resolve identity -> query upstream (bounded) -> evaluate -> issue
//!                          |
//!                          +-- unavailable: fail open, issue unchecked
//! ```
//!
//! | Upstream result                    | Decision          | Caller sees |
//! |------------------------------------|-------------------|-------------|
//! | room absent                        | `RoomNotFound`    | 404         |
//! | room present, `num_publishers > 0` | `RoomOccupied`    | 409         |
//! | room present, `num_publishers = 0` | `Permit`          | token       |
//! | query failed or timed out          | `PermitUnchecked` | token       |
//!
//! Upstream unavailability never blocks issuance. It is logged at `warn` and
//! counted under `outcome="permit_unchecked"`.
//!
//! # Known race
//!
//! Check and issue are not atomic. Two concurrent requests for the same idle
//! room can both be permitted before either stream registers upstream. No lock
//! or reservation is taken; the media server stays the final authority on
//! concurrent publishers.

use crate::errors::GatewayError;
use crate::models::{RoomSnapshot, TokenResponse, VideoGrant};
use crate::observability::metrics;
use crate::services::identity::{resolve_identity, PUBLISHER_IDENTITY_PREFIX};
use crate::services::room_registry::{RoomRegistry, UpstreamError};
use crate::services::token_issuer::TokenIssuer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Outcome of the upstream room query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamCheck {
    /// The registry answered; its snapshot is authoritative.
    Snapshot(Vec<RoomSnapshot>),

    /// The registry could not be consulted.
    Unavailable(UpstreamError),
}

/// Admission verdict for one publisher request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Room exists and has no publisher.
    Permit,

    /// Upstream was unavailable; issuance proceeds without a check.
    PermitUnchecked,

    /// Room is absent from the snapshot.
    RoomNotFound,

    /// Room already has at least one publisher.
    RoomOccupied { publishers: u32 },
}

impl AdmissionDecision {
    /// Metrics label for the decision.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionDecision::Permit => "permit",
            AdmissionDecision::PermitUnchecked => "permit_unchecked",
            AdmissionDecision::RoomNotFound => "room_not_found",
            AdmissionDecision::RoomOccupied { .. } => "room_occupied",
        }
    }

    pub fn is_permitted(&self) -> bool {
        matches!(
            self,
            AdmissionDecision::Permit | AdmissionDecision::PermitUnchecked
        )
    }
}

/// Decide admission for `room` given the upstream outcome.
///
/// Room names match exactly; the first matching snapshot entry wins.
pub fn evaluate(room: &str, check: &UpstreamCheck) -> AdmissionDecision {
    match check {
        UpstreamCheck::Unavailable(_) => AdmissionDecision::PermitUnchecked,
        UpstreamCheck::Snapshot(rooms) => match rooms.iter().find(|r| r.name == room) {
            None => AdmissionDecision::RoomNotFound,
            Some(snapshot) if snapshot.num_publishers > 0 => AdmissionDecision::RoomOccupied {
                publishers: snapshot.num_publishers,
            },
            Some(_) => AdmissionDecision::Permit,
        },
    }
}

/// Gates publisher-token issuance on upstream room occupancy.
#[derive(Clone)]
pub struct AdmissionController {
    registry: Arc<dyn RoomRegistry>,
    issuer: TokenIssuer,
    check_timeout: Duration,
}

impl AdmissionController {
    pub fn new(registry: Arc<dyn RoomRegistry>, issuer: TokenIssuer, check_timeout: Duration) -> Self {
        Self {
            registry,
            issuer,
            check_timeout,
        }
    }

    /// Query the registry once, bounded by the configured timeout.
    pub async fn check_upstream(&self) -> UpstreamCheck {
        match tokio::time::timeout(self.check_timeout, self.registry.list_rooms()).await {
            Ok(Ok(rooms)) => UpstreamCheck::Snapshot(rooms),
            Ok(Err(e)) => UpstreamCheck::Unavailable(e),
            Err(_) => UpstreamCheck::Unavailable(UpstreamError::Timeout),
        }
    }

    /// Issue a publisher token for `room` if admission allows it.
    ///
    /// # Errors
    ///
    /// - `GatewayError::RoomNotFound` - upstream knows no such room
    /// - `GatewayError::RoomOccupied` - the room already has a publisher
    /// - `GatewayError::Signing` - token signing failed
    #[instrument(skip(self, identity), fields(room = %room))]
    pub async fn request_publisher_token(
        &self,
        room: &str,
        identity: Option<&str>,
    ) -> Result<TokenResponse, GatewayError> {
        let identity = resolve_identity(identity, PUBLISHER_IDENTITY_PREFIX)?;

        let check = self.check_upstream().await;
        if let UpstreamCheck::Unavailable(e) = &check {
            warn!(
                target: "tg.services.admission",
                room = %room,
                error = %e,
                "Unable to check room status, issuing publisher token without admission check"
            );
        }

        let decision = evaluate(room, &check);
        metrics::record_admission_decision(decision.as_str());

        match decision {
            AdmissionDecision::RoomNotFound => {
                info!(target: "tg.services.admission", room = %room, "Publisher rejected: room not found");
                Err(GatewayError::RoomNotFound(room.to_string()))
            }
            AdmissionDecision::RoomOccupied { publishers } => {
                info!(
                    target: "tg.services.admission",
                    room = %room,
                    publishers,
                    "Publisher rejected: room already has a publisher"
                );
                Err(GatewayError::RoomOccupied(room.to_string()))
            }
            AdmissionDecision::Permit | AdmissionDecision::PermitUnchecked => {
                let response = self.issuer.issue(&identity, VideoGrant::publisher(room))?;

                info!(
                    target: "tg.services.admission",
                    room = %room,
                    identity = %response.identity,
                    decision = decision.as_str(),
                    "Publisher token issued"
                );

                Ok(response)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::services::room_registry::mock::MockRoomRegistry;
    use crate::services::token_issuer::mock::MockTokenSigner;

    const ROOM: &str = "Drone-RTC-01";

    struct Fixture {
        signer: Arc<MockTokenSigner>,
        registry: Arc<MockRoomRegistry>,
        controller: AdmissionController,
    }

    fn fixture(registry: MockRoomRegistry) -> Fixture {
        fixture_with_timeout(registry, Duration::from_secs(5))
    }

    fn fixture_with_timeout(registry: MockRoomRegistry, timeout: Duration) -> Fixture {
        let signer = Arc::new(MockTokenSigner::new());
        let registry = Arc::new(registry);
        let issuer = TokenIssuer::new(
            signer.clone(),
            "wss://demo.livekit.cloud".to_string(),
            Duration::from_secs(3600),
        );
        let controller = AdmissionController::new(registry.clone(), issuer, timeout);

        Fixture {
            signer,
            registry,
            controller,
        }
    }

    #[test]
    fn test_evaluate_room_absent() {
        let check = UpstreamCheck::Snapshot(vec![RoomSnapshot::new("other", 0)]);
        assert_eq!(evaluate(ROOM, &check), AdmissionDecision::RoomNotFound);
    }

    #[test]
    fn test_evaluate_room_idle() {
        let check = UpstreamCheck::Snapshot(vec![RoomSnapshot::new(ROOM, 0)]);
        assert_eq!(evaluate(ROOM, &check), AdmissionDecision::Permit);
    }

    #[test]
    fn test_evaluate_room_occupied() {
        let check = UpstreamCheck::Snapshot(vec![RoomSnapshot::new(ROOM, 3)]);
        assert_eq!(
            evaluate(ROOM, &check),
            AdmissionDecision::RoomOccupied { publishers: 3 }
        );
    }

    #[test]
    fn test_evaluate_unavailable_fails_open() {
        let check = UpstreamCheck::Unavailable(UpstreamError::Status(503));
        let decision = evaluate(ROOM, &check);

        assert_eq!(decision, AdmissionDecision::PermitUnchecked);
        assert!(decision.is_permitted());
    }

    #[test]
    fn test_evaluate_name_match_is_exact() {
        let check = UpstreamCheck::Snapshot(vec![RoomSnapshot::new("drone-rtc-01", 0)]);
        assert_eq!(evaluate(ROOM, &check), AdmissionDecision::RoomNotFound);
    }

    #[test]
    fn test_decision_labels() {
        assert_eq!(AdmissionDecision::Permit.as_str(), "permit");
        assert_eq!(AdmissionDecision::PermitUnchecked.as_str(), "permit_unchecked");
        assert_eq!(AdmissionDecision::RoomNotFound.as_str(), "room_not_found");
        assert_eq!(
            AdmissionDecision::RoomOccupied { publishers: 1 }.as_str(),
            "room_occupied"
        );
        assert!(!AdmissionDecision::RoomNotFound.is_permitted());
    }

    #[tokio::test]
    async fn test_room_not_found_never_signs() {
        let f = fixture(MockRoomRegistry::with_rooms(vec![RoomSnapshot::new("Cam-2", 0)]));

        let result = f.controller.request_publisher_token(ROOM, None).await;

        assert!(matches!(result, Err(GatewayError::RoomNotFound(r)) if r == ROOM));
        assert_eq!(f.signer.call_count(), 0);
        assert_eq!(f.registry.call_count(), 1);
    }

    #[tokio::test]
    async fn test_room_occupied_never_signs() {
        let f = fixture(MockRoomRegistry::with_rooms(vec![RoomSnapshot::new(ROOM, 1)]));

        let result = f.controller.request_publisher_token(ROOM, Some("alice")).await;

        assert!(matches!(result, Err(GatewayError::RoomOccupied(r)) if r == ROOM));
        assert_eq!(f.signer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_room_issues_publisher_grant() {
        let f = fixture(MockRoomRegistry::with_rooms(vec![RoomSnapshot::new(ROOM, 0)]));

        let response = f.controller.request_publisher_token(ROOM, None).await.unwrap();

        assert_eq!(response.room, ROOM);
        assert!(response.identity.starts_with("mobile-publisher-"));

        let calls = f.signer.calls();
        assert_eq!(calls.len(), 1);
        let (identity, grant) = &calls[0];
        assert_eq!(identity, &response.identity);
        assert_eq!(grant, &VideoGrant::publisher(ROOM));
    }

    #[tokio::test]
    async fn test_supplied_identity_is_kept() {
        let f = fixture(MockRoomRegistry::with_rooms(vec![RoomSnapshot::new(ROOM, 0)]));

        let response = f
            .controller
            .request_publisher_token(ROOM, Some("alice"))
            .await
            .unwrap();

        assert_eq!(response.identity, "alice");
    }

    #[tokio::test]
    async fn test_empty_identity_is_generated() {
        let f = fixture(MockRoomRegistry::with_rooms(vec![RoomSnapshot::new(ROOM, 0)]));

        let response = f
            .controller
            .request_publisher_token(ROOM, Some(""))
            .await
            .unwrap();

        assert!(response.identity.starts_with("mobile-publisher-"));
    }

    #[tokio::test]
    async fn test_upstream_error_fails_open() {
        let f = fixture(MockRoomRegistry::failing(UpstreamError::Transport(
            "connection refused".to_string(),
        )));

        let response = f.controller.request_publisher_token(ROOM, None).await.unwrap();

        assert_eq!(response.room, ROOM);
        assert_eq!(f.signer.call_count(), 1);
        assert_eq!(f.signer.calls()[0].1, VideoGrant::publisher(ROOM));
    }

    #[tokio::test]
    async fn test_upstream_timeout_fails_open() {
        let f = fixture_with_timeout(
            MockRoomRegistry::hanging(Duration::from_secs(30)),
            Duration::from_millis(50),
        );

        let check = f.controller.check_upstream().await;
        assert_eq!(check, UpstreamCheck::Unavailable(UpstreamError::Timeout));

        let response = f.controller.request_publisher_token(ROOM, None).await.unwrap();
        assert_eq!(response.room, ROOM);
    }

    #[tokio::test]
    async fn test_concurrent_requests_for_idle_room_both_pass() {
        // Check-then-issue is not atomic: both requests see the same idle snapshot.
        let f = fixture(MockRoomRegistry::with_rooms(vec![RoomSnapshot::new(ROOM, 0)]));

        let (a, b) = tokio::join!(
            f.controller.request_publisher_token(ROOM, Some("first")),
            f.controller.request_publisher_token(ROOM, Some("second")),
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(f.registry.call_count(), 2);
        assert_eq!(f.signer.call_count(), 2);
    }
}
