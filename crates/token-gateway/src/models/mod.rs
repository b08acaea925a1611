//! Token Gateway models.
//!
//! Contains the grant and claims types encoded into access tokens, the room
//! snapshot read from the upstream registry, and the HTTP request/response
//! bodies.

use serde::{Deserialize, Serialize};

// ============================================================================
// Grants
// ============================================================================

/// Video grant encoded in the `video` claim of an access token.
///
/// Serialized with camelCase field names as the media server expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    /// Room the holder may join.
    #[serde(default)]
    pub room: String,

    #[serde(default)]
    pub room_join: bool,

    #[serde(default)]
    pub can_subscribe: bool,

    #[serde(default)]
    pub can_publish: bool,

    #[serde(default)]
    pub can_publish_data: bool,

    /// Permission to list rooms. Only set on the gateway's own upstream
    /// credential, never on client tokens.
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_list: bool,
}

impl VideoGrant {
    /// Watch-only access: join and subscribe.
    pub fn viewer(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            room_join: true,
            can_subscribe: true,
            can_publish: false,
            can_publish_data: false,
            room_list: false,
        }
    }

    /// Full media access: join, subscribe, publish tracks and data.
    pub fn publisher(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            room_join: true,
            can_subscribe: true,
            can_publish: true,
            can_publish_data: true,
            room_list: false,
        }
    }

    /// Service credential for the upstream room-list query.
    pub fn room_list() -> Self {
        Self {
            room: String::new(),
            room_join: false,
            can_subscribe: false,
            can_publish: false,
            can_publish_data: false,
            room_list: true,
        }
    }

    /// Metrics label for the grant variant.
    pub fn kind(&self) -> &'static str {
        if self.room_list {
            "room_list"
        } else if self.can_publish {
            "publisher"
        } else {
            "viewer"
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Claims of a signed access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// API key that signed the token.
    pub iss: String,

    /// Identity of the token holder.
    pub sub: String,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    pub video: VideoGrant,
}

// ============================================================================
// Upstream Room Registry
// ============================================================================

/// Point-in-time view of one upstream room.
///
/// Accepts both the proto field name (`num_publishers`) and the camelCase
/// JSON name; absent fields default to zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomSnapshot {
    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "numPublishers")]
    pub num_publishers: u32,
}

impl RoomSnapshot {
    pub fn new(name: impl Into<String>, num_publishers: u32) -> Self {
        Self {
            name: name.into(),
            num_publishers,
        }
    }
}

/// Body of the upstream `ListRooms` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRoomsResponse {
    #[serde(default)]
    pub rooms: Vec<RoomSnapshot>,
}

// ============================================================================
// HTTP API Models
// ============================================================================

/// Query parameters for `GET /api/token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerTokenQuery {
    /// Room to watch (defaults to the first configured device).
    pub room: Option<String>,
}

/// Query parameters for `GET /api/publisher-token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublisherTokenQuery {
    /// Room to publish into (defaults to the first configured device).
    pub room: Option<String>,

    /// Caller-chosen identity; generated when absent or empty.
    pub identity: Option<String>,
}

/// Token issued to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub identity: String,
    pub token: String,
    pub server_url: String,
    pub room: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_grant_flags() {
        let grant = VideoGrant::viewer("Drone-RTC-01");
        assert_eq!(grant.room, "Drone-RTC-01");
        assert!(grant.room_join);
        assert!(grant.can_subscribe);
        assert!(!grant.can_publish);
        assert!(!grant.can_publish_data);
        assert_eq!(grant.kind(), "viewer");
    }

    #[test]
    fn test_publisher_grant_flags() {
        let grant = VideoGrant::publisher("Drone-RTC-01");
        assert!(grant.room_join);
        assert!(grant.can_subscribe);
        assert!(grant.can_publish);
        assert!(grant.can_publish_data);
        assert_eq!(grant.kind(), "publisher");
    }

    #[test]
    fn test_grant_serializes_camel_case_without_room_list() {
        let json = serde_json::to_value(VideoGrant::viewer("r1")).unwrap();

        assert_eq!(json["room"], "r1");
        assert_eq!(json["roomJoin"], true);
        assert_eq!(json["canSubscribe"], true);
        assert_eq!(json["canPublish"], false);
        assert_eq!(json["canPublishData"], false);
        assert!(json.get("roomList").is_none());
    }

    #[test]
    fn test_room_list_grant_serialization() {
        let json = serde_json::to_value(VideoGrant::room_list()).unwrap();
        assert_eq!(json["roomList"], true);
        assert_eq!(json["roomJoin"], false);
    }

    #[test]
    fn test_room_snapshot_accepts_both_field_spellings() {
        let snake: RoomSnapshot =
            serde_json::from_str(r#"{"name":"a","num_publishers":2}"#).unwrap();
        assert_eq!(snake, RoomSnapshot::new("a", 2));

        let camel: RoomSnapshot =
            serde_json::from_str(r#"{"name":"b","numPublishers":1}"#).unwrap();
        assert_eq!(camel, RoomSnapshot::new("b", 1));
    }

    #[test]
    fn test_list_rooms_response_defaults() {
        let empty: ListRoomsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.rooms.is_empty());

        let partial: ListRoomsResponse =
            serde_json::from_str(r#"{"rooms":[{"name":"idle","sid":"RM_x"}]}"#).unwrap();
        assert_eq!(partial.rooms, vec![RoomSnapshot::new("idle", 0)]);
    }

    #[test]
    fn test_token_response_field_names() {
        let response = TokenResponse {
            identity: "viewer-0a1b2c3d".to_string(),
            token: "eyJ...".to_string(),
            server_url: "wss://demo.livekit.cloud".to_string(),
            room: "Drone-RTC-01".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"identity\":\"viewer-0a1b2c3d\""));
        assert!(json.contains("\"server_url\":\"wss://demo.livekit.cloud\""));
        assert!(json.contains("\"room\":\"Drone-RTC-01\""));
    }
}
