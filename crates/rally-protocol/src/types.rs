//! Wire event types for the Rally relay protocol.
//!
//! Every message between a client and the relay is one of two enums:
//! [`ClientEvent`] (inbound) or [`ServerEvent`] (outbound). Both use the
//! adjacently-tagged JSON form `{"event": "...", "data": ...}` with
//! kebab-case event names, matching what the browser clients emit.
//!
//! Move and ball payloads are [`serde_json::Value`] — the relay forwards
//! them without looking inside.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a connected client, assigned by the gateway.
///
/// The relay core only ever compares these for equality; it attaches no
/// meaning to the number itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A short human-shareable room code: 6 characters over `[0-9A-Z]`.
///
/// Codes are generated by the room layer and unique among live rooms.
/// The wrapper does not validate its contents — a client can send any
/// string as a join target, and an unknown code is simply not found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// The number of characters in a generated room code.
    pub const LEN: usize = 6;

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Events a client sends to the relay.
///
/// `disconnect` is not listed here — it is a connection-level event the
/// transport reports when the socket closes, not a frame clients send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Open a new room and become its host.
    CreateRoom,

    /// Join an existing room by code.
    JoinRoom(RoomCode),

    /// A paddle/position update to relay to the opponent. Opaque.
    PlayerMove(serde_json::Value),

    /// A ball state update to relay to the opponent. Opaque.
    BallUpdate(serde_json::Value),
}

/// Events the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// To the creator: the room is open under this code.
    RoomCreated(RoomCode),

    /// To a newly assigned player: their slot and host status.
    /// `player_id` is the slot (1 or 2); slot 1 is the host.
    #[serde(rename_all = "camelCase")]
    PlayerAssigned { player_id: u8, is_host: bool },

    /// To a joiner: the join succeeded.
    RoomJoined(RoomCode),

    /// To a rejected joiner: the room is full or does not exist.
    RoomFull,

    /// To every room subscriber: the room now has both players.
    OpponentConnected,

    /// To the other player: the opponent's `player-move` payload,
    /// echoed unchanged.
    OpponentMove(serde_json::Value),

    /// To the other player: the opponent's `ball-update` payload,
    /// echoed unchanged.
    BallUpdate(serde_json::Value),

    /// To the remaining player: the opponent's connection dropped and
    /// the room is being torn down.
    OpponentDisconnected,
}

#[cfg(test)]
mod tests {
    //! The browser clients parse these exact JSON shapes, so every
    //! variant gets a shape test — a serde attribute regression would
    //! otherwise only show up as a blank screen on the client.

    use serde_json::json;

    use super::*;

    #[test]
    fn test_client_id_serializes_as_plain_number() {
        let j = serde_json::to_string(&ClientId(42)).unwrap();
        assert_eq!(j, "42");
    }

    #[test]
    fn test_client_id_display() {
        assert_eq!(ClientId(7).to_string(), "C-7");
    }

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let j = serde_json::to_string(&RoomCode::from("AB12CD")).unwrap();
        assert_eq!(j, "\"AB12CD\"");
    }

    #[test]
    fn test_room_code_display() {
        assert_eq!(RoomCode::from("XY99ZZ").to_string(), "XY99ZZ");
    }

    #[test]
    fn test_create_room_json_shape() {
        let v = serde_json::to_value(&ClientEvent::CreateRoom).unwrap();
        assert_eq!(v, json!({ "event": "create-room" }));
    }

    #[test]
    fn test_join_room_json_shape() {
        let v = serde_json::to_value(&ClientEvent::JoinRoom(
            RoomCode::from("AB12CD"),
        ))
        .unwrap();
        assert_eq!(v, json!({ "event": "join-room", "data": "AB12CD" }));
    }

    #[test]
    fn test_player_move_payload_is_opaque() {
        // Arbitrary structure passes through untouched.
        let payload = json!({ "y": 120.5, "vy": -3, "junk": [1, null] });
        let event = ClientEvent::PlayerMove(payload.clone());
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, ClientEvent::PlayerMove(payload));
    }

    #[test]
    fn test_room_created_json_shape() {
        let v = serde_json::to_value(&ServerEvent::RoomCreated(
            RoomCode::from("AB12CD"),
        ))
        .unwrap();
        assert_eq!(v, json!({ "event": "room-created", "data": "AB12CD" }));
    }

    #[test]
    fn test_player_assigned_uses_camel_case_fields() {
        let v = serde_json::to_value(&ServerEvent::PlayerAssigned {
            player_id: 1,
            is_host: true,
        })
        .unwrap();
        assert_eq!(
            v,
            json!({
                "event": "player-assigned",
                "data": { "playerId": 1, "isHost": true }
            })
        );
    }

    #[test]
    fn test_room_full_has_no_data() {
        let v = serde_json::to_value(&ServerEvent::RoomFull).unwrap();
        assert_eq!(v, json!({ "event": "room-full" }));
    }

    #[test]
    fn test_opponent_connected_round_trip() {
        let bytes =
            serde_json::to_vec(&ServerEvent::OpponentConnected).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, ServerEvent::OpponentConnected);
    }

    #[test]
    fn test_opponent_move_echoes_payload() {
        let payload = json!({ "x": 1, "y": 2 });
        let event = ServerEvent::OpponentMove(payload.clone());
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v, json!({ "event": "opponent-move", "data": payload }));
    }

    #[test]
    fn test_ball_update_keeps_same_event_name_both_directions() {
        // `ball-update` is the one event relayed under its own name.
        let inbound = serde_json::to_value(&ClientEvent::BallUpdate(
            json!({ "x": 3 }),
        ))
        .unwrap();
        let outbound = serde_json::to_value(&ServerEvent::BallUpdate(
            json!({ "x": 3 }),
        ))
        .unwrap();
        assert_eq!(inbound["event"], "ball-update");
        assert_eq!(outbound["event"], "ball-update");
    }

    #[test]
    fn test_opponent_disconnected_json_shape() {
        let v =
            serde_json::to_value(&ServerEvent::OpponentDisconnected).unwrap();
        assert_eq!(v, json!({ "event": "opponent-disconnected" }));
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientEvent, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_event_returns_error() {
        let unknown = r#"{"event": "fly-to-moon", "data": 9000}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_valid_json_wrong_shape_returns_error() {
        let wrong = r#"{"name": "hello"}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(wrong);
        assert!(result.is_err());
    }
}
