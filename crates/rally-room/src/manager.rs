//! Room manager: creates rooms, assigns player slots, relays updates.

use std::collections::HashMap;
use std::sync::Arc;

use rally_protocol::{ClientEvent, ClientId, RoomCode, ServerEvent};
use serde_json::Value;

use crate::Gateway;
use crate::codes;

/// Maximum players per room. Two, always: this is a head-to-head relay.
const MAX_PLAYERS: usize = 2;

/// A client's seat inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    /// Identity assigned by the connection layer.
    pub client: ClientId,
    /// 1 or 2, in join order. Slot 1 is the host. Never reassigned.
    pub slot: u8,
}

/// A live rendezvous session: a shareable code and up to two players.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    host: ClientId,
    players: Vec<Player>,
}

impl Room {
    fn new(code: RoomCode, host: ClientId) -> Self {
        Self {
            code,
            host,
            players: Vec::with_capacity(MAX_PLAYERS),
        }
    }

    /// The room's shareable code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// The client that created the room. Also slot 1 once assigned.
    pub fn host(&self) -> ClientId {
        self.host
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Whether the client occupies a seat in this room.
    pub fn contains(&self, client: ClientId) -> bool {
        self.players.iter().any(|p| p.client == client)
    }
}

/// Owns the registry of active rooms and routes every inbound event.
///
/// All methods are synchronous; the server layer wraps the whole manager
/// in a single mutex, so each handler's read-modify-write on the
/// registry is atomic as an observable unit. Outbound sends through the
/// [`Gateway`] are fire-and-forget, so nothing here awaits I/O.
pub struct RoomManager<G: Gateway> {
    gateway: Arc<G>,

    /// Active rooms, keyed by code.
    rooms: HashMap<RoomCode, Room>,

    /// Maps each client to the room they're currently in.
    /// A client can be in at most ONE room at a time (key invariant);
    /// kept in lockstep with `rooms` inside the same critical section.
    client_rooms: HashMap<ClientId, RoomCode>,
}

impl<G: Gateway> RoomManager<G> {
    /// Creates an empty manager that sends through the given gateway.
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            rooms: HashMap::new(),
            client_rooms: HashMap::new(),
        }
    }

    /// Dispatches one inbound client event to its handler.
    pub fn handle_event(&mut self, client: ClientId, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom => self.create_room(client),
            ClientEvent::JoinRoom(code) => self.join_room(client, code),
            ClientEvent::PlayerMove(data) => self.player_move(client, data),
            ClientEvent::BallUpdate(data) => self.ball_update(client, data),
        }
    }

    /// Creates a new room with `client` as its host and first player.
    ///
    /// The creator receives `room-created` with the code, then
    /// `player-assigned` for slot 1.
    pub fn create_room(&mut self, client: ClientId) {
        let code = self.fresh_code();
        self.rooms.insert(code.clone(), Room::new(code.clone(), client));
        self.gateway.subscribe(client, &code);
        self.gateway
            .send_to(client, ServerEvent::RoomCreated(code.clone()));
        self.assign(client, &code);
        tracing::info!(%client, room = %code, "room created");
    }

    /// Adds `client` to an existing room, or rejects with `room-full`.
    ///
    /// A join against an unknown code and a join against a full room are
    /// indistinguishable to the client: both get `room-full` and nothing
    /// in the registry changes. On success the joiner receives
    /// `player-assigned` then `room-joined`, and every subscriber of the
    /// room (the joiner included) receives `opponent-connected`.
    pub fn join_room(&mut self, client: ClientId, code: RoomCode) {
        let joinable = self
            .rooms
            .get(&code)
            .is_some_and(|room| !room.is_full());
        if !joinable {
            tracing::debug!(%client, room = %code, "join rejected");
            self.gateway.send_to(client, ServerEvent::RoomFull);
            return;
        }

        self.gateway.subscribe(client, &code);
        self.assign(client, &code);
        self.gateway
            .send_to(client, ServerEvent::RoomJoined(code.clone()));
        self.gateway
            .broadcast(&code, ServerEvent::OpponentConnected, None);
        tracing::info!(%client, room = %code, "player joined");
    }

    /// Appends `client` to the room's player list and tells it its slot.
    ///
    /// Callers guarantee the room exists and has a free slot.
    fn assign(&mut self, client: ClientId, code: &RoomCode) {
        let room = self
            .rooms
            .get_mut(code)
            .expect("assign called on a live room");
        let slot = (room.players.len() + 1) as u8;
        room.players.push(Player { client, slot });
        self.client_rooms.insert(client, code.clone());
        self.gateway.send_to(
            client,
            ServerEvent::PlayerAssigned {
                player_id: slot,
                is_host: slot == 1,
            },
        );
    }

    /// Relays a paddle move to the other member as `opponent-move`.
    pub fn player_move(&mut self, client: ClientId, data: Value) {
        self.relay(client, ServerEvent::OpponentMove(data));
    }

    /// Relays a ball position to the other member, name unchanged.
    pub fn ball_update(&mut self, client: ClientId, data: Value) {
        self.relay(client, ServerEvent::BallUpdate(data));
    }

    /// Forwards an opaque update to the sender's room, sender excluded.
    /// A client not in any room has its update silently dropped.
    fn relay(&self, client: ClientId, event: ServerEvent) {
        let Some(code) = self.client_rooms.get(&client) else {
            return;
        };
        self.gateway.broadcast(code, event, Some(client));
    }

    /// Tears down the departing client's room, if it has one.
    ///
    /// The whole room goes away on the first disconnect: the remaining
    /// member gets `opponent-disconnected` and its code stops resolving.
    /// A client that never completed a create or join is a no-op.
    pub fn disconnect(&mut self, client: ClientId) {
        let Some(code) = self.client_rooms.remove(&client) else {
            return;
        };
        let Some(room) = self.rooms.remove(&code) else {
            return;
        };
        for player in room.players() {
            self.client_rooms.remove(&player.client);
        }
        self.gateway.broadcast(
            &code,
            ServerEvent::OpponentDisconnected,
            Some(client),
        );
        self.gateway.drop_room(&code);
        tracing::info!(%client, room = %code, "room destroyed");
    }

    /// Generates a code not currently in the registry.
    ///
    /// Collisions are near-impossible with 36^6 codes, but two clients
    /// creating rooms in the same instant must never share one, so the
    /// registry is checked and generation retried on conflict.
    fn fresh_code(&self) -> RoomCode {
        loop {
            let code = codes::generate();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Returns the room with the given code, if it is live.
    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Returns the code of the room a client is currently in, if any.
    pub fn client_room(&self, client: ClientId) -> Option<&RoomCode> {
        self.client_rooms.get(&client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChannelGateway;

    #[test]
    fn test_room_contains_tracks_players() {
        let mut room = Room::new(RoomCode::from("AB12CD"), ClientId(1));
        assert!(!room.contains(ClientId(1)));
        room.players.push(Player { client: ClientId(1), slot: 1 });
        assert!(room.contains(ClientId(1)));
        assert!(!room.is_full());
        room.players.push(Player { client: ClientId(2), slot: 2 });
        assert!(room.is_full());
    }

    #[test]
    fn test_fresh_code_avoids_live_codes() {
        // Can't force a random collision, but the lookup path must at
        // least not return a code that is already registered.
        let manager =
            RoomManager::new(Arc::new(ChannelGateway::new()));
        let code = manager.fresh_code();
        assert!(manager.room(&code).is_none());
    }
}
