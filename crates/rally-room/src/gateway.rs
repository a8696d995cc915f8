//! The outbound send capability handed to the room core.
//!
//! The [`Gateway`] trait is the only way the core talks back to clients:
//! send to one client, or broadcast to a room's subscribers. All sends
//! are fire-and-forget — no acknowledgment, no backpressure. A send to a
//! client whose connection is gone is a silent drop.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use rally_protocol::{ClientId, RoomCode, ServerEvent};
use tokio::sync::mpsc;

/// Channel sender for delivering outbound events to one client's writer.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Outbound delivery capability supplied by the connection layer.
pub trait Gateway: Send + Sync + 'static {
    /// Sends an event to a single client.
    fn send_to(&self, client: ClientId, event: ServerEvent);

    /// Sends an event to every subscriber of a room, optionally
    /// excluding one client (the sender of a relayed update).
    fn broadcast(
        &self,
        room: &RoomCode,
        event: ServerEvent,
        excluding: Option<ClientId>,
    );

    /// Adds a client to a room's broadcast scope.
    fn subscribe(&self, client: ClientId, room: &RoomCode);

    /// Removes a room's broadcast scope entirely.
    fn drop_room(&self, room: &RoomCode);
}

#[derive(Default)]
struct GatewayInner {
    /// Per-client outbound channels, registered by the connection handler.
    clients: HashMap<ClientId, EventSender>,
    /// Broadcast scopes: which clients receive room-wide events.
    rooms: HashMap<RoomCode, HashSet<ClientId>>,
}

/// The production [`Gateway`]: routes events into per-client unbounded
/// channels, each drained by that connection's writer task.
#[derive(Default)]
pub struct ChannelGateway {
    inner: Mutex<GatewayInner>,
}

impl ChannelGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client's outbound channel. Called by the connection
    /// handler before any event for this client can be dispatched.
    pub fn register(&self, client: ClientId, sender: EventSender) {
        self.lock().clients.insert(client, sender);
    }

    /// Removes a client's channel and any scope memberships. Called when
    /// the connection handler exits.
    pub fn unregister(&self, client: ClientId) {
        let mut inner = self.lock();
        inner.clients.remove(&client);
        for members in inner.rooms.values_mut() {
            members.remove(&client);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GatewayInner> {
        self.inner.lock().expect("gateway lock poisoned")
    }
}

impl Gateway for ChannelGateway {
    fn send_to(&self, client: ClientId, event: ServerEvent) {
        if let Some(sender) = self.lock().clients.get(&client) {
            // Receiver gone means the client is mid-disconnect; the
            // registry catches up when the handler's guard fires.
            let _ = sender.send(event);
        }
    }

    fn broadcast(
        &self,
        room: &RoomCode,
        event: ServerEvent,
        excluding: Option<ClientId>,
    ) {
        let inner = self.lock();
        let Some(members) = inner.rooms.get(room) else {
            return;
        };
        for member in members {
            if Some(*member) == excluding {
                continue;
            }
            if let Some(sender) = inner.clients.get(member) {
                let _ = sender.send(event.clone());
            }
        }
    }

    fn subscribe(&self, client: ClientId, room: &RoomCode) {
        self.lock()
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(client);
    }

    fn drop_room(&self, room: &RoomCode) {
        self.lock().rooms.remove(room);
    }
}
