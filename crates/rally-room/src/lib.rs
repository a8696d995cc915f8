//! Room management for the Rally relay server.
//!
//! This is the relay's core: the registry of live rooms, the assignment
//! of clients to player slots, and the fanout of opaque updates between
//! the two members of a room.
//!
//! # Key types
//!
//! - [`RoomManager`] — owns the registry; one instance per process,
//!   guarded by a single mutex at the server layer
//! - [`Gateway`] — the send capability the manager is handed; it never
//!   reaches into the connection table itself
//! - [`ChannelGateway`] — the production [`Gateway`] over per-client
//!   unbounded channels
//! - [`Room`] / [`Player`] — registry entries

mod codes;
mod gateway;
mod manager;

pub use gateway::{ChannelGateway, EventSender, Gateway};
pub use manager::{Player, Room, RoomManager};
