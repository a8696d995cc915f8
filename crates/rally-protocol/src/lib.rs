//! Wire protocol for the Rally relay server.
//!
//! Defines the events clients and the relay exchange:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`ClientId`],
//!   [`RoomCode`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how they become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer sits between transport (raw frames) and the room
//! core (membership and fanout). It knows nothing about connections or
//! rooms — only about message shapes.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ClientEvent, ClientId, RoomCode, ServerEvent};
