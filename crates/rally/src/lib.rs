//! # Rally
//!
//! Realtime relay server pairing two clients into a shared room.
//!
//! Rally is the rendezvous and fanout layer for a head-to-head web
//! game: it creates rooms with shareable codes, seats two players per
//! room, and forwards their updates to each other without interpreting
//! them. It holds no game logic.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rally::RelayServer;
//!
//! # async fn run() -> Result<(), rally::RallyError> {
//! let server = RelayServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::RallyError;
pub use server::{RelayServer, RelayServerBuilder};
