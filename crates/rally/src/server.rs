//! `RelayServer` builder and accept loop.
//!
//! Entry point for running the relay. It ties the layers together:
//! transport → protocol → room registry.

use std::sync::Arc;

use rally_protocol::JsonCodec;
use rally_room::{ChannelGateway, RoomManager};
use rally_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::RallyError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The room
/// registry sits behind a single `Mutex`; every handler's registry
/// access is serialized through it.
pub(crate) struct ServerState {
    pub(crate) rooms: Mutex<RoomManager<ChannelGateway>>,
    pub(crate) gateway: Arc<ChannelGateway>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,ignore
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:3000")
///     .allowed_origin("https://game.example")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    allowed_origin: Option<String>,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            allowed_origin: None,
        }
    }

    /// Applies environment-derived configuration.
    pub fn from_config(mut self, config: ServerConfig) -> Self {
        self.bind_addr = config.bind_addr;
        self.allowed_origin = config.allowed_origin;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Restricts realtime connections to one web origin.
    pub fn allowed_origin(mut self, origin: &str) -> Self {
        self.allowed_origin = Some(origin.to_string());
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<RelayServer, RallyError> {
        let transport = WebSocketTransport::bind(
            &self.bind_addr,
            self.allowed_origin,
        )
        .await?;

        let gateway = Arc::new(ChannelGateway::new());
        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(Arc::clone(&gateway))),
            gateway,
            codec: JsonCodec,
        });

        Ok(RelayServer { transport, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), RallyError> {
        tracing::info!("Rally relay server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
