//! Per-connection handler: identity, outbound writer, event routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Derive the client's identity from the connection id
//!   2. Register an outbound channel with the gateway, spawn its writer
//!   3. Loop: receive frames → decode → hand to the room registry
//!   4. On exit (clean close, error, or panic) the drop guard tears
//!      down the client's room and channel

use std::sync::Arc;

use rally_protocol::{ClientEvent, ClientId, Codec};
use rally_transport::{Connection, WebSocketConnection};

use crate::RallyError;
use crate::server::ServerState;

/// Drop guard that cleans up a client when the handler exits.
///
/// This ensures teardown happens even if the handler panics. Since
/// `Drop` is synchronous, we spawn a fire-and-forget task for the
/// async registry lock.
struct DisconnectGuard {
    client: ClientId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let client = self.client;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.rooms.lock().await.disconnect(client);
            state.gateway.unregister(client);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), RallyError> {
    let client = ClientId(conn.id().into_inner());
    tracing::debug!(%client, "handling new connection");

    let conn = Arc::new(conn);

    // Outbound path: the gateway pushes events into this channel and a
    // writer task drains it onto the socket, so registry handlers never
    // await network I/O.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    state.gateway.register(client, tx);
    let _guard = DisconnectGuard {
        client,
        state: Arc::clone(&state),
    };

    let writer_conn = Arc::clone(&conn);
    let codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(%client, error = %e, "encode failed");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
        let _ = writer_conn.close().await;
    });

    // Inbound path. No read timeout: an idle room lives until one of
    // its members actually disconnects.
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%client, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%client, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                // Unknown or malformed frames are dropped, never fatal.
                tracing::debug!(%client, error = %e, "failed to decode event");
                continue;
            }
        };

        state.rooms.lock().await.handle_event(client, event);
    }

    // _guard drops here → room teardown and channel removal fire; the
    // unregister closes the outbound channel, which ends the writer.
    drop(_guard);
    let _ = writer.await;
    Ok(())
}
