//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The listener serves two kinds of traffic on one port, the way the
//! relay is deployed behind a single load-balancer target:
//!
//! - requests carrying a WebSocket upgrade become realtime connections
//!   (subject to the allowed-origin check);
//! - anything else is treated as the HTTP liveness probe and answered
//!   with a fixed body, then closed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Body returned by the liveness probe.
const HEALTH_BODY: &str = "Server working fine!";

/// How long a freshly accepted socket has to produce its request head.
const HEAD_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    allowed_origin: Option<String>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    ///
    /// `allowed_origin` restricts which web origins may complete the
    /// WebSocket handshake. `None` or `"*"` allows every origin. The
    /// liveness probe is never origin-checked.
    pub async fn bind(
        addr: &str,
        allowed_origin: Option<String>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            allowed_origin,
        })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        loop {
            let (stream, addr) = self
                .listener
                .accept()
                .await
                .map_err(TransportError::AcceptFailed)?;

            let head = match tokio::time::timeout(
                HEAD_TIMEOUT,
                peek_request_head(&stream),
            )
            .await
            {
                Ok(Ok(head)) => head,
                Ok(Err(e)) => {
                    tracing::debug!(%addr, error = %e, "dropping connection");
                    continue;
                }
                Err(_) => {
                    tracing::debug!(%addr, "request head timed out");
                    continue;
                }
            };

            if !is_websocket_upgrade(&head) {
                // Liveness probe or stray HTTP request. Answer it off
                // the accept loop and keep listening.
                tokio::spawn(answer_http(stream, head));
                continue;
            }

            let allowed = self.allowed_origin.clone();
            let callback = move |req: &Request, resp: Response| {
                check_origin(allowed.as_deref(), req, resp)
            };
            let ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                .await
                .map_err(|e| {
                    TransportError::AcceptFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        e,
                    ))
                })?;

            let id = ConnectionId::new(
                NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            );
            tracing::debug!(%id, %addr, "accepted WebSocket connection");

            let (sink, stream) = ws.split();
            return Ok(WebSocketConnection {
                id,
                sink: Mutex::new(sink),
                stream: Mutex::new(stream),
            });
        }
    }
}

/// Peeks at the socket until the HTTP request head is available.
///
/// Real clients send the head in one segment; the retry loop only
/// covers stragglers. The outer caller bounds the total wait.
async fn peek_request_head(
    stream: &TcpStream,
) -> Result<Vec<u8>, TransportError> {
    let mut buf = [0u8; 1024];
    loop {
        stream
            .readable()
            .await
            .map_err(TransportError::AcceptFailed)?;
        let n = stream
            .peek(&mut buf)
            .await
            .map_err(TransportError::AcceptFailed)?;
        if n == buf.len() || buf[..n].windows(4).any(|w| w == b"\r\n\r\n") {
            return Ok(buf[..n].to_vec());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Returns `true` if the request head asks for a WebSocket upgrade.
fn is_websocket_upgrade(head: &[u8]) -> bool {
    String::from_utf8_lossy(head)
        .to_ascii_lowercase()
        .contains("upgrade: websocket")
}

/// Answers a plain HTTP request: `GET /` gets the fixed liveness body,
/// everything else a 404. The socket is closed afterwards.
async fn answer_http(mut stream: TcpStream, head: Vec<u8>) {
    // Consume the request bytes we peeked so the write isn't racing a
    // half-read request.
    let mut drain = vec![0u8; head.len()];
    let _ = stream.read_exact(&mut drain).await;

    let response = if head.starts_with(b"GET / ") {
        format!(
            "HTTP/1.1 200 OK\r\n\
             content-type: text/plain; charset=utf-8\r\n\
             content-length: {}\r\n\
             connection: close\r\n\r\n{}",
            HEALTH_BODY.len(),
            HEALTH_BODY
        )
    } else {
        "HTTP/1.1 404 Not Found\r\n\
         content-length: 0\r\n\
         connection: close\r\n\r\n"
            .to_string()
    };

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::debug!(error = %e, "failed to answer HTTP request");
    }
    let _ = stream.shutdown().await;
}

/// Handshake callback enforcing the configured allowed origin.
fn check_origin(
    allowed: Option<&str>,
    req: &Request,
    resp: Response,
) -> Result<Response, ErrorResponse> {
    let allowed = match allowed {
        None | Some("*") => return Ok(resp),
        Some(a) => a,
    };

    let origin = req
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok());
    match origin {
        Some(o) if o == allowed => Ok(resp),
        other => {
            tracing::warn!(
                origin = ?other,
                "rejected handshake from disallowed origin"
            );
            let mut reject =
                ErrorResponse::new(Some("origin not allowed".to_string()));
            *reject.status_mut() = StatusCode::FORBIDDEN;
            Err(reject)
        }
    }
}

/// A single WebSocket connection.
///
/// The underlying stream is split so sends and receives take separate
/// locks — the relay pushes opponent updates to a client while that
/// client's reader sits idle in `recv`.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
