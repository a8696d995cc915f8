//! Unified error type for the Rally server.

use rally_protocol::ProtocolError;
use rally_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Room operations never fail — rejections travel to clients as named
/// events — so only the transport and protocol layers contribute
/// variants. The `#[from]` attribute on each lets `?` convert them.
#[derive(Debug, thiserror::Error)]
pub enum RallyError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: RallyError = TransportError::SendFailed(io).into();
        assert!(matches!(err, RallyError::Transport(_)));
    }

    #[test]
    fn test_from_protocol_error() {
        let bad = serde_json::from_slice::<serde_json::Value>(b"{")
            .expect_err("invalid json");
        let err: RallyError = ProtocolError::Decode(bad).into();
        assert!(matches!(err, RallyError::Protocol(_)));
        assert!(!err.to_string().is_empty());
    }
}
