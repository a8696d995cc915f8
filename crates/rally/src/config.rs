//! Server configuration from the process environment.

/// Default listen port when `PORT` is unset.
const DEFAULT_PORT: u16 = 3000;

/// Runtime settings for a relay server instance.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind, `0.0.0.0:{port}`.
    pub bind_addr: String,
    /// Web origin allowed to open the realtime connection.
    /// `None` (or `*`) accepts any origin.
    pub allowed_origin: Option<String>,
}

impl ServerConfig {
    /// Reads configuration from `PORT` and `ALLOWED_ORIGIN`.
    ///
    /// An unset or unparseable `PORT` falls back to 3000.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| parse_port(&p))
            .unwrap_or(DEFAULT_PORT);
        let allowed_origin =
            std::env::var("ALLOWED_ORIGIN").ok().filter(|o| !o.is_empty());
        Self {
            bind_addr: format!("0.0.0.0:{port}"),
            allowed_origin,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            allowed_origin: None,
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.trim().parse() {
        Ok(port) => Some(port),
        Err(_) => {
            tracing::warn!(%raw, "ignoring unparseable PORT");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_accepts_plain_numbers() {
        assert_eq!(parse_port("3000"), Some(3000));
        assert_eq!(parse_port(" 8080 "), Some(8080));
    }

    #[test]
    fn test_parse_port_rejects_garbage() {
        assert_eq!(parse_port(""), None);
        assert_eq!(parse_port("abc"), None);
        assert_eq!(parse_port("70000"), None);
    }

    #[test]
    fn test_default_config_binds_port_3000() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.allowed_origin.is_none());
    }
}
