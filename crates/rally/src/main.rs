//! Relay server binary: reads configuration from the environment and
//! runs the accept loop until the process is terminated.

use rally::{RallyError, RelayServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RallyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(addr = %config.bind_addr, "starting relay server");

    let server = RelayServer::builder().from_config(config).build().await?;
    server.run().await
}
