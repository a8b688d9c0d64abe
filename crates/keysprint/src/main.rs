//! Keysprint server binary.

use keysprint::{KeysprintError, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), KeysprintError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("KEYSPRINT_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = Server::builder().bind(&addr).build().await?;
    if let Ok(local) = server.local_addr() {
        tracing::info!(%local, "listening");
    }
    server.run().await
}
