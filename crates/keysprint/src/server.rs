//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Keysprint server. It ties the
//! layers together: transport → protocol → orchestrator.

use keysprint_protocol::JsonCodec;
use keysprint_transport::{Transport, WebSocketTransport};
use tokio::sync::mpsc;

use crate::KeysprintError;
use crate::config::LobbyConfig;
use crate::handler::handle_connection;
use crate::orchestrator::{Command, Orchestrator};

/// Builder for configuring and starting a Keysprint server.
///
/// # Example
///
/// ```rust,ignore
/// let server = Server::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    lobby: LobbyConfig,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            lobby: LobbyConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the lobby configuration (room capacity, timer durations).
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby = config;
        self
    }

    /// Binds the transport and builds the server.
    ///
    /// Uses `JsonCodec` over WebSockets, which is what the browser client
    /// speaks.
    pub async fn build(self) -> Result<Server, KeysprintError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let (orchestrator, commands) = Orchestrator::new(self.lobby);
        Ok(Server {
            transport,
            orchestrator,
            commands,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Keysprint server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server {
    transport: WebSocketTransport,
    orchestrator: Orchestrator,
    commands: mpsc::UnboundedSender<Command>,
}

impl Server {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the orchestrator and the accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), KeysprintError> {
        tracing::info!("Keysprint server running");

        tokio::spawn(self.orchestrator.run());

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let commands = self.commands.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, commands, JsonCodec).await {
                            tracing::debug!(error = %e, "connection ended with error");
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
