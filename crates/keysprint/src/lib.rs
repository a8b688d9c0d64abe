//! # Keysprint
//!
//! Real-time lobby and race server for multiplayer typing games.
//!
//! Players connect over WebSockets, claim a unique name, gather in named
//! rooms, and signal readiness. The moment every member of a room is
//! ready, a countdown starts, a race text is drawn, and the room races the
//! clock — first to the last character wins, and everybody gets ranked.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keysprint::Server;
//!
//! # async fn run() -> Result<(), keysprint::KeysprintError> {
//! let server = Server::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod corpus;
mod error;
mod handler;
mod server;

pub mod orchestrator;
pub mod ranking;

pub use config::LobbyConfig;
pub use corpus::TextCorpus;
pub use error::KeysprintError;
pub use server::{Server, ServerBuilder};
