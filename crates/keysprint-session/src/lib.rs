//! Connected-player registry for Keysprint.
//!
//! Tracks every player currently connected to the server, keyed by their
//! unique name:
//!
//! 1. **Identity** — a name can be claimed by at most one live connection
//!    ([`RegistryError::DuplicateIdentity`] otherwise)
//! 2. **Per-player race state** — readiness, typing progress, finish time,
//!    and the room the player occupies
//!
//! Only the orchestrator constructs or destroys [`Player`]s; nothing else
//! reaches into the registry's map.

mod error;
mod player;
mod registry;

pub use error::RegistryError;
pub use player::Player;
pub use registry::PlayerRegistry;
