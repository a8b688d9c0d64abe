//! Error types for the player registry.

use keysprint_protocol::PlayerName;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The name is already claimed by a live connection. The new
    /// connection must be refused; the existing player is untouched.
    #[error("player name {0:?} is already connected")]
    DuplicateIdentity(PlayerName),
}
