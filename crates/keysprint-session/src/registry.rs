//! The player registry: keyed store of connected players.

use std::collections::HashMap;

use keysprint_protocol::PlayerName;
use keysprint_transport::ConnectionId;

use crate::{Player, RegistryError};

/// All connected players, keyed by name.
///
/// The registry is owned by a single task (the orchestrator) and is a plain
/// `HashMap` on purpose — no interior locking, mutation happens only from
/// the one event loop.
pub struct PlayerRegistry {
    players: HashMap<PlayerName, Player>,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
        }
    }

    /// Registers a new player under an unused name.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateIdentity`] if the name is taken;
    /// the existing player is not touched.
    pub fn create(
        &mut self,
        name: PlayerName,
        conn: ConnectionId,
    ) -> Result<&Player, RegistryError> {
        if self.players.contains_key(&name) {
            return Err(RegistryError::DuplicateIdentity(name));
        }
        tracing::info!(player = %name, %conn, "player registered");
        Ok(self
            .players
            .entry(name.clone())
            .or_insert_with(|| Player::new(name, conn)))
    }

    /// Looks up a player by name.
    pub fn get(&self, name: &PlayerName) -> Option<&Player> {
        self.players.get(name)
    }

    /// Looks up a player mutably.
    pub fn get_mut(&mut self, name: &PlayerName) -> Option<&mut Player> {
        self.players.get_mut(name)
    }

    /// Returns `true` if the name is registered.
    pub fn exists(&self, name: &PlayerName) -> bool {
        self.players.contains_key(name)
    }

    /// Removes a player. No-op if the name is unknown.
    pub fn delete(&mut self, name: &PlayerName) {
        if self.players.remove(name).is_some() {
            tracing::info!(player = %name, "player removed");
        }
    }

    /// Number of connected players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns `true` if no players are connected.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
