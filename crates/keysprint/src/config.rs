//! Server and lobby configuration.

use keysprint_clock::ClockConfig;

/// Tunables for the lobby itself, independent of how it is reached.
#[derive(Debug, Clone, Copy)]
pub struct LobbyConfig {
    /// Maximum members per room.
    pub room_capacity: usize,
    /// Countdown and race durations.
    pub clock: ClockConfig,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            room_capacity: 4,
            clock: ClockConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lobby_config() {
        let cfg = LobbyConfig::default();
        assert_eq!(cfg.room_capacity, 4);
        assert_eq!(cfg.clock.countdown_secs, 10);
        assert_eq!(cfg.clock.race_secs, 60);
    }
}
