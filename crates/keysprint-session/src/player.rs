//! The per-player record: identity plus mutable race state.

use keysprint_protocol::{PlayerName, PlayerView, RoomName};
use keysprint_transport::ConnectionId;

/// A connected player.
///
/// Created when a connection claims an unused name; lives until that
/// connection ends. Race fields are meaningful only while the player is in
/// a room, and a finished race's values persist until the player re-arms
/// readiness for the next one.
#[derive(Debug, Clone)]
pub struct Player {
    /// The player's unique name.
    pub name: PlayerName,

    /// The connection this player is reachable on.
    pub conn: ConnectionId,

    /// The room the player currently occupies, if any. Kept in lockstep
    /// with that room's member list — the two must never disagree.
    pub active_room: Option<RoomName>,

    /// Whether the player has signalled readiness for the next race.
    pub is_ready: bool,

    /// Last acknowledged character position in the race text.
    pub progress_index: usize,

    /// Elapsed milliseconds from race start to finish; 0 while unfinished.
    pub finish_time_ms: u64,
}

impl Player {
    /// Creates a fresh player with no room and a blank race record.
    pub fn new(name: PlayerName, conn: ConnectionId) -> Self {
        Self {
            name,
            conn,
            active_room: None,
            is_ready: false,
            progress_index: 0,
            finish_time_ms: 0,
        }
    }

    /// Zeroes progress and finish time — a fresh race record.
    pub fn reset_race_record(&mut self) {
        self.progress_index = 0;
        self.finish_time_ms = 0;
    }

    /// Returns `true` if the player finished the current race.
    pub fn has_finished(&self) -> bool {
        self.finish_time_ms > 0
    }

    /// The room-facing view of this player.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            name: self.name.clone(),
            is_ready: self.is_ready,
        }
    }
}
