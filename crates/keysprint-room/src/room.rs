//! The room record and its transient race session.

use keysprint_protocol::{PlayerName, RoomName, RoomSummary};
use tokio::time::Instant;

use crate::RoomPhase;

/// The race in flight for one room.
///
/// Not an addressable entity of its own — it exists only as fields hung off
/// the room between "all members ready" and "race concluded". The clock
/// generation is the room's owned timer handle: a clock event whose
/// generation doesn't match this value is stale and must be dropped.
#[derive(Debug, Clone, Copy)]
pub struct RaceSession {
    /// Index of the assigned text in the corpus.
    pub text_index: usize,
    /// Character length of the assigned text.
    pub text_len: usize,
    /// When the countdown was armed; finish times are measured from here.
    /// `tokio::time::Instant` so paused-time tests control elapsed time.
    pub started_at: Instant,
    /// Generation stamp of the timer chain driving this race.
    pub clock_generation: u64,
}

/// A named lobby holding an ordered member list.
#[derive(Debug, Clone)]
pub struct Room {
    /// The room's unique name.
    pub name: RoomName,
    /// Members in join order.
    pub members: Vec<PlayerName>,
    /// Maximum member count.
    pub capacity: usize,
    /// Whether the room accepts joins right now. False at capacity, and
    /// independently forced false while a countdown or race is active.
    pub available_to_join: bool,
    /// Current lifecycle phase.
    pub phase: RoomPhase,
    /// The race in flight, if any.
    pub race: Option<RaceSession>,
}

impl Room {
    /// Creates an `Open` room containing its first member.
    pub fn new(name: RoomName, capacity: usize, first_member: PlayerName) -> Self {
        Self {
            name,
            members: vec![first_member],
            capacity,
            available_to_join: capacity > 1,
            phase: RoomPhase::Open,
            race: None,
        }
    }

    /// Returns `true` if membership is at capacity.
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Returns `true` if the named player is a member.
    pub fn has_member(&self, player: &PlayerName) -> bool {
        self.members.contains(player)
    }

    /// Appends a member. The caller has already checked capacity.
    pub fn add_member(&mut self, player: PlayerName) {
        self.members.push(player);
        if self.is_full() {
            self.available_to_join = false;
        }
    }

    /// Removes a member if present. Returns `true` if somebody was removed.
    pub fn remove_member(&mut self, player: &PlayerName) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != player);
        self.members.len() != before
    }

    /// The directory entry for this room.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            name: self.name.clone(),
            members: self.members.len(),
            available_to_join: self.available_to_join,
        }
    }
}
