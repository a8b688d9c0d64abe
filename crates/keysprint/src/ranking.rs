//! Finishing-order computation for a concluded race.

use keysprint_protocol::PlayerName;

/// A player's terminal race state, as the ranking sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceResult {
    /// The player's name.
    pub name: PlayerName,
    /// Elapsed milliseconds to finish; 0 means the player never finished.
    pub finish_time_ms: u64,
    /// Last acknowledged character position (used only for non-finishers).
    pub progress_index: usize,
}

impl RaceResult {
    fn finished(&self) -> bool {
        self.finish_time_ms > 0
    }
}

/// Ranks terminal race states best-first.
///
/// Finishers come first, ascending by finish time; players who never
/// finished follow, descending by how far they got. Sorting is stable, so
/// ties keep their input (membership) order. Pure: no clock, no I/O.
pub fn rank(mut results: Vec<RaceResult>) -> Vec<PlayerName> {
    let (mut finishers, mut stragglers): (Vec<_>, Vec<_>) =
        results.drain(..).partition(RaceResult::finished);

    finishers.sort_by_key(|r| r.finish_time_ms);
    stragglers.sort_by_key(|r| std::cmp::Reverse(r.progress_index));

    finishers
        .into_iter()
        .chain(stragglers)
        .map(|r| r.name)
        .collect()
}
