//! Two-phase race countdown timers for Keysprint.
//!
//! Each race runs through two sequential one-second-granularity countdowns:
//! a pre-race countdown ("get ready") and then, the instant it expires, the
//! race-duration countdown. The clock does not own any game state — it
//! emits [`ClockEvent`]s into an mpsc channel, and the consumer looks the
//! room up fresh on every event.
//!
//! # Cancellation
//!
//! Every started chain gets a monotonically increasing *generation* stamp
//! carried on each of its events. [`GameClock::cancel`] aborts the driving
//! task, but an event already sitting in the channel cannot be recalled, so
//! the consumer must also drop events whose key no longer resolves or whose
//! generation doesn't match the one it recorded. That combination makes a
//! deleted room's dangling timer a guaranteed no-op.
//!
//! # Integration
//!
//! The consumer sits in a `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* client events */ }
//!         Some(event) = clock_rx.recv() => { /* ticks and expirations */ }
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Durations for the two countdown phases.
#[derive(Debug, Clone, Copy)]
pub struct ClockConfig {
    /// Pre-race countdown length in seconds.
    pub countdown_secs: u32,
    /// Race duration in seconds.
    pub race_secs: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 10,
            race_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What a clock event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEventKind {
    /// Pre-race countdown: seconds remaining (counts `n-1` down to `0`).
    CountdownTick(u32),
    /// The pre-race countdown expired; the race clock starts now.
    RaceStarted,
    /// Race countdown: seconds remaining. The first carries the full race
    /// duration and fires together with [`ClockEventKind::RaceStarted`].
    RaceTick(u32),
    /// The race countdown expired.
    RaceFinished,
}

/// One emission from a timer chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockEvent<K> {
    /// The key (room) this chain was started for.
    pub key: K,
    /// Generation stamp of the chain; consumers drop stale generations.
    pub generation: u64,
    /// What happened.
    pub kind: ClockEventKind,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

struct TimerChain {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for TimerChain {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owns the per-key timer chains and hands their events to one channel.
///
/// Generic over the key so the clock stays ignorant of what a "room" is;
/// it never dereferences the key, only echoes it back on events.
pub struct GameClock<K> {
    events: mpsc::UnboundedSender<ClockEvent<K>>,
    chains: HashMap<K, TimerChain>,
    next_generation: u64,
}

impl<K> GameClock<K>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Creates a clock that emits into `events`.
    pub fn new(events: mpsc::UnboundedSender<ClockEvent<K>>) -> Self {
        Self {
            events,
            chains: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Starts a countdown-then-race chain for `key`, replacing (and
    /// cancelling) any chain already running under that key.
    ///
    /// Returns the chain's generation stamp; the caller records it on the
    /// room and validates it against every incoming event.
    pub fn start(&mut self, key: K, config: ClockConfig) -> u64 {
        self.cancel(&key);
        self.next_generation += 1;
        let generation = self.next_generation;

        let tx = self.events.clone();
        let chain_key = key.clone();
        let task = tokio::spawn(run_chain(chain_key, generation, config, tx));

        self.chains.insert(key, TimerChain { generation, task });
        debug!(generation, "timer chain started");
        generation
    }

    /// Tears down the chain for `key`, if one is tracked. Ticks already in
    /// the channel are the consumer's generation check to drop.
    pub fn cancel(&mut self, key: &K) {
        if let Some(chain) = self.chains.remove(key) {
            debug!(generation = chain.generation, "timer chain cancelled");
            // Drop aborts the task.
        }
    }

    /// Returns the generation currently tracked for `key`, if any.
    pub fn generation(&self, key: &K) -> Option<u64> {
        self.chains.get(key).map(|c| c.generation)
    }

    /// Number of tracked timer chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` if no chains are tracked.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Drives both countdowns for one chain, one explicit re-arm per second.
async fn run_chain<K: Clone>(
    key: K,
    generation: u64,
    config: ClockConfig,
    tx: mpsc::UnboundedSender<ClockEvent<K>>,
) {
    let emit = |kind: ClockEventKind| {
        trace!(generation, ?kind, "clock event");
        tx.send(ClockEvent {
            key: key.clone(),
            generation,
            kind,
        })
        .is_ok()
    };

    // Pre-race countdown: n-1, n-2, …, 0, one per second.
    let mut remaining = config.countdown_secs;
    while remaining > 0 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        remaining -= 1;
        if !emit(ClockEventKind::CountdownTick(remaining)) {
            return;
        }
    }

    // The race clock starts the instant the pre-race clock ends.
    if !emit(ClockEventKind::RaceStarted) {
        return;
    }
    if !emit(ClockEventKind::RaceTick(config.race_secs)) {
        return;
    }

    let mut remaining = config.race_secs;
    while remaining > 0 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        remaining -= 1;
        if !emit(ClockEventKind::RaceTick(remaining)) {
            return;
        }
    }

    emit(ClockEventKind::RaceFinished);
}
