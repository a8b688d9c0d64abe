//! The room lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The phase a room is in.
///
/// Stored explicitly on the room rather than inferred from flags or live
/// timers, so a missing timer or stale availability flag is never
/// ambiguous. The cycle is:
///
/// ```text
/// Open ──(all members ready)──→ Countdown ──(pre-race timer expires)──→ Racing
///  ↑                                                                      │
///  └────────────(race concludes: timer expiry or all finished)────────────┘
/// ```
///
/// - **Open**: accepting joins; members may toggle readiness.
/// - **Countdown**: every member was ready; the pre-race timer is running.
/// - **Racing**: the race timer is running; members submit progress.
///
/// A room only regresses toward `Open` through race conclusion — never
/// through membership changes alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Open,
    Countdown,
    Racing,
}

impl RoomPhase {
    /// Returns `true` if the readiness gate may fire from this phase.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if a countdown or race is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Countdown | Self::Racing)
    }

    /// The phase the room enters when its current timer expires.
    ///
    /// Returns `None` for `Open`, which has no timer.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Open => None,
            Self::Countdown => Some(Self::Racing),
            Self::Racing => Some(Self::Open),
        }
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Countdown => write!(f, "Countdown"),
            Self::Racing => write!(f, "Racing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_phase_next_follows_cycle() {
        assert_eq!(RoomPhase::Open.next(), None);
        assert_eq!(RoomPhase::Countdown.next(), Some(RoomPhase::Racing));
        assert_eq!(RoomPhase::Racing.next(), Some(RoomPhase::Open));
    }

    #[test]
    fn test_room_phase_is_open() {
        assert!(RoomPhase::Open.is_open());
        assert!(!RoomPhase::Countdown.is_open());
        assert!(!RoomPhase::Racing.is_open());
    }

    #[test]
    fn test_room_phase_is_active() {
        assert!(!RoomPhase::Open.is_active());
        assert!(RoomPhase::Countdown.is_active());
        assert!(RoomPhase::Racing.is_active());
    }

    #[test]
    fn test_room_phase_display() {
        assert_eq!(RoomPhase::Open.to_string(), "Open");
        assert_eq!(RoomPhase::Racing.to_string(), "Racing");
    }
}
