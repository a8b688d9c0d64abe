//! Room store and lifecycle state machine for Keysprint.
//!
//! A room is a named lobby that players gather in, signal readiness, and
//! race inside. This crate owns the data: the keyed [`RoomStore`], the
//! [`Room`] record with its ordered member list and availability flag, the
//! explicit [`RoomPhase`] state machine, and the transient [`RaceSession`]
//! that exists only while a countdown or race is in flight.
//!
//! Membership *mutation* (who joins, who leaves, when the phase advances)
//! belongs to the orchestrator — the store only holds the collection.
//!
//! # Key types
//!
//! - [`RoomStore`] — keyed create/get/delete
//! - [`Room`] — members, capacity, availability, phase, race session
//! - [`RoomPhase`] — `Open` → `Countdown` → `Racing` → back to `Open`
//! - [`RoomError`] — creation collisions, unknown rooms, full rooms

mod error;
mod phase;
mod room;
mod store;

pub use error::RoomError;
pub use phase::RoomPhase;
pub use room::{RaceSession, Room};
pub use store::RoomStore;
