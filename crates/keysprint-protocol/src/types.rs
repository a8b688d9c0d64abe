//! Event types for the Keysprint wire format.
//!
//! Both event enums are internally tagged (`#[serde(tag = "type")]`) so a
//! browser client can switch on a single `type` field:
//! `{ "type": "JoinRoom", "room": "quick-brown" }`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's unique, client-chosen name.
///
/// Names are the stable key for a connection's whole life: a second
/// connection under a taken name is refused. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(pub String);

impl PlayerName {
    /// Borrows the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A room's unique, client-chosen name (first-come-first-served).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(pub String);

impl RoomName {
    /// Borrows the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Room views
// ---------------------------------------------------------------------------

/// A member as seen by other clients in the same room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// The member's name.
    pub name: PlayerName,
    /// Whether the member has signalled readiness.
    pub is_ready: bool,
}

/// Full room state, sent to a client that just created or joined the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// The room's name.
    pub name: RoomName,
    /// Members in join order.
    pub members: Vec<PlayerView>,
    /// Whether the room currently accepts joins.
    pub available_to_join: bool,
}

/// A directory entry: what every client sees in the room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// The room's name.
    pub name: RoomName,
    /// Current member count.
    pub members: usize,
    /// Whether the room currently accepts joins. Clients hide or grey
    /// out rooms where this is `false`.
    pub available_to_join: bool,
}

// ---------------------------------------------------------------------------
// Client → server events
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
///
/// `Hello` must be the first event on a fresh connection; everything else
/// is rejected until the player is registered. Disconnection is not an
/// event — it is the transport-level close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// "This is who I am." First event on every connection.
    Hello { username: PlayerName },

    /// Create a room under an unused name and join it as first member.
    CreateRoom { room: RoomName },

    /// Join an existing room.
    JoinRoom { room: RoomName },

    /// Flip readiness. Arming readiness starts a fresh race record.
    ToggleReady { room: RoomName },

    /// Force readiness off and zero the player's progress.
    SetNotReady { room: RoomName },

    /// Leave the room.
    LeaveRoom { room: RoomName },

    /// "I correctly typed up to this character position."
    SubmitProgress { index: usize },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Events the server sends to one client, a room, or everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    // -- Request rejections (sent to the requester only) --
    /// The chosen username is already connected.
    IdentityConflict { username: PlayerName },
    /// The chosen room name is already taken.
    RoomExists { room: RoomName },
    /// The named room does not exist.
    RoomNotFound { room: RoomName },
    /// The named room is at capacity.
    RoomFull { room: RoomName },

    // -- Room membership --
    /// Creation confirmed; the creator is the sole member.
    RoomCreated { room: RoomSnapshot },
    /// Join confirmed; full room state for the joiner.
    RoomJoined { room: RoomSnapshot },
    /// Another player entered the room.
    MemberJoined { player: PlayerView },
    /// A player left the room.
    MemberLeft { player: PlayerName },
    /// A room's member count changed (broadcast outside the room too).
    MemberCountChanged { room: RoomName, members: usize },

    // -- Readiness and race lifecycle --
    /// A member's readiness flipped.
    ReadyChanged { player: PlayerName, is_ready: bool },
    /// All members ready: the pre-race countdown began with this text.
    CountdownStarted { seconds: u32, text_index: usize },
    /// Pre-race countdown, seconds remaining.
    CountdownTick { seconds: u32 },
    /// The pre-race countdown expired; typing counts from now.
    RaceStarted,
    /// Race clock, seconds remaining.
    RaceTick { seconds: u32 },
    /// A player's typing progress, as a 0–100 percentage. Global by
    /// design: players outside the room see standings too.
    ProgressChanged { player: PlayerName, percent: u8 },
    /// The race concluded; placements are best-first.
    RaceOver {
        room: RoomName,
        placements: Vec<PlayerName>,
    },

    // -- Directory --
    /// The room directory changed.
    DirectoryUpdated { rooms: Vec<RoomSummary> },
}
