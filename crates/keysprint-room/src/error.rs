//! Error types for the room layer.

use keysprint_protocol::RoomName;

/// Errors that can occur during room operations.
///
/// All of these are terminal for the triggering request only: they are
/// reported back to the requester and mutate nothing.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0:?} not found")]
    NotFound(RoomName),

    /// A room with this name already exists.
    #[error("room {0:?} already exists")]
    RoomExists(RoomName),

    /// The room is at capacity.
    #[error("room {0:?} is full")]
    RoomFull(RoomName),
}
