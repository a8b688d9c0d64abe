//! Unified error type for the Keysprint server.

use keysprint_protocol::ProtocolError;
use keysprint_room::RoomError;
use keysprint_session::RegistryError;
use keysprint_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `keysprint` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum KeysprintError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (identity conflicts).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A room-level error (name taken, not found, full).
    #[error(transparent)]
    Room(#[from] RoomError),
}
