//! Wire protocol for Keysprint.
//!
//! This crate defines the event vocabulary that clients and the server
//! exchange:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`PlayerName`],
//!   [`RoomName`], room snapshots) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! The protocol layer knows nothing about connections, rooms, or timers —
//! it only describes messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, PlayerName, PlayerView, RoomName, RoomSnapshot, RoomSummary, ServerEvent,
};
