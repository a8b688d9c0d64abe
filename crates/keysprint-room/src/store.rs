//! Room store: the keyed collection of live rooms.

use std::collections::HashMap;

use keysprint_protocol::{PlayerName, RoomName, RoomSummary};

use crate::{Room, RoomError};

/// All live rooms, keyed by name.
///
/// The store holds the collection and nothing more — membership mutation
/// and phase transitions go through the orchestrator, which owns this
/// store exclusively.
pub struct RoomStore {
    rooms: HashMap<RoomName, Room>,
}

impl RoomStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Creates a room under an unused name with its first member.
    ///
    /// # Errors
    /// Returns [`RoomError::RoomExists`] if the name is taken.
    pub fn create(
        &mut self,
        name: RoomName,
        capacity: usize,
        first_member: PlayerName,
    ) -> Result<&Room, RoomError> {
        if self.rooms.contains_key(&name) {
            return Err(RoomError::RoomExists(name));
        }
        tracing::info!(room = %name, "room created");
        Ok(self
            .rooms
            .entry(name.clone())
            .or_insert_with(|| Room::new(name, capacity, first_member)))
    }

    /// Verifies a room can accept another member right now.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] if no such room exists, or
    /// [`RoomError::RoomFull`] if membership is at capacity.
    pub fn check_joinable(&self, name: &RoomName) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get(name)
            .ok_or_else(|| RoomError::NotFound(name.clone()))?;
        if room.is_full() {
            return Err(RoomError::RoomFull(name.clone()));
        }
        Ok(())
    }

    /// Looks up a room by name.
    pub fn get(&self, name: &RoomName) -> Option<&Room> {
        self.rooms.get(name)
    }

    /// Looks up a room mutably.
    pub fn get_mut(&mut self, name: &RoomName) -> Option<&mut Room> {
        self.rooms.get_mut(name)
    }

    /// Removes a room, returning it if it existed.
    pub fn delete(&mut self, name: &RoomName) -> Option<Room> {
        let room = self.rooms.remove(name);
        if room.is_some() {
            tracing::info!(room = %name, "room removed");
        }
        room
    }

    /// The current room directory, sorted by name for a stable listing.
    pub fn directory(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self.rooms.values().map(Room::summary).collect();
        rooms.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        rooms
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if no rooms exist.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> RoomName {
        RoomName::from(s)
    }

    fn player(s: &str) -> PlayerName {
        PlayerName::from(s)
    }

    #[test]
    fn test_create_room_with_first_member() {
        let mut store = RoomStore::new();

        let room = store.create(name("r1"), 4, player("alice")).unwrap();

        assert_eq!(room.members, vec![player("alice")]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_taken_name_returns_room_exists() {
        let mut store = RoomStore::new();
        store.create(name("r1"), 4, player("alice")).unwrap();

        let result = store.create(name("r1"), 4, player("bob"));

        assert!(matches!(
            result,
            Err(RoomError::RoomExists(n)) if n == name("r1")
        ));
        // The original room is untouched.
        assert_eq!(store.get(&name("r1")).unwrap().members, vec![player("alice")]);
    }

    #[test]
    fn test_check_joinable_unknown_room_is_not_found() {
        let store = RoomStore::new();

        assert!(matches!(
            store.check_joinable(&name("nope")),
            Err(RoomError::NotFound(n)) if n == name("nope")
        ));
    }

    #[test]
    fn test_check_joinable_rejects_full_room() {
        let mut store = RoomStore::new();
        store.create(name("r1"), 1, player("alice")).unwrap();

        assert!(matches!(
            store.check_joinable(&name("r1")),
            Err(RoomError::RoomFull(n)) if n == name("r1")
        ));
    }

    #[test]
    fn test_check_joinable_accepts_open_room() {
        let mut store = RoomStore::new();
        store.create(name("r1"), 4, player("alice")).unwrap();

        assert!(store.check_joinable(&name("r1")).is_ok());
    }

    #[test]
    fn test_get_unknown_room_is_none() {
        let store = RoomStore::new();
        assert!(store.get(&name("nope")).is_none());
    }

    #[test]
    fn test_delete_returns_removed_room() {
        let mut store = RoomStore::new();
        store.create(name("r1"), 4, player("alice")).unwrap();

        let removed = store.delete(&name("r1"));

        assert!(removed.is_some());
        assert!(store.is_empty());
        assert!(store.delete(&name("r1")).is_none());
    }

    #[test]
    fn test_directory_is_sorted_by_name() {
        let mut store = RoomStore::new();
        store.create(name("zebra"), 4, player("a")).unwrap();
        store.create(name("apple"), 4, player("b")).unwrap();

        let dir = store.directory();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir[0].name, name("apple"));
        assert_eq!(dir[1].name, name("zebra"));
    }
}
