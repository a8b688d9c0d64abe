//! Broadcast hub: outbound fan-out scoped by connection and named group.
//!
//! The lobby layer never touches sockets directly. Each connection registers
//! an unbounded outbox sender here, and the hub answers the four delivery
//! questions the lobby asks: one client, everyone, everyone-except-sender,
//! and a named group (a room) with or without an exclusion. Groups model
//! socket.io-style room scoping: membership is explicit and a connection can
//! belong to at most the groups it was joined to.
//!
//! Sends to a receiver that has gone away are silently dropped — a client
//! mid-disconnect is indistinguishable from one that is just slow, and the
//! disconnect path will unregister it shortly.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

use crate::ConnectionId;

/// Fan-out registry for outbound messages of type `M`.
pub struct BroadcastHub<M: Clone> {
    /// Per-connection outbox senders.
    members: HashMap<ConnectionId, mpsc::UnboundedSender<M>>,
    /// Named groups (rooms) for scoped broadcast.
    groups: HashMap<String, HashSet<ConnectionId>>,
}

impl<M: Clone> BroadcastHub<M> {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// Registers a connection's outbox. Replaces any previous sender
    /// under the same id.
    pub fn register(&mut self, id: ConnectionId, sender: mpsc::UnboundedSender<M>) {
        self.members.insert(id, sender);
    }

    /// Removes a connection and purges it from every group.
    pub fn unregister(&mut self, id: ConnectionId) {
        self.members.remove(&id);
        self.groups.retain(|_, members| {
            members.remove(&id);
            !members.is_empty()
        });
    }

    /// Adds a connection to a named group, creating the group if needed.
    pub fn join_group(&mut self, group: &str, id: ConnectionId) {
        self.groups.entry(group.to_string()).or_default().insert(id);
    }

    /// Removes a connection from a named group. Empty groups are dropped.
    pub fn leave_group(&mut self, group: &str, id: ConnectionId) {
        if let Some(members) = self.groups.get_mut(group) {
            members.remove(&id);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    /// Drops a whole group (its members stay registered).
    pub fn remove_group(&mut self, group: &str) {
        self.groups.remove(group);
    }

    /// Sends to a single connection.
    pub fn send_to(&self, id: ConnectionId, msg: M) {
        if let Some(sender) = self.members.get(&id) {
            let _ = sender.send(msg);
        }
    }

    /// Sends to every registered connection.
    pub fn broadcast(&self, msg: M) {
        for sender in self.members.values() {
            let _ = sender.send(msg.clone());
        }
    }

    /// Sends to every registered connection except `excluded`.
    pub fn broadcast_except(&self, excluded: ConnectionId, msg: M) {
        for (id, sender) in &self.members {
            if *id != excluded {
                let _ = sender.send(msg.clone());
            }
        }
    }

    /// Sends to every member of a group. Unknown groups are a no-op.
    pub fn send_group(&self, group: &str, msg: M) {
        let Some(members) = self.groups.get(group) else {
            return;
        };
        for id in members {
            self.send_to(*id, msg.clone());
        }
    }

    /// Sends to every member of a group except `excluded`.
    pub fn send_group_except(&self, group: &str, excluded: ConnectionId, msg: M) {
        let Some(members) = self.groups.get(group) else {
            return;
        };
        for id in members {
            if *id != excluded {
                self.send_to(*id, msg.clone());
            }
        }
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<M: Clone> Default for BroadcastHub<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// Registers a fresh member and returns its receiver.
    fn add_member(hub: &mut BroadcastHub<&'static str>, id: u64) -> mpsc::UnboundedReceiver<&'static str> {
        let (tx, rx) = mpsc::unbounded_channel();
        hub.register(cid(id), tx);
        rx
    }

    #[test]
    fn test_send_to_reaches_only_target() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = add_member(&mut hub, 1);
        let mut rx2 = add_member(&mut hub, 2);

        hub.send_to(cid(1), "hi");

        assert_eq!(rx1.try_recv(), Ok("hi"));
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = add_member(&mut hub, 1);
        let mut rx2 = add_member(&mut hub, 2);

        hub.broadcast("all");

        assert_eq!(rx1.try_recv(), Ok("all"));
        assert_eq!(rx2.try_recv(), Ok("all"));
    }

    #[test]
    fn test_broadcast_except_skips_sender() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = add_member(&mut hub, 1);
        let mut rx2 = add_member(&mut hub, 2);

        hub.broadcast_except(cid(1), "others");

        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv(), Ok("others"));
    }

    #[test]
    fn test_send_group_scopes_to_members() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = add_member(&mut hub, 1);
        let mut rx2 = add_member(&mut hub, 2);
        let mut rx3 = add_member(&mut hub, 3);

        hub.join_group("room-a", cid(1));
        hub.join_group("room-a", cid(2));

        hub.send_group("room-a", "room msg");

        assert_eq!(rx1.try_recv(), Ok("room msg"));
        assert_eq!(rx2.try_recv(), Ok("room msg"));
        assert!(rx3.try_recv().is_err(), "non-member must not receive");
    }

    #[test]
    fn test_send_group_except_skips_excluded_member() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = add_member(&mut hub, 1);
        let mut rx2 = add_member(&mut hub, 2);

        hub.join_group("room-a", cid(1));
        hub.join_group("room-a", cid(2));

        hub.send_group_except("room-a", cid(1), "to others");

        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv(), Ok("to others"));
    }

    #[test]
    fn test_send_group_unknown_group_is_noop() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = add_member(&mut hub, 1);

        hub.send_group("nope", "lost");

        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn test_leave_group_stops_group_delivery() {
        let mut hub = BroadcastHub::new();
        let mut rx1 = add_member(&mut hub, 1);
        hub.join_group("room-a", cid(1));

        hub.leave_group("room-a", cid(1));
        hub.send_group("room-a", "gone");

        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn test_unregister_purges_group_membership() {
        let mut hub = BroadcastHub::new();
        let _rx1 = add_member(&mut hub, 1);
        let mut rx2 = add_member(&mut hub, 2);
        hub.join_group("room-a", cid(1));
        hub.join_group("room-a", cid(2));

        hub.unregister(cid(1));

        hub.send_group("room-a", "still here");
        assert_eq!(rx2.try_recv(), Ok("still here"));
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn test_send_to_dropped_receiver_does_not_panic() {
        let mut hub = BroadcastHub::new();
        let rx = add_member(&mut hub, 1);
        drop(rx);

        hub.send_to(cid(1), "into the void");
        hub.broadcast("also fine");
    }
}
