//! The lobby orchestrator: one task that owns every piece of mutable state.
//!
//! Connection handlers never touch the registry, the room store, or the
//! clock directly — they send [`Command`]s over an mpsc channel and the
//! orchestrator applies them one at a time. Clock events arrive on a second
//! channel drained by the same loop, so every mutation in the server is
//! serialized through this task and no state needs a lock.
//!
//! Clock events are addressed by room *name*, not by reference: the
//! orchestrator looks the room up fresh on every event and drops events
//! whose room is gone or whose generation stamp is stale. A room deleted
//! mid-countdown therefore never sees its dangling timer fire.

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use keysprint_clock::{ClockEvent, ClockEventKind, GameClock};
use keysprint_protocol::{
    ClientEvent, PlayerName, RoomName, RoomSnapshot, ServerEvent,
};
use keysprint_room::{RaceSession, RoomError, RoomPhase, RoomStore};
use keysprint_session::{PlayerRegistry, RegistryError};
use keysprint_transport::{BroadcastHub, ConnectionId};

use crate::config::LobbyConfig;
use crate::corpus::TextCorpus;
use crate::ranking::{RaceResult, rank};

/// What a connection handler asks the orchestrator to do.
pub enum Command {
    /// A fresh connection introduced itself. On success the outbox is
    /// registered for fan-out; on an identity conflict the rejection is
    /// sent through the outbox and the handler should close.
    Hello {
        conn: ConnectionId,
        username: PlayerName,
        outbox: mpsc::UnboundedSender<ServerEvent>,
        reply: oneshot::Sender<Result<(), RegistryError>>,
    },
    /// A registered player sent an event.
    Event {
        username: PlayerName,
        event: ClientEvent,
    },
    /// A registered player's connection ended.
    Disconnect { username: PlayerName },
}

/// The lobby state machine.
pub struct Orchestrator {
    config: LobbyConfig,
    corpus: TextCorpus,
    players: PlayerRegistry,
    rooms: RoomStore,
    hub: BroadcastHub<ServerEvent>,
    clock: GameClock<RoomName>,
    clock_rx: mpsc::UnboundedReceiver<ClockEvent<RoomName>>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Orchestrator {
    /// Creates the orchestrator and the command sender handlers use to
    /// reach it.
    pub fn new(config: LobbyConfig) -> (Self, mpsc::UnboundedSender<Command>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (clock_tx, clock_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            config,
            corpus: TextCorpus,
            players: PlayerRegistry::new(),
            rooms: RoomStore::new(),
            hub: BroadcastHub::new(),
            clock: GameClock::new(clock_tx),
            clock_rx,
            commands: cmd_rx,
        };
        (orchestrator, cmd_tx)
    }

    /// The connected-player registry (read-only).
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// The room store (read-only).
    pub fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    /// Runs the event loop until every command sender is dropped.
    pub async fn run(mut self) {
        info!("orchestrator running");
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(event) = self.clock_rx.recv() => self.handle_clock_event(event),
            }
        }
        info!("orchestrator stopped");
    }

    /// Waits for the next clock event and applies it.
    ///
    /// The run loop does this via `select!`; tests drive the orchestrator
    /// directly and use this to step timers one event at a time.
    pub async fn step_clock(&mut self) {
        if let Some(event) = self.clock_rx.recv().await {
            self.handle_clock_event(event);
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Hello {
                conn,
                username,
                outbox,
                reply,
            } => {
                let result = self.handle_hello(conn, username, outbox);
                let _ = reply.send(result);
            }
            Command::Event { username, event } => self.handle_event(&username, event),
            Command::Disconnect { username } => self.handle_disconnect(&username),
        }
    }

    /// Registers a connection under a username and sends it the current
    /// room directory. On a name collision the rejection goes through the
    /// offered outbox and nothing is registered.
    pub fn handle_hello(
        &mut self,
        conn: ConnectionId,
        username: PlayerName,
        outbox: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<(), RegistryError> {
        match self.players.create(username.clone(), conn) {
            Ok(_) => {
                self.hub.register(conn, outbox);
                self.hub.send_to(
                    conn,
                    ServerEvent::DirectoryUpdated {
                        rooms: self.rooms.directory(),
                    },
                );
                Ok(())
            }
            Err(e) => {
                let _ = outbox.send(ServerEvent::IdentityConflict { username });
                Err(e)
            }
        }
    }

    /// Applies one client event from a registered player.
    pub fn handle_event(&mut self, username: &PlayerName, event: ClientEvent) {
        if !self.players.exists(username) {
            debug!(player = %username, "event from unknown player dropped");
            return;
        }
        match event {
            ClientEvent::Hello { .. } => {
                debug!(player = %username, "duplicate Hello ignored");
            }
            ClientEvent::CreateRoom { room } => self.create_room(username, room),
            ClientEvent::JoinRoom { room } => self.join_room(username, room),
            ClientEvent::ToggleReady { room } => self.toggle_ready(username, &room),
            ClientEvent::SetNotReady { room } => self.set_not_ready(username, &room),
            ClientEvent::LeaveRoom { room } => self.leave_room(username, &room),
            ClientEvent::SubmitProgress { index } => self.submit_progress(username, index),
        }
    }

    /// Tears down everything a closed connection owned: room membership,
    /// the hub registration, and the registry entry.
    pub fn handle_disconnect(&mut self, username: &PlayerName) {
        let Some(conn) = self.players.get(username).map(|p| p.conn) else {
            return;
        };
        self.depart_current_room(username);
        self.hub.unregister(conn);
        self.players.delete(username);
    }

    // -- Room membership ---------------------------------------------------

    fn create_room(&mut self, username: &PlayerName, name: RoomName) {
        let Some(conn) = self.players.get(username).map(|p| p.conn) else {
            return;
        };
        if self.rooms.get(&name).is_some() {
            self.hub
                .send_to(conn, rejection_event(RoomError::RoomExists(name)));
            return;
        }

        self.depart_current_room(username);

        if let Err(e) = self
            .rooms
            .create(name.clone(), self.config.room_capacity, username.clone())
        {
            warn!(error = %e, "room creation raced itself");
            return;
        }
        if let Some(player) = self.players.get_mut(username) {
            player.active_room = Some(name.clone());
        }
        self.hub.join_group(name.as_str(), conn);

        if let Some(snapshot) = self.room_snapshot(&name) {
            self.hub.send_to(conn, ServerEvent::RoomCreated { room: snapshot });
        }
        self.broadcast_directory();
    }

    fn join_room(&mut self, username: &PlayerName, name: RoomName) {
        let Some(player) = self.players.get(username) else {
            return;
        };
        let conn = player.conn;
        if player.active_room.as_ref() == Some(&name) {
            debug!(player = %username, room = %name, "already a member");
            return;
        }
        if let Err(e) = self.rooms.check_joinable(&name) {
            self.hub.send_to(conn, rejection_event(e));
            return;
        }

        self.depart_current_room(username);

        let Some(room) = self.rooms.get_mut(&name) else {
            return;
        };
        room.add_member(username.clone());
        let members = room.members.len();
        if let Some(player) = self.players.get_mut(username) {
            player.active_room = Some(name.clone());
        }
        self.hub.join_group(name.as_str(), conn);
        info!(player = %username, room = %name, "joined room");

        if let Some(view) = self.players.get(username).map(|p| p.view()) {
            self.hub
                .send_group_except(name.as_str(), conn, ServerEvent::MemberJoined { player: view });
        }
        if let Some(snapshot) = self.room_snapshot(&name) {
            self.hub.send_to(conn, ServerEvent::RoomJoined { room: snapshot });
        }
        self.hub.broadcast(ServerEvent::MemberCountChanged {
            room: name.clone(),
            members,
        });
        self.broadcast_directory();
    }

    fn leave_room(&mut self, username: &PlayerName, room: &RoomName) {
        let in_room = self
            .players
            .get(username)
            .is_some_and(|p| p.active_room.as_ref() == Some(room));
        if !in_room {
            debug!(player = %username, room = %room, "leave for a room the player is not in");
            return;
        }
        self.depart_current_room(username);
    }

    /// The single leave path: removes the player from whatever room they
    /// occupy, deleting the room if it empties and re-evaluating the
    /// remaining members otherwise. No-op for roomless players.
    fn depart_current_room(&mut self, username: &PlayerName) {
        let Some((conn, room_name)) = self.players.get_mut(username).and_then(|p| {
            let room = p.active_room.take()?;
            p.is_ready = false;
            Some((p.conn, room))
        }) else {
            return;
        };
        self.hub.leave_group(room_name.as_str(), conn);

        let Some(room) = self.rooms.get_mut(&room_name) else {
            warn!(player = %username, room = %room_name, "active room missing from store");
            return;
        };
        room.remove_member(username);
        info!(player = %username, room = %room_name, "left room");

        if room.members.is_empty() {
            self.rooms.delete(&room_name);
            self.hub.remove_group(room_name.as_str());
            self.clock.cancel(&room_name);
            self.broadcast_directory();
            return;
        }

        // Headroom opened up; only an Open room becomes joinable again —
        // rooms hidden because of an active race stay hidden.
        let mut directory_changed = false;
        if room.phase.is_open() && !room.is_full() && !room.available_to_join {
            room.available_to_join = true;
            directory_changed = true;
        }
        let members = room.members.len();
        let phase = room.phase;

        self.hub.send_group(
            room_name.as_str(),
            ServerEvent::MemberLeft {
                player: username.clone(),
            },
        );
        self.hub.broadcast(ServerEvent::MemberCountChanged {
            room: room_name.clone(),
            members,
        });
        if directory_changed {
            self.broadcast_directory();
        }

        // The departure may leave the remainder unanimously ready. A
        // running race is never cut short by a membership change; it ends
        // only when the clock expires or a progress event finishes the
        // last racer.
        if phase == RoomPhase::Open {
            self.evaluate_readiness_gate(&room_name);
        }
    }

    // -- Readiness and the countdown gate ----------------------------------

    fn toggle_ready(&mut self, username: &PlayerName, room: &RoomName) {
        let Some(player) = self.players.get_mut(username) else {
            return;
        };
        if player.active_room.as_ref() != Some(room) {
            debug!(player = %username, room = %room, "ready toggle outside own room");
            return;
        }
        player.is_ready = !player.is_ready;
        if player.is_ready {
            // Re-arming readiness starts a fresh race record.
            player.reset_race_record();
        }
        let is_ready = player.is_ready;

        self.hub.send_group(
            room.as_str(),
            ServerEvent::ReadyChanged {
                player: username.clone(),
                is_ready,
            },
        );
        self.evaluate_readiness_gate(room);
    }

    fn set_not_ready(&mut self, username: &PlayerName, room: &RoomName) {
        let Some(player) = self.players.get_mut(username) else {
            return;
        };
        if player.active_room.as_ref() != Some(room) {
            return;
        }
        player.is_ready = false;
        player.progress_index = 0;

        self.hub.send_group(
            room.as_str(),
            ServerEvent::ReadyChanged {
                player: username.clone(),
                is_ready: false,
            },
        );
        // Progress is global so players outside the room see standings.
        self.hub.broadcast(ServerEvent::ProgressChanged {
            player: username.clone(),
            percent: 0,
        });
    }

    /// Starts the countdown iff the room is `Open`, non-empty, and every
    /// member is ready. Idempotent when nothing changed.
    fn evaluate_readiness_gate(&mut self, room_name: &RoomName) {
        let Some(room) = self.rooms.get(room_name) else {
            return;
        };
        if !room.phase.is_open() || room.members.is_empty() {
            return;
        }
        let all_ready = room
            .members
            .iter()
            .all(|m| self.players.get(m).is_some_and(|p| p.is_ready));
        if all_ready {
            self.start_countdown(room_name);
        }
    }

    fn start_countdown(&mut self, room_name: &RoomName) {
        let text_index = self.corpus.pick_index();
        let Some(text_len) = self.corpus.length(text_index) else {
            return;
        };
        let generation = self.clock.start(room_name.clone(), self.config.clock);

        let Some(room) = self.rooms.get_mut(room_name) else {
            return;
        };
        room.phase = RoomPhase::Countdown;
        room.available_to_join = false;
        room.race = Some(RaceSession {
            text_index,
            text_len,
            started_at: Instant::now(),
            clock_generation: generation,
        });
        info!(room = %room_name, text_index, "all ready, countdown started");

        self.hub.send_group(
            room_name.as_str(),
            ServerEvent::CountdownStarted {
                seconds: self.config.clock.countdown_secs,
                text_index,
            },
        );
        self.broadcast_directory();
    }

    // -- Racing ------------------------------------------------------------

    fn submit_progress(&mut self, username: &PlayerName, index: usize) {
        let Some(room_name) = self
            .players
            .get(username)
            .and_then(|p| p.active_room.clone())
        else {
            return;
        };
        let race = match self.rooms.get(&room_name) {
            Some(room) if room.phase == RoomPhase::Racing => room.race,
            _ => {
                debug!(player = %username, "progress outside a running race");
                return;
            }
        };
        let Some(race) = race else {
            return;
        };

        // Indices come straight off the wire; saturate rather than trust.
        let finished = index.saturating_add(1) >= race.text_len;
        let percent = progress_percent(index, race.text_len);

        let Some(player) = self.players.get_mut(username) else {
            return;
        };
        player.progress_index = index;
        if finished && !player.has_finished() {
            // max(1): zero would read as "never finished".
            player.finish_time_ms = (race.started_at.elapsed().as_millis() as u64).max(1);
            info!(player = %username, ms = player.finish_time_ms, "finished text");
        }

        self.hub.broadcast(ServerEvent::ProgressChanged {
            player: username.clone(),
            percent,
        });

        if finished && self.all_members_finished(&room_name) {
            self.conclude_race(&room_name);
        }
    }

    fn all_members_finished(&self, room_name: &RoomName) -> bool {
        let Some(room) = self.rooms.get(room_name) else {
            return false;
        };
        !room.members.is_empty()
            && room
                .members
                .iter()
                .all(|m| self.players.get(m).is_some_and(|p| p.has_finished()))
    }

    /// Concludes the race: ranks the members, announces the placements,
    /// and reopens the room. Shared by timer expiry and early finish.
    fn conclude_race(&mut self, room_name: &RoomName) {
        let Some(room) = self.rooms.get_mut(room_name) else {
            return;
        };
        let results: Vec<RaceResult> = room
            .members
            .iter()
            .filter_map(|m| self.players.get(m))
            .map(|p| RaceResult {
                name: p.name.clone(),
                finish_time_ms: p.finish_time_ms,
                progress_index: p.progress_index,
            })
            .collect();

        room.phase = RoomPhase::Open;
        room.race = None;
        room.available_to_join = true;

        self.clock.cancel(room_name);
        let placements = rank(results);
        info!(room = %room_name, winner = placements.first().map(|p| p.as_str()), "race over");

        self.hub.send_group(
            room_name.as_str(),
            ServerEvent::RaceOver {
                room: room_name.clone(),
                placements,
            },
        );
    }

    // -- Clock events ------------------------------------------------------

    /// Applies one clock event, dropping it if the room is gone or the
    /// generation stamp no longer matches the room's race session.
    pub fn handle_clock_event(&mut self, event: ClockEvent<RoomName>) {
        let ClockEvent {
            key: room_name,
            generation,
            kind,
        } = event;

        let current = self.rooms.get(&room_name).and_then(|r| r.race);
        if current.is_none_or(|race| race.clock_generation != generation) {
            debug!(room = %room_name, generation, "stale clock event dropped");
            return;
        }

        match kind {
            ClockEventKind::CountdownTick(seconds) => {
                self.hub
                    .send_group(room_name.as_str(), ServerEvent::CountdownTick { seconds });
            }
            ClockEventKind::RaceStarted => {
                if let Some(room) = self.rooms.get_mut(&room_name) {
                    room.phase = RoomPhase::Racing;
                }
                self.hub.send_group(room_name.as_str(), ServerEvent::RaceStarted);
            }
            ClockEventKind::RaceTick(seconds) => {
                self.hub
                    .send_group(room_name.as_str(), ServerEvent::RaceTick { seconds });
            }
            ClockEventKind::RaceFinished => self.conclude_race(&room_name),
        }
    }

    // -- Helpers -----------------------------------------------------------

    fn room_snapshot(&self, name: &RoomName) -> Option<RoomSnapshot> {
        let room = self.rooms.get(name)?;
        Some(RoomSnapshot {
            name: room.name.clone(),
            members: room
                .members
                .iter()
                .filter_map(|m| self.players.get(m))
                .map(|p| p.view())
                .collect(),
            available_to_join: room.available_to_join,
        })
    }

    fn broadcast_directory(&self) {
        self.hub.broadcast(ServerEvent::DirectoryUpdated {
            rooms: self.rooms.directory(),
        });
    }
}

/// The wire event telling a client why its room request was refused.
fn rejection_event(err: RoomError) -> ServerEvent {
    match err {
        RoomError::NotFound(room) => ServerEvent::RoomNotFound { room },
        RoomError::RoomExists(room) => ServerEvent::RoomExists { room },
        RoomError::RoomFull(room) => ServerEvent::RoomFull { room },
    }
}

/// Progress as a rounded 0–100 percentage of the text typed, counting the
/// character at `index` as typed.
fn progress_percent(index: usize, text_len: usize) -> u8 {
    if text_len == 0 {
        return 100;
    }
    let pct = (index.saturating_add(1) as f64 * 100.0 / text_len as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent_rounds_to_nearest() {
        // 50 of 101 characters: 49.50…% rounds to 50.
        assert_eq!(progress_percent(49, 101), 50);
        assert_eq!(progress_percent(0, 3), 33);
        assert_eq!(progress_percent(1, 3), 67);
    }

    #[test]
    fn test_progress_percent_final_index_is_hundred() {
        assert_eq!(progress_percent(99, 100), 100);
    }

    #[test]
    fn test_progress_percent_clamps_overshoot() {
        assert_eq!(progress_percent(150, 100), 100);
        assert_eq!(progress_percent(usize::MAX, 100), 100);
    }

    #[test]
    fn test_rejection_event_maps_every_room_error() {
        let room = RoomName::from("r1");
        assert!(matches!(
            rejection_event(RoomError::NotFound(room.clone())),
            ServerEvent::RoomNotFound { .. }
        ));
        assert!(matches!(
            rejection_event(RoomError::RoomExists(room.clone())),
            ServerEvent::RoomExists { .. }
        ));
        assert!(matches!(
            rejection_event(RoomError::RoomFull(room)),
            ServerEvent::RoomFull { .. }
        ));
    }
}
