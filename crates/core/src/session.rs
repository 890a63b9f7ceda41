//! Session coordination - the four room operations
//!
//! The coordinator owns the room registry plus the table that maps each
//! live connection to the room and durable identity it is bound to. Who a
//! player is always comes from the durable identity; the connection id is
//! only kept so a later leave (or disconnect) can find its binding.
//!
//! Operations are synchronous and complete against in-memory state. Callers
//! serialize them (one lock or one task) so operations on the same room
//! never interleave.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::invariants::assert_room_invariants;
use crate::models::{Admission, ConnectionId, Player, QuizDraft, RoomSnapshot};
use crate::names::display_name_or_random;
use crate::registry::RoomRegistry;
use crate::share::normalize_room_code;

/// The room and identity a connection is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room_code: String,
    pub durable_identity_id: String,
}

/// Result of a successful join
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub snapshot: RoomSnapshot,
    pub admission: Admission,
}

/// Result of a leave request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The connection was not bound to any live room
    NotBound,
    /// The host left: the room is gone and every connection bound to it
    /// was released
    Closed { room_code: String },
    /// A non-host member left; the room carries on
    Left {
        durable_identity_id: String,
        snapshot: RoomSnapshot,
    },
}

/// Room registry plus connection bindings
#[derive(Debug, Default)]
pub struct SessionCoordinator {
    registry: RoomRegistry,
    bindings: HashMap<ConnectionId, Binding>,
}

impl SessionCoordinator {
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            registry,
            bindings: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Binding recorded for a connection, if any
    pub fn binding(&self, connection_id: ConnectionId) -> Option<&Binding> {
        self.bindings.get(&connection_id)
    }

    /// Connections currently bound to a room
    pub fn bound_connections(&self, room_code: &str) -> Vec<ConnectionId> {
        self.bindings
            .iter()
            .filter(|(_, b)| b.room_code == room_code)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Snapshot of a live room
    pub fn snapshot(&self, room_code: &str) -> Option<RoomSnapshot> {
        self.registry
            .get(&normalize_room_code(room_code))
            .map(|r| r.snapshot())
    }

    /// Create a room hosted by the caller and bind the caller's connection to it
    pub fn create_room(
        &mut self,
        connection_id: ConnectionId,
        durable_identity_id: &str,
        display_name: &str,
        quiz: Option<QuizDraft>,
    ) -> Result<RoomSnapshot> {
        let durable_identity_id = require_identity(durable_identity_id)?;
        let quiz = quiz.map(QuizDraft::into_quiz).transpose()?;
        let host = Player::new(
            durable_identity_id.clone(),
            connection_id,
            display_name_or_random(display_name),
        );

        let room = self.registry.create(host, quiz)?;
        assert_room_invariants(room);
        let snapshot = room.snapshot();

        tracing::info!(
            room_code = %snapshot.code,
            identity = %durable_identity_id,
            connection_id = %connection_id,
            has_quiz = snapshot.quiz.is_some(),
            "Room created"
        );

        self.bind(connection_id, &snapshot.code, durable_identity_id);
        Ok(snapshot)
    }

    /// Join a room, or refresh the connection of a returning member
    pub fn join_room(
        &mut self,
        connection_id: ConnectionId,
        room_code: &str,
        durable_identity_id: &str,
        display_name: &str,
    ) -> Result<JoinOutcome> {
        let room_code = normalize_room_code(room_code);
        if room_code.is_empty() {
            return Err(Error::Validation("Room code is required.".into()));
        }
        let durable_identity_id = require_identity(durable_identity_id)?;

        let room = self
            .registry
            .get_mut(&room_code)
            .ok_or_else(|| Error::RoomNotFound(room_code.clone()))?;

        let admission = room.admit(
            &durable_identity_id,
            connection_id,
            display_name_or_random(display_name),
        );
        assert_room_invariants(room);
        let snapshot = room.snapshot();

        match admission {
            Admission::Rejoined => tracing::info!(
                room_code = %room_code,
                identity = %durable_identity_id,
                connection_id = %connection_id,
                "Player re-joined room"
            ),
            Admission::Joined => tracing::info!(
                room_code = %room_code,
                identity = %durable_identity_id,
                connection_id = %connection_id,
                members = snapshot.members.len(),
                "Player joined room"
            ),
        }

        self.bind(connection_id, &room_code, durable_identity_id);
        Ok(JoinOutcome {
            snapshot,
            admission,
        })
    }

    /// Leave whatever room the connection is bound to.
    ///
    /// The host leaving ends the room for everyone. The binding is cleared
    /// in every case.
    pub fn leave_room(&mut self, connection_id: ConnectionId) -> LeaveOutcome {
        let Some(binding) = self.bindings.remove(&connection_id) else {
            tracing::debug!(connection_id = %connection_id, "Leave without a bound room");
            return LeaveOutcome::NotBound;
        };

        let Some(room) = self.registry.get_mut(&binding.room_code) else {
            tracing::debug!(
                connection_id = %connection_id,
                room_code = %binding.room_code,
                "Leave for a room that no longer exists"
            );
            return LeaveOutcome::NotBound;
        };

        if room.member(&binding.durable_identity_id).is_none() {
            tracing::debug!(
                connection_id = %connection_id,
                room_code = %binding.room_code,
                identity = %binding.durable_identity_id,
                "Leave for an identity that already left"
            );
            return LeaveOutcome::NotBound;
        }

        if room.is_host(&binding.durable_identity_id) {
            return self.close_room(&binding.room_code);
        }

        room.remove_member(&binding.durable_identity_id);
        if room.members().is_empty() {
            return self.close_room(&binding.room_code);
        }
        assert_room_invariants(room);
        let snapshot = room.snapshot();

        tracing::info!(
            room_code = %binding.room_code,
            identity = %binding.durable_identity_id,
            members = snapshot.members.len(),
            "Player left room"
        );

        LeaveOutcome::Left {
            durable_identity_id: binding.durable_identity_id,
            snapshot,
        }
    }

    /// Record a vote and return the room's updated state
    pub fn cast_vote(
        &mut self,
        room_code: &str,
        durable_identity_id: &str,
        chosen_option_id: &str,
    ) -> Result<RoomSnapshot> {
        let room_code = normalize_room_code(room_code);
        let room = self
            .registry
            .get_mut(&room_code)
            .ok_or_else(|| Error::RoomNotFound(room_code.clone()))?;

        room.cast_vote(durable_identity_id, chosen_option_id)?;
        assert_room_invariants(room);

        tracing::debug!(
            room_code = %room_code,
            identity = %durable_identity_id,
            option = %chosen_option_id,
            "Vote recorded"
        );

        Ok(room.snapshot())
    }

    /// Forget a dropped connection's binding. Membership is untouched: a
    /// player only leaves a room by asking to.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Binding> {
        let binding = self.bindings.remove(&connection_id)?;
        tracing::debug!(
            connection_id = %connection_id,
            room_code = %binding.room_code,
            identity = %binding.durable_identity_id,
            "Connection dropped, membership kept"
        );
        Some(binding)
    }

    fn bind(&mut self, connection_id: ConnectionId, room_code: &str, durable_identity_id: String) {
        let previous = self.bindings.insert(
            connection_id,
            Binding {
                room_code: room_code.to_string(),
                durable_identity_id,
            },
        );
        if let Some(previous) = previous.filter(|p| p.room_code != room_code) {
            tracing::debug!(
                connection_id = %connection_id,
                from = %previous.room_code,
                to = %room_code,
                "Connection moved to another room"
            );
        }
    }

    fn close_room(&mut self, room_code: &str) -> LeaveOutcome {
        let age_secs = self
            .registry
            .remove(room_code)
            .map(|room| room.age().num_seconds())
            .unwrap_or_default();

        let released = self.bound_connections(room_code);
        for id in &released {
            self.bindings.remove(id);
        }

        tracing::info!(
            room_code = %room_code,
            released = released.len(),
            age_secs,
            "Host left, room closed"
        );

        LeaveOutcome::Closed {
            room_code: room_code.to_string(),
        }
    }
}

/// Identities are opaque and matched byte for byte; only an empty one is refused
fn require_identity(durable_identity_id: &str) -> Result<String> {
    if durable_identity_id.is_empty() {
        return Err(Error::Validation("Player identity is required.".into()));
    }
    Ok(durable_identity_id.to_string())
}
