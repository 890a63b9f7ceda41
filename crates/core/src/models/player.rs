//! Room member models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Live transport connection identifier. Used for routing only, never as identity.
pub type ConnectionId = Uuid;

/// A member of a room, keyed by its durable identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Client-chosen opaque id, stable across reconnects
    pub durable_identity_id: String,
    /// Current live connection; refreshed on every rejoin
    pub connection_id: ConnectionId,
    pub display_name: String,
    /// Alternative this player currently has a vote on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voted_for: Option<String>,
}

impl Player {
    pub fn new(
        durable_identity_id: impl Into<String>,
        connection_id: ConnectionId,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            durable_identity_id: durable_identity_id.into(),
            connection_id,
            display_name: display_name.into(),
            voted_for: None,
        }
    }

    pub fn has_voted(&self) -> bool {
        self.voted_for.is_some()
    }
}

/// Represents a member as presented to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub durable_identity_id: String,
    pub connection_id: ConnectionId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voted_for: Option<String>,
    /// Derived from list position at render time
    pub is_host: bool,
}

impl MemberView {
    pub fn from_player(player: &Player, is_host: bool) -> Self {
        Self {
            durable_identity_id: player.durable_identity_id.clone(),
            connection_id: player.connection_id,
            display_name: player.display_name.clone(),
            voted_for: player.voted_for.clone(),
            is_host,
        }
    }
}
