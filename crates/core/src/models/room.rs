//! Room model - one quiz session addressed by a short code

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{ConnectionId, MemberView, Player, Quiz};
use crate::error::{Error, Result};

/// A live room. Member order is join order; the first member is the host.
#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub host_identity_id: String,
    members: Vec<Player>,
    quiz: Option<Quiz>,
    pub created_at: DateTime<Utc>,
}

/// Whether a join added a member or refreshed an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Joined,
    Rejoined,
}

impl Room {
    pub fn new(code: String, host: Player, quiz: Option<Quiz>) -> Self {
        Self {
            code,
            host_identity_id: host.durable_identity_id.clone(),
            members: vec![host],
            quiz,
            created_at: Utc::now(),
        }
    }

    pub fn members(&self) -> &[Player] {
        &self.members
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    /// Time since the room was created
    pub fn age(&self) -> Duration {
        Utc::now() - self.created_at
    }

    pub fn member(&self, durable_identity_id: &str) -> Option<&Player> {
        self.members
            .iter()
            .find(|p| p.durable_identity_id == durable_identity_id)
    }

    /// The positionally-first member
    pub fn host(&self) -> Option<&Player> {
        self.members.first()
    }

    pub fn is_host(&self, durable_identity_id: &str) -> bool {
        self.host_identity_id == durable_identity_id
    }

    /// Number of members with a vote on record
    pub fn voter_count(&self) -> usize {
        self.members.iter().filter(|p| p.has_voted()).count()
    }

    /// Member list as broadcast to clients, host flag derived from position
    pub fn member_views(&self) -> Vec<MemberView> {
        self.members
            .iter()
            .enumerate()
            .map(|(idx, p)| MemberView::from_player(p, idx == 0))
            .collect()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            members: self.member_views(),
            quiz: self.quiz.clone(),
        }
    }

    /// Add a member, or refresh the connection of an existing one in place.
    ///
    /// A returning member keeps its list position, so a host that reloads
    /// stays first.
    pub(crate) fn admit(
        &mut self,
        durable_identity_id: &str,
        connection_id: ConnectionId,
        display_name: String,
    ) -> Admission {
        if let Some(existing) = self
            .members
            .iter_mut()
            .find(|p| p.durable_identity_id == durable_identity_id)
        {
            existing.connection_id = connection_id;
            return Admission::Rejoined;
        }

        self.members
            .push(Player::new(durable_identity_id, connection_id, display_name));
        Admission::Joined
    }

    /// Remove a member by durable identity, retracting any vote it holds
    pub(crate) fn remove_member(&mut self, durable_identity_id: &str) -> Option<Player> {
        let idx = self
            .members
            .iter()
            .position(|p| p.durable_identity_id == durable_identity_id)?;
        let player = self.members.remove(idx);

        if let (Some(option_id), Some(quiz)) = (player.voted_for.as_deref(), self.quiz.as_mut()) {
            quiz.retract_vote(option_id);
        }

        Some(player)
    }

    /// Record a vote for `chosen_option_id`, replacing the member's previous vote
    pub(crate) fn cast_vote(&mut self, durable_identity_id: &str, chosen_option_id: &str) -> Result<()> {
        let quiz = self
            .quiz
            .as_mut()
            .ok_or_else(|| Error::NoQuiz(self.code.clone()))?;
        let player = self
            .members
            .iter_mut()
            .find(|p| p.durable_identity_id == durable_identity_id)
            .ok_or_else(|| Error::PlayerNotFound(durable_identity_id.to_string()))?;

        quiz.reassign_vote(player.voted_for.as_deref(), chosen_option_id)?;
        player.voted_for = Some(chosen_option_id.to_string());
        Ok(())
    }
}

/// Point-in-time view of a room, as sent to its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: String,
    pub members: Vec<MemberView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlternativeDraft, QuizDraft};
    use uuid::Uuid;

    fn room_with_quiz() -> Room {
        let quiz = QuizDraft::new(
            "Pick one",
            vec![
                AlternativeDraft::new("opt-1", "left"),
                AlternativeDraft::new("opt-2", "right"),
            ],
        )
        .into_quiz()
        .unwrap();
        Room::new(
            "AB12C".into(),
            Player::new("p1", Uuid::new_v4(), "Host"),
            Some(quiz),
        )
    }

    #[test]
    fn test_age_counts_from_creation() {
        let mut room = room_with_quiz();
        assert!(room.age() >= Duration::zero());

        room.created_at = Utc::now() - Duration::minutes(5);
        assert!(room.age() >= Duration::minutes(5));
        assert!(room.age() < Duration::minutes(6));
    }

    #[test]
    fn test_host_is_first_member() {
        let mut room = room_with_quiz();
        room.admit("p2", Uuid::new_v4(), "Guest".into());

        let views = room.member_views();
        assert!(views[0].is_host);
        assert!(!views[1].is_host);
        assert_eq!(room.host().unwrap().durable_identity_id, "p1");
        assert!(room.is_host("p1"));
    }

    #[test]
    fn test_rejoin_refreshes_connection_in_place() {
        let mut room = room_with_quiz();
        room.admit("p2", Uuid::new_v4(), "Guest".into());

        let fresh = Uuid::new_v4();
        assert_eq!(room.admit("p1", fresh, "Renamed".into()), Admission::Rejoined);

        assert_eq!(room.members().len(), 2);
        assert_eq!(room.members()[0].durable_identity_id, "p1");
        assert_eq!(room.members()[0].connection_id, fresh);
        assert_eq!(room.members()[0].display_name, "Host");
    }

    #[test]
    fn test_vote_errors() {
        let mut room = room_with_quiz();
        assert_eq!(
            room.cast_vote("ghost", "opt-1"),
            Err(Error::PlayerNotFound("ghost".into()))
        );
        assert_eq!(
            room.cast_vote("p1", "opt-9"),
            Err(Error::AlternativeNotFound("opt-9".into()))
        );
        assert_eq!(room.voter_count(), 0);

        let mut bare = Room::new("ZZZZZ".into(), Player::new("p1", Uuid::new_v4(), "H"), None);
        assert_eq!(
            bare.cast_vote("p1", "opt-1"),
            Err(Error::NoQuiz("ZZZZZ".into()))
        );
    }

    #[test]
    fn test_leaving_voter_retracts_vote() {
        let mut room = room_with_quiz();
        room.admit("p2", Uuid::new_v4(), "Guest".into());
        room.cast_vote("p2", "opt-2").unwrap();
        assert_eq!(room.quiz().unwrap().total_votes(), 1);

        let removed = room.remove_member("p2").unwrap();
        assert_eq!(removed.voted_for.as_deref(), Some("opt-2"));
        assert_eq!(room.quiz().unwrap().total_votes(), 0);
        assert_eq!(room.voter_count(), 0);
    }
}
