//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use std::collections::HashSet;

use crate::models::Room;
use crate::registry::RoomRegistry;

/// Validate that a Room's state is internally consistent
pub fn assert_room_invariants(room: &Room) {
    // A live room always has members; emptiness deletes it
    debug_assert!(
        !room.members().is_empty(),
        "Room {} is live with no members",
        room.code
    );

    // The creator stays first for the room's whole life
    debug_assert!(
        room.host()
            .map(|h| h.durable_identity_id == room.host_identity_id)
            .unwrap_or(false),
        "Room {} host {} is not its first member",
        room.code,
        room.host_identity_id
    );

    // One entry per durable identity
    let mut seen = HashSet::new();
    for member in room.members() {
        debug_assert!(
            seen.insert(member.durable_identity_id.as_str()),
            "Room {} lists identity {} twice",
            room.code,
            member.durable_identity_id
        );
    }

    match room.quiz() {
        Some(quiz) => {
            // Vote conservation
            debug_assert_eq!(
                quiz.total_votes() as usize,
                room.voter_count(),
                "Room {} tallies disagree with recorded votes",
                room.code
            );

            for member in room.members() {
                if let Some(option_id) = member.voted_for.as_deref() {
                    debug_assert!(
                        quiz.alternative(option_id).is_some(),
                        "Room {} member {} voted for unknown option {}",
                        room.code,
                        member.durable_identity_id,
                        option_id
                    );
                }
            }
        }
        None => {
            debug_assert_eq!(
                room.voter_count(),
                0,
                "Room {} has votes but no quiz",
                room.code
            );
        }
    }
}

/// Validate every room and its index key
pub fn assert_registry_invariants(registry: &RoomRegistry) {
    for room in registry.rooms() {
        debug_assert!(
            registry.get(&room.code).is_some(),
            "Room {} is not indexed under its own code",
            room.code
        );
        assert_room_invariants(room);
    }

    debug_assert!(
        registry.len() <= registry.max_rooms(),
        "Registry holds {} rooms, above its cap of {}",
        registry.len(),
        registry.max_rooms()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlternativeDraft, Player, QuizDraft};
    use uuid::Uuid;

    #[test]
    fn test_valid_room_passes() {
        let quiz = QuizDraft::new("Q", vec![AlternativeDraft::new("a", "A")])
            .into_quiz()
            .unwrap();
        let mut room = Room::new("AB12C".into(), Player::new("p1", Uuid::new_v4(), "H"), Some(quiz));
        room.admit("p2", Uuid::new_v4(), "G".into());
        room.cast_vote("p2", "a").unwrap();

        assert_room_invariants(&room);
    }

    #[test]
    fn test_registry_passes() {
        let mut registry = RoomRegistry::default();
        registry
            .create(Player::new("p1", Uuid::new_v4(), "H"), None)
            .unwrap();
        assert_registry_invariants(&registry);
    }
}
