//! Room registry - owns every live room, indexed by its code
//!
//! Codes are 5 characters over the base-36 alphabet, drawn uniformly at
//! random and redrawn on collision with a live room.

use std::collections::HashMap;

use rand::Rng;

use crate::error::{Error, Result};
use crate::models::{Player, Quiz, Room};

/// Length of a room code
pub const ROOM_CODE_LEN: usize = 5;

/// Characters a room code is drawn from
pub const ROOM_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of distinct room codes (36^5)
pub const ROOM_CODE_SPACE: usize = 60_466_176;

/// Default cap on live rooms, far below the code space so redraws stay cheap
pub const DEFAULT_MAX_ROOMS: usize = 100_000;

/// Source of candidate room codes
pub trait CodeGenerator: Send {
    fn next_code(&mut self) -> String;
}

/// Uniform random codes from the thread-local RNG
#[derive(Debug, Default)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    fn next_code(&mut self) -> String {
        generate_room_code(&mut rand::thread_rng())
    }
}

/// Draw one room code
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Registry of live rooms
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    codes: Box<dyn CodeGenerator>,
    max_rooms: usize,
}

impl RoomRegistry {
    /// Create an empty registry with random codes
    pub fn new(max_rooms: usize) -> Self {
        Self::with_codes(max_rooms, Box::new(RandomCodes))
    }

    /// Create an empty registry drawing codes from `codes`
    pub fn with_codes(max_rooms: usize, codes: Box<dyn CodeGenerator>) -> Self {
        Self {
            rooms: HashMap::new(),
            codes,
            max_rooms: max_rooms.min(ROOM_CODE_SPACE / 2),
        }
    }

    /// Register a new room hosted by `host`, returning it
    pub fn create(&mut self, host: Player, quiz: Option<Quiz>) -> Result<&Room> {
        if self.rooms.len() >= self.max_rooms {
            tracing::warn!(live_rooms = self.rooms.len(), "Refusing to create room");
            return Err(Error::CapacityExhausted(self.rooms.len()));
        }

        let code = loop {
            let candidate = self.codes.next_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(code = %candidate, "Room code collision, redrawing");
        };

        let room = Room::new(code.clone(), host, quiz);
        Ok(self.rooms.entry(code).or_insert(room))
    }

    /// Get a room by code
    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub(crate) fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Check if a room is live
    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    /// Remove a room; its code becomes free for reuse
    pub fn remove(&mut self, code: &str) -> Option<Room> {
        self.rooms.remove(code)
    }

    /// Get all live rooms
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Get number of live rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn max_rooms(&self) -> usize {
        self.max_rooms
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROOMS)
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .field("max_rooms", &self.max_rooms)
            .finish()
    }
}

/// Codes handed out from a fixed script, for tests
#[cfg(test)]
pub(crate) struct ScriptedCodes(pub std::collections::VecDeque<String>);

#[cfg(test)]
impl ScriptedCodes {
    pub(crate) fn new(codes: &[&str]) -> Self {
        Self(codes.iter().map(|c| c.to_string()).collect())
    }
}

#[cfg(test)]
impl CodeGenerator for ScriptedCodes {
    fn next_code(&mut self) -> String {
        self.0.pop_front().expect("scripted codes exhausted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn host(id: &str) -> Player {
        Player::new(id, Uuid::new_v4(), id)
    }

    #[test]
    fn test_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_room_code(&mut rng);
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_code_space_constant() {
        assert_eq!(ROOM_CODE_SPACE, 36usize.pow(ROOM_CODE_LEN as u32));
    }

    #[test]
    fn test_collision_redraws() {
        let codes = ScriptedCodes::new(&["AB12C", "AB12C", "AB12C", "ZZ9ZZ"]);
        let mut registry = RoomRegistry::with_codes(10, Box::new(codes));

        let first = registry.create(host("p1"), None).unwrap().code.clone();
        let second = registry.create(host("p2"), None).unwrap().code.clone();

        assert_eq!(first, "AB12C");
        assert_eq!(second, "ZZ9ZZ");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_live_codes_unique() {
        let mut registry = RoomRegistry::default();
        let mut seen = HashSet::new();
        for i in 0..500 {
            let code = registry
                .create(host(&format!("p{i}")), None)
                .unwrap()
                .code
                .clone();
            assert!(seen.insert(code));
        }
        assert_eq!(registry.len(), 500);
    }

    #[test]
    fn test_removed_code_reusable() {
        let codes = ScriptedCodes::new(&["AB12C", "AB12C"]);
        let mut registry = RoomRegistry::with_codes(10, Box::new(codes));

        registry.create(host("p1"), None).unwrap();
        assert!(registry.remove("AB12C").is_some());
        assert!(!registry.contains("AB12C"));

        let again = registry.create(host("p2"), None).unwrap();
        assert_eq!(again.code, "AB12C");
        assert_eq!(again.host_identity_id, "p2");
    }

    #[test]
    fn test_capacity_guard() {
        let mut registry = RoomRegistry::new(2);
        registry.create(host("a"), None).unwrap();
        registry.create(host("b"), None).unwrap();
        assert_eq!(
            registry.create(host("c"), None).unwrap_err(),
            Error::CapacityExhausted(2)
        );
    }
}
