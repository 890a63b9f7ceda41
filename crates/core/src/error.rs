//! Error types for Quizroom Core

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room {0} has no quiz")]
    NoQuiz(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Alternative not found: {0}")]
    AlternativeNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Room capacity exhausted: {0} live rooms")]
    CapacityExhausted(usize),
}

impl Error {
    /// Machine-readable failure class reported to the initiating caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RoomNotFound(_) | Error::NoQuiz(_) => ErrorKind::RoomNotFound,
            Error::PlayerNotFound(_) => ErrorKind::PlayerNotFound,
            Error::AlternativeNotFound(_) => ErrorKind::AlternativeNotFound,
            Error::Validation(_) => ErrorKind::Validation,
            Error::CapacityExhausted(_) => ErrorKind::Capacity,
        }
    }
}

/// Failure classes as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    RoomNotFound,
    PlayerNotFound,
    AlternativeNotFound,
    Validation,
    Capacity,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::RoomNotFound => "room not found",
            ErrorKind::PlayerNotFound => "player not found",
            ErrorKind::AlternativeNotFound => "alternative not found",
            ErrorKind::Validation => "validation",
            ErrorKind::Capacity => "capacity",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_quiz_is_room_not_found_class() {
        assert_eq!(Error::NoQuiz("AB12C".into()).kind(), ErrorKind::RoomNotFound);
        assert_eq!(
            Error::RoomNotFound("AB12C".into()).kind(),
            ErrorKind::RoomNotFound
        );
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&ErrorKind::AlternativeNotFound).unwrap();
        assert_eq!(json, "\"alternativeNotFound\"");
    }
}
