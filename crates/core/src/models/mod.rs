//! Data models for Quizroom

mod player;
mod quiz;
mod room;

pub use player::*;
pub use quiz::*;
pub use room::*;
