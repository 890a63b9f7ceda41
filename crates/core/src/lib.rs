//! Quizroom Core Library
//!
//! Room registry, membership reconciliation and vote aggregation for
//! Quizroom. Everything here is synchronous and in memory; the network
//! layer serializes calls into [`SessionCoordinator`].

pub mod error;
pub mod invariants;
pub mod models;
pub mod names;
pub mod registry;
pub mod session;
pub mod share;

pub use error::{Error, ErrorKind, Result};
pub use models::*;
pub use names::{display_name_or_random, random_display_name};
pub use registry::{CodeGenerator, RandomCodes, RoomRegistry, DEFAULT_MAX_ROOMS};
pub use session::{Binding, JoinOutcome, LeaveOutcome, SessionCoordinator};
pub use share::{normalize_room_code, room_code_from_input, ShareUrl};
