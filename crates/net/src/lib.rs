//! Quizroom Network Library
//!
//! Provides the TCP transport for quiz rooms.
//!
//! # Architecture
//!
//! - **Server**: Hosts every room; applies requests one at a time and fans
//!   room updates out to each room's members
//! - **Client**: Sends requests, awaits correlated replies, receives room events
//! - **Protocol**: Length-prefixed JSON messages
//!
//! # Usage
//!
//! ```ignore
//! let server = Server::start(ServerConfig::default()).await?;
//!
//! let mut client = Client::connect(server.addr()).await?;
//! let room = client.create_room(&identity, "Alice", Some(quiz)).await?;
//!
//! while let Some(event) = client.next_event().await {
//!     match event {
//!         RoomEvent::Update(state) => { /* render */ }
//!         RoomEvent::Closed => break,
//!         RoomEvent::Disconnected => break,
//!     }
//! }
//! ```

pub mod client;
pub mod error;
mod frame;
mod hub;
pub mod protocol;
pub mod server;

pub use client::{vote_count, Client, CreatedRoom, RoomEvent};
pub use error::{Error, Result};
pub use protocol::{ClientFrame, Reply, Request, RoomState, ServerFrame};
pub use server::{Server, ServerConfig};

/// Default port for Quizroom servers
pub const DEFAULT_PORT: u16 = 4000;
