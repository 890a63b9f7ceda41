//! Room hub - session coordinator plus one broadcast group per room
//!
//! Every request is executed here under the server's single lock, so room
//! mutations never interleave. Fan-out is a `tokio::sync::broadcast`
//! channel per live room: a connection subscribes when it creates or joins
//! a room, drops its receiver when it leaves, and the channel itself is
//! dropped when the room closes. Publishing never waits on subscribers.

use std::collections::HashMap;

use quizroom_core::{ConnectionId, LeaveOutcome, RoomRegistry, SessionCoordinator};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::protocol::{Reply, Request, ServerFrame};

/// An event published to a room's group
#[derive(Debug, Clone)]
pub(crate) struct Published {
    /// Connection that should not receive this event (it got a reply instead)
    pub skip: Option<ConnectionId>,
    pub frame: ServerFrame,
}

pub(crate) type EventReceiver = broadcast::Receiver<Published>;

/// What the connection should do with its room subscription
#[derive(Debug)]
pub(crate) enum Subscription {
    /// Leave the current subscription as it is
    Keep,
    /// Replace any current subscription with this one
    Subscribe(EventReceiver),
    /// Drop the current subscription
    Unsubscribe,
}

/// Outcome of one request
#[derive(Debug)]
pub(crate) struct Handled {
    pub reply: Reply,
    pub subscription: Subscription,
}

impl Handled {
    fn keep(reply: Reply) -> Self {
        Self {
            reply,
            subscription: Subscription::Keep,
        }
    }
}

pub(crate) struct Hub {
    sessions: SessionCoordinator,
    groups: HashMap<String, broadcast::Sender<Published>>,
    event_buffer: usize,
}

impl Hub {
    pub fn new(max_rooms: usize, event_buffer: usize) -> Self {
        Self {
            sessions: SessionCoordinator::new(RoomRegistry::new(max_rooms)),
            groups: HashMap::new(),
            event_buffer: event_buffer.max(1),
        }
    }

    pub fn sessions(&self) -> &SessionCoordinator {
        &self.sessions
    }

    /// Execute one request on behalf of a connection
    pub fn handle(&mut self, connection_id: ConnectionId, request: Request) -> Handled {
        match request {
            Request::CreateRoom {
                durable_identity_id,
                display_name,
                quiz,
            } => {
                match self.sessions.create_room(
                    connection_id,
                    &durable_identity_id,
                    &display_name,
                    quiz,
                ) {
                    Ok(snapshot) => {
                        let rx = self.subscribe(&snapshot.code);
                        Handled {
                            reply: Reply::created(snapshot),
                            subscription: Subscription::Subscribe(rx),
                        }
                    }
                    Err(e) => Handled::keep(Reply::failure(&e)),
                }
            }

            Request::JoinRoom {
                room_code,
                durable_identity_id,
                display_name,
            } => {
                match self.sessions.join_room(
                    connection_id,
                    &room_code,
                    &durable_identity_id,
                    &display_name,
                ) {
                    Ok(outcome) => {
                        // Subscribe first so the joiner sees its own update
                        let rx = self.subscribe(&outcome.snapshot.code);
                        self.publish(
                            &outcome.snapshot.code,
                            None,
                            ServerFrame::room_update(&outcome.snapshot),
                        );
                        Handled {
                            reply: Reply::room(outcome.snapshot),
                            subscription: Subscription::Subscribe(rx),
                        }
                    }
                    Err(e) => Handled::keep(Reply::failure(&e)),
                }
            }

            Request::LeaveRoom => match self.sessions.leave_room(connection_id) {
                LeaveOutcome::NotBound => Handled {
                    reply: Reply::ack(),
                    subscription: Subscription::Unsubscribe,
                },
                LeaveOutcome::Closed { room_code, .. } => {
                    self.close_group(&room_code);
                    // The closed channel ends this subscription after it
                    // delivers roomClosed to the host too
                    Handled::keep(Reply::ack())
                }
                LeaveOutcome::Left { snapshot, .. } => {
                    self.publish(
                        &snapshot.code,
                        Some(connection_id),
                        ServerFrame::room_update(&snapshot),
                    );
                    Handled {
                        reply: Reply::ack(),
                        subscription: Subscription::Unsubscribe,
                    }
                }
            },

            Request::PlayerVoted {
                room_code,
                durable_identity_id,
                chosen_option_id,
            } => match self
                .sessions
                .cast_vote(&room_code, &durable_identity_id, &chosen_option_id)
            {
                Ok(snapshot) => {
                    self.publish(
                        &snapshot.code,
                        Some(connection_id),
                        ServerFrame::room_update(&snapshot),
                    );
                    Handled::keep(Reply::room(snapshot))
                }
                Err(e) => Handled::keep(Reply::failure(&e)),
            },
        }
    }

    /// A connection went away without leaving
    pub fn disconnect(&mut self, connection_id: ConnectionId) {
        self.sessions.disconnect(connection_id);
    }

    fn subscribe(&mut self, room_code: &str) -> EventReceiver {
        let buffer = self.event_buffer;
        self.groups
            .entry(room_code.to_string())
            .or_insert_with(|| broadcast::channel(buffer).0)
            .subscribe()
    }

    fn publish(&self, room_code: &str, skip: Option<ConnectionId>, frame: ServerFrame) {
        let Some(tx) = self.groups.get(room_code) else {
            warn!(room_code = %room_code, "No broadcast group for live room");
            return;
        };

        // Err only means nobody is subscribed right now
        if tx.send(Published { skip, frame }).is_err() {
            debug!(room_code = %room_code, "Room update had no subscribers");
        }
    }

    fn close_group(&mut self, room_code: &str) {
        self.publish(room_code, None, ServerFrame::RoomClosed);
        self.groups.remove(room_code);
    }
}
