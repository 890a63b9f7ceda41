//! TCP client for talking to a quiz room server
//!
//! Requests are correlated with their replies by id; room broadcasts are
//! delivered separately through [`Client::next_event`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use quizroom_core::{MemberView, Quiz, QuizDraft};
use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame, MAX_FRAME_SIZE};
use crate::protocol::{ClientFrame, Reply, Request, RoomState, ServerFrame};

/// Broadcast event received from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// Membership or vote tallies changed
    Update(RoomState),
    /// The host ended the session
    Closed,
    /// Connection lost
    Disconnected,
}

/// A freshly created room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRoom {
    pub room_code: String,
    pub members: Vec<MemberView>,
}

type PendingReplies = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

/// Client handle for network operations
pub struct Client {
    cmd_tx: mpsc::Sender<ClientCommand>,
    pending: PendingReplies,
    next_id: AtomicU64,
    event_rx: mpsc::Receiver<RoomEvent>,
}

enum ClientCommand {
    Send(ClientFrame),
    Disconnect,
}

impl Client {
    /// Connect to a quiz room server
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!(addr = %stream.peer_addr()?, "Connected to server");

        let (reader, writer) = tokio::io::split(stream);
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (frame_tx, frame_rx) = mpsc::channel(64);

        let reader_handle = tokio::spawn(reader_task(reader, frame_tx));
        tokio::spawn(connection_task(
            writer,
            reader_handle,
            frame_rx,
            pending.clone(),
            event_tx,
            cmd_rx,
        ));

        Ok(Client {
            cmd_tx,
            pending,
            next_id: AtomicU64::new(1),
            event_rx,
        })
    }

    /// Create a room hosted by this player. The quiz is checked locally
    /// before anything is sent.
    pub async fn create_room(
        &self,
        durable_identity_id: &str,
        display_name: &str,
        quiz: Option<QuizDraft>,
    ) -> Result<CreatedRoom> {
        if let Some(quiz) = &quiz {
            quiz.validate()?;
        }

        let reply = self
            .request(Request::CreateRoom {
                durable_identity_id: durable_identity_id.to_string(),
                display_name: display_name.to_string(),
                quiz,
            })
            .await?;

        let room_code = reply
            .room_code
            .ok_or_else(|| Error::Protocol("createRoom reply without room code".into()))?;
        Ok(CreatedRoom {
            room_code,
            members: reply.members.unwrap_or_default(),
        })
    }

    /// Join a room, or reconnect to one this identity is already in
    pub async fn join_room(
        &self,
        room_code: &str,
        durable_identity_id: &str,
        display_name: &str,
    ) -> Result<RoomState> {
        let reply = self
            .request(Request::JoinRoom {
                room_code: quizroom_core::normalize_room_code(room_code),
                durable_identity_id: durable_identity_id.to_string(),
                display_name: display_name.to_string(),
            })
            .await?;
        Ok(reply.into())
    }

    /// Leave the current room; ends the room if this player is its host
    pub async fn leave_room(&self) -> Result<()> {
        self.request(Request::LeaveRoom).await.map(|_| ())
    }

    /// Vote for an alternative, replacing any earlier vote
    pub async fn vote(
        &self,
        room_code: &str,
        durable_identity_id: &str,
        chosen_option_id: &str,
    ) -> Result<RoomState> {
        let reply = self
            .request(Request::PlayerVoted {
                room_code: quizroom_core::normalize_room_code(room_code),
                durable_identity_id: durable_identity_id.to_string(),
                chosen_option_id: chosen_option_id.to_string(),
            })
            .await?;
        Ok(reply.into())
    }

    /// Get the next room event
    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        self.event_rx.recv().await
    }

    /// Disconnect from the server without leaving the room
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(ClientCommand::Disconnect).await;
    }

    async fn request(&self, request: Request) -> Result<Reply> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        debug!(id, operation = request.name(), "Sending request");

        if self
            .cmd_tx
            .send(ClientCommand::Send(ClientFrame { id, request }))
            .await
            .is_err()
        {
            self.pending.lock().await.remove(&id);
            return Err(Error::NotConnected);
        }

        let reply = rx.await.map_err(|_| Error::NotConnected)?;
        reply.into_result()
    }
}

/// Reader task - forwards decoded frames; stops at the first error
async fn reader_task(mut reader: ReadHalf<TcpStream>, tx: mpsc::Sender<Result<ServerFrame>>) {
    loop {
        let result = read_frame(&mut reader, MAX_FRAME_SIZE).await;
        let failed = result.is_err();
        if tx.send(result).await.is_err() || failed {
            break;
        }
    }
}

/// Main connection task
async fn connection_task(
    mut writer: WriteHalf<TcpStream>,
    reader_handle: JoinHandle<()>,
    mut frame_rx: mpsc::Receiver<Result<ServerFrame>>,
    pending: PendingReplies,
    event_tx: mpsc::Sender<RoomEvent>,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
) {
    loop {
        tokio::select! {
            // Incoming frame from server
            result = frame_rx.recv() => {
                match result {
                    Some(Ok(frame)) => handle_server_frame(frame, &pending, &event_tx).await,
                    Some(Err(Error::ConnectionClosed)) | None => {
                        debug!("Server closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Read error");
                        break;
                    }
                }
            }

            // Outgoing command
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::Send(frame)) => {
                        if let Err(e) = write_frame(&mut writer, &frame, MAX_FRAME_SIZE).await {
                            warn!(error = %e, "Write error");
                            break;
                        }
                    }
                    Some(ClientCommand::Disconnect) | None => {
                        debug!("Disconnect requested");
                        break;
                    }
                }
            }
        }
    }

    reader_handle.abort();

    // Dropping the senders fails every outstanding request
    pending.lock().await.clear();
    let _ = event_tx.send(RoomEvent::Disconnected).await;
    info!("Disconnected from server");
}

/// Handle a frame from the server
async fn handle_server_frame(
    frame: ServerFrame,
    pending: &PendingReplies,
    event_tx: &mpsc::Sender<RoomEvent>,
) {
    match frame {
        ServerFrame::Reply { id, reply } => match pending.lock().await.remove(&id) {
            Some(tx) => {
                let _ = tx.send(reply);
            }
            None => debug!(id, "Reply for unknown request"),
        },
        ServerFrame::RoomUpdate { members, quiz } => {
            let _ = event_tx
                .send(RoomEvent::Update(RoomState { members, quiz }))
                .await;
        }
        ServerFrame::RoomClosed => {
            let _ = event_tx.send(RoomEvent::Closed).await;
        }
    }
}

/// Vote count of one alternative, or zero if it is unknown
pub fn vote_count(quiz: Option<&Quiz>, option_id: &str) -> u32 {
    quiz.and_then(|q| q.alternative(option_id))
        .map(|a| a.vote_count)
        .unwrap_or(0)
}
