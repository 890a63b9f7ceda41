//! TCP server hosting quiz rooms
//!
//! Each accepted connection gets a fresh connection id, a reader loop and
//! a writer task. Requests are applied to the shared [`Hub`] one at a time;
//! room broadcasts reach the connection through its room subscription.

use std::net::SocketAddr;
use std::sync::Arc;

use quizroom_core::{ConnectionId, RoomSnapshot, DEFAULT_MAX_ROOMS};
use serde::{Deserialize, Serialize};
use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame, MAX_FRAME_SIZE};
use crate::hub::{EventReceiver, Hub, Published, Subscription};
use crate::protocol::{ClientFrame, ServerFrame};
use crate::DEFAULT_PORT;

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on (0 picks a free one)
    pub port: u16,
    /// Cap on simultaneously live rooms
    pub max_rooms: usize,
    /// Per-room broadcast backlog before slow members start missing updates
    pub event_buffer: usize,
    /// Per-connection outgoing queue length
    pub outbound_queue: usize,
    /// Largest accepted frame, in bytes
    pub max_frame_bytes: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_rooms: DEFAULT_MAX_ROOMS,
            event_buffer: 64,
            outbound_queue: 64,
            max_frame_bytes: MAX_FRAME_SIZE,
        }
    }
}

impl ServerConfig {
    /// Loopback on a random port
    pub fn local() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Server handle
pub struct Server {
    addr: SocketAddr,
    hub: Arc<Mutex<Hub>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Start a new server with the given settings
    pub async fn start(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, max_rooms = config.max_rooms, "Server started");

        let (shutdown_tx, _) = broadcast::channel(1);
        let hub = Arc::new(Mutex::new(Hub::new(config.max_rooms, config.event_buffer)));

        tokio::spawn(accept_loop(
            listener,
            hub.clone(),
            Arc::new(config),
            shutdown_tx.clone(),
        ));

        Ok(Server {
            addr: bound_addr,
            hub,
            shutdown_tx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of live rooms
    pub async fn room_count(&self) -> usize {
        self.hub.lock().await.sessions().registry().len()
    }

    /// Current state of a room, if it is live
    pub async fn room(&self, room_code: &str) -> Option<RoomSnapshot> {
        self.hub.lock().await.sessions().snapshot(room_code)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

/// Accept incoming connections
async fn accept_loop(
    listener: TcpListener,
    hub: Arc<Mutex<Hub>>,
    config: Arc<ServerConfig>,
    shutdown_tx: broadcast::Sender<()>,
) {
    let mut shutdown_rx = shutdown_tx.subscribe();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "New connection");
                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            hub.clone(),
                            config.clone(),
                            shutdown_tx.subscribe(),
                        ));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    hub: Arc<Mutex<Hub>>,
    config: Arc<ServerConfig>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let connection_id: ConnectionId = Uuid::new_v4();
    let (reader, writer) = tokio::io::split(stream);

    info!(addr = %addr, connection_id = %connection_id, "Client connected");

    let (out_tx, out_rx) = mpsc::channel(config.outbound_queue.max(1));
    let writer_handle = tokio::spawn(writer_task(writer, out_rx, config.max_frame_bytes));

    let (request_tx, mut request_rx) = mpsc::channel(1);
    let reader_handle = tokio::spawn(reader_task(reader, request_tx, config.max_frame_bytes));

    let mut events: Option<EventReceiver> = None;

    loop {
        tokio::select! {
            result = request_rx.recv() => {
                match result {
                    Some(Ok(frame)) => {
                        let operation = frame.request.name();
                        let handled = hub.lock().await.handle(connection_id, frame.request);
                        debug!(
                            connection_id = %connection_id,
                            operation,
                            success = handled.reply.success,
                            "Request handled"
                        );

                        match handled.subscription {
                            Subscription::Keep => {}
                            Subscription::Subscribe(rx) => events = Some(rx),
                            Subscription::Unsubscribe => events = None,
                        }

                        let reply = ServerFrame::Reply { id: frame.id, reply: handled.reply };
                        if out_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(Error::ConnectionClosed)) | None => {
                        debug!(connection_id = %connection_id, "Connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection_id = %connection_id, error = %e, "Read error");
                        break;
                    }
                }
            }

            event = next_event(&mut events) => {
                match event {
                    Ok(Published { skip, frame }) => {
                        if skip == Some(connection_id) {
                            continue;
                        }
                        if out_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(connection_id = %connection_id, missed, "Subscriber lagged, updates dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!(connection_id = %connection_id, "Room group closed");
                        events = None;
                    }
                }
            }

            _ = shutdown_rx.recv() => {
                debug!(connection_id = %connection_id, "Shutting down connection");
                break;
            }
        }
    }

    // Cleanup
    reader_handle.abort();
    writer_handle.abort();
    hub.lock().await.disconnect(connection_id);

    info!(connection_id = %connection_id, "Client disconnected");
}

/// Reader task - decodes frames until the stream ends or breaks.
/// Frames are read here rather than in a select branch so a partial read
/// is never dropped.
async fn reader_task(
    mut reader: ReadHalf<TcpStream>,
    tx: mpsc::Sender<Result<ClientFrame>>,
    max_frame_bytes: u32,
) {
    loop {
        let result = read_frame(&mut reader, max_frame_bytes).await;
        let failed = result.is_err();
        if tx.send(result).await.is_err() || failed {
            break;
        }
    }
}

/// Next event of the room subscription; pends forever while unsubscribed
async fn next_event(events: &mut Option<EventReceiver>) -> std::result::Result<Published, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Writer task - sends frames to the client
async fn writer_task(
    mut writer: WriteHalf<TcpStream>,
    mut rx: mpsc::Receiver<ServerFrame>,
    max_frame_bytes: u32,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame, max_frame_bytes).await {
            debug!(error = %e, "Write failed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_start() {
        let server = Server::start(ServerConfig::local()).await.unwrap();

        assert!(server.addr().port() > 0);
        assert_eq!(server.room_count().await, 0);
        server.shutdown();
    }

    #[test]
    fn test_config_defaults_fill_gaps() {
        let config: ServerConfig = serde_json::from_str(r#"{"port": 5000}"#).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_frame_bytes, MAX_FRAME_SIZE);
    }
}
