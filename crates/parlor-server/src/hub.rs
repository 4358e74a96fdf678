//! The session hub: socket registry, authentication gate and the single
//! serialized action queue.
//!
//! Every socket event becomes an [`Action`] appended to one FIFO; a lone
//! worker task drains it in order and is the only mutator of session,
//! room and game state. That global serial order is what makes a play
//! plus its broadcasts observable as one atomic step, with no locks over
//! any of that state. Outbound frames go through per-socket channels
//! drained by writer tasks, so the worker never waits on transport.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use parlor_core::{ClientMessage, ServerMessage};

use crate::authorizer::Authorizer;
use crate::chat_history::ChatHistory;
use crate::room_manager::RoomManager;

/// Transport-level socket identity, minted per connection.
pub type SocketId = u64;
/// Session-level connection identity, minted on successful AUTHORIZE.
pub type ConnId = u32;

/// One unit of the serialized work stream.
pub enum Action {
    /// A socket opened; its outbound channel is registered.
    Open {
        socket: SocketId,
        sender: mpsc::UnboundedSender<String>,
    },
    /// A text frame arrived.
    Frame { socket: SocketId, payload: String },
    /// The socket closed.
    Close { socket: SocketId },
    /// A finished opponent search posts its move back here.
    AiMove { room_id: u32, row: usize, col: usize },
    /// Periodic empty-room sweep, posted by the background timer.
    SweepRooms,
}

/// Outbound routing: socket channels plus the conn -> socket binding.
/// Sends to a vanished socket are dropped silently; the close action will
/// clean the maps up.
#[derive(Default)]
pub struct Outbox {
    sockets: HashMap<SocketId, mpsc::UnboundedSender<String>>,
    conns: HashMap<ConnId, SocketId>,
}

impl Outbox {
    pub fn register_socket(&mut self, socket: SocketId, sender: mpsc::UnboundedSender<String>) {
        self.sockets.insert(socket, sender);
    }

    pub fn unregister_socket(&mut self, socket: SocketId) {
        self.sockets.remove(&socket);
    }

    pub fn bind_conn(&mut self, conn: ConnId, socket: SocketId) {
        self.conns.insert(conn, socket);
    }

    pub fn unbind_conn(&mut self, conn: ConnId) {
        self.conns.remove(&conn);
    }

    pub fn send_socket(&self, socket: SocketId, msg: &ServerMessage) {
        if let Some(sender) = self.sockets.get(&socket) {
            let _ = sender.send(msg.to_wire());
        }
    }

    pub fn send(&self, conn: ConnId, msg: &ServerMessage) {
        if let Some(&socket) = self.conns.get(&conn) {
            self.send_socket(socket, msg);
        }
    }
}

/// An authenticated binding of a socket to a user.
struct Session {
    conn: ConnId,
    user_id: i64,
    user_name: String,
}

pub struct Hub {
    sessions: HashMap<SocketId, Session>,
    /// A user may hold several live connections (multi-device).
    user_conns: HashMap<i64, Vec<ConnId>>,
    next_conn: ConnId,
    pub rooms: RoomManager,
    pub outbox: Outbox,
    auth: Arc<Authorizer>,
    chat: Arc<ChatHistory>,
    /// Handed to rooms so off-worker jobs can post actions back.
    actions: mpsc::UnboundedSender<Action>,
}

impl Hub {
    pub fn new(
        auth: Arc<Authorizer>,
        chat: Arc<ChatHistory>,
        actions: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            user_conns: HashMap::new(),
            next_conn: 0,
            rooms: RoomManager::new(),
            outbox: Outbox::default(),
            auth,
            chat,
            actions,
        }
    }

    /// The worker loop. Strict arrival order; one action at a time.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Action>) {
        while let Some(action) = rx.recv().await {
            self.handle(action);
        }
        tracing::info!("Action queue closed, hub worker exiting");
    }

    pub fn handle(&mut self, action: Action) {
        match action {
            Action::Open { socket, sender } => {
                self.outbox.register_socket(socket, sender);
            },
            Action::Frame { socket, payload } => self.handle_frame(socket, &payload),
            Action::Close { socket } => self.handle_close(socket),
            Action::AiMove { room_id, row, col } => {
                self.rooms.handle_ai_move(room_id, row, col, &self.outbox);
            },
            Action::SweepRooms => {
                let removed = self.rooms.sweep();
                if removed > 0 {
                    tracing::info!(removed, "Swept empty rooms");
                }
            },
        }
    }

    fn handle_frame(&mut self, socket: SocketId, payload: &str) {
        let raw: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(socket, error = %e, "Undecodable frame dropped");
                return;
            },
        };
        let Some(message_type) = ClientMessage::peek_type(&raw).map(str::to_string) else {
            tracing::debug!(socket, "Frame without message_type dropped");
            return;
        };

        let session = self
            .sessions
            .get(&socket)
            .map(|s| (s.conn, s.user_id, s.user_name.clone()));
        let Some((conn, user_id, user_name)) = session else {
            // The gate: an unauthenticated socket may only AUTHORIZE.
            if message_type == "AUTHORIZE" {
                self.handle_authorize(socket, &raw);
            } else {
                self.outbox.send_socket(socket, &ServerMessage::PleaseLogIn);
            }
            return;
        };

        let msg: ClientMessage = match serde_json::from_value(raw) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(socket, %message_type, error = %e, "Malformed message dropped");
                return;
            },
        };

        match msg {
            ClientMessage::Authorize { .. } => {},
            ClientMessage::WhisperMessage {
                receiver_id,
                message,
            } => self.handle_whisper(socket, user_id, &user_name, receiver_id, message),
            ClientMessage::ReadWhisperMessages { friend_id } => {
                if let Err(e) = self.auth.unread_clear(user_id, friend_id) {
                    tracing::warn!(user_id, friend_id, error = %e, "Unread clear failed");
                }
            },
            room_msg => {
                self.rooms.dispatch(
                    conn,
                    &user_name,
                    user_id,
                    room_msg,
                    &self.outbox,
                    &self.actions,
                );
            },
        }
    }

    fn handle_authorize(&mut self, socket: SocketId, raw: &Value) {
        let sessdata = raw.get("sessdata").and_then(Value::as_u64).unwrap_or(0) as u32;
        match self.auth.authorize(sessdata) {
            Ok((user_id, user_name)) => {
                self.next_conn += 1;
                let conn = self.next_conn;
                self.outbox.bind_conn(conn, socket);
                self.user_conns.entry(user_id).or_default().push(conn);
                self.sessions.insert(
                    socket,
                    Session {
                        conn,
                        user_id,
                        user_name: user_name.clone(),
                    },
                );
                tracing::info!(socket, conn, user_id, "Session authorized");
                self.outbox.send_socket(
                    socket,
                    &ServerMessage::AuthorizeRes {
                        success: true,
                        id: Some(user_id),
                        user_name: Some(user_name),
                    },
                );
            },
            Err(e) => {
                tracing::debug!(socket, error = %e, "Authorization rejected");
                self.outbox.send_socket(
                    socket,
                    &ServerMessage::AuthorizeRes {
                        success: false,
                        id: None,
                        user_name: None,
                    },
                );
            },
        }
    }

    /// Private-message path: stamp, store, count, echo, fan out.
    fn handle_whisper(
        &mut self,
        socket: SocketId,
        sender_id: i64,
        sender_name: &str,
        receiver_id: i64,
        mut message: Value,
    ) {
        let timestamp = ChatHistory::timestamp_now();
        if let Some(obj) = message.as_object_mut() {
            obj.insert("user_name".into(), sender_name.into());
            obj.insert("user_id".into(), sender_id.into());
            obj.insert("timestamp".into(), timestamp.into());
        }

        self.chat
            .new_chat_message(sender_id, receiver_id, timestamp, message.to_string());
        self.auth.unread_add(receiver_id, sender_id);

        let msg = ServerMessage::WhisperMessage {
            receiver_id,
            message,
        };
        self.outbox.send_socket(socket, &msg);
        if let Some(conns) = self.user_conns.get(&receiver_id) {
            for &conn in conns {
                self.outbox.send(conn, &msg);
            }
        }
    }

    fn handle_close(&mut self, socket: SocketId) {
        if let Some(session) = self.sessions.remove(&socket) {
            self.rooms
                .handle_close(session.conn, session.user_id, &self.outbox);
            self.outbox.unbind_conn(session.conn);
            if let Some(conns) = self.user_conns.get_mut(&session.user_id) {
                conns.retain(|&c| c != session.conn);
                if conns.is_empty() {
                    self.user_conns.remove(&session.user_id);
                }
            }
            tracing::info!(socket, conn = session.conn, "Session closed");
        }
        self.outbox.unregister_socket(socket);
    }
}
