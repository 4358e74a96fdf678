//! Registry of rooms plus the process-wide `user -> room` index.
//!
//! Runs entirely on the hub worker: `CREATE_ROOM` and `GET_ROOM_LIST` are
//! handled here, `JOIN_ROOM` resolves its room from the payload, and every
//! other room-scoped message resolves the sender's current room through
//! the index. The empty-room sweep arrives as a queue action on the same
//! worker, so no locking is needed anywhere.

use std::collections::HashMap;

use tokio::sync::mpsc;

use parlor_core::{ClientMessage, RoomSummary, ServerMessage};

use crate::hub::{Action, ConnId, Outbox};
use crate::room::Room;

#[derive(Default)]
pub struct RoomManager {
    rooms: HashMap<u32, Room>,
    /// A user is in at most one room at a time.
    user_room: HashMap<i64, u32>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(&self, room_id: u32) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_of_user(&self, user_id: i64) -> Option<u32> {
        self.user_room.get(&user_id).copied()
    }

    pub fn dispatch(
        &mut self,
        conn: ConnId,
        user_name: &str,
        user_id: i64,
        msg: ClientMessage,
        outbox: &Outbox,
        actions: &mpsc::UnboundedSender<Action>,
    ) {
        match msg {
            ClientMessage::CreateRoom {
                room_id,
                room_type,
                room_name,
                password,
            } => {
                if self.rooms.contains_key(&room_id) {
                    outbox.send(
                        conn,
                        &ServerMessage::CreateRoomRes {
                            success: false,
                            info: Some(format!("Room {room_id} already exists.")),
                        },
                    );
                    return;
                }
                self.rooms.insert(
                    room_id,
                    Room::new(
                        room_id,
                        room_type,
                        user_name.to_string(),
                        user_id,
                        room_name,
                        password,
                    ),
                );
                tracing::info!(room_id, kind = %room_type, creator = user_id, "Room created");
                outbox.send(
                    conn,
                    &ServerMessage::CreateRoomRes {
                        success: true,
                        info: None,
                    },
                );
            },

            ClientMessage::GetRoomList => {
                let room_list = self
                    .rooms
                    .values()
                    .map(|room| RoomSummary {
                        name: room.display_name.clone(),
                        id: room.id,
                        creator: room.creator_name.clone(),
                        num_of_people: room.member_count(),
                        kind: room.kind,
                    })
                    .collect();
                outbox.send(conn, &ServerMessage::RoomList { room_list });
            },

            ClientMessage::JoinRoom { room_id, password } => {
                self.join(conn, user_name, user_id, room_id, &password, outbox);
            },

            other => {
                let room = self
                    .user_room
                    .get(&user_id)
                    .and_then(|room_id| self.rooms.get_mut(room_id));
                let Some(room) = room else {
                    outbox.send(
                        conn,
                        &ServerMessage::Error {
                            info: "ROOM_DONOT_EXIST".to_string(),
                        },
                    );
                    return;
                };

                match other {
                    ClientMessage::ChatMessage { message } => room.chat(conn, message, outbox),
                    ClientMessage::GamePrepare { prepare } => room.prepare(conn, prepare, outbox),
                    game_msg => {
                        room.handle_game_message(
                            conn, user_name, user_id, &game_msg, outbox, actions,
                        );
                    },
                }
            },
        }
    }

    fn join(
        &mut self,
        conn: ConnId,
        user_name: &str,
        user_id: i64,
        room_id: u32,
        password: &str,
        outbox: &Outbox,
    ) {
        if !self.rooms.contains_key(&room_id) {
            outbox.send(
                conn,
                &ServerMessage::Error {
                    info: "ROOM_DONOT_EXIST".to_string(),
                },
            );
            return;
        }
        if let Some(&current) = self.user_room.get(&user_id)
            && current != room_id
        {
            outbox.send(
                conn,
                &ServerMessage::JoinRoomRes {
                    success: false,
                    info: Some("ALREADY_IN_ROOM".to_string()),
                },
            );
            return;
        }

        let room = self.rooms.get_mut(&room_id).expect("presence checked above");
        match room.join(conn, user_name, user_id, password, outbox) {
            Ok(()) => {
                self.user_room.insert(user_id, room_id);
                outbox.send(
                    conn,
                    &ServerMessage::JoinRoomRes {
                        success: true,
                        info: None,
                    },
                );
            },
            Err(code) => {
                outbox.send(
                    conn,
                    &ServerMessage::JoinRoomRes {
                        success: false,
                        info: Some(code.to_string()),
                    },
                );
            },
        }
    }

    /// A socket bound to `user_id` closed.
    pub fn handle_close(&mut self, conn: ConnId, user_id: i64, outbox: &Outbox) {
        let Some(&room_id) = self.user_room.get(&user_id) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            self.user_room.remove(&user_id);
            return;
        };

        if room.close(conn, outbox) {
            self.user_room.remove(&user_id);
        }
        if room.no_one_online() && !room.is_game_on {
            self.destroy_room(room_id);
        }
    }

    /// The AI search finished; feed its move to the room.
    pub fn handle_ai_move(&mut self, room_id: u32, row: usize, col: usize, outbox: &Outbox) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.handle_ai_move(row, col, outbox);
        }
    }

    /// Drop rooms nobody is connected to, unless a game is holding seats.
    pub fn sweep(&mut self) -> usize {
        let doomed: Vec<u32> = self
            .rooms
            .values()
            .filter(|room| room.no_one_online() && !room.is_game_on)
            .map(|room| room.id)
            .collect();
        for room_id in &doomed {
            self.destroy_room(*room_id);
        }
        doomed.len()
    }

    fn destroy_room(&mut self, room_id: u32) {
        if let Some(room) = self.rooms.remove(&room_id) {
            for user_id in room.member_user_ids() {
                if self.user_room.get(&user_id) == Some(&room_id) {
                    self.user_room.remove(&user_id);
                }
            }
            tracing::info!(room_id, "Room destroyed");
        }
    }
}
