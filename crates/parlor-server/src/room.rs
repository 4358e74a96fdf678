//! A membership-scoped channel with an optional attached game engine.
//!
//! One struct handles every room kind; the game-specific message streams
//! dispatch over the tagged `GameState` variant. All methods run on the
//! hub worker, so nothing here needs a lock.

use std::collections::BTreeMap;

use rand::Rng;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use parlor_core::{ClientMessage, MemberInfo, RoomType, ServerMessage};
use parlor_uno::{Card, CardColor, Uno};

use crate::hub::{Action, ConnId, Outbox};

/// One member's seat in the room, keyed by connection.
#[derive(Debug, Clone)]
pub struct Membership {
    pub user_name: String,
    pub user_id: i64,
    /// Socket closed while a game was running; the seat is held open.
    pub offline: bool,
    pub prepared: bool,
}

/// Gomoku seat assignment. `user_id == 0` is the built-in opponent.
#[derive(Debug, Clone, Copy)]
struct Seat {
    user_id: i64,
    is_black: bool,
}

struct GomokuTable {
    game: parlor_gomoku::Gomoku,
    seats: [Seat; 2],
}

enum GameState {
    None,
    Uno(Uno),
    Splendor(parlor_splendor::Splendor),
    Gomoku(GomokuTable),
}

pub struct Room {
    pub id: u32,
    pub kind: RoomType,
    pub creator_name: String,
    pub creator_id: i64,
    pub display_name: String,
    password: String,
    members: BTreeMap<ConnId, Membership>,
    pub is_game_on: bool,
    game: GameState,
}

/// Broadcast policy: every member whose socket is still up.
fn broadcast_to(members: &BTreeMap<ConnId, Membership>, outbox: &Outbox, msg: &ServerMessage) {
    for (&conn, member) in members {
        if !member.offline {
            outbox.send(conn, msg);
        }
    }
}

impl Room {
    pub fn new(
        id: u32,
        kind: RoomType,
        creator_name: String,
        creator_id: i64,
        display_name: String,
        password: String,
    ) -> Self {
        Self {
            id,
            kind,
            creator_name,
            creator_id,
            display_name,
            password,
            members: BTreeMap::new(),
            is_game_on: false,
            game: GameState::None,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, conn: ConnId) -> Option<&Membership> {
        self.members.get(&conn)
    }

    pub fn member_user_ids(&self) -> Vec<i64> {
        self.members.values().map(|m| m.user_id).collect()
    }

    pub fn no_one_online(&self) -> bool {
        self.members.values().all(|m| m.offline)
    }

    fn user_name_of(&self, user_id: i64) -> Option<&str> {
        self.members
            .values()
            .find(|m| m.user_id == user_id)
            .map(|m| m.user_name.as_str())
    }

    fn members_info(&self) -> Vec<MemberInfo> {
        self.members
            .values()
            .map(|m| MemberInfo {
                name: m.user_name.clone(),
                id: m.user_id,
                prepared: m.prepared,
                offline: m.offline,
            })
            .collect()
    }

    pub fn broadcast_members(&self, outbox: &Outbox) {
        broadcast_to(
            &self.members,
            outbox,
            &ServerMessage::RoomMembersInfo {
                members: self.members_info(),
            },
        );
    }

    /// Admit or re-admit a user. The caller has already established that
    /// the user is not bound to a different room.
    pub fn join(
        &mut self,
        conn: ConnId,
        user_name: &str,
        user_id: i64,
        password: &str,
        outbox: &Outbox,
    ) -> Result<(), &'static str> {
        let existing = self
            .members
            .iter()
            .find(|(_, m)| m.user_name == user_name)
            .map(|(&c, m)| (c, m.offline));

        if self.is_game_on && existing.is_none() {
            return Err("GAME_ON");
        }
        if !self.password.is_empty() && password != self.password {
            return Err("BAD_PASSWORD");
        }

        match existing {
            Some((_, false)) => Err("ALREADY_IN_ROOM"),
            Some((old_conn, true)) => {
                self.members.remove(&old_conn);
                self.members.insert(
                    conn,
                    Membership {
                        user_name: user_name.to_string(),
                        user_id,
                        offline: false,
                        prepared: false,
                    },
                );
                tracing::info!(room_id = self.id, user_id, "Member reconnected");
                self.broadcast_members(outbox);
                if self.is_game_on {
                    self.send_snapshot_to(conn, user_name, user_id, outbox);
                }
                Ok(())
            },
            None => {
                self.members.insert(
                    conn,
                    Membership {
                        user_name: user_name.to_string(),
                        user_id,
                        offline: false,
                        prepared: false,
                    },
                );
                broadcast_to(
                    &self.members,
                    outbox,
                    &ServerMessage::NewMember {
                        user_name: user_name.to_string(),
                    },
                );
                self.broadcast_members(outbox);
                Ok(())
            },
        }
    }

    /// Relay a chat line, stamped with the sender's identity.
    pub fn chat(&self, conn: ConnId, mut message: Value, outbox: &Outbox) {
        let Some(member) = self.members.get(&conn) else {
            return;
        };
        if let Some(obj) = message.as_object_mut() {
            obj.insert("user_name".into(), member.user_name.clone().into());
            obj.insert("user_id".into(), member.user_id.into());
        }
        broadcast_to(
            &self.members,
            outbox,
            &ServerMessage::ChatMessage { message },
        );
    }

    /// Flip a member's prepare flag; when the last one flips, the room's
    /// game kind decides whether a game starts.
    pub fn prepare(
        &mut self,
        conn: ConnId,
        prepared: bool,
        outbox: &Outbox,
    ) {
        let Some(member) = self.members.get_mut(&conn) else {
            return;
        };
        member.prepared = prepared;
        self.broadcast_members(outbox);

        if !self.is_game_on
            && !self.members.is_empty()
            && self.members.values().all(|m| m.prepared)
        {
            self.on_everyone_prepared(outbox);
        }
    }

    fn clear_prepared(&mut self) {
        for member in self.members.values_mut() {
            member.prepared = false;
        }
    }

    fn on_everyone_prepared(&mut self, outbox: &Outbox) {
        match self.kind {
            RoomType::Chat => {},
            RoomType::Uno => self.start_uno(outbox),
            RoomType::Splendor => self.start_splendor(outbox),
            RoomType::Gomoku => self.start_gomoku(outbox),
        }
    }

    fn start_uno(&mut self, outbox: &Outbox) {
        let n = self.members.len();
        if n < 3 || n > 10 {
            let kind = if n < 3 {
                "LESS_THAN_3_PEOPLE"
            } else {
                "MORE_THAN_10_PEOPLE"
            };
            broadcast_to(
                &self.members,
                outbox,
                &ServerMessage::UnoBroadcast {
                    body: json!({ "type": kind }),
                },
            );
            return;
        }

        self.is_game_on = true;
        let names = self
            .members
            .values()
            .map(|m| m.user_name.clone())
            .collect();
        self.game = GameState::Uno(Uno::new(names));
        tracing::info!(room_id = self.id, players = n, "UNO game started");

        broadcast_to(&self.members, outbox, &ServerMessage::UnoStart);
        self.clear_prepared();
        self.send_uno_hands(outbox);
        self.broadcast_uno_info(outbox);
    }

    fn start_splendor(&mut self, outbox: &Outbox) {
        let n = self.members.len();
        if n < 2 || n > 4 {
            let kind = if n < 2 {
                "LESS_THAN_2_PEOPLE"
            } else {
                "MORE_THAN_4_PEOPLE"
            };
            broadcast_to(
                &self.members,
                outbox,
                &ServerMessage::SplendorBroadcast {
                    body: json!({ "type": kind }),
                },
            );
            return;
        }

        self.is_game_on = true;
        let ids = self.members.values().map(|m| m.user_id).collect();
        self.game = GameState::Splendor(parlor_splendor::Splendor::new(ids));
        tracing::info!(room_id = self.id, players = n, "Splendor game started");

        broadcast_to(&self.members, outbox, &ServerMessage::SplendorStart);
        self.clear_prepared();
        self.send_splendor_info(outbox);
        self.broadcast_members(outbox);
    }

    fn start_gomoku(&mut self, outbox: &Outbox) {
        let n = self.members.len();
        if n > 2 {
            broadcast_to(
                &self.members,
                outbox,
                &ServerMessage::GomokuBroadcast {
                    body: json!({ "type": "MORE_THAN_2_PEOPLE" }),
                },
            );
            return;
        }

        let mut game = parlor_gomoku::Gomoku::new();
        let ids: Vec<i64> = self.members.values().map(|m| m.user_id).collect();
        let seats = if ids.len() == 1 {
            game.enable_ai(true);
            broadcast_to(
                &self.members,
                outbox,
                &ServerMessage::GomokuBroadcast {
                    body: json!({ "type": "PLAY_WITH_ALGORITHM" }),
                },
            );
            [
                Seat {
                    user_id: ids[0],
                    is_black: true,
                },
                Seat {
                    user_id: 0,
                    is_black: false,
                },
            ]
        } else {
            // The white seat comes first; who sits where is a coin toss.
            let (white, black) = if rand::rng().random_bool(0.5) {
                (ids[0], ids[1])
            } else {
                (ids[1], ids[0])
            };
            [
                Seat {
                    user_id: white,
                    is_black: false,
                },
                Seat {
                    user_id: black,
                    is_black: true,
                },
            ]
        };

        self.is_game_on = true;
        self.game = GameState::Gomoku(GomokuTable { game, seats });
        tracing::info!(room_id = self.id, players = n, "Gomoku game started");

        broadcast_to(&self.members, outbox, &ServerMessage::GomokuStart);
        self.clear_prepared();
        self.broadcast_gomoku_info(outbox);
        self.broadcast_members(outbox);
    }

    /// A member's socket closed. During a game the seat goes offline and
    /// waits; otherwise the member is removed. Returns true when the
    /// membership was actually removed.
    pub fn close(&mut self, conn: ConnId, outbox: &Outbox) -> bool {
        let Some(member) = self.members.get_mut(&conn) else {
            return false;
        };

        if self.is_game_on {
            member.offline = true;
            tracing::info!(
                room_id = self.id,
                user_id = member.user_id,
                "Member went offline mid-game, seat held"
            );
            self.broadcast_members(outbox);
            return false;
        }

        let user_name = member.user_name.clone();
        self.members.remove(&conn);
        broadcast_to(
            &self.members,
            outbox,
            &ServerMessage::MemberLeaves { user_name },
        );
        self.broadcast_members(outbox);
        true
    }

    /// Re-send the running game's snapshot to one (reconnected) member.
    fn send_snapshot_to(&self, conn: ConnId, user_name: &str, user_id: i64, outbox: &Outbox) {
        match &self.game {
            GameState::None => {},
            GameState::Uno(game) => {
                if let Some(hand) = game.hand_of(user_name) {
                    outbox.send(
                        conn,
                        &ServerMessage::UnoCardsInHand {
                            cards: hand.iter().map(|c| c.code()).collect(),
                        },
                    );
                }
                outbox.send(
                    conn,
                    &ServerMessage::UnoGameInfo {
                        info: Self::uno_info_value(game),
                    },
                );
            },
            GameState::Splendor(game) => {
                let mut info = self.splendor_info_value(game);
                info["player_info"] = game.player_info(user_id).unwrap_or(Value::Null);
                outbox.send(conn, &ServerMessage::SplendorGameInfo { info });
            },
            GameState::Gomoku(table) => {
                outbox.send(
                    conn,
                    &ServerMessage::GomokuGameInfo {
                        info: self.gomoku_info_value(table),
                    },
                );
            },
        }
    }

    // ================================================================
    // UNO
    // ================================================================

    fn uno_info_value(game: &Uno) -> Value {
        json!({
            "last_card": game.last_card().code(),
            "next_player": game.next_player(),
            "specified_color": game.specified_color().index(),
            "direction": game.direction(),
            "players": game
                .players()
                .iter()
                .map(|p| json!({ "name": p.user_name(), "count": p.hand().len() }))
                .collect::<Vec<_>>(),
        })
    }

    fn uno_result_value(game: &Uno) -> Value {
        json!({
            "last_card": game.last_card().code(),
            "players": game
                .players()
                .iter()
                .map(|p| json!({
                    "name": p.user_name(),
                    "cards": p.hand().iter().map(|c| c.code()).collect::<Vec<_>>(),
                    "count": p.hand().len(),
                }))
                .collect::<Vec<_>>(),
        })
    }

    fn send_uno_hands(&self, outbox: &Outbox) {
        let GameState::Uno(game) = &self.game else {
            return;
        };
        for (&conn, member) in &self.members {
            if let Some(hand) = game.hand_of(&member.user_name) {
                outbox.send(
                    conn,
                    &ServerMessage::UnoCardsInHand {
                        cards: hand.iter().map(|c| c.code()).collect(),
                    },
                );
            }
        }
    }

    fn broadcast_uno_info(&self, outbox: &Outbox) {
        let GameState::Uno(game) = &self.game else {
            return;
        };
        broadcast_to(
            &self.members,
            outbox,
            &ServerMessage::UnoGameInfo {
                info: Self::uno_info_value(game),
            },
        );
    }

    fn handle_uno(
        &mut self,
        conn: ConnId,
        user_name: &str,
        msg: &ClientMessage,
        outbox: &Outbox,
    ) {
        let GameState::Uno(game) = &mut self.game else {
            return;
        };

        match *msg {
            ClientMessage::UnoPlay {
                card,
                specified_color,
            } => {
                let Some(card_value) = Card::from_code(card) else {
                    return;
                };
                let chosen = CardColor::from_index(specified_color)
                    .unwrap_or(CardColor::Black);
                let Some(outcome) = game.play(user_name, card_value, chosen) else {
                    return;
                };

                let next_player = game.next_player().to_string();
                let winner = game.check_winner().map(str::to_string);
                let result = winner.as_ref().map(|_| Self::uno_result_value(game));

                self.send_uno_hands(outbox);
                self.broadcast_uno_info(outbox);
                if card == 78 {
                    broadcast_to(
                        &self.members,
                        outbox,
                        &ServerMessage::UnoBroadcast {
                            body: json!({
                                "user_name": user_name,
                                "object": next_player,
                                "type": "WILD_DRAW_4",
                            }),
                        },
                    );
                }
                if outcome.punished {
                    broadcast_to(
                        &self.members,
                        outbox,
                        &ServerMessage::UnoBroadcast {
                            body: json!({ "user_name": user_name, "type": "DIDNT_SAY_UNO" }),
                        },
                    );
                }
                broadcast_to(
                    &self.members,
                    outbox,
                    &ServerMessage::UnoLastCard { last_card: card },
                );

                if let (Some(winner), Some(result)) = (winner, result) {
                    broadcast_to(
                        &self.members,
                        outbox,
                        &ServerMessage::UnoGameover { winner, result },
                    );
                    self.is_game_on = false;
                    self.game = GameState::None;
                    self.broadcast_members(outbox);
                }
            },

            ClientMessage::UnoDrawOne => {
                let Some(outcome) = game.draw_one(user_name) else {
                    return;
                };
                self.broadcast_uno_info(outbox);
                outbox.send(
                    conn,
                    &ServerMessage::UnoDrawOneRes {
                        success: true,
                        card: outcome.card.code(),
                    },
                );
                if outcome.punished {
                    broadcast_to(
                        &self.members,
                        outbox,
                        &ServerMessage::UnoBroadcast {
                            body: json!({
                                "user_name": user_name,
                                "type": "SAID_UNO_BUT_DIDNT_PLAY",
                            }),
                        },
                    );
                }
            },

            ClientMessage::UnoSkipAfterDrawingOne => {
                if game.skip_after_drawing_one(user_name) {
                    self.broadcast_uno_info(outbox);
                    self.send_uno_hands(outbox);
                }
            },

            ClientMessage::UnoSayUno => {
                let said = game.say_uno(user_name);
                if !said {
                    self.send_uno_hands(outbox);
                    self.broadcast_uno_info(outbox);
                }
                broadcast_to(
                    &self.members,
                    outbox,
                    &ServerMessage::UnoBroadcast {
                        body: json!({
                            "user_name": user_name,
                            "type": if said { "SAY_UNO" } else { "MISSAY_UNO" },
                        }),
                    },
                );
            },

            ClientMessage::UnoSuspect => {
                let Some(outcome) = game.suspect(user_name) else {
                    return;
                };
                outbox.send(
                    conn,
                    &ServerMessage::UnoSuspectCards {
                        cards: outcome.accused_cards.iter().map(|c| c.code()).collect(),
                    },
                );
                broadcast_to(
                    &self.members,
                    outbox,
                    &ServerMessage::UnoBroadcast {
                        body: json!({
                            "user_name": user_name,
                            "suspect": outcome.accused,
                            "type": "SUSPECT",
                            "success": outcome.success,
                        }),
                    },
                );
                self.send_uno_hands(outbox);
                self.broadcast_uno_info(outbox);
            },

            ClientMessage::UnoDissuspect => {
                if game.dissuspect(user_name) {
                    self.send_uno_hands(outbox);
                    self.broadcast_uno_info(outbox);
                }
            },

            _ => {},
        }
    }

    // ================================================================
    // Splendor
    // ================================================================

    /// The shared table with member display names attached.
    fn splendor_info_value(&self, game: &parlor_splendor::Splendor) -> Value {
        let mut info = game.game_info();
        if let Some(players) = info["players"].as_array_mut() {
            for p in players {
                let id = p["id"].as_i64().unwrap_or(0);
                p["name"] = self.user_name_of(id).unwrap_or("").into();
            }
        }
        info
    }

    fn send_splendor_info(&self, outbox: &Outbox) {
        let GameState::Splendor(game) = &self.game else {
            return;
        };
        let info = self.splendor_info_value(game);
        for (&conn, member) in &self.members {
            let mut personalized = info.clone();
            personalized["player_info"] =
                game.player_info(member.user_id).unwrap_or(Value::Null);
            outbox.send(conn, &ServerMessage::SplendorGameInfo { info: personalized });
        }
    }

    fn send_splendor_result(&self, winner: i64, outbox: &Outbox) {
        let GameState::Splendor(game) = &self.game else {
            return;
        };
        let info = self.splendor_info_value(game);
        let winner_name = self.user_name_of(winner).unwrap_or("").to_string();
        for (&conn, member) in &self.members {
            let mut personalized = info.clone();
            personalized["player_info"] =
                game.player_info(member.user_id).unwrap_or(Value::Null);
            outbox.send(
                conn,
                &ServerMessage::SplendorGameOver {
                    info: personalized,
                    winner_id: winner,
                    winner_name: winner_name.clone(),
                },
            );
        }
    }

    fn handle_splendor(&mut self, user_id: i64, msg: &ClientMessage, outbox: &Outbox) {
        use parlor_splendor::Mine;

        let GameState::Splendor(game) = &mut self.game else {
            return;
        };

        let (changed, check_win) = match *msg {
            ClientMessage::SplendorTake2 { mine } => {
                let Some(mine) = Mine::from_index(mine) else {
                    return;
                };
                (game.take_2(mine, user_id), false)
            },
            ClientMessage::SplendorTake3 { mines } => {
                let (Some(a), Some(b), Some(c)) = (
                    Mine::from_index(mines[0]),
                    Mine::from_index(mines[1]),
                    Mine::from_index(mines[2]),
                ) else {
                    return;
                };
                (game.take_3([a, b, c], user_id), false)
            },
            ClientMessage::SplendorBuyCoupon { coupon_idx } => {
                (game.buy(coupon_idx, user_id), true)
            },
            ClientMessage::SplendorReserveCoupon { coupon_idx } => {
                (game.reserve(coupon_idx, user_id), false)
            },
            ClientMessage::SplendorBuyReservedCoupon { coupon_idx } => {
                (game.buy_reserved(coupon_idx, user_id), true)
            },
            ClientMessage::SplendorReturnMine { mine } => {
                let Some(mine) = Mine::from_index(mine) else {
                    return;
                };
                (game.return_mine(mine, user_id), false)
            },
            _ => return,
        };

        if !changed {
            return;
        }
        let winner = if check_win { game.check_winner() } else { None };

        self.send_splendor_info(outbox);
        if let Some(winner) = winner {
            self.send_splendor_result(winner, outbox);
            self.is_game_on = false;
            self.game = GameState::None;
            self.broadcast_members(outbox);
        }
    }

    // ================================================================
    // Gomoku
    // ================================================================

    fn gomoku_info_value(&self, table: &GomokuTable) -> Value {
        let mut info = table.game.snapshot();
        let seat_value = |seat: &Seat| {
            if seat.user_id == 0 {
                json!({ "id": "robot", "name": "AlphaGomoku", "is_black": seat.is_black })
            } else {
                json!({
                    "id": seat.user_id,
                    "name": self.user_name_of(seat.user_id).unwrap_or(""),
                    "is_black": seat.is_black,
                })
            }
        };
        info["players"] = json!([seat_value(&table.seats[0]), seat_value(&table.seats[1])]);
        info
    }

    fn broadcast_gomoku_info(&self, outbox: &Outbox) {
        let GameState::Gomoku(table) = &self.game else {
            return;
        };
        broadcast_to(
            &self.members,
            outbox,
            &ServerMessage::GomokuGameInfo {
                info: self.gomoku_info_value(table),
            },
        );
    }

    /// Settle a finished board: broadcast the verdict and free the room.
    fn finish_gomoku(&mut self, outbox: &Outbox) {
        use parlor_gomoku::Status;

        let GameState::Gomoku(table) = &self.game else {
            return;
        };
        let winner = match table.game.status() {
            Status::NotEnd => return,
            Status::BlackWin => "BLACK",
            Status::WhiteWin => "WHITE",
            Status::Tied => "TIED",
        };
        broadcast_to(
            &self.members,
            outbox,
            &ServerMessage::GomokuGameOver {
                winner: winner.to_string(),
            },
        );
        self.is_game_on = false;
        self.game = GameState::None;
    }

    fn handle_gomoku_drop(
        &mut self,
        user_id: i64,
        x: i32,
        y: i32,
        outbox: &Outbox,
        actions: &mpsc::UnboundedSender<Action>,
    ) {
        let room_id = self.id;
        let GameState::Gomoku(table) = &mut self.game else {
            return;
        };
        let Some(seat) = table.seats.iter().find(|s| s.user_id == user_id).copied() else {
            return;
        };

        if !table.game.drop_piece(y, x, seat.is_black) {
            return;
        }
        self.broadcast_gomoku_info(outbox);

        let GameState::Gomoku(table) = &mut self.game else {
            return;
        };
        table.game.update();
        if table.game.wants_ai_move() {
            // The search runs off the worker; its move comes back through
            // the action queue so this thread stays the only writer.
            table.game.set_ai_thinking(true);
            let snapshot = table.game.clone();
            let actions = actions.clone();
            tokio::task::spawn_blocking(move || {
                if let Some((row, col)) = parlor_gomoku::ai::best_move(&snapshot) {
                    let _ = actions.send(Action::AiMove { room_id, row, col });
                }
            });
            return;
        }

        self.broadcast_gomoku_info(outbox);
        self.finish_gomoku(outbox);
    }

    /// The built-in opponent's move, posted back by the search job.
    pub fn handle_ai_move(&mut self, row: usize, col: usize, outbox: &Outbox) {
        let GameState::Gomoku(table) = &mut self.game else {
            return;
        };
        table.game.set_ai_thinking(false);
        if !table.game.drop_piece(row as i32, col as i32, false) {
            tracing::warn!(room_id = self.id, row, col, "Computed move no longer legal");
            return;
        }
        table.game.update();
        self.broadcast_gomoku_info(outbox);
        self.finish_gomoku(outbox);
    }

    // ================================================================
    // Dispatch
    // ================================================================

    pub fn handle_game_message(
        &mut self,
        conn: ConnId,
        user_name: &str,
        user_id: i64,
        msg: &ClientMessage,
        outbox: &Outbox,
        actions: &mpsc::UnboundedSender<Action>,
    ) {
        match msg {
            ClientMessage::UnoPlay { .. }
            | ClientMessage::UnoDrawOne
            | ClientMessage::UnoSkipAfterDrawingOne
            | ClientMessage::UnoSayUno
            | ClientMessage::UnoSuspect
            | ClientMessage::UnoDissuspect => self.handle_uno(conn, user_name, msg, outbox),

            ClientMessage::SplendorTake2 { .. }
            | ClientMessage::SplendorTake3 { .. }
            | ClientMessage::SplendorBuyCoupon { .. }
            | ClientMessage::SplendorReserveCoupon { .. }
            | ClientMessage::SplendorBuyReservedCoupon { .. }
            | ClientMessage::SplendorReturnMine { .. } => {
                self.handle_splendor(user_id, msg, outbox)
            },

            ClientMessage::GomokuDrop { x, y } => {
                self.handle_gomoku_drop(user_id, *x, *y, outbox, actions)
            },

            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn outbox_with(conns: &[ConnId]) -> (Outbox, Vec<mpsc::UnboundedReceiver<String>>) {
        let mut outbox = Outbox::default();
        let mut receivers = Vec::new();
        for (i, &conn) in conns.iter().enumerate() {
            let socket = 100 + i as u64;
            let (tx, rx) = mpsc::unbounded_channel();
            outbox.register_socket(socket, tx);
            outbox.bind_conn(conn, socket);
            receivers.push(rx);
        }
        (outbox, receivers)
    }

    fn chat_room() -> Room {
        Room::new(
            1,
            RoomType::Chat,
            "alice".into(),
            1,
            "test room".into(),
            String::new(),
        )
    }

    #[test]
    fn join_rejects_wrong_password_and_duplicate_names() {
        let (outbox, _rx) = outbox_with(&[10, 11]);
        let mut room = Room::new(
            1,
            RoomType::Chat,
            "alice".into(),
            1,
            "locked".into(),
            "pw".into(),
        );

        assert_eq!(room.join(10, "alice", 1, "nope", &outbox), Err("BAD_PASSWORD"));
        assert_eq!(room.join(10, "alice", 1, "pw", &outbox), Ok(()));
        // A second live session under the same name cannot take the seat.
        assert_eq!(
            room.join(11, "alice", 1, "pw", &outbox),
            Err("ALREADY_IN_ROOM")
        );
    }

    #[test]
    fn strangers_are_locked_out_of_a_running_game() {
        let (outbox, _rx) = outbox_with(&[10, 11, 12]);
        let mut room = chat_room();
        room.join(10, "alice", 1, "", &outbox).unwrap();
        room.join(11, "bob", 2, "", &outbox).unwrap();
        room.is_game_on = true;

        assert_eq!(room.join(12, "carol", 3, "", &outbox), Err("GAME_ON"));
    }

    #[test]
    fn offline_seats_rebind_even_after_the_game_ends() {
        let (outbox, _rx) = outbox_with(&[10, 11, 20]);
        let mut room = chat_room();
        room.join(10, "alice", 1, "", &outbox).unwrap();
        room.join(11, "bob", 2, "", &outbox).unwrap();

        room.is_game_on = true;
        assert!(!room.close(10, &outbox), "mid-game close keeps the seat");
        assert!(room.member(10).unwrap().offline);

        // Game finishes while alice is away; her stale seat must still
        // accept the rejoin instead of wedging the room.
        room.is_game_on = false;
        assert_eq!(room.join(20, "alice", 1, "", &outbox), Ok(()));
        assert!(room.member(10).is_none());
        assert!(!room.member(20).unwrap().offline);
        assert_eq!(room.member_count(), 2);
    }

    #[test]
    fn lobby_close_removes_and_announces() {
        let (outbox, mut rx) = outbox_with(&[10, 11]);
        let mut room = chat_room();
        room.join(10, "alice", 1, "", &outbox).unwrap();
        room.join(11, "bob", 2, "", &outbox).unwrap();
        while rx[1].try_recv().is_ok() {}

        assert!(room.close(10, &outbox));
        assert_eq!(room.member_count(), 1);
        assert!(!room.no_one_online());

        let first: serde_json::Value =
            serde_json::from_str(&rx[1].try_recv().unwrap()).unwrap();
        assert_eq!(first["message_type"], "MEMBER_LEAVES");
        assert_eq!(first["user_name"], "alice");
    }

    #[test]
    fn offline_members_receive_no_broadcasts() {
        let (outbox, mut rx) = outbox_with(&[10, 11]);
        let mut room = chat_room();
        room.join(10, "alice", 1, "", &outbox).unwrap();
        room.join(11, "bob", 2, "", &outbox).unwrap();
        room.is_game_on = true;
        room.close(10, &outbox);
        while rx[0].try_recv().is_ok() {}
        while rx[1].try_recv().is_ok() {}

        room.chat(11, serde_json::json!({ "content": "hi" }), &outbox);
        assert!(rx[0].try_recv().is_err(), "offline seat gets nothing");
        let msg: serde_json::Value = serde_json::from_str(&rx[1].try_recv().unwrap()).unwrap();
        assert_eq!(msg["message_type"], "CHAT_MESSAGE");
    }

    #[test]
    fn chat_prepare_gate_never_starts_anything() {
        let (outbox, _rx) = outbox_with(&[10]);
        let mut room = chat_room();
        room.join(10, "alice", 1, "", &outbox).unwrap();
        room.prepare(10, true, &outbox);
        assert!(!room.is_game_on);
    }
}
