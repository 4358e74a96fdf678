use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which kind of room a client asked for. Used in `CREATE_ROOM` payloads,
/// room-list entries, and the per-variant game dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    Chat,
    Uno,
    Splendor,
    Gomoku,
}

impl RoomType {
    /// Wire-format string used in room lists and create requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "CHAT",
            Self::Uno => "UNO",
            Self::Splendor => "SPLENDOR",
            Self::Gomoku => "GOMOKU",
        }
    }

    /// Parse from wire-format string. Returns `None` for unknown kinds.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "CHAT" => Some(Self::Chat),
            "UNO" => Some(Self::Uno),
            "SPLENDOR" => Some(Self::Splendor),
            "GOMOKU" => Some(Self::Gomoku),
            _ => None,
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a `ROOM_MEMBERS_INFO` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub name: String,
    pub id: i64,
    pub prepared: bool,
    pub offline: bool,
}

/// One row of a `ROOM_LIST` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: String,
    pub id: u32,
    pub creator: String,
    pub num_of_people: usize,
    #[serde(rename = "type")]
    pub kind: RoomType,
}

/// Every inbound frame is a JSON object tagged by `message_type`.
///
/// The hub peeks at the tag first (the authentication gate needs to know
/// whether a frame is `AUTHORIZE` before anything else), then deserializes
/// the full payload into this enum.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "message_type")]
pub enum ClientMessage {
    #[serde(rename = "AUTHORIZE")]
    Authorize { sessdata: u32 },
    #[serde(rename = "WHISPER_MESSAGE")]
    WhisperMessage { receiver_id: i64, message: Value },
    #[serde(rename = "READ_WHISPER_MESSAGES")]
    ReadWhisperMessages { friend_id: i64 },
    #[serde(rename = "CREATE_ROOM")]
    CreateRoom {
        room_id: u32,
        room_type: RoomType,
        room_name: String,
        #[serde(default)]
        password: String,
    },
    #[serde(rename = "GET_ROOM_LIST")]
    GetRoomList,
    #[serde(rename = "JOIN_ROOM")]
    JoinRoom {
        room_id: u32,
        #[serde(default)]
        password: String,
    },
    #[serde(rename = "CHAT_MESSAGE")]
    ChatMessage { message: Value },
    #[serde(rename = "GAME_PREPARE")]
    GamePrepare { prepare: bool },

    #[serde(rename = "UNO_PLAY")]
    UnoPlay { card: u8, specified_color: u8 },
    #[serde(rename = "UNO_DRAW_ONE")]
    UnoDrawOne,
    #[serde(rename = "UNO_SKIP_AFTER_DRAWING_ONE")]
    UnoSkipAfterDrawingOne,
    #[serde(rename = "UNO_SAY_UNO")]
    UnoSayUno,
    #[serde(rename = "UNO_SUSPECT")]
    UnoSuspect,
    #[serde(rename = "UNO_DISSUSPECT")]
    UnoDissuspect,

    #[serde(rename = "SPLENDOR_TAKE_2")]
    SplendorTake2 { mine: u8 },
    #[serde(rename = "SPLENDOR_TAKE_3")]
    SplendorTake3 { mines: [u8; 3] },
    #[serde(rename = "SPLENDOR_BUY_COUPON")]
    SplendorBuyCoupon { coupon_idx: u32 },
    #[serde(rename = "SPLENDOR_RESERVE_COUPON")]
    SplendorReserveCoupon { coupon_idx: u32 },
    #[serde(rename = "SPLENDOR_BUY_RESERVED_COUPON")]
    SplendorBuyReservedCoupon { coupon_idx: u32 },
    #[serde(rename = "SPLENDOR_RETURN_MINE")]
    SplendorReturnMine { mine: u8 },

    #[serde(rename = "GOMOKU_DROP")]
    GomokuDrop { x: i32, y: i32 },
}

impl ClientMessage {
    /// Read the `message_type` tag without committing to a full parse.
    pub fn peek_type(raw: &Value) -> Option<&str> {
        raw.get("message_type")?.as_str()
    }
}

/// Every outbound frame, tagged by `message_type` on the wire.
///
/// Game snapshots are carried as pre-assembled `Value`s (the room layer
/// personalizes them per receiver); everything with a fixed shape is typed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "message_type")]
pub enum ServerMessage {
    #[serde(rename = "AUTHORIZE_RES")]
    AuthorizeRes {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },
    #[serde(rename = "PLEASE_LOG_IN")]
    PleaseLogIn,
    #[serde(rename = "ERROR")]
    Error { info: String },

    #[serde(rename = "CREATE_ROOM_RES")]
    CreateRoomRes {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        info: Option<String>,
    },
    #[serde(rename = "JOIN_ROOM_RES")]
    JoinRoomRes {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        info: Option<String>,
    },
    #[serde(rename = "ROOM_LIST")]
    RoomList { room_list: Vec<RoomSummary> },
    #[serde(rename = "ROOM_MEMBERS_INFO")]
    RoomMembersInfo { members: Vec<MemberInfo> },
    #[serde(rename = "NEW_MEMBER")]
    NewMember { user_name: String },
    #[serde(rename = "MEMBER_LEAVES")]
    MemberLeaves { user_name: String },
    #[serde(rename = "CHAT_MESSAGE")]
    ChatMessage { message: Value },
    #[serde(rename = "WHISPER_MESSAGE")]
    WhisperMessage { receiver_id: i64, message: Value },

    #[serde(rename = "UNO_START")]
    UnoStart,
    #[serde(rename = "UNO_GAME_INFO")]
    UnoGameInfo {
        #[serde(flatten)]
        info: Value,
    },
    #[serde(rename = "UNO_CARDS_IN_HAND")]
    UnoCardsInHand { cards: Vec<u8> },
    #[serde(rename = "UNO_LAST_CARD")]
    UnoLastCard { last_card: u8 },
    #[serde(rename = "UNO_BROADCAST")]
    UnoBroadcast {
        #[serde(flatten)]
        body: Value,
    },
    #[serde(rename = "UNO_GAMEOVER")]
    UnoGameover { winner: String, result: Value },
    #[serde(rename = "UNO_SUSPECT_CARDS")]
    UnoSuspectCards { cards: Vec<u8> },
    #[serde(rename = "UNO_DRAW_ONE_RES")]
    UnoDrawOneRes { success: bool, card: u8 },

    #[serde(rename = "SPLENDOR_START")]
    SplendorStart,
    #[serde(rename = "SPLENDOR_GAME_INFO")]
    SplendorGameInfo { info: Value },
    #[serde(rename = "SPLENDOR_GAME_OVER")]
    SplendorGameOver {
        info: Value,
        winner_id: i64,
        winner_name: String,
    },
    #[serde(rename = "SPLENDOR_BROADCAST")]
    SplendorBroadcast {
        #[serde(flatten)]
        body: Value,
    },

    #[serde(rename = "GOMOKU_START")]
    GomokuStart,
    #[serde(rename = "GOMOKU_GAME_INFO")]
    GomokuGameInfo {
        #[serde(flatten)]
        info: Value,
    },
    #[serde(rename = "GOMOKU_GAME_OVER")]
    GomokuGameOver { winner: String },
    #[serde(rename = "GOMOKU_BROADCAST")]
    GomokuBroadcast {
        #[serde(flatten)]
        body: Value,
    },
}

impl ServerMessage {
    /// Serialize for the wire. Message shapes are all JSON-representable,
    /// so this cannot fail for any value constructed by the server.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).expect("server message serialization must succeed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn room_type_wire_roundtrip() {
        for kind in [
            RoomType::Chat,
            RoomType::Uno,
            RoomType::Splendor,
            RoomType::Gomoku,
        ] {
            let s = kind.as_str();
            assert_eq!(RoomType::from_str_opt(s), Some(kind));
            let j = serde_json::to_string(&kind).unwrap();
            assert_eq!(j, format!("\"{s}\""));
            let back: RoomType = serde_json::from_str(&j).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn client_message_tags() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"message_type": "AUTHORIZE", "sessdata": 77})).unwrap();
        assert!(matches!(msg, ClientMessage::Authorize { sessdata: 77 }));

        let msg: ClientMessage = serde_json::from_value(json!({
            "message_type": "CREATE_ROOM",
            "room_id": 5,
            "room_type": "UNO",
            "room_name": "table one",
        }))
        .unwrap();
        match msg {
            ClientMessage::CreateRoom {
                room_id,
                room_type,
                password,
                ..
            } => {
                assert_eq!(room_id, 5);
                assert_eq!(room_type, RoomType::Uno);
                assert!(password.is_empty());
            },
            other => panic!("unexpected parse: {other:?}"),
        }

        let msg: ClientMessage = serde_json::from_value(json!({
            "message_type": "SPLENDOR_TAKE_3",
            "mines": [0, 2, 4],
        }))
        .unwrap();
        assert!(matches!(msg, ClientMessage::SplendorTake3 { mines: [0, 2, 4] }));
    }

    #[test]
    fn unknown_message_type_is_a_parse_error() {
        let err = serde_json::from_value::<ClientMessage>(json!({
            "message_type": "TELEPORT",
        }));
        assert!(err.is_err());
    }

    #[test]
    fn peek_type_reads_tag() {
        let raw = json!({"message_type": "GET_ROOM_LIST"});
        assert_eq!(ClientMessage::peek_type(&raw), Some("GET_ROOM_LIST"));
        assert_eq!(ClientMessage::peek_type(&json!({"x": 1})), None);
    }

    #[test]
    fn server_message_wire_shape() {
        let msg = ServerMessage::AuthorizeRes {
            success: true,
            id: Some(3),
            user_name: Some("alice".into()),
        };
        let v: Value = serde_json::from_str(&msg.to_wire()).unwrap();
        assert_eq!(v["message_type"], "AUTHORIZE_RES");
        assert_eq!(v["id"], 3);

        let msg = ServerMessage::AuthorizeRes {
            success: false,
            id: None,
            user_name: None,
        };
        let v: Value = serde_json::from_str(&msg.to_wire()).unwrap();
        assert_eq!(v["success"], false);
        assert!(v.get("id").is_none());
    }

    #[test]
    fn flattened_game_info_stays_flat() {
        let msg = ServerMessage::UnoGameInfo {
            info: json!({"last_card": 3, "next_player": "bob"}),
        };
        let v: Value = serde_json::from_str(&msg.to_wire()).unwrap();
        assert_eq!(v["message_type"], "UNO_GAME_INFO");
        assert_eq!(v["last_card"], 3);
        assert_eq!(v["next_player"], "bob");
    }

    #[test]
    fn room_summary_uses_type_key() {
        let summary = RoomSummary {
            name: "lobby".into(),
            id: 9,
            creator: "alice".into(),
            num_of_people: 2,
            kind: RoomType::Gomoku,
        };
        let v = serde_json::to_value(&summary).unwrap();
        assert_eq!(v["type"], "GOMOKU");
        assert_eq!(v["num_of_people"], 2);
    }
}
