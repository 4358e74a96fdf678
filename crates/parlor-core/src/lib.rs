pub mod protocol;

pub use protocol::{ClientMessage, MemberInfo, RoomSummary, RoomType, ServerMessage};
