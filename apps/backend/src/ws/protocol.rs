use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::domain::{Color, GameResult, SessionId};

pub const STATE_MATCHED: u16 = 1;
pub const STATE_OPPONENT_MOVED: u16 = 78;
pub const STATE_YOUR_TURN: u16 = 79;
pub const STATE_CLOCK_TICK: u16 = 80;
pub const STATE_GAME_ENDED: u16 = 99;

/// Inbound frame. Anything else on the socket is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientMsg {
    #[serde(rename = "move")]
    pub mv: String,
    #[serde(rename = "isFirstMove", default)]
    pub is_first_move: bool,
}

/// Strength metadata attached to the end-of-game message of an AI session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiMeta {
    pub rank: u32,
    pub engine: String,
}

/// Every message the server pushes to a player.
///
/// Serialized as the envelope `{message, roomID, state, data}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMsg {
    Matched {
        room_id: SessionId,
        color: Color,
        game_duration_secs: u32,
    },
    OpponentMoved {
        room_id: SessionId,
        mv: String,
    },
    YourTurn {
        room_id: SessionId,
    },
    ClockTick {
        room_id: SessionId,
        color: Color,
        remaining_secs: u32,
    },
    GameEnded {
        room_id: SessionId,
        result: GameResult,
        reason: &'static str,
        is_ai: bool,
        ai_meta: Option<AiMeta>,
    },
}

impl ServerMsg {
    pub fn state(&self) -> u16 {
        match self {
            ServerMsg::Matched { .. } => STATE_MATCHED,
            ServerMsg::OpponentMoved { .. } => STATE_OPPONENT_MOVED,
            ServerMsg::YourTurn { .. } => STATE_YOUR_TURN,
            ServerMsg::ClockTick { .. } => STATE_CLOCK_TICK,
            ServerMsg::GameEnded { .. } => STATE_GAME_ENDED,
        }
    }

    pub fn room_id(&self) -> SessionId {
        match self {
            ServerMsg::Matched { room_id, .. }
            | ServerMsg::OpponentMoved { room_id, .. }
            | ServerMsg::YourTurn { room_id }
            | ServerMsg::ClockTick { room_id, .. }
            | ServerMsg::GameEnded { room_id, .. } => *room_id,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ServerMsg::Matched { color, .. } => {
                format!("You have been matched with an opponent! You are playing as {color}")
            }
            ServerMsg::OpponentMoved { .. } => "Opponent made move".to_string(),
            ServerMsg::YourTurn { .. } => "Your turn".to_string(),
            ServerMsg::ClockTick { color, .. } => format!("Time left for {color}"),
            ServerMsg::GameEnded { .. } => "Game ended".to_string(),
        }
    }

    fn data(&self) -> Value {
        match self {
            ServerMsg::Matched {
                color,
                game_duration_secs,
                ..
            } => json!({ "color": color, "gameDurationSeconds": game_duration_secs }),
            ServerMsg::OpponentMoved { mv, .. } => json!({ "move": mv }),
            ServerMsg::YourTurn { .. } => json!({}),
            ServerMsg::ClockTick {
                color,
                remaining_secs,
                ..
            } => json!({ "remainingSeconds": remaining_secs, "color": color }),
            ServerMsg::GameEnded {
                result,
                reason,
                is_ai,
                ai_meta,
                ..
            } => json!({
                "result": result,
                "reason": reason,
                "isAI": is_ai,
                "aiMeta": ai_meta,
            }),
        }
    }
}

impl Serialize for ServerMsg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut envelope = serializer.serialize_struct("ServerMsg", 4)?;
        envelope.serialize_field("message", &self.message())?;
        envelope.serialize_field("roomID", &self.room_id())?;
        envelope.serialize_field("state", &self.state())?;
        envelope.serialize_field("data", &self.data())?;
        envelope.end()
    }
}
