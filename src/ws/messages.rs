//! WebSocket message types for live games.

use serde::{Deserialize, Serialize};

use crate::engine::{Color, Game, Move};
use crate::store::GameRecord;

// ---------------------------------------------------------------------------
// Server → Client events
// ---------------------------------------------------------------------------

/// Event pushed to a connected client, tagged by `serverMessageType`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "serverMessageType", rename_all = "snake_case")]
pub enum WsEvent {
    LoadGame(LoadGamePayload),
    Notification(NotificationPayload),
    Error(ErrorPayload),
    Pong(PongPayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadGamePayload {
    pub game_id: u32,
    pub game: Game,
    /// 8×8, rank 8 first.
    pub board: Vec<Vec<Option<String>>>,
    pub turn: Color,
    pub status: String,
    pub finished: bool,
    /// Plies played; strictly increases across a game's `load_game` events.
    pub move_count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PongPayload {
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// Client → Server commands
// ---------------------------------------------------------------------------

/// Commands sent from client to server, tagged by `commandType`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "commandType", rename_all = "snake_case")]
pub enum WsCommand {
    Connect {
        #[serde(rename = "authToken")]
        auth_token: String,
    },
    MakeMove {
        #[serde(rename = "authToken")]
        auth_token: String,
        #[serde(rename = "move")]
        mv: Move,
    },
    Resign {
        #[serde(rename = "authToken")]
        auth_token: String,
    },
    Leave {
        #[serde(rename = "authToken")]
        auth_token: String,
    },
    Ping,
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

impl WsEvent {
    pub fn load_game(record: &GameRecord) -> Self {
        let game = &record.game;
        WsEvent::LoadGame(LoadGamePayload {
            game_id: record.id,
            game: game.clone(),
            board: game.board().to_codes(),
            turn: game.team_turn(),
            status: game.status().as_str().to_string(),
            finished: record.finished,
            move_count: record.move_count,
        })
    }

    pub fn notification(message: impl Into<String>) -> Self {
        WsEvent::Notification(NotificationPayload {
            message: message.into(),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        WsEvent::Error(ErrorPayload {
            error_message: message.into(),
        })
    }

    pub fn pong() -> Self {
        WsEvent::Pong(PongPayload {
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Serialize to JSON text for sending over WebSocket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"serverMessageType":"error","errorMessage":"serialization failed"}"#.to_string()
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
