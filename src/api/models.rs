use serde::{Deserialize, Serialize};

use crate::engine::{Color, Game, Move};
use crate::service::GameSummary;
use crate::store::GameRecord;

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub game_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    pub game_id: u32,
    pub player_color: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesQuery {
    pub from: Option<String>,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub language: String,
    pub engine: String,
    pub uptime: u64,
}

/// Serializes as `{}`.
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub username: String,
    pub auth_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub game_id: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGamesResponse {
    pub games: Vec<GameSummaryResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummaryResponse {
    pub game_id: u32,
    pub game_name: String,
    pub white_username: Option<String>,
    pub black_username: Option<String>,
    pub finished: bool,
}

impl From<GameSummary> for GameSummaryResponse {
    fn from(s: GameSummary) -> Self {
        GameSummaryResponse {
            game_id: s.id,
            game_name: s.name,
            white_username: s.white_username,
            black_username: s.black_username,
            finished: s.finished,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: u32,
    pub name: String,
    pub board: Vec<Vec<Option<String>>>,
    pub turn: Color,
    pub status: String,
    pub check: bool,
    pub white_username: Option<String>,
    pub black_username: Option<String>,
    pub finished: bool,
    pub game: Game,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesResponse {
    pub from: String,
    /// `None` when the square is empty.
    pub moves: Option<Vec<LegalMoveEntry>>,
    /// Text diagram with the destinations bracketed, seen from the piece's
    /// side. Absent when the square is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMoveEntry {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn game_to_response(record: &GameRecord) -> GameResponse {
    let game = &record.game;
    let turn = game.team_turn();
    GameResponse {
        id: record.id,
        name: record.name.clone(),
        board: game.board().to_codes(),
        turn,
        status: game.status().as_str().to_string(),
        check: game.is_in_check(turn),
        white_username: record.white_username.clone(),
        black_username: record.black_username.clone(),
        finished: record.finished,
        game: game.clone(),
        created_at: record.created_at.to_rfc3339(),
    }
}

pub fn legal_move_entry(mv: &Move) -> LegalMoveEntry {
    LegalMoveEntry {
        from: mv.from.to_algebraic(),
        to: mv.to.to_algebraic(),
        promotion: mv.promotion.map(|p| p.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GameStore;

    #[test]
    fn game_response_fields() {
        let mut store = GameStore::new();
        let record = store.insert_game("casual").clone();
        let json = serde_json::to_value(game_to_response(&record)).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "casual");
        assert_eq!(json["turn"], "WHITE");
        assert_eq!(json["status"], "active");
        assert_eq!(json["check"], false);
        assert!(json["whiteUsername"].is_null());
        assert_eq!(json["board"].as_array().unwrap().len(), 8);
        assert_eq!(json["board"][6][0], "wP");
        assert!(json["board"][4][4].is_null());
    }

    #[test]
    fn empty_response_is_empty_object() {
        assert_eq!(serde_json::to_string(&EmptyResponse {}).unwrap(), "{}");
    }

    #[test]
    fn promotion_entry_names_kind() {
        let mv = Move::from_coordinates("e7e8n").unwrap();
        let json = serde_json::to_value(legal_move_entry(&mv)).unwrap();
        assert_eq!(json["from"], "e7");
        assert_eq!(json["to"], "e8");
        assert!(json["promotion"].is_string());
    }
}
