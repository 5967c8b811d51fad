use crate::engine::{Board, ChessError, Color, Game, GameStatus, Move, Position};
use crate::store::{GameRecord, StoreError};

/// One row of the game list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSummary {
    pub id: u32,
    pub name: String,
    pub white_username: Option<String>,
    pub black_username: Option<String>,
    pub finished: bool,
}

impl From<&GameRecord> for GameSummary {
    fn from(record: &GameRecord) -> Self {
        GameSummary {
            id: record.id,
            name: record.name.clone(),
            white_username: record.white_username.clone(),
            black_username: record.black_username.clone(),
            finished: record.finished,
        }
    }
}

/// What happened when a seated player moved.
#[derive(Clone, Debug)]
pub struct MoveOutcome {
    pub game_id: u32,
    pub username: String,
    pub color: Color,
    pub mv: Move,
    /// Opponent's username, if the seat is taken.
    pub opponent: Option<String>,
    /// Status of the opponent (now the side to move).
    pub opponent_status: GameStatus,
    /// Game state after the move.
    pub record: GameRecord,
}

impl MoveOutcome {
    pub fn game(&self) -> &Game {
        &self.record.game
    }
}

/// Legal moves of one square, read together with the board they apply to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegalMoves {
    pub from: Position,
    /// `None` when the square is empty.
    pub moves: Option<Vec<Move>>,
    pub board: Board,
}

/// Role of a user relative to a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Player(Color),
    Observer,
}

impl Role {
    pub fn describe(self) -> &'static str {
        match self {
            Role::Player(Color::White) => "white player",
            Role::Player(Color::Black) => "black player",
            Role::Observer => "an observer",
        }
    }
}

/// Errors from the game service. The API layer maps each to a status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("already taken")]
    AlreadyTaken,

    #[error("game not found: {0}")]
    GameNotFound(u32),

    #[error("you are not a player in this game")]
    NotAPlayer,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("game is already over")]
    GameOver,

    #[error(transparent)]
    InvalidMove(#[from] ChessError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}
