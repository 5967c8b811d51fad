use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Rank a pawn of this colour starts on.
    pub const fn pawn_home_rank(self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    /// Rank a pawn of this colour promotes on.
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }

    /// Rank delta of a pawn step for this colour.
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Parse "white" / "WHITE" / "w" (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Some(Color::White),
            "black" | "b" => Some(Color::Black),
            _ => None,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PieceType {
    King,
    Queen,
    Bishop,
    Knight,
    Rook,
    Pawn,
}

impl PieceType {
    /// Kinds a pawn may promote to, in the order promotion moves are emitted.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Single uppercase letter for white, lowercase for black.
    pub fn to_char(self, color: Color) -> char {
        let c = match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parse a piece character; the case selects the colour.
    pub fn from_char(c: char) -> Option<(Color, PieceType)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some((color, piece))
    }

    /// Parse a promotion choice: a letter (`q`) or a name (`queen`).
    pub fn from_promotion_str(s: &str) -> Option<Self> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "q" | "queen" => PieceType::Queen,
            "r" | "rook" => PieceType::Rook,
            "b" | "bishop" => PieceType::Bishop,
            "n" | "knight" => PieceType::Knight,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A (colour, kind) pair. Pieces carry no position of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceType) -> Self {
        Piece { color, kind }
    }

    /// FEN-style letter.
    pub fn to_char(self) -> char {
        self.kind.to_char(self.color)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A square on the board: rank and file, both 1..=8.
///
/// Serialises as its coordinate string (`"e2"`), so deserialisation
/// rejects off-board input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    rank: u8,
    file: u8,
}

impl Position {
    /// Internal constructor; callers guarantee the range.
    #[inline]
    pub const fn new(rank: u8, file: u8) -> Self {
        debug_assert!(rank >= 1 && rank <= 8 && file >= 1 && file <= 8);
        Position { rank, file }
    }

    /// Checked constructor for coordinates coming from outside the engine.
    pub fn try_new(rank: i32, file: i32) -> Result<Self, ChessError> {
        if (1..=8).contains(&rank) && (1..=8).contains(&file) {
            Ok(Position::new(rank as u8, file as u8))
        } else {
            Err(ChessError::InvalidSquare(format!("rank {rank}, file {file}")))
        }
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.file
    }

    /// The square `(dr, df)` away, or `None` if that leaves the board.
    #[inline]
    pub fn offset(self, dr: i8, df: i8) -> Option<Self> {
        let rank = self.rank as i8 + dr;
        let file = self.file as i8 + df;
        if (1..=8).contains(&rank) && (1..=8).contains(&file) {
            Some(Position::new(rank as u8, file as u8))
        } else {
            None
        }
    }

    /// All 64 squares, rank 1 first, file a first within a rank.
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=8u8).flat_map(|rank| (1..=8u8).map(move |file| Position::new(rank, file)))
    }

    /// Parse a coordinate like "e4" (file letter, rank digit).
    pub fn from_algebraic(s: &str) -> Result<Self, ChessError> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Ok(Position::new(rank + 1, file + 1))
        } else {
            Err(ChessError::InvalidSquare(s.to_string()))
        }
    }

    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.file - 1) as char;
        format!("{file}{}", self.rank)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_algebraic())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Position::from_algebraic(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A move: origin, destination, and the kind a pawn promotes to, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Position, to: Position, promotion: PieceType) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parse coordinate notation: `e2e4`, `e7e8q`, or whitespace separated
    /// `e7 e8 queen`.
    pub fn from_coordinates(s: &str) -> Result<Self, ChessError> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let (from, to, promo) = match tokens.as_slice() {
            [joined] if joined.len() == 4 || joined.len() == 5 => {
                if !joined.is_ascii() {
                    return Err(ChessError::InvalidSquare(joined.to_string()));
                }
                let promo = (joined.len() == 5).then(|| &joined[4..]);
                (&joined[0..2], &joined[2..4], promo)
            }
            [from, to] => (*from, *to, None),
            [from, to, promo] => (*from, *to, Some(*promo)),
            _ => return Err(ChessError::InvalidSquare(s.to_string())),
        };

        let from = Position::from_algebraic(from)?;
        let to = Position::from_algebraic(to)?;
        let promotion = promo
            .map(|p| {
                PieceType::from_promotion_str(p)
                    .ok_or_else(|| ChessError::InvalidPromotion(p.to_string()))
            })
            .transpose()?;

        Ok(Move {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.to_char(Color::Black))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Status of the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Why `Game::make_move` rejected a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidMoveReason {
    NoPieceAtOrigin,
    WrongTurn,
    IllegalDestination,
}

impl InvalidMoveReason {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            InvalidMoveReason::NoPieceAtOrigin => "no_piece",
            InvalidMoveReason::WrongTurn => "wrong_turn",
            InvalidMoveReason::IllegalDestination => "illegal_destination",
        }
    }
}

impl fmt::Display for InvalidMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidMoveReason::NoPieceAtOrigin => write!(f, "no piece at move start position"),
            InvalidMoveReason::WrongTurn => write!(f, "piece is moving out of turn"),
            InvalidMoveReason::IllegalDestination => write!(f, "not a legal move"),
        }
    }
}

/// Domain errors for the chess engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("invalid move: {from} -> {to}: {reason}")]
    InvalidMove {
        from: Position,
        to: Position,
        reason: InvalidMoveReason,
    },

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(String),
}

impl ChessError {
    /// The rejection reason, if this is an invalid-move error.
    pub fn invalid_move_reason(&self) -> Option<InvalidMoveReason> {
        match self {
            ChessError::InvalidMove { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
