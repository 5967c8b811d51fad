//! Mailbox board: an 8×8 grid of optional pieces.
//!
//! The board is plain data (64 `Option<Piece>` cells), so `Clone` is a full
//! snapshot. `Game` relies on that to test candidate moves on a copy instead
//! of mutating and restoring the live board.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::types::{Color, Piece, PieceType, Position};

/// Back-rank layout from file a to file h.
const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// Piece placement, indexed `squares[rank - 1][file - 1]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// A board in the standard starting arrangement.
    pub fn starting() -> Self {
        let mut board = Board::new();
        board.reset_board();
        board
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// The piece on `pos`, if any.
    #[inline]
    pub fn get_piece(&self, pos: Position) -> Option<Piece> {
        self.squares[pos.rank() as usize - 1][pos.file() as usize - 1]
    }

    /// Put `piece` on `pos`, or clear the square with `None`.
    #[inline]
    pub fn add_piece(&mut self, pos: Position, piece: Option<Piece>) {
        self.squares[pos.rank() as usize - 1][pos.file() as usize - 1] = piece;
    }

    /// Overwrite every square with the standard opening position.
    pub fn reset_board(&mut self) {
        self.squares = [[None; 8]; 8];
        for (i, &kind) in BACK_RANK.iter().enumerate() {
            let file = i as u8 + 1;
            self.add_piece(Position::new(1, file), Some(Piece::new(Color::White, kind)));
            self.add_piece(
                Position::new(2, file),
                Some(Piece::new(Color::White, PieceType::Pawn)),
            );
            self.add_piece(
                Position::new(7, file),
                Some(Piece::new(Color::Black, PieceType::Pawn)),
            );
            self.add_piece(Position::new(8, file), Some(Piece::new(Color::Black, kind)));
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every occupied square, rank 1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| self.get_piece(pos).map(|piece| (pos, piece)))
    }

    /// Occupied squares of one colour.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.pieces().filter(move |(_, piece)| piece.color == color)
    }

    /// Square of `color`'s king, or `None` if it has none.
    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces_of(color)
            .find(|(_, piece)| piece.kind == PieceType::King)
            .map(|(pos, _)| pos)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Text diagram seen from `perspective`. Squares listed in `highlights`
    /// are bracketed, e.g. the destinations of a piece's legal moves.
    pub fn render(&self, perspective: Color, highlights: &[Position]) -> String {
        let (ranks, files): (Vec<u8>, Vec<u8>) = match perspective {
            Color::White => ((1..=8).rev().collect(), (1..=8).collect()),
            Color::Black => ((1..=8).collect(), (1..=8).rev().collect()),
        };

        let header: String = files
            .iter()
            .map(|&f| format!(" {} ", (b'a' + f - 1) as char))
            .collect();

        let mut out = String::with_capacity(400);
        out.push_str(&format!("   {header}\n"));
        for &rank in &ranks {
            out.push_str(&format!(" {rank} "));
            for &file in &files {
                let pos = Position::new(rank, file);
                let c = self.get_piece(pos).map_or('.', Piece::to_char);
                if highlights.contains(&pos) {
                    out.push_str(&format!("[{c}]"));
                } else {
                    out.push_str(&format!(" {c} "));
                }
            }
            out.push_str(&format!(" {rank}\n"));
        }
        out.push_str(&format!("   {header}\n"));
        out
    }

    /// 8×8 grid of `"wP"`-style codes, rank 8 first (row-major, for API
    /// responses).
    pub fn to_codes(&self) -> Vec<Vec<Option<String>>> {
        (1..=8u8)
            .rev()
            .map(|rank| {
                (1..=8u8)
                    .map(|file| {
                        self.get_piece(Position::new(rank, file)).map(|piece| {
                            let c = match piece.color {
                                Color::White => 'w',
                                Color::Black => 'b',
                            };
                            format!("{c}{}", piece.kind.to_char(Color::White))
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Color::White, &[]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
