//! Pseudo-legal move generation.
//!
//! Produces every destination a piece can reach geometrically from its
//! square, ignoring whether the move would leave its own king in check.
//! `Game` filters these candidates into legal moves.

use crate::engine::board::Board;
use crate::engine::types::{Color, Move, Piece, PieceType, Position};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl Piece {
    /// Every move this piece could make from `from` on `board`, without
    /// regard to check.
    pub fn piece_moves(self, board: &Board, from: Position) -> Vec<Move> {
        let mut moves = Vec::with_capacity(28);
        match self.kind {
            PieceType::King => step_moves(board, from, self.color, &KING_OFFSETS, &mut moves),
            PieceType::Knight => step_moves(board, from, self.color, &KNIGHT_OFFSETS, &mut moves),
            PieceType::Bishop => slide_moves(board, from, self.color, &DIAGONALS, &mut moves),
            PieceType::Rook => slide_moves(board, from, self.color, &ORTHOGONALS, &mut moves),
            PieceType::Queen => {
                slide_moves(board, from, self.color, &DIAGONALS, &mut moves);
                slide_moves(board, from, self.color, &ORTHOGONALS, &mut moves);
            }
            PieceType::Pawn => pawn_moves(board, from, self.color, &mut moves),
        }
        moves
    }
}

// =========================================================================
// Stepping pieces (king, knight)
// =========================================================================

fn step_moves(
    board: &Board,
    from: Position,
    us: Color,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(dr, df) in offsets {
        let Some(to) = from.offset(dr, df) else {
            continue;
        };
        match board.get_piece(to) {
            Some(occupant) if occupant.color == us => {}
            _ => moves.push(Move::new(from, to)),
        }
    }
}

// =========================================================================
// Sliding pieces (bishop, rook, queen)
// =========================================================================

fn slide_moves(
    board: &Board,
    from: Position,
    us: Color,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(dr, df) in directions {
        let mut cursor = from;
        while let Some(to) = cursor.offset(dr, df) {
            match board.get_piece(to) {
                None => moves.push(Move::new(from, to)),
                Some(occupant) => {
                    if occupant.color != us {
                        moves.push(Move::new(from, to));
                    }
                    break;
                }
            }
            cursor = to;
        }
    }
}

// =========================================================================
// Pawns
// =========================================================================

fn pawn_moves(board: &Board, from: Position, us: Color, moves: &mut Vec<Move>) {
    let forward = us.forward();

    // Pushes never capture.
    if let Some(one) = from.offset(forward, 0)
        && board.get_piece(one).is_none()
    {
        push_pawn_move(from, one, us, moves);

        if from.rank() == us.pawn_home_rank()
            && let Some(two) = one.offset(forward, 0)
            && board.get_piece(two).is_none()
        {
            moves.push(Move::new(from, two));
        }
    }

    // Diagonal steps only when they capture.
    for df in [-1, 1] {
        if let Some(to) = from.offset(forward, df)
            && board.get_piece(to).is_some_and(|p| p.color != us)
        {
            push_pawn_move(from, to, us, moves);
        }
    }
}

/// A pawn move onto the last rank becomes one move per promotion kind.
fn push_pawn_move(from: Position, to: Position, us: Color, moves: &mut Vec<Move>) {
    if to.rank() == us.promotion_rank() {
        for kind in PieceType::PROMOTIONS {
            moves.push(Move::with_promotion(from, to, kind));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

// =========================================================================
// Tests
// =========================================================================
