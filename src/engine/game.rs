//! Stateful game controller: a board plus the side to move.
//!
//! `Game` filters pseudo-legal moves into legal ones, applies moves, and
//! answers check / checkmate / stalemate queries. It is the only type the
//! service layer mutates.

use serde::{Deserialize, Serialize};

use crate::engine::board::Board;
use crate::engine::types::{
    ChessError, Color, GameStatus, InvalidMoveReason, Move, Piece, Position,
};

/// A chess game: the board and whose turn it is. No history is kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    turn: Color,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A new game from the standard starting position, White to move.
    pub fn new() -> Self {
        Self {
            board: Board::starting(),
            turn: Color::White,
        }
    }

    /// Restore a game from a stored board and turn.
    pub fn from_parts(board: Board, turn: Color) -> Self {
        Self { board, turn }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    pub fn team_turn(&self) -> Color {
        self.turn
    }

    pub fn set_team_turn(&mut self, color: Color) {
        self.turn = color;
    }

    // -----------------------------------------------------------------
    // Move generation
    // -----------------------------------------------------------------

    /// Legal moves for the piece on `pos`.
    ///
    /// Returns `None` when the square is empty and `Some(vec![])` when the
    /// piece has no legal move. Turn is not considered.
    pub fn valid_moves(&self, pos: Position) -> Option<Vec<Move>> {
        let piece = self.board.get_piece(pos)?;
        let moves = piece
            .piece_moves(&self.board, pos)
            .into_iter()
            .filter(|&mv| !self.leaves_in_check(piece, mv))
            .collect();
        Some(moves)
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.legal_moves_for(self.turn)
    }

    fn legal_moves_for(&self, color: Color) -> Vec<Move> {
        self.board
            .pieces_of(color)
            .flat_map(|(pos, _)| self.valid_moves(pos).unwrap_or_default())
            .collect()
    }

    /// Whether `color` has at least one legal move.
    fn has_any_legal_move(&self, color: Color) -> bool {
        self.board
            .pieces_of(color)
            .any(|(pos, _)| self.valid_moves(pos).is_some_and(|m| !m.is_empty()))
    }

    /// Play `mv` on a copy of the board and test whether the mover's own
    /// king is attacked afterwards. The live board is never touched.
    fn leaves_in_check(&self, piece: Piece, mv: Move) -> bool {
        let mut scratch = self.board.clone();
        apply(&mut scratch, piece, mv);
        is_attacked(&scratch, piece.color)
    }

    // -----------------------------------------------------------------
    // Make move
    // -----------------------------------------------------------------

    /// Apply `mv` for the side to move and pass the turn.
    ///
    /// Fails with `ChessError::InvalidMove` if the origin is empty, the
    /// piece belongs to the other side, or the move is not legal. A failed
    /// call leaves the game unchanged.
    pub fn make_move(&mut self, mv: Move) -> Result<(), ChessError> {
        let reject = |reason| ChessError::InvalidMove {
            from: mv.from,
            to: mv.to,
            reason,
        };

        let piece = self
            .board
            .get_piece(mv.from)
            .ok_or_else(|| reject(InvalidMoveReason::NoPieceAtOrigin))?;
        if piece.color != self.turn {
            return Err(reject(InvalidMoveReason::WrongTurn));
        }
        let legal = self.valid_moves(mv.from).unwrap_or_default();
        if !legal.contains(&mv) {
            return Err(reject(InvalidMoveReason::IllegalDestination));
        }

        apply(&mut self.board, piece, mv);
        self.turn = !self.turn;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    /// Whether any opposing piece attacks `color`'s king. False if `color`
    /// has no king on the board.
    pub fn is_in_check(&self, color: Color) -> bool {
        is_attacked(&self.board, color)
    }

    /// In check with no legal move.
    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_any_legal_move(color)
    }

    /// Not in check, yet no legal move.
    pub fn is_in_stalemate(&self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_any_legal_move(color)
    }

    /// Status of the side to move.
    pub fn status(&self) -> GameStatus {
        self.status_of(self.turn)
    }

    /// Status of `color`.
    pub fn status_of(&self, color: Color) -> GameStatus {
        let in_check = self.is_in_check(color);
        let can_move = self.has_any_legal_move(color);
        match (in_check, can_move) {
            (true, false) => GameStatus::Checkmate,
            (true, true) => GameStatus::Check,
            (false, false) => GameStatus::Stalemate,
            (false, true) => GameStatus::Active,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Move `piece` along `mv`, replacing it with the promotion kind if any.
/// Whatever stood on the destination is overwritten.
fn apply(board: &mut Board, piece: Piece, mv: Move) {
    let placed = match mv.promotion {
        Some(kind) => Piece::new(piece.color, kind),
        None => piece,
    };
    board.add_piece(mv.to, Some(placed));
    board.add_piece(mv.from, None);
}

/// Whether `color`'s king stands on a square some opposing piece can move to.
fn is_attacked(board: &Board, color: Color) -> bool {
    let Some(king) = board.find_king(color) else {
        return false;
    };
    board
        .pieces_of(!color)
        .any(|(pos, piece)| piece.piece_moves(board, pos).iter().any(|m| m.to == king))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::PieceType;

    fn sq(name: &str) -> Position {
        Position::from_algebraic(name).unwrap()
    }

    fn mv(from: &str, to: &str) -> Move {
        Move::new(sq(from), sq(to))
    }

    fn place(board: &mut Board, name: &str, color: Color, kind: PieceType) {
        board.add_piece(sq(name), Some(Piece::new(color, kind)));
    }

    fn play(g: &mut Game, from: &str, to: &str) {
        g.make_move(mv(from, to)).unwrap();
    }

    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    #[test]
    fn new_game_white_to_move_on_starting_board() {
        let g = Game::new();
        assert_eq!(g.team_turn(), Color::White);
        assert_eq!(*g.board(), Board::starting());
        assert_eq!(g.status(), GameStatus::Active);
    }

    #[test]
    fn setters_replace_board_and_turn() {
        let mut g = Game::new();
        let mut board = Board::new();
        place(&mut board, "a1", Color::White, PieceType::King);
        g.set_board(board.clone());
        g.set_team_turn(Color::Black);
        assert_eq!(*g.board(), board);
        assert_eq!(g.team_turn(), Color::Black);
    }

    // -----------------------------------------------------------------
    // valid_moves
    // -----------------------------------------------------------------

    #[test]
    fn valid_moves_on_empty_square_is_none() {
        let g = Game::new();
        assert_eq!(g.valid_moves(sq("e4")), None);
    }

    #[test]
    fn valid_moves_piece_without_moves_is_empty() {
        let g = Game::new();
        assert_eq!(g.valid_moves(sq("a1")), Some(vec![]));
    }

    #[test]
    fn opening_move_counts() {
        let g = Game::new();
        for (pos, piece) in g.board().pieces() {
            let n = g.valid_moves(pos).unwrap().len();
            match piece.kind {
                PieceType::Pawn | PieceType::Knight => assert_eq!(n, 2, "{pos}"),
                _ => assert_eq!(n, 0, "{pos}"),
            }
        }
        assert_eq!(g.legal_moves().len(), 20);
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        let mut board = Board::new();
        place(&mut board, "e1", Color::White, PieceType::King);
        place(&mut board, "e2", Color::White, PieceType::Rook);
        place(&mut board, "e8", Color::Black, PieceType::Rook);
        place(&mut board, "a8", Color::Black, PieceType::King);
        let g = Game::from_parts(board, Color::White);

        let moves = g.valid_moves(sq("e2")).unwrap();
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.to.file() == 5));
        assert!(moves.contains(&mv("e2", "e8")));
    }

    #[test]
    fn king_cannot_step_into_attack() {
        let mut board = Board::new();
        place(&mut board, "e1", Color::White, PieceType::King);
        place(&mut board, "d8", Color::Black, PieceType::Rook);
        place(&mut board, "h8", Color::Black, PieceType::King);
        let g = Game::from_parts(board, Color::White);

        let moves = g.valid_moves(sq("e1")).unwrap();
        assert!(moves.iter().all(|m| m.to.file() != 4));
        assert_eq!(moves.len(), 3); // e2, f1, f2
    }

    #[test]
    fn king_may_capture_undefended_attacker() {
        let mut board = Board::new();
        place(&mut board, "e1", Color::White, PieceType::King);
        place(&mut board, "e2", Color::Black, PieceType::Queen);
        place(&mut board, "h8", Color::Black, PieceType::King);
        let g = Game::from_parts(board, Color::White);

        assert!(g.is_in_check(Color::White));
        assert_eq!(g.valid_moves(sq("e1")).unwrap(), vec![mv("e1", "e2")]);
    }

    #[test]
    fn valid_moves_does_not_mutate_board() {
        let g = Game::new();
        let before = g.board().clone();
        for pos in Position::all() {
            let _ = g.valid_moves(pos);
        }
        assert_eq!(*g.board(), before);
    }

    // -----------------------------------------------------------------
    // make_move
    // -----------------------------------------------------------------

    #[test]
    fn make_move_relocates_and_flips_turn() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        assert_eq!(g.board().get_piece(sq("e2")), None);
        assert_eq!(
            g.board().get_piece(sq("e4")),
            Some(Piece::new(Color::White, PieceType::Pawn))
        );
        assert_eq!(g.team_turn(), Color::Black);
        play(&mut g, "e7", "e5");
        assert_eq!(g.team_turn(), Color::White);
    }

    #[test]
    fn make_move_no_piece() {
        let mut g = Game::new();
        let err = g.make_move(mv("e4", "e5")).unwrap_err();
        assert_eq!(
            err.invalid_move_reason(),
            Some(InvalidMoveReason::NoPieceAtOrigin)
        );
    }

    #[test]
    fn make_move_wrong_turn() {
        let mut g = Game::new();
        let err = g.make_move(mv("e7", "e5")).unwrap_err();
        assert_eq!(err.invalid_move_reason(), Some(InvalidMoveReason::WrongTurn));
    }

    #[test]
    fn make_move_illegal_destination() {
        let mut g = Game::new();
        let err = g.make_move(mv("e2", "e5")).unwrap_err();
        assert_eq!(
            err.invalid_move_reason(),
            Some(InvalidMoveReason::IllegalDestination)
        );
    }

    #[test]
    fn rejected_move_leaves_state_unchanged() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        let before = g.clone();
        assert!(g.make_move(mv("d2", "d4")).is_err()); // white again
        assert!(g.make_move(mv("e5", "e4")).is_err()); // empty
        assert!(g.make_move(mv("b8", "b6")).is_err()); // geometry
        assert_eq!(g, before);
    }

    #[test]
    fn promotion_places_chosen_piece() {
        let mut board = Board::new();
        place(&mut board, "a7", Color::White, PieceType::Pawn);
        place(&mut board, "e1", Color::White, PieceType::King);
        place(&mut board, "h5", Color::Black, PieceType::King);
        let mut g = Game::from_parts(board, Color::White);

        // Bare destination without a promotion kind is not legal.
        assert!(g.make_move(mv("a7", "a8")).is_err());

        g.make_move(Move::with_promotion(sq("a7"), sq("a8"), PieceType::Knight))
            .unwrap();
        assert_eq!(
            g.board().get_piece(sq("a8")),
            Some(Piece::new(Color::White, PieceType::Knight))
        );
        assert_eq!(g.board().get_piece(sq("a7")), None);
        assert_eq!(g.team_turn(), Color::Black);
    }

    #[test]
    fn promotion_legal_set_has_four_moves_to_last_rank() {
        let mut board = Board::new();
        place(&mut board, "c2", Color::Black, PieceType::Pawn);
        place(&mut board, "h8", Color::Black, PieceType::King);
        place(&mut board, "h1", Color::White, PieceType::King);
        let g = Game::from_parts(board, Color::Black);

        let moves = g.valid_moves(sq("c2")).unwrap();
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|m| m.to == sq("c1")));
        assert!(!moves.contains(&mv("c2", "c1")));
    }

    #[test]
    fn move_must_resolve_own_check() {
        let mut board = Board::new();
        place(&mut board, "e1", Color::White, PieceType::King);
        place(&mut board, "a2", Color::White, PieceType::Pawn);
        place(&mut board, "e8", Color::Black, PieceType::Rook);
        place(&mut board, "a8", Color::Black, PieceType::King);
        let mut g = Game::from_parts(board, Color::White);

        assert!(g.is_in_check(Color::White));
        let err = g.make_move(mv("a2", "a3")).unwrap_err();
        assert_eq!(
            err.invalid_move_reason(),
            Some(InvalidMoveReason::IllegalDestination)
        );
        g.make_move(mv("e1", "d1")).unwrap();
        assert!(!g.is_in_check(Color::White));
    }

    // -----------------------------------------------------------------
    // Check / checkmate / stalemate
    // -----------------------------------------------------------------

    #[test]
    fn starting_position_is_quiet_for_both() {
        let g = Game::new();
        for color in [Color::White, Color::Black] {
            assert!(!g.is_in_check(color));
            assert!(!g.is_in_checkmate(color));
            assert!(!g.is_in_stalemate(color));
        }
    }

    #[test]
    fn no_king_means_no_check() {
        let mut board = Board::new();
        place(&mut board, "d4", Color::Black, PieceType::Queen);
        let g = Game::from_parts(board, Color::White);
        assert!(!g.is_in_check(Color::White));
    }

    #[test]
    fn fools_mate() {
        let mut g = Game::new();
        play(&mut g, "f2", "f3");
        play(&mut g, "e7", "e5");
        play(&mut g, "g2", "g4");
        play(&mut g, "d8", "h4");
        assert!(g.is_in_check(Color::White));
        assert!(g.is_in_checkmate(Color::White));
        assert!(!g.is_in_stalemate(Color::White));
        assert!(!g.is_in_checkmate(Color::Black));
        assert_eq!(g.status(), GameStatus::Checkmate);
    }

    #[test]
    fn scholars_mate() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "e7", "e5");
        play(&mut g, "f1", "c4");
        play(&mut g, "b8", "c6");
        play(&mut g, "d1", "h5");
        play(&mut g, "g8", "f6");
        play(&mut g, "h5", "f7");
        assert!(g.is_in_checkmate(Color::Black));
    }

    #[test]
    fn check_that_can_be_blocked_is_not_mate() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "f7", "f6");
        play(&mut g, "d1", "h5");
        assert!(g.is_in_check(Color::Black));
        assert!(!g.is_in_checkmate(Color::Black));
        assert_eq!(g.status(), GameStatus::Check);
        // g7-g6 blocks
        assert!(g.valid_moves(sq("g7")).unwrap().contains(&mv("g7", "g6")));
    }

    #[test]
    fn stalemate_detection() {
        // Black king a8, white king c7, white queen b6, black to move.
        let mut board = Board::new();
        place(&mut board, "a8", Color::Black, PieceType::King);
        place(&mut board, "c7", Color::White, PieceType::King);
        place(&mut board, "b6", Color::White, PieceType::Queen);
        let g = Game::from_parts(board, Color::Black);

        assert!(!g.is_in_check(Color::Black));
        assert!(g.is_in_stalemate(Color::Black));
        assert!(!g.is_in_checkmate(Color::Black));
        assert_eq!(g.status(), GameStatus::Stalemate);
    }

    #[test]
    fn stalemate_requires_every_piece_to_be_stuck() {
        let mut board = Board::new();
        place(&mut board, "a8", Color::Black, PieceType::King);
        place(&mut board, "c7", Color::White, PieceType::King);
        place(&mut board, "b6", Color::White, PieceType::Queen);
        place(&mut board, "h5", Color::Black, PieceType::Pawn);
        let g = Game::from_parts(board, Color::Black);
        assert!(!g.is_in_stalemate(Color::Black));
    }

    #[test]
    fn checkmated_side_has_empty_legal_sets() {
        let mut g = Game::new();
        play(&mut g, "f2", "f3");
        play(&mut g, "e7", "e5");
        play(&mut g, "g2", "g4");
        play(&mut g, "d8", "h4");
        for (pos, _) in g.board().pieces_of(Color::White) {
            assert_eq!(g.valid_moves(pos), Some(vec![]));
        }
        assert!(g.legal_moves().is_empty());
    }

    // -----------------------------------------------------------------
    // Snapshots and persistence
    // -----------------------------------------------------------------

    #[test]
    fn board_snapshot_restores_exactly() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "d7", "d5");
        let snapshot = g.board().clone();
        play(&mut g, "e4", "d5"); // capture
        assert_ne!(*g.board(), snapshot);

        g.set_board(snapshot.clone());
        assert_eq!(*g.board(), snapshot);
        assert_eq!(
            g.board().get_piece(sq("d5")),
            Some(Piece::new(Color::Black, PieceType::Pawn))
        );
    }

    #[test]
    fn serde_round_trip() {
        let mut g = Game::new();
        play(&mut g, "g1", "f3");
        play(&mut g, "b7", "b5");
        let json = serde_json::to_string(&g).unwrap();
        let back: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
        assert_eq!(back.team_turn(), Color::White);
    }
}
