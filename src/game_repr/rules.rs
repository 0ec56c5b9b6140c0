use super::moves::{LegalMove, LegalMoveSet, Move, MoveType};
use crate::geometry::is_light_square;
use chess::{Board as ChessBoard, BoardStatus, ChessMove, Color, MoveGen, Piece, Rank, Square};
use std::str::FromStr;
use thiserror::Error;

/*
 * MODULE IS RESPONSIBLE FOR
 * LEGALITY, MOVE APPLICATION AND TERMINAL-STATE QUERIES
 *
 * Move generation itself is delegated to the `chess` crate; this facade adds
 * the bookkeeping it does not keep (clocks, repetition history, move list).
 */

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("invalid FEN `{0}`")]
    InvalidFen(String),
    #[error("illegal move {0}")]
    IllegalMove(Move),
    #[error("move {0} promotes a pawn but names no promotion piece")]
    MissingPromotion(Move),
}

#[derive(Clone)]
pub struct Rules {
    board: ChessBoard,
    halfmove_clock: u32,
    fullmove_number: u32,
    /// Hash of every position reached so far, current one last
    history: Vec<u64>,
    moves: Vec<Move>,
}

impl Default for Rules {
    fn default() -> Self {
        Self::with_board(ChessBoard::default(), 0, 1)
    }
}

impl Rules {
    fn with_board(board: ChessBoard, halfmove_clock: u32, fullmove_number: u32) -> Self {
        Self {
            history: vec![board.get_hash()],
            board,
            halfmove_clock,
            fullmove_number,
            moves: Vec::new(),
        }
    }

    /// Parse a full FEN record. The move counters are optional and default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let invalid = || RulesError::InvalidFen(fen.to_owned());
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(invalid());
        }
        let board = ChessBoard::from_str(&fields[..4].join(" ")).map_err(|_| invalid())?;
        let halfmove_clock = match fields.get(4) {
            Some(f) => f.parse().map_err(|_| invalid())?,
            None => 0,
        };
        let fullmove_number = match fields.get(5) {
            Some(f) => f.parse().map_err(|_| invalid())?,
            None => 1,
        };
        Ok(Self::with_board(board, halfmove_clock, fullmove_number))
    }

    pub fn turn(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn piece_on(&self, square: Square) -> Option<(Color, Piece)> {
        Some((self.board.color_on(square)?, self.board.piece_on(square)?))
    }

    pub fn history(&self) -> &[Move] {
        &self.moves
    }

    /// Legal moves of the piece on `square`.
    ///
    /// Empty for empty squares and for pieces of the side not to move. The four
    /// promotion choices to one destination collapse into a single
    /// [`MoveType::Promotion`] entry with no piece chosen yet.
    pub fn legal_moves(&self, square: Square) -> LegalMoveSet {
        MoveGen::new_legal(&self.board)
            .filter(|cm| cm.get_source() == square)
            .filter(|cm| matches!(cm.get_promotion(), None | Some(Piece::Queen)))
            .map(|cm| LegalMove {
                mv: Move::new(cm.get_source(), cm.get_dest()),
                move_type: self.classify(cm),
            })
            .collect()
    }

    /// Every legal move for the side to move, promotions spelled out.
    pub fn all_legal_moves(&self) -> Vec<Move> {
        MoveGen::new_legal(&self.board).map(Move::from).collect()
    }

    fn classify(&self, cm: ChessMove) -> MoveType {
        let (src, dest) = (cm.get_source(), cm.get_dest());
        let file_delta = dest.get_file().to_index() as i32 - src.get_file().to_index() as i32;
        match self.board.piece_on(src) {
            Some(Piece::King) if file_delta == 2 => MoveType::KingsideCastle,
            Some(Piece::King) if file_delta == -2 => MoveType::QueensideCastle,
            Some(Piece::Pawn) if cm.get_promotion().is_some() => MoveType::Promotion,
            Some(Piece::Pawn) if file_delta != 0 && self.board.piece_on(dest).is_none() => MoveType::EnPassant,
            _ if self.board.piece_on(dest).is_some() => MoveType::Capture,
            _ => MoveType::Normal,
        }
    }

    fn promotes(&self, mv: &Move) -> bool {
        let last_rank = match self.turn() {
            Color::White => Rank::Eighth,
            Color::Black => Rank::First,
        };
        self.board.piece_on(mv.from) == Some(Piece::Pawn) && mv.to.get_rank() == last_rank
    }

    /// Validate `mv` without applying it.
    pub fn check(&self, mv: &Move) -> Result<LegalMove, RulesError> {
        if self.promotes(mv) && mv.promotion.is_none() {
            return Err(RulesError::MissingPromotion(*mv));
        }
        let cm = mv.to_chess();
        if !self.board.legal(cm) {
            return Err(RulesError::IllegalMove(*mv));
        }
        Ok(LegalMove {
            mv: *mv,
            move_type: self.classify(cm),
        })
    }

    /// Apply `mv` to the game. Nothing changes when it is rejected.
    pub fn apply_move(&mut self, mv: Move) -> Result<LegalMove, RulesError> {
        let legal = self.check(&mv)?;
        let resets_clock = self.board.piece_on(mv.from) == Some(Piece::Pawn) || self.board.piece_on(mv.to).is_some();
        if self.turn() == Color::Black {
            self.fullmove_number += 1;
        }
        self.halfmove_clock = if resets_clock { 0 } else { self.halfmove_clock + 1 };
        self.board = self.board.make_move_new(mv.to_chess());
        self.history.push(self.board.get_hash());
        self.moves.push(mv);
        Ok(legal)
    }

    pub fn is_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    pub fn is_threefold(&self) -> bool {
        let current = self.board.get_hash();
        self.history.iter().filter(|&&h| h == current).count() >= 3
    }

    /// Neither side can ever mate: bare kings, a single minor piece, or
    /// bishops that all stand on one square colour.
    pub fn is_insufficient_material(&self) -> bool {
        let b = &self.board;
        let heavy = *b.pieces(Piece::Pawn) | *b.pieces(Piece::Rook) | *b.pieces(Piece::Queen);
        if heavy.popcnt() > 0 {
            return false;
        }
        let knights = b.pieces(Piece::Knight).popcnt();
        let bishops = *b.pieces(Piece::Bishop);
        if knights + bishops.popcnt() <= 1 {
            return true;
        }
        if knights > 0 {
            return false;
        }
        let light = bishops.into_iter().filter(|&sq| is_light_square(sq)).count() as u32;
        light == 0 || light == bishops.popcnt()
    }

    pub fn is_fifty_move_rule(&self) -> bool {
        self.halfmove_clock >= 100
    }

    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_rule() || self.is_stalemate() || self.is_insufficient_material() || self.is_threefold()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    /// FEN of the current position, the format handed to move oracles.
    pub fn position_notation(&self) -> String {
        let fen = self.board.to_string();
        let fields: Vec<&str> = fen.split_whitespace().take(4).collect();
        format!("{} {} {}", fields.join(" "), self.halfmove_clock, self.fullmove_number)
    }
}
