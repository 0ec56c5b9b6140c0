use chess::{ChessMove, File, Piece, Rank, Square};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/*-------ARCHITECTURE--------*/

// Move          from/to square plus an optional promotion piece. The same value
//               flows out of a drop and out of the oracle's reply.
// LegalMove     a Move as the rules engine sees it right now, tagged with the
//               special handling it needs (castle, en passant, promotion).
// LegalMoveSet  every LegalMove of one piece, snapshotted when a drag starts.

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("expected 4 or 5 characters, got {0}")]
    WrongLength(usize),
    #[error("`{0}` is not a square")]
    InvalidSquare(String),
    #[error("`{0}` is not a promotion piece")]
    InvalidPromotion(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to, promotion: None }
    }

    pub fn with_promotion(mut self, piece: Piece) -> Self {
        self.promotion = Some(piece);
        self
    }

    /// Parse coordinate notation as sent by move oracles: `e2e4`, `a7a8q`.
    ///
    /// Only lowercase is accepted, matching `^[a-h][1-8][a-h][1-8][qrbn]?$`.
    pub fn from_uci(s: &str) -> Result<Self, MoveParseError> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 && bytes.len() != 5 {
            return Err(MoveParseError::WrongLength(s.chars().count()));
        }
        let from = parse_square(&bytes[0..2])?;
        let to = parse_square(&bytes[2..4])?;
        let mut mv = Move::new(from, to);
        if let Some(&c) = bytes.get(4) {
            let piece = promotion_piece(c as char).ok_or(MoveParseError::InvalidPromotion(c as char))?;
            mv = mv.with_promotion(piece);
        }
        Ok(mv)
    }

    pub(crate) fn to_chess(self) -> ChessMove {
        ChessMove::new(self.from, self.to, self.promotion)
    }
}

impl From<ChessMove> for Move {
    fn from(cm: ChessMove) -> Self {
        Self {
            from: cm.get_source(),
            to: cm.get_dest(),
            promotion: cm.get_promotion(),
        }
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::from_uci(s)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", promotion_char(piece))?;
        }
        Ok(())
    }
}

fn parse_square(b: &[u8]) -> Result<Square, MoveParseError> {
    match (b[0], b[1]) {
        (file @ b'a'..=b'h', rank @ b'1'..=b'8') => Ok(Square::make_square(
            Rank::from_index((rank - b'1') as usize),
            File::from_index((file - b'a') as usize),
        )),
        _ => Err(MoveParseError::InvalidSquare(String::from_utf8_lossy(b).into_owned())),
    }
}

fn promotion_piece(c: char) -> Option<Piece> {
    match c {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}

fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Queen => 'q',
        Piece::Rook => 'r',
        Piece::Bishop => 'b',
        Piece::Knight => 'n',
        Piece::Pawn => 'p',
        Piece::King => 'k',
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveType {
    Normal,
    Capture,
    EnPassant,
    Promotion,
    KingsideCastle,
    QueensideCastle,
}

impl MoveType {
    pub fn is_promotion(&self) -> bool {
        matches!(self, MoveType::Promotion)
    }

    pub fn is_castle(&self) -> bool {
        matches!(self, MoveType::KingsideCastle | MoveType::QueensideCastle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegalMove {
    pub mv: Move,
    pub move_type: MoveType,
}

/// Immutable snapshot of the legal moves of a single piece.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegalMoveSet {
    moves: SmallVec<[LegalMove; 32]>,
}

impl LegalMoveSet {
    /// The entry landing on `to`, carrying its special-move flags.
    pub fn find_to(&self, to: Square) -> Option<LegalMove> {
        self.moves.iter().copied().find(|m| m.mv.to == to)
    }

    pub fn destinations(&self) -> impl Iterator<Item = Square> + '_ {
        self.moves.iter().map(|m| m.mv.to)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl FromIterator<LegalMove> for LegalMoveSet {
    fn from_iter<I: IntoIterator<Item = LegalMove>>(iter: I) -> Self {
        Self {
            moves: iter.into_iter().collect(),
        }
    }
}
