//! The commit path: the only code that moves pieces between squares.
//!
//! A commit applies one accepted move to both the visual board and the rules
//! engine, with its side effects in a fixed order:
//!
//! 1. promotion: the piece is shown as the promoted kind (queen unless a
//!    choice was supplied) and the rules engine always gets that choice
//! 2. en passant: the pawn on (destination file, origin rank) is removed
//! 3. the moving piece is settled on its destination, capturing any occupant
//! 4. the move is applied to the rules engine
//! 5. castling: a rook relocation is returned as a follow-up request
//!
//! The follow-up goes back through [`commit`] with [`MoveOrigin::Castling`],
//! which never yields a follow-up of its own, so the recursion is at most one
//! level deep. Validation happens before the first visual change: a commit
//! either runs to completion or leaves both the board and the rules untouched.

use crate::board::{Board, PieceId, Placement};
use crate::game_repr::{LegalMove, Move, MoveType, Piece, Rules, RulesError, Square};
use chess::{File, Rank};
use log::{debug, info};
use smallvec::SmallVec;
use thiserror::Error;

/// Where a committed move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOrigin {
    /// Dropped by the local player
    Local,
    /// Supplied by the move oracle
    Oracle,
    /// Rook half of a castling move
    Castling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedMove {
    pub mv: Move,
    pub move_type: MoveType,
    pub origin: MoveOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("no piece on {0}")]
    MissingPiece(Square),
    #[error("board and rules disagree about {0}")]
    Inconsistent(Move),
    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// A move ready to be committed, tied to the visual piece that makes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitRequest {
    pub piece: PieceId,
    pub entry: LegalMove,
    /// Promotion piece if one was chosen; queen otherwise
    pub promotion: Option<Piece>,
    pub origin: MoveOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub committed: CommittedMove,
    /// Rook relocation still to be committed after a castling king move
    pub follow_up: Option<CommitRequest>,
}

/// Squares the rook moves between when the king castles with `king_move`.
pub fn rook_relocation(king_move: &Move, move_type: MoveType) -> Option<(Square, Square)> {
    let rank: Rank = king_move.from.get_rank();
    let (from, to) = match move_type {
        MoveType::KingsideCastle => (File::H, File::F),
        MoveType::QueensideCastle => (File::A, File::D),
        _ => return None,
    };
    Some((Square::make_square(rank, from), Square::make_square(rank, to)))
}

/// Square of the pawn taken by an en passant move: destination file, origin rank.
pub fn en_passant_victim(mv: &Move) -> Square {
    Square::make_square(mv.from.get_rank(), mv.to.get_file())
}

/// Show `piece` as `kind`. A second call with the same kind does nothing.
pub fn apply_promotion(board: &mut Board, piece: PieceId, kind: Piece) -> bool {
    board.swap_kind(piece, kind)
}

/// Take the en passant victim off the board. A second call finds nothing.
pub fn remove_en_passant_victim(board: &mut Board, mv: &Move) -> Option<PieceId> {
    board.capture_at(en_passant_victim(mv))
}

/// Square the piece belongs to while the commit is pending.
fn home_of(board: &Board, piece: PieceId) -> Option<Square> {
    match board.piece(piece)?.placement {
        Placement::OnSquare(square) | Placement::Lifted { home: square, .. } => Some(square),
        Placement::Captured => None,
    }
}

/// Commit one move. See the module docs for the order of effects.
pub fn commit(board: &mut Board, rules: &mut Rules, req: CommitRequest) -> Result<Commit, CommitError> {
    let entry = req.entry;
    let home = home_of(board, req.piece).ok_or(CommitError::MissingPiece(entry.mv.from))?;
    if home != entry.mv.from {
        return Err(CommitError::Inconsistent(entry.mv));
    }
    let shown = board
        .piece(req.piece)
        .map(|p| (p.color, p.kind))
        .ok_or(CommitError::MissingPiece(entry.mv.from))?;

    if req.origin == MoveOrigin::Castling {
        return commit_rook(board, rules, req, shown);
    }

    if rules.piece_on(entry.mv.from) != Some(shown) {
        return Err(CommitError::Inconsistent(entry.mv));
    }

    let mut mv = entry.mv;
    mv.promotion = None;
    if entry.move_type.is_promotion() {
        mv.promotion = Some(req.promotion.unwrap_or(Piece::Queen));
    }
    let checked = rules.check(&mv)?;

    let rook = match rook_relocation(&mv, entry.move_type) {
        Some((rook_from, rook_to)) => {
            let id = board.occupant(rook_from).ok_or(CommitError::MissingPiece(rook_from))?;
            Some((id, rook_from, rook_to))
        }
        None => None,
    };

    if let Some(kind) = mv.promotion {
        apply_promotion(board, req.piece, kind);
    }
    if entry.move_type == MoveType::EnPassant {
        if let Some(victim) = remove_en_passant_victim(board, &mv) {
            debug!("en passant removed {victim:?} from {}", en_passant_victim(&mv));
        }
    }
    board.settle(req.piece, mv.to);
    rules.apply_move(mv)?;
    info!("committed {mv} ({:?}, {:?})", checked.move_type, req.origin);

    let follow_up = rook.map(|(piece, from, to)| CommitRequest {
        piece,
        entry: LegalMove {
            mv: Move::new(from, to),
            move_type: MoveType::Normal,
        },
        promotion: None,
        origin: MoveOrigin::Castling,
    });

    Ok(Commit {
        committed: CommittedMove {
            mv,
            move_type: checked.move_type,
            origin: req.origin,
        },
        follow_up,
    })
}

/// Visual half of castling. The rules engine moved the rook with the king,
/// so this only checks it agrees and settles the piece.
fn commit_rook(
    board: &mut Board,
    rules: &Rules,
    req: CommitRequest,
    shown: (chess::Color, Piece),
) -> Result<Commit, CommitError> {
    let mv = req.entry.mv;
    if shown.1 != Piece::Rook || rules.piece_on(mv.to) != Some(shown) {
        return Err(CommitError::Inconsistent(mv));
    }
    board.settle(req.piece, mv.to);
    info!("committed {mv} (castling rook)");
    Ok(Commit {
        committed: CommittedMove {
            mv,
            move_type: MoveType::Normal,
            origin: MoveOrigin::Castling,
        },
        follow_up: None,
    })
}

/// Commit a move and its castling follow-up at once, without animating.
pub fn commit_all(
    board: &mut Board,
    rules: &mut Rules,
    req: CommitRequest,
) -> Result<SmallVec<[CommittedMove; 2]>, CommitError> {
    let mut done = SmallVec::new();
    let first = commit(board, rules, req)?;
    done.push(first.committed);
    if let Some(rook) = first.follow_up {
        done.push(commit(board, rules, rook)?.committed);
    }
    Ok(done)
}
