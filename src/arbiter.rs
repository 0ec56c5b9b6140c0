//! Drop resolution: turns where a piece was let go into a move or a snap-back.

use crate::game_repr::{LegalMove, LegalMoveSet};
use crate::geometry::{closest_fit, BoardLayout, Rect};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The drop lands on a legal destination; carries the matching entry.
    Accept(LegalMove),
    /// Put the piece back on its origin square. Not an error.
    Revert,
}

/// Decide the outcome of dropping a piece whose final rectangle is `piece`.
///
/// The legal set is the snapshot taken when the drag began. Dropping off the
/// board, or onto a square the piece cannot reach, reverts.
pub fn resolve(piece: &Rect, layout: &BoardLayout, legal: &LegalMoveSet) -> Resolution {
    let candidates = layout.overlapping(piece);
    let Some(target) = closest_fit(piece, &candidates) else {
        debug!("drop overlaps no square, reverting");
        return Resolution::Revert;
    };
    match legal.find_to(target) {
        Some(entry) => Resolution::Accept(entry),
        None => {
            debug!("{target} is not a legal destination, reverting");
            Resolution::Revert
        }
    }
}
