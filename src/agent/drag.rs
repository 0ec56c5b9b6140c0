//! Drag session controller for the local player.
//!
//! One session covers one interaction, from press to release:
//!
//! ```text
//! Idle --Down on own piece--> Dragging --Up / MultiTouch--> Committing --finish--> Idle
//!                              |   ^
//!                              +---+ Move (reposition only)
//! ```
//!
//! Legal destinations are queried once, when the session opens, and that
//! snapshot is the only legality reference until release. While dragging the
//! piece is lifted off its square and raised; [`DragController::finish`] lowers
//! it again if the commit did not settle it, so no outcome leaves a piece
//! floating.

use crate::arbiter::{resolve, Resolution};
use crate::board::{Board, PieceId};
use crate::game_repr::{Color, LegalMoveSet, Rules, Square};
use crate::geometry::Point;
use crate::input::{PointerEvent, PointerId};
use log::debug;

/// A single press-to-release interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub piece: PieceId,
    pub origin: Square,
    /// Snapshot of the piece's legal moves taken at press time
    pub legal: LegalMoveSet,
    pub pointer: PointerId,
    /// Last pointer position seen
    pub last: Point,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
    /// Released; waiting for the caller to commit or revert and call `finish`.
    Committing,
}

/// What the controller needs to see of the game for one event.
pub struct DragContext<'a> {
    pub board: &'a mut Board,
    pub rules: &'a Rules,
    /// Side the local player may move; `None` lets either side move.
    pub allowed: Option<Color>,
    /// False while a commit or an oracle round-trip is in flight.
    pub input_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Ignored,
    Started { piece: PieceId, origin: Square },
    Moved { piece: PieceId, at: Point },
    /// The drop was resolved. On `Revert` the piece is already back home.
    Released { session: DragSession, resolution: Resolution },
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    pub fn dispatch(&mut self, event: PointerEvent, ctx: DragContext<'_>) -> DragOutcome {
        match event {
            PointerEvent::Down { pointer, at } if self.is_idle() => self.begin(pointer, at, ctx),
            PointerEvent::Move { pointer, at } => {
                let DragState::Dragging(session) = &mut self.state else {
                    return DragOutcome::Ignored;
                };
                if session.pointer != pointer {
                    return DragOutcome::Ignored;
                }
                session.last = at;
                let origin = ctx.board.layout().drag_origin(at);
                ctx.board.move_lifted(session.piece, origin);
                DragOutcome::Moved {
                    piece: session.piece,
                    at: origin,
                }
            }
            PointerEvent::Up { pointer, at } if self.held_by(pointer) => self.release(at, ctx.board),
            PointerEvent::MultiTouch => {
                let DragState::Dragging(session) = &self.state else {
                    return DragOutcome::Ignored;
                };
                let at = session.last;
                debug!("second touch while dragging, releasing at {at:?}");
                self.release(at, ctx.board)
            }
            _ => DragOutcome::Ignored,
        }
    }

    fn held_by(&self, pointer: PointerId) -> bool {
        matches!(&self.state, DragState::Dragging(session) if session.pointer == pointer)
    }

    fn begin(&mut self, pointer: PointerId, at: Point, ctx: DragContext<'_>) -> DragOutcome {
        if !ctx.input_enabled {
            return DragOutcome::Ignored;
        }
        let Some(piece) = ctx.board.piece_at_point(at) else {
            return DragOutcome::Ignored;
        };
        let Some(color) = ctx.board.piece(piece).map(|p| p.color) else {
            return DragOutcome::Ignored;
        };
        if color != ctx.rules.turn() || ctx.allowed.is_some_and(|side| side != color) {
            debug!("ignoring press on a {color:?} piece");
            return DragOutcome::Ignored;
        }
        let lifted_at = ctx.board.layout().drag_origin(at);
        let Some(origin) = ctx.board.lift(piece, lifted_at) else {
            return DragOutcome::Ignored;
        };
        let legal = ctx.rules.legal_moves(origin);
        ctx.board.highlight(legal.destinations());
        debug!("drag started on {origin} with {} legal moves", legal.len());
        self.state = DragState::Dragging(DragSession {
            piece,
            origin,
            legal,
            pointer,
            last: at,
        });
        DragOutcome::Started { piece, origin }
    }

    fn release(&mut self, at: Point, board: &mut Board) -> DragOutcome {
        let DragState::Dragging(session) = std::mem::replace(&mut self.state, DragState::Committing) else {
            return DragOutcome::Ignored;
        };
        board.clear_highlights();
        let rect = board.layout().piece_rect(board.layout().drag_origin(at));
        let resolution = resolve(&rect, board.layout(), &session.legal);
        if resolution == Resolution::Revert {
            board.lower(session.piece);
        }
        DragOutcome::Released { session, resolution }
    }

    /// End the session after the commit attempt. Lowers the piece if the
    /// commit left it lifted, then returns to `Idle`.
    pub fn finish(&mut self, board: &mut Board, piece: PieceId) {
        board.lower(piece);
        self.state = DragState::Idle;
    }
}
