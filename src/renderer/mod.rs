use crate::board::PieceId;
use crate::endgame::GameResult;
use crate::game_repr::{Color, Piece, Square};
use crate::geometry::Point;
use std::cell::RefCell;
use std::rc::Rc;

/// Tint applied to a legal destination while a piece is being dragged.
///
/// Squares keep their checkerboard tone: a light square gets the light
/// highlight, a dark square the dark one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Light,
    Dark,
}

/// Visual surface the interaction pipeline drives.
///
/// The pipeline owns every decision; a renderer only mirrors it. Implementations
/// never call back into the game, so a window backend, a terminal view and a
/// test recorder are interchangeable.
pub trait Renderer {
    /// A new piece appears on `square`.
    fn add_piece(&mut self, id: PieceId, color: Color, kind: Piece, square: Square);

    /// Snap a piece to the centre of `square`, dropping any drag offset.
    fn place_piece(&mut self, id: PieceId, square: Square);

    /// Draw a piece with its top-left corner at an absolute screen point.
    ///
    /// Used while dragging and while animating.
    fn set_piece_offset(&mut self, id: PieceId, at: Point);

    /// Draw the piece above all others (it is being held).
    fn set_raised(&mut self, id: PieceId, raised: bool);

    /// The piece left the board (captured).
    fn remove_piece(&mut self, id: PieceId);

    /// The piece now shows a different kind (promotion).
    fn set_piece_kind(&mut self, id: PieceId, color: Color, kind: Piece);

    /// Set or clear the destination tint on a square.
    fn set_highlight(&mut self, square: Square, highlight: Option<Highlight>);

    /// Toggle the "oracle is thinking" indicator.
    fn set_thinking(&mut self, thinking: bool);

    /// Announce the end of the game.
    fn show_result(&mut self, result: &GameResult);

    /// Track a window resize.
    fn resize(&mut self, _new_size: (u32, u32)) {}
}

/// Renderer that draws nothing. Used by the headless binary.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn add_piece(&mut self, _id: PieceId, _color: Color, _kind: Piece, _square: Square) {}
    fn place_piece(&mut self, _id: PieceId, _square: Square) {}
    fn set_piece_offset(&mut self, _id: PieceId, _at: Point) {}
    fn set_raised(&mut self, _id: PieceId, _raised: bool) {}
    fn remove_piece(&mut self, _id: PieceId) {}
    fn set_piece_kind(&mut self, _id: PieceId, _color: Color, _kind: Piece) {}
    fn set_highlight(&mut self, _square: Square, _highlight: Option<Highlight>) {}
    fn set_thinking(&mut self, _thinking: bool) {}
    fn show_result(&mut self, _result: &GameResult) {}
}

/// One call made on a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Add(PieceId, Color, Piece, Square),
    Place(PieceId, Square),
    Offset(PieceId, Point),
    Raised(PieceId, bool),
    Remove(PieceId),
    Kind(PieceId, Color, Piece),
    Highlight(Square, Option<Highlight>),
    Thinking(bool),
    Result(GameResult),
    Resize(u32, u32),
}

/// Renderer that appends every call to a shared log.
///
/// The log handle stays with the caller after the renderer is boxed into a
/// [`Board`](crate::board::Board), so assertions can inspect what was drawn.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    log: Rc<RefCell<Vec<RenderCommand>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<Vec<RenderCommand>>> {
        Rc::clone(&self.log)
    }

    fn push(&self, cmd: RenderCommand) {
        self.log.borrow_mut().push(cmd);
    }
}

impl Renderer for RecordingRenderer {
    fn add_piece(&mut self, id: PieceId, color: Color, kind: Piece, square: Square) {
        self.push(RenderCommand::Add(id, color, kind, square));
    }

    fn place_piece(&mut self, id: PieceId, square: Square) {
        self.push(RenderCommand::Place(id, square));
    }

    fn set_piece_offset(&mut self, id: PieceId, at: Point) {
        self.push(RenderCommand::Offset(id, at));
    }

    fn set_raised(&mut self, id: PieceId, raised: bool) {
        self.push(RenderCommand::Raised(id, raised));
    }

    fn remove_piece(&mut self, id: PieceId) {
        self.push(RenderCommand::Remove(id));
    }

    fn set_piece_kind(&mut self, id: PieceId, color: Color, kind: Piece) {
        self.push(RenderCommand::Kind(id, color, kind));
    }

    fn set_highlight(&mut self, square: Square, highlight: Option<Highlight>) {
        self.push(RenderCommand::Highlight(square, highlight));
    }

    fn set_thinking(&mut self, thinking: bool) {
        self.push(RenderCommand::Thinking(thinking));
    }

    fn show_result(&mut self, result: &GameResult) {
        self.push(RenderCommand::Result(*result));
    }

    fn resize(&mut self, new_size: (u32, u32)) {
        self.push(RenderCommand::Resize(new_size.0, new_size.1));
    }
}
