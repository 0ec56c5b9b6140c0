use crate::endgame::GameResult;
use crate::game_repr::{Color, Piece, Rules, Square};
use crate::geometry::{is_light_square, BoardLayout, Point, Rect};
use crate::renderer::{Highlight, Renderer};
use chess::ALL_SQUARES;
use log::warn;
use smallvec::SmallVec;

/// Stable handle to a visual piece: an index into the board's piece arena.
///
/// Ids are never reused within a game, so a handle captured at drag start
/// still names the same piece when the drop is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId(usize);

/// Who holds positional authority over a piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Resting in a square; the occupancy map lists it there.
    OnSquare(Square),
    /// Held by a drag or an animation, drawn at `at`, absent from occupancy.
    Lifted { home: Square, at: Point },
    Captured,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualPiece {
    pub color: Color,
    pub kind: Piece,
    pub placement: Placement,
}

/// Board component: the on-screen pieces and which square holds each of them.
///
/// The Board mirrors the rules engine's position with visual pieces that can be
/// picked up and carried around. It forwards every visual change to its
/// [`Renderer`], so the renderer never has to diff positions.
///
/// # Ownership
///
/// Every live piece is owned by exactly one of:
/// - a square, through the occupancy map ([`Placement::OnSquare`])
/// - a drag session or an animation ([`Placement::Lifted`])
///
/// Lifting a piece removes it from occupancy and lowering or settling puts it
/// back, so the two can never both claim it.
///
/// # Writers
///
/// Read access and lifting are public. Changing occupancy (`settle`,
/// `capture_at`, `swap_kind`) is crate-private and only reached from the
/// commit path in [`special_moves`](crate::special_moves).
///
/// # Usage
///
/// ```rust,ignore
/// let mut board = Board::from_rules(&rules, BoardLayout::default(), Box::new(NullRenderer));
///
/// let id = board.piece_at_point(pointer).unwrap();
/// board.lift(id, layout.drag_origin(pointer));
/// board.move_lifted(id, layout.drag_origin(next_pointer));
///
/// // snap back on an illegal drop
/// board.lower(id);
/// ```
pub struct Board {
    /// Piece arena, indexed by [`PieceId`]
    pieces: Vec<VisualPiece>,

    /// Occupant of each square, indexed by `Square::to_index`
    occupancy: [Option<PieceId>; 64],

    /// Screen placement of the squares
    layout: BoardLayout,

    /// Renderer mirroring every change
    renderer: Box<dyn Renderer>,

    /// Squares currently tinted as legal destinations
    highlighted: SmallVec<[Square; 32]>,
}

impl Board {
    /// Create a board showing the position held by `rules`.
    ///
    /// # Arguments
    ///
    /// * `rules` - Position to mirror
    /// * `layout` - Where the squares are on screen
    /// * `renderer` - Visual surface that receives every change
    pub fn from_rules(rules: &Rules, layout: BoardLayout, renderer: Box<dyn Renderer>) -> Self {
        let mut board = Self {
            pieces: Vec::with_capacity(32),
            occupancy: [None; 64],
            layout,
            renderer,
            highlighted: SmallVec::new(),
        };
        board.populate(rules);
        board
    }

    fn populate(&mut self, rules: &Rules) {
        for &square in ALL_SQUARES.iter() {
            if let Some((color, kind)) = rules.piece_on(square) {
                let id = PieceId(self.pieces.len());
                self.pieces.push(VisualPiece {
                    color,
                    kind,
                    placement: Placement::OnSquare(square),
                });
                self.occupancy[square.to_index()] = Some(id);
                self.renderer.add_piece(id, color, kind, square);
            }
        }
    }

    pub fn piece(&self, id: PieceId) -> Option<&VisualPiece> {
        self.pieces.get(id.0)
    }

    pub fn occupant(&self, square: Square) -> Option<PieceId> {
        self.occupancy[square.to_index()]
    }

    /// Colour and kind of the piece resting on `square`.
    pub fn piece_on(&self, square: Square) -> Option<(Color, Piece)> {
        let piece = self.piece(self.occupant(square)?)?;
        Some((piece.color, piece.kind))
    }

    /// The resting piece under a screen point, if any.
    pub fn piece_at_point(&self, at: Point) -> Option<PieceId> {
        self.occupant(self.layout.square_at(at)?)
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    /// Replace the layout after a resize and redraw resting pieces in place.
    pub fn set_layout(&mut self, layout: BoardLayout, window_size: (u32, u32)) {
        self.layout = layout;
        self.renderer.resize(window_size);
        for (index, piece) in self.pieces.iter().enumerate() {
            if let Placement::OnSquare(square) = piece.placement {
                self.renderer.place_piece(PieceId(index), square);
            }
        }
    }

    /// Screen rectangle a piece currently covers.
    pub fn rect_of(&self, id: PieceId) -> Option<Rect> {
        match self.piece(id)?.placement {
            Placement::OnSquare(square) => Some(self.layout.square_rect(square)),
            Placement::Lifted { at, .. } => Some(self.layout.piece_rect(at)),
            Placement::Captured => None,
        }
    }

    /// Take a resting piece off its square and draw it raised at `at`.
    ///
    /// # Returns
    ///
    /// The square the piece came from, or `None` if it was not resting.
    pub fn lift(&mut self, id: PieceId, at: Point) -> Option<Square> {
        let piece = self.pieces.get_mut(id.0)?;
        let Placement::OnSquare(home) = piece.placement else {
            return None;
        };
        piece.placement = Placement::Lifted { home, at };
        self.occupancy[home.to_index()] = None;
        self.renderer.set_raised(id, true);
        self.renderer.set_piece_offset(id, at);
        Some(home)
    }

    /// Reposition a lifted piece. Resting pieces are left alone.
    pub fn move_lifted(&mut self, id: PieceId, to: Point) {
        if let Some(VisualPiece {
            placement: Placement::Lifted { at, .. },
            ..
        }) = self.pieces.get_mut(id.0)
        {
            *at = to;
            self.renderer.set_piece_offset(id, to);
        }
    }

    /// Return a lifted piece to the square it was lifted from.
    pub fn lower(&mut self, id: PieceId) {
        if let Some(Placement::Lifted { home, .. }) = self.piece(id).map(|p| p.placement) {
            self.settle(id, home);
        }
    }

    /// Tint the given squares, each with the tone of its own colour.
    pub fn highlight(&mut self, squares: impl IntoIterator<Item = Square>) {
        for square in squares {
            let tone = if is_light_square(square) {
                Highlight::Light
            } else {
                Highlight::Dark
            };
            self.renderer.set_highlight(square, Some(tone));
            self.highlighted.push(square);
        }
    }

    pub fn clear_highlights(&mut self) {
        for square in self.highlighted.drain(..) {
            self.renderer.set_highlight(square, None);
        }
    }

    pub fn set_thinking(&mut self, thinking: bool) {
        self.renderer.set_thinking(thinking);
    }

    pub fn show_result(&mut self, result: &GameResult) {
        self.renderer.show_result(result);
    }

    /// True when every square holds what the rules engine says it holds.
    pub fn agrees_with(&self, rules: &Rules) -> bool {
        ALL_SQUARES.iter().all(|&sq| self.piece_on(sq) == rules.piece_on(sq))
    }

    /// Remove whatever rests on `square`. Returns the captured piece.
    pub(crate) fn capture_at(&mut self, square: Square) -> Option<PieceId> {
        let id = self.occupancy[square.to_index()].take()?;
        if let Some(piece) = self.pieces.get_mut(id.0) {
            piece.placement = Placement::Captured;
        }
        self.renderer.remove_piece(id);
        Some(id)
    }

    /// Throw away every visual piece and redraw the position held by `rules`.
    ///
    /// Only for recovering from a commit that left the two out of step. Old
    /// ids become [`Placement::Captured`]; the new pieces get fresh ids.
    pub(crate) fn resync(&mut self, rules: &Rules) {
        warn!("redrawing the board from {}", rules.position_notation());
        self.clear_highlights();
        for (index, piece) in self.pieces.iter_mut().enumerate() {
            if piece.placement != Placement::Captured {
                piece.placement = Placement::Captured;
                self.renderer.remove_piece(PieceId(index));
            }
        }
        self.occupancy = [None; 64];
        self.populate(rules);
    }

    /// Put `id` to rest on `square`, capturing any other occupant.
    ///
    /// Settling a piece where it already rests changes nothing.
    pub(crate) fn settle(&mut self, id: PieceId, square: Square) {
        let Some(placement) = self.piece(id).map(|p| p.placement) else {
            return;
        };
        match placement {
            Placement::OnSquare(current) if current == square => return,
            Placement::OnSquare(current) => self.occupancy[current.to_index()] = None,
            Placement::Lifted { .. } => self.renderer.set_raised(id, false),
            Placement::Captured => return,
        }
        if self.occupant(square).is_some_and(|other| other != id) {
            self.capture_at(square);
        }
        self.occupancy[square.to_index()] = Some(id);
        self.pieces[id.0].placement = Placement::OnSquare(square);
        self.renderer.place_piece(id, square);
    }

    /// Show `id` as a different kind. Returns whether anything changed.
    pub(crate) fn swap_kind(&mut self, id: PieceId, kind: Piece) -> bool {
        let Some(piece) = self.pieces.get_mut(id.0) else {
            return false;
        };
        if piece.kind == kind {
            return false;
        }
        piece.kind = kind;
        self.renderer.set_piece_kind(id, piece.color, kind);
        true
    }
}
