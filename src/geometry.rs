//! Screen geometry: rectangles, overlap tests and best-fit square resolution.
//!
//! Everything here works in physical pixels with the origin at the top-left of
//! the window, the same space winit reports cursor and touch positions in.
//!
//! # Best-fit resolution
//!
//! A dragged piece is free-floating, so on release it usually straddles up to
//! four squares. [`closest_fit`] picks the square whose top-left corner is
//! nearest (Manhattan distance) to the piece's top-left corner. The square's
//! reference corner is nudged one pixel up and left so that a piece sitting
//! exactly on a shared border resolves deterministically instead of flipping
//! between two squares of the same colour.

use chess::{Color, File, Rank, Square, ALL_SQUARES};
use smallvec::SmallVec;
use winit::dpi::PhysicalPosition;

/// Pixel bias applied to a square's reference corner when breaking ties.
const TIE_BREAK_BIAS: f64 = 1.0;

/// A point in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<PhysicalPosition<f64>> for Point {
    fn from(pos: PhysicalPosition<f64>) -> Self {
        Self::new(pos.x, pos.y)
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right() && p.y >= self.top && p.y < self.bottom()
    }
}

/// True unless `a` lies entirely outside `b` on some axis.
///
/// Shared edges do not count as overlap, so a piece resting exactly on one
/// square never reports its neighbours as candidates.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    !(a.right() <= b.left || a.left >= b.right() || a.bottom() <= b.top || a.top >= b.bottom())
}

/// Offset between the piece's top-left corner and the biased square corner.
fn fit_distance(piece: &Rect, square: &Rect) -> f64 {
    (square.left - TIE_BREAK_BIAS - piece.left).abs() + (square.top - TIE_BREAK_BIAS - piece.top).abs()
}

/// Pick the candidate square the piece sits most squarely on.
///
/// Returns `None` for an empty candidate list; callers fall back to the
/// square the piece came from. On equal distance the earlier candidate wins.
pub fn closest_fit(piece: &Rect, candidates: &[(Square, Rect)]) -> Option<Square> {
    let mut best: Option<(Square, f64)> = None;
    for (square, rect) in candidates {
        let d = fit_distance(piece, rect);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((*square, d)),
        }
    }
    best.map(|(square, _)| square)
}

/// Light squares are the ones a1 is not.
pub fn is_light_square(square: Square) -> bool {
    (square.get_file().to_index() + square.get_rank().to_index()) % 2 == 1
}

/// Where the board sits on screen and which side is drawn at the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    origin: Point,
    square_size: f64,
    pov: Color,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::new(Point::new(0.0, 0.0), 80.0, Color::White)
    }
}

impl BoardLayout {
    pub fn new(origin: Point, square_size: f64, pov: Color) -> Self {
        Self { origin, square_size, pov }
    }

    pub fn square_size(&self) -> f64 {
        self.square_size
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn pov(&self) -> Color {
        self.pov
    }

    /// Track a window resize: the board keeps its origin and rescales.
    pub fn resize(&mut self, origin: Point, square_size: f64) {
        self.origin = origin;
        self.square_size = square_size;
    }

    /// Column and row (0..8, top-left first) a square is drawn at.
    fn cell(&self, square: Square) -> (usize, usize) {
        let file = square.get_file().to_index();
        let rank = square.get_rank().to_index();
        match self.pov {
            Color::White => (file, 7 - rank),
            Color::Black => (7 - file, rank),
        }
    }

    pub fn square_rect(&self, square: Square) -> Rect {
        let (col, row) = self.cell(square);
        Rect::new(
            self.origin.x + col as f64 * self.square_size,
            self.origin.y + row as f64 * self.square_size,
            self.square_size,
            self.square_size,
        )
    }

    pub fn square_center(&self, square: Square) -> Point {
        self.square_rect(square).center()
    }

    /// Square under a screen point, if the point is on the board.
    pub fn square_at(&self, p: Point) -> Option<Square> {
        let col = ((p.x - self.origin.x) / self.square_size).floor();
        let row = ((p.y - self.origin.y) / self.square_size).floor();
        if !(0.0..8.0).contains(&col) || !(0.0..8.0).contains(&row) {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        let (file, rank) = match self.pov {
            Color::White => (col, 7 - row),
            Color::Black => (7 - col, row),
        };
        Some(Square::make_square(Rank::from_index(rank), File::from_index(file)))
    }

    /// Top-left corner of a square-sized piece centred on the pointer.
    pub fn drag_origin(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.square_size / 2.0, pointer.y - self.square_size / 2.0)
    }

    /// Rectangle of a piece whose top-left corner is at `at`.
    pub fn piece_rect(&self, at: Point) -> Rect {
        Rect::new(at.x, at.y, self.square_size, self.square_size)
    }

    /// All squares whose rectangle overlaps `rect`, in screen order: top row
    /// first, left to right within a row. [`closest_fit`] keeps the earlier
    /// candidate on a tie, so the upper-left square wins from either side.
    pub fn overlapping(&self, rect: &Rect) -> SmallVec<[(Square, Rect); 4]> {
        let mut candidates: SmallVec<[(Square, Rect); 4]> = ALL_SQUARES
            .iter()
            .map(|&sq| (sq, self.square_rect(sq)))
            .filter(|(_, r)| overlaps(rect, r))
            .collect();
        candidates.sort_by(|(_, a), (_, b)| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));
        candidates
    }
}
