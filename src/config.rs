//! Per-game settings, fixed when the game starts.

use crate::animation::{SPEED, TICK};
use crate::game_repr::{Color, START_FEN};
use crate::geometry::{BoardLayout, Point};
use std::time::Duration;

/// Everything needed to start a game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Side the local player may drag. `None` lets either side move.
    pub local_side: Option<Color>,
    /// Side whose moves come from the oracle. `None` for hot-seat play.
    pub oracle_side: Option<Color>,
    /// Position the game starts from
    pub starting_fen: String,
    /// Interval between animation frames
    pub tick: Duration,
    /// Pixels an animated piece travels per tick
    pub speed: f64,
    /// Board placement on screen
    pub layout: BoardLayout,
}

impl GameConfig {
    /// Two local players sharing the board.
    pub fn hot_seat() -> Self {
        Self {
            local_side: None,
            oracle_side: None,
            starting_fen: START_FEN.to_owned(),
            tick: TICK,
            speed: SPEED,
            layout: BoardLayout::default(),
        }
    }

    /// Local player against the move oracle.
    ///
    /// # Arguments
    /// * `local_side` - The colour the local player drags; the board is drawn from its side
    pub fn versus_oracle(local_side: Color) -> Self {
        Self {
            local_side: Some(local_side),
            oracle_side: Some(!local_side),
            layout: BoardLayout::new(Point::new(0.0, 0.0), 80.0, local_side),
            ..Self::hot_seat()
        }
    }

    pub fn with_fen(mut self, fen: impl Into<String>) -> Self {
        self.starting_fen = fen.into();
        self
    }

    pub fn with_layout(mut self, layout: BoardLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Whether moves for `side` come from the oracle.
    pub fn is_oracle_side(&self, side: Color) -> bool {
        self.oracle_side == Some(side)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::versus_oracle(Color::White)
    }
}
