//! Terminal-state classification, run after every committed move.

use crate::game_repr::{Color, Rules};
use std::fmt;

/// Why the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Checkmate,
    ThreefoldRepetition,
    Stalemate,
    InsufficientMaterial,
    /// Any other draw the rules report (fifty-move rule).
    OtherDraw,
}

/// Final outcome of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    /// `None` for every kind of draw
    pub winner: Option<Color>,
    pub termination: Termination,
}

impl GameResult {
    pub fn checkmate(winner: Color) -> Self {
        Self {
            winner: Some(winner),
            termination: Termination::Checkmate,
        }
    }

    pub fn draw(termination: Termination) -> Self {
        Self { winner: None, termination }
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    /// Banner line: `WHITE wins by`, `BLACK wins by` or `DRAW`.
    pub fn headline(&self) -> &'static str {
        match self.winner {
            Some(Color::White) => "WHITE wins by",
            Some(Color::Black) => "BLACK wins by",
            None => "DRAW",
        }
    }

    /// Reason line. Empty for an unclassified draw.
    pub fn reason(&self) -> &'static str {
        match self.termination {
            Termination::Checkmate => "CHECKMATE",
            Termination::ThreefoldRepetition => "Threefold Repetition",
            Termination::Stalemate => "Stalemate",
            Termination::InsufficientMaterial => "Insufficient Material",
            Termination::OtherDraw => "",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            "" => write!(f, "{}", self.headline()),
            reason if self.is_draw() => write!(f, "{} by {}", self.headline(), reason),
            reason => write!(f, "{} {}", self.headline(), reason),
        }
    }
}

/// Classify the current position.
///
/// Checks run in a fixed priority order (checkmate, threefold repetition,
/// stalemate, insufficient material, other draw) and the first hit wins, so a
/// stalemate that is also a third repetition reports the repetition.
pub fn evaluate(rules: &Rules) -> Option<GameResult> {
    if rules.is_checkmate() {
        // the side to move is the one mated
        Some(GameResult::checkmate(!rules.turn()))
    } else if rules.is_threefold() {
        Some(GameResult::draw(Termination::ThreefoldRepetition))
    } else if rules.is_stalemate() {
        Some(GameResult::draw(Termination::Stalemate))
    } else if rules.is_insufficient_material() {
        Some(GameResult::draw(Termination::InsufficientMaterial))
    } else if rules.is_draw() {
        Some(GameResult::draw(Termination::OtherDraw))
    } else {
        None
    }
}
