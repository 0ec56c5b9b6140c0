mod moves;
mod rules;

pub use moves::*;
pub use rules::*;

pub use chess::{Color, Piece, Square};
