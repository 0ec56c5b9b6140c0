//! Drag-and-drop chess: pointer gestures in, rules-legal moves out.
//!
//! The pipeline, leaves first:
//! - [`geometry`] resolves which square a free-floating piece sits on
//! - [`game_repr`] wraps the rules engine ([`chess`]) behind [`game_repr::Rules`]
//! - [`agent::drag`] owns one press-to-release interaction
//! - [`arbiter`] turns a drop into an accepted move or a snap-back
//! - [`special_moves`] commits moves with their promotion, en passant and castling effects
//! - [`animation`] slides oracle moves and castling rooks into place
//! - [`endgame`] classifies terminal positions
//! - [`orchestrator`] runs the turn cycle against a move oracle

pub mod agent;
pub mod animation;
pub mod arbiter;
pub mod board;
pub mod config;
pub mod endgame;
pub mod game_repr;
pub mod geometry;
pub mod input;
pub mod orchestrator;
pub mod renderer;
pub mod special_moves;

pub use config::GameConfig;
pub use orchestrator::{Orchestrator, TurnState};
