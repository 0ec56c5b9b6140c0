//! Game session and turn synchronisation.
//!
//! This module contains the [`Orchestrator`], the one context object a game
//! runs in. It owns the rules engine, the visual board, the drag controller
//! and the move oracle, and it is the only caller of the commit path.
//!
//! # Turn flow
//!
//! ```text
//! WaitingForLocalMove --drop accepted--> CommittingLocalMove
//!        ^                                      |
//!        |                       end check, castling rook animated
//!        |                                      v
//!        +-------- local side to move ---- settle_turn ---- oracle side to move
//!        |                                                         |
//!        |                                                         v
//!        +--- move committed, rook animated <-- ApplyingOracleMove <-- WaitingForOracle
//! ```
//!
//! Any state can end in `GameOver`; after that no oracle request is made.
//! Oracle failures (transport, malformed reply, a move that does not fit the
//! board) log, clear the thinking indicator and hand the turn back to the
//! local player without touching the position. Nothing is requested again
//! until the owner calls [`Orchestrator::request_oracle_move`]; a call made
//! while a request is still in flight is refused and changes nothing.
//!
//! # Driving it
//!
//! The owner feeds window events to [`Orchestrator::handle_window_event`] and
//! calls [`Orchestrator::tick`] every [`GameConfig::tick`]. Ticks poll the
//! oracle and advance animations; nothing blocks.

use crate::agent::{DragContext, DragController, DragOutcome, OracleError, OracleHandle};
use crate::animation::{Animation, Frame};
use crate::arbiter::Resolution;
use crate::board::Board;
use crate::config::GameConfig;
use crate::endgame::{evaluate, GameResult};
use crate::game_repr::{Move, Rules, RulesError};
use crate::geometry::BoardLayout;
use crate::input::{InputAdapter, PointerEvent};
use crate::renderer::Renderer;
use crate::special_moves::{commit, Commit, CommitRequest, CommittedMove, MoveOrigin};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::thread;
use winit::event::WindowEvent;

/// Where the game is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Drags are accepted for the side to move.
    WaitingForLocalMove,
    /// A local drop was accepted and its effects are still playing out.
    CommittingLocalMove,
    /// A position was sent to the oracle; input is disabled.
    WaitingForOracle,
    /// The oracle's move is being animated and committed.
    ApplyingOracleMove,
    GameOver(GameResult),
}

/// A piece in flight and the commit that lands it.
struct Motion {
    animation: Animation,
    request: CommitRequest,
}

/// Root component of one game.
///
/// Constructed once per game; starting over means building a new one. All
/// state the pipeline shares lives here and is handed down explicitly:
/// - `rules` is the game state, written only through the commit path
/// - `board` is the on-screen occupancy, written only through the commit path
/// - `drag` is the local player's single drag session
/// - `oracle` is the single outstanding oracle request, if any
pub struct Orchestrator {
    config: GameConfig,
    rules: Rules,
    board: Board,
    drag: DragController,
    input: InputAdapter,
    oracle: Option<OracleHandle>,
    state: TurnState,
    /// Pieces being animated, committed in order on arrival
    motions: VecDeque<Motion>,
    /// Every committed move, castling rooks included
    committed: Vec<CommittedMove>,
    thinking: bool,
}

impl Orchestrator {
    /// Start a game.
    ///
    /// If the oracle's side moves first the position is sent to it right away.
    ///
    /// # Arguments
    ///
    /// * `config` - Sides, starting position and timing
    /// * `renderer` - Visual surface for the board
    /// * `oracle` - Source of the opponent's moves; `None` for hot-seat play
    ///
    /// # Returns
    ///
    /// An error only if the starting FEN does not parse.
    pub fn new(config: GameConfig, renderer: Box<dyn Renderer>, oracle: Option<OracleHandle>) -> Result<Self, RulesError> {
        let rules = Rules::from_fen(&config.starting_fen)?;
        let board = Board::from_rules(&rules, config.layout, renderer);
        let mut game = Self {
            config,
            rules,
            board,
            drag: DragController::new(),
            input: InputAdapter::new(),
            oracle,
            state: TurnState::WaitingForLocalMove,
            motions: VecDeque::new(),
            committed: Vec::new(),
            thinking: false,
        };
        info!(
            "new game from {} ({})",
            game.rules.position_notation(),
            game.oracle.as_ref().map_or("no oracle", |o| o.name())
        );
        if let Some(result) = evaluate(&game.rules) {
            game.finish_game(result);
        }
        game.settle_turn();
        Ok(game)
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn committed(&self) -> &[CommittedMove] {
        &self.committed
    }

    pub fn result(&self) -> Option<GameResult> {
        match self.state {
            TurnState::GameOver(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Nothing in flight: no animation and no oracle request.
    pub fn is_idle(&self) -> bool {
        self.motions.is_empty()
            && matches!(self.state, TurnState::WaitingForLocalMove | TurnState::GameOver(_))
    }

    /// Route a window event. Pointer and touch input go to the drag controller.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                let square = f64::from(size.width.min(size.height)) / 8.0;
                let mut layout = *self.board.layout();
                layout.resize(layout.origin(), square);
                self.resize(layout, (size.width, size.height));
            }
            _ => {
                if let Some(pointer) = self.input.translate(event) {
                    self.handle_pointer(pointer);
                }
            }
        }
    }

    pub fn resize(&mut self, layout: BoardLayout, window_size: (u32, u32)) {
        self.board.set_layout(layout, window_size);
    }

    /// Feed one pointer event to the drag controller and commit an accepted drop.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> DragOutcome {
        let input_enabled = self.state == TurnState::WaitingForLocalMove && self.motions.is_empty();
        let outcome = self.drag.dispatch(
            event,
            DragContext {
                board: &mut self.board,
                rules: &self.rules,
                allowed: self.config.local_side,
                input_enabled,
            },
        );
        if let DragOutcome::Released { session, resolution } = &outcome {
            if let Resolution::Accept(entry) = *resolution {
                self.set_state(TurnState::CommittingLocalMove);
                let request = CommitRequest {
                    piece: session.piece,
                    entry,
                    promotion: None,
                    origin: MoveOrigin::Local,
                };
                match commit(&mut self.board, &mut self.rules, request) {
                    Ok(done) => self.after_commit(done),
                    Err(e) => {
                        error!("local move {} could not be committed: {e}", entry.mv);
                        self.set_state(TurnState::WaitingForLocalMove);
                    }
                }
            }
            self.drag.finish(&mut self.board, session.piece);
            self.settle_turn();
        }
        outcome
    }

    /// Advance one frame: collect an oracle reply, then move the front animation.
    pub fn tick(&mut self) {
        if self.state == TurnState::WaitingForOracle {
            let reply = self.oracle.as_mut().and_then(OracleHandle::poll);
            if let Some(reply) = reply {
                self.apply_oracle_reply(reply);
            }
        }

        let Some(motion) = self.motions.front_mut() else {
            return;
        };
        let frame = motion.animation.tick();
        let piece = motion.animation.piece();
        self.board.move_lifted(piece, frame.point());
        if let Frame::Arrived(_) = frame {
            if let Some(Motion { request, .. }) = self.motions.pop_front() {
                self.land(request);
            }
        }
    }

    /// Tick until nothing is in flight, or `max_ticks` ticks have run.
    ///
    /// Sleeps one tick interval whenever it is only waiting on the oracle.
    /// Returns the number of ticks used.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while !self.is_idle() && ticks < max_ticks {
            let waiting = self.motions.is_empty() && self.state == TurnState::WaitingForOracle;
            self.tick();
            ticks += 1;
            if waiting && self.state == TurnState::WaitingForOracle {
                thread::sleep(self.config.tick);
            }
        }
        ticks
    }

    /// Send the current position to the oracle.
    ///
    /// Called automatically when the oracle's side is to move; callable again
    /// to retry after a failed turn.
    ///
    /// While a request is outstanding or its move is still landing this is
    /// refused with [`OracleError::Busy`] and the turn in flight is untouched.
    pub fn request_oracle_move(&mut self) -> Result<(), OracleError> {
        if matches!(self.state, TurnState::GameOver(_)) {
            return Ok(());
        }
        let busy = matches!(self.state, TurnState::WaitingForOracle | TurnState::ApplyingOracleMove)
            || !self.motions.is_empty()
            || self.oracle.as_ref().is_some_and(OracleHandle::is_waiting);
        if busy {
            debug!("oracle request refused in {:?}", self.state);
            return Err(OracleError::Busy);
        }
        let position = self.rules.position_notation();
        let Some(oracle) = self.oracle.as_mut() else {
            self.set_state(TurnState::WaitingForLocalMove);
            return Ok(());
        };
        match oracle.submit(&position) {
            Ok(()) => {
                self.set_state(TurnState::WaitingForOracle);
                self.set_thinking(true);
                Ok(())
            }
            Err(e) => {
                warn!("oracle request failed: {e}");
                self.stop_turn();
                Err(e)
            }
        }
    }

    /// Commit a piece that finished its animation.
    ///
    /// A failed landing stops the turn: nothing further is requested until the
    /// owner retries with [`Orchestrator::request_oracle_move`].
    fn land(&mut self, request: CommitRequest) {
        match commit(&mut self.board, &mut self.rules, request) {
            Ok(done) => {
                self.after_commit(done);
                self.settle_turn();
            }
            Err(e) => {
                error!("{} could not be committed: {e}", request.entry.mv);
                match request.origin {
                    // the rules engine already moved the rook with its king
                    MoveOrigin::Castling => self.board.resync(&self.rules),
                    MoveOrigin::Oracle | MoveOrigin::Local => self.board.lower(request.piece),
                }
                self.stop_turn();
            }
        }
    }

    fn after_commit(&mut self, done: Commit) {
        let origin = done.committed.origin;
        self.committed.push(done.committed);

        if let Some(rook) = done.follow_up {
            let layout = *self.board.layout();
            let from = layout.square_rect(rook.entry.mv.from).origin();
            let to = layout.square_rect(rook.entry.mv.to).origin();
            self.board.lift(rook.piece, from);
            self.motions.push_back(Motion {
                animation: Animation::new(rook.piece, from, to, self.config.speed),
                request: rook,
            });
        }

        if origin == MoveOrigin::Oracle {
            self.set_thinking(false);
        }
        if let Some(result) = evaluate(&self.rules) {
            self.finish_game(result);
        }
    }

    /// Decide who moves next once the last commit has fully landed.
    fn settle_turn(&mut self) {
        if matches!(self.state, TurnState::GameOver(_)) || !self.motions.is_empty() {
            return;
        }
        if matches!(self.state, TurnState::WaitingForOracle | TurnState::ApplyingOracleMove)
            && self.oracle.as_ref().is_some_and(OracleHandle::is_waiting)
        {
            return;
        }
        let side = self.rules.turn();
        if self.config.is_oracle_side(side) && self.oracle.is_some() {
            // a failed request is already logged and has handed the turn back
            let _ = self.request_oracle_move();
        } else {
            self.set_state(TurnState::WaitingForLocalMove);
        }
    }

    fn apply_oracle_reply(&mut self, reply: Result<String, OracleError>) {
        let text = match reply {
            Ok(text) => text,
            Err(e) => {
                warn!("oracle failed: {e}");
                self.stop_turn();
                return;
            }
        };
        let mv = match Move::from_uci(text.trim()) {
            Ok(mv) => mv,
            Err(source) => {
                let e = OracleError::Malformed { reply: text, source };
                warn!("{e}");
                self.stop_turn();
                return;
            }
        };
        let Some(piece) = self.board.occupant(mv.from) else {
            error!("oracle moved from {} but no piece is there", mv.from);
            self.stop_turn();
            return;
        };
        let Some(entry) = self.rules.legal_moves(mv.from).find_to(mv.to) else {
            error!("oracle move {mv} does not fit the position");
            self.stop_turn();
            return;
        };

        debug!("animating oracle move {mv}");
        let layout = *self.board.layout();
        let from = layout.square_rect(mv.from).origin();
        let to = layout.square_rect(mv.to).origin();
        self.board.lift(piece, from);
        self.motions.push_back(Motion {
            animation: Animation::new(piece, from, to, self.config.speed),
            request: CommitRequest {
                piece,
                entry,
                promotion: mv.promotion,
                origin: MoveOrigin::Oracle,
            },
        });
        self.set_state(TurnState::ApplyingOracleMove);
    }

    /// Halt automated progression and let the local side act.
    fn stop_turn(&mut self) {
        self.set_thinking(false);
        if !matches!(self.state, TurnState::GameOver(_)) {
            self.set_state(TurnState::WaitingForLocalMove);
        }
    }

    fn finish_game(&mut self, result: GameResult) {
        if matches!(self.state, TurnState::GameOver(_)) {
            return;
        }
        info!("game over: {result}");
        self.set_state(TurnState::GameOver(result));
        self.board.show_result(&result);
        self.set_thinking(false);
    }

    fn set_thinking(&mut self, thinking: bool) {
        if self.thinking != thinking {
            self.thinking = thinking;
            self.board.set_thinking(thinking);
        }
    }

    fn set_state(&mut self, next: TurnState) {
        if self.state != next {
            debug!("{:?} -> {next:?}", self.state);
            self.state = next;
        }
    }
}
