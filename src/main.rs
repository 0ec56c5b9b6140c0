//! Headless demo: the local side is played by synthetic drag gestures, the
//! other side by a move oracle, until the game ends.

use anyhow::{bail, Context, Result};
use clap::{arg, command, value_parser, ArgMatches};
use drag_chess::agent::{DragOutcome, OracleHandle, RandomOracle, UciOracle};
use drag_chess::arbiter::Resolution;
use drag_chess::game_repr::{Color, Move, Piece, START_FEN};
use drag_chess::geometry::Point;
use drag_chess::input::{PointerEvent, PointerId};
use drag_chess::renderer::NullRenderer;
use drag_chess::{GameConfig, Orchestrator, TurnState};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Duration;

/// Upper bound on ticks spent waiting for one turn to settle.
const TURN_TICKS: usize = 100_000;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = command!()
        .arg(
            arg!(--oracle <KIND> "Opponent move source")
                .value_parser(["random", "uci"])
                .default_value("random"),
        )
        .arg(arg!(--engine <PATH> "UCI engine binary").default_value("stockfish"))
        .arg(
            arg!(--movetime <MS> "Engine think time per move")
                .value_parser(value_parser!(u64))
                .default_value("200"),
        )
        .arg(arg!(--fen <FEN> "Starting position").default_value(START_FEN))
        .arg(
            arg!(--side <SIDE> "Side played by drag gestures")
                .value_parser(["white", "black"])
                .default_value("white"),
        )
        .arg(
            arg!(--seed <N> "Seed for the random choices")
                .value_parser(value_parser!(u64))
                .default_value("1"),
        )
        .arg(
            arg!(--"max-plies" <N> "Stop after this many half-moves")
                .value_parser(value_parser!(usize))
                .default_value("200"),
        )
        .get_matches();

    let seed = *required::<u64>(&matches, "seed")?;
    let max_plies = *required::<usize>(&matches, "max-plies")?;
    let local = match required::<String>(&matches, "side")?.as_str() {
        "black" => Color::Black,
        _ => Color::White,
    };

    let oracle = match required::<String>(&matches, "oracle")?.as_str() {
        "uci" => {
            let path = required::<String>(&matches, "engine")?;
            let movetime = Duration::from_millis(*required::<u64>(&matches, "movetime")?);
            let engine = UciOracle::spawn(path, movetime).with_context(|| format!("starting engine `{path}`"))?;
            OracleHandle::threaded(engine)
        }
        _ => OracleHandle::inline(RandomOracle::new(seed.wrapping_add(1))),
    };

    let config = GameConfig::versus_oracle(local).with_fen(required::<String>(&matches, "fen")?.as_str());
    let mut game = Orchestrator::new(config, Box::new(NullRenderer), Some(oracle))?;
    let mut rng = StdRng::seed_from_u64(seed);

    while game.result().is_none() && game.rules().history().len() < max_plies {
        game.run_until_idle(TURN_TICKS);
        if game.result().is_some() {
            break;
        }
        if game.state() != TurnState::WaitingForLocalMove || game.rules().turn() != local {
            bail!("oracle did not complete its turn (state {:?})", game.state());
        }
        play_local_move(&mut game, &mut rng)?;
    }
    game.run_until_idle(TURN_TICKS);

    let line: Vec<String> = game.rules().history().iter().map(Move::to_string).collect();
    println!("moves: {}", line.join(" "));
    println!("final: {}", game.rules().position_notation());
    match game.result() {
        Some(result) => println!("result: {result}"),
        None => println!("result: unfinished after {} plies", game.rules().history().len()),
    }
    Ok(())
}

fn required<'a, T: Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> Result<&'a T> {
    matches.get_one::<T>(id).with_context(|| format!("missing --{id}"))
}

/// Pick a random legal move and perform it as a drag: press on the piece,
/// move halfway, move onto the target, release.
fn play_local_move(game: &mut Orchestrator, rng: &mut StdRng) -> Result<()> {
    // drops always promote to a queen
    let moves: Vec<Move> = game
        .rules()
        .all_legal_moves()
        .into_iter()
        .filter(|m| matches!(m.promotion, None | Some(Piece::Queen)))
        .collect();
    let Some(&mv) = moves.choose(rng) else {
        bail!("no legal move for the local side");
    };

    let layout = *game.board().layout();
    let from = layout.square_center(mv.from);
    let to = layout.square_center(mv.to);
    let halfway = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
    let pointer = PointerId::Mouse;

    game.handle_pointer(PointerEvent::Down { pointer, at: from });
    game.handle_pointer(PointerEvent::Move { pointer, at: halfway });
    game.handle_pointer(PointerEvent::Move { pointer, at: to });
    match game.handle_pointer(PointerEvent::Up { pointer, at: to }) {
        DragOutcome::Released {
            resolution: Resolution::Accept(_),
            ..
        } => {
            info!("dragged {mv}");
            Ok(())
        }
        other => bail!("drag {mv} was not accepted: {other:?}"),
    }
}
