use super::oracle::{MoveOracle, OracleError};
use crate::game_repr::Rules;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Oracle that plays a uniformly random legal move.
///
/// Needs no engine binary, which makes it the default opponent for the demo
/// binary and a convenient stand-in in tests. Seeded, so games replay exactly.
pub struct RandomOracle {
    rng: StdRng,
}

impl RandomOracle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl MoveOracle for RandomOracle {
    fn best_move(&mut self, position: &str) -> Result<String, OracleError> {
        let rules = Rules::from_fen(position).map_err(|_| OracleError::InvalidPosition(position.to_owned()))?;
        let moves = rules.all_legal_moves();
        let mv = moves.choose(&mut self.rng).ok_or(OracleError::NoMove)?;
        Ok(mv.to_string())
    }

    fn name(&self) -> &str {
        "random mover"
    }
}
