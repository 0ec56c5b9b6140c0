use super::oracle::{MoveOracle, OracleError};
use log::{debug, info};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

/// Move oracle backed by a UCI engine subprocess (Stockfish or compatible).
///
/// The engine is started once and kept alive for the whole game. Every
/// request sends `position fen ...` followed by `go movetime N` and reads
/// lines until `bestmove`.
pub struct UciOracle {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    movetime: Duration,
}

impl UciOracle {
    /// Start the engine binary at `path`.
    pub fn spawn(path: impl AsRef<Path>, movetime: Duration) -> Result<Self, OracleError> {
        Self::spawn_command(Command::new(path.as_ref()), movetime)
    }

    /// Start an engine from a prepared command and complete the UCI handshake.
    pub fn spawn_command(mut command: Command, movetime: Duration) -> Result<Self, OracleError> {
        let mut child = command.stdin(Stdio::piped()).stdout(Stdio::piped()).spawn()?;
        let stdin = child.stdin.take().ok_or(OracleError::EngineClosed)?;
        let stdout = child.stdout.take().ok_or(OracleError::EngineClosed)?;
        let mut oracle = Self {
            name: "uci engine".to_owned(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
            movetime,
        };

        oracle.send("uci")?;
        loop {
            let line = oracle.read_line()?;
            if let Some(name) = line.strip_prefix("id name ") {
                oracle.name = name.to_owned();
            }
            if line == "uciok" {
                break;
            }
        }
        oracle.send("isready")?;
        oracle.wait_for("readyok")?;
        info!("{} ready", oracle.name);
        Ok(oracle)
    }

    fn send(&mut self, command: &str) -> Result<(), OracleError> {
        debug!("uci > {command}");
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, OracleError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(OracleError::EngineClosed);
        }
        let line = line.trim().to_owned();
        debug!("uci < {line}");
        Ok(line)
    }

    fn wait_for(&mut self, expected: &str) -> Result<(), OracleError> {
        while self.read_line()? != expected {}
        Ok(())
    }
}

/// Move named by a `bestmove` line. `None` for other lines.
///
/// Engines answer `bestmove (none)` or `bestmove 0000` when the side to
/// move has no legal move.
pub fn parse_bestmove(line: &str) -> Option<Result<String, OracleError>> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bestmove") {
        return None;
    }
    Some(match parts.next() {
        Some("(none)") | Some("0000") | None => Err(OracleError::NoMove),
        Some(mv) => Ok(mv.to_owned()),
    })
}

impl MoveOracle for UciOracle {
    fn best_move(&mut self, position: &str) -> Result<String, OracleError> {
        self.send(&format!("position fen {position}"))?;
        self.send(&format!("go movetime {}", self.movetime.as_millis()))?;
        loop {
            let line = self.read_line()?;
            if let Some(reply) = parse_bestmove(&line) {
                return reply;
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for UciOracle {
    fn drop(&mut self) {
        let _ = self.send("quit");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(parse_bestmove("bestmove e2e4 ponder e7e5").unwrap().unwrap(), "e2e4");
        assert_eq!(parse_bestmove("bestmove a7a8q").unwrap().unwrap(), "a7a8q");
        assert!(matches!(parse_bestmove("bestmove (none)"), Some(Err(OracleError::NoMove))));
        assert!(matches!(parse_bestmove("bestmove 0000"), Some(Err(OracleError::NoMove))));
        assert!(parse_bestmove("info depth 12 score cp 30").is_none());
        assert!(parse_bestmove("").is_none());
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let result = UciOracle::spawn("/nonexistent/engine-binary", Duration::from_millis(10));
        assert!(matches!(result, Err(OracleError::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_handshake_and_bestmove_with_scripted_engine() {
        let script = r#"
            while read line; do
                case "$line" in
                    uci) echo "id name Fake Engine"; echo "uciok" ;;
                    isready) echo "readyok" ;;
                    go*) echo "info depth 1"; echo "bestmove g1f3 ponder g8f6" ;;
                    quit) exit 0 ;;
                esac
            done
        "#;
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        let mut oracle = UciOracle::spawn_command(command, Duration::from_millis(10)).unwrap();
        assert_eq!(oracle.name(), "Fake Engine");
        let fen = crate::game_repr::START_FEN;
        assert_eq!(oracle.best_move(fen).unwrap(), "g1f3");
        assert_eq!(oracle.best_move(fen).unwrap(), "g1f3");
    }
}
