//! Evaluation oracle client.
//!
//! The oracle is any UCI engine driven over stdin/stdout. A session is set to
//! a position and then asked for its top moves; every query is a fresh round
//! trip. Scores come back relative to the side to move and are normalised to
//! White's point of view here.

use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use puzzle_core::{Color, Move, Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::OracleConfig;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("oracle exited while waiting for '{0}'")]
    Exited(String),

    #[error("no position set before querying the oracle")]
    NoPosition,

    #[error("oracle i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// An oracle score from White's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    Centipawns(i32),
    /// Forced mate for `winner` in `moves` moves.
    Mate { winner: Color, moves: u32 },
}

impl Score {
    /// Comparable value: centipawns, or a signed infinity for mates so they
    /// always dominate.
    pub fn value(&self) -> f64 {
        match *self {
            Score::Centipawns(cp) => f64::from(cp),
            Score::Mate { winner, .. } => f64::from(winner.sign()) * f64::INFINITY,
        }
    }

    pub fn is_mate_for(&self, color: Color) -> bool {
        matches!(*self, Score::Mate { winner, .. } if winner == color)
    }

    /// Build from a UCI score, which is relative to `side_to_move`.
    pub fn from_uci(raw: RawScore, side_to_move: Color) -> Self {
        match raw {
            RawScore::Cp(cp) => Score::Centipawns(cp * side_to_move.sign()),
            RawScore::Mate(n) => Score::Mate {
                winner: if n > 0 { side_to_move } else { side_to_move.other() },
                moves: n.unsigned_abs(),
            },
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Score::Centipawns(cp) => write!(f, "{:+.2}", f64::from(cp) / 100.0),
            Score::Mate { winner: Color::White, moves } => write!(f, "#{moves}"),
            Score::Mate { winner: Color::Black, moves } => write!(f, "#-{moves}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopMove {
    pub mv: Move,
    pub score: Score,
}

/// A stateful oracle session: the position set last is the one queried.
pub trait Oracle {
    fn set_position(&mut self, position: &Position) -> Result<(), OracleError>;

    /// Up to `count` best moves, best first. Empty when the position has no
    /// legal moves.
    fn top_moves(&mut self, count: usize) -> Result<Vec<TopMove>, OracleError>;

    fn best_move(&mut self) -> Result<Option<TopMove>, OracleError> {
        Ok(self.top_moves(1)?.into_iter().next())
    }
}

/// Opens independent oracle sessions, one per unit of parallel work.
pub trait OracleFactory: Sync {
    type Session: Oracle;

    fn open(&self) -> Result<Self::Session, OracleError>;
}

/// Score as written on a UCI `info` line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawScore {
    Cp(i32),
    Mate(i32),
}

/// The parts of a UCI `info` line the oracle cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoLine {
    pub multipv: usize,
    pub score: RawScore,
    pub first_move: Move,
}

/// Parse an `info ... multipv k score cp|mate X ... pv m ...` line.
///
/// Lines without a score and a principal variation, and bound scores from
/// aspiration windows, give `None`.
pub fn parse_info_line(line: &str) -> Option<InfoLine> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "info" {
        return None;
    }

    let mut multipv = 1;
    let mut score = None;
    let mut first_move = None;
    while let Some(tok) = tokens.next() {
        match tok {
            "multipv" => multipv = tokens.next()?.parse().ok()?,
            "score" => {
                let kind = tokens.next()?;
                let n: i32 = tokens.next()?.parse().ok()?;
                score = match kind {
                    "cp" => Some(RawScore::Cp(n)),
                    "mate" => Some(RawScore::Mate(n)),
                    _ => return None,
                };
            }
            "lowerbound" | "upperbound" => return None,
            "pv" => {
                first_move = tokens.next()?.parse().ok();
                break;
            }
            _ => {}
        }
    }

    Some(InfoLine {
        multipv,
        score: score?,
        first_move: first_move?,
    })
}

/// UCI engine process used as an oracle session.
pub struct UciOracle {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    depth: u32,
    multipv: usize,
    position: Option<(String, Color)>,
}

impl UciOracle {
    pub fn spawn(config: &OracleConfig) -> Result<Self, OracleError> {
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| OracleError::Unavailable(format!("{}: {e}", config.program)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OracleError::Unavailable("no stdin pipe".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| OracleError::Unavailable("no stdout pipe".to_string()))?;

        let mut oracle = Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            depth: config.depth,
            multipv: 1,
            position: None,
        };
        oracle.send("uci")?;
        oracle.wait_for("uciok")?;
        oracle.send(&format!("setoption name Hash value {}", config.hash_mb))?;
        oracle.send(&format!("setoption name Threads value {}", config.threads))?;
        oracle.send("setoption name MultiPV value 1")?;
        oracle.sync()?;
        debug!(program = %config.program, depth = config.depth, "oracle session ready");
        Ok(oracle)
    }

    fn send(&mut self, cmd: &str) -> Result<(), OracleError> {
        writeln!(self.stdin, "{cmd}")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self, waiting_for: &str) -> Result<String, OracleError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(OracleError::Exited(waiting_for.to_string()));
        }
        Ok(line.trim().to_string())
    }

    fn wait_for(&mut self, target: &str) -> Result<(), OracleError> {
        loop {
            if self.read_line(target)?.starts_with(target) {
                return Ok(());
            }
        }
    }

    fn sync(&mut self) -> Result<(), OracleError> {
        self.send("isready")?;
        self.wait_for("readyok")
    }
}

impl Oracle for UciOracle {
    fn set_position(&mut self, position: &Position) -> Result<(), OracleError> {
        self.position = Some((position.to_fen(), position.side_to_move));
        Ok(())
    }

    fn top_moves(&mut self, count: usize) -> Result<Vec<TopMove>, OracleError> {
        let (fen, side_to_move) = self.position.clone().ok_or(OracleError::NoPosition)?;
        let count = count.max(1);
        if count != self.multipv {
            self.send(&format!("setoption name MultiPV value {count}"))?;
            self.multipv = count;
        }
        self.sync()?;
        self.send(&format!("position fen {fen}"))?;
        self.send(&format!("go depth {}", self.depth))?;

        // Deeper iterations overwrite shallower ones for the same slot.
        let mut slots: Vec<Option<TopMove>> = vec![None; count];
        loop {
            let line = self.read_line("bestmove")?;
            if let Some(rest) = line.strip_prefix("bestmove") {
                let best = rest.split_whitespace().next().unwrap_or("(none)");
                if best == "(none)" || best == "0000" {
                    return Ok(Vec::new());
                }
                if slots.first().is_some_and(Option::is_none) {
                    // Engine answered without a scored line; trust the move.
                    let mv: Move = best
                        .parse()
                        .map_err(|_| OracleError::MalformedResponse(line.clone()))?;
                    warn!(fen = %fen, "bestmove without score, assuming level");
                    slots[0] = Some(TopMove {
                        mv,
                        score: Score::Centipawns(0),
                    });
                }
                break;
            }
            if let Some(info) = parse_info_line(&line) {
                if let Some(slot) = info.multipv.checked_sub(1).and_then(|i| slots.get_mut(i)) {
                    *slot = Some(TopMove {
                        mv: info.first_move,
                        score: Score::from_uci(info.score, side_to_move),
                    });
                }
            }
        }
        Ok(slots.into_iter().flatten().collect())
    }
}

impl Drop for UciOracle {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "quit");
        let _ = self.stdin.flush();
        let _ = self.child.wait();
    }
}

impl<T: OracleFactory + ?Sized> OracleFactory for &T {
    type Session = T::Session;

    fn open(&self) -> Result<T::Session, OracleError> {
        (**self).open()
    }
}

/// Spawns a fresh engine process per session.
#[derive(Clone, Debug)]
pub struct UciOracleFactory {
    config: OracleConfig,
}

impl UciOracleFactory {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }
}

impl OracleFactory for UciOracleFactory {
    type Session = UciOracle;

    fn open(&self) -> Result<UciOracle, OracleError> {
        UciOracle::spawn(&self.config)
    }
}

#[cfg(test)]
#[path = "oracle_tests.rs"]
mod oracle_tests;
