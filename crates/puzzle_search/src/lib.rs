//! Retrograde puzzle search for ML-chess
//!
//! This crate provides:
//! - A UCI evaluation oracle client (one engine process per session)
//! - The breadth-first retrograde search that turns a finished position into
//!   puzzles the engine itself would solve
//! - Puzzle collections with JSON storage and text reports
//!
//! # Usage
//!
//! ```bash
//! # Search six plies back from a position with Stockfish as the oracle
//! cargo run -p puzzle_search -- search "6R1/1ppk1Np1/p6p/2b5/8/PnP5/1P3PPP/6K1 b - - 0 29"
//!
//! # Score the tactical motifs of a single position
//! cargo run -p puzzle_search -- heuristics "4k3/8/8/4q3/8/8/8/4R2K w - - 0 1"
//! ```

mod collection;
mod config;
mod oracle;
mod search;

pub use collection::*;
pub use config::*;
pub use oracle::*;
pub use search::*;
