//! Puzzle collection storage and reporting

use std::collections::BTreeMap;
use std::path::Path;

use puzzle_core::{HeuristicResult, MalformedPosition, MoveClass, Position};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::oracle::Score;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize collection: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lichess analysis board link for a position.
pub fn analysis_url(fen: &str) -> String {
    format!("https://lichess.org/analysis/{}", fen.replace(' ', "_"))
}

/// A recorded puzzle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleEntry {
    /// Search depth the puzzle was found at
    pub depth: usize,
    pub class: MoveClass,
    /// Puzzle position, solver to move
    pub fen: String,
    /// First move of the solution, as confirmed by the oracle
    pub solution: String,
    /// Oracle score after the solution, from White's point of view
    pub score: Score,
    pub heuristics: HeuristicResult,
}

impl PuzzleEntry {
    pub fn position(&self) -> Result<Position, MalformedPosition> {
        Position::from_fen(&self.fen)
    }

    pub fn analysis_url(&self) -> String {
        analysis_url(&self.fen)
    }
}

/// Counters for one expanded depth
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub depth: usize,
    /// Positions expanded at this depth
    pub frontier: usize,
    /// Retrograde candidates produced
    pub generated: usize,
    /// Candidates whose move was the oracle's best move
    pub matched: usize,
    /// Candidates left after filtering and trimming
    pub kept: usize,
}

/// Every puzzle found by one search, grouped by move class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleCollection {
    /// Position the search started from
    pub root: String,
    pub max_depth: usize,
    /// Puzzles in discovery order
    pub entries: BTreeMap<MoveClass, Vec<PuzzleEntry>>,
    /// Small random sample picked at the end of the search
    pub headline: BTreeMap<MoveClass, Vec<PuzzleEntry>>,
    pub levels: Vec<LevelSummary>,
}

impl PuzzleCollection {
    pub fn new(root: &Position, max_depth: usize) -> Self {
        let by_class = || MoveClass::ALL.iter().map(|&c| (c, Vec::new())).collect();
        Self {
            root: root.to_fen(),
            max_depth,
            entries: by_class(),
            headline: by_class(),
            levels: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: PuzzleEntry) {
        self.entries.entry(entry.class).or_default().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn class(&self, class: MoveClass) -> &[PuzzleEntry] {
        self.entries.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PuzzleEntry> {
        self.entries.values().flatten()
    }

    /// Up to `n` puzzles of a class, highest heuristic total first.
    pub fn strongest(&self, class: MoveClass, n: usize) -> Vec<&PuzzleEntry> {
        let mut ranked: Vec<&PuzzleEntry> = self.class(class).iter().collect();
        ranked.sort_by(|a, b| b.heuristics.total.total_cmp(&a.heuristics.total));
        ranked.truncate(n);
        ranked
    }

    /// Draw up to `per_class` random puzzles per class from those found
    /// deeper than `min_depth`.
    pub fn select_headline<R: Rng + ?Sized>(&mut self, per_class: usize, min_depth: usize, rng: &mut R) {
        for (&class, entries) in &self.entries {
            let deep: Vec<&PuzzleEntry> = entries.iter().filter(|e| e.depth > min_depth).collect();
            let picked = deep.choose_multiple(rng, per_class).map(|&e| e.clone()).collect();
            self.headline.insert(class, picked);
        }
    }

    /// Save collection to JSON file
    pub fn save(&self, path: &Path) -> Result<(), CollectionError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| CollectionError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load collection from JSON file
    pub fn load(path: &Path) -> Result<Self, CollectionError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CollectionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Generate a text report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("=== Puzzles from: {} ===\n\n", self.root));
        report.push_str(&format!(
            "Max depth {}, {} puzzles found\n\n",
            self.max_depth,
            self.len()
        ));

        report.push_str("Levels:\n");
        report.push_str(&format!(
            "{:>5} {:>9} {:>10} {:>8} {:>6}\n",
            "Depth", "Frontier", "Generated", "Matched", "Kept"
        ));
        report.push_str(&"-".repeat(42));
        report.push('\n');
        for level in &self.levels {
            report.push_str(&format!(
                "{:>5} {:>9} {:>10} {:>8} {:>6}\n",
                level.depth, level.frontier, level.generated, level.matched, level.kept
            ));
        }

        report.push_str("\nPuzzles per class:\n");
        for (class, entries) in &self.entries {
            report.push_str(&format!("  {:<10} {}\n", class.name(), entries.len()));
        }

        report.push_str("\nHeadline:\n");
        for entry in self.headline.values().flatten() {
            let motifs: Vec<String> = entry
                .heuristics
                .triggered()
                .map(|m| format!("{m:?}"))
                .collect();
            report.push_str(&format!(
                "  [{} d{}] {} {} ({:.3} {})\n    {}\n",
                entry.class,
                entry.depth,
                entry.solution,
                entry.score,
                entry.heuristics.total,
                motifs.join("+"),
                entry.analysis_url()
            ));
        }

        report
    }

    /// Print report to stdout
    pub fn print_report(&self) {
        println!("{}", self.generate_report());
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod collection_tests;
