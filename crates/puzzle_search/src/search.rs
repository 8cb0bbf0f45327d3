//! Breadth-first retrograde puzzle search.
//!
//! Starting from a position, each depth expands every frontier position into
//! its retrograde predecessors. A predecessor survives only if the oracle's
//! best move from it is exactly the move that leads back to the expanded
//! position, so every line in the collection is one the engine would play.
//! Survivors are scored with the tactical heuristics, filtered and trimmed
//! per move class, and become the next frontier.

use std::collections::HashSet;

use puzzle_core::{
    empty_by_class, ByClass, Color, HeuristicConfig, HeuristicResult, Move, MoveClass, Position, Predecessor,
    RetrogradeGenerator, RulesEngine, ShakmatyRules, TacticalHeuristics,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::collection::{LevelSummary, PuzzleCollection, PuzzleEntry};
use crate::config::{PuzzleConfig, SearchConfig, SurvivorBias};
use crate::oracle::{Oracle, OracleError, OracleFactory, Score};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Where a search is in its depth loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    ExpandingDepth(usize),
    Collecting(usize),
    Done,
}

/// A predecessor confirmed by the oracle and scored.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub class: MoveClass,
    /// Forward move from `position` back to the expanded position.
    pub mv: Move,
    /// Mover to move.
    pub position: Position,
    pub score: Score,
    pub heuristics: HeuristicResult,
}

impl Candidate {
    pub fn to_entry(&self, depth: usize) -> PuzzleEntry {
        PuzzleEntry {
            depth,
            class: self.class,
            fen: self.position.to_fen(),
            solution: self.mv.to_string(),
            score: self.score,
            heuristics: self.heuristics.clone(),
        }
    }
}

/// Survivors of one expanded position plus its counters.
#[derive(Debug)]
struct Expansion {
    survivors: ByClass<Candidate>,
    generated: usize,
    matched: usize,
}

/// How a search reaches the oracle: one session for the whole run, or a
/// pool whose chunks each open their own.
enum Driver<S> {
    Serial(S),
    Parallel(rayon::ThreadPool),
}

/// Apply the per-class survivor policy to the oracle-confirmed candidates of
/// one expanded position, all played by `mover`.
///
/// With `prefer_mates`, forced mates for the mover push out everything
/// else; failing that, dead-level scores are dropped. Depths below
/// `shallow_depth` need a heuristic total above `shallow_threshold`. What
/// remains is ranked by total and capped at `max_survivors_per_class`.
pub fn trim_class(mut candidates: Vec<Candidate>, depth: usize, mover: Color, config: &SearchConfig) -> Vec<Candidate> {
    if config.prefer_mates {
        if candidates.iter().any(|c| c.score.is_mate_for(mover)) {
            candidates.retain(|c| c.score.is_mate_for(mover));
        } else {
            candidates.retain(|c| c.score != Score::Centipawns(0));
        }
    }

    if depth < config.shallow_depth {
        candidates.retain(|c| c.heuristics.total > config.shallow_threshold);
    }

    candidates.sort_by(|a, b| {
        let order = a.heuristics.total.total_cmp(&b.heuristics.total);
        match config.survivor_bias {
            SurvivorBias::Lowest => order,
            SurvivorBias::Highest => order.reverse(),
        }
    });
    candidates.truncate(config.max_survivors_per_class);
    candidates
}

/// Whether `odd depth > 1` candidates are recorded as puzzles.
pub fn records_puzzles(depth: usize) -> bool {
    depth > 1 && depth % 2 == 1
}

pub struct PuzzleSearchEngine<F, R = ShakmatyRules> {
    factory: F,
    generator: RetrogradeGenerator<R>,
    heuristics: TacticalHeuristics<R>,
    config: SearchConfig,
}

impl<F: OracleFactory> PuzzleSearchEngine<F, ShakmatyRules> {
    pub fn new(factory: F, config: &PuzzleConfig) -> Self {
        Self::with_rules(
            factory,
            ShakmatyRules::new(),
            config.search.clone(),
            config.heuristics.clone(),
        )
    }
}

impl<F, R> PuzzleSearchEngine<F, R>
where
    F: OracleFactory,
    R: RulesEngine + Clone + Sync,
{
    pub fn with_rules(factory: F, rules: R, config: SearchConfig, heuristics: HeuristicConfig) -> Self {
        Self {
            factory,
            generator: RetrogradeGenerator::new(rules.clone()),
            heuristics: TacticalHeuristics::new(rules, heuristics),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Standalone heuristic evaluation, no search involved.
    pub fn evaluate_position(&self, position: &Position) -> HeuristicResult {
        self.heuristics.evaluate_position(position)
    }

    /// Run the search from `initial` until `max_depth` is reached or the
    /// frontier runs dry.
    ///
    /// Oracle sessions are opened for this call only. Any oracle failure
    /// aborts the whole search.
    pub fn search(&self, initial: &Position, max_depth: usize) -> Result<PuzzleCollection, SearchError> {
        let mut collection = PuzzleCollection::new(initial, max_depth);
        let mut driver = if self.config.concurrency > 1 {
            Driver::Parallel(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.concurrency)
                    .build()?,
            )
        } else {
            Driver::Serial(self.factory.open()?)
        };

        let mut frontier = vec![initial.clone()];
        let mut expansions: Vec<Expansion> = Vec::new();
        let mut state = SearchState::Idle;

        loop {
            debug!(?state, frontier = frontier.len(), "search state");
            state = match state {
                SearchState::Idle => SearchState::ExpandingDepth(1),
                SearchState::ExpandingDepth(d) if d >= max_depth || frontier.is_empty() => SearchState::Done,
                SearchState::ExpandingDepth(d) => {
                    expansions = match &mut driver {
                        Driver::Parallel(pool) => self.expand_parallel(pool, &frontier, initial, d)?,
                        Driver::Serial(session) => frontier
                            .iter()
                            .map(|target| self.expand(session, target, initial, d))
                            .collect::<Result<_, _>>()?,
                    };
                    SearchState::Collecting(d)
                }
                SearchState::Collecting(d) => {
                    let mut summary = LevelSummary {
                        depth: d,
                        frontier: frontier.len(),
                        ..LevelSummary::default()
                    };
                    let mut next = Vec::new();
                    let mut seen = HashSet::new();
                    for expansion in expansions.drain(..) {
                        summary.generated += expansion.generated;
                        summary.matched += expansion.matched;
                        for candidate in expansion.survivors.into_values().flatten() {
                            summary.kept += 1;
                            if records_puzzles(d) {
                                collection.record(candidate.to_entry(d));
                            }
                            if seen.insert(candidate.position.board_key()) {
                                next.push(candidate.position);
                            }
                        }
                    }
                    info!(
                        depth = d,
                        frontier = summary.frontier,
                        generated = summary.generated,
                        matched = summary.matched,
                        kept = summary.kept,
                        next = next.len(),
                        "depth complete"
                    );
                    collection.levels.push(summary);
                    frontier = next;
                    SearchState::ExpandingDepth(d + 1)
                }
                SearchState::Done => break,
            };
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        collection.select_headline(
            self.config.headline_per_class,
            self.config.headline_min_depth,
            &mut rng,
        );
        info!(puzzles = collection.len(), "search finished");
        Ok(collection)
    }

    /// Spread the frontier over the pool, one oracle session per chunk.
    /// Returns only once every chunk is done, in frontier order.
    fn expand_parallel(
        &self,
        pool: &rayon::ThreadPool,
        frontier: &[Position],
        root: &Position,
        depth: usize,
    ) -> Result<Vec<Expansion>, SearchError> {
        let chunk = frontier.len().div_ceil(self.config.concurrency).max(1);
        let chunks: Vec<Vec<Expansion>> = pool.install(|| {
            frontier
                .par_chunks(chunk)
                .map(|targets| {
                    let mut session = self.factory.open()?;
                    targets
                        .iter()
                        .map(|target| self.expand(&mut session, target, root, depth))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, SearchError>>()
        })?;
        Ok(chunks.into_iter().flatten().collect())
    }

    /// Generate, confirm, score and trim the predecessors of one position.
    fn expand(
        &self,
        session: &mut F::Session,
        target: &Position,
        root: &Position,
        depth: usize,
    ) -> Result<Expansion, SearchError> {
        let generated = self.generator.generate(target);
        let mover = target.side_to_move.other();

        let mut expansion = Expansion {
            survivors: empty_by_class(),
            generated: generated.values().map(Vec::len).sum(),
            matched: 0,
        };
        for (class, preds) in generated {
            let mut confirmed = Vec::new();
            for pred in preds {
                let Some(score) = self.confirm(session, &pred)? else {
                    continue;
                };
                let heuristics = self.heuristics.evaluate(&pred.position, Some(root), depth);
                confirmed.push(Candidate {
                    class,
                    mv: pred.mv,
                    position: pred.position,
                    score,
                    heuristics,
                });
            }
            expansion.matched += confirmed.len();
            let kept = trim_class(confirmed, depth, mover, &self.config);
            expansion.survivors.insert(class, kept);
        }
        Ok(expansion)
    }

    /// The oracle's score if its best move from the predecessor is exactly
    /// the predecessor's move.
    fn confirm(&self, session: &mut F::Session, pred: &Predecessor) -> Result<Option<Score>, OracleError> {
        session.set_position(&pred.position)?;
        match session.best_move()? {
            Some(best) if best.mv == pred.mv => Ok(Some(best.score)),
            other => {
                debug!(
                    fen = %pred.position,
                    mv = %pred.mv,
                    best = ?other.map(|b| b.mv.to_string()),
                    "not the oracle's move"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
