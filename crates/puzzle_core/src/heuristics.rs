//! Tactical heuristics used to rank candidate puzzle positions.
//!
//! Four motifs are scored: material imbalance, sacrifice, pin and fork.
//! Each yields `(triggered, magnitude)`; the composite total adds the
//! magnitudes of triggered motifs only.
//!
//! Piece values are the AlphaZero weights. The normalisation constants come
//! from the puzzle-generation literature, rescaled to those weights.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::codec::Grid;
use crate::position::Position;
use crate::retrograde::{DIAGONAL, ORTHOGONAL};
use crate::rules::RulesEngine;
use crate::types::{Color, PieceKind, Square};

/// Material weight per piece kind. The king counts for nothing in material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceValues {
    pub pawn: f64,
    pub knight: f64,
    pub bishop: f64,
    pub rook: f64,
    pub queen: f64,
    pub king: f64,
}

impl Default for PieceValues {
    fn default() -> Self {
        Self {
            pawn: 1.00,
            knight: 3.05,
            bishop: 3.33,
            rook: 5.63,
            queen: 9.50,
            king: 0.0,
        }
    }
}

impl PieceValues {
    pub fn of(&self, kind: PieceKind) -> f64 {
        match kind {
            PieceKind::Pawn => self.pawn,
            PieceKind::Knight => self.knight,
            PieceKind::Bishop => self.bishop,
            PieceKind::Rook => self.rook,
            PieceKind::Queen => self.queen,
            PieceKind::King => self.king,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub values: PieceValues,
    /// Value of a king when it is the piece behind a pin.
    pub king_ray_value: f64,
    /// One side leads when the other has less than this share of its material.
    pub advantage_ratio: f64,
    pub material_constant: f64,
    pub pin_constant: f64,
    pub fork_constant: f64,
    /// Divisor per sequence length, index 0 = one ply. Longer sequences use
    /// the last entry.
    pub sacrifice_constants: Vec<f64>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            values: PieceValues::default(),
            king_ray_value: 15.0,
            advantage_ratio: 0.95,
            material_constant: 41.52,
            pin_constant: 21.0,
            fork_constant: 41.52,
            sacrifice_constants: vec![9.50, 15.13, 20.76, 24.09, 27.42],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Motif {
    Material,
    Sacrifice,
    Pin,
    Fork,
}

impl Motif {
    pub const ALL: [Motif; 4] = [Motif::Material, Motif::Sacrifice, Motif::Pin, Motif::Fork];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotifScore {
    pub triggered: bool,
    pub magnitude: f64,
}

impl MotifScore {
    fn positive(magnitude: f64) -> Self {
        Self {
            triggered: magnitude > 0.0,
            magnitude,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicResult {
    pub motifs: BTreeMap<Motif, MotifScore>,
    /// Sum of magnitudes over triggered motifs.
    pub total: f64,
}

impl HeuristicResult {
    pub fn from_motifs(motifs: BTreeMap<Motif, MotifScore>) -> Self {
        let total = motifs
            .values()
            .filter(|s| s.triggered)
            .map(|s| s.magnitude)
            .sum();
        Self { motifs, total }
    }

    pub fn get(&self, motif: Motif) -> MotifScore {
        self.motifs.get(&motif).copied().unwrap_or_default()
    }

    pub fn triggered(&self) -> impl Iterator<Item = Motif> + '_ {
        self.motifs
            .iter()
            .filter(|(_, s)| s.triggered)
            .map(|(&m, _)| m)
    }
}

/// `numerator / denominator`, or 0 when the denominator is degenerate.
fn normalized(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON || !denominator.is_finite() {
        return 0.0;
    }
    numerator / denominator
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub struct TacticalHeuristics<R> {
    rules: R,
    config: HeuristicConfig,
}

impl<R: RulesEngine> TacticalHeuristics<R> {
    pub fn new(rules: R, config: HeuristicConfig) -> Self {
        Self { rules, config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Total material of (White, Black), kings excluded.
    pub fn material_totals(&self, grid: &Grid) -> (f64, f64) {
        let (mut white, mut black) = (0.0, 0.0);
        for (_, piece) in grid.pieces() {
            let v = self.config.values.of(piece.kind);
            match piece.color {
                Color::White => white += v,
                Color::Black => black += v,
            }
        }
        (round2(white), round2(black))
    }

    /// Triggered when either side is ahead by more than the advantage margin.
    pub fn material(&self, pos: &Position) -> MotifScore {
        let (white, black) = self.material_totals(&pos.grid);
        let (high, low) = if white >= black { (white, black) } else { (black, white) };
        MotifScore {
            triggered: high * self.config.advantage_ratio > low,
            magnitude: normalized((white - black).abs(), self.config.material_constant),
        }
    }

    /// Net material given up by the side to move of `start` over the `plies`
    /// half-moves that lead to `end`.
    pub fn sacrifice(&self, start: &Position, end: Option<&Position>, plies: usize) -> MotifScore {
        let Some(end) = end else {
            return MotifScore::default();
        };
        let Some(divisor) = plies
            .checked_sub(1)
            .and_then(|i| {
                let c = &self.config.sacrifice_constants;
                c.get(i).or(c.last())
            })
            .copied()
        else {
            return MotifScore::default();
        };

        let (w0, b0) = self.material_totals(&start.grid);
        let (w1, b1) = self.material_totals(&end.grid);
        let (white_lost, black_lost) = (w0 - w1, b0 - b1);
        let (own_lost, opp_lost) = match start.side_to_move {
            Color::White => (white_lost, black_lost),
            Color::Black => (black_lost, white_lost),
        };
        MotifScore::positive(normalized(own_lost - opp_lost, divisor))
    }

    /// Best pin or skewer available to the side to move.
    ///
    /// Along each ray of a rook, bishop or queen, the first enemy piece sets
    /// a baseline; the first enemy piece farther along worth strictly more
    /// scores the two values added together. A friendly piece ends the ray.
    pub fn pin(&self, pos: &Position) -> MotifScore {
        let own = pos.side_to_move;
        let ray_value = |kind: PieceKind| match kind {
            PieceKind::King => self.config.king_ray_value,
            k => self.config.values.of(k),
        };

        let mut best = 0.0f64;
        for (from, piece) in pos.grid.pieces() {
            if piece.color != own {
                continue;
            }
            let rays: &[(i8, i8)] = match piece.kind {
                PieceKind::Rook => &ORTHOGONAL,
                PieceKind::Bishop => &DIAGONAL,
                PieceKind::Queen => &[
                    (1, 0),
                    (-1, 0),
                    (0, 1),
                    (0, -1),
                    (1, 1),
                    (1, -1),
                    (-1, 1),
                    (-1, -1),
                ],
                _ => continue,
            };
            for &(df, dr) in rays {
                if let Some(v) = self.ray_pin(&pos.grid, from, (df, dr), own, &ray_value) {
                    best = best.max(v);
                }
            }
        }
        MotifScore::positive(normalized(best, self.config.pin_constant))
    }

    fn ray_pin(
        &self,
        grid: &Grid,
        from: Square,
        (df, dr): (i8, i8),
        own: Color,
        ray_value: &impl Fn(PieceKind) -> f64,
    ) -> Option<f64> {
        let mut baseline: Option<f64> = None;
        let mut cur = from;
        while let Some(next) = cur.offset(df, dr) {
            cur = next;
            let Some(piece) = grid.get(cur) else {
                continue;
            };
            if piece.color == own {
                return None;
            }
            let value = ray_value(piece.kind);
            match baseline {
                None => baseline = Some(value),
                Some(front) if value > front => return Some(value + front),
                // Cheaper pieces behind the front one do not end the ray.
                Some(_) => {}
            }
        }
        None
    }

    /// Captures of the side to move grouped by attacker. An attacker hitting
    /// at least two pieces worth no less than itself contributes
    /// `(sum of those values / attacker value + their count) / fork_constant`.
    pub fn fork(&self, pos: &Position) -> MotifScore {
        let Ok(moves) = self.rules.enumerate_legal_moves(pos) else {
            return MotifScore::default();
        };
        let own = pos.side_to_move;

        let mut targets: BTreeMap<Square, BTreeSet<Square>> = BTreeMap::new();
        for mv in moves {
            if pos.grid.get(mv.to).is_some_and(|p| p.color != own) {
                targets.entry(mv.from).or_default().insert(mv.to);
            }
        }

        let values = &self.config.values;
        let mut total = 0.0;
        for (from, hits) in &targets {
            if hits.len() < 2 {
                continue;
            }
            let Some(attacker) = pos.grid.get(*from) else {
                continue;
            };
            let attacker_value = values.of(attacker.kind);
            if attacker_value <= 0.0 {
                continue;
            }
            let forked: Vec<f64> = hits
                .iter()
                .filter_map(|&sq| pos.grid.get(sq))
                .map(|p| values.of(p.kind))
                .filter(|&v| v >= attacker_value)
                .collect();
            if forked.len() > 1 {
                let sum: f64 = forked.iter().sum();
                total += normalized(sum / attacker_value + forked.len() as f64, self.config.fork_constant);
            }
        }
        MotifScore::positive(total)
    }

    /// Score every motif for `start`. `end` and `plies` describe the line
    /// played from `start`, and only matter for the sacrifice motif.
    pub fn evaluate(&self, start: &Position, end: Option<&Position>, plies: usize) -> HeuristicResult {
        let motifs = Motif::ALL
            .iter()
            .map(|&motif| {
                let score = match motif {
                    Motif::Material => self.material(start),
                    Motif::Sacrifice => self.sacrifice(start, end, plies),
                    Motif::Pin => self.pin(start),
                    Motif::Fork => self.fork(start),
                };
                (motif, score)
            })
            .collect();
        HeuristicResult::from_motifs(motifs)
    }

    /// Standalone evaluation of a single position (no sacrifice line).
    pub fn evaluate_position(&self, pos: &Position) -> HeuristicResult {
        self.evaluate(pos, None, 0)
    }
}

#[cfg(test)]
#[path = "heuristics_tests.rs"]
mod heuristics_tests;
