//! Retrograde move generation.
//!
//! Given a position, reconstruct the positions it could have come from one
//! ply earlier. Three kinds of back-move are produced:
//!
//! - **legal**: a non-pawn piece steps back along a quiet move,
//! - **pawn**: a pawn steps back one or two squares,
//! - **uncapture**: a piece (or pawn, diagonally) steps back and an enemy
//!   piece that is missing from the board reappears on the square it left.
//!
//! Generation itself only checks occupancy. Every reconstruction then has to
//! pass the same gate: the predecessor must be a valid position, the forward
//! move must be legal from it, and replaying it must give back the original
//! placement.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{index_to_square, square_to_index, Grid};
use crate::position::Position;
use crate::rules::{RulesEngine, RulesError};
use crate::types::{Color, Move, Piece, PieceKind, Square};

/// How a retrograde candidate was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClass {
    Legal,
    Pawn,
    Uncapture,
}

impl MoveClass {
    pub const ALL: [MoveClass; 3] = [MoveClass::Legal, MoveClass::Pawn, MoveClass::Uncapture];

    pub fn name(self) -> &'static str {
        match self {
            MoveClass::Legal => "legal",
            MoveClass::Pawn => "pawn",
            MoveClass::Uncapture => "uncapture",
        }
    }
}

impl fmt::Display for MoveClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values grouped per move class. Every class is always present.
pub type ByClass<T> = BTreeMap<MoveClass, Vec<T>>;

pub fn empty_by_class<T>() -> ByClass<T> {
    MoveClass::ALL.iter().map(|&c| (c, Vec::new())).collect()
}

/// A reconstructed earlier position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predecessor {
    pub class: MoveClass,
    /// The forward move that turns `position` into the expanded position.
    pub mv: Move,
    /// Side to move is the side that plays `mv`.
    pub position: Position,
    /// Piece kind put back on the board, for uncaptures.
    pub uncaptured: Option<PieceKind>,
}

/// Pawn back-moves of one side, both oriented from the pawn's current
/// square to the square it came from.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PawnBackMoves {
    pub advances: Vec<Move>,
    pub captures: Vec<Move>,
}

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
pub(crate) const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(crate) const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

pub struct RetrogradeGenerator<R> {
    rules: R,
}

impl<R: RulesEngine> RetrogradeGenerator<R> {
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// All validated predecessors of `position`, grouped by move class.
    ///
    /// Never fails: reconstructions that do not survive validation are left
    /// out, and a class with no survivors maps to an empty list.
    pub fn generate(&self, position: &Position) -> ByClass<Predecessor> {
        let mover = position.side_to_move.other();
        let flipped = position.with_side_flipped();

        let quiet = self.quiet_back_moves(&flipped);
        let pawns = pawn_back_moves(&position.grid, mover);

        let mut out = empty_by_class();

        for &back in &quiet {
            let grid = match self.rules.apply_move(&flipped, back) {
                Ok(moved) => moved.grid,
                Err(_) => unmove(&position.grid, back),
            };
            let pred = Predecessor {
                class: MoveClass::Legal,
                mv: back.reversed(),
                position: position.predecessor(grid, mover),
                uncaptured: None,
            };
            self.admit(position, pred, &mut out);
        }

        for &back in &pawns.advances {
            let pred = Predecessor {
                class: MoveClass::Pawn,
                mv: back.reversed(),
                position: position.predecessor(unmove(&position.grid, back), mover),
                uncaptured: None,
            };
            self.admit(position, pred, &mut out);
        }

        let missing = missing_kinds(&position.grid, position.side_to_move);
        for &back in quiet.iter().chain(&pawns.captures) {
            for &kind in &missing {
                let mut grid = unmove(&position.grid, back);
                grid.set(back.from, Some(Piece::new(position.side_to_move, kind)));
                let pred = Predecessor {
                    class: MoveClass::Uncapture,
                    mv: back.reversed(),
                    position: position.predecessor(grid, mover),
                    uncaptured: Some(kind),
                };
                self.admit(position, pred, &mut out);
            }
        }

        debug!(
            fen = %position,
            legal = out[&MoveClass::Legal].len(),
            pawn = out[&MoveClass::Pawn].len(),
            uncapture = out[&MoveClass::Uncapture].len(),
            "retrograde candidates"
        );
        out
    }

    /// Quiet non-pawn back-moves for the side to move of `flipped`, oriented
    /// from the piece's current square to its origin.
    ///
    /// Reversible moves are symmetric, so these are the forward quiet moves
    /// of the flipped position. When the rules engine refuses that position
    /// (the original side to move is in check) the moves are walked out on
    /// the grid instead.
    fn quiet_back_moves(&self, flipped: &Position) -> Vec<Move> {
        let grid = &flipped.grid;
        match self.rules.enumerate_legal_moves(flipped) {
            Ok(moves) => moves
                .into_iter()
                .filter(|mv| {
                    let Some(piece) = grid.get(mv.from) else {
                        return false;
                    };
                    let castle = piece.kind == PieceKind::King && (mv.to.file() - mv.from.file()).abs() == 2;
                    piece.kind != PieceKind::Pawn && grid.is_empty(mv.to) && !castle
                })
                .collect(),
            Err(RulesError::OpponentInCheck(_)) => geometric_back_moves(grid, flipped.side_to_move),
            Err(e) => {
                debug!(error = %e, "no quiet back-moves");
                Vec::new()
            }
        }
    }

    /// Run the validation gate and keep the predecessor if it passes.
    fn admit(&self, target: &Position, pred: Predecessor, out: &mut ByClass<Predecessor>) {
        if self.is_sound(target, &pred) {
            out.entry(pred.class).or_default().push(pred);
        }
    }

    /// The predecessor is valid, its forward move is legal (captures are not
    /// distinguished in move text), and playing it reproduces the target.
    pub fn is_sound(&self, target: &Position, pred: &Predecessor) -> bool {
        if !self.rules.validate_position(&pred.position) {
            return false;
        }
        let legal = match self.rules.enumerate_legal_moves(&pred.position) {
            Ok(moves) => moves,
            Err(_) => return false,
        };
        if !legal
            .iter()
            .any(|m| m.from == pred.mv.from && m.to == pred.mv.to && m.promo.is_none())
        {
            return false;
        }
        self.rules
            .apply_move(&pred.position, pred.mv)
            .is_ok_and(|after| after.same_board(target))
    }
}

/// Move the piece on `back.from` to `back.to`, leaving `back.from` empty.
fn unmove(grid: &Grid, back: Move) -> Grid {
    let mut out = *grid;
    out.set(back.to, grid.get(back.from));
    out.set(back.from, None);
    out
}

/// Piece kinds (never the king) of `color` that fewer copies of are on the
/// board than a full army has.
pub fn missing_kinds(grid: &Grid, color: Color) -> Vec<PieceKind> {
    PieceKind::ALL
        .iter()
        .copied()
        .filter(|&kind| kind != PieceKind::King)
        .filter(|&kind| grid.count(color, kind) < kind.full_army_count())
        .collect()
}

/// Pawn back-moves for `color`, computed in the 1..=64 square numbering
/// (a8 = 1). A pawn that never left its starting rank has none.
///
/// Advances need the squares behind the pawn to be empty; a two-square
/// back-move is only offered from the double-step rank. Diagonal uncapture
/// origins only need to be empty; anything stricter is left to the
/// validation gate.
pub fn pawn_back_moves(grid: &Grid, color: Color) -> PawnBackMoves {
    let (one, two, diagonals, double_row) = match color {
        Color::White => (8i16, 16i16, [7i16, 9], 4u8),
        Color::Black => (-8, -16, [-9, -7], 3),
    };
    // Rows 6 (White) and 1 (Black) are the starting ranks.
    let movable = |row: u8| match color {
        Color::White => row < 6,
        Color::Black => row > 1,
    };
    let step = |idx: u8, delta: i16| -> Option<Square> {
        u8::try_from(idx as i16 + delta).ok().and_then(|i| index_to_square(i).ok())
    };

    let mut out = PawnBackMoves::default();
    let pawn = Piece::new(color, PieceKind::Pawn);
    for (sq, piece) in grid.pieces() {
        if piece != pawn {
            continue;
        }
        let idx = square_to_index(sq);
        let row = (idx - 1) / 8;
        if !movable(row) {
            continue;
        }

        if let Some(behind) = step(idx, one).filter(|&s| grid.is_empty(s)) {
            out.advances.push(Move::new(sq, behind));
            if row == double_row {
                if let Some(start) = step(idx, two).filter(|&s| grid.is_empty(s)) {
                    out.advances.push(Move::new(sq, start));
                }
            }
        }

        let captures = diagonals
            .iter()
            .filter_map(|&d| step(idx, d))
            .filter(|origin| {
                (origin.file() - sq.file()).abs() == 1 && (origin.rank() - sq.rank()).abs() == 1
            })
            .filter(|&origin| grid.is_empty(origin))
            .map(|origin| Move::new(sq, origin));
        out.captures.extend(captures);
    }
    out
}

/// Quiet non-pawn back-moves found by walking the grid: knight jumps, king
/// steps and slider rays up to the first occupied square.
pub fn geometric_back_moves(grid: &Grid, color: Color) -> Vec<Move> {
    let mut moves = Vec::new();
    for (from, piece) in grid.pieces() {
        if piece.color != color {
            continue;
        }
        let (steps, slides): (&[(i8, i8)], bool) = match piece.kind {
            PieceKind::Pawn => continue,
            PieceKind::Knight => (&KNIGHT_STEPS[..], false),
            PieceKind::King => (&KING_STEPS[..], false),
            PieceKind::Bishop => (&DIAGONAL[..], true),
            PieceKind::Rook => (&ORTHOGONAL[..], true),
            PieceKind::Queen => (&KING_STEPS[..], true),
        };
        for &(df, dr) in steps {
            let mut cur = from;
            while let Some(to) = cur.offset(df, dr) {
                if !grid.is_empty(to) {
                    break;
                }
                moves.push(Move::new(from, to));
                if !slides {
                    break;
                }
                cur = to;
            }
        }
    }
    moves
}

#[cfg(test)]
#[path = "retrograde_tests.rs"]
mod retrograde_tests;
