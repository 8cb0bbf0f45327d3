//! Core of the retrograde puzzle generator: board codec, positions, the
//! rules capability, retrograde move generation and tactical heuristics.

pub mod codec;
pub mod heuristics;
pub mod position;
pub mod retrograde;
pub mod rules;
pub mod types;

pub use codec::{decode_placement, encode_placement, index_to_square, square_to_index, Grid, MalformedPosition};
pub use heuristics::{HeuristicConfig, HeuristicResult, Motif, MotifScore, PieceValues, TacticalHeuristics};
pub use position::Position;
pub use retrograde::{
    empty_by_class, geometric_back_moves, missing_kinds, pawn_back_moves, ByClass, MoveClass, PawnBackMoves,
    Predecessor, RetrogradeGenerator,
};
pub use rules::{RulesEngine, RulesError, ShakmatyRules};
pub use types::*;
