//! Chess rules capability.
//!
//! The retrograde generator and the heuristics only ever need three things
//! from a rules engine: the legal forward moves of a position, the result of
//! playing one of them, and whether a position is valid at all. `RulesEngine`
//! exposes exactly that; `ShakmatyRules` backs it with the `shakmaty` crate.

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position as _, PositionError, PositionErrorKinds};
use thiserror::Error;

use crate::position::Position;
use crate::types::Move;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// The side that is not to move is in check. Retrograde generation hits
    /// this whenever the last move gave check.
    #[error("side not to move is in check: {0}")]
    OpponentInCheck(String),

    #[error("invalid position {fen}: {reason}")]
    InvalidPosition { fen: String, reason: String },

    #[error("illegal move {mv} in {fen}")]
    IllegalMove { mv: String, fen: String },
}

/// Capability interface to a standard forward rules engine.
pub trait RulesEngine {
    /// All legal forward moves of the side to move. Castling is reported in
    /// standard notation (`e1g1`).
    fn enumerate_legal_moves(&self, position: &Position) -> Result<Vec<Move>, RulesError>;

    /// Play a legal move and return the resulting position.
    fn apply_move(&self, position: &Position, mv: Move) -> Result<Position, RulesError>;

    /// Kings present, side not to move not in check, no pawns on back ranks,
    /// reachable material.
    fn validate_position(&self, position: &Position) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ShakmatyRules;

impl ShakmatyRules {
    pub fn new() -> Self {
        Self
    }

    fn setup(&self, position: &Position) -> Result<Chess, RulesError> {
        let fen_text = position.to_fen();
        let fen: Fen = fen_text.parse().map_err(|e| RulesError::InvalidPosition {
            fen: fen_text.clone(),
            reason: format!("{e}"),
        })?;

        // Castling and en passant are opaque to us; stale values there
        // should not make an otherwise sound position unusable.
        fen.into_position::<Chess>(CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square)
            .map_err(|e| {
                if e.kinds().contains(PositionErrorKinds::OPPOSITE_CHECK) {
                    RulesError::OpponentInCheck(fen_text.clone())
                } else {
                    RulesError::InvalidPosition {
                        fen: fen_text.clone(),
                        reason: format!("{e}"),
                    }
                }
            })
    }
}

impl RulesEngine for ShakmatyRules {
    fn enumerate_legal_moves(&self, position: &Position) -> Result<Vec<Move>, RulesError> {
        let chess = self.setup(position)?;
        let moves = chess
            .legal_moves()
            .into_iter()
            .filter_map(|m| UciMove::from_standard(m).to_string().parse::<Move>().ok())
            .collect();
        Ok(moves)
    }

    fn apply_move(&self, position: &Position, mv: Move) -> Result<Position, RulesError> {
        let chess = self.setup(position)?;
        let illegal = || RulesError::IllegalMove {
            mv: mv.to_string(),
            fen: position.to_fen(),
        };

        let uci: UciMove = mv.to_string().parse().map_err(|_| illegal())?;
        let m = uci.to_move(&chess).map_err(|_| illegal())?;
        let next = chess.play(m).map_err(|_| illegal())?;

        let fen = Fen::from_position(&next, EnPassantMode::Legal).to_string();
        Position::from_fen(&fen).map_err(|e| RulesError::InvalidPosition {
            fen,
            reason: e.to_string(),
        })
    }

    fn validate_position(&self, position: &Position) -> bool {
        self.setup(position).is_ok()
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod rules_tests;
