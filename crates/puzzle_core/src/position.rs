use std::fmt;
use std::str::FromStr;

use crate::codec::{decode_placement, encode_placement, Grid, MalformedPosition};
use crate::types::{Color, Piece, PieceKind, Square};

/// An immutable chess position.
///
/// Piece placement and side to move are interpreted; castling, en passant
/// and the clocks are carried through as opaque FEN fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub grid: Grid,
    pub side_to_move: Color,
    pub castling: String,
    pub en_passant: String,
    pub halfmove_clock: String,
    pub fullmove_number: String,
}

impl Position {
    /// Parse a FEN string. Only placement and side to move are required;
    /// the remaining fields default to `- - 0 1`.
    pub fn from_fen(fen: &str) -> Result<Self, MalformedPosition> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        let placement = parts
            .first()
            .ok_or(MalformedPosition::MissingField("placement"))?;
        let side = parts
            .get(1)
            .ok_or(MalformedPosition::MissingField("side to move"))?;

        let grid = decode_placement(placement)?;
        let side_to_move =
            Color::from_fen_field(side).ok_or_else(|| MalformedPosition::BadSide(side.to_string()))?;

        for color in [Color::White, Color::Black] {
            if grid.count(color, PieceKind::King) > 1 {
                return Err(MalformedPosition::ExtraKing(color));
            }
        }

        Ok(Self {
            grid,
            side_to_move,
            castling: parts.get(2).copied().unwrap_or("-").to_string(),
            en_passant: parts.get(3).copied().unwrap_or("-").to_string(),
            halfmove_clock: parts.get(4).copied().unwrap_or("0").to_string(),
            fullmove_number: parts.get(5).copied().unwrap_or("1").to_string(),
        })
    }

    pub fn to_fen(&self) -> String {
        self.to_string()
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.grid.get(sq)
    }

    /// The same placement with the other side to move (a null move).
    /// En passant is cleared since it can no longer be valid.
    pub fn with_side_flipped(&self) -> Self {
        Self {
            side_to_move: self.side_to_move.other(),
            en_passant: "-".to_string(),
            ..self.clone()
        }
    }

    /// A reconstructed earlier position: new placement and side to move,
    /// castling rights trimmed to what the placement still supports,
    /// en passant cleared, clocks kept.
    pub fn predecessor(&self, grid: Grid, side_to_move: Color) -> Self {
        let castling = sanitize_castling(&grid, &self.castling);
        Self {
            grid,
            side_to_move,
            castling,
            en_passant: "-".to_string(),
            halfmove_clock: self.halfmove_clock.clone(),
            fullmove_number: self.fullmove_number.clone(),
        }
    }

    /// Placement and side to move only; used to compare positions that
    /// were reached through different move orders or clock values.
    pub fn board_key(&self) -> String {
        format!("{} {}", encode_placement(&self.grid), self.side_to_move.fen_char())
    }

    pub fn same_board(&self, other: &Position) -> bool {
        self.grid == other.grid && self.side_to_move == other.side_to_move
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            encode_placement(&self.grid),
            self.side_to_move.fen_char(),
            self.castling,
            self.en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

impl FromStr for Position {
    type Err = MalformedPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

/// Keep only the castling rights whose king and rook are still at home.
fn sanitize_castling(grid: &Grid, castling: &str) -> String {
    let at = |sq: &str, symbol: char| {
        sq.parse::<Square>()
            .ok()
            .and_then(|s| grid.get(s))
            .is_some_and(|p| p.symbol() == symbol)
    };
    let kept: String = castling
        .chars()
        .filter(|right| match right {
            'K' => at("e1", 'K') && at("h1", 'R'),
            'Q' => at("e1", 'K') && at("a1", 'R'),
            'k' => at("e8", 'k') && at("h8", 'r'),
            'q' => at("e8", 'k') && at("a8", 'r'),
            _ => false,
        })
        .collect();
    if kept.is_empty() {
        "-".to_string()
    } else {
        kept
    }
}
