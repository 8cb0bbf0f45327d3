use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::MalformedPosition;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// +1 for White, -1 for Black. Scores are kept from White's point of view.
    pub fn sign(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub fn from_fen_field(field: &str) -> Option<Color> {
        match field {
            "w" => Some(Color::White),
            "b" => Some(Color::Black),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// How many of this kind a side starts the game with.
    pub fn full_army_count(self) -> u8 {
        match self {
            PieceKind::Pawn => 8,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook => 2,
            PieceKind::Queen | PieceKind::King => 1,
        }
    }

    pub fn lower_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_lower_char(ch: char) -> Option<PieceKind> {
        match ch {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN letter: uppercase for White, lowercase for Black.
    pub fn symbol(self) -> char {
        let ch = self.kind.lower_char();
        match self.color {
            Color::White => ch.to_ascii_uppercase(),
            Color::Black => ch,
        }
    }

    pub fn from_symbol(ch: char) -> Option<Piece> {
        let kind = PieceKind::from_lower_char(ch.to_ascii_lowercase())?;
        let color = if ch.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece { color, kind })
    }
}

/// A board square, 0..63 with a1 = 0 and h8 = 63.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub fn new(file: i8, rank: i8) -> Option<Square> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square((rank as u8) * 8 + (file as u8)))
        } else {
            None
        }
    }

    pub fn from_index(idx: u8) -> Option<Square> {
        (idx < 64).then_some(Square(idx))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn file(self) -> i8 {
        (self.0 % 8) as i8
    }

    pub fn rank(self) -> i8 {
        (self.0 / 8) as i8
    }

    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        Square::new(self.file() + df, self.rank() + dr)
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file() as u8) as char;
        let rank = (b'1' + self.rank() as u8) as char;
        write!(f, "{file}{rank}")
    }
}

impl FromStr for Square {
    type Err = MalformedPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = s.as_bytes();
        if b.len() != 2 || !(b'a'..=b'h').contains(&b[0]) || !(b'1'..=b'8').contains(&b[1]) {
            return Err(MalformedPosition::BadSquare(s.to_string()));
        }
        Ok(Square((b[1] - b'1') * 8 + (b[0] - b'a')))
    }
}

/// A move as a pair of squares plus optional promotion, written in UCI
/// long algebraic form (`e2e4`, `e7e8q`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promo: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promo: None,
        }
    }

    /// The same squares with origin and destination swapped.
    pub fn reversed(self) -> Move {
        Move::new(self.to, self.from)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promo {
            write!(f, "{}", p.lower_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = MalformedPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(MalformedPosition::BadMove(s.to_string()));
        }
        let from = s[0..2].parse()?;
        let to = s[2..4].parse()?;
        let promo = match s[4..].chars().next() {
            None => None,
            Some(ch) => match PieceKind::from_lower_char(ch.to_ascii_lowercase()) {
                Some(kind @ (PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)) => {
                    Some(kind)
                }
                _ => return Err(MalformedPosition::BadMove(s.to_string())),
            },
        };
        Ok(Move { from, to, promo })
    }
}
