//! Placement codec: FEN piece-placement field <-> 8x8 grid.
//!
//! Row 0 of the grid is rank 8, column 0 is the a-file. The same row-major
//! order numbers squares 1..=64 (a8 = 1, h1 = 64); the pawn back-move
//! generator walks the board in that numbering.

use std::fmt;

use thiserror::Error;

use crate::types::{Color, Piece, PieceKind, Square};

/// Character used for an empty square in the character view of a grid.
pub const EMPTY: char = '-';

/// A position string that cannot be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedPosition {
    #[error("placement has {0} rows, expected 8")]
    RowCount(usize),

    #[error("row {row} covers {squares} squares, expected 8")]
    RowWidth { row: usize, squares: usize },

    #[error("invalid piece character '{0}'")]
    BadPiece(char),

    #[error("position string is missing the {0} field")]
    MissingField(&'static str),

    #[error("invalid side to move '{0}'")]
    BadSide(String),

    #[error("more than one {0:?} king on the board")]
    ExtraKing(Color),

    #[error("invalid square '{0}'")]
    BadSquare(String),

    #[error("invalid square index {0}, expected 1..=64")]
    BadIndex(u8),

    #[error("invalid move '{0}'")]
    BadMove(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: [[Option<Piece>; 8]; 8],
}

impl Grid {
    pub fn empty() -> Self {
        Self {
            cells: [[None; 8]; 8],
        }
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        let (row, col) = row_col(sq);
        self.cells[row][col]
    }

    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        let (row, col) = row_col(sq);
        self.cells[row][col] = piece;
    }

    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// Character at (row, col): uppercase White, lowercase Black, `-` empty.
    pub fn char_at(&self, row: usize, col: usize) -> char {
        self.cells[row][col].map_or(EMPTY, Piece::symbol)
    }

    /// Every occupied square, rank 8 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (0..8).flat_map(move |row| {
            (0..8).filter_map(move |col| {
                let piece = self.cells[row][col]?;
                let sq = Square::new(col as i8, 7 - row as i8)?;
                Some((sq, piece))
            })
        })
    }

    pub fn count(&self, color: Color, kind: PieceKind) -> u8 {
        self.pieces()
            .filter(|(_, p)| p.color == color && p.kind == kind)
            .count() as u8
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.color == color && p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }
}

impl fmt::Display for Grid {
    /// Eight lines of eight characters, rank 8 first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..8 {
            for col in 0..8 {
                write!(f, "{}", self.char_at(row, col))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn row_col(sq: Square) -> (usize, usize) {
    ((7 - sq.rank()) as usize, sq.file() as usize)
}

/// Decode a FEN piece-placement field (`rnbqkbnr/pppppppp/8/...`).
pub fn decode_placement(placement: &str) -> Result<Grid, MalformedPosition> {
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(MalformedPosition::RowCount(rows.len()));
    }

    let mut grid = Grid::empty();
    for (row, text) in rows.iter().enumerate() {
        let mut col = 0usize;
        for ch in text.chars() {
            if let Some(run) = ch.to_digit(10) {
                col += run as usize;
                continue;
            }
            let piece = Piece::from_symbol(ch).ok_or(MalformedPosition::BadPiece(ch))?;
            if col < 8 {
                grid.cells[row][col] = Some(piece);
            }
            col += 1;
        }
        if col != 8 {
            return Err(MalformedPosition::RowWidth { row, squares: col });
        }
    }
    Ok(grid)
}

/// Encode a grid back into a FEN piece-placement field.
pub fn encode_placement(grid: &Grid) -> String {
    let mut out = String::with_capacity(72);
    for row in 0..8 {
        let mut run = 0;
        for col in 0..8 {
            match grid.cells[row][col] {
                Some(piece) => {
                    if run > 0 {
                        out.push_str(&run.to_string());
                        run = 0;
                    }
                    out.push(piece.symbol());
                }
                None => run += 1,
            }
        }
        if run > 0 {
            out.push_str(&run.to_string());
        }
        if row < 7 {
            out.push('/');
        }
    }
    out
}

/// Square for a 1..=64 index counted row-major from a8.
pub fn index_to_square(index: u8) -> Result<Square, MalformedPosition> {
    if !(1..=64).contains(&index) {
        return Err(MalformedPosition::BadIndex(index));
    }
    let row = (index - 1) / 8;
    let col = (index - 1) % 8;
    Square::new(col as i8, 7 - row as i8).ok_or(MalformedPosition::BadIndex(index))
}

/// Inverse of [`index_to_square`].
pub fn square_to_index(sq: Square) -> u8 {
    let (row, col) = row_col(sq);
    (row * 8 + col) as u8 + 1
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod codec_tests;
