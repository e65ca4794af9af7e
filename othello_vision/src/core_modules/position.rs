// THEORY:
// The `position` module is the format boundary of the library. Internally a board
// is a `BoardGrid`: an N x N matrix of tri-state `CellState`s stored row-major.
// Externally it is a `PositionString`: N*N characters over {B, W, -} produced by
// walking the columns left to right and, inside each column, the rows top to
// bottom. Downstream tools parse that column-major order, so it must never change.
// Encoding and decoding are exact inverses for a given board size.

use crate::config::BoardSize;
use crate::error::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Occupancy of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellState {
    Black,
    White,
    #[default]
    Empty,
}

impl CellState {
    /// Numeric code used in grid dumps: black = 1, white = -1, empty = 0.
    pub fn code(self) -> i8 {
        match self {
            CellState::Black => 1,
            CellState::White => -1,
            CellState::Empty => 0,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            CellState::Black => 'B',
            CellState::White => 'W',
            CellState::Empty => '-',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'B' => Some(CellState::Black),
            'W' => Some(CellState::White),
            '-' => Some(CellState::Empty),
            _ => None,
        }
    }
}

/// Piece totals of one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PieceCount {
    pub black: usize,
    pub white: usize,
    pub empty: usize,
}

/// An N x N occupancy matrix. Dimensions always equal the board size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardGrid {
    size: BoardSize,
    /// Row-major cells.
    cells: Vec<CellState>,
}

impl BoardGrid {
    pub fn empty(size: BoardSize) -> Self {
        Self {
            size,
            cells: vec![CellState::Empty; size.cell_count()],
        }
    }

    /// Builds a grid from row-major cells. Fails when the cell count does not
    /// match the board size.
    pub fn from_cells(size: BoardSize, cells: Vec<CellState>) -> Result<Self> {
        if cells.len() != size.cell_count() {
            return Err(VisionError::InvalidPosition(format!(
                "expected {} cells for a {size} board, got {}",
                size.cell_count(),
                cells.len()
            )));
        }
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> CellState {
        self.cells[row * self.size.cells_per_side() + col]
    }

    pub fn set(&mut self, row: usize, col: usize, state: CellState) {
        let n = self.size.cells_per_side();
        self.cells[row * n + col] = state;
    }

    /// Rows of numeric codes (1 black, -1 white, 0 empty).
    pub fn to_codes(&self) -> Vec<Vec<i8>> {
        self.cells
            .chunks(self.size.cells_per_side())
            .map(|row| row.iter().map(|c| c.code()).collect())
            .collect()
    }

    pub fn piece_count(&self) -> PieceCount {
        self.cells
            .iter()
            .fold(PieceCount::default(), |mut count, cell| {
                match cell {
                    CellState::Black => count.black += 1,
                    CellState::White => count.white += 1,
                    CellState::Empty => count.empty += 1,
                }
                count
            })
    }

    /// Column-major encoding.
    pub fn encode(&self) -> PositionString {
        let n = self.size.cells_per_side();
        let mut text = String::with_capacity(n * n);
        for col in 0..n {
            for row in 0..n {
                text.push(self.get(row, col).symbol());
            }
        }
        PositionString(text)
    }

    pub fn decode(position: &PositionString, size: BoardSize) -> Result<Self> {
        let n = size.cells_per_side();
        if position.0.len() != n * n {
            return Err(VisionError::InvalidPosition(format!(
                "expected {} characters for a {size} board, got {}",
                n * n,
                position.0.len()
            )));
        }
        let mut grid = BoardGrid::empty(size);
        for (i, symbol) in position.0.chars().enumerate() {
            let state = CellState::from_symbol(symbol).ok_or_else(|| {
                VisionError::InvalidPosition(format!("unexpected symbol {symbol:?}"))
            })?;
            grid.set(i % n, i / n, state);
        }
        Ok(grid)
    }
}

impl fmt::Display for BoardGrid {
    /// One line per row, cells separated by spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.size.cells_per_side()).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row.iter().map(|c| c.symbol().to_string()).collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// Column-major textual encoding of a board over {B, W, -}.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionString(String);

impl PositionString {
    /// The all-empty position for a board size.
    pub fn empty(size: BoardSize) -> Self {
        PositionString("-".repeat(size.cell_count()))
    }

    /// Validates the alphabet and the length against the board size.
    pub fn parse(text: &str, size: BoardSize) -> Result<Self> {
        let candidate = PositionString(text.to_string());
        BoardGrid::decode(&candidate, size)?;
        Ok(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_cell_state_grid(size: BoardSize, seed: usize) -> BoardGrid {
        let states = [CellState::Black, CellState::White, CellState::Empty];
        let cells = (0..size.cell_count())
            .map(|i| states[(i * 7 + seed) % 3])
            .collect();
        BoardGrid::from_cells(size, cells).unwrap()
    }

    #[test]
    fn encode_walks_columns_first() {
        let mut grid = BoardGrid::empty(BoardSize::Four);
        grid.set(0, 1, CellState::Black);
        grid.set(1, 0, CellState::White);
        assert_eq!(grid.encode().as_str(), "-W--B-----------");
    }

    #[test]
    fn decode_inverts_encode_for_both_sizes() {
        for size in [BoardSize::Four, BoardSize::Eight] {
            for seed in 0..3 {
                let grid = every_cell_state_grid(size, seed);
                let decoded = BoardGrid::decode(&grid.encode(), size).unwrap();
                assert_eq!(decoded, grid);
            }
        }
    }

    #[test]
    fn standard_opening_decodes_to_the_centre_square() {
        let text = "---------------------------WB------BW---------------------------";
        let position = PositionString::parse(text, BoardSize::Eight).unwrap();
        let grid = BoardGrid::decode(&position, BoardSize::Eight).unwrap();
        assert_eq!(grid.get(3, 3), CellState::White);
        assert_eq!(grid.get(4, 3), CellState::Black);
        assert_eq!(grid.get(3, 4), CellState::Black);
        assert_eq!(grid.get(4, 4), CellState::White);
        let count = grid.piece_count();
        assert_eq!((count.black, count.white, count.empty), (2, 2, 60));
    }

    #[test]
    fn parse_rejects_wrong_length_and_alphabet() {
        assert!(PositionString::parse("----", BoardSize::Four).is_err());
        assert!(PositionString::parse("---------------X", BoardSize::Four).is_err());
        assert!(PositionString::parse("----------------", BoardSize::Four).is_ok());
    }

    #[test]
    fn empty_position_matches_empty_grid() {
        for size in [BoardSize::Four, BoardSize::Eight] {
            assert_eq!(BoardGrid::empty(size).encode(), PositionString::empty(size));
        }
    }

    #[test]
    fn codes_and_display_are_row_major() {
        let mut grid = BoardGrid::empty(BoardSize::Four);
        grid.set(0, 3, CellState::White);
        grid.set(3, 0, CellState::Black);
        let codes = grid.to_codes();
        assert_eq!(codes[0], vec![0, 0, 0, -1]);
        assert_eq!(codes[3], vec![1, 0, 0, 0]);
        assert_eq!(grid.to_string(), "- - - W\n- - - -\n- - - -\nB - - -");
    }
}
