//! Connect Four rules engine.
//!
//! Players alternately drop a piece into a column; it falls to the lowest
//! empty cell. Lining up `connect` pieces horizontally, vertically or
//! diagonally wins. A full board with no line is a draw. Black moves first.
//!
//! Board size and line length are configurable so tests can use tiny boards.

use serde::{Deserialize, Serialize};

use crate::agents::Heuristic;
use crate::core::Color;
use crate::rules::RulesEngine;

/// Standard number of columns.
pub const DEFAULT_COLUMNS: usize = 7;
/// Standard number of rows.
pub const DEFAULT_ROWS: usize = 6;
/// Standard winning line length.
pub const DEFAULT_CONNECT: usize = 4;

const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Drop a piece into this column (0-based, left to right).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Column(pub u8);

impl Column {
    /// Column index as usize.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "column {}", self.0)
    }
}

/// Game metadata carried alongside the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameInfo {
    /// Side to move.
    pub to_move: Color,
    /// Number of pieces dropped so far.
    pub ply: u32,
    /// Winner, once somebody has completed a line.
    pub winner: Option<Color>,
}

/// Board cells plus metadata.
///
/// Cells are stored row-major with row 0 at the bottom.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectFourPosition {
    columns: usize,
    rows: usize,
    cells: Vec<Option<Color>>,
    heights: Vec<u8>,
    /// Side to move, ply counter and winner.
    pub info: GameInfo,
}

impl ConnectFourPosition {
    fn empty(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![None; columns * rows],
            heights: vec![0; columns],
            info: GameInfo {
                to_move: Color::Black,
                ply: 0,
                winner: None,
            },
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Piece at `(column, row)`, row 0 being the bottom.
    #[must_use]
    pub fn cell(&self, column: usize, row: usize) -> Option<Color> {
        self.cells[row * self.columns + column]
    }

    /// Number of pieces in a column.
    #[must_use]
    pub fn height(&self, column: usize) -> usize {
        self.heights[column] as usize
    }

    /// Is every cell occupied?
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.info.ply as usize >= self.columns * self.rows
    }

    fn in_bounds(&self, column: isize, row: isize) -> bool {
        column >= 0 && row >= 0 && (column as usize) < self.columns && (row as usize) < self.rows
    }

    /// Length of the line through `(column, row)` along `(dc, dr)` made of `color`.
    fn line_length(&self, column: usize, row: usize, dc: isize, dr: isize, color: Color) -> usize {
        let mut length = 1;
        for sign in [1isize, -1] {
            let (mut c, mut r) = (column as isize + sign * dc, row as isize + sign * dr);
            while self.in_bounds(c, r) && self.cell(c as usize, r as usize) == Some(color) {
                length += 1;
                c += sign * dc;
                r += sign * dr;
            }
        }
        length
    }
}

impl std::fmt::Display for ConnectFourPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in (0..self.rows).rev() {
            for column in 0..self.columns {
                let symbol = match self.cell(column, row) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, "{symbol} ")?;
            }
            writeln!(f)?;
        }
        for column in 0..self.columns {
            write!(f, "{} ", column % 10)?;
        }
        Ok(())
    }
}

/// Undo record for one drop.
#[derive(Clone, Copy, Debug)]
pub struct DropUndo {
    column: u8,
    info: GameInfo,
}

/// Connect Four rules with configurable dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectFour {
    columns: usize,
    rows: usize,
    connect: usize,
}

impl Default for ConnectFour {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            connect: DEFAULT_CONNECT,
        }
    }
}

impl ConnectFour {
    /// Standard 7x6 board, four in a row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom board size and winning line length.
    pub fn with_size(columns: usize, rows: usize, connect: usize) -> Self {
        assert!((1..=u8::MAX as usize).contains(&columns), "columns must be 1-255");
        assert!((1..=u8::MAX as usize).contains(&rows), "rows must be 1-255");
        assert!(connect >= 2, "connect must be at least 2");
        Self {
            columns,
            rows,
            connect,
        }
    }

    /// Number of columns (and therefore distinct moves).
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Winning line length.
    #[must_use]
    pub fn connect(&self) -> usize {
        self.connect
    }

    /// Build a position by playing `columns` from the start.
    ///
    /// Returns `None` if any drop is illegal along the way.
    pub fn position_from_moves(&self, columns: &[u8]) -> Option<ConnectFourPosition> {
        let mut position = self.initial_position();
        for &column in columns {
            let mv = Column(column);
            if !self.legal_moves(&position, position.info.to_move).contains(&mv) {
                return None;
            }
            self.make_move(&mut position, &mv);
        }
        Some(position)
    }
}

impl RulesEngine for ConnectFour {
    type Position = ConnectFourPosition;
    type Move = Column;
    type Undo = DropUndo;

    fn initial_position(&self) -> ConnectFourPosition {
        ConnectFourPosition::empty(self.columns, self.rows)
    }

    fn to_move(&self, position: &ConnectFourPosition) -> Color {
        position.info.to_move
    }

    fn legal_moves(&self, position: &ConnectFourPosition, _color: Color) -> Vec<Column> {
        if position.info.winner.is_some() {
            return Vec::new();
        }
        (0..position.columns)
            .filter(|&c| position.height(c) < position.rows)
            .map(|c| Column(c as u8))
            .collect()
    }

    fn apply_move(&self, position: &mut ConnectFourPosition, mv: &Column) -> DropUndo {
        let undo = DropUndo {
            column: mv.0,
            info: position.info,
        };

        let column = mv.index();
        let row = position.height(column);
        debug_assert!(row < position.rows, "drop into full {mv}");
        let color = position.info.to_move;

        position.cells[row * position.columns + column] = Some(color);
        position.heights[column] += 1;
        position.info.ply += 1;
        position.info.to_move = color.opponent();

        let wins = DIRECTIONS
            .iter()
            .any(|&(dc, dr)| position.line_length(column, row, dc, dr, color) >= self.connect);
        if wins {
            position.info.winner = Some(color);
        }

        undo
    }

    fn undo_move(&self, position: &mut ConnectFourPosition, undo: DropUndo) {
        let column = undo.column as usize;
        position.heights[column] -= 1;
        let row = position.heights[column] as usize;
        position.cells[row * position.columns + column] = None;
        position.info = undo.info;
    }

    fn is_ended(&self, position: &ConnectFourPosition) -> bool {
        position.info.winner.is_some() || position.is_full()
    }

    fn winner(&self, position: &ConnectFourPosition) -> Option<Color> {
        position.info.winner
    }
}

/// Open-window heuristic for the baseline agent.
///
/// Scores every window of `connect` cells that contains pieces of only one
/// side: `base^k` for `k` own pieces, negated for the opponent.
#[derive(Clone, Debug)]
pub struct ConnectFourHeuristic {
    connect: usize,
    base: f32,
}

impl ConnectFourHeuristic {
    /// Heuristic for the given rules.
    pub fn new(game: &ConnectFour) -> Self {
        Self {
            connect: game.connect(),
            base: 4.0,
        }
    }

    /// Growth factor per additional piece in a window.
    pub fn with_base(mut self, base: f32) -> Self {
        self.base = base;
        self
    }
}

impl Heuristic<ConnectFour> for ConnectFourHeuristic {
    fn evaluate(&self, position: &ConnectFourPosition, color: Color) -> f32 {
        let mut score = 0.0;
        let connect = self.connect as isize;

        for row in 0..position.rows() as isize {
            for column in 0..position.columns() as isize {
                for &(dc, dr) in &DIRECTIONS {
                    let end_c = column + dc * (connect - 1);
                    let end_r = row + dr * (connect - 1);
                    if !position.in_bounds(end_c, end_r) {
                        continue;
                    }
                    let (mut own, mut theirs) = (0i32, 0i32);
                    for k in 0..connect {
                        match position.cell((column + dc * k) as usize, (row + dr * k) as usize) {
                            Some(c) if c == color => own += 1,
                            Some(_) => theirs += 1,
                            None => {}
                        }
                    }
                    if theirs == 0 && own > 0 {
                        score += self.base.powi(own);
                    } else if own == 0 && theirs > 0 {
                        score -= self.base.powi(theirs);
                    }
                }
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position() {
        let game = ConnectFour::new();
        let position = game.initial_position();

        assert_eq!(game.to_move(&position), Color::Black);
        assert_eq!(game.legal_moves(&position, Color::Black).len(), 7);
        assert!(!game.is_ended(&position));
        assert_eq!(game.winner(&position), None);
    }

    #[test]
    fn test_pieces_stack() {
        let game = ConnectFour::new();
        let position = game.position_from_moves(&[3, 3, 3]).unwrap();

        assert_eq!(position.cell(3, 0), Some(Color::Black));
        assert_eq!(position.cell(3, 1), Some(Color::White));
        assert_eq!(position.cell(3, 2), Some(Color::Black));
        assert_eq!(position.height(3), 3);
        assert_eq!(game.to_move(&position), Color::White);
    }

    #[test]
    fn test_full_column_is_illegal() {
        let game = ConnectFour::with_size(3, 2, 3);
        let position = game.position_from_moves(&[0, 0]).unwrap();

        let moves = game.legal_moves(&position, Color::Black);
        assert_eq!(moves, vec![Column(1), Column(2)]);
        assert!(game.position_from_moves(&[0, 0, 0]).is_none());
    }

    #[test]
    fn test_vertical_win() {
        let game = ConnectFour::new();
        let position = game.position_from_moves(&[0, 1, 0, 1, 0, 1, 0]).unwrap();

        assert!(game.is_ended(&position));
        assert_eq!(game.winner(&position), Some(Color::Black));
        assert!(game.legal_moves(&position, Color::White).is_empty());
    }

    #[test]
    fn test_horizontal_win() {
        let game = ConnectFour::new();
        let position = game.position_from_moves(&[0, 0, 1, 1, 2, 2, 3]).unwrap();
        assert_eq!(game.winner(&position), Some(Color::Black));
    }

    #[test]
    fn test_diagonal_win() {
        let game = ConnectFour::new();
        // White builds the rising diagonal 1..4 on top of black supports.
        let position = game
            .position_from_moves(&[0, 1, 2, 2, 3, 3, 4, 3, 4, 4, 6, 4])
            .unwrap();
        assert_eq!(game.winner(&position), Some(Color::White));
    }

    #[test]
    fn test_draw_on_full_board() {
        let game = ConnectFour::with_size(2, 2, 3);
        let position = game.position_from_moves(&[0, 1, 0, 1]).unwrap();

        assert!(game.is_ended(&position));
        assert_eq!(game.winner(&position), None);
    }

    #[test]
    fn test_undo_restores_position() {
        let game = ConnectFour::new();
        let mut position = game.position_from_moves(&[0, 1, 0, 1, 0, 1]).unwrap();
        let before = position.clone();

        let undo = game.apply_move(&mut position, &Column(0));
        assert_eq!(game.winner(&position), Some(Color::Black));

        game.undo_move(&mut position, undo);
        assert_eq!(position, before);
    }

    #[test]
    fn test_display() {
        let game = ConnectFour::with_size(3, 2, 3);
        let position = game.position_from_moves(&[1, 1]).unwrap();
        let rendered = format!("{position}");
        assert_eq!(rendered, ". O . \n. X . \n0 1 2 ");
    }

    #[test]
    fn test_heuristic_prefers_own_threats() {
        let game = ConnectFour::new();
        let heuristic = ConnectFourHeuristic::new(&game);
        let position = game.position_from_moves(&[3, 0, 3, 0, 3]).unwrap();

        let black = heuristic.evaluate(&position, Color::Black);
        let white = heuristic.evaluate(&position, Color::White);
        assert!(black > 0.0);
        assert_eq!(black, -white);
    }
}
