pub mod ai;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const BOARD_SIZE: usize = 15;

/// One intersection of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Black,
    White,
}

impl Cell {
    /// Wire character: `n`, `b` or `w`.
    pub fn as_char(self) -> char {
        match self {
            Self::Empty => 'n',
            Self::Black => 'b',
            Self::White => 'w',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    NotEnd,
    BlackWin,
    WhiteWin,
    Tied,
}

/// The 15x15 board with turn state. Black always moves first.
#[derive(Debug, Clone)]
pub struct Gomoku {
    board: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    current_is_black: bool,
    /// Wire coordinates of the last stone: x is the column, y the row.
    last_drop: Option<(usize, usize)>,
    use_ai: bool,
    ai_thinking: bool,
    status: Status,
}

impl Default for Gomoku {
    fn default() -> Self {
        Self::new()
    }
}

impl Gomoku {
    pub fn new() -> Self {
        Self {
            board: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
            current_is_black: true,
            last_drop: None,
            use_ai: false,
            ai_thinking: false,
            status: Status::NotEnd,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn current_is_black(&self) -> bool {
        self.current_is_black
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.board[row][col]
    }

    pub fn enable_ai(&mut self, enable: bool) {
        self.use_ai = enable;
    }

    pub fn ai_enabled(&self) -> bool {
        self.use_ai
    }

    pub fn ai_thinking(&self) -> bool {
        self.ai_thinking
    }

    /// Raised while a search job is in flight; lowered when its move lands.
    pub fn set_ai_thinking(&mut self, thinking: bool) {
        self.ai_thinking = thinking;
    }

    /// Place a stone. Rejects drops out of turn, out of range, onto an
    /// occupied cell, after the game ended, or by black while the search
    /// is running.
    pub fn drop_piece(&mut self, row: i32, col: i32, as_black: bool) -> bool {
        if as_black && self.ai_thinking {
            return false;
        }
        if as_black != self.current_is_black {
            return false;
        }
        if row < 0 || row >= BOARD_SIZE as i32 || col < 0 || col >= BOARD_SIZE as i32 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        if self.board[row][col] != Cell::Empty {
            return false;
        }
        if self.status != Status::NotEnd {
            return false;
        }

        self.board[row][col] = if self.current_is_black {
            Cell::Black
        } else {
            Cell::White
        };
        self.current_is_black = !self.current_is_black;
        self.last_drop = Some((col, row));
        true
    }

    /// Scan every orientation for five-in-a-row and settle the status.
    /// A full board with no five is a tie.
    pub fn update(&mut self) {
        if self.status != Status::NotEnd {
            return;
        }

        let runs = |cells: [Cell; 5]| -> Option<Status> {
            let first = cells[0];
            if first != Cell::Empty && cells.iter().all(|&c| c == first) {
                Some(if first == Cell::White {
                    Status::WhiteWin
                } else {
                    Status::BlackWin
                })
            } else {
                None
            }
        };

        for i in 0..BOARD_SIZE {
            for j in 0..=BOARD_SIZE - 5 {
                if let Some(s) = runs(std::array::from_fn(|k| self.board[i][j + k])) {
                    self.status = s;
                }
                if let Some(s) = runs(std::array::from_fn(|k| self.board[j + k][i])) {
                    self.status = s;
                }
            }
        }
        for i in 0..=BOARD_SIZE - 5 {
            for j in 0..=BOARD_SIZE - 5 {
                if let Some(s) = runs(std::array::from_fn(|k| self.board[i + k][j + k])) {
                    self.status = s;
                }
                if let Some(s) = runs(std::array::from_fn(|k| self.board[i + 4 - k][j + k])) {
                    self.status = s;
                }
            }
        }

        if self.status == Status::NotEnd
            && self
                .board
                .iter()
                .all(|row| row.iter().all(|&c| c != Cell::Empty))
        {
            self.status = Status::Tied;
        }
    }

    /// Whether the built-in opponent should move now.
    pub fn wants_ai_move(&self) -> bool {
        self.status == Status::NotEnd && !self.current_is_black && self.use_ai
    }

    /// Board snapshot for `GOMOKU_GAME_INFO`.
    pub fn snapshot(&self) -> Value {
        let board: Vec<Vec<String>> = self
            .board
            .iter()
            .map(|row| row.iter().map(|c| c.as_char().to_string()).collect())
            .collect();
        let (x, y) = self
            .last_drop
            .map(|(x, y)| (x as i64, y as i64))
            .unwrap_or((-1, -1));
        json!({
            "board": board,
            "last_drop": { "x": x, "y": y },
            "current_is_black": self.current_is_black,
        })
    }
}
