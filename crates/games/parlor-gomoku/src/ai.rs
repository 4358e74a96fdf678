//! The built-in opponent: alpha-beta minimax over the neighbourhood of the
//! existing stones, with a pattern-table leaf evaluation.
//!
//! The search always plays white. Depth is kept at 1 (one white move and
//! one black reply) so a move computes in well under a second even on a
//! loaded host; the evaluation carries the playing strength.

use rand::Rng;

use crate::{BOARD_SIZE, Cell, Gomoku};

const MAX_SEARCH_DEPTH: usize = 1;

/// Pattern weights, strongest first. In the pattern strings `s` is a stone
/// of the evaluated side, `o` an opponent stone, a space an empty cell;
/// out-of-board cells render as `n` and match nothing.
const FIVE: &str = "sssss";
const OPEN_FOUR: &str = " ssss ";
const CLOSED_FOUR: [&str; 5] = [" sssso", "s sss", "ss ss", "sss s", "ossss "];
const OPEN_THREE: [&str; 2] = [" sss  ", "  sss "];
const BROKEN_THREE: [&str; 2] = [" s ss ", " ss s "];
const CLOSED_THREE: [&str; 10] = [
    "  ssso", " s sso", " ss so", "osss  ", "oss s ", "os ss ", "ss  s", "s  ss", "s s s",
    "o sss o",
];
const OPEN_TWO: [&str; 5] = ["   ss ", "  ss  ", " ss   ", "  s s ", " s s  "];
const CLOSED_TWO: [&str; 10] = [
    "   sso", "  s so", " s  so", "s   s", "oss   ", "os s  ", "os  s ", "o  ss o", "o ss  o",
    "o s s o",
];

/// The four 9-cell lines through a point.
const LINES: [[(i32, i32); 9]; 4] = [
    [
        (-4, 0),
        (-3, 0),
        (-2, 0),
        (-1, 0),
        (0, 0),
        (1, 0),
        (2, 0),
        (3, 0),
        (4, 0),
    ],
    [
        (0, -4),
        (0, -3),
        (0, -2),
        (0, -1),
        (0, 0),
        (0, 1),
        (0, 2),
        (0, 3),
        (0, 4),
    ],
    [
        (-4, -4),
        (-3, -3),
        (-2, -2),
        (-1, -1),
        (0, 0),
        (1, 1),
        (2, 2),
        (3, 3),
        (4, 4),
    ],
    [
        (-4, 4),
        (-3, 3),
        (-2, 2),
        (-1, 1),
        (0, 0),
        (1, -1),
        (2, -2),
        (3, -3),
        (4, -4),
    ],
];

struct Searcher {
    board: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    best: (usize, usize),
}

/// Pick white's move for the given position. Returns `None` on a board
/// with no stones (the opponent always moves after black has opened).
pub fn best_move(game: &Gomoku) -> Option<(usize, usize)> {
    let mut board = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
    let mut any_stone = false;
    for (i, row) in board.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = game.cell(i, j);
            any_stone |= *cell != Cell::Empty;
        }
    }
    if !any_stone {
        return None;
    }

    let mut searcher = Searcher {
        board,
        best: (0, 0),
    };
    searcher.search_max(0, i32::MAX);
    Some(searcher.best)
}

impl Searcher {
    /// Any stone within Chebyshev distance 1. Restricting candidates to
    /// the stones' neighbourhood keeps the branching factor workable.
    fn is_nearby(&self, i: usize, j: usize) -> bool {
        for di in -1i32..2 {
            for dj in -1i32..2 {
                let (y, x) = (i as i32 + di, j as i32 + dj);
                if y >= 0
                    && y < BOARD_SIZE as i32
                    && x >= 0
                    && x < BOARD_SIZE as i32
                    && self.board[y as usize][x as usize] != Cell::Empty
                {
                    return true;
                }
            }
        }
        false
    }

    fn point_score(&self, i: usize, j: usize, side: Cell) -> i32 {
        let mut score = 1;

        for line in &LINES {
            let mut rendered = String::with_capacity(9);
            for &(dx, dy) in line {
                let x = j as i32 - dx;
                let y = i as i32 - dy;
                if x < 0 || x >= BOARD_SIZE as i32 || y < 0 || y >= BOARD_SIZE as i32 {
                    rendered.push('n');
                } else {
                    let cell = self.board[y as usize][x as usize];
                    rendered.push(if cell == side {
                        's'
                    } else if cell == Cell::Empty {
                        ' '
                    } else {
                        'o'
                    });
                }
            }

            if rendered.contains(FIVE) {
                score += 5_000_000;
            }
            if rendered.contains(OPEN_FOUR) {
                score += 100_000;
            }
            for group in [
                (&CLOSED_FOUR[..], 16_000),
                (&OPEN_THREE[..], 8_000),
                (&BROKEN_THREE[..], 2_000),
                (&CLOSED_THREE[..], 300),
                (&OPEN_TWO[..], 20),
                (&CLOSED_TWO[..], 2),
            ] {
                if group.0.iter().any(|p| rendered.contains(p)) {
                    score += group.1;
                }
            }
        }

        score
    }

    /// White's standing minus black's, with a 3-bit jitter so equal moves
    /// do not always resolve to the same square.
    fn evaluate(&self) -> i32 {
        let mut white = 0;
        let mut black = 0;
        for i in 0..BOARD_SIZE {
            for j in 0..BOARD_SIZE {
                match self.board[i][j] {
                    Cell::White => white += self.point_score(i, j, Cell::White),
                    Cell::Black => black += self.point_score(i, j, Cell::Black),
                    Cell::Empty => {},
                }
            }
        }
        white - black + (rand::rng().random::<u32>() & 7) as i32
    }

    fn search_max(&mut self, depth: usize, parent_beta: i32) -> i32 {
        let mut alpha = i32::MIN;
        for i in 0..BOARD_SIZE {
            for j in 0..BOARD_SIZE {
                if self.board[i][j] != Cell::Empty || !self.is_nearby(i, j) {
                    continue;
                }
                self.board[i][j] = Cell::White;
                let score = if depth < MAX_SEARCH_DEPTH {
                    self.search_min(depth + 1, alpha)
                } else {
                    self.evaluate()
                };
                self.board[i][j] = Cell::Empty;
                if score > alpha {
                    alpha = score;
                    if depth == 0 {
                        self.best = (i, j);
                    }
                    if alpha >= parent_beta {
                        return alpha;
                    }
                }
            }
        }
        alpha
    }

    fn search_min(&mut self, depth: usize, parent_alpha: i32) -> i32 {
        let mut beta = i32::MAX;
        for i in 0..BOARD_SIZE {
            for j in 0..BOARD_SIZE {
                if self.board[i][j] != Cell::Empty || !self.is_nearby(i, j) {
                    continue;
                }
                self.board[i][j] = Cell::Black;
                let score = if depth < MAX_SEARCH_DEPTH {
                    self.search_max(depth + 1, beta)
                } else {
                    self.evaluate()
                };
                self.board[i][j] = Cell::Empty;
                if score < beta {
                    beta = score;
                    if beta <= parent_alpha {
                        return beta;
                    }
                }
            }
        }
        beta
    }
}
