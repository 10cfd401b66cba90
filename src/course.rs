use rand::Rng;
use std::collections::VecDeque;

pub(crate) const COLS: usize = 9;
pub(crate) const ROWS: usize = 15;

pub(crate) const WALL_CHAR: char = '■';

// Row templates, walked one step at a time. Index 0 is the opening row.
pub(crate) const PATTERNS: [&str; 12] = [
    "■■■   ■■■",
    "■■■■   ■■",
    "■■■■■   ■",
    "■■■■■■   ",
    "■■■■■   ■",
    "■■■■   ■■",
    "■■■   ■■■",
    "■■   ■■■■",
    "■   ■■■■■",
    "   ■■■■■■",
    "■   ■■■■■",
    "■■   ■■■■",
];

pub(crate) const PATTERN_COUNT: usize = PATTERNS.len();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tile {
    Wall,
    Open,
}

pub(crate) type Row = [Tile; COLS];

/// Map a template onto exactly `COLS` tiles: missing columns are open,
/// extra characters are dropped.
pub(crate) fn row_from_pattern(pattern: &str) -> Row {
    let mut row = [Tile::Open; COLS];
    for (slot, ch) in row.iter_mut().zip(pattern.chars()) {
        if ch == WALL_CHAR {
            *slot = Tile::Wall;
        }
    }
    row
}

pub(crate) fn pattern_row(index: usize) -> Row {
    row_from_pattern(PATTERNS[index % PATTERN_COUNT])
}

/// Step the pattern index by -1, 0 or +1 (wrapping) and build the row for
/// the new index. This is the only place randomness enters the game.
pub(crate) fn generate_row<R: Rng + ?Sized>(rng: &mut R, current: usize) -> (Row, usize) {
    let step = rng.gen_range(0..3usize);
    // step - 1 in {-1, 0, 1}; add PATTERN_COUNT first to stay unsigned
    let next = (current % PATTERN_COUNT + PATTERN_COUNT + step - 1) % PATTERN_COUNT;
    (pattern_row(next), next)
}

/// Visible course, top row first. Holds `ROWS` rows once initialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Course {
    rows: VecDeque<Row>,
}

impl Course {
    /// Fill `ROWS - 1` rows from a random walk starting at `start`, then pin
    /// the bottom row to the opening pattern. Returns the course and the
    /// pattern index to continue from, which is always 0.
    pub(crate) fn initialize<R: Rng + ?Sized>(rng: &mut R, start: usize) -> (Self, usize) {
        let mut rows = VecDeque::with_capacity(ROWS + 1);
        let mut pattern = start;
        for _ in 0..ROWS - 1 {
            let (row, next) = generate_row(rng, pattern);
            rows.push_back(row);
            pattern = next;
        }
        rows.push_back(pattern_row(0));
        (Self { rows }, 0)
    }

    #[cfg(test)]
    pub(crate) fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Insert a fresh row at the top; the bottom row falls off once the
    /// window is full.
    pub(crate) fn push_top(&mut self, row: Row) {
        self.rows.push_front(row);
        if self.len() > ROWS {
            self.rows.pop_back();
        }
    }

    /// True only for an in-bounds WALL tile. Anything off the course is open.
    pub(crate) fn is_wall(&self, col: i32, row: i32) -> bool {
        if col < 0 || row < 0 {
            return false;
        }
        self.row(row as usize)
            .and_then(|r| r.get(col as usize))
            .map_or(false, |t| *t == Tile::Wall)
    }
}
