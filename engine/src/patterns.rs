//! Seed patterns: plain-text parsing and a few well-known shapes.

use crate::error::{EngineError, Result};

pub struct Pattern {
    pub name: &'static str,
    /// Live cells as `(x, y)` offsets from the pattern origin.
    pub cells: &'static [(usize, usize)],
}

pub const BLOCK: Pattern = Pattern {
    name: "Block",
    cells: &[(0, 0), (1, 0), (0, 1), (1, 1)],
};

pub const BLINKER: Pattern = Pattern {
    name: "Blinker",
    cells: &[(0, 0), (1, 0), (2, 0)],
};

pub const GLIDER: Pattern = Pattern {
    name: "Glider",
    cells: &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
};

pub const TOAD: Pattern = Pattern {
    name: "Toad",
    cells: &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
};

pub const BEACON: Pattern = Pattern {
    name: "Beacon",
    cells: &[(0, 0), (1, 0), (0, 1), (3, 2), (2, 3), (3, 3)],
};

pub const PATTERNS: &[Pattern] = &[BLOCK, BLINKER, GLIDER, TOAD, BEACON];

pub fn find(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|pattern| pattern.name.eq_ignore_ascii_case(name))
}

/// Bit rows of a `width` x `height` universe with `cells` placed at `offset`.
/// Cells falling outside the universe are dropped.
pub fn place(width: usize, height: usize, cells: &[(usize, usize)], offset: (usize, usize)) -> Vec<Vec<bool>> {
    let mut rows = vec![vec![false; width]; height];
    for &(x, y) in cells {
        let (Some(x), Some(y)) = (x.checked_add(offset.0), y.checked_add(offset.1)) else {
            continue;
        };
        if x < width && y < height {
            rows[y][x] = true;
        }
    }
    rows
}

/// Parses plain-text rows: `#`, `O`, `o`, `*` or `1` are live; `.`, `-` or
/// `0` are dead. Blank lines and lines starting with `!` are skipped.
///
/// Row widths are not checked here; a ragged pattern is rejected when it is
/// seeded into a grid.
pub fn parse_rows(text: &str) -> Result<Vec<Vec<bool>>> {
    let mut rows = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('!') {
            continue;
        }
        let row = line
            .chars()
            .map(|c| match c {
                '#' | 'O' | 'o' | '*' | '1' => Ok(true),
                '.' | '-' | '0' => Ok(false),
                other => Err(EngineError::PatternParse {
                    line: index + 1,
                    reason: format!("unexpected character {other:?}"),
                }),
            })
            .collect::<Result<Vec<bool>>>()?;
        rows.push(row);
    }
    Ok(rows)
}
