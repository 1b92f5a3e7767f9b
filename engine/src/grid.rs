/**
* A live cell dies if it has fewer than two live neighbors.
* A live cell with two or three live neighbors lives on to the next generation.
* A live cell with more than three live neighbors dies.
* A dead cell will be brought back to live if it has exactly three live neighbors.
*/
use std::collections::BTreeSet;

use rand::Rng;

use crate::error::{EngineError, Result};
use crate::fingerprint::Fingerprint;
use crate::grid::CellState::{Alive, Dead};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CellState {
    Dead,
    Alive,
}

/// A bounded universe with a one-cell dead border on every side.
///
/// Storage is `(height + 2)` rows of `(width + 2)` cells. Interior cells live
/// at bordered coordinates `1..=width` / `1..=height`; the border is never
/// written, so neighbor counts need no wraparound or bounds checks.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<CellState>>,
}

impl Grid {
    /// An all-dead universe.
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![vec![Dead; width + 2]; height + 2],
        }
    }

    /// Random universe with `round(width * height * fill_percent / 100)` births.
    ///
    /// Coordinates are drawn independently, so repeats are possible and simply
    /// land on an already live cell.
    pub fn create<R: Rng>(width: usize, height: usize, fill_percent: f64, rng: &mut R) -> Self {
        let mut grid = Grid::new(width, height);
        if width == 0 || height == 0 {
            return grid;
        }
        let births = ((width * height) as f64 * fill_percent / 100.0).round() as usize;
        for _ in 0..births {
            let x = rng.random_range(1..=width);
            let y = rng.random_range(1..=height);
            grid.cells[y][x] = Alive;
        }
        grid
    }

    /// Universe from row-major bit rows: `rows[y][x]` is interior cell `(x, y)`.
    pub fn from_pattern(width: usize, height: usize, rows: &[Vec<bool>]) -> Result<Self> {
        let mismatch = |row: usize, found: usize| EngineError::InvalidPattern {
            width,
            height,
            rows: rows.len(),
            row,
            found,
        };
        if rows.len() != height {
            return Err(mismatch(0, rows.first().map_or(0, Vec::len)));
        }
        if let Some((row, bits)) = rows.iter().enumerate().find(|(_, bits)| bits.len() != width) {
            return Err(mismatch(row, bits.len()));
        }

        let mut grid = Grid::new(width, height);
        for (y, bits) in rows.iter().enumerate() {
            for (x, &live) in bits.iter().enumerate() {
                if live {
                    grid.cells[y + 1][x + 1] = Alive;
                }
            }
        }
        Ok(grid)
    }

    /// Inverse of [`Grid::fingerprint`]. Bits beyond `width * height` are ignored.
    pub fn from_fingerprint(width: usize, height: usize, fingerprint: &Fingerprint) -> Self {
        let mut grid = Grid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if fingerprint.bit(y * width + x) {
                    grid.cells[y + 1][x + 1] = Alive;
                }
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// State at bordered coordinates; anything outside the storage is dead.
    pub fn cell(&self, x: usize, y: usize) -> CellState {
        self.cells
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(Dead)
    }

    /// Liveness of interior cell `(x, y)`, 0-based.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y + 1][x + 1] == Alive
    }

    /// Sum of the 8 Moore neighbors of bordered cell `(x, y)`.
    ///
    /// Only valid for interior coordinates (`1..=width`, `1..=height`).
    pub fn neighbor_count(&self, x: usize, y: usize) -> usize {
        debug_assert!((1..=self.width).contains(&x) && (1..=self.height).contains(&y));
        let mut count = 0;
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if (nx, ny) != (x, y) && self.cells[ny][nx] == Alive {
                    count += 1;
                }
            }
        }
        count
    }

    /// Next generation. All counts come from `self`; the result is a new grid.
    pub fn step(&self) -> Grid {
        let mut next = Grid::new(self.width, self.height);

        for y in 1..=self.height {
            for x in 1..=self.width {
                let alive_neighbors = self.neighbor_count(x, y);

                next.cells[y][x] = match (self.cells[y][x], alive_neighbors) {
                    (Alive, 2..=3) => Alive, // Survives
                    (Dead, 3) => Alive,      // Becomes alive
                    _ => Dead,               // Dies or remains dead
                };
            }
        }

        next
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let mut fingerprint = Fingerprint::zero();
        for (x, y) in self.live_cells() {
            fingerprint.set(y * self.width + x);
        }
        fingerprint
    }

    pub fn is_empty(&self) -> bool {
        self.population() == 0
    }

    pub fn population(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| **cell == Alive).count()
    }

    /// Live interior cells as 0-based `(x, y)` pairs.
    pub fn live_cells(&self) -> BTreeSet<(usize, usize)> {
        let mut live = BTreeSet::new();
        for y in 1..=self.height {
            for x in 1..=self.width {
                if self.cells[y][x] == Alive {
                    live.insert((x - 1, y - 1));
                }
            }
        }
        live
    }
}
