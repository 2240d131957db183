//! Deterministic Archimedean spiral marking.
//!
//! The spiral starts at the grid center and winds outward with radius
//! `b * phi`, `b = 1.8 / pi`. The angle follows
//! `phi_i = i * pi / (100 * sqrt(phi_{i-1}))` from `phi_0 = 1`, which
//! slows the angular step as the spiral widens so consecutive points
//! stay roughly a cell apart.
//!
//! Iteration stops once more than `width * height` consecutive steps
//! have fallen outside the grid. Past the grid's circumscribed circle the
//! spiral never re-enters, and one revolution at that radius takes far
//! fewer steps than the bound.

use std::f64::consts::PI;

use crate::grid::LabelGrid;
use crate::types::{Coord, Dimensions, RegionError, SpiralConfig};

/// Radial scale of the spiral.
const SPIRAL_B: f64 = 1.8 / PI;

/// Iterator over the in-bounds cells visited by the spiral, in order.
///
/// A cell may be visited more than once near the center, where
/// consecutive points round to the same cell.
#[derive(Debug, Clone)]
pub struct SpiralPath {
    dimensions: Dimensions,
    center_row: f64,
    center_col: f64,
    phi: f64,
    step: u64,
    misses: usize,
}

impl SpiralPath {
    /// Spiral over a grid of the given dimensions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            center_row: dimensions.height as f64 / 2.0,
            center_col: dimensions.width as f64 / 2.0,
            phi: 1.0,
            step: 0,
            misses: 0,
        }
    }

    /// Number of spiral steps taken so far, in-bounds or not.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.step
    }

    /// Candidate `(row, col)` for the next step, possibly out of bounds.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    fn advance(&mut self) -> (i64, i64) {
        self.step += 1;
        self.phi = self.step as f64 * PI / 100.0 / self.phi.sqrt();
        let r = SPIRAL_B * self.phi;
        let row = ((r * self.phi.sin()).round_ties_even() + self.center_row) as i64;
        let col = ((r * self.phi.cos()).round_ties_even() + self.center_col) as i64;
        (row, col)
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn in_bounds(&self, row: i64, col: i64) -> Option<Coord> {
        let inside = row >= 0
            && col >= 0
            && row < self.dimensions.height as i64
            && col < self.dimensions.width as i64;
        inside.then(|| Coord::new(col as usize, row as usize))
    }
}

impl Iterator for SpiralPath {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        let limit = self.dimensions.cell_count();
        while self.misses <= limit {
            let (row, col) = self.advance();
            if let Some(coord) = self.in_bounds(row, col) {
                self.misses = 0;
                return Some(coord);
            }
            self.misses += 1;
        }
        None
    }
}

/// Mark every cell on the spiral with `config.mark`. Returns the number
/// of in-bounds visits (repeat visits included).
pub fn mark_spiral(grid: &mut LabelGrid, config: &SpiralConfig) -> usize {
    let mut path = SpiralPath::new(grid.dimensions());
    let mut visits = 0usize;
    for coord in path.by_ref() {
        grid.set(coord.x, coord.y, config.mark);
        visits += 1;
    }
    tracing::debug!(
        width = grid.width(),
        height = grid.height(),
        steps = path.steps(),
        visits,
        "spiral marked"
    );
    visits
}

/// Create a fresh grid and mark the spiral on it.
///
/// # Errors
///
/// Returns [`RegionError::InvalidDimensions`] for a zero-sized grid.
pub fn spiral_grid(
    width: usize,
    height: usize,
    config: &SpiralConfig,
) -> Result<LabelGrid, RegionError> {
    let mut grid = LabelGrid::new(width, height)?;
    mark_spiral(&mut grid, config);
    Ok(grid)
}
