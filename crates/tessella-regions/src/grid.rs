//! Row-major label grid with toroidal neighbor addressing.
//!
//! Both axes wrap: stepping off the right edge lands on the left edge,
//! stepping off the bottom lands on the top. Growth relies on this so a
//! seed near one border can claim cells across the opposite border.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Coord, Dimensions, Label, RegionError, UNLABELED};

/// A `height x width` buffer of labels, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelGrid {
    data: Vec<Label>,
    width: usize,
    height: usize,
}

impl LabelGrid {
    /// Create an all-unlabeled grid.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidDimensions`] if either dimension is
    /// zero or `width * height` overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, RegionError> {
        let cells = checked_cells(width, height)?;
        Ok(Self {
            data: vec![UNLABELED; cells],
            width,
            height,
        })
    }

    /// Wrap an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidDimensions`] if either dimension is
    /// zero, `width * height` overflows, or `data.len() != width * height`.
    pub fn from_raw(width: usize, height: usize, data: Vec<Label>) -> Result<Self, RegionError> {
        if data.len() != checked_cells(width, height)? {
            return Err(RegionError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Row-major cell values.
    #[must_use]
    pub fn as_raw(&self) -> &[Label] {
        &self.data
    }

    /// Consume the grid and return the row-major buffer.
    #[must_use]
    pub fn into_raw(self) -> Vec<Label> {
        self.data
    }

    #[inline]
    const fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Coordinate of a flat row-major index.
    #[inline]
    #[must_use]
    pub const fn coord_of(&self, index: usize) -> Coord {
        Coord::new(index % self.width, index / self.width)
    }

    /// Label at column `x`, row `y`.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Label {
        self.data[self.idx(x, y)]
    }

    /// Overwrite the label at column `x`, row `y`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, label: Label) {
        let i = self.idx(x, y);
        self.data[i] = label;
    }

    /// Label at `coord` offset by `(dx, dy)`, wrapping on both axes.
    #[inline]
    #[must_use]
    pub fn get_wrapped(&self, coord: Coord, dx: isize, dy: isize) -> Label {
        let (x, y) = wrap_xy(coord, dx, dy, self.width, self.height);
        self.get(x, y)
    }

    /// Copy every cell of `other` into `self`. Dimensions must match.
    pub(crate) fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        self.data.copy_from_slice(&other.data);
    }

    /// Coordinates of every unlabeled cell, in row-major order.
    #[must_use]
    pub fn unlabeled_coords(&self) -> Vec<Coord> {
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == UNLABELED)
            .map(|(i, _)| self.coord_of(i))
            .collect()
    }

    /// Number of unlabeled cells.
    #[must_use]
    pub fn unlabeled_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == UNLABELED).count()
    }

    /// Largest label present, or `None` for an all-unlabeled grid.
    #[must_use]
    pub fn max_label(&self) -> Option<Label> {
        self.data.iter().copied().filter(|&v| v != UNLABELED).max()
    }

    /// Distinct values present (including `0`), ascending.
    #[must_use]
    pub fn distinct_values(&self) -> Vec<Label> {
        let mut values = self.data.clone();
        values.sort_unstable();
        values.dedup();
        values
    }

    /// Relabel the grid so the distinct values present become `1..=n`,
    /// preserving their order. Returns `n`.
    ///
    /// Unlabeled cells are treated like any other value, so a loaded
    /// raster always ends up with `0` free for background.
    pub fn compact_labels(&mut self) -> usize {
        let mapping: BTreeMap<Label, Label> = self
            .distinct_values()
            .into_iter()
            .zip(1..)
            .collect();
        for v in &mut self.data {
            *v = mapping[&*v];
        }
        mapping.len()
    }
}

/// Cell count of a non-empty grid whose size fits in `usize`.
fn checked_cells(width: usize, height: usize) -> Result<usize, RegionError> {
    Dimensions { width, height }
        .checked_cell_count()
        .filter(|&cells| cells > 0)
        .ok_or(RegionError::InvalidDimensions { width, height })
}

/// Wrap `coord + (dx, dy)` onto a `w x h` torus.
#[inline]
#[must_use]
pub fn wrap_xy(coord: Coord, dx: isize, dy: isize, w: usize, h: usize) -> (usize, usize) {
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    let wrap = |v: usize, d: isize, n: usize| -> usize {
        let n = n as isize;
        ((v as isize + d).rem_euclid(n)) as usize
    };
    (wrap(coord.x, dx, w), wrap(coord.y, dy, h))
}
