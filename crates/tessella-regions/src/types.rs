//! Shared types for the tessella region engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Region identity stored in a grid cell. `0` means unlabeled.
pub type Label = u32;

/// The label value reserved for cells that no region has claimed yet.
pub const UNLABELED: Label = 0;

/// A 2D point in grid coordinates, used for contour geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (columns from the left edge).
    pub x: f64,
    /// Vertical position (rows from the top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An integer cell coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Column, `0 <= x < width`.
    pub x: usize,
    /// Row, `0 <= y < height`.
    pub y: usize,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl Dimensions {
    /// Total number of cells, saturating at `usize::MAX`.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Total number of cells, or `None` if the product overflows.
    #[must_use]
    pub const fn checked_cell_count(self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }
}

/// Half-open axis-aligned rectangle: columns `x0..x1`, rows `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// First column (inclusive).
    pub x0: usize,
    /// First row (inclusive).
    pub y0: usize,
    /// Last column (exclusive).
    pub x1: usize,
    /// Last row (exclusive).
    pub y1: usize,
}

impl Rect {
    /// Create a rectangle from `[x0, y0, x1, y1]` corners.
    #[must_use]
    pub const fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The rectangle covering a whole grid.
    #[must_use]
    pub const fn covering(dimensions: Dimensions) -> Self {
        Self::new(0, 0, dimensions.width, dimensions.height)
    }

    /// Number of columns spanned.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    /// Number of rows spanned.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    /// Number of cells spanned.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width().saturating_mul(self.height())
    }

    /// Check that the rectangle is non-empty and lies inside a grid.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidRect`] if `x1 <= x0`, `y1 <= y0`,
    /// or the rectangle extends past the grid bounds.
    pub fn validate_within(self, dimensions: Dimensions) -> Result<Self, RegionError> {
        if self.x1 <= self.x0
            || self.y1 <= self.y0
            || self.x1 > dimensions.width
            || self.y1 > dimensions.height
        {
            return Err(RegionError::InvalidRect {
                rect: self,
                width: dimensions.width,
                height: dimensions.height,
            });
        }
        Ok(self)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x0, self.y0, self.x1, self.y1)
    }
}

/// A `(value, row, col)` triple read from a grid.
///
/// Samples are snapshots: they hold no reference to the grid they came
/// from and stay valid after the grid is mutated or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    /// Label value of the cell at sampling time.
    pub value: Label,
    /// Row of the cell.
    pub row: usize,
    /// Column of the cell.
    pub col: usize,
}

impl Sample {
    /// Create a new sample.
    #[must_use]
    pub const fn new(value: Label, row: usize, col: usize) -> Self {
        Self { value, row, col }
    }
}

/// Parameters for seeding an empty grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Number of distinct region labels.
    pub num_classes: usize,

    /// Number of seed cells. When smaller than `num_classes` it is
    /// ignored and one seed per class is placed.
    pub num_instances: usize,

    /// Multiplier applied to every seed label. Values above 1 spread
    /// labels over the 8-bit range for inspection.
    pub factor: Label,
}

impl SeedConfig {
    /// Default number of classes.
    pub const DEFAULT_NUM_CLASSES: usize = 10;
    /// Default label multiplier.
    pub const DEFAULT_FACTOR: Label = 1;
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            num_classes: Self::DEFAULT_NUM_CLASSES,
            num_instances: 0,
            factor: Self::DEFAULT_FACTOR,
        }
    }
}

/// Parameters for the randomized region growth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Side length of the square whose border ring is probed for
    /// labeled neighbors. Must be odd.
    pub kernel_diameter: usize,

    /// Throttle divisor: only every `skip`-th frontier visit may grow.
    pub skip: usize,
}

impl GrowthConfig {
    /// Default probe ring diameter (radius 2).
    pub const DEFAULT_KERNEL_DIAMETER: usize = 5;
    /// Default throttle divisor.
    pub const DEFAULT_SKIP: usize = 3;

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidKernelSize`] for an even or zero
    /// diameter, [`RegionError::InvalidConfig`] for `skip == 0`.
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.kernel_diameter == 0 || self.kernel_diameter % 2 == 0 {
            return Err(RegionError::InvalidKernelSize(self.kernel_diameter));
        }
        if self.skip == 0 {
            return Err(RegionError::InvalidConfig(
                "skip must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            kernel_diameter: Self::DEFAULT_KERNEL_DIAMETER,
            skip: Self::DEFAULT_SKIP,
        }
    }
}

/// Parameters for spiral marking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralConfig {
    /// Value written into every cell the spiral passes through.
    pub mark: Label,
}

impl SpiralConfig {
    /// Default sentinel value.
    pub const DEFAULT_MARK: Label = 100;
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self {
            mark: Self::DEFAULT_MARK,
        }
    }
}

/// Errors raised by seeding, growth, sampling, and raster conversion.
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// Probe ring diameter is even or zero.
    #[error("kernel diameter must be odd and positive, got {0}")]
    InvalidKernelSize(usize),

    /// More seeds were requested than the grid has cells.
    #[error("cannot place {requested} seeds in a grid of {available} cells")]
    InsufficientCells {
        /// Seeds requested.
        requested: usize,
        /// Cells available.
        available: usize,
    },

    /// Growth was requested on a grid without any labeled cell.
    #[error("grid has no seeded cells")]
    NoSeeds,

    /// Rectangle is empty or exceeds the grid.
    #[error("invalid rectangle {rect} for a {width}x{height} grid")]
    InvalidRect {
        /// The rejected rectangle.
        rect: Rect,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// Contour encloses zero area.
    #[error("contour has zero area")]
    DegenerateContour,

    /// Grid has a zero dimension.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raster input bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Raster input could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A label does not fit in the 8-bit raster format.
    #[error("label {label} exceeds the raster maximum of {max}")]
    LabelOutOfRange {
        /// Offending label.
        label: Label,
        /// Largest storable label.
        max: Label,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cell_counts_do_not_overflow() {
        let huge = Dimensions {
            width: usize::MAX,
            height: 3,
        };
        assert_eq!(huge.checked_cell_count(), None);
        assert_eq!(huge.cell_count(), usize::MAX);
        assert_eq!(Rect::new(0, 0, usize::MAX, 2).area(), usize::MAX);
    }

    #[test]
    fn rect_dimensions() {
        let r = Rect::new(25, 32, 160, 177);
        assert_eq!(r.width(), 135);
        assert_eq!(r.height(), 145);
        assert_eq!(r.area(), 19575);
    }

    #[test]
    fn rect_inverted_is_rejected() {
        let dims = Dimensions {
            width: 10,
            height: 10,
        };
        assert!(matches!(
            Rect::new(5, 0, 5, 3).validate_within(dims),
            Err(RegionError::InvalidRect { .. })
        ));
        assert!(matches!(
            Rect::new(0, 4, 3, 2).validate_within(dims),
            Err(RegionError::InvalidRect { .. })
        ));
    }

    #[test]
    fn rect_out_of_bounds_is_rejected() {
        let dims = Dimensions {
            width: 10,
            height: 8,
        };
        assert!(Rect::new(0, 0, 10, 8).validate_within(dims).is_ok());
        assert!(Rect::new(0, 0, 11, 8).validate_within(dims).is_err());
        assert!(Rect::new(0, 0, 10, 9).validate_within(dims).is_err());
    }

    #[test]
    fn growth_config_defaults() {
        let config = GrowthConfig::default();
        assert_eq!(config.kernel_diameter, 5);
        assert_eq!(config.skip, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn growth_config_rejects_even_diameter() {
        let config = GrowthConfig {
            kernel_diameter: 4,
            ..GrowthConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegionError::InvalidKernelSize(4))
        ));
    }

    #[test]
    fn growth_config_rejects_zero_skip() {
        let config = GrowthConfig {
            skip: 0,
            ..GrowthConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn error_display_strings() {
        assert_eq!(RegionError::NoSeeds.to_string(), "grid has no seeded cells");
        assert_eq!(
            RegionError::InsufficientCells {
                requested: 7,
                available: 4
            }
            .to_string(),
            "cannot place 7 seeds in a grid of 4 cells",
        );
        assert_eq!(
            RegionError::InvalidRect {
                rect: Rect::new(1, 2, 3, 4),
                width: 2,
                height: 2,
            }
            .to_string(),
            "invalid rectangle [1, 2, 3, 4] for a 2x2 grid",
        );
        assert_eq!(
            RegionError::DegenerateContour.to_string(),
            "contour has zero area"
        );
    }

    #[test]
    fn seed_config_partial_json_uses_defaults() {
        let config: SeedConfig = serde_json::from_str(r#"{"num_classes": 4}"#).unwrap();
        assert_eq!(config.num_classes, 4);
        assert_eq!(config.num_instances, 0);
        assert_eq!(config.factor, 1);
    }

    #[test]
    fn sample_serde_round_trip() {
        let s = Sample::new(3, 10, 20);
        let json = serde_json::to_string(&s).unwrap();
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
