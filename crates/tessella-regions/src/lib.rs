//! tessella-regions: labeled-grid region decomposition and sampling (sans-IO).
//!
//! A grid of integer labels is seeded with a few labeled cells, then
//! grown outward by a randomized, throttled flood-fill until every cell
//! carries a label. The resulting regions have irregular, organic
//! borders. A deterministic spiral marking is available as an
//! alternative generator. Samplers then pull `(value, row, col)` triples
//! out of a finished grid: a rectangle, random cells inside a contour,
//! one group per label, or a regular lattice.
//!
//! ```text
//! seed -> grow ----\
//!                   +--> contour -> sample
//! spiral ----------/
//! ```
//!
//! This crate has **no I/O dependencies**. Grids move in and out as
//! in-memory rasters or PNG bytes (see [`raster`]); filesystem access
//! lives in `tessella-bench`.

pub mod contour;
pub mod diagnostics;
pub mod grid;
pub mod grow;
pub mod kernel;
pub mod raster;
pub mod sample;
pub mod seed;
pub mod spiral;
pub mod types;

pub use contour::{Contour, ContourTracer, ContourTracerKind};
pub use diagnostics::{Clock, GrowthDiagnostics, RoundReport};
pub use grid::LabelGrid;
pub use grow::{Grown, RegionGrowth, grow};
pub use kernel::VicinityKernel;
pub use sample::{RandomSamples, lattice_sampler, partition_sampler, random_sampler, roi_sampler};
pub use seed::{Seeded, seed, seed_at};
pub use spiral::{SpiralPath, mark_spiral, spiral_grid};
pub use types::{
    Coord, Dimensions, GrowthConfig, Label, Point, Rect, RegionError, Sample, SeedConfig,
    SpiralConfig, UNLABELED,
};
