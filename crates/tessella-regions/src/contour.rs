//! Contours: closed boundary polygons used to filter samples.
//!
//! This module defines the [`Contour`] geometry the samplers consume and
//! the [`ContourTracer`] trait for extracting contours from a labeled
//! grid, with [`ContourTracerKind`] selecting the strategy at runtime.
//!
//! The samplers only ever ask a contour for its bounding rectangle, its
//! area, and whether a cell lies strictly inside it, so contours from
//! any boundary tracer can be used interchangeably.

use geo::{Area, BoundingRect, Contains, LineString, Polygon};
use image::{GrayImage, Luma};
use imageproc::contours::BorderType;
use serde::{Deserialize, Serialize};

use crate::grid::LabelGrid;
use crate::types::{Label, Point, Rect, RegionError};

/// A closed polygon through boundary points, in grid coordinates.
///
/// The last point connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Point>,
    polygon: Polygon<f64>,
}

impl Contour {
    /// Create a contour from boundary points.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        let ring: LineString<f64> = points.iter().map(|p| (p.x, p.y)).collect();
        let polygon = Polygon::new(ring, Vec::new());
        Self { points, polygon }
    }

    /// Create a contour from integer `(col, row)` pairs.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_cells(cells: &[(usize, usize)]) -> Self {
        Self::new(
            cells
                .iter()
                .map(|&(x, y)| Point::new(x as f64, y as f64))
                .collect(),
        )
    }

    /// The boundary points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of boundary points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area (shoelace formula), regardless of winding.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    /// Smallest cell rectangle covering every boundary point.
    ///
    /// Like a pixel bounding box, the extent is inclusive of the last
    /// boundary cell, so a contour spanning columns `2..=5` yields
    /// `x0 = 2, x1 = 6`. Negative coordinates clamp to zero. Returns
    /// `None` for an empty contour.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn bounding_rect(&self) -> Option<Rect> {
        let rect = self.polygon.exterior().bounding_rect()?;
        let (min, max) = (rect.min(), rect.max());
        Some(Rect::new(
            min.x.floor().max(0.0) as usize,
            min.y.floor().max(0.0) as usize,
            max.x.floor().max(0.0) as usize + 1,
            max.y.floor().max(0.0) as usize + 1,
        ))
    }

    /// Whether the cell at (`col`, `row`) lies strictly inside the
    /// contour. Cells on the boundary are outside.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, col: usize, row: usize) -> bool {
        self.polygon
            .contains(&geo::Point::new(col as f64, row as f64))
    }
}

/// Selects which contour tracing strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourTracerKind {
    /// Outermost borders only: one contour per connected foreground blob,
    /// holes and nested blobs ignored.
    #[default]
    External,
    /// Every border, outer and hole, at every nesting level.
    All,
}

/// Trait for contour tracing strategies.
///
/// Input: a labeled grid and a threshold; cells with a value strictly
/// above the threshold are foreground.
/// Output: one contour per traced border.
pub trait ContourTracer {
    /// Trace contours in the thresholded grid.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidDimensions`] if the grid does not
    /// fit a raster.
    fn trace(&self, grid: &LabelGrid, threshold: Label) -> Result<Vec<Contour>, RegionError>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, grid: &LabelGrid, threshold: Label) -> Result<Vec<Contour>, RegionError> {
        let mask = foreground_mask(grid, |v| v > threshold)?;
        let contours = match *self {
            Self::External => trace_borders(&mask, true),
            Self::All => trace_borders(&mask, false),
        };
        tracing::debug!(
            kind = ?self,
            threshold,
            contours = contours.len(),
            "traced contours"
        );
        Ok(contours)
    }
}

/// Outer contours of the cells carrying exactly `label`.
///
/// # Errors
///
/// Returns [`RegionError::InvalidDimensions`] if the grid does not fit a
/// raster.
pub fn label_mask_contours(grid: &LabelGrid, label: Label) -> Result<Vec<Contour>, RegionError> {
    let mask = foreground_mask(grid, |v| v == label)?;
    Ok(trace_borders(&mask, true))
}

/// Binary raster: 255 where `is_foreground` holds, 0 elsewhere.
fn foreground_mask(
    grid: &LabelGrid,
    is_foreground: impl Fn(Label) -> bool,
) -> Result<GrayImage, RegionError> {
    let invalid = || RegionError::InvalidDimensions {
        width: grid.width(),
        height: grid.height(),
    };
    let width = u32::try_from(grid.width()).map_err(|_| invalid())?;
    let height = u32::try_from(grid.height()).map_err(|_| invalid())?;
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let v = grid.get(x as usize, y as usize);
        Luma([if is_foreground(v) { 255 } else { 0 }])
    }))
}

/// Suzuki-Abe border following via `imageproc::contours::find_contours`.
fn trace_borders(mask: &GrayImage, external_only: bool) -> Vec<Contour> {
    imageproc::contours::find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| !external_only || (c.border_type == BorderType::Outer && c.parent.is_none()))
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            Contour::new(points)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(x0: usize, y0: usize, x1: usize, y1: usize) -> Contour {
        Contour::from_cells(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    /// Grid with a filled `label` block over columns `x0..x1`, rows `y0..y1`.
    fn block_grid(w: usize, h: usize, r: Rect, label: Label) -> LabelGrid {
        let mut g = LabelGrid::new(w, h).unwrap();
        for y in r.y0..r.y1 {
            for x in r.x0..r.x1 {
                g.set(x, y, label);
            }
        }
        g
    }

    #[test]
    fn square_area_and_bounds() {
        let c = square(2, 3, 12, 8);
        assert!((c.area() - 50.0).abs() < 1e-9);
        assert_eq!(c.bounding_rect(), Some(Rect::new(2, 3, 13, 9)));
    }

    #[test]
    fn winding_does_not_change_area() {
        let cw = Contour::from_cells(&[(0, 0), (0, 4), (4, 4), (4, 0)]);
        let ccw = Contour::from_cells(&[(0, 0), (4, 0), (4, 4), (0, 4)]);
        assert!((cw.area() - ccw.area()).abs() < 1e-9);
    }

    #[test]
    fn containment_is_strict() {
        let c = square(0, 0, 4, 4);
        assert!(c.contains(2, 2));
        assert!(!c.contains(0, 2));
        assert!(!c.contains(4, 4));
        assert!(!c.contains(5, 1));
    }

    #[test]
    fn empty_contour_has_no_bounds() {
        let c = Contour::new(Vec::new());
        assert!(c.is_empty());
        assert_eq!(c.bounding_rect(), None);
        assert!(c.area().abs() < f64::EPSILON);
    }

    #[test]
    fn default_is_external() {
        assert_eq!(ContourTracerKind::default(), ContourTracerKind::External);
    }

    #[test]
    fn empty_grid_produces_no_contours() {
        let g = LabelGrid::new(10, 10).unwrap();
        assert!(ContourTracerKind::External.trace(&g, 0).unwrap().is_empty());
    }

    #[test]
    fn block_produces_one_external_contour() {
        let g = block_grid(20, 20, Rect::new(5, 6, 15, 14), 9);
        let contours = ContourTracerKind::External.trace(&g, 0).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some(Rect::new(5, 6, 15, 14)));
        assert!(contours[0].contains(10, 10));
        assert!(!contours[0].contains(5, 10));
    }

    #[test]
    fn threshold_excludes_low_labels() {
        let mut g = block_grid(20, 20, Rect::new(2, 2, 8, 8), 50);
        for y in 12..18 {
            for x in 12..18 {
                g.set(x, y, 150);
            }
        }
        let contours = ContourTracerKind::External.trace(&g, 100).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some(Rect::new(12, 12, 18, 18)));
    }

    #[test]
    fn all_includes_holes() {
        // A ring: filled block with a hollow center.
        let mut g = block_grid(20, 20, Rect::new(3, 3, 17, 17), 1);
        for y in 7..13 {
            for x in 7..13 {
                g.set(x, y, 0);
            }
        }
        let external = ContourTracerKind::External.trace(&g, 0).unwrap();
        let all = ContourTracerKind::All.trace(&g, 0).unwrap();
        assert_eq!(external.len(), 1);
        assert!(all.len() > external.len());
    }

    #[test]
    fn label_mask_contours_isolate_one_label() {
        let mut g = block_grid(16, 16, Rect::new(0, 0, 8, 16), 1);
        for y in 0..16 {
            for x in 8..16 {
                g.set(x, y, 2);
            }
        }
        let contours = label_mask_contours(&g, 2).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some(Rect::new(8, 0, 16, 16)));
    }
}
