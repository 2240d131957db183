//! Samplers: extract `(value, row, col)` triples from a labeled grid.
//!
//! All samplers take the grid read-only and return [`Sample`] snapshots.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::index;

use crate::contour::Contour;
use crate::grid::LabelGrid;
use crate::types::{Label, Rect, RegionError, Sample};

/// Result of [`random_sampler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomSamples {
    /// Samples that passed the containment test, in draw order.
    pub samples: Vec<Sample>,
    /// Distinct cells drawn before containment filtering.
    pub candidates: usize,
}

/// Every cell of `rect`, row-major.
///
/// # Errors
///
/// Returns [`RegionError::InvalidRect`] if the rectangle is empty or
/// extends past the grid.
pub fn roi_sampler(grid: &LabelGrid, rect: Rect) -> Result<Vec<Sample>, RegionError> {
    let rect = rect.validate_within(grid.dimensions())?;
    let mut samples = Vec::with_capacity(rect.area());
    for row in rect.y0..rect.y1 {
        for col in rect.x0..rect.x1 {
            samples.push(Sample::new(grid.get(col, row), row, col));
        }
    }
    tracing::debug!(%rect, samples = samples.len(), "roi sampled");
    Ok(samples)
}

/// Draw about `n` distinct cells strictly inside `contour`.
///
/// The contour's bounding rectangle is oversampled by
/// `rect_area / contour_area` so that roughly `n` candidates survive the
/// containment test; `round(n * q)` distinct cells are drawn from the
/// rectangle (clipped to the grid, and capped at its cell count) and
/// only those strictly inside the contour are kept. The result may hold
/// more or fewer than `n` samples.
///
/// With no contour, or an empty one, `min(n, width * height)` distinct
/// cells are drawn uniformly from the whole grid.
///
/// # Errors
///
/// Returns [`RegionError::DegenerateContour`] if the contour encloses
/// no area.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn random_sampler<R: Rng + ?Sized>(
    grid: &LabelGrid,
    n: usize,
    contour: Option<&Contour>,
    rng: &mut R,
) -> Result<RandomSamples, RegionError> {
    let Some(contour) = contour.filter(|c| !c.is_empty()) else {
        let cells = grid.width() * grid.height();
        let amount = n.min(cells);
        let samples: Vec<Sample> = index::sample(rng, cells, amount)
            .into_iter()
            .map(|i| {
                let c = grid.coord_of(i);
                Sample::new(grid.get(c.x, c.y), c.y, c.x)
            })
            .collect();
        tracing::debug!(requested = n, samples = samples.len(), "uniform sampled");
        return Ok(RandomSamples {
            samples,
            candidates: amount,
        });
    };

    let area = contour.area();
    if !area.is_finite() || area <= 0.0 {
        return Err(RegionError::DegenerateContour);
    }
    let Some(bounds) = contour.bounding_rect() else {
        return Err(RegionError::DegenerateContour);
    };

    let ratio = bounds.area() as f64 / area;
    let clipped = Rect::new(
        bounds.x0,
        bounds.y0,
        bounds.x1.min(grid.width()),
        bounds.y1.min(grid.height()),
    );
    let candidates = ((n as f64 * ratio).round() as usize).min(clipped.area());

    let rect_width = clipped.width();
    let samples: Vec<Sample> = if candidates == 0 {
        Vec::new()
    } else {
        index::sample(rng, clipped.area(), candidates)
            .into_iter()
            .map(|i| (clipped.x0 + i % rect_width, clipped.y0 + i / rect_width))
            .filter(|&(col, row)| contour.contains(col, row))
            .map(|(col, row)| Sample::new(grid.get(col, row), row, col))
            .collect()
    };

    tracing::debug!(
        requested = n,
        ratio,
        candidates,
        samples = samples.len(),
        "contour sampled"
    );
    Ok(RandomSamples {
        samples,
        candidates,
    })
}

/// One group per distinct value, ascending by value. Each group lists
/// its cells row-major.
#[must_use]
pub fn partition_sampler(grid: &LabelGrid) -> Vec<Vec<Sample>> {
    let mut groups: BTreeMap<Label, Vec<Sample>> = BTreeMap::new();
    for (i, &value) in grid.as_raw().iter().enumerate() {
        let c = grid.coord_of(i);
        groups
            .entry(value)
            .or_default()
            .push(Sample::new(value, c.y, c.x));
    }
    tracing::debug!(groups = groups.len(), "partition sampled");
    groups.into_values().collect()
}

/// A `y_steps x x_steps` lattice over `rect` (the whole grid if `None`).
///
/// Row and column positions are spaced evenly from the first to the last
/// cell of the rectangle and rounded half to even. When the steps exceed
/// the rectangle's extent several lattice points land on the same cell;
/// they are all returned.
///
/// # Errors
///
/// Returns [`RegionError::InvalidRect`] if the rectangle is empty or
/// extends past the grid.
pub fn lattice_sampler(
    grid: &LabelGrid,
    y_steps: usize,
    x_steps: usize,
    rect: Option<Rect>,
) -> Result<Vec<Sample>, RegionError> {
    let rect = rect
        .unwrap_or_else(|| Rect::covering(grid.dimensions()))
        .validate_within(grid.dimensions())?;
    let rows = spaced(rect.y0, rect.y1 - 1, y_steps);
    let cols = spaced(rect.x0, rect.x1 - 1, x_steps);

    let mut samples = Vec::with_capacity(rows.len() * cols.len());
    for &row in &rows {
        for &col in &cols {
            samples.push(Sample::new(grid.get(col, row), row, col));
        }
    }
    tracing::debug!(%rect, y_steps, x_steps, samples = samples.len(), "lattice sampled");
    Ok(samples)
}

/// `steps` evenly spaced values from `first` to `last` inclusive, rounded
/// half to even.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn spaced(first: usize, last: usize, steps: usize) -> Vec<usize> {
    match steps {
        0 => Vec::new(),
        1 => vec![first],
        _ => {
            let span = (last - first) as f64;
            let denom = (steps - 1) as f64;
            (0..steps)
                .map(|i| (first as f64 + i as f64 * span / denom).round_ties_even() as usize)
                .collect()
        }
    }
}
