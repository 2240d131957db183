//! Seeding: place the initial labeled cells of a fresh grid.
//!
//! A seeded grid is the starting point for [`crate::grow`]. Every cell
//! that is not a seed stays unlabeled and is listed in the returned
//! frontier.

use rand::Rng;
use rand::seq::index;

use crate::grid::LabelGrid;
use crate::types::{Coord, Label, RegionError, SeedConfig, UNLABELED};

/// A freshly seeded grid and the coordinates still to be claimed.
#[derive(Debug, Clone)]
pub struct Seeded {
    /// Grid holding the seed labels; all other cells are `0`.
    pub grid: LabelGrid,
    /// Every unlabeled coordinate, row-major.
    pub frontier: Vec<Coord>,
}

/// Seed a `width x height` grid at random positions.
///
/// When `num_instances < num_classes`, `num_classes` distinct cells are
/// drawn and labeled `1..=num_classes`. Otherwise `num_instances`
/// distinct cells are drawn and their labels cycle through
/// `1..=num_classes`, so a class may own several disconnected seeds.
/// Labels are multiplied by `config.factor`.
///
/// # Errors
///
/// - [`RegionError::InvalidDimensions`] for a zero-sized grid.
/// - [`RegionError::NoSeeds`] when `num_classes == 0`.
/// - [`RegionError::InvalidConfig`] when `factor == 0` or a scaled label
///   overflows.
/// - [`RegionError::InsufficientCells`] when `num_classes` or
///   `num_instances` exceeds `width * height`.
pub fn seed<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    config: &SeedConfig,
    rng: &mut R,
) -> Result<Seeded, RegionError> {
    let mut grid = LabelGrid::new(width, height)?;
    if config.num_classes == 0 {
        return Err(RegionError::NoSeeds);
    }
    if config.factor == 0 {
        return Err(RegionError::InvalidConfig(
            "label factor must be at least 1".to_string(),
        ));
    }

    let available = grid.dimensions().cell_count();
    let requested = config.num_classes.max(config.num_instances);
    if requested > available {
        return Err(RegionError::InsufficientCells {
            requested,
            available,
        });
    }

    let count = if config.num_instances < config.num_classes {
        config.num_classes
    } else {
        config.num_instances
    };

    let positions = index::sample(rng, available, count);
    for (k, cell) in positions.into_iter().enumerate() {
        let label = class_label(k % config.num_classes, config.factor)?;
        let coord = grid.coord_of(cell);
        grid.set(coord.x, coord.y, label);
    }

    let frontier = grid.unlabeled_coords();
    tracing::debug!(
        width,
        height,
        seeds = count,
        classes = config.num_classes,
        frontier = frontier.len(),
        "seeded grid"
    );
    Ok(Seeded { grid, frontier })
}

/// Seed a grid at caller-chosen positions.
///
/// Later entries overwrite earlier ones at the same coordinate.
///
/// # Errors
///
/// - [`RegionError::InvalidDimensions`] for a zero-sized grid.
/// - [`RegionError::NoSeeds`] when `seeds` is empty.
/// - [`RegionError::InvalidConfig`] for a zero label or an out-of-bounds
///   coordinate.
pub fn seed_at(
    width: usize,
    height: usize,
    seeds: &[(Coord, Label)],
) -> Result<Seeded, RegionError> {
    let mut grid = LabelGrid::new(width, height)?;
    if seeds.is_empty() {
        return Err(RegionError::NoSeeds);
    }
    for &(coord, label) in seeds {
        if label == UNLABELED {
            return Err(RegionError::InvalidConfig(format!(
                "seed at ({}, {}) has the reserved label 0",
                coord.x, coord.y
            )));
        }
        if coord.x >= width || coord.y >= height {
            return Err(RegionError::InvalidConfig(format!(
                "seed at ({}, {}) lies outside the {width}x{height} grid",
                coord.x, coord.y
            )));
        }
        grid.set(coord.x, coord.y, label);
    }
    let frontier = grid.unlabeled_coords();
    Ok(Seeded { grid, frontier })
}

fn class_label(class_index: usize, factor: Label) -> Result<Label, RegionError> {
    Label::try_from(class_index + 1)
        .ok()
        .and_then(|l| l.checked_mul(factor))
        .ok_or_else(|| {
            RegionError::InvalidConfig(format!(
                "label {} scaled by {factor} overflows",
                class_index + 1
            ))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn config(classes: usize, instances: usize, factor: Label) -> SeedConfig {
        SeedConfig {
            num_classes: classes,
            num_instances: instances,
            factor,
        }
    }

    #[test]
    fn classes_get_unique_labels() {
        let mut rng = StdRng::seed_from_u64(1);
        let seeded = seed(20, 10, &config(10, 0, 1), &mut rng).unwrap();
        let mut labels: Vec<Label> = seeded
            .grid
            .as_raw()
            .iter()
            .copied()
            .filter(|&v| v != 0)
            .collect();
        labels.sort_unstable();
        assert_eq!(labels, (1..=10).collect::<Vec<_>>());
        assert_eq!(seeded.frontier.len(), 200 - 10);
    }

    #[test]
    fn factor_scales_labels() {
        let mut rng = StdRng::seed_from_u64(2);
        let seeded = seed(8, 8, &config(5, 0, 10), &mut rng).unwrap();
        let mut labels: Vec<Label> = seeded
            .grid
            .as_raw()
            .iter()
            .copied()
            .filter(|&v| v != 0)
            .collect();
        labels.sort_unstable();
        assert_eq!(labels, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn instances_cycle_through_classes() {
        let mut rng = StdRng::seed_from_u64(3);
        let seeded = seed(10, 10, &config(3, 7, 1), &mut rng).unwrap();
        let mut labels: Vec<Label> = seeded
            .grid
            .as_raw()
            .iter()
            .copied()
            .filter(|&v| v != 0)
            .collect();
        labels.sort_unstable();
        assert_eq!(labels, vec![1, 1, 1, 2, 2, 3, 3]);
        assert_eq!(seeded.frontier.len(), 93);
    }

    #[test]
    fn frontier_matches_unlabeled_cells() {
        let mut rng = StdRng::seed_from_u64(4);
        let seeded = seed(7, 5, &config(4, 0, 1), &mut rng).unwrap();
        for c in &seeded.frontier {
            assert_eq!(seeded.grid.get(c.x, c.y), UNLABELED);
        }
        assert_eq!(seeded.frontier.len(), seeded.grid.unlabeled_count());
    }

    #[test]
    fn same_seed_same_grid() {
        let a = seed(30, 20, &config(6, 0, 1), &mut StdRng::seed_from_u64(9)).unwrap();
        let b = seed(30, 20, &config(6, 0, 1), &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a.grid, b.grid);
    }

    #[test]
    fn too_many_classes_is_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            seed(2, 2, &config(5, 0, 1), &mut rng),
            Err(RegionError::InsufficientCells {
                requested: 5,
                available: 4
            })
        ));
        assert!(matches!(
            seed(2, 2, &config(2, 6, 1), &mut rng),
            Err(RegionError::InsufficientCells {
                requested: 6,
                available: 4
            })
        ));
    }

    #[test]
    fn every_cell_can_be_a_seed() {
        let mut rng = StdRng::seed_from_u64(6);
        let seeded = seed(3, 3, &config(9, 0, 1), &mut rng).unwrap();
        assert!(seeded.frontier.is_empty());
    }

    #[test]
    fn zero_classes_has_no_seeds() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            seed(4, 4, &config(0, 0, 1), &mut rng),
            Err(RegionError::NoSeeds)
        ));
    }

    #[test]
    fn zero_factor_is_rejected() {
        let mut rng = StdRng::seed_from_u64(8);
        assert!(matches!(
            seed(4, 4, &config(2, 0, 0), &mut rng),
            Err(RegionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn seed_at_places_fixed_labels() {
        let seeded = seed_at(4, 3, &[(Coord::new(0, 0), 5), (Coord::new(3, 2), 9)]).unwrap();
        assert_eq!(seeded.grid.get(0, 0), 5);
        assert_eq!(seeded.grid.get(3, 2), 9);
        assert_eq!(seeded.frontier.len(), 10);
    }

    #[test]
    fn seed_at_rejects_bad_input() {
        assert!(matches!(seed_at(4, 4, &[]), Err(RegionError::NoSeeds)));
        assert!(matches!(
            seed_at(4, 4, &[(Coord::new(4, 0), 1)]),
            Err(RegionError::InvalidConfig(_))
        ));
        assert!(matches!(
            seed_at(4, 4, &[(Coord::new(1, 1), 0)]),
            Err(RegionError::InvalidConfig(_))
        ));
    }
}
