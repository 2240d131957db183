//! Randomized, throttled region growth.
//!
//! Seeds spread outward over unlabeled cells in rounds until the grid is
//! covered. Three sources of irregularity keep the boundaries organic
//! instead of Voronoi-straight:
//!
//! 1. The frontier is visited in a fresh random order every round.
//! 2. A single counter shared by all visits lets only every `skip`-th
//!    visit probe for neighbors, so fronts advance unevenly.
//! 3. Each probe scans the vicinity ring in a fresh random order and
//!    takes the first labeled cell it finds.
//!
//! Each round reads from a snapshot of the previous round's grid, so a
//! cell labeled in round `n` can only spread in round `n + 1`.

use std::ops::ControlFlow;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::diagnostics::RoundReport;
use crate::grid::LabelGrid;
use crate::kernel::VicinityKernel;
use crate::seed::Seeded;
use crate::types::{Coord, GrowthConfig, Label, RegionError, UNLABELED};

/// Result of a growth run.
#[derive(Debug, Clone)]
pub struct Grown {
    /// The grid after the last executed round.
    pub grid: LabelGrid,
    /// Coordinates still unlabeled. Empty unless the run was stopped early.
    pub frontier: Vec<Coord>,
    /// One report per executed round.
    pub rounds: Vec<RoundReport>,
}

impl Grown {
    /// Whether every cell carries a label.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.frontier.is_empty()
    }
}

/// The growth engine: a validated config and its vicinity ring.
#[derive(Debug, Clone)]
pub struct RegionGrowth {
    config: GrowthConfig,
    kernel: VicinityKernel,
}

impl RegionGrowth {
    /// Build an engine.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidKernelSize`] or
    /// [`RegionError::InvalidConfig`] when `config` fails validation.
    pub fn new(config: GrowthConfig) -> Result<Self, RegionError> {
        config.validate()?;
        let kernel = VicinityKernel::ring(config.kernel_diameter)?;
        Ok(Self { config, kernel })
    }

    /// The engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Grow until the frontier is empty.
    ///
    /// # Errors
    ///
    /// See [`run_with`](Self::run_with).
    pub fn run<R: Rng + ?Sized>(&self, seeded: Seeded, rng: &mut R) -> Result<Grown, RegionError> {
        self.run_with(seeded, rng, |_| ControlFlow::Continue(()))
    }

    /// Grow round by round, calling `on_round` after each one.
    ///
    /// Returning [`ControlFlow::Break`] from `on_round` stops growth
    /// between rounds; the returned grid is then partially labeled and
    /// `frontier` lists exactly its unlabeled cells.
    ///
    /// Growth carries no round limit. A configuration in which some
    /// unlabeled cell can never see a labeled one through the ring keeps
    /// running until `on_round` breaks.
    ///
    /// # Errors
    ///
    /// - [`RegionError::NoSeeds`] when every cell is unlabeled.
    /// - [`RegionError::InvalidConfig`] when `seeded.frontier` is not
    ///   exactly the set of unlabeled cells.
    pub fn run_with<R, F>(
        &self,
        seeded: Seeded,
        rng: &mut R,
        mut on_round: F,
    ) -> Result<Grown, RegionError>
    where
        R: Rng + ?Sized,
        F: FnMut(&RoundReport) -> ControlFlow<()>,
    {
        let Seeded {
            mut grid,
            mut frontier,
        } = seeded;
        check_frontier(&grid, &frontier)?;
        if frontier.len() == grid.dimensions().cell_count() {
            return Err(RegionError::NoSeeds);
        }

        let skip = self.config.skip;
        let mut snapshot = grid.clone();
        let mut offsets = self.kernel.offsets().to_vec();
        let mut counter = 0usize;
        let mut rounds = Vec::new();

        while !frontier.is_empty() {
            snapshot.copy_from(&grid);
            frontier.shuffle(rng);

            let frontier_before = frontier.len();
            let mut remaining = frontier_before;
            let mut eligible = 0usize;

            frontier.retain(|&coord| {
                counter = (counter + 1) % skip;
                if counter != 0 && remaining >= skip {
                    return true;
                }
                eligible += 1;
                match first_labeled_neighbor(&snapshot, coord, &mut offsets, &mut *rng) {
                    Some(label) => {
                        grid.set(coord.x, coord.y, label);
                        remaining -= 1;
                        false
                    }
                    None => true,
                }
            });

            let report = RoundReport {
                round: rounds.len() + 1,
                frontier_before,
                frontier_after: frontier.len(),
                eligible,
                grown: frontier_before - frontier.len(),
            };
            tracing::debug!(
                round = report.round,
                frontier = report.frontier_after,
                eligible = report.eligible,
                grown = report.grown,
                "growth round complete"
            );
            rounds.push(report);

            if on_round(&report).is_break() {
                tracing::debug!(
                    round = report.round,
                    frontier = frontier.len(),
                    "growth stopped by caller"
                );
                break;
            }
        }

        Ok(Grown {
            grid,
            frontier,
            rounds,
        })
    }
}

/// Grow an already-labeled grid (e.g. loaded from a raster), deriving
/// the frontier from its unlabeled cells.
///
/// # Errors
///
/// Same as [`RegionGrowth::new`] and [`RegionGrowth::run`].
pub fn grow<R: Rng + ?Sized>(
    grid: LabelGrid,
    config: &GrowthConfig,
    rng: &mut R,
) -> Result<Grown, RegionError> {
    let frontier = grid.unlabeled_coords();
    RegionGrowth::new(config.clone())?.run(Seeded { grid, frontier }, rng)
}

/// Scan the ring around `coord` in a fresh random order and return the
/// first label found in `snapshot`.
fn first_labeled_neighbor<R: Rng + ?Sized>(
    snapshot: &LabelGrid,
    coord: Coord,
    offsets: &mut [(isize, isize)],
    rng: &mut R,
) -> Option<Label> {
    offsets.shuffle(rng);
    offsets
        .iter()
        .map(|&(dx, dy)| snapshot.get_wrapped(coord, dx, dy))
        .find(|&label| label != UNLABELED)
}

/// The frontier must list every unlabeled cell exactly once.
fn check_frontier(grid: &LabelGrid, frontier: &[Coord]) -> Result<(), RegionError> {
    let mismatch = || {
        Err(RegionError::InvalidConfig(
            "frontier does not match the grid's unlabeled cells".to_string(),
        ))
    };
    if frontier.len() != grid.unlabeled_count() {
        return mismatch();
    }
    let mut listed = vec![false; grid.dimensions().cell_count()];
    for c in frontier {
        if c.x >= grid.width() || c.y >= grid.height() || grid.get(c.x, c.y) != UNLABELED {
            return mismatch();
        }
        if std::mem::replace(&mut listed[c.y * grid.width() + c.x], true) {
            return mismatch();
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::seed::{seed, seed_at};
    use crate::types::SeedConfig;

    fn engine() -> RegionGrowth {
        RegionGrowth::new(GrowthConfig::default()).unwrap()
    }

    #[test]
    fn growth_covers_every_cell() {
        let mut rng = StdRng::seed_from_u64(1);
        let seeded = seed(40, 30, &SeedConfig::default(), &mut rng).unwrap();
        let grown = engine().run(seeded, &mut rng).unwrap();
        assert!(grown.is_complete());
        assert_eq!(grown.grid.unlabeled_count(), 0);
    }

    #[test]
    fn seeds_keep_their_labels() {
        let mut rng = StdRng::seed_from_u64(2);
        let seeded = seed(32, 32, &SeedConfig::default(), &mut rng).unwrap();
        let seeds: Vec<(usize, usize, Label)> = (0..32)
            .flat_map(|y| (0..32).map(move |x| (x, y)))
            .filter_map(|(x, y)| {
                let v = seeded.grid.get(x, y);
                (v != UNLABELED).then_some((x, y, v))
            })
            .collect();
        assert_eq!(seeds.len(), 10);

        let grown = engine().run(seeded, &mut rng).unwrap();
        for (x, y, label) in seeds {
            assert_eq!(grown.grid.get(x, y), label);
        }
    }

    #[test]
    fn only_seed_labels_appear() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = SeedConfig {
            num_classes: 4,
            factor: 25,
            ..SeedConfig::default()
        };
        let seeded = seed(20, 20, &config, &mut rng).unwrap();
        let grown = engine().run(seeded, &mut rng).unwrap();
        assert_eq!(grown.grid.distinct_values(), vec![25, 50, 75, 100]);
    }

    #[test]
    fn frontier_never_grows_between_rounds() {
        let mut rng = StdRng::seed_from_u64(4);
        let seeded = seed(50, 40, &SeedConfig::default(), &mut rng).unwrap();
        let initial = seeded.frontier.len();
        let grown = engine().run(seeded, &mut rng).unwrap();

        let mut previous = initial;
        for r in &grown.rounds {
            assert_eq!(r.frontier_before, previous);
            assert!(r.frontier_after <= r.frontier_before);
            assert_eq!(r.grown, r.frontier_before - r.frontier_after);
            previous = r.frontier_after;
        }
        assert_eq!(previous, 0);
        assert!(grown.rounds.iter().any(|r| r.grown > 0));
    }

    #[test]
    fn throttle_limits_eligible_visits() {
        let mut rng = StdRng::seed_from_u64(5);
        let seeded = seed(60, 60, &SeedConfig::default(), &mut rng).unwrap();
        let grown = engine().run(seeded, &mut rng).unwrap();
        let first = grown.rounds[0];
        // A shared counter modulo 3 admits one visit in three.
        assert!(first.eligible <= first.frontier_before / 3 + 1);
    }

    #[test]
    fn growth_wraps_across_both_edges() {
        // Every visit is eligible and the ring has radius 2. Without
        // wraparound, (16, 16) is 8 rings away from a seed at (0, 0) and
        // cannot be labeled before round 8; through the wrapped corner it
        // is 2 cells away in both axes.
        let config = GrowthConfig {
            kernel_diameter: 5,
            skip: 1,
        };
        let seeded = seed_at(18, 18, &[(Coord::new(0, 0), 4)]).unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let grown = RegionGrowth::new(config)
            .unwrap()
            .run_with(seeded, &mut rng, |_| ControlFlow::Break(()))
            .unwrap();
        assert_eq!(grown.rounds.len(), 1);
        assert_eq!(grown.grid.get(16, 16), 4);
        assert_eq!(grown.grid.get(2, 16), 4);
        assert_eq!(grown.grid.get(16, 2), 4);
        assert_eq!(grown.grid.get(2, 2), 4);
        assert_eq!(grown.grid.get(8, 8), UNLABELED);
    }

    #[test]
    fn wrapped_ring_reaches_opposite_corner_directly() {
        // (width-2, height-2) sees (0, 0) at ring offset (+2, +2) only
        // through wraparound.
        let mut snapshot = LabelGrid::new(10, 8).unwrap();
        snapshot.set(0, 0, 6);
        let mut offsets = VicinityKernel::ring(5).unwrap().offsets().to_vec();
        let mut rng = StdRng::seed_from_u64(7);
        let found = first_labeled_neighbor(&snapshot, Coord::new(8, 6), &mut offsets, &mut rng);
        assert_eq!(found, Some(6));
    }

    #[test]
    fn same_rounds_read_previous_snapshot() {
        // With skip 1 every visit is eligible. A ring of radius 1 lets a
        // lone seed reach only its 8 neighbors in round one.
        let config = GrowthConfig {
            kernel_diameter: 3,
            skip: 1,
        };
        let seeded = seed_at(11, 11, &[(Coord::new(5, 5), 1)]).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let grown = RegionGrowth::new(config)
            .unwrap()
            .run_with(seeded, &mut rng, |_| ControlFlow::Break(()))
            .unwrap();
        assert_eq!(grown.rounds.len(), 1);
        assert_eq!(grown.rounds[0].grown, 8);
        assert_eq!(grown.frontier.len(), 121 - 9);
        for y in 0..11_usize {
            for x in 0..11_usize {
                let near = x.abs_diff(5) <= 1 && y.abs_diff(5) <= 1;
                assert_eq!(grown.grid.get(x, y) != UNLABELED, near, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn break_leaves_consistent_frontier() {
        let mut rng = StdRng::seed_from_u64(9);
        let seeded = seed(30, 30, &SeedConfig::default(), &mut rng).unwrap();
        let mut rounds = 0;
        let grown = engine()
            .run_with(seeded, &mut rng, |_| {
                rounds += 1;
                if rounds == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(grown.rounds.len(), 2);
        assert!(!grown.is_complete());
        assert_eq!(grown.frontier.len(), grown.grid.unlabeled_count());
        for c in &grown.frontier {
            assert_eq!(grown.grid.get(c.x, c.y), UNLABELED);
        }
    }

    #[test]
    fn same_rng_seed_reproduces_grid() {
        let run = |s: u64| {
            let mut rng = StdRng::seed_from_u64(s);
            let seeded = seed(25, 25, &SeedConfig::default(), &mut rng).unwrap();
            engine().run(seeded, &mut rng).unwrap().grid
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn unseeded_grid_is_rejected() {
        let grid = LabelGrid::new(5, 5).unwrap();
        let mut rng = StdRng::seed_from_u64(10);
        assert!(matches!(
            grow(grid, &GrowthConfig::default(), &mut rng),
            Err(RegionError::NoSeeds)
        ));
    }

    #[test]
    fn inconsistent_frontier_is_rejected() {
        let mut seeded = seed_at(4, 4, &[(Coord::new(1, 1), 2)]).unwrap();
        seeded.frontier.push(Coord::new(1, 1));
        let mut rng = StdRng::seed_from_u64(11);
        assert!(matches!(
            engine().run(seeded, &mut rng),
            Err(RegionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn duplicated_frontier_entry_is_rejected() {
        let mut seeded = seed_at(6, 6, &[(Coord::new(0, 0), 3)]).unwrap();
        let first = seeded.frontier[0];
        let last = seeded.frontier.len() - 1;
        seeded.frontier[last] = first;
        let mut rng = StdRng::seed_from_u64(13);
        assert!(matches!(
            engine().run(seeded, &mut rng),
            Err(RegionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn fully_seeded_grid_needs_no_rounds() {
        let grid = LabelGrid::from_raw(2, 2, vec![1, 2, 3, 4]).unwrap();
        let mut rng = StdRng::seed_from_u64(12);
        let grown = grow(grid, &GrowthConfig::default(), &mut rng).unwrap();
        assert!(grown.rounds.is_empty());
        assert_eq!(grown.grid.as_raw(), &[1, 2, 3, 4]);
    }

    #[test]
    fn invalid_kernel_is_rejected() {
        let config = GrowthConfig {
            kernel_diameter: 6,
            ..GrowthConfig::default()
        };
        assert!(matches!(
            RegionGrowth::new(config),
            Err(RegionError::InvalidKernelSize(6))
        ));
    }
}
