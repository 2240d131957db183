//! Growth diagnostics: per-round frontier counts and timing.
//!
//! Every call to [`grow_with_diagnostics`] collects one [`RoundReport`]
//! per round alongside the grown grid. Timing goes through the
//! [`Clock`] trait so callers pick the time source.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::ops::ControlFlow;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grow::{Grown, RegionGrowth};
use crate::seed::Seeded;
use crate::types::{GrowthConfig, RegionError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for measuring growth.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// What happened during one growth round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    /// 1-based round number.
    pub round: usize,
    /// Frontier size when the round started.
    pub frontier_before: usize,
    /// Frontier size when the round ended.
    pub frontier_after: usize,
    /// Visits that passed the throttle and probed their neighbors.
    pub eligible: usize,
    /// Cells that received a label this round.
    pub grown: usize,
}

/// Diagnostics for a full growth run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthDiagnostics {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Labeled cells before the first round.
    pub seed_count: usize,
    /// Configuration the run used.
    pub config: GrowthConfig,
    /// One entry per executed round.
    pub rounds: Vec<RoundReport>,
    /// Whether the frontier was emptied.
    pub completed: bool,
    /// Wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl GrowthDiagnostics {
    /// Frontier size at the end of each round.
    #[must_use]
    pub fn frontier_history(&self) -> Vec<usize> {
        self.rounds.iter().map(|r| r.frontier_after).collect()
    }

    /// Total cells labeled by growth.
    #[must_use]
    pub fn total_grown(&self) -> usize {
        self.rounds.iter().map(|r| r.grown).sum()
    }

    /// Rounds in which no cell was labeled.
    #[must_use]
    pub fn stalled_rounds(&self) -> usize {
        self.rounds.iter().filter(|r| r.grown == 0).count()
    }

    /// Render a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Growth Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Grid: {}x{} ({} cells, {} seeds)",
            self.width,
            self.height,
            self.width * self.height,
            self.seed_count,
        ));
        lines.push(format!(
            "Kernel diameter: {}  |  Skip: {}",
            self.config.kernel_diameter, self.config.skip,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            self.duration.as_secs_f64() * 1000.0,
        ));
        lines.push(format!(
            "Rounds: {} ({} stalled)  |  Grown: {}  |  Completed: {}",
            self.rounds.len(),
            self.stalled_rounds(),
            self.total_grown(),
            if self.completed { "yes" } else { "no" },
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:>8} {:>12} {:>10} {:>10}",
            "Round", "Frontier", "Eligible", "Grown"
        ));
        lines.push("-".repeat(44));
        for r in &self.rounds {
            lines.push(format!(
                "{:>8} {:>12} {:>10} {:>10}",
                r.round, r.frontier_after, r.eligible, r.grown
            ));
        }

        lines.join("\n")
    }
}

/// Grow `seeded` to completion, timing the run with `clock`.
///
/// # Errors
///
/// Propagates every error of [`RegionGrowth::new`] and
/// [`RegionGrowth::run`].
pub fn grow_with_diagnostics<R, C>(
    seeded: Seeded,
    config: &GrowthConfig,
    rng: &mut R,
    clock: &C,
) -> Result<(Grown, GrowthDiagnostics), RegionError>
where
    R: Rng + ?Sized,
    C: Clock,
{
    let width = seeded.grid.width();
    let height = seeded.grid.height();
    let seed_count = seeded.grid.dimensions().cell_count() - seeded.grid.unlabeled_count();

    let engine = RegionGrowth::new(config.clone())?;
    let start = clock.now();
    let grown = engine.run_with(seeded, rng, |_| ControlFlow::Continue(()))?;
    let duration = clock.elapsed(&start);

    let diagnostics = GrowthDiagnostics {
        width,
        height,
        seed_count,
        config: config.clone(),
        rounds: grown.rounds.clone(),
        completed: grown.is_complete(),
        duration,
    };
    Ok((grown, diagnostics))
}
