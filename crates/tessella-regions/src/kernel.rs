//! Vicinity kernels: the border ring of an odd-sized square.

use crate::types::RegionError;

/// Ordered `(dx, dy)` offsets on the outer ring of a `d x d` square
/// centered on the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VicinityKernel {
    offsets: Vec<(isize, isize)>,
    diameter: usize,
}

impl VicinityKernel {
    /// Build the ring for diameter `d`.
    ///
    /// Every returned offset has Chebyshev norm `d / 2`; interior offsets
    /// are excluded. Offsets are ordered by `dx`, then `dy`. For `d == 1`
    /// the ring is the single offset `(0, 0)`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidKernelSize`] if `d` is even or zero.
    pub fn ring(d: usize) -> Result<Self, RegionError> {
        if d == 0 || d % 2 == 0 {
            return Err(RegionError::InvalidKernelSize(d));
        }
        #[allow(clippy::cast_possible_wrap)]
        let border = (d / 2) as isize;
        let offsets = (-border..=border)
            .flat_map(|dx| (-border..=border).map(move |dy| (dx, dy)))
            .filter(|&(dx, dy)| dx.abs() == border || dy.abs() == border)
            .collect();
        Ok(Self {
            offsets,
            diameter: d,
        })
    }

    /// The ring's diameter.
    #[must_use]
    pub const fn diameter(&self) -> usize {
        self.diameter
    }

    /// The offsets in their canonical order.
    #[must_use]
    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// Number of offsets on the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Always `false`: every valid ring holds at least one offset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
