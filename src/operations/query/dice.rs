use tracing::debug;

use crate::config::{BooleanOp, EngineConfig};
use crate::error::{OperationError, Result};
use crate::geometry::Contour;
use crate::math::slice::{cluster_positions, local_thickness, same_slice};
use crate::operations::boolean::boolean_execute;

use super::volume::slice_regions;

/// Dice similarity `2 |A n B| / (|A| + |B|)` between two contour stacks.
///
/// Volumes are measured on the merged slice list of both stacks, so the
/// same slice carries the same thickness in every term.
pub struct DiceCoefficient<'a> {
    a: &'a [Contour],
    b: &'a [Contour],
    config: EngineConfig,
}

impl<'a> DiceCoefficient<'a> {
    #[must_use]
    pub fn new(a: &'a [Contour], b: &'a [Contour]) -> Self {
        Self {
            a,
            b,
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if both stacks are empty, and
    /// propagates intersection failures.
    pub fn execute(&self) -> Result<f64> {
        let tol = self.config.slice_tol_mm;
        let thick = self.config.default_slice_thickness_mm;
        let regions_a = slice_regions(self.a, tol, thick);
        let regions_b = slice_regions(self.b, tol, thick);
        let slices = cluster_positions(
            regions_a.iter().chain(&regions_b).map(|r| r.z),
            tol,
        );

        let (mut vol_a, mut vol_b, mut vol_ab) = (0.0, 0.0, 0.0);
        for (k, &z) in slices.iter().enumerate() {
            let w = local_thickness(&slices, k, thick);
            let ra = regions_a.iter().find(|r| same_slice(r.z, z, tol));
            let rb = regions_b.iter().find(|r| same_slice(r.z, z, tol));
            if let Some(ra) = ra {
                vol_a += ra.area * w;
            }
            if let Some(rb) = rb {
                vol_b += rb.area * w;
            }
            if let (Some(ra), Some(rb)) = (ra, rb) {
                let inter = boolean_execute(&ra.loops, &rb.loops, BooleanOp::Intersect, &self.config)?;
                vol_ab += inter.area().max(0.0) * w;
            }
        }
        debug!(vol_a, vol_b, vol_ab, "dice volumes");
        let total = vol_a + vol_b;
        if total <= 0.0 {
            return Err(OperationError::InvalidInput("dice of two empty structures".to_owned()).into());
        }
        Ok(2.0 * vol_ab / total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::square;
    use approx::assert_relative_eq;

    fn slab(x0: f64, zs: &[f64]) -> Vec<Contour> {
        zs.iter()
            .map(|&z| Contour::from_points(square(x0, 0.0, 10.0), z))
            .collect()
    }

    #[test]
    fn identical_stacks_score_one() {
        let a = slab(0.0, &[0.0, 2.0, 4.0]);
        let d = DiceCoefficient::new(&a, &a).execute().unwrap();
        assert_relative_eq!(d, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn half_overlap() {
        let a = slab(0.0, &[0.0, 2.0, 4.0]);
        let b = slab(5.0, &[0.0, 2.0, 4.0]);
        let d = DiceCoefficient::new(&a, &b).execute().unwrap();
        assert_relative_eq!(d, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_scores_zero_and_empty_is_error() {
        let a = slab(0.0, &[0.0, 2.0]);
        let b = slab(50.0, &[0.0, 2.0]);
        assert!(DiceCoefficient::new(&a, &b).execute().unwrap().abs() < 1e-12);
        assert!(DiceCoefficient::new(&[], &[]).execute().is_err());
    }
}
