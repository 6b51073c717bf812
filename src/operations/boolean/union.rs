use crate::config::{BooleanOp, EngineConfig};
use crate::error::Result;
use crate::math::Point2;

use super::engine::{boolean_execute, BooleanOutcome};

/// Computes the union of two loop sets on one slice.
pub struct Union<'a> {
    a: &'a [Vec<Point2>],
    b: &'a [Vec<Point2>],
    config: EngineConfig,
}

impl<'a> Union<'a> {
    /// Creates a new `Union` operation.
    #[must_use]
    pub fn new(a: &'a [Vec<Point2>], b: &'a [Vec<Point2>]) -> Self {
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

    /// Executes the union. Never fails: a clipping failure returns `a`
    /// unchanged with [`OutcomeStatus::Unchanged`].
    ///
    /// [`OutcomeStatus::Unchanged`]: super::OutcomeStatus::Unchanged
    ///
    /// # Errors
    ///
    /// Only non-recoverable conditions propagate.
    pub fn execute(&self) -> Result<BooleanOutcome> {
        boolean_execute(self.a, self.b, BooleanOp::Union, &self.config)
    }
}

/// Unions any number of loop sets, folding left to right.
///
/// # Errors
///
/// Only non-recoverable conditions propagate.
pub fn union_all(sets: &[Vec<Vec<Point2>>], config: &EngineConfig) -> Result<Vec<Vec<Point2>>> {
    let mut acc: Vec<Vec<Point2>> = Vec::new();
    for set in sets {
        acc = boolean_execute(&acc, set, BooleanOp::Union, config)?.loops;
    }
    Ok(acc)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area;
    use crate::test_support::square;

    #[test]
    fn union_many_squares_in_a_row() {
        let sets: Vec<Vec<Vec<Point2>>> = (0..4)
            .map(|i| vec![square(f64::from(i) * 8.0, 0.0, 10.0)])
            .collect();
        let loops = union_all(&sets, &EngineConfig::default()).unwrap();
        assert_eq!(loops.len(), 1);
        // 4 squares of 100 with 3 overlaps of 20.
        assert!((signed_area(&loops[0]) - 340.0).abs() < 1e-6);
    }

    #[test]
    fn scenario_simple_union() {
        let a = [square(0.0, 0.0, 10.0)];
        let b = [square(5.0, 5.0, 10.0)];
        let out = Union::new(&a, &b).execute().unwrap();
        assert_eq!(out.loops.len(), 1);
        assert!((out.area() - 175.0).abs() < 1e-6);
    }
}
