use crate::config::{BooleanOp, EngineConfig};
use crate::error::Result;
use crate::math::Point2;

use super::engine::{boolean_execute, BooleanOutcome};

/// Computes the intersection of two loop sets on one slice.
pub struct Intersect<'a> {
    a: &'a [Vec<Point2>],
    b: &'a [Vec<Point2>],
    config: EngineConfig,
}

impl<'a> Intersect<'a> {
    /// Creates a new `Intersect` operation.
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

    /// Executes the intersection.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipper fails; unlike union and subtract there
    /// is no operand that is a safe stand-in for the result.
    pub fn execute(&self) -> Result<BooleanOutcome> {
        boolean_execute(self.a, self.b, BooleanOp::Intersect, &self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::square;

    #[test]
    fn overlapping_squares_intersect_in_corner() {
        let a = [square(0.0, 0.0, 10.0)];
        let b = [square(5.0, 5.0, 10.0)];
        let out = Intersect::new(&a, &b).execute().unwrap();
        assert_eq!(out.loops.len(), 1);
        assert!((out.area() - 25.0).abs() < 1e-6);
    }

    #[test]
    fn multi_loop_operands_are_unioned_first() {
        // Two overlapping subject loops must not double count the overlap.
        let a = [square(0.0, 0.0, 10.0), square(5.0, 0.0, 10.0)];
        let b = [square(0.0, 0.0, 20.0)];
        let out = Intersect::new(&a, &b).execute().unwrap();
        assert!((out.area() - 150.0).abs() < 1e-6);
    }
}
