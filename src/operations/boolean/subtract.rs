use crate::config::{BooleanOp, EngineConfig};
use crate::error::Result;
use crate::math::Point2;

use super::engine::{boolean_execute, BooleanOutcome};

/// Computes `a` minus `b` on one slice.
pub struct Subtract<'a> {
    a: &'a [Vec<Point2>],
    b: &'a [Vec<Point2>],
    config: EngineConfig,
}

impl<'a> Subtract<'a> {
    /// Creates a new `Subtract` operation (a minus b).
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

    /// Executes the subtraction, returning `a` unchanged if clipping fails.
    ///
    /// # Errors
    ///
    /// Only non-recoverable conditions propagate.
    pub fn execute(&self) -> Result<BooleanOutcome> {
        boolean_execute(self.a, self.b, BooleanOp::Subtract, &self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::square;

    #[test]
    fn scenario_non_overlapping_subtract() {
        let a = [square(0.0, 0.0, 10.0)];
        let b = [square(100.0, 100.0, 10.0)];
        let out = Subtract::new(&a, &b).execute().unwrap();
        assert_eq!(out.loops, a.to_vec());
        assert!((out.area() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn subtract_splits_subject() {
        let a = [square(0.0, 0.0, 30.0)];
        let b = [vec![
            Point2::new(10.0, -5.0),
            Point2::new(20.0, -5.0),
            Point2::new(20.0, 35.0),
            Point2::new(10.0, 35.0),
        ]];
        let out = Subtract::new(&a, &b).execute().unwrap();
        assert_eq!(out.loops.len(), 2);
        assert!((out.area() - 600.0).abs() < 1e-6);
    }
}
