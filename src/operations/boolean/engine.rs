use tracing::{debug, warn};

use crate::config::{BooleanOp, EngineConfig};
use crate::error::{OperationError, Result};
use crate::math::intersect_2d::loops_overlap;
use crate::math::polygon_2d::{area, bounding_box, normalize_orientation, perimeter, signed_area};
use crate::math::Point2;

use super::clipper::{overlay, self_union, FixedPrecision};

/// How a boolean result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Computed by the clipper.
    Exact,
    /// Operands do not overlap; the result was assembled without clipping.
    Disjoint,
    /// Clipping failed; the subject is returned unchanged.
    Unchanged,
}

/// Loops produced by a slice boolean. Outer boundaries are
/// counter-clockwise and holes clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanOutcome {
    pub loops: Vec<Vec<Point2>>,
    pub status: OutcomeStatus,
}

impl BooleanOutcome {
    /// Net area: outer boundaries minus holes.
    #[must_use]
    pub fn area(&self) -> f64 {
        net_area(&self.loops)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

fn net_area(loops: &[Vec<Point2>]) -> f64 {
    loops.iter().map(|l| signed_area(l)).sum()
}

/// Combines two loop sets on one slice.
///
/// Malformed loops are dropped up front. Operands that do not overlap are
/// combined without the clipper. A clipper failure or a result whose area is
/// impossible for the operation leaves the subject unchanged for union and
/// subtract.
///
/// # Errors
///
/// Returns `OperationError::Failed` if an intersection cannot be computed.
pub fn boolean_execute(
    a: &[Vec<Point2>],
    b: &[Vec<Point2>],
    op: BooleanOp,
    config: &EngineConfig,
) -> Result<BooleanOutcome> {
    let precision = FixedPrecision::new(config.boolean_scale);
    let a = merge_operand(normalize_orientation(a), precision)?;
    let b = merge_operand(normalize_orientation(b), precision)?;
    debug!(%op, subject_loops = a.len(), clip_loops = b.len(), "slice boolean");

    if are_disjoint(&a, &b) {
        let loops = match op {
            BooleanOp::Union => a.into_iter().chain(b).collect(),
            BooleanOp::Subtract => a,
            BooleanOp::Intersect => Vec::new(),
        };
        return Ok(BooleanOutcome {
            loops,
            status: OutcomeStatus::Disjoint,
        });
    }

    match clip_checked(&a, &b, op, precision, config.min_loop_area_mm2) {
        Ok(loops) => Ok(BooleanOutcome {
            loops,
            status: OutcomeStatus::Exact,
        }),
        Err(err) if !err.is_recoverable() => Err(err),
        Err(err) => match op {
            BooleanOp::Union | BooleanOp::Subtract => {
                warn!(%op, error = %err, "clipping failed, keeping subject unchanged");
                Ok(BooleanOutcome {
                    loops: a,
                    status: OutcomeStatus::Unchanged,
                })
            }
            BooleanOp::Intersect => Err(OperationError::Failed(format!(
                "intersection could not be computed: {err}"
            ))
            .into()),
        },
    }
}

/// Merges an operand's own loops into disjoint loops. A loop set the
/// clipper cannot take is passed on as drawn.
fn merge_operand(loops: Vec<Vec<Point2>>, precision: FixedPrecision) -> Result<Vec<Vec<Point2>>> {
    if loops.len() < 2 {
        return Ok(loops);
    }
    match self_union(&loops, precision) {
        Ok(merged) => Ok(merged),
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "could not merge operand loops");
            Ok(loops)
        }
        Err(err) => Err(err),
    }
}

/// Pre-check: bounding boxes apart, or no pair of loops touching.
fn are_disjoint(a: &[Vec<Point2>], b: &[Vec<Point2>]) -> bool {
    let all_a: Vec<Point2> = a.iter().flatten().copied().collect();
    let all_b: Vec<Point2> = b.iter().flatten().copied().collect();
    let (Some(ba), Some(bb)) = (bounding_box(&all_a), bounding_box(&all_b)) else {
        return true;
    };
    if !ba.overlaps(&bb, 0.0) {
        return true;
    }
    !a.iter().any(|la| b.iter().any(|lb| loops_overlap(la, lb)))
}

#[allow(clippy::cast_precision_loss)]
fn clip_checked(
    a: &[Vec<Point2>],
    b: &[Vec<Point2>],
    op: BooleanOp,
    precision: FixedPrecision,
    min_area: f64,
) -> Result<Vec<Vec<Point2>>> {
    let mut loops = overlay(a, b, op.overlay_rule(), precision)?;
    loops.retain(|l| area(l) >= min_area);

    let area_a = net_area(&self_union(a, precision)?);
    let area_b = net_area(&self_union(b, precision)?);
    let result = net_area(&loops);
    let slack = 1e-6 * area_a.max(area_b)
        + precision.resolution_mm() * a.iter().chain(b).map(|l| perimeter(l)).sum::<f64>()
        + min_area * (loops.len() + a.len() + b.len()) as f64;

    let plausible = match op {
        BooleanOp::Union => result + slack >= area_a.max(area_b),
        BooleanOp::Subtract => result <= area_a + slack,
        BooleanOp::Intersect => result <= area_a.min(area_b) + slack,
    };
    if !plausible || result < -slack {
        return Err(OperationError::Failed(format!(
            "{op} produced an implausible area {result:.3} (operands {area_a:.3}, {area_b:.3})"
        ))
        .into());
    }
    Ok(loops)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{circle, same_loop_set, square};

    fn run(a: &[Vec<Point2>], b: &[Vec<Point2>], op: BooleanOp) -> BooleanOutcome {
        boolean_execute(a, b, op, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn union_of_overlapping_squares() {
        let out = run(&[square(0.0, 0.0, 10.0)], &[square(5.0, 5.0, 10.0)], BooleanOp::Union);
        assert_eq!(out.status, OutcomeStatus::Exact);
        assert_eq!(out.loops.len(), 1);
        assert!((out.area() - 175.0).abs() < 1e-6, "area={}", out.area());
    }

    #[test]
    fn subtract_disjoint_returns_subject() {
        let a = square(0.0, 0.0, 10.0);
        let out = run(&[a.clone()], &[square(100.0, 100.0, 10.0)], BooleanOp::Subtract);
        assert_eq!(out.status, OutcomeStatus::Disjoint);
        assert_eq!(out.loops, vec![a]);
        assert!((out.area() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn disjoint_union_and_intersect() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(100.0, 100.0, 10.0);
        let u = run(&[a.clone()], &[b.clone()], BooleanOp::Union);
        assert_eq!(u.loops.len(), 2);
        assert!(run(&[a], &[b], BooleanOp::Intersect).is_empty());
    }

    #[test]
    fn overlapping_strokes_merge_before_disjoint_union() {
        let strokes = vec![square(0.0, 0.0, 10.0), square(5.0, 5.0, 10.0)];
        let far = square(100.0, 100.0, 10.0);
        let out = run(&strokes, &[far], BooleanOp::Union);
        assert_eq!(out.status, OutcomeStatus::Disjoint);
        assert_eq!(out.loops.len(), 2);
        assert!((out.area() - 275.0).abs() < 1e-6, "area={}", out.area());

        let out = run(&strokes, &[], BooleanOp::Subtract);
        assert_eq!(out.loops.len(), 1);
        assert!((out.area() - 175.0).abs() < 1e-6, "area={}", out.area());
    }

    #[test]
    fn union_is_idempotent() {
        let a = circle(3.0, -2.0, 8.0, 48);
        let out = run(&[a.clone()], &[a.clone()], BooleanOp::Union);
        assert!(same_loop_set(&out.loops, &[a], 1e-3));
    }

    #[test]
    fn union_and_intersect_commute() {
        let a = vec![square(0.0, 0.0, 10.0)];
        let b = vec![circle(10.0, 5.0, 6.0, 40)];
        for op in [BooleanOp::Union, BooleanOp::Intersect] {
            let ab = run(&a, &b, op);
            let ba = run(&b, &a, op);
            assert!(same_loop_set(&ab.loops, &ba.loops, 1e-3), "{op} not commutative");
        }
    }

    #[test]
    fn subtract_self_is_empty() {
        let a = vec![circle(0.0, 0.0, 5.0, 32)];
        let out = run(&a, &a, BooleanOp::Subtract);
        assert_eq!(out.status, OutcomeStatus::Exact);
        assert!(out.is_empty());
    }

    #[test]
    fn subtract_contained_square_leaves_hole() {
        let out = run(&[square(0.0, 0.0, 10.0)], &[square(3.0, 3.0, 2.0)], BooleanOp::Subtract);
        assert_eq!(out.loops.len(), 2);
        assert!((out.area() - 96.0).abs() < 1e-6);
        assert_eq!(out.loops.iter().filter(|l| signed_area(l) < 0.0).count(), 1);
    }

    #[test]
    fn malformed_loops_are_dropped() {
        let out = run(
            &[square(0.0, 0.0, 10.0), vec![Point2::new(0.0, 0.0)]],
            &[vec![Point2::new(f64::NAN, 0.0); 3]],
            BooleanOp::Union,
        );
        assert_eq!(out.loops.len(), 1);
    }

    #[test]
    fn out_of_range_union_keeps_subject() {
        let a = square(0.0, 0.0, 10.0);
        let huge = vec![
            Point2::new(-1e6, -1e6),
            Point2::new(1e6, -1e6),
            Point2::new(1e6, 1e6),
            Point2::new(-1e6, 1e6),
        ];
        let out = run(&[a.clone()], &[huge.clone()], BooleanOp::Union);
        assert_eq!(out.status, OutcomeStatus::Unchanged);
        assert_eq!(out.loops, vec![a.clone()]);
        assert!(boolean_execute(&[a], &[huge], BooleanOp::Intersect, &EngineConfig::default())
            .is_err());
    }

    #[test]
    fn tiny_output_loops_are_discarded() {
        // Overlap sliver of 0.0005 x 10 mm is below the noise floor.
        let out = run(
            &[square(0.0, 0.0, 10.0)],
            &[vec![
                Point2::new(9.9995, 0.0),
                Point2::new(20.0, 0.0),
                Point2::new(20.0, 10.0),
                Point2::new(9.9995, 10.0),
            ]],
            BooleanOp::Intersect,
        );
        assert!(out.is_empty());
    }
}
