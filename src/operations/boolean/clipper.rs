//! Fixed-precision bridge to the `i_overlay` integer clipper.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay::{Overlay, ShapeType};
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::i_float::int::point::IntPoint;
use i_overlay::i_shape::int::shape::{IntContour, IntShapes};

use crate::error::{GeometryError, Result};
use crate::math::Point2;

/// Largest integer coordinate handed to the clipper. Products of two
/// coordinates must stay inside `i64`.
const INT_LIMIT: f64 = 1_073_741_824.0;

/// Scaled-integer coordinate space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedPrecision {
    scale: f64,
}

impl FixedPrecision {
    pub(crate) fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// Largest representable |coordinate| in mm.
    pub(crate) fn limit_mm(self) -> f64 {
        INT_LIMIT / self.scale
    }

    /// Half the quantisation step, in mm.
    pub(crate) fn resolution_mm(self) -> f64 {
        0.5 / self.scale
    }

    #[allow(clippy::cast_possible_truncation)]
    fn quantise(self, v: f64) -> Result<i32> {
        if !v.is_finite() {
            return Err(GeometryError::NonFinite.into());
        }
        let scaled = (v * self.scale).round();
        if scaled.abs() > INT_LIMIT {
            return Err(GeometryError::CoordinateOutOfRange {
                value: v,
                limit: self.limit_mm(),
            }
            .into());
        }
        Ok(scaled as i32)
    }

    /// Converts loops to integer contours. Repeated vertices collapse and
    /// loops left with fewer than 3 vertices are dropped.
    pub(crate) fn to_int(self, loops: &[Vec<Point2>]) -> Result<Vec<IntContour>> {
        let mut out = Vec::with_capacity(loops.len());
        for l in loops {
            let mut contour: IntContour = Vec::with_capacity(l.len());
            for p in l {
                let ip = IntPoint::new(self.quantise(p.x)?, self.quantise(p.y)?);
                if contour.last() != Some(&ip) {
                    contour.push(ip);
                }
            }
            while contour.len() > 1 && contour.first() == contour.last() {
                contour.pop();
            }
            if contour.len() >= 3 {
                out.push(contour);
            }
        }
        Ok(out)
    }

    /// Flattens clipper shapes (outer boundary first, then holes) into one
    /// loop list. Outer boundaries come back counter-clockwise, holes
    /// clockwise.
    pub(crate) fn to_world(self, shapes: IntShapes) -> Vec<Vec<Point2>> {
        let inv = 1.0 / self.scale;
        shapes
            .into_iter()
            .flatten()
            .filter(|c| c.len() >= 3)
            .map(|c| {
                c.into_iter()
                    .map(|p| Point2::new(f64::from(p.x) * inv, f64::from(p.y) * inv))
                    .collect()
            })
            .collect()
    }
}

/// Runs one overlay of `subject` against `clip` under the non-zero fill
/// rule.
pub(crate) fn overlay(
    subject: &[Vec<Point2>],
    clip: &[Vec<Point2>],
    rule: OverlayRule,
    precision: FixedPrecision,
) -> Result<Vec<Vec<Point2>>> {
    let subj = precision.to_int(subject)?;
    let clip = precision.to_int(clip)?;
    let capacity = subj.iter().chain(&clip).map(Vec::len).sum();

    let mut ov = Overlay::new(capacity);
    ov.add_contours(&subj, ShapeType::Subject);
    ov.add_contours(&clip, ShapeType::Clip);
    let shapes = ov.overlay(rule, FillRule::NonZero);
    Ok(precision.to_world(shapes))
}

/// Resolves self-overlaps of one loop set into disjoint loops.
pub(crate) fn self_union(
    loops: &[Vec<Point2>],
    precision: FixedPrecision,
) -> Result<Vec<Vec<Point2>>> {
    overlay(loops, &[], OverlayRule::Subject, precision)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RtGeomError;
    use crate::math::polygon_2d::signed_area;
    use crate::test_support::square;

    #[test]
    fn quantises_and_restores() {
        let fp = FixedPrecision::new(1e4);
        let loops = fp.to_int(&[square(0.0, 0.0, 10.0)]).unwrap();
        assert_eq!(loops[0][1], IntPoint::new(100_000, 0));
        let back = fp.to_world(vec![loops]);
        assert!((signed_area(&back[0]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn collapses_sub_resolution_loops() {
        let fp = FixedPrecision::new(1e4);
        let tiny = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1e-6, 0.0),
            Point2::new(0.0, 1e-6),
        ];
        assert!(fp.to_int(&[tiny]).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_is_reported() {
        let fp = FixedPrecision::new(1e4);
        let far = square(1e6, 0.0, 10.0);
        assert!(matches!(
            fp.to_int(&[far]),
            Err(RtGeomError::Geometry(GeometryError::CoordinateOutOfRange { .. }))
        ));
    }

    #[test]
    fn self_union_merges_overlapping_siblings() {
        let fp = FixedPrecision::new(1e4);
        let merged = self_union(&[square(0.0, 0.0, 10.0), square(5.0, 5.0, 10.0)], fp).unwrap();
        assert_eq!(merged.len(), 1);
        assert!((signed_area(&merged[0]) - 175.0).abs() < 1e-6);
    }
}
