use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{OperationError, Result};
use crate::geometry::Contour;
use crate::math::polygon_2d::{bounding_box, centroid, normalize_orientation, signed_area, with_orientation};
use crate::math::slice::{cluster_positions, same_slice};
use crate::math::{Point2, SLICE_TOL_MM};

use super::resample::interpolate_loops;

/// Loops whose centroids are further apart than this many times the larger
/// loop's bounding-box diagonal are not paired.
const MAX_PAIR_DISTANCE_FACTOR: f64 = 1.0;

/// Contours synthesised for the requested slices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterpolationOutcome {
    /// New contours only; existing slices are never touched.
    pub contours: Vec<Contour>,
    /// Targets that were outside the contoured range or failed to blend.
    pub skipped: Vec<f64>,
}

/// Synthesises contours on empty slices between two contoured ones.
///
/// Loops on the bracketing slices are paired by centroid proximity (outer
/// loops with outer loops, holes with holes). Loops left without a partner
/// are copied to the target slice unchanged, as are loops too far from any
/// candidate. Malformed loops and loops below the minimum area count as
/// absent. A slice whose pairs cannot be blended is skipped rather than
/// failing the whole batch.
pub struct SliceInterpolator<'a> {
    contours: &'a [Contour],
    point_count: u32,
    tolerance: f64,
    min_area: f64,
}

impl<'a> SliceInterpolator<'a> {
    #[must_use]
    pub fn new(contours: &'a [Contour]) -> Self {
        Self {
            contours,
            point_count: 128,
            tolerance: SLICE_TOL_MM,
            min_area: EngineConfig::default().min_loop_area_mm2,
        }
    }

    #[must_use]
    pub fn with_point_count(mut self, n: u32) -> Self {
        self.point_count = n;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Loops smaller than this, in mm2, are ignored.
    #[must_use]
    pub fn with_min_area(mut self, mm2: f64) -> Self {
        self.min_area = mm2;
        self
    }

    fn is_blendable(&self, contour: &Contour) -> bool {
        contour.is_valid() && contour.area() >= self.min_area
    }

    fn slice_positions(&self) -> Vec<f64> {
        cluster_positions(
            self.contours
                .iter()
                .filter(|c| self.is_blendable(c))
                .map(|c| c.z),
            self.tolerance,
        )
    }

    /// Interpolates every target z that has no contour and lies strictly
    /// between two contoured slices.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if the point count is below 3.
    pub fn execute(&self, targets: &[f64]) -> Result<InterpolationOutcome> {
        if self.point_count < 3 {
            return Err(OperationError::InvalidInput(format!(
                "interpolation needs at least 3 points, got {}",
                self.point_count
            ))
            .into());
        }
        let slices = self.slice_positions();
        debug!(targets = targets.len(), slices = slices.len(), "slice interpolation");

        let mut outcome = InterpolationOutcome::default();
        for &z in targets {
            if !z.is_finite() {
                outcome.skipped.push(z);
                continue;
            }
            if slices.iter().any(|&s| same_slice(s, z, self.tolerance)) {
                continue;
            }
            let below = slices.iter().rev().find(|&&s| s < z);
            let above = slices.iter().find(|&&s| s > z);
            let (Some(&za), Some(&zb)) = (below, above) else {
                debug!(z, "target outside contoured range");
                outcome.skipped.push(z);
                continue;
            };
            match self.blend_slice(za, zb, z) {
                Some(loops) => outcome.contours.extend(
                    loops
                        .into_iter()
                        .map(|points| Contour::from_points(points, z))
                        .filter(Contour::is_valid),
                ),
                None => {
                    warn!(z, za, zb, "interpolation failed, slice skipped");
                    outcome.skipped.push(z);
                }
            }
        }
        Ok(outcome)
    }

    /// Interpolates every empty position `first + k * spacing` between the
    /// first and last contoured slices.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a non-positive spacing or a
    /// point count below 3.
    pub fn fill_gaps(&self, spacing: f64) -> Result<InterpolationOutcome> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(OperationError::InvalidInput(format!(
                "gap spacing must be positive, got {spacing}"
            ))
            .into());
        }
        let slices = self.slice_positions();
        let (Some(&first), Some(&last)) = (slices.first(), slices.last()) else {
            return Ok(InterpolationOutcome::default());
        };
        let mut targets = Vec::new();
        let mut k = 1_u32;
        loop {
            let z = first + f64::from(k) * spacing;
            if z >= last - self.tolerance {
                break;
            }
            targets.push(z);
            k += 1;
        }
        self.execute(&targets)
    }

    fn loops_at(&self, z: f64) -> Vec<Vec<Point2>> {
        let loops: Vec<Vec<Point2>> = self
            .contours
            .iter()
            .filter(|c| self.is_blendable(c) && same_slice(c.z, z, self.tolerance))
            .map(|c| c.points.clone())
            .collect();
        normalize_orientation(&loops)
    }

    fn blend_slice(&self, za: f64, zb: f64, z: f64) -> Option<Vec<Vec<Point2>>> {
        let t = (z - za) / (zb - za);
        let a = self.loops_at(za);
        let b = self.loops_at(zb);
        let n = self.point_count as usize;

        let mut out = Vec::new();
        for hole in [false, true] {
            let side_a: Vec<&Vec<Point2>> = a.iter().filter(|l| (signed_area(l) < 0.0) == hole).collect();
            let side_b: Vec<&Vec<Point2>> = b.iter().filter(|l| (signed_area(l) < 0.0) == hole).collect();
            let (pairs, rest_a, rest_b) = pair_by_centroid(&side_a, &side_b)?;
            for (la, lb) in pairs {
                let blended = interpolate_loops(la, lb, t, n)?;
                out.push(with_orientation(&blended, !hole));
            }
            out.extend(rest_a.into_iter().chain(rest_b).cloned());
        }
        Some(out)
    }
}

type Pairing<'l> = (
    Vec<(&'l Vec<Point2>, &'l Vec<Point2>)>,
    Vec<&'l Vec<Point2>>,
    Vec<&'l Vec<Point2>>,
);

/// Greedy nearest-centroid matching; returns the pairs and the leftovers of
/// each side.
fn pair_by_centroid<'l>(a: &[&'l Vec<Point2>], b: &[&'l Vec<Point2>]) -> Option<Pairing<'l>> {
    let ca: Vec<Point2> = a.iter().map(|l| centroid(l)).collect::<Option<_>>()?;
    let cb: Vec<Point2> = b.iter().map(|l| centroid(l)).collect::<Option<_>>()?;
    let sa: Vec<f64> = a.iter().map(|l| diagonal(l)).collect();
    let sb: Vec<f64> = b.iter().map(|l| diagonal(l)).collect();
    let mut candidates: Vec<(f64, usize, usize)> = Vec::with_capacity(a.len() * b.len());
    for (i, p) in ca.iter().enumerate() {
        for (j, q) in cb.iter().enumerate() {
            let d = (p - q).norm();
            if d <= MAX_PAIR_DISTANCE_FACTOR * sa[i].max(sb[j]) {
                candidates.push((d, i, j));
            }
        }
    }
    candidates.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut used_a = vec![false; a.len()];
    let mut used_b = vec![false; b.len()];
    let mut pairs = Vec::new();
    for (_, i, j) in candidates {
        if used_a[i] || used_b[j] {
            continue;
        }
        used_a[i] = true;
        used_b[j] = true;
        pairs.push((a[i], b[j]));
    }
    let rest_a = a.iter().zip(&used_a).filter(|&(_, &u)| !u).map(|(l, _)| *l).collect();
    let rest_b = b.iter().zip(&used_b).filter(|&(_, &u)| !u).map(|(l, _)| *l).collect();
    Some((pairs, rest_a, rest_b))
}

fn diagonal(points: &[Point2]) -> f64 {
    bounding_box(points).map_or(0.0, |b| b.width().hypot(b.height()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{circle, init_tracing};
    use std::f64::consts::PI;

    fn disc(cx: f64, r: f64, z: f64) -> Contour {
        Contour::from_points(circle(cx, 0.0, r, 128), z)
    }

    #[test]
    fn midway_disc_has_blended_radius() {
        let contours = vec![disc(0.0, 10.0, 0.0), disc(0.0, 20.0, 4.0)];
        let out = SliceInterpolator::new(&contours).execute(&[2.0]).unwrap();
        assert_eq!(out.contours.len(), 1);
        assert!((out.contours[0].z - 2.0).abs() < 1e-12);
        let a = out.contours[0].area();
        assert!((a - PI * 225.0).abs() / (PI * 225.0) < 0.01, "area={a}");
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn existing_and_out_of_range_targets() {
        init_tracing();
        let contours = vec![disc(0.0, 10.0, 0.0), disc(0.0, 10.0, 4.0)];
        let out = SliceInterpolator::new(&contours)
            .execute(&[0.1, 10.0, -3.0])
            .unwrap();
        assert!(out.contours.is_empty());
        assert_eq!(out.skipped, vec![10.0, -3.0]);
    }

    #[test]
    fn target_at_bracket_matches_bracket() {
        let contours = vec![disc(0.0, 10.0, 0.0), disc(0.0, 20.0, 4.0)];
        // Just inside the tolerance of the lower slice: nothing to do.
        let out = SliceInterpolator::new(&contours).execute(&[0.4]).unwrap();
        assert!(out.contours.is_empty());
        // Just outside it: close to the lower loop.
        let out = SliceInterpolator::new(&contours).execute(&[0.6]).unwrap();
        let a = out.contours[0].area();
        let r = 10.0 + 10.0 * 0.6 / 4.0;
        assert!((a - PI * r * r).abs() / (PI * r * r) < 0.01);
    }

    #[test]
    fn unmatched_loop_is_carried_through() {
        let contours = vec![
            disc(0.0, 5.0, 0.0),
            disc(50.0, 5.0, 0.0),
            disc(50.0, 7.0, 4.0),
        ];
        let out = SliceInterpolator::new(&contours).execute(&[2.0]).unwrap();
        assert_eq!(out.contours.len(), 2);
        let near: Vec<&Contour> = out
            .contours
            .iter()
            .filter(|c| c.centroid().unwrap().x < 25.0)
            .collect();
        assert_eq!(near.len(), 1);
        assert!((near[0].area() - contours[0].area()).abs() < 1e-9);
        let far = out.contours.iter().find(|c| c.centroid().unwrap().x > 25.0).unwrap();
        assert!((far.area() - PI * 36.0).abs() / (PI * 36.0) < 0.01);
    }

    #[test]
    fn distant_loops_are_not_blended() {
        let contours = vec![disc(0.0, 5.0, 0.0), disc(100.0, 5.0, 4.0)];
        let out = SliceInterpolator::new(&contours).execute(&[2.0]).unwrap();
        assert_eq!(out.contours.len(), 2);
        for c in &out.contours {
            assert!((c.area() - contours[0].area()).abs() < 1e-9);
            let x = c.centroid().unwrap().x;
            assert!(x.abs() < 1e-6 || (x - 100.0).abs() < 1e-6, "x={x}");
        }
    }

    #[test]
    fn degenerate_bracket_counts_as_empty() {
        let line = vec![
            Point2::new(-10.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
        ];
        let contours = vec![Contour::from_points(line, 0.0), disc(0.0, 10.0, 4.0)];
        let out = SliceInterpolator::new(&contours).execute(&[2.0]).unwrap();
        assert!(out.contours.is_empty());
        assert_eq!(out.skipped, vec![2.0]);
    }

    #[test]
    fn holes_pair_with_holes() {
        let ring = |z: f64, inner: f64| {
            vec![
                Contour::from_points(circle(0.0, 0.0, 20.0, 128), z),
                Contour::from_points(circle(0.0, 0.0, inner, 128).into_iter().rev().collect(), z),
            ]
        };
        let mut contours = ring(0.0, 5.0);
        contours.extend(ring(4.0, 9.0));
        let out = SliceInterpolator::new(&contours).execute(&[2.0]).unwrap();
        assert_eq!(out.contours.len(), 2);
        let net: f64 = out.contours.iter().map(Contour::signed_area).sum();
        let expected = PI * (400.0 - 49.0);
        assert!((net - expected).abs() / expected < 0.01, "net={net}");
    }

    #[test]
    fn fill_gaps_on_regular_grid() {
        let contours = vec![disc(0.0, 10.0, 0.0), disc(0.0, 10.0, 6.0)];
        let out = SliceInterpolator::new(&contours).fill_gaps(2.0).unwrap();
        let zs: Vec<f64> = out.contours.iter().map(|c| c.z).collect();
        assert_eq!(zs, vec![2.0, 4.0]);
        assert!(SliceInterpolator::new(&contours).fill_gaps(0.0).is_err());
    }

    #[test]
    fn too_few_points_is_invalid() {
        let contours = vec![disc(0.0, 10.0, 0.0), disc(0.0, 10.0, 4.0)];
        assert!(SliceInterpolator::new(&contours)
            .with_point_count(2)
            .execute(&[2.0])
            .is_err());
    }
}
