use std::f64::consts::TAU;

use tracing::debug;

use crate::config::{EngineConfig, PerSideMargins};
use crate::error::Result;
use crate::fallback::Deadline;
use crate::geometry::Contour;
use crate::math::polygon_2d::{area, convex_hull, normalize_orientation};
use crate::math::slice::{cluster_positions, same_slice};
use crate::math::{Point2, TOLERANCE};
use crate::operations::boolean::{overlay, self_union, FixedPrecision};

use i_overlay::core::overlay_rule::OverlayRule;

/// In-plane extents of a structuring polygon, one per half-axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanarReach {
    /// Toward +x (patient left).
    pub pos_x: f64,
    /// Toward -x (patient right).
    pub neg_x: f64,
    /// Toward +y (posterior).
    pub pos_y: f64,
    /// Toward -y (anterior).
    pub neg_y: f64,
}

impl PlanarReach {
    fn is_zero(&self) -> bool {
        self.pos_x <= TOLERANCE
            && self.neg_x <= TOLERANCE
            && self.pos_y <= TOLERANCE
            && self.neg_y <= TOLERANCE
    }

    fn reflected(self) -> Self {
        Self {
            pos_x: self.neg_x,
            neg_x: self.pos_x,
            pos_y: self.neg_y,
            neg_y: self.pos_y,
        }
    }
}

/// Convex structuring polygon made of four elliptical quadrants, centred at
/// the origin, counter-clockwise.
#[must_use]
pub fn structuring_polygon(reach: PlanarReach, segments: u32) -> Vec<Point2> {
    let n = segments.max(4);
    let pts: Vec<Point2> = (0..n)
        .map(|k| {
            let theta = TAU * f64::from(k) / f64::from(n);
            let (s, c) = theta.sin_cos();
            let rx = if c >= 0.0 { reach.pos_x } else { reach.neg_x };
            let ry = if s >= 0.0 { reach.pos_y } else { reach.neg_y };
            Point2::new(rx * c, ry * s)
        })
        .collect();
    convex_hull(&pts)
}

/// Swept hulls of `kernel` along every edge of `loops`.
fn edge_sweeps(loops: &[Vec<Point2>], kernel: &[Point2]) -> Vec<Vec<Point2>> {
    let mut sweeps = Vec::new();
    let mut cloud = Vec::with_capacity(kernel.len() * 2);
    for l in loops {
        let n = l.len();
        for i in 0..n {
            let (a, b) = (l[i], l[(i + 1) % n]);
            cloud.clear();
            cloud.extend(kernel.iter().map(|k| Point2::new(a.x + k.x, a.y + k.y)));
            cloud.extend(kernel.iter().map(|k| Point2::new(b.x + k.x, b.y + k.y)));
            let hull = convex_hull(&cloud);
            if hull.len() >= 3 {
                sweeps.push(hull);
            }
        }
    }
    sweeps
}

/// Minkowski sum of a slice's loops with a convex structuring polygon.
///
/// # Errors
///
/// Propagates clipper coordinate-range failures.
pub fn dilate_loops(
    loops: &[Vec<Point2>],
    reach: PlanarReach,
    config: &EngineConfig,
) -> Result<Vec<Vec<Point2>>> {
    let loops = normalize_orientation(loops);
    let precision = FixedPrecision::new(config.boolean_scale);
    if reach.is_zero() {
        return self_union(&loops, precision);
    }
    let kernel = structuring_polygon(reach, config.buffer_segments);
    let sweeps = edge_sweeps(&loops, &kernel);
    let mut out = overlay(&loops, &sweeps, OverlayRule::Union, precision)?;
    out.retain(|l| area(l) >= config.min_loop_area_mm2);
    Ok(out)
}

/// Minkowski difference (erosion) of a slice's loops by a convex
/// structuring polygon.
///
/// # Errors
///
/// Propagates clipper coordinate-range failures.
pub fn erode_loops(
    loops: &[Vec<Point2>],
    reach: PlanarReach,
    config: &EngineConfig,
) -> Result<Vec<Vec<Point2>>> {
    let loops = normalize_orientation(loops);
    let precision = FixedPrecision::new(config.boolean_scale);
    if reach.is_zero() {
        return self_union(&loops, precision);
    }
    // x survives when x + K stays inside; remove the boundary swept by -K.
    let kernel = structuring_polygon(reach.reflected(), config.buffer_segments);
    let sweeps = edge_sweeps(&loops, &kernel);
    let mut out = overlay(&loops, &sweeps, OverlayRule::Difference, precision)?;
    out.retain(|l| area(l) >= config.min_loop_area_mm2);
    Ok(out)
}

/// Per-slice polygon buffering. Ignores through-plane margins: no slices
/// are added or removed except where a slice erodes away entirely.
#[derive(Debug)]
pub struct PolygonBuffer<'a> {
    contours: &'a [Contour],
    margins: PerSideMargins,
    config: EngineConfig,
    deadline: Deadline,
}

impl<'a> PolygonBuffer<'a> {
    #[must_use]
    pub fn new(contours: &'a [Contour], margins: PerSideMargins) -> Self {
        Self {
            contours,
            margins,
            config: EngineConfig::default(),
            deadline: Deadline::none(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Buffers every slice: the positive in-plane margins grow first, then
    /// the negative ones shrink.
    ///
    /// # Errors
    ///
    /// Returns a deadline error if the deadline passes, or a clipper error.
    pub fn execute(&self) -> Result<Vec<Contour>> {
        let m = &self.margins;
        let grow = PlanarReach {
            pos_x: m.left.max(0.0),
            neg_x: m.right.max(0.0),
            pos_y: m.post.max(0.0),
            neg_y: m.ant.max(0.0),
        };
        let shrink = PlanarReach {
            pos_x: (-m.left).max(0.0),
            neg_x: (-m.right).max(0.0),
            pos_y: (-m.post).max(0.0),
            neg_y: (-m.ant).max(0.0),
        };
        let tol = self.config.slice_tol_mm;
        let slices = cluster_positions(self.contours.iter().map(|c| c.z), tol);
        debug!(slices = slices.len(), ?grow, ?shrink, "polygon buffer");

        let mut out = Vec::new();
        for z in slices {
            self.deadline.check()?;
            let on_slice: Vec<&Contour> = self
                .contours
                .iter()
                .filter(|c| same_slice(c.z, z, tol))
                .collect();
            let out_z = on_slice.first().map_or(z, |c| c.z);
            let loops: Vec<Vec<Point2>> = on_slice.iter().map(|c| c.points.clone()).collect();

            let mut loops = dilate_loops(&loops, grow, &self.config)?;
            if !shrink.is_zero() {
                loops = erode_loops(&loops, shrink, &self.config)?;
            }
            out.extend(
                loops
                    .into_iter()
                    .map(|points| Contour::from_points(points, out_z))
                    .filter(Contour::is_valid),
            );
        }
        Ok(out)
    }
}
