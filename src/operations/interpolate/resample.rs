use crate::math::polygon_2d::{area, centroid, is_usable_loop, perimeter, with_orientation};
use crate::math::{Point2, TOLERANCE};

/// Resamples a closed loop to `n` points spaced evenly by arc length.
///
/// The result runs counter-clockwise and starts where the ray from the
/// centroid toward +x meets the loop (approximately: at the vertex whose
/// bearing from the centroid is closest to zero), so two similar shapes
/// start at corresponding points.
///
/// Returns `None` for fewer than 3 requested points or an unusable or
/// zero-area loop.
#[must_use]
pub fn resample_loop(points: &[Point2], n: usize) -> Option<Vec<Point2>> {
    if n < 3 || !is_usable_loop(points) || area(points) <= TOLERANCE {
        return None;
    }
    let ccw = with_orientation(points, true);
    let c = centroid(&ccw)?;
    let start = ccw
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p.y - c.y).atan2(p.x - c.x).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)?;
    let mut ring = Vec::with_capacity(ccw.len());
    ring.extend_from_slice(&ccw[start..]);
    ring.extend_from_slice(&ccw[..start]);

    let total = perimeter(&ring);
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let step = total / n as f64;

    let m = ring.len();
    let mut out = Vec::with_capacity(n);
    let mut edge = 0;
    let mut walked = 0.0;
    let mut edge_len = (ring[1 % m] - ring[0]).norm();
    for k in 0..n {
        #[allow(clippy::cast_precision_loss)]
        let target = k as f64 * step;
        while walked + edge_len < target && edge < m - 1 {
            walked += edge_len;
            edge += 1;
            edge_len = (ring[(edge + 1) % m] - ring[edge]).norm();
        }
        let a = ring[edge];
        let b = ring[(edge + 1) % m];
        let t = if edge_len > 0.0 {
            ((target - walked) / edge_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(a + (b - a) * t);
    }
    Some(out)
}

/// Blends two loops: `t = 0` gives (a resampling of) `a`, `t = 1` gives `b`.
///
/// Both loops are resampled to `n` points; `b` is then cyclically shifted to
/// the alignment with the least summed squared distance to `a`, which
/// removes residual twist between the starting points.
#[must_use]
pub fn interpolate_loops(a: &[Point2], b: &[Point2], t: f64, n: usize) -> Option<Vec<Point2>> {
    let ra = resample_loop(a, n)?;
    let rb = resample_loop(b, n)?;
    let shift = (0..n)
        .map(|s| {
            let cost: f64 = (0..n).map(|i| (ra[i] - rb[(i + s) % n]).norm_squared()).sum();
            (s, cost)
        })
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .map_or(0, |(s, _)| s);
    Some(
        (0..n)
            .map(|i| {
                let p = ra[i];
                let q = rb[(i + shift) % n];
                p + (q - p) * t
            })
            .collect(),
    )
}
