use crate::math::distance_2d::point_to_segment_dist;
use crate::math::Point2;

/// Simplifies a closed loop with Ramer-Douglas-Peucker at `tolerance` mm.
///
/// The loop is split at vertex 0 and the vertex farthest from it, and each
/// half is simplified as an open polyline, so both anchors always survive.
/// Returns the input unchanged when it has fewer than 4 points or the
/// tolerance is not positive.
#[must_use]
pub fn simplify_loop(points: &[Point2], tolerance: f64) -> Vec<Point2> {
    let n = points.len();
    if n < 4 || tolerance.is_nan() || tolerance <= 0.0 {
        return points.to_vec();
    }
    let far = (1..n)
        .max_by(|&a, &b| {
            (points[a] - points[0])
                .norm_squared()
                .total_cmp(&(points[b] - points[0]).norm_squared())
        })
        .unwrap_or(n / 2);

    let mut keep = vec![false; n + 1];
    keep[0] = true;
    keep[far] = true;
    keep[n] = true;
    // Index n stands for vertex 0 closing the loop.
    let at = |i: usize| points[i % n];
    mark(&at, 0, far, tolerance, &mut keep);
    mark(&at, far, n, tolerance, &mut keep);

    let out: Vec<Point2> = (0..n).filter(|&i| keep[i]).map(|i| points[i]).collect();
    if out.len() < 3 {
        return points.to_vec();
    }
    out
}

fn mark<F>(at: &F, start: usize, end: usize, tolerance: f64, keep: &mut [bool])
where
    F: Fn(usize) -> Point2,
{
    if end <= start + 1 {
        return;
    }
    let (a, b) = (at(start), at(end));
    let mut worst = (0.0, start);
    for i in start + 1..end {
        let p = at(i);
        let d = point_to_segment_dist(p.x, p.y, a.x, a.y, b.x, b.y);
        if d > worst.0 {
            worst = (d, i);
        }
    }
    if worst.0 > tolerance {
        keep[worst.1] = true;
        mark(at, start, worst.1, tolerance, keep);
        mark(at, worst.1, end, tolerance, keep);
    }
}
