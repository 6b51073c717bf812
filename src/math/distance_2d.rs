use super::Point2;

/// Returns the minimum distance from point `(px, py)` to the line segment
/// from `(ax, ay)` to `(bx, by)`.
#[must_use]
pub fn point_to_segment_dist(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((px - ax) * dx + (py - ay) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);

    let closest_x = ax + t * dx;
    let closest_y = ay + t * dy;

    ((px - closest_x).powi(2) + (py - closest_y).powi(2)).sqrt()
}

/// Returns the minimum distance from a point to the boundary of a closed loop.
///
/// Returns `f64::INFINITY` for an empty loop.
#[must_use]
pub fn point_to_loop_dist(point: &Point2, points: &[Point2]) -> f64 {
    let n = points.len();
    match n {
        0 => f64::INFINITY,
        1 => (point - points[0]).norm(),
        _ => (0..n)
            .map(|i| {
                let a = &points[i];
                let b = &points[(i + 1) % n];
                point_to_segment_dist(point.x, point.y, a.x, a.y, b.x, b.y)
            })
            .fold(f64::INFINITY, f64::min),
    }
}
