use super::polygon_2d::{bounding_box, point_in_polygon};
use super::{Point2, TOLERANCE};

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
/// Parallel segments return `None`.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let cross = da.x * db.y - da.y * db.x;
    if cross.abs() < TOLERANCE {
        return None;
    }

    let dx = b0.x - a0.x;
    let dy = b0.y - a0.y;
    let t = (dx * db.y - dy * db.x) / cross;
    let u = (dx * da.y - dy * da.x) / cross;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        let pt = a0 + da * t_clamped;
        Some((pt, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

fn orientation(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: &Point2, b: &Point2, p: &Point2) -> bool {
    p.x >= a.x.min(b.x) - TOLERANCE
        && p.x <= a.x.max(b.x) + TOLERANCE
        && p.y >= a.y.min(b.y) - TOLERANCE
        && p.y <= a.y.max(b.y) + TOLERANCE
}

/// Returns `true` if segment `a-b` touches or crosses segment `c-d`,
/// including collinear overlap.
#[must_use]
pub fn segments_intersect(a: &Point2, b: &Point2, c: &Point2, d: &Point2) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    let sign = |v: f64| {
        if v > TOLERANCE {
            1
        } else if v < -TOLERANCE {
            -1
        } else {
            0
        }
    };
    let (s1, s2, s3, s4) = (sign(o1), sign(o2), sign(o3), sign(o4));

    if s1 * s2 < 0 && s3 * s4 < 0 {
        return true;
    }
    (s1 == 0 && on_segment(a, b, c))
        || (s2 == 0 && on_segment(a, b, d))
        || (s3 == 0 && on_segment(c, d, a))
        || (s4 == 0 && on_segment(c, d, b))
}

/// Returns `true` if any edge of loop `a` touches any edge of loop `b`.
#[must_use]
pub fn loops_cross(a: &[Point2], b: &[Point2]) -> bool {
    let (na, nb) = (a.len(), b.len());
    if na < 2 || nb < 2 {
        return false;
    }
    let Some(bb) = bounding_box(b) else {
        return false;
    };
    for i in 0..na {
        let a0 = &a[i];
        let a1 = &a[(i + 1) % na];
        // Skip edges of `a` that cannot reach `b`.
        if a0.x.max(a1.x) < bb.min.x - TOLERANCE
            || a0.x.min(a1.x) > bb.max.x + TOLERANCE
            || a0.y.max(a1.y) < bb.min.y - TOLERANCE
            || a0.y.min(a1.y) > bb.max.y + TOLERANCE
        {
            continue;
        }
        for j in 0..nb {
            if segments_intersect(a0, a1, &b[j], &b[(j + 1) % nb]) {
                return true;
            }
        }
    }
    false
}

/// Approximate 2D overlap test between two loops: bounding boxes overlap and
/// either the boundaries touch or one loop has a vertex inside the other.
#[must_use]
pub fn loops_overlap(a: &[Point2], b: &[Point2]) -> bool {
    let (Some(ab), Some(bb)) = (bounding_box(a), bounding_box(b)) else {
        return false;
    };
    if !ab.overlaps(&bb, 0.0) {
        return false;
    }
    loops_cross(a, b)
        || a.iter().any(|p| point_in_polygon(p, b))
        || b.iter().any(|p| point_in_polygon(p, a))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + size, y0),
            Point2::new(x0 + size, y0 + size),
            Point2::new(x0, y0 + size),
        ]
    }

    #[test]
    fn segment_segment_crossing() {
        let (pt, t, u) = segment_segment_intersect_2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 2.0),
            &Point2::new(0.0, 2.0),
            &Point2::new(2.0, 0.0),
        )
        .unwrap();
        assert!((pt.x - 1.0).abs() < TOLERANCE);
        assert!((pt.y - 1.0).abs() < TOLERANCE);
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn segment_segment_no_crossing() {
        assert!(segment_segment_intersect_2d(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn segments_intersect_crossing_and_touching() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 2.0);
        assert!(segments_intersect(&a, &b, &Point2::new(0.0, 2.0), &Point2::new(2.0, 0.0)));
        // T-junction touch.
        assert!(segments_intersect(&a, &b, &Point2::new(1.0, 1.0), &Point2::new(3.0, 0.0)));
        assert!(!segments_intersect(&a, &b, &Point2::new(3.0, 0.0), &Point2::new(4.0, 0.0)));
    }

    #[test]
    fn segments_intersect_collinear_overlap() {
        assert!(segments_intersect(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(3.0, 0.0),
        ));
        assert!(!segments_intersect(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(2.0, 0.0),
            &Point2::new(3.0, 0.0),
        ));
    }

    #[test]
    fn overlapping_squares_overlap() {
        assert!(loops_overlap(&square(0.0, 0.0, 10.0), &square(5.0, 5.0, 10.0)));
        assert!(loops_cross(&square(0.0, 0.0, 10.0), &square(5.0, 5.0, 10.0)));
    }

    #[test]
    fn contained_square_overlaps_without_crossing() {
        let outer = square(0.0, 0.0, 10.0);
        let inner = square(2.0, 2.0, 2.0);
        assert!(!loops_cross(&outer, &inner));
        assert!(loops_overlap(&outer, &inner));
        assert!(loops_overlap(&inner, &outer));
    }

    #[test]
    fn distant_squares_do_not_overlap() {
        assert!(!loops_overlap(&square(0.0, 0.0, 10.0), &square(100.0, 100.0, 10.0)));
    }

    #[test]
    fn bounding_boxes_overlap_but_loops_do_not() {
        let l_shape = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let small = square(5.0, 5.0, 2.0);
        assert!(!loops_overlap(&l_shape, &small));
    }
}
