use crate::math::Point2;

/// Smooths a closed loop with `passes` rounds of 1-2-1 neighbour averaging.
///
/// Each pass moves every vertex to `(prev + 2 * p + next) / 4`, which takes
/// the corners off pixel staircases while keeping the vertex count. Loops
/// with fewer than 3 points are returned unchanged.
#[must_use]
pub fn smooth_loop(points: &[Point2], passes: u32) -> Vec<Point2> {
    let n = points.len();
    let mut current = points.to_vec();
    if n < 3 {
        return current;
    }
    let mut next = current.clone();
    for _ in 0..passes {
        for i in 0..n {
            let prev = current[(i + n - 1) % n];
            let after = current[(i + 1) % n];
            let p = current[i];
            next[i] = Point2::from((prev.coords + p.coords * 2.0 + after.coords) * 0.25);
        }
        std::mem::swap(&mut current, &mut next);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::{centroid, signed_area};
    use crate::test_support::square;

    #[test]
    fn zero_passes_is_identity() {
        let sq = square(0.0, 0.0, 4.0);
        assert_eq!(smooth_loop(&sq, 0), sq);
    }

    #[test]
    fn smoothing_shrinks_staircase() {
        // Staircase outline of pixel blocks.
        let stairs = vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 1.0),
            Point2::new(2.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(1.0, 2.0),
            Point2::new(1.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        let smoothed = smooth_loop(&stairs, 2);
        assert_eq!(smoothed.len(), stairs.len());
        let (before, after) = (signed_area(&stairs), signed_area(&smoothed));
        assert!(after > 0.0 && after < before);
        // Coarse vertices shrink a lot: 6 -> 1.9375 after two passes.
        assert!((after - 1.9375).abs() < 1e-12);
    }

    #[test]
    fn centroid_is_preserved_for_symmetric_loop() {
        let sq = square(-2.0, -2.0, 4.0);
        let c = centroid(&smooth_loop(&sq, 3)).unwrap_or_else(|| Point2::new(f64::NAN, f64::NAN));
        assert!(c.coords.norm() < 1e-12);
    }

    #[test]
    fn short_loops_unchanged() {
        let two = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
        assert_eq!(smooth_loop(&two, 5), two);
    }
}
