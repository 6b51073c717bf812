use super::distance_2d::point_to_segment_dist;
use super::intersect_2d::loops_cross;
use super::{Point2, TOLERANCE};

/// Distance below which a point is considered to lie on a polygon edge.
const ON_EDGE_TOL: f64 = 1e-9;

/// Computes the signed area of a closed loop (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. Loops with fewer
/// than 3 points have zero area.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Unsigned area of a closed loop.
#[must_use]
pub fn area(points: &[Point2]) -> f64 {
    signed_area(points).abs()
}

/// Returns `true` if the loop has at least 3 points and only finite coordinates.
#[must_use]
pub fn is_usable_loop(points: &[Point2]) -> bool {
    points.len() >= 3 && points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
}

/// Perimeter of a closed loop.
#[must_use]
pub fn perimeter(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| (points[(i + 1) % n] - points[i]).norm())
        .sum()
}

/// Even-odd point-in-polygon test by ray casting.
///
/// Points lying on an edge (within a tiny tolerance) are reported as outside
/// so that the tie-break is consistent regardless of loop orientation.
#[must_use]
pub fn point_in_polygon(point: &Point2, points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = &points[j];
        let b = &points[i];
        if point_to_segment_dist(point.x, point.y, a.x, a.y, b.x, b.y) < ON_EDGE_TOL {
            return false;
        }
        if (b.y > point.y) != (a.y > point.y) {
            let x_cross = (a.x - b.x) * (point.y - b.y) / (a.y - b.y) + b.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounding box in the slice plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    /// Minimum corner.
    pub min: Point2,
    /// Maximum corner.
    pub max: Point2,
}

impl Aabb2 {
    /// Computes the bounding box of a point set, or `None` if it is empty.
    #[must_use]
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    /// Returns `true` if the boxes overlap once each is grown by `pad`.
    #[must_use]
    pub fn overlaps(&self, other: &Self, pad: f64) -> bool {
        self.min.x <= other.max.x + pad
            && self.max.x >= other.min.x - pad
            && self.min.y <= other.max.y + pad
            && self.max.y >= other.min.y - pad
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Box grown by `d` on every side.
    #[must_use]
    pub fn expanded(&self, d: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - d, self.min.y - d),
            max: Point2::new(self.max.x + d, self.max.y + d),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Bounding box of a loop, for fast rejection before intersection tests.
#[must_use]
pub fn bounding_box(points: &[Point2]) -> Option<Aabb2> {
    Aabb2::from_points(points)
}

/// Area-weighted centroid of a loop.
///
/// Falls back to the vertex mean for loops with (near) zero area.
#[must_use]
pub fn centroid(points: &[Point2]) -> Option<Point2> {
    let n = points.len();
    if n == 0 {
        return None;
    }
    let a = signed_area(points);
    if a.abs() < TOLERANCE {
        #[allow(clippy::cast_precision_loss)]
        let inv_n = 1.0 / n as f64;
        return Some(Point2::new(
            points.iter().map(|p| p.x).sum::<f64>() * inv_n,
            points.iter().map(|p| p.y).sum::<f64>() * inv_n,
        ));
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = &points[i];
        let q = &points[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    let k = 1.0 / (6.0 * a);
    Some(Point2::new(cx * k, cy * k))
}

/// Rotates a closed loop so it starts at the leftmost vertex (smallest x),
/// breaking ties by smallest y. Gives a deterministic starting vertex for
/// comparisons.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point2]) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - TOLERANCE || (pt.x - b.x).abs() < TOLERANCE && pt.y < b.y {
            best = i;
        }
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

/// Returns the loop with the requested winding (counter-clockwise when `ccw`).
#[must_use]
pub fn with_orientation(points: &[Point2], ccw: bool) -> Vec<Point2> {
    let is_ccw = signed_area(points) >= 0.0;
    if is_ccw == ccw {
        points.to_vec()
    } else {
        points.iter().rev().copied().collect()
    }
}

/// Returns `true` if `inner` lies entirely inside `outer`: no edge crossings
/// and a vertex of `inner` inside `outer`.
#[must_use]
pub fn loop_contains_loop(outer: &[Point2], inner: &[Point2]) -> bool {
    let (Some(ob), Some(ib)) = (bounding_box(outer), bounding_box(inner)) else {
        return false;
    };
    if ib.min.x < ob.min.x || ib.min.y < ob.min.y || ib.max.x > ob.max.x || ib.max.y > ob.max.y {
        return false;
    }
    if loops_cross(outer, inner) {
        return false;
    }
    inner.iter().any(|p| point_in_polygon(p, outer))
}

/// Re-orients a set of loops on one slice so that nesting depth decides
/// winding: loops at even depth become counter-clockwise (material), loops
/// at odd depth become clockwise (holes).
///
/// Loops that overlap without containment are siblings at the same depth,
/// so overlapping strokes union under a non-zero fill rule.
#[must_use]
pub fn normalize_orientation(loops: &[Vec<Point2>]) -> Vec<Vec<Point2>> {
    let usable: Vec<&Vec<Point2>> = loops.iter().filter(|l| is_usable_loop(l)).collect();
    usable
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let depth = usable
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && area(other) > area(l) && loop_contains_loop(other, l))
                .count();
            with_orientation(l, depth % 2 == 0)
        })
        .collect()
}

/// Convex hull of a point set (Andrew's monotone chain), counter-clockwise,
/// without collinear points.
#[must_use]
pub fn convex_hull(points: &[Point2]) -> Vec<Point2> {
    let mut pts: Vec<Point2> = points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .copied()
        .collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE);
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: &Point2, a: &Point2, b: &Point2| {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };

    let mut hull: Vec<Point2> = Vec::with_capacity(pts.len() * 2);
    for p in &pts {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}
