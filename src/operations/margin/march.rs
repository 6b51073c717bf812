//! Marching squares over a scalar field: extracts the boundary of the region
//! `value < 0` as closed loops.

use std::collections::HashMap;

use crate::math::Point2;
use crate::raster::Grid;

/// Value used for samples outside the grid, so every loop closes.
const OUTSIDE: f64 = 1e12;

/// Identifies a lattice edge: horizontal edges run from `(i, j)` to
/// `(i + 1, j)`, vertical ones from `(i, j)` to `(i, j + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeKey {
    H(isize, isize),
    V(isize, isize),
}

struct Field<'a> {
    values: &'a [f64],
    width: usize,
    height: usize,
}

impl Field<'_> {
    #[allow(clippy::cast_sign_loss)]
    fn at(&self, i: isize, j: isize) -> f64 {
        if i < 0 || j < 0 || i as usize >= self.width || j as usize >= self.height {
            return OUTSIDE;
        }
        self.values[j as usize * self.width + i as usize]
    }

    /// Crossing point on an edge in fractional grid coordinates.
    #[allow(clippy::cast_precision_loss)]
    fn crossing(&self, key: EdgeKey) -> Point2 {
        let (i, j, i1, j1) = match key {
            EdgeKey::H(i, j) => (i, j, i + 1, j),
            EdgeKey::V(i, j) => (i, j, i, j + 1),
        };
        let (f0, f1) = (self.at(i, j), self.at(i1, j1));
        let t = if (f0 - f1).abs() > f64::EPSILON {
            (f0 / (f0 - f1)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        Point2::new(
            i as f64 + t * (i1 - i) as f64,
            j as f64 + t * (j1 - j) as f64,
        )
    }
}

/// Extracts loops around `values < 0`, sampled on `grid` (row-major).
///
/// Loops are returned in world coordinates with the region on their left:
/// outer boundaries counter-clockwise, holes clockwise. Saddle cells are
/// resolved by the sign of the cell-centre average.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn extract_loops(values: &[f64], grid: &Grid) -> Vec<Vec<Point2>> {
    let field = Field {
        values,
        width: grid.width,
        height: grid.height,
    };
    let w = grid.width as isize;
    let h = grid.height as isize;

    let mut next: HashMap<EdgeKey, EdgeKey> = HashMap::new();
    let mut order: Vec<EdgeKey> = Vec::new();

    for j in -1..h {
        for i in -1..w {
            // Corners counter-clockwise from bottom-left; edge k joins
            // corner k to corner k + 1.
            let corners = [
                field.at(i, j),
                field.at(i + 1, j),
                field.at(i + 1, j + 1),
                field.at(i, j + 1),
            ];
            let inside = corners.map(|v| v < 0.0);
            if inside.iter().all(|&b| b) || inside.iter().all(|&b| !b) {
                continue;
            }
            let edges = [
                EdgeKey::H(i, j),
                EdgeKey::V(i + 1, j),
                EdgeKey::H(i, j + 1),
                EdgeKey::V(i, j),
            ];
            let exits: Vec<usize> = (0..4).filter(|&k| inside[k] && !inside[(k + 1) % 4]).collect();
            let entries: Vec<usize> = (0..4).filter(|&k| !inside[k] && inside[(k + 1) % 4]).collect();

            let mut link = |from: usize, to: usize| {
                next.insert(edges[from], edges[to]);
                order.push(edges[from]);
            };
            if exits.len() == 1 && entries.len() == 1 {
                link(exits[0], entries[0]);
            } else {
                let centre_inside = corners.iter().sum::<f64>() < 0.0;
                for &k in &exits {
                    // Joined centre: cut off the outside corner that follows;
                    // split centre: cut off the inside corner itself.
                    let to = if centre_inside { (k + 1) % 4 } else { (k + 3) % 4 };
                    link(k, to);
                }
            }
        }
    }

    let mut loops = Vec::new();
    for start in order {
        let Some(mut key) = next.remove(&start) else {
            continue;
        };
        let mut pts = vec![field.crossing(start)];
        while key != start {
            pts.push(field.crossing(key));
            match next.remove(&key) {
                Some(k) => key = k,
                None => break,
            }
        }
        pts.dedup_by(|a, b| (*a - *b).norm() < 1e-9);
        if pts.len() >= 3 {
            loops.push(pts.into_iter().map(|p| grid.to_world(p.x, p.y)).collect());
        }
    }
    loops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area;
    use std::f64::consts::PI;

    fn disc_field(grid: &Grid, cx: f64, cy: f64, r: f64) -> Vec<f64> {
        let mut v = Vec::with_capacity(grid.cells());
        for j in 0..grid.height {
            for i in 0..grid.width {
                let p = grid.sample(i, j);
                v.push(((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt() - r);
            }
        }
        v
    }

    #[test]
    fn disc_boundary_is_one_ccw_loop() {
        let grid = Grid::new(Point2::new(-10.0, -10.0), 0.5, 0.5, 41, 41);
        let loops = extract_loops(&disc_field(&grid, 0.0, 0.0, 6.0), &grid);
        assert_eq!(loops.len(), 1);
        let a = signed_area(&loops[0]);
        assert!(a > 0.0);
        assert!((a - PI * 36.0).abs() / (PI * 36.0) < 0.01, "area={a}");
    }

    #[test]
    fn annulus_yields_hole() {
        let grid = Grid::new(Point2::new(-10.0, -10.0), 0.5, 0.5, 41, 41);
        let outer = disc_field(&grid, 0.0, 0.0, 8.0);
        let inner = disc_field(&grid, 0.0, 0.0, 3.0);
        let ring: Vec<f64> = outer.iter().zip(&inner).map(|(o, i)| o.max(-i)).collect();
        let loops = extract_loops(&ring, &grid);
        assert_eq!(loops.len(), 2);
        let net: f64 = loops.iter().map(|l| signed_area(l)).sum();
        assert!((net - PI * 55.0).abs() / (PI * 55.0) < 0.02, "net={net}");
    }

    #[test]
    fn region_touching_border_is_closed() {
        let grid = Grid::new(Point2::new(0.0, 0.0), 1.0, 1.0, 3, 3);
        let loops = extract_loops(&[-1.0; 9], &grid);
        assert_eq!(loops.len(), 1);
        assert!(signed_area(&loops[0]) > 0.0);
    }

    #[test]
    fn saddle_uses_centre_value() {
        let grid = Grid::new(Point2::new(0.0, 0.0), 1.0, 1.0, 2, 2);
        // Diagonal inside corners; strongly negative centre joins them.
        let joined = extract_loops(&[-3.0, 1.0, 1.0, -3.0], &grid);
        assert_eq!(joined.len(), 1);
        let split = extract_loops(&[-1.0, 3.0, 3.0, -1.0], &grid);
        assert_eq!(split.len(), 2);
    }
}
