use tracing::debug;

use crate::geometry::Contour;
use crate::math::intersect_2d::loops_overlap;
use crate::math::polygon_2d::{loop_contains_loop, normalize_orientation, signed_area};
use crate::math::slice::{cluster_positions, local_thickness, median_spacing, slice_index_of};
use crate::math::{Point2, SLICE_TOL_MM};

/// Largest gap between linked slices, in multiples of the slice spacing. A
/// missing slice doubles the gap.
const MAX_GAP_FACTOR: f64 = 1.5;

/// A connected component of a structure's contours across slices.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Indices into the grouped contour list, ascending.
    pub contour_indices: Vec<usize>,
    /// Sum over slices of net loop area times local slice spacing.
    pub volume_mm3: f64,
    pub z_min: f64,
    pub z_max: f64,
}

/// Groups contours into blobs.
///
/// Contours on adjacent slice positions join when their loops overlap
/// (bounding boxes first, then edge crossing or vertex containment). Slices
/// are adjacent only when no slice is missing between them, judged against
/// the slice spacing (the median gap unless set explicitly). On the
/// same slice, a loop joins the loop that encloses it, so holes stay with
/// their outline. Blobs come back smallest volume first, ties broken by the
/// lowest contour index.
pub struct BlobGrouper<'a> {
    contours: &'a [Contour],
    tolerance: f64,
    default_thickness: f64,
    slice_spacing: Option<f64>,
}

impl<'a> BlobGrouper<'a> {
    #[must_use]
    pub fn new(contours: &'a [Contour]) -> Self {
        Self {
            contours,
            tolerance: SLICE_TOL_MM,
            default_thickness: 2.0,
            slice_spacing: None,
        }
    }

    /// Slice tolerance in mm.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Thickness credited to a structure with a single slice, in mm.
    #[must_use]
    pub fn with_default_thickness(mut self, mm: f64) -> Self {
        self.default_thickness = mm;
        self
    }

    /// Expected distance between consecutive slices, in mm.
    #[must_use]
    pub fn with_slice_spacing(mut self, mm: f64) -> Self {
        self.slice_spacing = Some(mm);
        self
    }

    #[must_use]
    pub fn execute(&self) -> Vec<Blob> {
        let slices = cluster_positions(self.contours.iter().map(|c| c.z), self.tolerance);
        let slice_of: Vec<Option<usize>> = self
            .contours
            .iter()
            .map(|c| slice_index_of(c.z, &slices, self.tolerance))
            .collect();
        let mut by_slice: Vec<Vec<usize>> = vec![Vec::new(); slices.len()];
        for (i, s) in slice_of.iter().enumerate() {
            match s {
                Some(s) if self.contours[i].is_valid() => by_slice[*s].push(i),
                _ => {}
            }
        }

        let spacing = self
            .slice_spacing
            .filter(|s| s.is_finite() && *s > 0.0)
            .or_else(|| median_spacing(&slices));
        let max_gap = spacing.map_or(f64::INFINITY, |s| s * MAX_GAP_FACTOR + self.tolerance);

        let mut sets = DisjointSet::new(self.contours.len());
        for (k, members) in by_slice.iter().enumerate() {
            for (n, &i) in members.iter().enumerate() {
                for &j in &members[n + 1..] {
                    let (a, b) = (&self.contours[i].points, &self.contours[j].points);
                    if loop_contains_loop(a, b) || loop_contains_loop(b, a) {
                        sets.union(i, j);
                    }
                }
            }
            let Some(next) = by_slice.get(k + 1) else {
                continue;
            };
            if slices[k + 1] - slices[k] > max_gap {
                continue;
            }
            for &i in members {
                for &j in next {
                    if loops_overlap(&self.contours[i].points, &self.contours[j].points) {
                        sets.union(i, j);
                    }
                }
            }
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut group_of_root: Vec<Option<usize>> = vec![None; self.contours.len()];
        for members in &by_slice {
            for &i in members {
                let root = sets.find(i);
                let g = *group_of_root[root].get_or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[g].push(i);
            }
        }

        let mut blobs: Vec<Blob> = groups
            .into_iter()
            .map(|mut indices| {
                indices.sort_unstable();
                self.measure(indices, &slices, &slice_of)
            })
            .collect();
        blobs.sort_by(|a, b| {
            a.volume_mm3
                .total_cmp(&b.volume_mm3)
                .then(a.contour_indices.first().cmp(&b.contour_indices.first()))
        });
        debug!(contours = self.contours.len(), blobs = blobs.len(), "grouped blobs");
        blobs
    }

    fn measure(&self, indices: Vec<usize>, slices: &[f64], slice_of: &[Option<usize>]) -> Blob {
        let mut volume = 0.0;
        let mut z_min = f64::INFINITY;
        let mut z_max = f64::NEG_INFINITY;
        let mut touched: Vec<usize> = indices.iter().filter_map(|&i| slice_of[i]).collect();
        touched.sort_unstable();
        touched.dedup();
        for s in touched {
            let loops: Vec<Vec<Point2>> = indices
                .iter()
                .filter(|&&i| slice_of[i] == Some(s))
                .map(|&i| self.contours[i].points.clone())
                .collect();
            let net: f64 = normalize_orientation(&loops).iter().map(|l| signed_area(l)).sum();
            volume += net.max(0.0) * local_thickness(slices, s, self.default_thickness);
        }
        for &i in &indices {
            z_min = z_min.min(self.contours[i].z);
            z_max = z_max.max(self.contours[i].z);
        }
        Blob {
            contour_indices: indices,
            volume_mm3: volume,
            z_min,
            z_max,
        }
    }
}

/// Number of blobs in a contour list.
#[must_use]
pub fn blob_count(contours: &[Contour], tol: f64) -> usize {
    BlobGrouper::new(contours).with_tolerance(tol).execute().len()
}

/// Union-find with path halving and union by size.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::with_orientation;
    use crate::test_support::{circle, square};

    fn stack(points: &[Point2], zs: &[f64]) -> Vec<Contour> {
        zs.iter()
            .map(|&z| Contour::from_points(points.to_vec(), z))
            .collect()
    }

    #[test]
    fn disjoint_columns_are_two_blobs() {
        let zs = [0.0, 2.0, 4.0, 6.0];
        let mut contours = stack(&circle(0.0, 0.0, 10.0, 64), &zs);
        contours.extend(stack(&circle(50.0, 0.0, 10.0, 64), &zs));
        let blobs = BlobGrouper::new(&contours).execute();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].contour_indices, vec![0, 1, 2, 3]);
        assert_eq!(blobs[1].contour_indices, vec![4, 5, 6, 7]);
    }

    #[test]
    fn bridge_slice_joins_columns() {
        let zs = [0.0, 2.0, 4.0, 6.0];
        let mut contours = stack(&circle(0.0, 0.0, 10.0, 64), &zs);
        contours.extend(stack(&circle(50.0, 0.0, 10.0, 64), &zs));
        // One slice with a single loop spanning both columns.
        contours.push(Contour::from_points(square(-5.0, -5.0, 60.0), 8.0));
        assert_eq!(blob_count(&contours, SLICE_TOL_MM), 1);
    }

    #[test]
    fn removing_middle_slice_splits() {
        let contours = stack(&circle(0.0, 0.0, 10.0, 64), &[0.0, 2.0, 4.0]);
        assert_eq!(blob_count(&contours, SLICE_TOL_MM), 1);
        let without_middle = vec![contours[0].clone(), contours[2].clone()];
        let blobs = BlobGrouper::new(&without_middle)
            .with_slice_spacing(2.0)
            .execute();
        assert_eq!(blobs.len(), 2);
        // Without a reference spacing the remaining gap is the only gap.
        assert_eq!(blob_count(&without_middle, SLICE_TOL_MM), 1);
    }

    #[test]
    fn missing_slice_in_regular_stack_splits() {
        let contours = stack(&circle(0.0, 0.0, 10.0, 64), &[0.0, 2.0, 4.0, 8.0, 10.0]);
        let blobs = BlobGrouper::new(&contours).execute();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].contour_indices, vec![3, 4]);
        assert_eq!(blobs[1].contour_indices, vec![0, 1, 2]);
    }

    #[test]
    fn sorted_smallest_first_with_volume() {
        let mut contours = stack(&square(0.0, 0.0, 10.0), &[0.0, 2.0, 4.0]);
        contours.push(Contour::from_points(square(100.0, 0.0, 2.0), 2.0));
        let blobs = BlobGrouper::new(&contours).execute();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].contour_indices, vec![3]);
        // Middle slice: 4 mm2 over 2 mm.
        assert!((blobs[0].volume_mm3 - 8.0).abs() < 1e-9);
        // Slices credited 2 mm each: 3 * 100 * 2.
        assert!((blobs[1].volume_mm3 - 600.0).abs() < 1e-9);
        assert!((blobs[1].z_min).abs() < 1e-12 && (blobs[1].z_max - 4.0).abs() < 1e-12);
    }

    #[test]
    fn hole_stays_with_outline() {
        let contours = vec![
            Contour::from_points(square(0.0, 0.0, 20.0), 0.0),
            Contour::from_points(with_orientation(&square(5.0, 5.0, 10.0), false), 0.0),
        ];
        let blobs = BlobGrouper::new(&contours).execute();
        assert_eq!(blobs.len(), 1);
        // 300 mm2 net over the default 2 mm thickness.
        assert!((blobs[0].volume_mm3 - 600.0).abs() < 1e-9);
    }

    #[test]
    fn drifting_z_still_adjacent() {
        let contours = vec![
            Contour::from_points(circle(0.0, 0.0, 5.0, 32), 0.0),
            Contour::from_points(circle(0.0, 0.0, 5.0, 32), 2.0003),
            Contour::from_points(circle(0.0, 0.0, 5.0, 32), 1.9998),
        ];
        let blobs = BlobGrouper::new(&contours).execute();
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn empty_input_has_no_blobs() {
        assert!(BlobGrouper::new(&[]).execute().is_empty());
    }
}
