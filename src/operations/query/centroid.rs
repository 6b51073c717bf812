use crate::geometry::Contour;
use crate::math::polygon_2d::{centroid, signed_area};
use crate::math::{Point3, Vector3, SLICE_TOL_MM};

use super::volume::slice_regions;

/// Volume-weighted centroid of a contour stack.
pub struct StructureCentroid<'a> {
    contours: &'a [Contour],
    tolerance: f64,
    default_thickness: f64,
}

impl<'a> StructureCentroid<'a> {
    #[must_use]
    pub fn new(contours: &'a [Contour]) -> Self {
        Self {
            contours,
            tolerance: SLICE_TOL_MM,
            default_thickness: 2.0,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    #[must_use]
    pub fn with_default_thickness(mut self, mm: f64) -> Self {
        self.default_thickness = mm;
        self
    }

    /// Returns `None` when the stack encloses no area.
    #[must_use]
    pub fn execute(&self) -> Option<Point3> {
        let mut weight = 0.0;
        let mut sum = Vector3::zeros();
        for slice in slice_regions(self.contours, self.tolerance, self.default_thickness) {
            // Signed areas make holes pull the moment the right way.
            let mut moment_x = 0.0;
            let mut moment_y = 0.0;
            let mut net = 0.0;
            for l in &slice.loops {
                let a = signed_area(l);
                let Some(c) = centroid(l) else {
                    continue;
                };
                moment_x += a * c.x;
                moment_y += a * c.y;
                net += a;
            }
            if net <= 0.0 {
                continue;
            }
            let w = net * slice.thickness;
            sum += Vector3::new(moment_x / net, moment_y / net, slice.z) * w;
            weight += w;
        }
        (weight > 0.0).then(|| Point3::from(sum / weight))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::with_orientation;
    use crate::test_support::square;

    #[test]
    fn centroid_of_offset_box() {
        let contours: Vec<Contour> = [10.0, 12.0, 14.0]
            .iter()
            .map(|&z| Contour::from_points(square(4.0, -6.0, 2.0), z))
            .collect();
        let c = StructureCentroid::new(&contours).execute().unwrap();
        assert!((c - Point3::new(5.0, -5.0, 12.0)).norm() < 1e-9);
    }

    #[test]
    fn hole_shifts_centroid() {
        let contours = vec![
            Contour::from_points(square(0.0, 0.0, 10.0), 0.0),
            Contour::from_points(with_orientation(&square(6.0, 1.0, 3.0), false), 0.0),
        ];
        let c = StructureCentroid::new(&contours).execute().unwrap();
        let expected_x = (100.0 * 5.0 - 9.0 * 7.5) / 91.0;
        let expected_y = (100.0 * 5.0 - 9.0 * 2.5) / 91.0;
        assert!((c.x - expected_x).abs() < 1e-9);
        assert!((c.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn empty_has_no_centroid() {
        assert!(StructureCentroid::new(&[]).execute().is_none());
    }
}
