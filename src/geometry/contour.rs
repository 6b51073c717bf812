use serde::{Deserialize, Serialize};

use crate::math::polygon_2d::{self, Aabb2};
use crate::math::{Point2, Point3};

/// One closed polygon loop on one slice.
///
/// The loop is implicitly closed: the last point connects to the first and
/// is never duplicated. All points share the slice position `z`.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub z: f64,
    pub points: Vec<Point2>,
}

impl Contour {
    /// Creates a contour from in-plane points at slice `z`, dropping an
    /// explicit closing duplicate if present.
    #[must_use]
    pub fn from_points(points: Vec<Point2>, z: f64) -> Self {
        let mut points = points;
        if points.len() > 1 {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if (first - last).norm() < crate::math::TOLERANCE {
                    points.pop();
                }
            }
        }
        Self { z, points }
    }

    /// Parses a flat `[x, y, z, x, y, z, ...]` array.
    ///
    /// Returns `None` for malformed input: fewer than 3 points, a length that
    /// is not a multiple of 3, non-finite values, or z values that drift more
    /// than `z_tol` from the first point.
    #[must_use]
    pub fn from_flat(flat: &[f64], z_tol: f64) -> Option<Self> {
        if flat.len() < 9 || flat.len() % 3 != 0 || flat.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let z = flat[2];
        let mut points = Vec::with_capacity(flat.len() / 3);
        for triple in flat.chunks_exact(3) {
            if (triple[2] - z).abs() > z_tol {
                return None;
            }
            points.push(Point2::new(triple[0], triple[1]));
        }
        let contour = Self::from_points(points, z);
        contour.is_valid().then_some(contour)
    }

    /// Flattens to `[x, y, z, ...]` with every point at the contour's z.
    #[must_use]
    pub fn to_flat(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| [p.x, p.y, self.z])
            .collect()
    }

    /// Points lifted into 3D at the contour's z.
    #[must_use]
    pub fn points_3d(&self) -> Vec<Point3> {
        self.points
            .iter()
            .map(|p| Point3::new(p.x, p.y, self.z))
            .collect()
    }

    /// At least 3 points, all finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.z.is_finite() && polygon_2d::is_usable_loop(&self.points)
    }

    #[must_use]
    pub fn signed_area(&self) -> f64 {
        polygon_2d::signed_area(&self.points)
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        polygon_2d::area(&self.points)
    }

    #[must_use]
    pub fn aabb(&self) -> Option<Aabb2> {
        polygon_2d::bounding_box(&self.points)
    }

    #[must_use]
    pub fn centroid(&self) -> Option<Point2> {
        polygon_2d::centroid(&self.points)
    }

    /// Even-odd containment; points on the boundary are outside.
    #[must_use]
    pub fn contains(&self, point: &Point2) -> bool {
        polygon_2d::point_in_polygon(point, &self.points)
    }

    /// The same loop moved to slice `z`.
    #[must_use]
    pub fn with_z(&self, z: f64) -> Self {
        Self {
            z,
            points: self.points.clone(),
        }
    }
}

/// Wire shape of a contour: `{ slicePosition, points: [x, y, z, ...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContourData {
    pub slice_position: f64,
    pub points: Vec<f64>,
}

impl ContourData {
    /// Converts to a [`Contour`], or `None` if the data is malformed.
    ///
    /// The z of the resulting contour is the declared slice position.
    #[must_use]
    pub fn to_contour(&self, z_tol: f64) -> Option<Contour> {
        let contour = Contour::from_flat(&self.points, z_tol)?;
        if !self.slice_position.is_finite() || (contour.z - self.slice_position).abs() > z_tol {
            return None;
        }
        Some(contour.with_z(self.slice_position))
    }
}

impl From<&Contour> for ContourData {
    fn from(contour: &Contour) -> Self {
        Self {
            slice_position: contour.z,
            points: contour.to_flat(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn flat_round_trip() {
        let flat = [0.0, 0.0, 2.0, 10.0, 0.0, 2.0, 10.0, 10.0, 2.0, 0.0, 10.0, 2.0];
        let c = Contour::from_flat(&flat, 0.5).unwrap();
        assert_eq!(c.points.len(), 4);
        assert!((c.area() - 100.0).abs() < 1e-12);
        assert_eq!(c.to_flat(), flat.to_vec());
    }

    #[test]
    fn rejects_malformed_flat_arrays() {
        assert!(Contour::from_flat(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0.5).is_none());
        assert!(Contour::from_flat(&[0.0; 10], 0.5).is_none());
        assert!(Contour::from_flat(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, f64::NAN, 0.0],
            0.5
        )
        .is_none());
        // z drifts by 3 mm inside one loop.
        assert!(Contour::from_flat(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 3.0], 0.5).is_none());
    }

    #[test]
    fn drops_explicit_closing_point() {
        let c = Contour::from_points(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 0.0),
            ],
            0.0,
        );
        assert_eq!(c.points.len(), 3);
    }

    #[test]
    fn contour_data_uses_camel_case() {
        let data: ContourData = serde_json::from_str(
            r#"{"slicePosition": 4.0, "points": [0,0,4.1, 5,0,4.1, 5,5,4.1]}"#,
        )
        .unwrap();
        let c = data.to_contour(0.5).unwrap();
        assert!((c.z - 4.0).abs() < f64::EPSILON);
        let json = serde_json::to_string(&ContourData::from(&c)).unwrap();
        assert!(json.contains("slicePosition"));
    }
}
