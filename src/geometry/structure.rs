use tracing::debug;

use super::contour::{Contour, ContourData};
use crate::math::slice::{cluster_positions, same_slice};
use crate::math::Point2;

/// A named region of interest owning zero or more contours per slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub roi_number: i32,
    pub name: String,
    pub color: [u8; 3],
    pub contours: Vec<Contour>,
}

impl Structure {
    /// Creates an empty structure.
    #[must_use]
    pub fn new(roi_number: i32, name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            roi_number,
            name: name.into(),
            color,
            contours: Vec::new(),
        }
    }

    /// Builds a structure from wire contours.
    ///
    /// Malformed contours are dropped; the second element of the returned
    /// tuple counts them.
    #[must_use]
    pub fn from_contour_data(
        roi_number: i32,
        name: impl Into<String>,
        color: [u8; 3],
        data: &[ContourData],
        z_tol: f64,
    ) -> (Self, usize) {
        let contours: Vec<Contour> = data.iter().filter_map(|d| d.to_contour(z_tol)).collect();
        let discarded = data.len() - contours.len();
        if discarded > 0 {
            debug!(roi_number, discarded, "dropped malformed contours");
        }
        let mut s = Self::new(roi_number, name, color);
        s.contours = contours;
        (s, discarded)
    }

    #[must_use]
    pub fn to_contour_data(&self) -> Vec<ContourData> {
        self.contours.iter().map(ContourData::from).collect()
    }

    /// Sorted unique slice positions.
    #[must_use]
    pub fn slice_positions(&self, tol: f64) -> Vec<f64> {
        cluster_positions(self.contours.iter().map(|c| c.z), tol)
    }

    /// Contours lying on slice `z`.
    #[must_use]
    pub fn contours_at(&self, z: f64, tol: f64) -> Vec<&Contour> {
        self.contours
            .iter()
            .filter(|c| same_slice(c.z, z, tol))
            .collect()
    }

    /// In-plane loops on slice `z`.
    #[must_use]
    pub fn loops_at(&self, z: f64, tol: f64) -> Vec<Vec<Point2>> {
        self.contours_at(z, tol)
            .into_iter()
            .map(|c| c.points.clone())
            .collect()
    }

    /// A new version of this structure with a different contour list.
    #[must_use]
    pub fn with_contours(&self, contours: Vec<Contour>) -> Self {
        Self {
            roi_number: self.roi_number,
            name: self.name.clone(),
            color: self.color,
            contours,
        }
    }

    /// Atomically replaces every contour on slice `z` with `loops`.
    ///
    /// An empty `loops` deletes the slice. Invalid loops are dropped.
    pub fn replace_slice(&mut self, z: f64, loops: Vec<Vec<Point2>>, tol: f64) {
        self.contours.retain(|c| !same_slice(c.z, z, tol));
        self.contours.extend(
            loops
                .into_iter()
                .map(|points| Contour::from_points(points, z))
                .filter(Contour::is_valid),
        );
    }

    /// Removes every contour on slice `z`, returning how many were removed.
    pub fn remove_slice(&mut self, z: f64, tol: f64) -> usize {
        let before = self.contours.len();
        self.contours.retain(|c| !same_slice(c.z, z, tol));
        before - self.contours.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square_data(z: f64, x0: f64) -> ContourData {
        ContourData {
            slice_position: z,
            points: vec![
                x0, 0.0, z, x0 + 10.0, 0.0, z, x0 + 10.0, 10.0, z, x0, 10.0, z,
            ],
        }
    }

    #[test]
    fn counts_discarded_contours() {
        let data = vec![
            square_data(0.0, 0.0),
            ContourData {
                slice_position: 0.0,
                points: vec![0.0, 0.0, 0.0],
            },
            square_data(2.0, 0.0),
        ];
        let (s, discarded) = Structure::from_contour_data(1, "PTV", [255, 0, 0], &data, 0.5);
        assert_eq!(discarded, 1);
        assert_eq!(s.contours.len(), 2);
        assert_eq!(s.to_contour_data().len(), 2);
    }

    #[test]
    fn replace_slice_is_atomic() {
        let data = vec![square_data(0.0, 0.0), square_data(0.1, 20.0), square_data(2.0, 0.0)];
        let (mut s, _) = Structure::from_contour_data(1, "GTV", [0, 255, 0], &data, 0.5);
        assert_eq!(s.contours_at(0.0, 0.5).len(), 2);

        let replacement = vec![vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ]];
        s.replace_slice(0.0, replacement, 0.5);
        assert_eq!(s.contours_at(0.0, 0.5).len(), 1);
        assert_eq!(s.contours.len(), 2);

        s.replace_slice(0.0, Vec::new(), 0.5);
        assert_eq!(s.slice_positions(0.5), vec![2.0]);
    }

    #[test]
    fn remove_slice_counts() {
        let data = vec![square_data(0.0, 0.0), square_data(2.0, 0.0), square_data(2.2, 30.0)];
        let (mut s, _) = Structure::from_contour_data(1, "CTV", [0, 0, 255], &data, 0.5);
        assert_eq!(s.remove_slice(2.0, 0.5), 2);
        assert_eq!(s.contours.len(), 1);
    }
}
