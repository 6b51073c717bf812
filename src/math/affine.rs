use super::{Point2, Point3, Vector3, TOLERANCE};
use crate::error::{OperationError, Result};

/// Pixel/world mapping of one image slice, from the DICOM
/// `ImagePositionPatient`, `ImageOrientationPatient` and `PixelSpacing`
/// attributes.
///
/// `world = image_position + row_direction * col_spacing * column
///        + column_direction * row_spacing * row`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceGeometry {
    /// World position of the centre of pixel (row 0, column 0).
    pub image_position: Point3,
    /// Direction cosine along a row (increasing column index).
    pub row_direction: Vector3,
    /// Direction cosine along a column (increasing row index).
    pub column_direction: Vector3,
    /// `[row spacing, column spacing]` in mm.
    pub pixel_spacing: [f64; 2],
}

impl SliceGeometry {
    /// Builds a slice geometry from raw DICOM attribute values.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if a direction cosine has zero
    /// length or a spacing is not strictly positive.
    pub fn from_dicom(position: [f64; 3], orientation: [f64; 6], spacing: [f64; 2]) -> Result<Self> {
        let row = Vector3::new(orientation[0], orientation[1], orientation[2]);
        let col = Vector3::new(orientation[3], orientation[4], orientation[5]);
        if row.norm() < TOLERANCE || col.norm() < TOLERANCE {
            return Err(OperationError::InvalidInput(
                "image orientation has a zero-length direction cosine".to_owned(),
            )
            .into());
        }
        if !(spacing[0] > 0.0 && spacing[1] > 0.0) {
            return Err(OperationError::InvalidInput(format!(
                "pixel spacing must be positive, got {spacing:?}"
            ))
            .into());
        }
        Ok(Self {
            image_position: Point3::new(position[0], position[1], position[2]),
            row_direction: row.normalize(),
            column_direction: col.normalize(),
            pixel_spacing: spacing,
        })
    }

    /// Axial slice at `z` with identity orientation and the given origin.
    #[must_use]
    pub fn axial(origin_x: f64, origin_y: f64, z: f64, spacing: [f64; 2]) -> Self {
        Self {
            image_position: Point3::new(origin_x, origin_y, z),
            row_direction: Vector3::x(),
            column_direction: Vector3::y(),
            pixel_spacing: spacing,
        }
    }

    /// Maps a (fractional) pixel position to world coordinates.
    #[must_use]
    pub fn pixel_to_world(&self, column: f64, row: f64) -> Point3 {
        self.image_position
            + self.row_direction * (self.pixel_spacing[1] * column)
            + self.column_direction * (self.pixel_spacing[0] * row)
    }

    /// Maps a world point to a fractional `(column, row)` pixel position by
    /// projecting onto the slice plane.
    #[must_use]
    pub fn world_to_pixel(&self, world: &Point3) -> Point2 {
        let d = world - self.image_position;
        Point2::new(
            d.dot(&self.row_direction) / self.pixel_spacing[1],
            d.dot(&self.column_direction) / self.pixel_spacing[0],
        )
    }

    /// Unit normal of the slice plane.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        self.row_direction.cross(&self.column_direction)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn axial_pixel_to_world() {
        let g = SliceGeometry::from_dicom(
            [-250.0, -200.0, 12.5],
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            [0.8, 0.5],
        )
        .unwrap();
        let w = g.pixel_to_world(10.0, 4.0);
        assert!((w.x - (-250.0 + 0.5 * 10.0)).abs() < 1e-12);
        assert!((w.y - (-200.0 + 0.8 * 4.0)).abs() < 1e-12);
        assert!((w.z - 12.5).abs() < 1e-12);
    }

    #[test]
    fn world_to_pixel_inverts_pixel_to_world() {
        let s = 0.5_f64.sqrt();
        let g = SliceGeometry::from_dicom([10.0, 20.0, 30.0], [s, s, 0.0, -s, s, 0.0], [1.2, 0.7])
            .unwrap();
        let w = g.pixel_to_world(33.25, 17.5);
        let p = g.world_to_pixel(&w);
        assert!((p.x - 33.25).abs() < 1e-9);
        assert!((p.y - 17.5).abs() < 1e-9);
        assert!((g.normal().z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_attributes() {
        assert!(SliceGeometry::from_dicom([0.0; 3], [0.0; 6], [1.0, 1.0]).is_err());
        assert!(
            SliceGeometry::from_dicom([0.0; 3], [1.0, 0.0, 0.0, 0.0, 1.0, 0.0], [0.0, 1.0]).is_err()
        );
    }
}
