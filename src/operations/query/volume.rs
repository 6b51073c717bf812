use crate::geometry::Contour;
use crate::math::polygon_2d::{normalize_orientation, signed_area};
use crate::math::slice::{cluster_positions, local_thickness, same_slice};
use crate::math::{Point2, SLICE_TOL_MM};

/// Loops of one slice, re-oriented so holes subtract.
pub(super) struct SliceRegion {
    pub z: f64,
    pub loops: Vec<Vec<Point2>>,
    /// Net area in mm2.
    pub area: f64,
    /// Thickness credited to the slice in mm.
    pub thickness: f64,
}

/// Groups valid contours by slice position.
pub(super) fn slice_regions(contours: &[Contour], tol: f64, default_thickness: f64) -> Vec<SliceRegion> {
    let slices = cluster_positions(
        contours.iter().filter(|c| c.is_valid()).map(|c| c.z),
        tol,
    );
    slices
        .iter()
        .enumerate()
        .map(|(k, &z)| {
            let loops: Vec<Vec<Point2>> = contours
                .iter()
                .filter(|c| c.is_valid() && same_slice(c.z, z, tol))
                .map(|c| c.points.clone())
                .collect();
            let loops = normalize_orientation(&loops);
            let area = loops.iter().map(|l| signed_area(l)).sum::<f64>().max(0.0);
            SliceRegion {
                z,
                loops,
                area,
                thickness: local_thickness(&slices, k, default_thickness),
            }
        })
        .collect()
}

/// Volume of a contour stack: net slice area times local slice spacing,
/// summed over slices.
pub struct StructureVolume<'a> {
    contours: &'a [Contour],
    tolerance: f64,
    default_thickness: f64,
}

impl<'a> StructureVolume<'a> {
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

    /// Thickness credited to a single-slice structure.
    #[must_use]
    pub fn with_default_thickness(mut self, mm: f64) -> Self {
        self.default_thickness = mm;
        self
    }

    /// Volume in mm3.
    #[must_use]
    pub fn execute(&self) -> f64 {
        slice_regions(self.contours, self.tolerance, self.default_thickness)
            .iter()
            .map(|s| s.area * s.thickness)
            .sum()
    }
}
