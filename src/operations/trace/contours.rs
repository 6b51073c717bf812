use tracing::debug;

use crate::error::{OperationError, Result};
use crate::geometry::Contour;
use crate::math::affine::SliceGeometry;
use crate::math::polygon_2d::with_orientation;
use crate::math::Point2;
use crate::operations::smooth::smooth_loop;
use crate::raster::BinaryMask;

use super::moore::MaskTracer;

/// Largest tilt of the slice normal away from the z axis, as `1 - |n.z|`.
const AXIAL_TOL: f64 = 1e-3;

/// Converts a segmentation mask on one image slice into world contours.
///
/// Small components are discarded first; optionally only the largest one
/// is kept. Each component's external boundary is traced through pixel
/// centres, smoothed, and mapped to patient coordinates.
pub struct MaskToContours<'a> {
    mask: &'a BinaryMask,
    geometry: &'a SliceGeometry,
    smoothing_passes: u32,
    min_component_pixels: usize,
    largest_only: bool,
}

impl<'a> MaskToContours<'a> {
    #[must_use]
    pub fn new(mask: &'a BinaryMask, geometry: &'a SliceGeometry) -> Self {
        Self {
            mask,
            geometry,
            smoothing_passes: 2,
            min_component_pixels: 1,
            largest_only: false,
        }
    }

    /// Rounds of 1-2-1 smoothing applied in pixel space.
    #[must_use]
    pub fn with_smoothing(mut self, passes: u32) -> Self {
        self.smoothing_passes = passes;
        self
    }

    #[must_use]
    pub fn with_min_component_pixels(mut self, pixels: usize) -> Self {
        self.min_component_pixels = pixels;
        self
    }

    #[must_use]
    pub fn with_largest_only(mut self, largest_only: bool) -> Self {
        self.largest_only = largest_only;
        self
    }

    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if the slice is not axial, or
    /// if the mask size does not match its data.
    pub fn execute(&self) -> Result<Vec<Contour>> {
        if self.mask.data.len() != self.mask.width * self.mask.height {
            return Err(OperationError::InvalidInput("mask data does not match its size".to_owned()).into());
        }
        let normal = self.geometry.normal();
        if 1.0 - normal.z.abs() > AXIAL_TOL {
            return Err(OperationError::InvalidInput(format!(
                "contours need an axial slice, normal is {:?}",
                normal.as_slice()
            ))
            .into());
        }

        let mut mask = self.mask.clone();
        let removed = mask.remove_small_components(self.min_component_pixels);
        if self.largest_only {
            mask.keep_largest_component();
        }
        let tracer = MaskTracer::new(&mask);
        let loops = if self.largest_only {
            tracer.trace_largest().into_iter().collect()
        } else {
            tracer.trace_all()
        };
        debug!(loops = loops.len(), removed, "traced mask");

        let mut contours = Vec::with_capacity(loops.len());
        for l in loops {
            if l.len() < 3 {
                debug!(pixels = l.len(), "boundary too short for a contour");
                continue;
            }
            let smoothed = smooth_loop(&l.to_points(), self.smoothing_passes);
            let world: Vec<_> = smoothed
                .iter()
                .map(|p| self.geometry.pixel_to_world(p.x, p.y))
                .collect();
            #[allow(clippy::cast_precision_loss)]
            let z = world.iter().map(|p| p.z).sum::<f64>() / world.len() as f64;
            let planar: Vec<Point2> = world.iter().map(|p| Point2::new(p.x, p.y)).collect();
            let contour = Contour::from_points(with_orientation(&planar, true), z);
            if contour.is_valid() {
                contours.push(contour);
            }
        }
        Ok(contours)
    }
}
