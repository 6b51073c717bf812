use crate::math::polygon_2d::Aabb2;
use crate::math::Point2;

/// Axis-aligned sampling grid in a slice plane.
///
/// Sample `(i, j)` sits at `origin + (i * dx, j * dy)`; samples are cell
/// centres for rasterisation and lattice nodes for iso-contouring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub origin: Point2,
    pub dx: f64,
    pub dy: f64,
    pub width: usize,
    pub height: usize,
}

impl Grid {
    #[must_use]
    pub fn new(origin: Point2, dx: f64, dy: f64, width: usize, height: usize) -> Self {
        Self {
            origin,
            dx,
            dy,
            width,
            height,
        }
    }

    /// Smallest grid of the given spacing covering `bounds` grown by `pad`
    /// on every side.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn covering(bounds: &Aabb2, dx: f64, dy: f64, pad: f64) -> Self {
        let b = bounds.expanded(pad.max(0.0));
        let width = (b.width() / dx).ceil().max(0.0) as usize + 1;
        let height = (b.height() / dy).ceil().max(0.0) as usize + 1;
        Self::new(b.min, dx, dy, width, height)
    }

    /// Number of samples.
    #[must_use]
    pub fn cells(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Row-major index of sample `(i, j)`.
    #[must_use]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * self.width + i
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(&self, i: usize, j: usize) -> Point2 {
        Point2::new(
            self.origin.x + i as f64 * self.dx,
            self.origin.y + j as f64 * self.dy,
        )
    }

    /// Maps fractional grid coordinates to world coordinates.
    #[must_use]
    pub fn to_world(&self, gx: f64, gy: f64) -> Point2 {
        Point2::new(self.origin.x + gx * self.dx, self.origin.y + gy * self.dy)
    }

    /// Maps a world point to fractional grid coordinates.
    #[must_use]
    pub fn to_grid(&self, p: &Point2) -> Point2 {
        Point2::new((p.x - self.origin.x) / self.dx, (p.y - self.origin.y) / self.dy)
    }
}
