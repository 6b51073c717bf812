mod contours;
mod moore;

pub use contours::MaskToContours;
pub use moore::{MaskTracer, PixelLoop};
