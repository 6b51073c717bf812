//! Regular grids and binary masks in a slice plane.

mod grid;
mod mask;
mod scanline;

pub use grid::Grid;
pub use mask::BinaryMask;
pub use scanline::rasterize_loops;
