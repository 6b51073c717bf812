mod resample;
mod slices;

pub use resample::{interpolate_loops, resample_loop};
pub use slices::{InterpolationOutcome, SliceInterpolator};
