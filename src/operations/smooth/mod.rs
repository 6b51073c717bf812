mod average;
mod rdp;

pub use average::smooth_loop;
pub use rdp::simplify_loop;
