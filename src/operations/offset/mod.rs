mod buffer;

pub use buffer::{dilate_loops, erode_loops, structuring_polygon, PlanarReach, PolygonBuffer};
