pub mod affine;
pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;
pub mod slice;

/// 2D point type (in-plane patient coordinates, millimetres).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type (DICOM patient coordinates, millimetres).
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Default tolerance (mm) within which two z values name the same slice.
pub const SLICE_TOL_MM: f64 = 0.5;
