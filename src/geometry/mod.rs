pub mod contour;
pub mod structure;

pub use contour::{Contour, ContourData};
pub use structure::Structure;
