pub mod config;
pub mod error;
pub mod fallback;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod raster;
pub mod store;
pub mod worker;

pub use config::{BooleanOp, EngineConfig, MarginParams, MarginType, PerSideMargins};
pub use error::{Result, RtGeomError};
