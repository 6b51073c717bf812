pub mod blob;
pub mod boolean;
pub mod interpolate;
pub mod margin;
pub mod offset;
pub mod query;
pub mod smooth;
pub mod trace;
