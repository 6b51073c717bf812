mod clipper;
mod engine;
mod intersect_op;
mod select;
mod structure;
mod subtract;
mod union;

pub use crate::config::BooleanOp;
pub use engine::{boolean_execute, BooleanOutcome, OutcomeStatus};
pub use intersect_op::Intersect;
pub use structure::{StructureBoolean, StructureOutcome};
pub use subtract::Subtract;
pub use union::{union_all, Union};

pub(crate) use clipper::{overlay, self_union, FixedPrecision};
