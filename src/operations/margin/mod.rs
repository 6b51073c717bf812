mod edt;
mod engine;
mod field;
mod march;

pub use engine::{Margin, MarginMethod, MarginOutcome};
pub use field::{Reach, Stage};
pub use march::extract_loops;
