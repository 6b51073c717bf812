use tracing::{debug, warn};

use crate::config::{BooleanOp, EngineConfig};
use crate::error::Result;
use crate::fallback::Deadline;
use crate::geometry::Contour;
use crate::math::slice::{cluster_positions, same_slice};
use crate::math::Point2;

use super::engine::{boolean_execute, OutcomeStatus};

/// Result of combining two whole structures.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureOutcome {
    /// Replacement contour list for the subject, ordered by slice.
    pub contours: Vec<Contour>,
    /// Slices where the subject's loops were kept because clipping failed.
    pub unchanged_slices: Vec<f64>,
}

/// Applies a boolean operation slice by slice to two contour stacks.
///
/// Slices are matched by tolerance. A slice the clipper cannot handle keeps
/// the subject's loops, so the outcome never loses subject contours to an
/// internal failure.
pub struct StructureBoolean<'a> {
    op: BooleanOp,
    a: &'a [Contour],
    b: &'a [Contour],
    config: EngineConfig,
    deadline: Deadline,
}

impl<'a> StructureBoolean<'a> {
    #[must_use]
    pub fn new(op: BooleanOp, a: &'a [Contour], b: &'a [Contour]) -> Self {
        Self {
            op,
            a,
            b,
            config: EngineConfig::default(),
            deadline: Deadline::none(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// # Errors
    ///
    /// Propagates non-recoverable errors only, including deadline expiry.
    pub fn execute(&self) -> Result<StructureOutcome> {
        let tol = self.config.slice_tol_mm;
        let slices = cluster_positions(self.a.iter().chain(self.b).map(|c| c.z), tol);
        debug!(op = %self.op, slices = slices.len(), "structure boolean");

        let mut contours = Vec::new();
        let mut unchanged_slices = Vec::new();
        for z in slices {
            self.deadline.check()?;
            let a = loops_at(self.a, z, tol);
            let b = loops_at(self.b, z, tol);
            if !self.op.keeps_slice(!a.is_empty(), !b.is_empty()) {
                continue;
            }
            // Keep the subject's own z when it has this slice.
            let out_z = self
                .a
                .iter()
                .chain(self.b)
                .find(|c| same_slice(c.z, z, tol))
                .map_or(z, |c| c.z);

            let loops = match boolean_execute(&a, &b, self.op, &self.config) {
                Ok(outcome) => {
                    if outcome.status == OutcomeStatus::Unchanged {
                        unchanged_slices.push(out_z);
                    }
                    outcome.loops
                }
                Err(err) if err.is_recoverable() => {
                    warn!(z = out_z, error = %err, "slice boolean failed, keeping subject");
                    unchanged_slices.push(out_z);
                    a
                }
                Err(err) => return Err(err),
            };
            contours.extend(
                loops
                    .into_iter()
                    .map(|points| Contour::from_points(points, out_z))
                    .filter(Contour::is_valid),
            );
        }
        Ok(StructureOutcome {
            contours,
            unchanged_slices,
        })
    }
}

fn loops_at(contours: &[Contour], z: f64, tol: f64) -> Vec<Vec<Point2>> {
    contours
        .iter()
        .filter(|c| same_slice(c.z, z, tol))
        .map(|c| c.points.clone())
        .collect()
}
