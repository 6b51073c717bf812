use tracing::{debug, info};

use crate::config::{EngineConfig, MarginParams, PerSideMargins};
use crate::error::{OperationError, Result};
use crate::fallback::{with_fallback, Deadline, Provenance};
use crate::geometry::Contour;
use crate::math::polygon_2d::{area, normalize_orientation, Aabb2};
use crate::math::slice::{cluster_positions, median_spacing, same_slice};
use crate::math::Point2;
use crate::operations::offset::PolygonBuffer;
use crate::raster::{rasterize_loops, BinaryMask, Grid};

use super::field::{margin_field, FieldInput, Reach, Stage};
use super::march::extract_loops;

/// Margins within this distance of zero are treated as zero.
const MARGIN_EPS: f64 = 1e-9;

/// Extra grid samples around the reach so the boundary never touches the
/// grid edge.
const PAD_SAMPLES: f64 = 2.0;

/// Which algorithm produced a margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginMethod {
    DistanceField,
    PolygonBuffer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarginOutcome {
    pub contours: Vec<Contour>,
    pub method: MarginMethod,
}

/// Grows or shrinks a structure by a (possibly direction-dependent) margin.
///
/// The primary method evaluates a 3D distance field on a regular grid; if
/// that grid would exceed the configured cell budget, or the field stage
/// fails for another recoverable reason, the stack is buffered per slice
/// with polygons instead (through-plane margins are then ignored).
///
/// Positive margins grow first, negative ones shrink afterwards.
pub struct Margin<'a> {
    contours: &'a [Contour],
    params: MarginParams,
    grid_spacing: f64,
    config: EngineConfig,
    deadline: Deadline,
}

impl<'a> Margin<'a> {
    #[must_use]
    pub fn new(contours: &'a [Contour], params: MarginParams) -> Self {
        Self {
            contours,
            params,
            grid_spacing: 1.0,
            config: EngineConfig::default(),
            deadline: Deadline::none(),
        }
    }

    /// In-plane spacing of the working grid, mm.
    #[must_use]
    pub fn with_grid_spacing(mut self, mm: f64) -> Self {
        self.grid_spacing = mm;
        self
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
    /// Returns `OperationError::InvalidInput` for non-finite margins or a
    /// non-positive grid spacing, and deadline or cancellation errors
    /// unchanged.
    pub fn execute(&self) -> Result<MarginOutcome> {
        let margins = self.params.per_side();
        if margins.to_axes().iter().any(|v| !v.is_finite()) {
            return Err(OperationError::InvalidInput(format!("non-finite margin: {margins:?}")).into());
        }
        if !(self.grid_spacing.is_finite() && self.grid_spacing > 0.0) {
            return Err(OperationError::InvalidInput(format!(
                "grid spacing must be positive, got {}",
                self.grid_spacing
            ))
            .into());
        }
        if self.contours.is_empty() || margins.to_axes().iter().all(|v| v.abs() <= MARGIN_EPS) {
            return Ok(MarginOutcome {
                contours: self.contours.to_vec(),
                method: MarginMethod::DistanceField,
            });
        }

        debug!(margin_type = %self.params.margin_type(), ?margins, "margin");
        let attempt = with_fallback(
            || self.distance_field(&margins),
            || {
                PolygonBuffer::new(self.contours, margins)
                    .with_config(self.config)
                    .with_deadline(self.deadline.clone())
                    .execute()
            },
        )?;
        let method = match attempt.provenance {
            Provenance::Primary => MarginMethod::DistanceField,
            Provenance::Fallback => MarginMethod::PolygonBuffer,
        };
        info!(?method, contours = attempt.value.len(), "margin complete");
        Ok(MarginOutcome {
            contours: attempt.value,
            method,
        })
    }

    fn distance_field(&self, margins: &PerSideMargins) -> Result<Vec<Contour>> {
        let [left, right, post, ant, sup, inf] = margins.to_axes();
        let grow = Reach {
            pos_x: left.max(0.0),
            neg_x: right.max(0.0),
            pos_y: post.max(0.0),
            neg_y: ant.max(0.0),
            pos_z: sup.max(0.0),
            neg_z: inf.max(0.0),
        };
        let shrink = Reach {
            pos_x: (-left).max(0.0),
            neg_x: (-right).max(0.0),
            pos_y: (-post).max(0.0),
            neg_y: (-ant).max(0.0),
            pos_z: (-sup).max(0.0),
            neg_z: (-inf).max(0.0),
        };

        let mut current = self.contours.to_vec();
        if !grow.is_zero() {
            current = self.run_stage(&current, &grow, Stage::Grow)?;
        }
        if !shrink.is_zero() && !current.is_empty() {
            current = self.run_stage(&current, &shrink, Stage::Shrink)?;
        }
        Ok(current)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn run_stage(&self, contours: &[Contour], reach: &Reach, stage: Stage) -> Result<Vec<Contour>> {
        let tol = self.config.slice_tol_mm;
        let slices = cluster_positions(contours.iter().map(|c| c.z), tol);
        let Some(bounds) = contours
            .iter()
            .filter_map(Contour::aabb)
            .reduce(|a, b| a.union(&b))
        else {
            return Ok(Vec::new());
        };
        let spacing = median_spacing(&slices)
            .filter(|s| *s > tol)
            .unwrap_or(self.config.default_slice_thickness_mm);

        // Extra slices: the reach beyond the stack when growing, one empty
        // slice on each side when shrinking.
        let (below, above) = match stage {
            Stage::Grow => (
                (reach.neg_z / spacing).ceil() as usize,
                (reach.pos_z / spacing).ceil() as usize,
            ),
            Stage::Shrink => (1, 1),
        };
        let (first, last) = match (slices.first(), slices.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return Ok(Vec::new()),
        };
        let mut volume_z: Vec<f64> = (1..=below).rev().map(|k| first - k as f64 * spacing).collect();
        volume_z.extend(&slices);
        volume_z.extend((1..=above).map(|k| last + k as f64 * spacing));

        let g = self.grid_spacing;
        let pad = match stage {
            Stage::Grow => reach.max_planar(),
            Stage::Shrink => 0.0,
        } + PAD_SAMPLES * g;
        let grid = covering_grid(&bounds, g, pad);
        let cells = grid.cells().saturating_mul(volume_z.len());
        if cells > self.config.max_grid_cells {
            return Err(OperationError::GridTooLarge {
                cells,
                limit: self.config.max_grid_cells,
            }
            .into());
        }
        debug!(
            ?stage,
            width = grid.width,
            height = grid.height,
            slices = volume_z.len(),
            "margin field stage"
        );

        let masks: Vec<BinaryMask> = volume_z
            .iter()
            .map(|&z| {
                let loops: Vec<Vec<Point2>> = contours
                    .iter()
                    .filter(|c| same_slice(c.z, z, tol))
                    .map(|c| c.points.clone())
                    .collect();
                rasterize_loops(&normalize_orientation(&loops), &grid)
            })
            .collect();
        let outputs: Vec<usize> = match stage {
            Stage::Grow => (0..volume_z.len()).collect(),
            Stage::Shrink => (1..volume_z.len() - 1).collect(),
        };
        let input = FieldInput {
            grid: &grid,
            slice_z: &volume_z,
            masks: &masks,
            outputs: &outputs,
        };
        let fields = margin_field(&input, reach, stage, &self.deadline)?;

        let mut out = Vec::new();
        for (&k, values) in outputs.iter().zip(&fields) {
            self.deadline.check()?;
            let z = volume_z[k];
            let out_z = contours
                .iter()
                .find(|c| same_slice(c.z, z, tol))
                .map_or(z, |c| c.z);
            out.extend(
                extract_loops(values, &grid)
                    .into_iter()
                    .filter(|l| area(l) >= self.config.min_loop_area_mm2)
                    .map(|points| Contour::from_points(points, out_z))
                    .filter(Contour::is_valid),
            );
        }
        Ok(out)
    }
}

/// Grid whose samples are aligned to multiples of `spacing`, so repeated
/// stages sample the same lattice.
fn covering_grid(bounds: &Aabb2, spacing: f64, pad: f64) -> Grid {
    let padded = bounds.expanded(pad);
    let snapped = Aabb2 {
        min: Point2::new(
            (padded.min.x / spacing).floor() * spacing,
            (padded.min.y / spacing).floor() * spacing,
        ),
        max: padded.max,
    };
    Grid::covering(&snapped, spacing, spacing, 0.0)
}
