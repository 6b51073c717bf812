//! Signed margin field over a stack of slices.

use crate::error::Result;
use crate::fallback::Deadline;
use crate::math::Vector3;
use crate::raster::{BinaryMask, Grid};

use super::edt::{lower_envelope, planar_transform, NO_SITE};

const REACH_EPS: f64 = 1e-9;

/// Non-negative reach along each half-axis, in mm (LPS patient axes).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reach {
    pub pos_x: f64,
    pub neg_x: f64,
    pub pos_y: f64,
    pub neg_y: f64,
    pub pos_z: f64,
    pub neg_z: f64,
}

impl Reach {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.max_planar() <= 0.0 && self.pos_z <= 0.0 && self.neg_z <= 0.0
    }

    #[must_use]
    pub fn max_planar(&self) -> f64 {
        self.pos_x.max(self.neg_x).max(self.pos_y).max(self.neg_y)
    }

    #[must_use]
    pub fn min_planar(&self) -> f64 {
        self.pos_x.min(self.neg_x).min(self.pos_y).min(self.neg_y)
    }

    /// Reach along the direction of `u`: the half-axis reaches blended by
    /// the squared direction cosines, so a uniform reach stays uniform and a
    /// single-sided reach tapers to zero at right angles.
    #[must_use]
    pub fn radius_along(&self, u: &Vector3) -> f64 {
        let len = u.norm();
        if len == 0.0 {
            return self.max_planar().max(self.pos_z).max(self.neg_z);
        }
        let rx = if u.x >= 0.0 { self.pos_x } else { self.neg_x };
        let ry = if u.y >= 0.0 { self.pos_y } else { self.neg_y };
        let rz = if u.z >= 0.0 { self.pos_z } else { self.neg_z };
        let (cx, cy, cz) = (u.x / len, u.y / len, u.z / len);
        cx * cx * rx + cy * cy * ry + cz * cz * rz
    }
}

/// Whether the field grows the region or shrinks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Grow,
    Shrink,
}

/// Rasterised input for one field computation.
pub struct FieldInput<'a> {
    pub grid: &'a Grid,
    /// z of every slice in the volume, ascending.
    pub slice_z: &'a [f64],
    /// Region mask per volume slice.
    pub masks: &'a [BinaryMask],
    /// Volume slices for which a field is wanted.
    pub outputs: &'a [usize],
}

/// Computes, for each requested slice, a field that is negative exactly on
/// the margin-adjusted region.
///
/// Sites are region pixels when growing and background pixels when
/// shrinking. Each sample finds its nearest site in 3D (exact over the true
/// slice positions), measures the displacement `u` to it, and compares
/// `|u|` less a half-pixel in-plane correction against the reach along `u`.
///
/// # Errors
///
/// Returns a deadline error if the deadline passes.
pub fn margin_field(
    input: &FieldInput<'_>,
    reach: &Reach,
    stage: Stage,
    deadline: &Deadline,
) -> Result<Vec<Vec<f64>>> {
    let grid = input.grid;
    let cells = grid.cells();
    let n_slices = input.slice_z.len();
    let half_pixel = 0.25 * (grid.dx + grid.dy);

    let mut planar = Vec::with_capacity(n_slices);
    for mask in input.masks {
        deadline.check()?;
        let sites: Vec<bool> = match stage {
            Stage::Grow => mask.data.clone(),
            Stage::Shrink => mask.data.iter().map(|&v| !v).collect(),
        };
        planar.push(planar_transform(&sites, grid.width, grid.height, grid.dx, grid.dy));
    }

    // Through-plane pass, one column of samples at a time.
    let mut nearest_slice = vec![vec![usize::MAX; cells]; input.outputs.len()];
    let mut f = vec![0.0; n_slices];
    let mut d = vec![0.0; n_slices];
    let mut arg = vec![0_usize; n_slices];
    for p in 0..cells {
        if p % grid.width.max(1) == 0 {
            deadline.check()?;
        }
        for (k, t) in planar.iter().enumerate() {
            f[k] = t.sq_dist[p];
        }
        lower_envelope(input.slice_z, &f, &mut d, &mut arg);
        for (o, &k) in input.outputs.iter().enumerate() {
            nearest_slice[o][p] = arg[k];
        }
    }

    // Inside (grow) or background (shrink) samples only need a sign.
    let settled = match stage {
        Stage::Grow => -half_pixel - reach.min_planar(),
        Stage::Shrink => half_pixel + reach.min_planar(),
    };

    let mut fields = Vec::with_capacity(input.outputs.len());
    for (o, &k) in input.outputs.iter().enumerate() {
        deadline.check()?;
        let z = input.slice_z[k];
        let mask = &input.masks[k];
        let mut values = vec![0.0; cells];
        for j in 0..grid.height {
            for i in 0..grid.width {
                let p = grid.index(i, j);
                let in_region = mask.data[p];
                let is_site = match stage {
                    Stage::Grow => in_region,
                    Stage::Shrink => !in_region,
                };
                if is_site {
                    values[p] = settled;
                    continue;
                }
                let src = nearest_slice[o][p];
                let site = if src == usize::MAX {
                    NO_SITE
                } else {
                    planar[src].site[p]
                };
                if site == NO_SITE {
                    values[p] = match stage {
                        Stage::Grow => f64::MAX,
                        Stage::Shrink => f64::MIN,
                    };
                    continue;
                }
                let site = site as usize;
                let here = grid.sample(i, j);
                let there = grid.sample(site % grid.width, site / grid.width);
                // Displacement from the region toward the sample when growing,
                // from the sample toward the background when shrinking.
                let toward_sample = Vector3::new(here.x - there.x, here.y - there.y, z - input.slice_z[src]);
                let u = match stage {
                    Stage::Grow => toward_sample,
                    Stage::Shrink => -toward_sample,
                };
                let len = u.norm();
                let planar_len = u.x.hypot(u.y);
                let corrected = if len > 0.0 {
                    len - half_pixel * planar_len / len
                } else {
                    0.0
                };
                let m = reach.radius_along(&u);
                values[p] = match stage {
                    // Samples exactly at the reach belong to the grown region.
                    Stage::Grow => corrected - m - REACH_EPS,
                    Stage::Shrink => m - corrected,
                };
            }
        }
        fields.push(values);
    }
    Ok(fields)
}
