use super::{BinaryMask, Grid};
use crate::math::Point2;

/// Rasterises loops onto `grid` under the non-zero winding rule.
///
/// A sample is set when its centre has non-zero winding number with respect
/// to the loop set, so overlapping loops of the same orientation union and
/// oppositely wound inner loops cut holes. Samples exactly on a left edge
/// are inside, on a right edge outside.
#[must_use]
pub fn rasterize_loops(loops: &[Vec<Point2>], grid: &Grid) -> BinaryMask {
    let mut mask = BinaryMask::new(grid.width, grid.height);
    let mut crossings: Vec<(f64, i32)> = Vec::new();

    for j in 0..grid.height {
        let y = grid.sample(0, j).y;
        crossings.clear();
        for l in loops.iter().filter(|l| l.len() >= 3) {
            let n = l.len();
            for k in 0..n {
                let a = &l[k];
                let b = &l[(k + 1) % n];
                // Half-open in y so shared vertices count once.
                let (winding, lo, hi) = if a.y <= y && b.y > y {
                    (1, a, b)
                } else if b.y <= y && a.y > y {
                    (-1, b, a)
                } else {
                    continue;
                };
                let x = lo.x + (y - lo.y) * (hi.x - lo.x) / (hi.y - lo.y);
                crossings.push((x, winding));
            }
        }
        if crossings.is_empty() {
            continue;
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding != 0 {
                fill_span(&mut mask, grid, j, pair[0].0, pair[1].0);
            }
        }
    }
    mask
}

/// Sets samples of row `j` whose centre x lies in `[x0, x1)`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn fill_span(mask: &mut BinaryMask, grid: &Grid, j: usize, x0: f64, x1: f64) {
    let first = ((x0 - grid.origin.x) / grid.dx).ceil().max(0.0);
    let end = ((x1 - grid.origin.x) / grid.dx).ceil().min(grid.width as f64);
    if end <= first {
        return;
    }
    for i in first as usize..end as usize {
        mask.set(i, j, true);
    }
}
