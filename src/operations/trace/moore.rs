//! Moore-neighbourhood boundary following over a binary mask.

use tracing::warn;

use crate::math::polygon_2d::signed_area;
use crate::math::Point2;
use crate::raster::BinaryMask;

/// Neighbour offsets in raster coordinates (row axis pointing down),
/// clockwise on screen starting east.
const DIRS: [(isize, isize); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const WEST: usize = 4;

/// Closed boundary of one component, as pixel centres `(column, row)` in
/// tracing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelLoop {
    pub pixels: Vec<(usize, usize)>,
}

impl PixelLoop {
    /// Pixel centres as points `(column, row)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_points(&self) -> Vec<Point2> {
        self.pixels
            .iter()
            .map(|&(c, r)| Point2::new(c as f64, r as f64))
            .collect()
    }

    /// Area enclosed by the pixel-centre polygon, in square pixels.
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.to_points()).abs()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

fn dir_index(dx: isize, dy: isize) -> Option<usize> {
    DIRS.iter().position(|&d| d == (dx, dy))
}

/// Traces external boundaries of the foreground of a mask.
pub struct MaskTracer<'a> {
    mask: &'a BinaryMask,
}

impl<'a> MaskTracer<'a> {
    #[must_use]
    pub fn new(mask: &'a BinaryMask) -> Self {
        Self { mask }
    }

    /// Safety bound on tracing steps.
    fn max_steps(&self) -> usize {
        (self.mask.width + 2)
            .saturating_mul(self.mask.height + 2)
            .saturating_mul(4)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn fg(&self, x: usize, y: usize, d: usize) -> bool {
        let (dx, dy) = DIRS[d];
        self.mask.get(x as isize + dx, y as isize + dy)
    }

    /// Follows the boundary through `start`, which must be a foreground
    /// pixel with a background 4-neighbour.
    ///
    /// Stops when the start pixel is re-entered from the same side it was
    /// first left (Jacob's criterion). Returns `None` for a background or
    /// interior start, or when the step bound is hit.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn trace_from(&self, start: (usize, usize)) -> Option<PixelLoop> {
        let (sx, sy) = start;
        if sx >= self.mask.width || sy >= self.mask.height || !self.mask.get(sx as isize, sy as isize) {
            return None;
        }
        // Backtrack: a background 4-neighbour, west first.
        let first_back = [WEST, 6, 0, 2].into_iter().find(|&d| !self.fg(sx, sy, d))?;

        let mut pixels = vec![start];
        let (mut x, mut y) = start;
        let mut back = first_back;
        let mut initial: Option<((usize, usize), usize)> = None;

        for _ in 0..self.max_steps() {
            let mut moved = None;
            for k in 1..=8 {
                let d = (back + k) % 8;
                if self.fg(x, y, d) {
                    let (dx, dy) = DIRS[d];
                    let (nx, ny) = ((x as isize + dx) as usize, (y as isize + dy) as usize);
                    // New backtrack: the last background neighbour checked,
                    // seen from the pixel just reached.
                    let (px, py) = DIRS[(back + k - 1) % 8];
                    let nb = dir_index(x as isize + px - nx as isize, y as isize + py - ny as isize)?;
                    moved = Some(((nx, ny), nb));
                    break;
                }
            }
            let Some((next, nb)) = moved else {
                // Isolated pixel.
                return Some(PixelLoop { pixels });
            };
            match initial {
                None => initial = Some((next, nb)),
                Some(first) if (x, y) == start && (next, nb) == first => {
                    pixels.pop();
                    return Some(PixelLoop { pixels });
                }
                Some(_) => {}
            }
            pixels.push(next);
            (x, y) = next;
            back = nb;
        }
        warn!(?start, "boundary trace hit the step bound");
        None
    }

    /// External boundary of every 8-connected component, in raster order of
    /// each component's first pixel.
    #[must_use]
    pub fn trace_all(&self) -> Vec<PixelLoop> {
        let (labels, sizes) = self.mask.label_components();
        let mut seen = vec![false; sizes.len()];
        let mut loops = Vec::with_capacity(sizes.len());
        for (idx, &label) in labels.iter().enumerate() {
            if label == 0 {
                continue;
            }
            let slot = label as usize - 1;
            if seen[slot] {
                continue;
            }
            seen[slot] = true;
            let start = (idx % self.mask.width, idx / self.mask.width);
            if let Some(l) = self.trace_from(start) {
                loops.push(l);
            }
        }
        loops
    }

    /// The external boundary enclosing the largest area.
    #[must_use]
    pub fn trace_largest(&self) -> Option<PixelLoop> {
        self.trace_all()
            .into_iter()
            .map(|l| (l.area(), l))
            .reduce(|best, cur| if cur.0 > best.0 { cur } else { best })
            .map(|(_, l)| l)
    }
}
