use crate::error::{OperationError, Result};

/// 8-connected neighbour offsets.
const NEIGHBOURS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Dense binary raster, row-major, `true` = foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    /// Builds a mask from bytes; any non-zero byte is foreground.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if `bytes` does not hold
    /// exactly `width * height` values.
    pub fn from_u8(width: usize, height: usize, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != width * height {
            return Err(OperationError::InvalidInput(format!(
                "mask of {width}x{height} needs {} bytes, got {}",
                width * height,
                bytes.len()
            ))
            .into());
        }
        Ok(Self {
            width,
            height,
            data: bytes.iter().map(|&b| b != 0).collect(),
        })
    }

    /// Pixel value; out-of-range coordinates read as background.
    #[must_use]
    pub fn get(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        #[allow(clippy::cast_sign_loss)]
        let (x, y) = (x as usize, y as usize);
        x < self.width && y < self.height && self.data[y * self.width + x]
    }

    /// Sets a pixel; out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Labels 8-connected foreground components.
    ///
    /// Returns per-pixel labels (0 = background, components numbered from 1
    /// in raster order of their first pixel) and the pixel count of each
    /// component, indexed by `label - 1`.
    #[must_use]
    pub fn label_components(&self) -> (Vec<u32>, Vec<usize>) {
        let mut labels = vec![0_u32; self.data.len()];
        let mut sizes = Vec::new();
        let mut stack = Vec::new();

        for start in 0..self.data.len() {
            if !self.data[start] || labels[start] != 0 {
                continue;
            }
            sizes.push(0);
            let label = u32::try_from(sizes.len()).unwrap_or(u32::MAX);
            labels[start] = label;
            stack.push(start);
            while let Some(idx) = stack.pop() {
                if let Some(size) = sizes.last_mut() {
                    *size += 1;
                }
                let (x, y) = (idx % self.width, idx / self.width);
                for (ox, oy) in NEIGHBOURS_8 {
                    let (Some(nx), Some(ny)) = (x.checked_add_signed(ox), y.checked_add_signed(oy))
                    else {
                        continue;
                    };
                    if nx >= self.width || ny >= self.height {
                        continue;
                    }
                    let n = ny * self.width + nx;
                    if self.data[n] && labels[n] == 0 {
                        labels[n] = label;
                        stack.push(n);
                    }
                }
            }
        }
        (labels, sizes)
    }

    /// Clears every component smaller than `min_pixels`. Returns the number
    /// of components removed.
    pub fn remove_small_components(&mut self, min_pixels: usize) -> usize {
        let (labels, sizes) = self.label_components();
        let removed = sizes.iter().filter(|&&s| s < min_pixels).count();
        if removed == 0 {
            return 0;
        }
        for (v, &label) in self.data.iter_mut().zip(&labels) {
            if label != 0 && sizes[label as usize - 1] < min_pixels {
                *v = false;
            }
        }
        removed
    }

    /// Keeps only the largest component (the earliest one on ties).
    pub fn keep_largest_component(&mut self) {
        let (labels, sizes) = self.label_components();
        let Some(largest) = sizes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i + 1)
        else {
            return;
        };
        for (v, &label) in self.data.iter_mut().zip(&labels) {
            *v = label as usize == largest;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mask(rows: &[&str]) -> BinaryMask {
        let width = rows[0].len();
        let bytes: Vec<u8> = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| u8::from(b == b'#')))
            .collect();
        BinaryMask::from_u8(width, rows.len(), &bytes).unwrap()
    }

    #[test]
    fn size_mismatch_is_rejected() {
        assert!(BinaryMask::from_u8(3, 3, &[1, 0]).is_err());
    }

    #[test]
    fn diagonal_pixels_are_connected() {
        let m = mask(&["#...", ".#..", "...#", "...#"]);
        let (_, sizes) = m.label_components();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[test]
    fn small_components_are_removed() {
        let mut m = mask(&["##..#", "##...", ".....", "...##"]);
        assert_eq!(m.remove_small_components(3), 2);
        assert_eq!(m.count(), 4);
        assert!(m.get(0, 0));
        assert!(!m.get(4, 0));
        assert!(!m.get(-1, 0));
    }

    #[test]
    fn keep_largest() {
        let mut m = mask(&["#...##", "....##", "....##"]);
        m.keep_largest_component();
        assert_eq!(m.count(), 6);
        assert!(!m.get(0, 0));
    }
}
