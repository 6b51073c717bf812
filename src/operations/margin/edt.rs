//! Exact squared Euclidean distance transforms with nearest-site tracking
//! (Felzenszwalb & Huttenlocher lower envelope of parabolas).
//!
//! Sample positions need not be uniform, so the same 1D pass serves the
//! in-plane axes and the slice axis.

/// Marks "no site reachable".
pub(crate) const NO_SITE: u32 = u32::MAX;

/// One 1D pass: for every sample `i`, the minimum over `q` of
/// `(pos[i] - pos[q])^2 + f[q]` and the minimising `q`.
///
/// Infinite `f[q]` entries are not sites. When no finite entry exists every
/// output is infinite with argument `usize::MAX`.
pub(crate) fn lower_envelope(pos: &[f64], f: &[f64], d: &mut [f64], arg: &mut [usize]) {
    let n = pos.len();
    let mut v: Vec<usize> = Vec::with_capacity(n);
    let mut z: Vec<f64> = Vec::with_capacity(n + 1);

    for q in 0..n {
        if !f[q].is_finite() {
            continue;
        }
        let fq = f[q] + pos[q] * pos[q];
        loop {
            let Some(&p) = v.last() else {
                break;
            };
            let s = (fq - (f[p] + pos[p] * pos[p])) / (2.0 * (pos[q] - pos[p]));
            // `z` holds the left boundary of each parabola in `v`.
            if z.last().is_some_and(|&zl| s <= zl) {
                v.pop();
                z.pop();
            } else {
                v.push(q);
                z.push(s);
                break;
            }
        }
        if v.is_empty() {
            v.push(q);
            z.push(f64::NEG_INFINITY);
        }
    }

    if v.is_empty() {
        d.fill(f64::INFINITY);
        arg.fill(usize::MAX);
        return;
    }

    let mut k = 0;
    for i in 0..n {
        while k + 1 < v.len() && z[k + 1] < pos[i] {
            k += 1;
        }
        let p = v[k];
        let dp = pos[i] - pos[p];
        d[i] = dp * dp + f[p];
        arg[i] = p;
    }
}

/// Squared in-plane distance to the nearest site of one slice, with the
/// flat index of that site ([`NO_SITE`] when the slice has none).
#[derive(Debug, Clone)]
pub(crate) struct PlanarTransform {
    pub sq_dist: Vec<f64>,
    pub site: Vec<u32>,
}

/// 2D transform of a `width x height` site mask with sample spacing
/// `dx`, `dy`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub(crate) fn planar_transform(
    sites: &[bool],
    width: usize,
    height: usize,
    dx: f64,
    dy: f64,
) -> PlanarTransform {
    let xs: Vec<f64> = (0..width).map(|i| i as f64 * dx).collect();
    let ys: Vec<f64> = (0..height).map(|j| j as f64 * dy).collect();

    // Pass 1: along rows.
    let mut row_d = vec![f64::INFINITY; width * height];
    let mut row_arg = vec![usize::MAX; width * height];
    let mut f = vec![0.0; width];
    for j in 0..height {
        let row = j * width..(j + 1) * width;
        for (fi, &s) in f.iter_mut().zip(&sites[row.clone()]) {
            *fi = if s { 0.0 } else { f64::INFINITY };
        }
        lower_envelope(&xs, &f, &mut row_d[row.clone()], &mut row_arg[row]);
    }

    // Pass 2: along columns.
    let mut sq_dist = vec![f64::INFINITY; width * height];
    let mut site = vec![NO_SITE; width * height];
    let mut col_f = vec![0.0; height];
    let mut col_d = vec![0.0; height];
    let mut col_arg = vec![0_usize; height];
    for i in 0..width {
        for j in 0..height {
            col_f[j] = row_d[j * width + i];
        }
        lower_envelope(&ys, &col_f, &mut col_d, &mut col_arg);
        for j in 0..height {
            let idx = j * width + i;
            sq_dist[idx] = col_d[j];
            let src_row = col_arg[j];
            if src_row != usize::MAX {
                let src_col = row_arg[src_row * width + i];
                site[idx] = (src_row * width + src_col) as u32;
            }
        }
    }
    PlanarTransform { sq_dist, site }
}
