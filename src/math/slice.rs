//! Slice-position bookkeeping.
//!
//! Slice z values drift through storage round-trips, so they are compared
//! with a tolerance and clustered instead of matched exactly.

/// Returns `true` if two z values name the same slice.
#[must_use]
pub fn same_slice(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Clusters z values into sorted, unique slice positions.
///
/// Consecutive sorted values within `tol` of the cluster's first member join
/// the cluster; each cluster is represented by its mean. Non-finite values
/// are ignored.
#[must_use]
pub fn cluster_positions<I>(zs: I, tol: f64) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted: Vec<f64> = zs.into_iter().filter(|z| z.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let mut clusters: Vec<f64> = Vec::new();
    let mut start = f64::NAN;
    let mut sum = 0.0;
    let mut count = 0_u32;
    for z in sorted {
        if count > 0 && z - start <= tol {
            sum += z;
            count += 1;
            continue;
        }
        if count > 0 {
            clusters.push(sum / f64::from(count));
        }
        start = z;
        sum = z;
        count = 1;
    }
    if count > 0 {
        clusters.push(sum / f64::from(count));
    }
    clusters
}

/// Index of the slice position matching `z` within `tol`, if any.
///
/// `slices` must be sorted ascending.
#[must_use]
pub fn slice_index_of(z: f64, slices: &[f64], tol: f64) -> Option<usize> {
    let idx = slices.partition_point(|&s| s < z);
    let mut best: Option<(usize, f64)> = None;
    for candidate in [idx.checked_sub(1), Some(idx)].into_iter().flatten() {
        if let Some(&s) = slices.get(candidate) {
            let d = (s - z).abs();
            if d <= tol && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((candidate, d));
            }
        }
    }
    best.map(|(i, _)| i)
}

/// Median spacing between consecutive slice positions.
#[must_use]
pub fn median_spacing(slices: &[f64]) -> Option<f64> {
    let mut gaps: Vec<f64> = slices.windows(2).map(|w| w[1] - w[0]).collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_by(f64::total_cmp);
    Some(gaps[gaps.len() / 2])
}

/// Thickness attributed to slice `i` for volume estimates: half the distance
/// to each neighbour, or the single neighbour gap at either end.
#[must_use]
pub fn local_thickness(slices: &[f64], i: usize, default_thickness: f64) -> f64 {
    let prev = i.checked_sub(1).and_then(|p| slices.get(p));
    let next = slices.get(i + 1);
    match (prev, next, slices.get(i)) {
        (Some(p), Some(n), Some(_)) => (n - p) * 0.5,
        (Some(p), None, Some(z)) => z - p,
        (None, Some(n), Some(z)) => n - z,
        _ => default_thickness,
    }
}
