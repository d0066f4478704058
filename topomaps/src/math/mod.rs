//! Robust statistics used by the centroid and Z-score estimators.


/// MAD (Median Absolute Deviation) to standard deviation conversion factor.
///
/// For a normal distribution, σ ≈ 1.4826 × MAD.
/// This is the exact value: 1 / Φ⁻¹(3/4) where Φ⁻¹ is the inverse CDF.
pub const MAD_TO_SIGMA: f32 = 1.4826022;

/// Interquartile range to standard deviation conversion factor.
///
/// For a normal distribution, IQR = 2 Φ⁻¹(3/4) σ ≈ 1.34898 σ.
pub const IQR_TO_SIGMA: f32 = 1.0 / 1.348_979_5;

/// Convert MAD to standard deviation (assuming normal distribution).
#[inline]
pub fn mad_to_sigma(mad: f32) -> f32 {
    mad * MAD_TO_SIGMA
}

/// Calculate the median of f32 values in-place.
///
/// Mutates the input buffer (partial sort via quickselect).
#[inline]
pub fn median_f32_mut(data: &mut [f32]) -> f32 {
    debug_assert!(!data.is_empty());

    let len = data.len();
    let mid = len / 2;

    if len & 1 == 1 {
        let (_, median, _) = data.select_nth_unstable_by(mid, f32::total_cmp);
        *median
    } else {
        let (left_part, right_median, _) = data.select_nth_unstable_by(mid, f32::total_cmp);
        let right = *right_median;
        let left = left_part
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        (left + right) * 0.5
    }
}

/// Median of an already sorted slice. Empty input gives 0.
#[inline]
pub fn median_sorted(sorted: &[f32]) -> f32 {
    quantile_sorted(sorted, 0.5)
}

/// Linearly interpolated quantile of a sorted slice, `p` in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f32], p: f32) -> f32 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let pos = p.clamp(0.0, 1.0) * (len - 1) as f32;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(len - 1);
            let frac = pos - lo as f32;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Half-sample mode (Bickel & Frühwirth) of a sorted slice.
///
/// Repeatedly keeps the narrowest window holding half of the remaining
/// values, converging on the densest region: a robust max-mode estimate.
pub fn half_sample_mode(sorted: &[f32]) -> f32 {
    let mut window = sorted;

    loop {
        match window.len() {
            0 => return 0.0,
            1 => return window[0],
            2 => return (window[0] + window[1]) * 0.5,
            3 => {
                let left = window[1] - window[0];
                let right = window[2] - window[1];
                return if left < right {
                    (window[0] + window[1]) * 0.5
                } else if left > right {
                    (window[1] + window[2]) * 0.5
                } else {
                    window[1]
                };
            }
            len => {
                let half = len.div_ceil(2);
                let mut best_start = 0;
                let mut best_width = f32::INFINITY;
                for start in 0..=len - half {
                    let width = window[start + half - 1] - window[start];
                    if width < best_width {
                        best_width = width;
                        best_start = start;
                    }
                }
                window = &window[best_start..best_start + half];
            }
        }
    }
}

/// Left-sided MAD of a sorted slice around `center`, scaled to a sigma.
///
/// Only values below the center contribute, which keeps a heavy right tail
/// from inflating the spread.
pub fn mad_left_sorted(sorted: &[f32], center: f32) -> f32 {
    let below = sorted.partition_point(|&v| v <= center);
    if below == 0 {
        return 0.0;
    }
    // Deviations of the left part are in decreasing order of the values.
    let mut deviations: Vec<f32> = sorted[..below].iter().map(|&v| center - v).collect();
    deviations.reverse();
    mad_to_sigma(median_sorted(&deviations))
}

/// Interquartile range of a sorted slice, scaled to a sigma.
#[inline]
pub fn iqr_sigma_sorted(sorted: &[f32]) -> f32 {
    (quantile_sorted(sorted, 0.75) - quantile_sorted(sorted, 0.25)) * IQR_TO_SIGMA
}

/// 1-based ranks with ties sharing their average rank.
pub fn average_ranks(values: &[f32]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0f64; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end (0-based) share rank mean(start+1 ..= end).
        let rank = (start + 1 + end) as f64 * 0.5;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}
