//! Resampled robust center and spread of one dimension's values.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::ZScoreConfig;
use crate::math::{half_sample_mode, iqr_sigma_sorted, mad_left_sorted, median_f32_mut, median_sorted};

/// Spreads below this are raised to it.
pub(crate) const MIN_SPREAD: f32 = 1e-6;

/// Fewer local extrema than this and every value is used instead.
const MIN_EXTREMA: usize = 8;

/// Norm to roughly normal transform for positive, right-skewed values.
#[inline]
pub(crate) fn deskew(x: f32) -> f32 {
    (x * x).cbrt()
}

/// Values that are local extrema of the sequence (interior points only).
///
/// Signed values keep maxima and minima, positive values only maxima.
pub(super) fn local_extrema(values: &[f32], signed: bool) -> Vec<f32> {
    let extrema: Vec<f32> = values
        .windows(3)
        .filter(|w| {
            let is_max = w[1] > w[0] && w[1] >= w[2];
            let is_min = w[1] < w[0] && w[1] <= w[2];
            is_max || (signed && is_min)
        })
        .map(|w| w[1])
        .collect();

    if extrema.len() < MIN_EXTREMA {
        values.to_vec()
    } else {
        extrema
    }
}

/// `(center, spread)` of one sorted sample.
///
/// Center blends the median with the half-sample mode; spread blends the
/// left-sided MAD with the IQR, both scaled to a normal sigma.
pub(super) fn estimate_sorted(sorted: &[f32]) -> (f32, f32) {
    let center = 0.5 * (median_sorted(sorted) + half_sample_mode(sorted));
    let spread = 0.5 * (mad_left_sorted(sorted, center) + iqr_sigma_sorted(sorted));
    (center, spread)
}

/// Median of the per-resample estimates.
///
/// Each resample draws `resampling_size` values without replacement; a size
/// of 0 or one covering every value degenerates to a single estimate.
pub(super) fn resampled_estimate(
    values: &[f32],
    config: &ZScoreConfig,
    rng: &mut ChaCha8Rng,
) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 1.0);
    }

    let size = config.resampling_size;
    if config.num_resamplings == 0 || size == 0 || size >= values.len() {
        let mut sorted = values.to_vec();
        sorted.sort_by(f32::total_cmp);
        let (center, spread) = estimate_sorted(&sorted);
        return (center, spread.max(MIN_SPREAD));
    }

    let mut centers = Vec::with_capacity(config.num_resamplings);
    let mut spreads = Vec::with_capacity(config.num_resamplings);
    let mut sample = Vec::with_capacity(size);
    for _ in 0..config.num_resamplings {
        sample.clear();
        sample.extend(
            rand::seq::index::sample(rng, values.len(), size)
                .iter()
                .map(|i| values[i]),
        );
        sample.sort_by(f32::total_cmp);
        let (center, spread) = estimate_sorted(&sample);
        centers.push(center);
        spreads.push(spread);
    }

    let center = median_f32_mut(&mut centers);
    let spread = median_f32_mut(&mut spreads);
    (center, spread.max(MIN_SPREAD))
}

/// Seed for a dimension's private generator.
#[inline]
pub(super) fn draw_seed<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.random()
}
