//! Correlation variants and the polarity policy shared by every algorithm.


use common::float_ext::FloatExt;
use common::non_null;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::map::MapExt;
use crate::math::average_ranks;
use crate::polarity::{DataType, Polarity, PolarityMode};

/// Kind of correlation between two sample vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum CorrelationType {
    /// Product-moment correlation.
    #[default]
    Pearson,
    /// Pearson correlation of average ranks.
    Spearman,
    /// Angles (radians, first argument) against linear values (second).
    CircularLinear,
    /// Angles against angles. Not supported.
    CircularCircular,
}

/// Correlate two equally sized sample vectors.
///
/// Polarity evaluation applies to the linear variants only; circular-linear
/// correlation is non-negative by construction. Unsupported kinds log a
/// warning and return 0.
pub fn correlate(
    a: &[f32],
    b: &[f32],
    kind: CorrelationType,
    mode: PolarityMode,
    center_first: bool,
) -> f64 {
    match kind {
        CorrelationType::Pearson => a.correlation(b, mode, center_first),
        CorrelationType::Spearman => spearman(a, b, mode),
        CorrelationType::CircularLinear => circular_linear(a, b),
        CorrelationType::CircularCircular => {
            tracing::warn!("Circular-circular correlation is not implemented");
            0.0
        }
    }
}

/// Spearman rank correlation.
pub fn spearman(a: &[f32], b: &[f32], mode: PolarityMode) -> f64 {
    assert_eq!(a.len(), b.len(), "Maps must have equal dimension");
    let ranks_a = average_ranks(a);
    let ranks_b = average_ranks(b);
    let corr = pearson_f64(&ranks_a, &ranks_b);
    match mode {
        PolarityMode::Direct => corr,
        PolarityMode::Evaluate => corr.abs(),
    }
}

/// Circular-linear correlation (Mardia) between angles and linear values, in `[0, 1]`.
pub fn circular_linear(angles: &[f32], linear: &[f32]) -> f64 {
    assert_eq!(angles.len(), linear.len(), "Maps must have equal dimension");
    if angles.is_empty() {
        return 0.0;
    }

    let cosines: Vec<f64> = angles.iter().map(|&a| (a as f64).cos()).collect();
    let sines: Vec<f64> = angles.iter().map(|&a| (a as f64).sin()).collect();
    let linear: Vec<f64> = linear.iter().map(|&v| v as f64).collect();

    let r_xc = pearson_f64(&linear, &cosines);
    let r_xs = pearson_f64(&linear, &sines);
    let r_cs = pearson_f64(&cosines, &sines);

    let numerator = r_xc * r_xc + r_xs * r_xs - 2.0 * r_xc * r_xs * r_cs;
    let denominator = non_null(1.0 - r_cs * r_cs);
    (numerator / denominator).max(0.0).sqrt().clamp_unit()
}

fn pearson_f64(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().max(1) as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut sum_ab = 0.0;
    let mut sum_aa = 0.0;
    let mut sum_bb = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let x = x - mean_a;
        let y = y - mean_b;
        sum_ab += x * y;
        sum_aa += x * x;
        sum_bb += y * y;
    }
    (sum_ab / non_null((sum_aa * sum_bb).sqrt())).clamp_unit()
}

/// Similarity between two maps as every clustering step measures it.
///
/// Scalar maps use centered correlation, positive maps uncentered, and
/// vectorial maps evaluate the sign of each dipole independently.
pub fn map_correlation(a: &[f32], b: &[f32], data_type: DataType, mode: PolarityMode) -> f64 {
    let mode = if mode.evaluates(data_type) {
        PolarityMode::Evaluate
    } else {
        PolarityMode::Direct
    };

    match data_type {
        DataType::Scalar => a.correlation(b, mode, true),
        DataType::Positive => a.correlation(b, mode, false),
        DataType::Vectorial => match mode {
            PolarityMode::Evaluate => a.correlation_dipoles(b, mode, None),
            PolarityMode::Direct => a.correlation(b, mode, false),
        },
    }
}

/// Global polarity of `map` relative to `reference`.
///
/// Only scalar data under `Evaluate` can be inverted; vectorial data carries
/// its signs per dipole and is always recorded as direct.
pub fn evaluate_polarity(
    map: &[f32],
    reference: &[f32],
    data_type: DataType,
    mode: PolarityMode,
) -> Polarity {
    if mode.evaluates(data_type) && data_type == DataType::Scalar {
        Polarity::from_opposite(is_opposite(map, reference, data_type))
    } else {
        Polarity::Direct
    }
}

/// Whether `map` points away from `reference` in the geometry `data_type`
/// correlates in: centered for scalar maps, uncentered otherwise.
///
/// Every global sign decision goes through here so that a stored polarity
/// always agrees with the sign of [`map_correlation`] under `Direct`.
pub fn is_opposite(map: &[f32], reference: &[f32], data_type: DataType) -> bool {
    if data_type.centers_maps() {
        map.centered_product(reference) < 0.0
    } else {
        map.is_opposite_direction(reference)
    }
}
