use rayon::prelude::*;

use crate::collection::MapCollection;
use crate::map::MapExt;
use crate::polarity::DataType;

/// Index (into `data`) of the sampled map with the largest summed projection
/// onto the other sampled maps, divided by its own norm.
///
/// Scalar maps are projected after removing their mean. With `evaluate`
/// every projection counts by absolute value: per map pair for scalar data,
/// per dipole for vectorial data. Ties go to the earliest candidate.
/// `sampled` must not be empty.
pub(super) fn select(
    data: &MapCollection,
    sampled: &[usize],
    data_type: DataType,
    evaluate: bool,
) -> usize {
    debug_assert!(!sampled.is_empty());

    let scores: Vec<f64> = sampled
        .par_iter()
        .map(|&i| {
            let candidate = data.map(i);
            let norm = candidate.norm(data_type.centers_maps());
            if norm <= 0.0 {
                return f64::NEG_INFINITY;
            }
            let total: f64 = sampled
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| projection(candidate, data.map(j), data_type, evaluate))
                .sum();
            total / norm
        })
        .collect();

    let mut best = 0;
    for (k, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = k;
        }
    }
    sampled[best]
}

fn projection(a: &[f32], b: &[f32], data_type: DataType, evaluate: bool) -> f64 {
    if evaluate && data_type.is_vectorial() {
        return (0..a.num_dipoles())
            .map(|p| a.dipole(p).dot(b.dipole(p)).abs())
            .sum();
    }

    let product = if data_type.centers_maps() {
        a.centered_product(b)
    } else {
        a.scalar_product(b)
    };
    if evaluate { product.abs() } else { product }
}
