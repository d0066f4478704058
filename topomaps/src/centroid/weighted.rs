use rayon::prelude::*;

use super::mean::weighted_sum;
use super::{CentroidConfig, SignTable};
use crate::collection::MapCollection;
use crate::map::Map;
use crate::polarity::PolarityMode;
use crate::similarity::map_correlation;

/// Mean weighted by how well each map matches a reference.
///
/// Maps are ranked by correlation to the reference (caller supplied, else
/// estimated); rank `r` (0 = best) weighs `N - r`. Signs are taken against
/// the same reference, per map for scalar data and per dipole for vectorial.
pub(super) fn rank_weighted_mean(
    data: &MapCollection,
    indices: &[usize],
    config: &CentroidConfig,
    reference: Option<&[f32]>,
) -> Map {
    let estimated;
    let reference = match reference {
        Some(reference) => reference,
        None => {
            estimated = data.estimate_reference(indices, config);
            &estimated[..]
        }
    };

    let mode = if config.evaluates() {
        PolarityMode::Evaluate
    } else {
        PolarityMode::Direct
    };
    let correlations: Vec<f64> = indices
        .par_iter()
        .map(|&i| map_correlation(data.map(i), reference, config.data_type, mode))
        .collect();

    let weights = rank_weights(&correlations);

    let signs = if config.evaluates() {
        SignTable::against_reference(data, indices, reference, config.data_type)
    } else {
        SignTable::Unsigned
    };

    weighted_sum(data, indices, &signs, Some(&weights))
}

/// `N - rank` with rank 0 for the highest correlation; ties keep input order.
fn rank_weights(correlations: &[f64]) -> Vec<f64> {
    let n = correlations.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| correlations[b].total_cmp(&correlations[a]));

    let mut weights = vec![0.0; n];
    for (rank, &k) in order.iter().enumerate() {
        weights[k] = (n - rank) as f64;
    }
    weights
}
