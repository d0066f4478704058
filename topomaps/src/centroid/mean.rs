//! Per-dimension mean and median of sign-corrected maps.
//!
//! Both run in parallel over dimensions with a sequential inner loop over
//! contributors, so every output slot has exactly one writer.

use common::parallel::parallel_chunked;

use super::SignTable;
use crate::collection::MapCollection;
use crate::map::Map;
use crate::math::median_f32_mut;

/// `Σ w_k s_k m_k / Σ w_k`, with unit weights when `weights` is `None`.
pub(super) fn weighted_sum(
    data: &MapCollection,
    indices: &[usize],
    signs: &SignTable,
    weights: Option<&[f64]>,
) -> Map {
    let mut centroid = Map::new(data.dimension());
    if indices.is_empty() {
        return centroid;
    }

    let total_weight = match weights {
        Some(weights) => weights.iter().sum::<f64>(),
        None => indices.len() as f64,
    };
    if total_weight <= 0.0 {
        return centroid;
    }

    parallel_chunked(&mut centroid[..], |d| {
        let sum: f64 = indices
            .iter()
            .enumerate()
            .map(|(k, &i)| {
                let w = weights.map_or(1.0, |w| w[k]);
                w * (signs.sign(k, d) * data.map(i)[d]) as f64
            })
            .sum();
        (sum / total_weight) as f32
    });
    centroid
}

pub(super) fn median(data: &MapCollection, indices: &[usize], signs: &SignTable) -> Map {
    let mut centroid = Map::new(data.dimension());
    if indices.is_empty() {
        return centroid;
    }

    parallel_chunked(&mut centroid[..], |d| {
        let mut values: Vec<f32> = indices
            .iter()
            .enumerate()
            .map(|(k, &i)| signs.sign(k, d) * data.map(i)[d])
            .collect();
        median_f32_mut(&mut values)
    });
    centroid
}
