//! Dominant eigenvector of the second-moment matrix by power iteration.

use common::parallel::{ParRowsMutAuto, parallel_chunked};
use rayon::prelude::*;

use super::{CentroidConfig, subsample};
use crate::collection::MapCollection;
use crate::map::{Map, MapExt};
use crate::similarity::is_opposite;

/// Relative change of the Rayleigh quotient below which iteration stops.
const TOLERANCE: f64 = 1e-7;
const MAX_ITERATIONS: usize = 200;

/// Unit-norm dominant eigenvector of `Σ m mᵀ / n` over the sampled maps.
///
/// The sign of an eigenvector is arbitrary; when polarity is not evaluated
/// it is flipped to agree with the first contributing map. Vectorial data
/// is not supported and gives a null map.
pub(super) fn dominant_eigenvector(
    data: &MapCollection,
    indices: &[usize],
    config: &CentroidConfig,
) -> Map {
    let dimension = data.dimension();
    if config.data_type.is_vectorial() {
        tracing::warn!("Eigenvector centroid is only defined for scalar maps");
        return Map::new(dimension);
    }

    let sampled = subsample(indices, config.max_samples);
    let matrix = second_moment(data, &sampled);

    let first = data.map(indices[0]);
    let mut v: Vec<f64> = first.iter().map(|&x| x as f64).collect();
    normalize_f64(&mut v);

    let mut lambda = 0.0;
    let mut iterations = 0;
    while iterations < MAX_ITERATIONS {
        iterations += 1;

        let mut w = vec![0.0f64; dimension];
        parallel_chunked(&mut w[..], |r| {
            let row = &matrix[r * dimension..(r + 1) * dimension];
            row.iter().zip(&v).map(|(a, b)| a * b).sum::<f64>()
        });

        let next_lambda: f64 = v.iter().zip(&w).map(|(a, b)| a * b).sum();
        if normalize_f64(&mut w) == 0.0 {
            break;
        }
        v = w;

        let converged = (next_lambda - lambda).abs() <= TOLERANCE * next_lambda.abs();
        lambda = next_lambda;
        if converged {
            break;
        }
    }

    tracing::debug!(
        iterations,
        lambda,
        samples = sampled.len(),
        "Power iteration finished"
    );

    let mut centroid = Map::from_vec(v.iter().map(|&x| x as f32).collect());
    if !config.evaluates() && is_opposite(&centroid, first, config.data_type) {
        centroid.invert();
    }
    centroid
}

/// Row-major `dimension × dimension` matrix `Σ m mᵀ / n`.
fn second_moment(data: &MapCollection, sampled: &[usize]) -> Vec<f64> {
    let dimension = data.dimension();
    let n = sampled.len().max(1) as f64;
    let mut matrix = vec![0.0f64; dimension * dimension];

    matrix
        .par_rows_mut_auto(dimension)
        .for_each(|(first_row, chunk)| {
            for (local, row) in chunk.chunks_exact_mut(dimension).enumerate() {
                let r = first_row + local;
                for &i in sampled {
                    let map = data.map(i);
                    let x_r = map[r] as f64;
                    if x_r == 0.0 {
                        continue;
                    }
                    for (slot, &x_c) in row.iter_mut().zip(map) {
                        *slot += x_r * x_c as f64;
                    }
                }
                for slot in row.iter_mut() {
                    *slot /= n;
                }
            }
        });
    matrix
}

/// Scale to unit length; returns the original norm.
fn normalize_f64(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}
