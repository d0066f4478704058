//! Cloud folding: a per-point sign reference for vectorial maps.
//!
//! At each solution point the sampled dipoles form a small cloud that is
//! roughly symmetric about the origin when dipole signs are ambiguous. The
//! folding axis is the candidate direction whose absolute projections vary
//! the least relative to their mean. Only its orientation matters; the
//! reference carries unit dipoles.

use glam::DVec3;
use rayon::prelude::*;

use super::subsample;
use crate::collection::MapCollection;
use crate::map::{Map, MapExt};

/// Candidate axes tried per point.
const MAX_CANDIDATES: usize = 64;

pub(super) fn cloud_folding(data: &MapCollection, sampled: &[usize]) -> Map {
    let num_points = data.dimension() / 3;

    let axes: Vec<DVec3> = (0..num_points)
        .into_par_iter()
        .map(|p| {
            let cloud: Vec<DVec3> = sampled
                .iter()
                .map(|&i| data.map(i).dipole(p))
                .filter(|v| v.length_squared() > 0.0)
                .collect();
            folding_axis(&cloud)
        })
        .collect();

    Map::from_dipoles(&axes)
}

/// Axis minimizing the coefficient of variation of `|v · axis|` over `cloud`.
/// Zero for an empty cloud.
fn folding_axis(cloud: &[DVec3]) -> DVec3 {
    let positions: Vec<usize> = (0..cloud.len()).collect();
    let candidates = subsample(&positions, MAX_CANDIDATES);

    let mut best_axis = DVec3::ZERO;
    let mut best_cv = f64::INFINITY;
    for &c in &candidates {
        let axis = cloud[c].normalize();
        let cv = projection_cv(cloud, axis);
        if cv < best_cv {
            best_cv = cv;
            best_axis = axis;
        }
    }
    best_axis
}

fn projection_cv(cloud: &[DVec3], axis: DVec3) -> f64 {
    let n = cloud.len() as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in cloud {
        let p = v.dot(axis).abs();
        sum += p;
        sum_sq += p * p;
    }
    let mean = sum / n;
    if mean <= 0.0 {
        return f64::INFINITY;
    }
    let variance = (sum_sq / n - mean * mean).max(0.0);
    variance.sqrt() / mean
}
