//! Alternating assign / update segmentation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::global_explained_variance;
use crate::centroid::CentroidConfig;
use crate::collection::MapCollection;
use crate::error::{Error, Result};
use crate::labeling::Labeling;

/// Segmentation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    pub num_clusters: usize,
    /// Update steps before giving up on a stable labeling.
    pub max_iterations: usize,
    /// Estimator and polarity policy for the update step. Its data type and
    /// polarity mode also drive the assignment step.
    pub centroid: CentroidConfig,
    /// Minimum correlation for a map to be labelled.
    pub corr_limit: f64,
    /// Rank-transform centroids after each update.
    pub do_ranking: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            num_clusters: 4,
            max_iterations: 100,
            centroid: CentroidConfig::mean(),
            corr_limit: 0.0,
            do_ranking: false,
        }
    }
}

impl SegmentationConfig {
    /// Defaults with `num_clusters` clusters.
    pub fn new(num_clusters: usize) -> Self {
        Self {
            num_clusters,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_clusters == 0 {
            return Err(Error::InvalidClusterCount);
        }
        Ok(())
    }
}

/// Outcome of [`segment`].
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// One normalized centroid per cluster.
    pub centroids: MapCollection,
    /// Assignment of every input map against `centroids`.
    pub labeling: Labeling,
    /// Update steps performed.
    pub iterations: usize,
    /// Global explained variance of the final assignment.
    pub gev: f64,
}

/// Segment `data` into `config.num_clusters` clusters.
///
/// Centroids start as distinct non-null maps drawn from `rng`; assignment
/// and update then alternate until the labeling stops changing or
/// `max_iterations` updates have run. The returned labeling is always the
/// assignment against the returned centroids.
pub fn segment<R: Rng + ?Sized>(
    data: &MapCollection,
    config: &SegmentationConfig,
    rng: &mut R,
) -> Result<Segmentation> {
    config.validate()?;

    let data_type = config.centroid.data_type;
    let mode = config.centroid.polarity;
    let k = config.num_clusters;

    if data_type.is_vectorial() && data.dimension() % 3 != 0 {
        return Err(Error::NotVectorial(data.dimension()));
    }

    let candidates = data.non_null_indices();
    if candidates.len() < k {
        return Err(Error::TooFewMaps {
            available: candidates.len(),
            requested: k,
        });
    }

    let seeds: Vec<usize> = rand::seq::index::sample(rng, candidates.len(), k)
        .iter()
        .map(|i| candidates[i])
        .collect();
    let mut centroids = data.select(&seeds);
    centroids.normalize_all(data_type.centers_maps());

    let num_maps = data.num_maps();
    let mut labeling = Labeling::new(num_maps);
    centroids.centroids_to_labeling(
        data,
        0..num_maps,
        k,
        None,
        &mut labeling,
        data_type,
        mode,
        config.corr_limit,
    );

    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;

        centroids.labeling_to_centroids(
            data,
            k,
            &mut labeling,
            &config.centroid,
            config.do_ranking,
            false,
        );

        let previous = labeling.clone();
        centroids.centroids_to_labeling(
            data,
            0..num_maps,
            k,
            None,
            &mut labeling,
            data_type,
            mode,
            config.corr_limit,
        );

        let changed = previous
            .labels()
            .iter()
            .zip(labeling.labels())
            .filter(|(a, b)| a != b)
            .count();
        tracing::debug!(iteration = iterations, changed, "Segmentation step");
        if changed == 0 {
            break;
        }
    }

    let gev = global_explained_variance(data, &centroids, &labeling, data_type, mode);
    tracing::debug!(
        clusters = k,
        iterations,
        gev,
        labelled = labeling.num_defined(),
        "Segmentation finished"
    );

    Ok(Segmentation {
        centroids,
        labeling,
        iterations,
        gev,
    })
}
