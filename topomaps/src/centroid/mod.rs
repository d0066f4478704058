//! Centroid estimators.
//!
//! Every estimator is a pure function of the contributing maps, an optional
//! reference map and the polarity policy. Contributors are the non-null maps
//! of the collection, optionally restricted to one label of a [`Labeling`].
//! No contributors means a null centroid.

mod eigen;
mod folding;
mod mean;
mod medoid;
mod weighted;


use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::collection::MapCollection;
use crate::labeling::Labeling;
use crate::map::{Map, MapExt};
use crate::polarity::{DataType, PolarityMode};
use crate::similarity::is_opposite;

/// Sampled maps used by the quadratic estimators when no limit is given.
pub const DEFAULT_MAX_SAMPLES: usize = 1000;

/// Centroid estimation strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum CentroidMethod {
    /// Per-dimension mean of sign-corrected maps.
    #[default]
    Mean,
    /// Mean weighted by the rank of each map's correlation to a reference.
    WeightedMean,
    /// Per-dimension median of sign-corrected maps.
    Median,
    /// The input map most aligned with all others, returned verbatim.
    Medoid,
    /// Dominant eigenvector of the second-moment matrix (scalar data only).
    EigenVector,
}

/// Centroid estimation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentroidConfig {
    pub method: CentroidMethod,
    pub data_type: DataType,
    pub polarity: PolarityMode,
    /// Upper bound on the maps visited by the sampling estimators
    /// (medoid, weighted mean, eigenvector, reference estimation).
    /// 0 visits every map. Mean and median always use every map.
    pub max_samples: usize,
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            method: CentroidMethod::Mean,
            data_type: DataType::Scalar,
            polarity: PolarityMode::Evaluate,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl CentroidConfig {
    /// Polarity-evaluating mean of scalar maps.
    pub fn mean() -> Self {
        Self::default()
    }

    pub fn new(method: CentroidMethod, data_type: DataType) -> Self {
        Self {
            method,
            data_type,
            ..Self::default()
        }
    }

    pub fn with_polarity(mut self, polarity: PolarityMode) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    #[inline]
    pub(crate) fn evaluates(&self) -> bool {
        self.polarity.evaluates(self.data_type)
    }
}

/// Restricts a centroid to the maps carrying `label`.
#[derive(Debug, Clone, Copy)]
pub struct LabelSubset<'a> {
    pub labeling: &'a Labeling,
    pub label: usize,
}

impl<'a> LabelSubset<'a> {
    pub fn new(labeling: &'a Labeling, label: usize) -> Self {
        Self { labeling, label }
    }

    #[inline]
    fn contains(&self, index: usize) -> bool {
        self.labeling.label(index) == Some(self.label)
    }
}

/// Sign applied to each contributor (or each of its dipoles) before accumulation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SignTable {
    Unsigned,
    /// One sign per contributor.
    Maps(Vec<f32>),
    /// Row of `num_dipoles` signs per contributor.
    Dipoles { signs: Vec<f32>, num_dipoles: usize },
}

impl SignTable {
    /// Sign for `sample` of contributor `k`.
    #[inline]
    pub(crate) fn sign(&self, k: usize, sample: usize) -> f32 {
        match self {
            SignTable::Unsigned => 1.0,
            SignTable::Maps(signs) => signs[k],
            SignTable::Dipoles { signs, num_dipoles } => signs[k * num_dipoles + sample / 3],
        }
    }

    /// Signs of every contributor relative to `reference`.
    fn against_reference(
        data: &MapCollection,
        indices: &[usize],
        reference: &[f32],
        data_type: DataType,
    ) -> Self {
        if data_type.is_vectorial() {
            let num_dipoles = data.dimension() / 3;
            let mut signs = vec![1.0f32; indices.len() * num_dipoles];
            for (&index, row) in indices.iter().zip(signs.chunks_exact_mut(num_dipoles.max(1))) {
                data.map(index)
                    .correlation_dipoles(reference, PolarityMode::Evaluate, Some(row));
            }
            SignTable::Dipoles { signs, num_dipoles }
        } else {
            SignTable::Maps(
                indices
                    .iter()
                    .map(|&index| {
                        if is_opposite(data.map(index), reference, data_type) {
                            -1.0
                        } else {
                            1.0
                        }
                    })
                    .collect(),
            )
        }
    }
}

/// Every `ceil(n / max_samples)`-th index, or all of them when `max_samples` is 0.
pub(crate) fn subsample(indices: &[usize], max_samples: usize) -> Vec<usize> {
    if max_samples == 0 || indices.len() <= max_samples {
        return indices.to_vec();
    }
    let stride = indices.len().div_ceil(max_samples);
    indices.iter().step_by(stride).copied().collect()
}

impl MapCollection {
    /// Estimate one representative map.
    ///
    /// With a `subset` only maps carrying its label contribute; null maps
    /// never do. `reference` orients sign-ambiguous maps before they are
    /// accumulated; without one the reference is estimated from the data
    /// (stored polarities for labelled scalar data, the medoid for other
    /// scalar data, cloud folding for vectorial data).
    pub fn compute_centroid(
        &self,
        config: &CentroidConfig,
        subset: Option<LabelSubset<'_>>,
        reference: Option<&[f32]>,
    ) -> Map {
        let dimension = self.dimension();
        let null = Map::new(dimension);

        if config.data_type.is_vectorial() && dimension % 3 != 0 {
            tracing::warn!(dimension, "Vectorial centroid of maps not made of triplets");
            return null;
        }

        let indices = self.contributors(subset);
        if indices.is_empty() {
            return null;
        }

        let reference = reference.filter(|r| {
            let matches = r.len() == dimension;
            if !matches {
                tracing::warn!(
                    expected = dimension,
                    actual = r.len(),
                    "Ignoring centroid reference of wrong dimension"
                );
            }
            matches
        });

        match config.method {
            CentroidMethod::Mean => {
                let signs = self.sign_table(&indices, config, subset, reference);
                mean::weighted_sum(self, &indices, &signs, None)
            }
            CentroidMethod::Median => {
                let signs = self.sign_table(&indices, config, subset, reference);
                mean::median(self, &indices, &signs)
            }
            CentroidMethod::Medoid => {
                let sampled = subsample(&indices, config.max_samples);
                let index = medoid::select(self, &sampled, config.data_type, config.evaluates());
                self.to_map(index)
            }
            CentroidMethod::WeightedMean => {
                weighted::rank_weighted_mean(self, &indices, config, reference)
            }
            CentroidMethod::EigenVector => eigen::dominant_eigenvector(self, &indices, config),
        }
    }

    /// Non-null maps, restricted to `subset` when given.
    fn contributors(&self, subset: Option<LabelSubset<'_>>) -> Vec<usize> {
        (0..self.num_maps())
            .filter(|&i| subset.is_none_or(|s| s.contains(i)))
            .filter(|&i| !self.map(i).is_null())
            .collect()
    }

    fn sign_table(
        &self,
        indices: &[usize],
        config: &CentroidConfig,
        subset: Option<LabelSubset<'_>>,
        reference: Option<&[f32]>,
    ) -> SignTable {
        if !config.evaluates() {
            return SignTable::Unsigned;
        }

        if let (DataType::Scalar, Some(subset)) = (config.data_type, subset) {
            return SignTable::Maps(
                indices
                    .iter()
                    .map(|&i| subset.labeling.polarity(i).sign())
                    .collect(),
            );
        }

        match reference {
            Some(reference) => {
                SignTable::against_reference(self, indices, reference, config.data_type)
            }
            None => {
                let estimated = self.estimate_reference(indices, config);
                SignTable::against_reference(self, indices, &estimated, config.data_type)
            }
        }
    }

    /// Sign reference when the caller provides none.
    pub(crate) fn estimate_reference(&self, indices: &[usize], config: &CentroidConfig) -> Map {
        let sampled = subsample(indices, config.max_samples);
        if config.data_type.is_vectorial() {
            folding::cloud_folding(self, &sampled)
        } else {
            let index = medoid::select(self, &sampled, config.data_type, config.evaluates());
            self.to_map(index)
        }
    }
}
