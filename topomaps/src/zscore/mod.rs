//! Robust Z-score normalization of map amplitudes.
//!
//! Computing derives a `(center, spread)` pair per dimension (per solution
//! point for vectorial data) from resampled robust estimators. Applying
//! rescales every map with a stored table, so a table computed on one
//! dataset can normalize another.

mod robust;


use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::collection::MapCollection;
use crate::map::MapExt;
use robust::{MIN_SPREAD, deskew, draw_seed, local_extrema, resampled_estimate};

/// Value family being normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ZScoreKind {
    /// Signed values, standardized as `(x - c) / s`.
    Signed,
    /// Non-negative values, de-skewed then standardized, shifted and clipped at 0.
    Positive,
    /// Dipoles rescaled so that their norms follow the positive rule.
    Vectorial,
}

/// Robust estimation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZScoreConfig {
    /// Resamples whose estimates are aggregated by median. 0 estimates once
    /// on all values.
    pub num_resamplings: usize,
    /// Values drawn (without replacement) per resample.
    pub resampling_size: usize,
    /// Only use values at local extrema of the map sequence.
    pub local_maxima_only: bool,
    /// Added to positive and vectorial scores before clipping at 0.
    pub positive_offset: f32,
}

impl Default for ZScoreConfig {
    fn default() -> Self {
        Self {
            num_resamplings: 100,
            resampling_size: 1000,
            local_maxima_only: false,
            positive_offset: 3.0,
        }
    }
}

/// Per-dimension normalization table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreTable {
    pub kind: ZScoreKind,
    pub center: Vec<f32>,
    pub spread: Vec<f32>,
    /// Offset of positive and vectorial scores.
    pub offset: f32,
}

impl ZScoreTable {
    /// Number of dimensions (solution points for vectorial tables).
    pub fn len(&self) -> usize {
        self.center.len()
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_empty()
    }

    /// Spread of dimension `d`, floored so that hand-built or deserialized
    /// tables cannot divide by zero.
    #[inline]
    fn spread(&self, d: usize) -> f32 {
        self.spread[d].max(MIN_SPREAD)
    }

    #[inline]
    fn signed_score(&self, d: usize, value: f32) -> f32 {
        (value - self.center[d]) / self.spread(d)
    }

    #[inline]
    fn positive_score(&self, d: usize, magnitude: f32) -> f32 {
        (self.signed_score(d, deskew(magnitude)) + self.offset).max(0.0)
    }
}

impl ZScoreKind {
    /// Entries of a table for maps of `dimension` samples, `None` when the
    /// dimension cannot hold this kind.
    fn table_len(self, dimension: usize) -> Option<usize> {
        match self {
            ZScoreKind::Signed | ZScoreKind::Positive => Some(dimension),
            ZScoreKind::Vectorial => (dimension % 3 == 0).then_some(dimension / 3),
        }
    }
}

impl MapCollection {
    /// Estimate a normalization table from every map of the collection.
    ///
    /// Each dimension runs on its own generator seeded from `rng` in
    /// dimension order, so the table does not depend on thread scheduling.
    pub fn compute_zscore<R: Rng + ?Sized>(
        &self,
        kind: ZScoreKind,
        config: &ZScoreConfig,
        rng: &mut R,
    ) -> ZScoreTable {
        let Some(len) = kind.table_len(self.dimension()) else {
            tracing::warn!(
                dimension = self.dimension(),
                "Vectorial Z-score of maps not made of triplets"
            );
            return ZScoreTable {
                kind,
                center: Vec::new(),
                spread: Vec::new(),
                offset: config.positive_offset,
            };
        };

        let seeds: Vec<u64> = (0..len).map(|_| draw_seed(rng)).collect();

        let (center, spread): (Vec<f32>, Vec<f32>) = seeds
            .par_iter()
            .enumerate()
            .map(|(d, &seed)| {
                let values = self.dimension_values(kind, d);
                let values = if config.local_maxima_only {
                    local_extrema(&values, kind == ZScoreKind::Signed)
                } else {
                    values
                };
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                resampled_estimate(&values, config, &mut rng)
            })
            .unzip();

        tracing::debug!(
            %kind,
            dimensions = len,
            maps = self.num_maps(),
            "Z-score table computed"
        );

        ZScoreTable {
            kind,
            center,
            spread,
            offset: config.positive_offset,
        }
    }

    /// Normalize every map in place. A table of the wrong shape is ignored.
    pub fn apply_zscore(&mut self, table: &ZScoreTable) {
        let expected = table.kind.table_len(self.dimension());
        if expected != Some(table.center.len()) || table.spread.len() != table.center.len() {
            tracing::warn!(
                kind = %table.kind,
                dimension = self.dimension(),
                table = table.center.len(),
                "Z-score table does not match the collection, skipping"
            );
            return;
        }

        match table.kind {
            ZScoreKind::Signed => self.for_each_map_mut(|_, map| {
                for (d, x) in map.iter_mut().enumerate() {
                    *x = table.signed_score(d, *x);
                }
            }),
            ZScoreKind::Positive => self.for_each_map_mut(|_, map| {
                for (d, x) in map.iter_mut().enumerate() {
                    *x = table.positive_score(d, *x);
                }
            }),
            ZScoreKind::Vectorial => self.for_each_map_mut(|_, map| {
                for p in 0..map.num_dipoles() {
                    let dipole = map.dipole(p);
                    let norm = dipole.length();
                    if norm > 0.0 {
                        let score = table.positive_score(p, norm as f32) as f64;
                        map.set_dipole(p, dipole * (score / norm));
                    }
                }
            }),
        }
    }

    /// Values of dimension `d` across all maps, transformed for `kind`.
    fn dimension_values(&self, kind: ZScoreKind, d: usize) -> Vec<f32> {
        match kind {
            ZScoreKind::Signed => self.iter().map(|map| map[d]).collect(),
            ZScoreKind::Positive => self.iter().map(|map| deskew(map[d])).collect(),
            ZScoreKind::Vectorial => self
                .iter()
                .map(|map| deskew(map.dipole(d).length() as f32))
                .collect(),
        }
    }
}
