//! The two half-steps of segmentation, on the centroid collection.
//!
//! [`MapCollection::centroids_to_labeling`] assigns maps to centroids and
//! [`MapCollection::labeling_to_centroids`] recomputes centroids from a
//! labeling. Alternating them is the usual segmentation loop; [`segment`]
//! packages one such loop with a stability stop.

mod segmentation;

#[cfg(test)]
mod tests;

use std::ops::Range;

use rayon::prelude::*;

use crate::centroid::{CentroidConfig, LabelSubset};
use crate::collection::MapCollection;
use crate::labeling::Labeling;
use crate::map::{Map, MapExt};
use crate::polarity::{DataType, Polarity, PolarityMode};
use crate::similarity::{evaluate_polarity, map_correlation};

pub use segmentation::{Segmentation, SegmentationConfig, segment};

/// Most correlated pair of maps, `first < second`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPair {
    pub first: usize,
    pub second: usize,
    pub correlation: f64,
}

impl ClosestPair {
    /// Higher correlation wins; equal correlations go to the smaller pair,
    /// which keeps the parallel reduction independent of scan order.
    fn better(self, other: Self) -> Self {
        if other.correlation > self.correlation
            || (other.correlation == self.correlation
                && (other.first, other.second) < (self.first, self.second))
        {
            other
        } else {
            self
        }
    }
}

impl MapCollection {
    /// Label every map of `data` in `range` with its best correlated centroid.
    ///
    /// `self` holds the centroids; only the first `num_clusters` are
    /// considered and `eligible`, when given, masks them further. Ties go to
    /// the lowest cluster index. Null maps, maps without an eligible cluster
    /// and best correlations below `corr_limit` are left undefined. Entries
    /// outside `range` are untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn centroids_to_labeling(
        &self,
        data: &MapCollection,
        range: Range<usize>,
        num_clusters: usize,
        eligible: Option<&[bool]>,
        labeling: &mut Labeling,
        data_type: DataType,
        mode: PolarityMode,
        corr_limit: f64,
    ) {
        assert_eq!(
            labeling.len(),
            data.num_maps(),
            "Labeling must have one entry per map"
        );
        if !data.is_empty() && !self.is_empty() {
            assert_eq!(
                self.dimension(),
                data.dimension(),
                "Maps must have equal dimension"
            );
        }

        let num_clusters = num_clusters.min(self.num_maps());
        let end = range.end.min(data.num_maps());
        let start = range.start.min(end);
        let (labels, polarities) = labeling.entries_mut(start..end);

        labels
            .par_iter_mut()
            .zip(polarities.par_iter_mut())
            .enumerate()
            .for_each(|(offset, (label, polarity))| {
                let map = data.map(start + offset);
                *label = None;
                *polarity = Polarity::Direct;
                if map.is_null() {
                    return;
                }

                let mut best: Option<(usize, f64)> = None;
                for c in 0..num_clusters {
                    if eligible.is_some_and(|mask| !mask.get(c).copied().unwrap_or(false)) {
                        continue;
                    }
                    let corr = map_correlation(map, self.map(c), data_type, mode);
                    if best.is_none_or(|(_, best_corr)| corr > best_corr) {
                        best = Some((c, corr));
                    }
                }

                match best {
                    Some((c, corr)) if corr >= corr_limit => {
                        *label = Some(c);
                        *polarity = evaluate_polarity(map, self.map(c), data_type, mode);
                    }
                    _ => {}
                }
            });
    }

    /// Recompute the first `num_clusters` centroids from the maps labelled
    /// with them.
    ///
    /// Each previous centroid serves as the sign reference of its
    /// replacement. Results are optionally rank-transformed and always
    /// normalized. With `update_polarity` the stored polarities are then
    /// refreshed against the new centroids.
    ///
    /// Rows past `num_clusters` are left untouched. The collection grows
    /// when it holds fewer rows, and is reset when its dimension differs
    /// from the data.
    pub fn labeling_to_centroids(
        &mut self,
        data: &MapCollection,
        num_clusters: usize,
        labeling: &mut Labeling,
        config: &CentroidConfig,
        do_ranking: bool,
        update_polarity: bool,
    ) {
        let same_dimension = self.dimension() == data.dimension();
        let data_type = config.data_type;
        let current: &Labeling = labeling;
        let centroids: Vec<Map> = (0..num_clusters)
            .map(|c| {
                let reference = (same_dimension && c < self.num_maps())
                    .then(|| self.map(c))
                    .filter(|previous| !previous.is_null());
                let mut centroid = data.compute_centroid(
                    config,
                    Some(LabelSubset::new(current, c)),
                    reference,
                );
                if do_ranking && !centroid.is_null() {
                    centroid.to_rank(data_type);
                }
                centroid.normalize(data_type.centers_maps());
                centroid
            })
            .collect();

        if !same_dimension {
            self.resize(num_clusters, data.dimension());
        }
        for (c, centroid) in centroids.iter().enumerate() {
            if c < self.num_maps() {
                self.set_map(c, centroid);
            } else {
                self.push(centroid);
            }
        }

        if update_polarity {
            labeling.update_polarities(data, 0..data.num_maps(), self, data_type, config.polarity);
        }
    }

    /// Most correlated unordered pair among the first `num_clusters` maps.
    ///
    /// `None` with fewer than two maps.
    pub fn closest_pair(
        &self,
        num_clusters: usize,
        data_type: DataType,
        mode: PolarityMode,
    ) -> Option<ClosestPair> {
        let n = num_clusters.min(self.num_maps());
        if n < 2 {
            return None;
        }

        (0..n - 1)
            .into_par_iter()
            .map(|first| {
                (first + 1..n)
                    .map(|second| ClosestPair {
                        first,
                        second,
                        correlation: map_correlation(
                            self.map(first),
                            self.map(second),
                            data_type,
                            mode,
                        ),
                    })
                    .reduce(ClosestPair::better)
            })
            .reduce(
                || None,
                |a, b| match (a, b) {
                    (Some(a), Some(b)) => Some(a.better(b)),
                    (a, None) => a,
                    (None, b) => b,
                },
            )
    }
}

/// Share of total squared GFP explained by the assigned centroids:
/// `Σ (gfp_t · corr_t)² / Σ gfp_t²`, numerator over labelled maps,
/// denominator over all maps. 0 when the data has no power.
pub fn global_explained_variance(
    data: &MapCollection,
    centroids: &MapCollection,
    labeling: &Labeling,
    data_type: DataType,
    mode: PolarityMode,
) -> f64 {
    let (explained, total) = (0..data.num_maps())
        .into_par_iter()
        .map(|t| {
            let map = data.map(t);
            let gfp = map.gfp(data_type);
            let explained = labeling.label(t).map_or(0.0, |c| {
                let corr = map_correlation(map, centroids.map(c), data_type, mode);
                (gfp * corr).powi(2)
            });
            (explained, gfp * gfp)
        })
        .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));

    if total > 0.0 { explained / total } else { 0.0 }
}

/// Mean correlation of each labelled map with its centroid, 0 when none are labelled.
pub fn mean_assigned_correlation(
    data: &MapCollection,
    centroids: &MapCollection,
    labeling: &Labeling,
    data_type: DataType,
    mode: PolarityMode,
) -> f64 {
    let (sum, count) = (0..data.num_maps())
        .into_par_iter()
        .filter_map(|t| {
            labeling
                .label(t)
                .map(|c| map_correlation(data.map(t), centroids.map(c), data_type, mode))
        })
        .map(|corr| (corr, 1usize))
        .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    if count > 0 { sum / count as f64 } else { 0.0 }
}
