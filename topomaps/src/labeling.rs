//! Cluster assignment of every map of a dataset.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collection::MapCollection;
use crate::polarity::{DataType, Polarity, PolarityMode};
use crate::similarity::evaluate_polarity;

/// One optional cluster id and one polarity per map.
///
/// Stored polarities are only meaningful against the centroids they were
/// computed with; after centroids change run [`Labeling::update_polarities`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Labeling {
    labels: Vec<Option<usize>>,
    polarities: Vec<Polarity>,
}

impl Labeling {
    /// `len` undefined entries.
    pub fn new(len: usize) -> Self {
        Self {
            labels: vec![None; len],
            polarities: vec![Polarity::Direct; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Undefine every entry.
    pub fn reset(&mut self) {
        self.labels.fill(None);
        self.polarities.fill(Polarity::Direct);
    }

    pub fn set(&mut self, index: usize, label: usize, polarity: Polarity) {
        self.labels[index] = Some(label);
        self.polarities[index] = polarity;
    }

    pub fn unset(&mut self, index: usize) {
        self.labels[index] = None;
        self.polarities[index] = Polarity::Direct;
    }

    #[inline]
    pub fn label(&self, index: usize) -> Option<usize> {
        self.labels[index]
    }

    #[inline]
    pub fn polarity(&self, index: usize) -> Polarity {
        self.polarities[index]
    }

    #[inline]
    pub fn is_defined(&self, index: usize) -> bool {
        self.labels[index].is_some()
    }

    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    pub fn cluster_size(&self, label: usize) -> usize {
        self.labels.iter().filter(|&&l| l == Some(label)).count()
    }

    pub fn cluster_indices(&self, label: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == Some(label))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn num_defined(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    /// Mutable label and polarity slots of `range`, for parallel assignment.
    pub(crate) fn entries_mut(
        &mut self,
        range: Range<usize>,
    ) -> (&mut [Option<usize>], &mut [Polarity]) {
        (&mut self.labels[range.clone()], &mut self.polarities[range])
    }

    /// Recompute the stored polarity of every defined entry in `range`
    /// against its centroid.
    pub fn update_polarities(
        &mut self,
        data: &MapCollection,
        range: Range<usize>,
        centroids: &MapCollection,
        data_type: DataType,
        mode: PolarityMode,
    ) {
        let end = range.end.min(self.len()).min(data.num_maps());
        let start = range.start.min(end);
        let (labels, polarities) = self.entries_mut(start..end);

        labels
            .par_iter()
            .zip(polarities.par_iter_mut())
            .enumerate()
            .for_each(|(offset, (label, polarity))| {
                if let Some(c) = *label {
                    *polarity =
                        evaluate_polarity(data.map(start + offset), centroids.map(c), data_type, mode);
                }
            });
    }
}
