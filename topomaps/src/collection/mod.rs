//! Ordered collection of maps sharing one dimension.
//!
//! Maps are stored row-major in a single buffer; [`MapCollection::map`]
//! hands out non-owning `&[f32]` views.

mod ops;


use common::parallel::{ParRowsMutAuto, parallel_chunked};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::map::{Map, MapExt, scalar_map};
use crate::polarity::DataType;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapCollection {
    values: Vec<f32>,
    num_maps: usize,
    dimension: usize,
    /// Informational tag, not used by any algorithm.
    sampling_frequency: f64,
}

impl MapCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty collection that accepts maps of `dimension` samples.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    /// `num_maps` null maps of `dimension` samples.
    pub fn zeros(num_maps: usize, dimension: usize) -> Self {
        let mut collection = Self::new();
        collection.resize(num_maps, dimension);
        collection
    }

    /// Wrap a row-major buffer of whole maps.
    pub fn from_flat(values: Vec<f32>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidDimension(dimension));
        }
        if values.len() % dimension != 0 {
            return Err(Error::LengthMismatch {
                len: values.len(),
                dimension,
            });
        }
        Ok(Self {
            num_maps: values.len() / dimension,
            values,
            dimension,
            sampling_frequency: 0.0,
        })
    }

    /// Copy maps into a new collection; every map must share the first one's dimension.
    pub fn from_maps<I, M>(maps: I) -> Result<Self>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<[f32]>,
    {
        let mut collection = Self::new();
        for (index, map) in maps.into_iter().enumerate() {
            let map = map.as_ref();
            if index == 0 {
                if map.is_empty() {
                    return Err(Error::InvalidDimension(0));
                }
                collection.dimension = map.len();
            } else if map.len() != collection.dimension {
                return Err(Error::DimensionMismatch {
                    index,
                    expected: collection.dimension,
                    actual: map.len(),
                });
            }
            collection.values.extend_from_slice(map);
            collection.num_maps += 1;
        }
        Ok(collection)
    }

    /// Reshape to `num_maps` null maps of `dimension`.
    ///
    /// A zero dimension is ignored. Resizing to the current shape only clears
    /// the contents and keeps the buffer.
    pub fn resize(&mut self, num_maps: usize, dimension: usize) {
        if dimension == 0 {
            return;
        }
        if num_maps == self.num_maps && dimension == self.dimension {
            self.values.fill(0.0);
            return;
        }
        self.values = vec![0.0; num_maps * dimension];
        self.num_maps = num_maps;
        self.dimension = dimension;
    }

    #[inline]
    pub fn num_maps(&self) -> usize {
        self.num_maps
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_maps == 0
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    pub fn set_sampling_frequency(&mut self, frequency: f64) {
        self.sampling_frequency = frequency;
    }

    #[inline]
    pub fn map(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.values[start..start + self.dimension]
    }

    #[inline]
    pub fn map_mut(&mut self, index: usize) -> &mut [f32] {
        let start = index * self.dimension;
        &mut self.values[start..start + self.dimension]
    }

    pub fn to_map(&self, index: usize) -> Map {
        Map::from(self.map(index))
    }

    pub fn set_map(&mut self, index: usize, map: &[f32]) {
        assert_eq!(map.len(), self.dimension, "Maps must have equal dimension");
        self.map_mut(index).copy_from_slice(map);
    }

    /// Append a map; the first map of a dimensionless collection sets the dimension.
    pub fn push(&mut self, map: &[f32]) {
        if self.dimension == 0 {
            self.dimension = map.len();
        }
        assert_eq!(map.len(), self.dimension, "Maps must have equal dimension");
        self.values.extend_from_slice(map);
        self.num_maps += 1;
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, f32> {
        self.values.chunks_exact(self.dimension.max(1))
    }

    pub fn par_iter(&self) -> rayon::slice::ChunksExact<'_, f32> {
        self.values.par_chunks_exact(self.dimension.max(1))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Copy of the maps at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> MapCollection {
        let mut selected = MapCollection::with_dimension(self.dimension);
        selected.sampling_frequency = self.sampling_frequency;
        selected.values.reserve(indices.len() * self.dimension);
        for &index in indices {
            selected.push(self.map(index));
        }
        selected
    }

    /// Run `f(map_index, map)` on every map in parallel.
    pub fn for_each_map_mut<F>(&mut self, f: F)
    where
        F: Fn(usize, &mut [f32]) + Sync + Send,
    {
        let dimension = self.dimension;
        if dimension == 0 {
            return;
        }
        self.values
            .par_rows_mut_auto(dimension)
            .for_each(|(first_map, chunk)| {
                for (local, map) in chunk.chunks_exact_mut(dimension).enumerate() {
                    f(first_map + local, map);
                }
            });
    }

    // ------------------------------------------------------------------
    // Per-map reductions
    // ------------------------------------------------------------------

    pub fn norms(&self, center_first: bool) -> Vec<f64> {
        self.par_iter().map(|map| map.norm(center_first)).collect()
    }

    pub fn gfps(&self, data_type: DataType) -> Vec<f64> {
        self.par_iter().map(|map| map.gfp(data_type)).collect()
    }

    /// Mean global field power, 0 for an empty collection.
    pub fn mean_gfp(&self, data_type: DataType) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.gfps(data_type).iter().sum::<f64>() / self.num_maps as f64
    }

    /// Plain average of all maps, without polarity handling. Null when empty.
    pub fn mean_map(&self) -> Map {
        let mut mean = Map::new(self.dimension);
        if self.is_empty() {
            return mean;
        }
        let n = self.num_maps as f64;
        parallel_chunked(&mut mean[..], |d| {
            (self.iter().map(|map| map[d] as f64).sum::<f64>() / n) as f32
        });
        mean
    }

    pub fn average_reference_all(&mut self) {
        self.for_each_map_mut(|_, map| map.average_reference());
    }

    pub fn normalize_all(&mut self, center_first: bool) {
        self.for_each_map_mut(|_, map| map.normalize(center_first));
    }

    pub fn to_rank_all(&mut self, data_type: DataType) {
        self.for_each_map_mut(|_, map| map.to_rank(data_type));
    }

    pub fn invert_map(&mut self, index: usize) {
        self.map_mut(index).invert();
    }

    /// One value per spatial point for every map (dipole norms for vectorial data).
    pub fn to_scalar_maps(&self, data_type: DataType) -> MapCollection {
        if !data_type.is_vectorial() {
            return self.clone();
        }
        let mut scalar = MapCollection::with_dimension(self.dimension / 3);
        scalar.sampling_frequency = self.sampling_frequency;
        for map in self.iter() {
            scalar.push(&scalar_map(map, data_type));
        }
        scalar
    }

    /// Indices of the maps that are not null.
    pub fn non_null_indices(&self) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, map)| !map.is_null())
            .map(|(i, _)| i)
            .collect()
    }
}
