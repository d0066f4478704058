//! Single topographic map: a fixed-length buffer of samples.
//!
//! All numeric operations live on `[f32]` through [`MapExt`], so a row
//! borrowed from a [`crate::MapCollection`] and an owned [`Map`] share one
//! implementation.

mod ops;


use std::ops::{Deref, DerefMut};

use common::float_ext::FloatExt;
use common::non_null;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::math::average_ranks;
use crate::polarity::{DataType, PolarityMode};

/// Map operations on a borrowed sample slice.
///
/// Binary operations require both maps to share a dimension and panic
/// otherwise.
pub trait MapExt {
    /// Arithmetic mean of the samples, 0 for an empty map.
    fn mean(&self) -> f64;

    /// True when every sample is exactly zero (or the map is empty).
    fn is_null(&self) -> bool;

    /// Number of 3-sample dipoles (vectorial layout).
    fn num_dipoles(&self) -> usize;

    /// Dipole `index` of a vectorial map.
    fn dipole(&self, index: usize) -> DVec3;

    /// L2 norm, optionally after removing the mean.
    fn norm(&self, center_first: bool) -> f64;

    fn scalar_product(&self, other: &[f32]) -> f64;

    /// Scalar product after removing each map's mean.
    fn centered_product(&self, other: &[f32]) -> f64;

    /// Negative uncentered scalar product.
    fn is_opposite_direction(&self, other: &[f32]) -> bool;

    /// Pearson (centered) or cosine (uncentered) correlation in `[-1, 1]`.
    ///
    /// Under [`PolarityMode::Evaluate`] the absolute value is returned. Zero
    /// norm inputs correlate to 0.
    fn correlation(&self, other: &[f32], mode: PolarityMode, center_first: bool) -> f64;

    /// Correlation of vectorial maps where every dipole pair picks its own sign.
    ///
    /// With `out_signs` (one slot per dipole) the chosen `+1`/`-1` is written back.
    fn correlation_dipoles(
        &self,
        other: &[f32],
        mode: PolarityMode,
        out_signs: Option<&mut [f32]>,
    ) -> f64;

    /// Global field power: spatial standard deviation for scalar data, RMS for
    /// positive data, RMS of dipole norms for vectorial data.
    fn gfp(&self, data_type: DataType) -> f64;

    fn average_reference(&mut self);

    /// Optionally average-reference, then scale to unit norm. No-op on a null map.
    fn normalize(&mut self, center_first: bool);

    fn invert(&mut self);

    fn scale(&mut self, factor: f32);

    /// Replace values (dipole norms for vectorial data) by their rank in `(0, 1]`.
    fn to_rank(&mut self, data_type: DataType);

    fn set_dipole(&mut self, index: usize, dipole: DVec3);
}

#[inline]
fn assert_same_dimension(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len(), "Maps must have equal dimension");
}

impl MapExt for [f32] {
    fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.iter().map(|&v| v as f64).sum::<f64>() / self.len() as f64
    }

    fn is_null(&self) -> bool {
        self.iter().all(|&v| v == 0.0)
    }

    #[inline]
    fn num_dipoles(&self) -> usize {
        self.len() / 3
    }

    #[inline]
    fn dipole(&self, index: usize) -> DVec3 {
        let i = index * 3;
        DVec3::new(self[i] as f64, self[i + 1] as f64, self[i + 2] as f64)
    }

    fn norm(&self, center_first: bool) -> f64 {
        let center = if center_first { self.mean() } else { 0.0 };
        self.iter()
            .map(|&v| {
                let d = v as f64 - center;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    fn scalar_product(&self, other: &[f32]) -> f64 {
        assert_same_dimension(self, other);
        self.iter()
            .zip(other)
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum()
    }

    fn centered_product(&self, other: &[f32]) -> f64 {
        assert_same_dimension(self, other);
        let (mean_a, mean_b) = (self.mean(), other.mean());
        self.iter()
            .zip(other)
            .map(|(&a, &b)| (a as f64 - mean_a) * (b as f64 - mean_b))
            .sum()
    }

    #[inline]
    fn is_opposite_direction(&self, other: &[f32]) -> bool {
        self.scalar_product(other) < 0.0
    }

    fn correlation(&self, other: &[f32], mode: PolarityMode, center_first: bool) -> f64 {
        assert_same_dimension(self, other);

        let (mean_a, mean_b) = if center_first {
            (self.mean(), other.mean())
        } else {
            (0.0, 0.0)
        };

        let mut sum_ab = 0.0f64;
        let mut sum_aa = 0.0f64;
        let mut sum_bb = 0.0f64;
        for (&a, &b) in self.iter().zip(other) {
            let a = a as f64 - mean_a;
            let b = b as f64 - mean_b;
            sum_ab += a * b;
            sum_aa += a * a;
            sum_bb += b * b;
        }

        let corr = sum_ab / non_null((sum_aa * sum_bb).sqrt());
        let corr = match mode {
            PolarityMode::Direct => corr,
            PolarityMode::Evaluate => corr.abs(),
        };
        corr.clamp_unit()
    }

    fn correlation_dipoles(
        &self,
        other: &[f32],
        mode: PolarityMode,
        mut out_signs: Option<&mut [f32]>,
    ) -> f64 {
        assert_same_dimension(self, other);

        let mut sum_ab = 0.0f64;
        let mut sum_aa = 0.0f64;
        let mut sum_bb = 0.0f64;
        for i in 0..self.num_dipoles() {
            let a = self.dipole(i);
            let b = other.dipole(i);
            let mut dot = a.dot(b);
            let mut sign = 1.0;
            if mode == PolarityMode::Evaluate && dot < 0.0 {
                dot = -dot;
                sign = -1.0;
            }
            if let Some(signs) = out_signs.as_deref_mut() {
                signs[i] = sign;
            }
            sum_ab += dot;
            sum_aa += a.length_squared();
            sum_bb += b.length_squared();
        }

        (sum_ab / non_null((sum_aa * sum_bb).sqrt())).clamp_unit()
    }

    fn gfp(&self, data_type: DataType) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        match data_type {
            DataType::Scalar => self.norm(true) / (self.len() as f64).sqrt(),
            DataType::Positive => self.norm(false) / (self.len() as f64).sqrt(),
            DataType::Vectorial => {
                let points = self.num_dipoles().max(1);
                self.norm(false) / (points as f64).sqrt()
            }
        }
    }

    fn average_reference(&mut self) {
        if self.is_empty() {
            return;
        }
        let mean = self.mean() as f32;
        for v in self.iter_mut() {
            *v -= mean;
        }
    }

    fn normalize(&mut self, center_first: bool) {
        if center_first {
            self.average_reference();
        }
        let norm = self.norm(false);
        if norm > 0.0 && norm.is_finite() {
            self.scale((1.0 / norm) as f32);
        }
    }

    fn invert(&mut self) {
        for v in self.iter_mut() {
            *v = -*v;
        }
    }

    fn scale(&mut self, factor: f32) {
        for v in self.iter_mut() {
            *v *= factor;
        }
    }

    fn to_rank(&mut self, data_type: DataType) {
        if self.is_empty() {
            return;
        }
        match data_type {
            DataType::Scalar | DataType::Positive => {
                let n = self.len() as f64;
                let ranks = average_ranks(self);
                for (v, r) in self.iter_mut().zip(ranks) {
                    *v = (r / n) as f32;
                }
            }
            DataType::Vectorial => {
                let norms: Vec<f32> = (0..self.num_dipoles())
                    .map(|i| self.dipole(i).length() as f32)
                    .collect();
                let n = norms.len() as f64;
                let ranks = average_ranks(&norms);
                for (i, (&norm, rank)) in norms.iter().zip(ranks).enumerate() {
                    if norm > 0.0 {
                        let dipole = self.dipole(i) * (rank / n / norm as f64);
                        self.set_dipole(i, dipole);
                    }
                }
            }
        }
    }

    #[inline]
    fn set_dipole(&mut self, index: usize, dipole: DVec3) {
        let i = index * 3;
        self[i] = dipole.x as f32;
        self[i + 1] = dipole.y as f32;
        self[i + 2] = dipole.z as f32;
    }
}

/// Owned map of `dimension` samples.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Map {
    values: Vec<f32>,
}

impl Map {
    /// Null map of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            values: vec![0.0; dimension],
        }
    }

    pub fn from_vec(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn from_dipoles(dipoles: &[DVec3]) -> Self {
        let mut map = Self::new(dipoles.len() * 3);
        for (i, &dipole) in dipoles.iter().enumerate() {
            map.set_dipole(i, dipole);
        }
        map
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Resize to `dimension` samples, all zero.
    pub fn resize(&mut self, dimension: usize) {
        self.values.clear();
        self.values.resize(dimension, 0.0);
    }

    /// Zero all samples, keeping the dimension.
    pub fn reset(&mut self) {
        self.values.fill(0.0);
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }

    /// One value per spatial point: dipole norms for vectorial data, a copy otherwise.
    pub fn to_scalar_map(&self, data_type: DataType) -> Map {
        scalar_map(&self.values, data_type)
    }
}

/// Reduce a map to one value per spatial point.
pub fn scalar_map(values: &[f32], data_type: DataType) -> Map {
    match data_type {
        DataType::Vectorial => Map::from_vec(
            (0..values.num_dipoles())
                .map(|i| values.dipole(i).length() as f32)
                .collect(),
        ),
        DataType::Scalar | DataType::Positive => Map::from_vec(values.to_vec()),
    }
}

impl Deref for Map {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.values
    }
}

impl DerefMut for Map {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }
}

impl AsRef<[f32]> for Map {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

impl From<Vec<f32>> for Map {
    fn from(values: Vec<f32>) -> Self {
        Self { values }
    }
}

impl From<&[f32]> for Map {
    fn from(values: &[f32]) -> Self {
        Self {
            values: values.to_vec(),
        }
    }
}
