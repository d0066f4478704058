//! Testing utilities: deterministic random numbers and synthetic map sets.

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{DataType, Map, MapCollection};

pub use common::log_setup::init_test_logging as init_tracing;

/// Seeded generator with a Gaussian helper.
pub struct TestRng {
    rng: ChaCha8Rng,
}

impl TestRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Standard normal sample (Box-Muller).
    pub fn next_gaussian_f32(&mut self) -> f32 {
        let u1 = self.rng.random::<f32>().max(f32::MIN_POSITIVE);
        let u2 = self.rng.random::<f32>();
        (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
    }

    pub fn next_sign(&mut self) -> f32 {
        if self.rng.random::<bool>() { 1.0 } else { -1.0 }
    }

    pub fn inner(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

/// Random average-referenced, unit-norm prototype maps.
pub fn prototypes(count: usize, dimension: usize, rng: &mut TestRng) -> Vec<Map> {
    use crate::MapExt;

    (0..count)
        .map(|_| {
            let mut map = Map::from_vec((0..dimension).map(|_| rng.next_gaussian_f32()).collect());
            map.normalize(true);
            map
        })
        .collect()
}

/// `per_prototype` noisy copies of each prototype with random polarity,
/// interleaved so that consecutive maps come from different prototypes.
/// Returns the collection and the generating prototype index of every map.
pub fn noisy_copies(
    prototypes: &[Map],
    per_prototype: usize,
    noise: f32,
    rng: &mut TestRng,
) -> (MapCollection, Vec<usize>) {
    let dimension = prototypes[0].len();
    let mut data = MapCollection::with_dimension(dimension);
    let mut truth = Vec::new();

    for _ in 0..per_prototype {
        for (p, proto) in prototypes.iter().enumerate() {
            let sign = rng.next_sign();
            let values: Vec<f32> = proto
                .iter()
                .map(|&v| sign * v + noise * rng.next_gaussian_f32())
                .collect();
            data.push(&values);
            truth.push(p);
        }
    }

    (data, truth)
}

/// Vectorial maps whose dipoles share a fixed axis per point, with random
/// per-dipole sign and magnitude.
pub fn dipole_maps(
    num_maps: usize,
    num_points: usize,
    rng: &mut TestRng,
) -> (MapCollection, Vec<glam::DVec3>) {
    let axes: Vec<glam::DVec3> = (0..num_points)
        .map(|_| {
            glam::DVec3::new(
                rng.next_gaussian_f32() as f64,
                rng.next_gaussian_f32() as f64,
                rng.next_gaussian_f32() as f64,
            )
            .normalize()
        })
        .collect();

    let mut data = MapCollection::with_dimension(num_points * 3);
    for _ in 0..num_maps {
        let mut values = Vec::with_capacity(num_points * 3);
        for axis in &axes {
            let amplitude = (rng.next_sign() * (0.5 + rng.next_f32())) as f64;
            let jitter = 0.02;
            values.push((axis.x * amplitude + jitter * rng.next_gaussian_f32() as f64) as f32);
            values.push((axis.y * amplitude + jitter * rng.next_gaussian_f32() as f64) as f32);
            values.push((axis.z * amplitude + jitter * rng.next_gaussian_f32() as f64) as f32);
        }
        data.push(&values);
    }

    (data, axes)
}

/// Shorthand for a data type used by most scalar tests.
pub const SCALAR: DataType = DataType::Scalar;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapExt;

    #[test]
    fn test_dipole_maps_follow_their_axes() {
        let mut rng = TestRng::new(1);
        let (data, axes) = dipole_maps(40, 3, &mut rng);
        assert_eq!(data.num_maps(), 40);
        assert_eq!(data.dimension(), 9);

        for map in data.iter() {
            for (p, axis) in axes.iter().enumerate() {
                let dipole = map.dipole(p);
                assert!((0.4..1.6).contains(&dipole.length()), "{dipole}");
                assert!(dipole.normalize().dot(*axis).abs() > 0.9);
            }
        }
    }
}
