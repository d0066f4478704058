//! Benchmarks for assignment, centroid estimation and segmentation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use topomaps::{
    CentroidConfig, CentroidMethod, DataType, Labeling, MapCollection, MapExt, PolarityMode,
    SegmentationConfig, segment,
};

const NUM_ELECTRODES: usize = 128;
const NUM_MAPS: usize = 5000;
const NUM_CLUSTERS: usize = 6;

/// Noisy, randomly signed copies of a few random topographies.
fn synthetic_data(rng: &mut ChaCha8Rng) -> MapCollection {
    let protos: Vec<Vec<f32>> = (0..NUM_CLUSTERS)
        .map(|_| {
            let mut map: Vec<f32> = (0..NUM_ELECTRODES)
                .map(|_| rng.random::<f32>() - 0.5)
                .collect();
            map.normalize(true);
            map
        })
        .collect();

    let mut data = MapCollection::with_dimension(NUM_ELECTRODES);
    for t in 0..NUM_MAPS {
        let proto = &protos[t % NUM_CLUSTERS];
        let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
        let map: Vec<f32> = proto
            .iter()
            .map(|&v| sign * v + 0.02 * (rng.random::<f32>() - 0.5))
            .collect();
        data.push(&map);
    }
    data
}

fn bench_assignment(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let data = synthetic_data(&mut rng);
    let centroids = data.select(&(0..NUM_CLUSTERS).collect::<Vec<_>>());
    let mut labeling = Labeling::new(data.num_maps());

    c.bench_function("centroids_to_labeling", |b| {
        b.iter(|| {
            centroids.centroids_to_labeling(
                black_box(&data),
                0..data.num_maps(),
                NUM_CLUSTERS,
                None,
                &mut labeling,
                DataType::Scalar,
                PolarityMode::Evaluate,
                0.0,
            );
        })
    });
}

fn bench_centroids(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(43);
    let data = synthetic_data(&mut rng);
    let subset = data.select(&(0..1000).collect::<Vec<_>>());

    let mut group = c.benchmark_group("compute_centroid");
    for method in [
        CentroidMethod::Mean,
        CentroidMethod::Median,
        CentroidMethod::Medoid,
        CentroidMethod::WeightedMean,
        CentroidMethod::EigenVector,
    ] {
        let config = CentroidConfig::new(method, DataType::Scalar).with_max_samples(500);
        group.bench_with_input(BenchmarkId::from_parameter(method), &config, |b, config| {
            b.iter(|| black_box(subset.compute_centroid(config, None, None)))
        });
    }
    group.finish();
}

fn bench_segmentation(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(44);
    let data = synthetic_data(&mut rng);
    let config = SegmentationConfig::new(NUM_CLUSTERS);

    let mut group = c.benchmark_group("segment");
    group.sample_size(10);
    group.bench_function("mean", |b| {
        b.iter(|| black_box(segment(&data, &config, &mut rng)))
    });
    group.finish();
}

criterion_group!(benches, bench_assignment, bench_centroids, bench_segmentation);
criterion_main!(benches);
