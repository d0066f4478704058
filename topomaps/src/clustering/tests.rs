use super::*;
use crate::similarity::is_opposite;
use crate::testing::{TestRng, dipole_maps, init_tracing, noisy_copies, prototypes};
use crate::{CentroidMethod, SegmentationConfig, segment};

const EVALUATE: PolarityMode = PolarityMode::Evaluate;
const SCALAR: DataType = DataType::Scalar;

fn assign(
    centroids: &MapCollection,
    data: &MapCollection,
    labeling: &mut Labeling,
    corr_limit: f64,
) {
    centroids.centroids_to_labeling(
        data,
        0..data.num_maps(),
        centroids.num_maps(),
        None,
        labeling,
        SCALAR,
        EVALUATE,
        corr_limit,
    );
}

/// Unit, zero-mean maps with pairwise correlations 0.9 (0-1), 0.2 (0-2), 0.5 (1-2).
fn three_centroids() -> MapCollection {
    let s2 = std::f64::consts::SQRT_2;
    let e1 = [1.0 / s2, -1.0 / s2, 0.0, 0.0];
    let e2 = [0.0, 0.0, 1.0 / s2, -1.0 / s2];
    let e3 = [0.5, 0.5, -0.5, -0.5];

    let b1 = 0.19f64.sqrt();
    let a2 = (0.5 - 0.9 * 0.2) / b1;
    let b2 = (1.0 - 0.2 * 0.2 - a2 * a2).sqrt();

    let combine = |x: f64, y: f64, z: f64| -> Vec<f32> {
        (0..4)
            .map(|i| (x * e1[i] + y * e2[i] + z * e3[i]) as f32)
            .collect()
    };
    MapCollection::from_maps([
        combine(1.0, 0.0, 0.0),
        combine(0.9, b1, 0.0),
        combine(0.2, a2, b2),
    ])
    .unwrap()
}

// ---------------------------------------------------------------------------
// Closest pair
// ---------------------------------------------------------------------------

#[test]
fn test_closest_pair_finds_most_correlated() {
    let centroids = three_centroids();
    let pair = centroids
        .closest_pair(3, SCALAR, PolarityMode::Direct)
        .unwrap();
    assert_eq!((pair.first, pair.second), (0, 1));
    assert!((pair.correlation - 0.9).abs() < 1e-5, "{pair:?}");

    let corr_12 = map_correlation(centroids.map(1), centroids.map(2), SCALAR, PolarityMode::Direct);
    assert!((corr_12 - 0.5).abs() < 1e-5);
}

#[test]
fn test_closest_pair_respects_num_clusters() {
    let centroids = three_centroids();
    let pair = centroids.closest_pair(2, SCALAR, EVALUATE).unwrap();
    assert_eq!((pair.first, pair.second), (0, 1));
    assert!(centroids.closest_pair(1, SCALAR, EVALUATE).is_none());
    assert!(MapCollection::new().closest_pair(5, SCALAR, EVALUATE).is_none());
}

#[test]
fn test_closest_pair_ties_go_to_smallest_pair() {
    let map = [1.0f32, -1.0, 0.5, -0.5];
    let centroids = MapCollection::from_maps([map; 5]).unwrap();
    let pair = centroids.closest_pair(5, SCALAR, EVALUATE).unwrap();
    assert_eq!((pair.first, pair.second), (0, 1));
}

#[test]
fn test_closest_pair_evaluate_sees_inverted_maps() {
    let a = [1.0f32, -1.0, 0.5, -0.5];
    let b = [0.2f32, 0.3, -0.1, -0.4];
    let inverted = [-1.0f32, 1.0, -0.5, 0.5];
    let centroids = MapCollection::from_maps([a, b, inverted]).unwrap();

    let pair = centroids.closest_pair(3, SCALAR, EVALUATE).unwrap();
    assert_eq!((pair.first, pair.second), (0, 2));
    assert!((pair.correlation - 1.0).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

#[test]
fn test_assignment_ties_go_to_first_cluster() {
    let mut rng = TestRng::new(1);
    let protos = prototypes(1, 16, &mut rng);
    let (data, _) = noisy_copies(&protos, 10, 0.05, &mut rng);
    let centroids = MapCollection::from_maps([&protos[0], &protos[0]]).unwrap();

    let mut labeling = Labeling::new(data.num_maps());
    assign(&centroids, &data, &mut labeling, 0.0);
    assert!((0..data.num_maps()).all(|i| labeling.label(i) == Some(0)));
}

#[test]
fn test_assignment_respects_eligibility_mask() {
    let mut rng = TestRng::new(2);
    let protos = prototypes(2, 16, &mut rng);
    let (data, _) = noisy_copies(&protos, 5, 0.05, &mut rng);
    let centroids = MapCollection::from_maps(&protos).unwrap();

    let mut labeling = Labeling::new(data.num_maps());
    centroids.centroids_to_labeling(
        &data,
        0..data.num_maps(),
        2,
        Some(&[false, true]),
        &mut labeling,
        SCALAR,
        EVALUATE,
        0.0,
    );
    assert!((0..data.num_maps()).all(|i| labeling.label(i) == Some(1)));

    centroids.centroids_to_labeling(
        &data,
        0..data.num_maps(),
        2,
        Some(&[false, false]),
        &mut labeling,
        SCALAR,
        EVALUATE,
        0.0,
    );
    assert_eq!(labeling.num_defined(), 0);
}

#[test]
fn test_assignment_recovers_prototypes_and_polarity() {
    let mut rng = TestRng::new(3);
    let protos = prototypes(3, 32, &mut rng);
    let (data, truth) = noisy_copies(&protos, 20, 0.03, &mut rng);
    let centroids = MapCollection::from_maps(&protos).unwrap();

    let mut labeling = Labeling::new(data.num_maps());
    assign(&centroids, &data, &mut labeling, 0.0);

    for (i, &p) in truth.iter().enumerate() {
        assert_eq!(labeling.label(i), Some(p));
        let expected = Polarity::from_opposite(is_opposite(data.map(i), &protos[p], SCALAR));
        assert_eq!(labeling.polarity(i), expected);
    }
}

#[test]
fn test_assignment_leaves_weak_and_null_maps_undefined() {
    let mut rng = TestRng::new(4);
    let protos = prototypes(2, 16, &mut rng);
    let centroids = MapCollection::from_maps(&protos).unwrap();

    let mut data = MapCollection::with_dimension(16);
    data.push(&protos[0]);
    data.push(&vec![0.0; 16]);
    let unrelated: Vec<f32> = (0..16).map(|_| rng.next_gaussian_f32()).collect();
    data.push(&unrelated);

    let mut labeling = Labeling::new(3);
    assign(&centroids, &data, &mut labeling, 0.95);
    assert_eq!(labeling.label(0), Some(0));
    assert!(!labeling.is_defined(1));
    assert!(!labeling.is_defined(2));
}

#[test]
fn test_assignment_only_touches_range() {
    let mut rng = TestRng::new(5);
    let protos = prototypes(2, 8, &mut rng);
    let (data, _) = noisy_copies(&protos, 4, 0.02, &mut rng);
    let centroids = MapCollection::from_maps(&protos).unwrap();

    let mut labeling = Labeling::new(data.num_maps());
    labeling.set(0, 7, Polarity::Invert);
    centroids.centroids_to_labeling(
        &data,
        2..6,
        2,
        None,
        &mut labeling,
        SCALAR,
        EVALUATE,
        0.0,
    );
    assert_eq!(labeling.label(0), Some(7));
    assert_eq!(labeling.polarity(0), Polarity::Invert);
    assert!(!labeling.is_defined(1));
    assert!((2..6).all(|i| labeling.is_defined(i)));
    assert!(!labeling.is_defined(6));
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn test_update_normalizes_and_refreshes_polarities() {
    let mut rng = TestRng::new(6);
    let protos = prototypes(2, 20, &mut rng);
    let (data, _) = noisy_copies(&protos, 10, 0.05, &mut rng);
    let mut centroids = MapCollection::from_maps(&protos).unwrap();

    let mut labeling = Labeling::new(data.num_maps());
    assign(&centroids, &data, &mut labeling, 0.0);
    for i in 0..data.num_maps() {
        let label = labeling.label(i).unwrap();
        labeling.set(i, label, Polarity::Direct);
    }
    // Medoids ignore the wiped polarities; the refresh must restore them.
    centroids.labeling_to_centroids(
        &data,
        2,
        &mut labeling,
        &CentroidConfig::new(CentroidMethod::Medoid, SCALAR),
        false,
        true,
    );

    for norm in centroids.norms(false) {
        assert!((norm - 1.0).abs() < 1e-5);
    }
    for map in centroids.iter() {
        assert!(map.mean().abs() < 1e-6);
    }
    for i in 0..data.num_maps() {
        let c = labeling.label(i).unwrap();
        let expected = Polarity::from_opposite(is_opposite(data.map(i), centroids.map(c), SCALAR));
        assert_eq!(labeling.polarity(i), expected);
    }
}

#[test]
fn test_update_of_empty_cluster_is_null() {
    let mut rng = TestRng::new(7);
    let protos = prototypes(1, 12, &mut rng);
    let (data, _) = noisy_copies(&protos, 6, 0.05, &mut rng);

    let mut labeling = Labeling::new(data.num_maps());
    for i in 0..data.num_maps() {
        labeling.set(i, 0, Polarity::Direct);
    }
    let mut centroids = MapCollection::zeros(2, 12);
    centroids.labeling_to_centroids(
        &data,
        2,
        &mut labeling,
        &CentroidConfig::mean(),
        true,
        true,
    );
    assert!(!centroids.map(0).is_null());
    assert!(centroids.map(1).is_null());
}

#[test]
fn test_update_then_assign_never_decreases_mean_correlation() {
    let mut rng = TestRng::new(8);
    let protos = prototypes(3, 24, &mut rng);
    let (mut data, _) = noisy_copies(&protos, 30, 0.08, &mut rng);
    data.normalize_all(true);

    let mut centroids = MapCollection::with_dimension(24);
    for _ in 0..3 {
        let mut values: Vec<f32> = (0..24).map(|_| rng.next_gaussian_f32()).collect();
        values.normalize(true);
        centroids.push(&values);
    }

    let mut labeling = Labeling::new(data.num_maps());
    assign(&centroids, &data, &mut labeling, 0.0);

    for _ in 0..5 {
        let before = mean_assigned_correlation(&data, &centroids, &labeling, SCALAR, EVALUATE);
        centroids.labeling_to_centroids(
            &data,
            3,
            &mut labeling,
            &CentroidConfig::mean(),
            false,
            false,
        );
        assign(&centroids, &data, &mut labeling, 0.0);
        let after = mean_assigned_correlation(&data, &centroids, &labeling, SCALAR, EVALUATE);
        assert!(after >= before - 1e-6, "{after} < {before}");
    }
}

#[test]
fn test_polarity_of_offset_maps_follows_centered_correlation() {
    let mut centroids = MapCollection::from_maps([[1.0f32, 2.0, 3.0, 4.0]]).unwrap();
    let data = MapCollection::from_maps([[4.0f32, 3.0, 2.0, 1.0], [1.0, 2.0, 3.0, 4.5]]).unwrap();

    let mut labeling = Labeling::new(2);
    assign(&centroids, &data, &mut labeling, 0.0);
    assert_eq!(labeling.label(0), Some(0));
    assert_eq!(labeling.polarity(0), Polarity::Invert);
    assert_eq!(labeling.polarity(1), Polarity::Direct);

    let before = mean_assigned_correlation(&data, &centroids, &labeling, SCALAR, EVALUATE);
    centroids.labeling_to_centroids(
        &data,
        1,
        &mut labeling,
        &CentroidConfig::mean(),
        false,
        true,
    );
    let after = mean_assigned_correlation(&data, &centroids, &labeling, SCALAR, EVALUATE);
    assert!(after >= before - 1e-6, "{after} < {before}");
    for map in data.iter() {
        let corr = map_correlation(map, centroids.map(0), SCALAR, EVALUATE);
        assert!(corr > 0.95, "{corr}");
    }
}

#[test]
fn test_update_of_offset_maps_keeps_fit() {
    let mut rng = TestRng::new(11);
    let protos = prototypes(3, 24, &mut rng);
    let (clean, truth) = noisy_copies(&protos, 20, 0.03, &mut rng);

    let mut data = MapCollection::with_dimension(24);
    for map in clean.iter() {
        let offset = 2.0 + 3.0 * rng.next_f32();
        let values: Vec<f32> = map.iter().map(|&v| v + offset).collect();
        data.push(&values);
    }

    let mut centroids = MapCollection::from_maps(&protos).unwrap();
    let mut labeling = Labeling::new(data.num_maps());
    assign(&centroids, &data, &mut labeling, 0.0);

    for (i, &p) in truth.iter().enumerate() {
        assert_eq!(labeling.label(i), Some(p));
        let direct = map_correlation(data.map(i), &protos[p], SCALAR, PolarityMode::Direct);
        assert_eq!(labeling.polarity(i), Polarity::from_opposite(direct < 0.0));
    }

    centroids.labeling_to_centroids(
        &data,
        3,
        &mut labeling,
        &CentroidConfig::mean(),
        false,
        true,
    );
    for (i, &p) in truth.iter().enumerate() {
        let corr = map_correlation(data.map(i), centroids.map(p), SCALAR, EVALUATE);
        assert!(corr > 0.9, "map {i}: {corr}");
    }
}

#[test]
fn test_update_keeps_previous_rows_as_references() {
    let mut rng = TestRng::new(12);
    let (data, axes) = dipole_maps(60, 5, &mut rng);

    let mut labeling = Labeling::new(data.num_maps());
    for i in 0..data.num_maps() {
        labeling.set(i, 0, Polarity::Direct);
    }

    let mut previous = Vec::with_capacity(15);
    for (p, axis) in axes.iter().enumerate() {
        let oriented = if p % 2 == 0 { *axis } else { -*axis };
        previous.extend([oriented.x as f32, oriented.y as f32, oriented.z as f32]);
    }
    let marker = vec![0.5f32; 15];
    let mut centroids = MapCollection::from_maps([previous.clone(), marker.clone()]).unwrap();

    let config = CentroidConfig::new(CentroidMethod::Mean, DataType::Vectorial);
    centroids.labeling_to_centroids(&data, 1, &mut labeling, &config, false, false);

    assert_eq!(centroids.num_maps(), 2);
    assert_eq!(centroids.map(1), &marker[..]);
    for p in 0..5 {
        let dipole = centroids.map(0).dipole(p).normalize();
        assert!(dipole.dot(previous.dipole(p)) > 0.99, "point {p}");
    }

    let mut grown = MapCollection::with_dimension(15);
    grown.labeling_to_centroids(&data, 2, &mut labeling, &config, false, false);
    assert_eq!(grown.num_maps(), 2);
    assert!(!grown.map(0).is_null());
    assert!(grown.map(1).is_null());
}

// ---------------------------------------------------------------------------
// Quality measures
// ---------------------------------------------------------------------------

#[test]
fn test_gev_of_exact_fit_is_one() {
    let mut rng = TestRng::new(9);
    let protos = prototypes(2, 10, &mut rng);
    let centroids = MapCollection::from_maps(&protos).unwrap();
    let mut data = MapCollection::from_maps(&protos).unwrap();
    data *= 3.0;

    let mut labeling = Labeling::new(2);
    assign(&centroids, &data, &mut labeling, 0.0);

    let gev = global_explained_variance(&data, &centroids, &labeling, SCALAR, EVALUATE);
    assert!((gev - 1.0).abs() < 1e-6);
    let corr = mean_assigned_correlation(&data, &centroids, &labeling, SCALAR, EVALUATE);
    assert!((corr - 1.0).abs() < 1e-6);

    labeling.reset();
    assert_eq!(
        global_explained_variance(&data, &centroids, &labeling, SCALAR, EVALUATE),
        0.0
    );
    assert_eq!(
        mean_assigned_correlation(&data, &centroids, &labeling, SCALAR, EVALUATE),
        0.0
    );
}

// ---------------------------------------------------------------------------
// Segmentation driver
// ---------------------------------------------------------------------------

#[test]
fn test_segment_recovers_prototypes() {
    init_tracing();

    let mut rng = TestRng::new(10);
    let protos = prototypes(3, 32, &mut rng);
    let (data, truth) = noisy_copies(&protos, 40, 0.05, &mut rng);
    let config = SegmentationConfig::new(3);

    // Restarts guard against initial centroids drawn from one prototype.
    let best = (0..30)
        .map(|_| segment(&data, &config, rng.inner()).unwrap())
        .max_by(|a, b| a.gev.total_cmp(&b.gev))
        .unwrap();

    assert!(best.gev > 0.8, "gev = {}", best.gev);
    assert!(best.iterations <= config.max_iterations);
    assert_eq!(best.labeling.num_defined(), data.num_maps());

    for c in 0..3 {
        let members = best.labeling.cluster_indices(c);
        assert!(!members.is_empty());
        let p = truth[members[0]];
        assert!(members.iter().all(|&i| truth[i] == p));
    }
}

#[test]
fn test_segment_rejects_bad_input() {
    let mut rng = TestRng::new(11);
    let data = MapCollection::from_flat(vec![1.0, -1.0, 0.0, 0.0, 2.0, -2.0], 2).unwrap();

    assert_eq!(
        segment(&data, &SegmentationConfig::new(3), rng.inner()),
        Err(crate::Error::TooFewMaps {
            available: 2,
            requested: 3
        })
    );
    assert_eq!(
        segment(&data, &SegmentationConfig::new(0), rng.inner()),
        Err(crate::Error::InvalidClusterCount)
    );

    let mut vectorial = SegmentationConfig::new(1);
    vectorial.centroid.data_type = DataType::Vectorial;
    assert_eq!(
        segment(&data, &vectorial, rng.inner()),
        Err(crate::Error::NotVectorial(2))
    );
}

#[test]
fn test_segment_is_reproducible() {
    let mut rng = TestRng::new(12);
    let protos = prototypes(2, 16, &mut rng);
    let (data, _) = noisy_copies(&protos, 15, 0.1, &mut rng);
    let config = SegmentationConfig::new(2);

    let first = segment(&data, &config, TestRng::new(99).inner()).unwrap();
    let second = segment(&data, &config, TestRng::new(99).inner()).unwrap();
    assert_eq!(first, second);
}
