//! Topomaps - topographic map clustering engine.
//!
//! Operates on ordered collections of fixed-dimension maps (electrode
//! potentials, or 3-D dipoles at solution points) and provides:
//! - Polarity-aware correlation between maps
//! - Centroid estimators (mean, weighted mean, median, medoid, eigenvector)
//! - Assign / update half-steps of segmentation and a ready-made driver
//! - Robust Z-score normalization of map amplitudes
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use topomaps::{MapCollection, SegmentationConfig, segment};
//! use rand::SeedableRng;
//!
//! let data = MapCollection::from_flat(samples, num_electrodes)?;
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
//! let result = segment(&data, &SegmentationConfig::new(4), &mut rng)?;
//!
//! println!("GEV {:.3} after {} iterations", result.gev, result.iterations);
//! ```

mod centroid;
mod clustering;
mod collection;
mod error;
mod labeling;
mod map;
pub(crate) mod math;
mod polarity;
mod similarity;
mod zscore;

#[cfg(test)]
pub mod testing;

// ============================================================================
// Core data types
// ============================================================================

pub use collection::MapCollection;
pub use error::{Error, Result};
pub use map::{Map, MapExt, scalar_map};
pub use polarity::{DataType, Polarity, PolarityMode};

// ============================================================================
// Similarity
// ============================================================================

pub use similarity::{
    CorrelationType, circular_linear, correlate, evaluate_polarity, is_opposite, map_correlation,
    spearman,
};

// ============================================================================
// Centroids
// ============================================================================

pub use centroid::{CentroidConfig, CentroidMethod, DEFAULT_MAX_SAMPLES, LabelSubset};

// ============================================================================
// Labeling and segmentation
// ============================================================================

pub use clustering::{
    ClosestPair, Segmentation, SegmentationConfig, global_explained_variance,
    mean_assigned_correlation, segment,
};
pub use labeling::Labeling;

// ============================================================================
// Normalization
// ============================================================================

pub use zscore::{ZScoreConfig, ZScoreKind, ZScoreTable};
