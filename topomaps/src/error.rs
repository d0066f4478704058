//! Error types for building collections and running segmentations.

use thiserror::Error;

/// Errors raised at the input boundary of the engine.
///
/// The numeric core never fails; these only guard caller-supplied buffers
/// and configurations.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Map dimension must be positive, got {0}")]
    InvalidDimension(usize),

    #[error("Buffer of {len} values is not a whole number of maps of dimension {dimension}")]
    LengthMismatch { len: usize, dimension: usize },

    #[error("Map {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Vectorial maps need a dimension divisible by 3, got {0}")]
    NotVectorial(usize),

    #[error("Cannot segment {available} non-null maps into {requested} clusters")]
    TooFewMaps { available: usize, requested: usize },

    #[error("Number of clusters must be at least 1")]
    InvalidClusterCount,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_message() {
        let err = Error::LengthMismatch {
            len: 10,
            dimension: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("3"));
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = Error::DimensionMismatch {
            index: 4,
            expected: 64,
            actual: 32,
        };
        assert_eq!(err.to_string(), "Map 4 has dimension 32, expected 64");
    }

    #[test]
    fn test_too_few_maps_message() {
        let err = Error::TooFewMaps {
            available: 2,
            requested: 5,
        };
        assert!(err.to_string().contains("2 non-null maps into 5 clusters"));
    }
}
