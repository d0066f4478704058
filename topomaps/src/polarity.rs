//! Data layout and polarity tags shared by every algorithm.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Layout and sign semantics of the values in a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    /// One signed value per spatial point (e.g. electrode potentials).
    #[default]
    Scalar,
    /// One non-negative value per spatial point (norms, power).
    Positive,
    /// Three values per spatial point, read as a 3-D dipole.
    Vectorial,
}

impl DataType {
    /// Whether maps of this type are average-referenced before comparison.
    #[inline]
    pub fn centers_maps(self) -> bool {
        matches!(self, DataType::Scalar)
    }

    /// Whether a sign flip can make two maps of this type more similar.
    #[inline]
    pub fn is_sign_ambiguous(self) -> bool {
        !matches!(self, DataType::Positive)
    }

    #[inline]
    pub fn is_vectorial(self) -> bool {
        matches!(self, DataType::Vectorial)
    }
}

/// Sign orientation recorded for a map relative to its centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Polarity {
    #[default]
    Direct,
    Invert,
}

impl Polarity {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Polarity::Direct => 1.0,
            Polarity::Invert => -1.0,
        }
    }

    #[inline]
    pub fn from_opposite(opposite: bool) -> Self {
        if opposite {
            Polarity::Invert
        } else {
            Polarity::Direct
        }
    }
}

/// How an algorithm treats polarity when comparing or accumulating maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum PolarityMode {
    /// Signs are meaningful; compare maps as they are.
    Direct,
    /// Signs are ambiguous; each comparison picks the better orientation.
    #[default]
    Evaluate,
}

impl PolarityMode {
    /// `Evaluate` only has an effect on sign-ambiguous data.
    #[inline]
    pub fn evaluates(self, data_type: DataType) -> bool {
        self == PolarityMode::Evaluate && data_type.is_sign_ambiguous()
    }
}
