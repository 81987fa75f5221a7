use thiserror::Error;

use crate::core::geometry::fit::FitError;
use crate::core::geometry::rmsd::RmsdError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnsembleError {
    #[error("Coordinate set has {found} atoms, but the collection is fixed at {expected}")]
    AtomCountMismatch { expected: usize, found: usize },

    #[error("Weight vector has {found} entries, but the collection has {expected} atoms")]
    WeightCountMismatch { expected: usize, found: usize },

    #[error("Provider weights have the wrong shape for this variant: expected {expected}")]
    WeightShapeMismatch { expected: &'static str },

    #[error("Weight at position {index} is negative: {value}")]
    NegativeWeight { index: usize, value: f64 },

    #[error("No reference coordinates have been set")]
    NoCoordinates,

    #[error("Coordinate provider yielded no coordinate sets")]
    EmptySource,

    #[error("Index {index} is out of range for {len} coordinate sets")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Operation '{operation}' is not supported by this collection variant")]
    TypeMismatch { operation: &'static str },

    #[error("Superposition failed for coordinate set {index}: {source}")]
    Fit {
        index: usize,
        #[source]
        source: FitError,
    },

    #[error("RMSD computation failed for coordinate set {index}: {source}")]
    Rmsd {
        index: usize,
        #[source]
        source: RmsdError,
    },
}
