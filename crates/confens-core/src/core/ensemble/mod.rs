//! # Ensemble Module
//!
//! This module contains the collection layer of the library: ordered
//! sequences of coordinate sets sharing one set of reference coordinates,
//! with a weighting policy that differs per variant.
//!
//! ## Key Components
//!
//! - [`ConformationCollection`] - The shared contract of both variants
//! - [`ensemble::Ensemble`] - One shared per-atom weight vector for every set
//! - [`pdb::PdbEnsemble`] - One independent per-atom weight row per set
//! - [`conformation`] - Non-owning views into a parent collection
//! - [`error::EnsembleError`] - The collection-level error taxonomy
//!
//! ## Weighting Regimes
//!
//! An [`ensemble::Ensemble`] models a homogeneous trajectory: the same atoms
//! are present in every set, so one weight vector (or none) applies
//! uniformly. A [`pdb::PdbEnsemble`] models heterogeneous structures where a
//! weight of zero marks an atom as absent in that particular set, excluding
//! it from superposition and RMSD for that set only.

pub mod conformation;
pub mod ensemble;
pub mod error;
pub mod pdb;
pub(crate) mod storage;

use crate::core::geometry::fit::{FitError, Transform};
use error::EnsembleError;
use nalgebra::{Point3, Vector3};
use pdb::PdbEnsemble;

/// The shared contract of both collection variants.
///
/// A collection starts uninitialized; its atom count N is fixed by the first
/// `set_coordinates` call, the first added coordinate set, or construction
/// from a provider, and cannot change afterwards. Absence of data (no stored
/// sets, no weights) is reported as `None`, never as an empty array, so that
/// callers can tell "no data" apart from "zero-length data."
pub trait ConformationCollection {
    /// Returns the established atom count, or 0 while uninitialized.
    fn num_atoms(&self) -> usize;

    /// Returns the number of stored coordinate sets.
    fn num_coordsets(&self) -> usize;

    /// Sets or replaces the reference coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::AtomCountMismatch`] if a different atom count
    /// was already established.
    fn set_coordinates(&mut self, coords: Vec<Point3<f64>>) -> Result<(), EnsembleError>;

    /// Returns the reference coordinates, or `None` while uninitialized.
    fn coordinates(&self) -> Option<&[Point3<f64>]>;

    /// Appends a coordinate set.
    ///
    /// The first set added to an uninitialized collection establishes the
    /// reference as a copy of itself. The meaning of `weights` is
    /// variant-specific: an `Ensemble` treats it as a replacement for the
    /// shared weight vector, a `PdbEnsemble` as this set's own weight row
    /// (defaulting to all-ones when omitted).
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::AtomCountMismatch`] if `coords` does not
    /// match the established atom count, or a weight validation error.
    fn add_coordset(
        &mut self,
        coords: Vec<Point3<f64>>,
        weights: Option<&[f64]>,
    ) -> Result<(), EnsembleError>;

    /// Returns the coordinate set at `index`, or `None` if out of range.
    fn coordset(&self, index: usize) -> Option<&[Point3<f64>]>;

    /// Returns all stored coordinate sets in order, or `None` when the
    /// collection holds zero sets.
    fn coordsets(&self) -> Option<&[Vec<Point3<f64>>]>;

    /// Returns copies of the coordinate sets at `indices`, stacked in the
    /// requested order.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::IndexOutOfRange`] on the first bad index.
    fn coordsets_at(&self, indices: &[usize]) -> Result<Vec<Vec<Point3<f64>>>, EnsembleError>;

    /// Returns a lazy, restartable iterator over the stored coordinate sets
    /// in index order.
    fn iter_coordsets(&self) -> CoordsetIter<'_>;

    /// Removes the coordinate set at `index`; later sets shift down by one.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::IndexOutOfRange`] if `index` is out of range.
    fn remove_coordset(&mut self, index: usize) -> Result<(), EnsembleError>;

    /// Removes the coordinate sets at `indices` (duplicates collapsed); the
    /// remainder keeps its relative order, re-indexed contiguously from 0.
    /// Removing every set also resets the weights to absent; the reference
    /// coordinates and atom count are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::IndexOutOfRange`] on any bad index, in which
    /// case nothing is removed.
    fn remove_coordsets(&mut self, indices: &[usize]) -> Result<(), EnsembleError>;

    /// Returns per-set per-atom difference vectors `set − reference`, or
    /// `None` when uninitialized or empty.
    fn deviations(&self) -> Option<Vec<Vec<Vector3<f64>>>>;

    /// Superposes every stored coordinate set onto the reference using the
    /// variant's weights, mutating the sets in place.
    ///
    /// Returns one outcome per set in stored order: the applied transform,
    /// or the fit error with the set left untouched. A degenerate fit for
    /// one set does not abort the rest of the batch.
    fn superpose(&mut self) -> Vec<Result<Transform, FitError>>;

    /// Iteratively superposes the stored sets onto a converging mean
    /// reference, until the RMSD between successive references drops to
    /// `threshold` or below. Returns the number of iterations taken.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::NoCoordinates`] when uninitialized, or
    /// [`EnsembleError::Fit`] if any per-set fit fails.
    fn iterpose(&mut self, threshold: f64) -> Result<usize, EnsembleError>;

    /// Computes the RMSD of every stored coordinate set against the
    /// reference, in stored order, using the variant's weights.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::Rmsd`] carrying the index of the first set
    /// whose RMSD is undefined or malformed.
    fn rmsds(&self) -> Result<Vec<f64>, EnsembleError>;

    /// Downcast hook for aggregate operations that only make sense on the
    /// per-set-weight variant. The variant set is closed by design.
    fn as_pdb_ensemble(&self) -> Option<&PdbEnsemble> {
        None
    }
}

/// Unweighted RMSD between successive reference estimates during iterative
/// superposition. Both slices always have the established atom count.
pub(crate) fn reference_shift(previous: &[Point3<f64>], current: &[Point3<f64>]) -> f64 {
    if previous.is_empty() {
        return 0.0;
    }
    let squared_sum: f64 = previous
        .iter()
        .zip(current.iter())
        .map(|(a, b)| (a - b).norm_squared())
        .sum();
    (squared_sum / previous.len() as f64).sqrt()
}

/// Lazy iterator over a collection's stored coordinate sets, in index order.
///
/// Distinct iterations are independent and may be read concurrently; the
/// iterator never mutates the collection.
#[derive(Debug, Clone)]
pub struct CoordsetIter<'a> {
    sets: &'a [Vec<Point3<f64>>],
    next: usize,
}

impl<'a> CoordsetIter<'a> {
    pub(crate) fn new(sets: &'a [Vec<Point3<f64>>]) -> Self {
        Self { sets, next: 0 }
    }
}

impl<'a> Iterator for CoordsetIter<'a> {
    type Item = &'a [Point3<f64>];

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.sets.get(self.next)?;
        self.next += 1;
        Some(item.as_slice())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sets.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CoordsetIter<'_> {}
