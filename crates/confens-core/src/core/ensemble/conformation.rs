use super::ensemble::Ensemble;
use super::pdb::PdbEnsemble;
use crate::core::geometry::rmsd::{RmsdError, calculate_rmsd};
use nalgebra::Point3;

/// A non-owning view of one coordinate set in an [`Ensemble`].
///
/// The view is an index plus a borrow of the parent; it stores no coordinate
/// data of its own, and the borrow keeps the parent immutable for as long as
/// the view is alive, so the index cannot be invalidated underneath it.
#[derive(Debug, Clone, Copy)]
pub struct Conformation<'a> {
    parent: &'a Ensemble,
    index: usize,
}

impl<'a> Conformation<'a> {
    /// Callers construct views through `Ensemble::conformation`, which
    /// bounds-checks the index.
    pub(crate) fn new(parent: &'a Ensemble, index: usize) -> Self {
        Self { parent, index }
    }

    /// Returns the position of this view's coordinate set in the parent.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the parent's atom count.
    pub fn num_atoms(&self) -> usize {
        self.parent.store.num_atoms()
    }

    /// Returns the parent's coordinate set at this view's index.
    pub fn coordinates(&self) -> &'a [Point3<f64>] {
        self.parent.store.set_slice(self.index)
    }

    /// Returns the parent's shared weight vector, or `None` when unweighted.
    pub fn weights(&self) -> Option<&'a [f64]> {
        self.parent.weights()
    }

    /// Computes this conformation's weighted RMSD against the parent's
    /// reference coordinates.
    pub fn rmsd(&self) -> Result<f64, RmsdError> {
        calculate_rmsd(
            self.parent.store.reference().unwrap_or_default(),
            self.coordinates(),
            self.weights(),
        )
    }
}

/// A non-owning view of one coordinate set in a [`PdbEnsemble`].
///
/// Unlike [`Conformation`], the weights returned here are this set's own
/// weight row, not a vector shared across the collection.
#[derive(Debug, Clone, Copy)]
pub struct PdbConformation<'a> {
    parent: &'a PdbEnsemble,
    index: usize,
}

impl<'a> PdbConformation<'a> {
    pub(crate) fn new(parent: &'a PdbEnsemble, index: usize) -> Self {
        Self { parent, index }
    }

    /// Returns the position of this view's coordinate set in the parent.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the parent's atom count.
    pub fn num_atoms(&self) -> usize {
        self.parent.store.num_atoms()
    }

    /// Returns the parent's coordinate set at this view's index.
    pub fn coordinates(&self) -> &'a [Point3<f64>] {
        self.parent.store.set_slice(self.index)
    }

    /// Returns this coordinate set's weight row.
    pub fn weights(&self) -> Option<&'a [f64]> {
        self.parent.weights_for(self.index)
    }

    /// Computes this conformation's weighted RMSD against the parent's
    /// reference coordinates, with weight-zero atoms excluded.
    pub fn rmsd(&self) -> Result<f64, RmsdError> {
        calculate_rmsd(
            self.parent.store.reference().unwrap_or_default(),
            self.coordinates(),
            self.weights(),
        )
    }
}
