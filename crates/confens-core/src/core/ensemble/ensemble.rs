use super::ConformationCollection;
use super::CoordsetIter;
use super::conformation::Conformation;
use super::error::EnsembleError;
use super::storage::{CoordsetStore, removal_mask, validate_weights};
use crate::core::geometry::fit::{FitError, Transform, calculate_transformation};
use crate::core::geometry::rmsd::calculate_rmsd;
use crate::core::source::{CoordinateSource, InitialWeights};
use nalgebra::{Point3, Vector3};
use std::ops::Range;
use tracing::{debug, instrument};

/// A conformational ensemble with a single shared per-atom weight vector.
///
/// This variant models a homogeneous trajectory: every coordinate set
/// contains the same atoms, so one weight vector (or none, meaning uniform
/// weights) applies to all of them. Adding a coordinate set with weights
/// *replaces* the shared vector rather than appending a row.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ensemble {
    pub(crate) store: CoordsetStore,
    weights: Option<Vec<f64>>,
}

impl Ensemble {
    /// Creates a new, uninitialized ensemble.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an ensemble from a coordinate provider.
    ///
    /// The reference becomes a copy of the provider's first coordinate set,
    /// and every set is appended in order.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::EmptySource`] if the provider yields no sets,
    /// [`EnsembleError::AtomCountMismatch`] if any set disagrees with the
    /// provider's atom count, and [`EnsembleError::WeightShapeMismatch`] if
    /// the provider carries per-set weight rows instead of a shared vector.
    pub fn from_source(source: &impl CoordinateSource) -> Result<Self, EnsembleError> {
        let sets = source.coordinate_sets();
        if sets.is_empty() {
            return Err(EnsembleError::EmptySource);
        }
        let num_atoms = source.num_atoms();

        let weights = match source.initial_weights() {
            None => None,
            Some(InitialWeights::Shared(w)) => {
                validate_weights(&w, num_atoms)?;
                Some(w)
            }
            Some(InitialWeights::PerSet(_)) => {
                return Err(EnsembleError::WeightShapeMismatch {
                    expected: "a shared per-atom weight vector",
                });
            }
        };

        let mut store = CoordsetStore::new();
        store.set_reference(sets[0].clone())?;
        for set in sets {
            if set.len() != num_atoms {
                return Err(EnsembleError::AtomCountMismatch {
                    expected: num_atoms,
                    found: set.len(),
                });
            }
            store.push_set(set)?;
        }

        Ok(Self { store, weights })
    }

    /// Returns the shared weight vector, or `None` when unweighted.
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Replaces the shared weight vector.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::NoCoordinates`] while uninitialized,
    /// [`EnsembleError::WeightCountMismatch`] on a length disagreement, and
    /// [`EnsembleError::NegativeWeight`] on a negative entry.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<(), EnsembleError> {
        if !self.store.is_initialized() {
            return Err(EnsembleError::NoCoordinates);
        }
        validate_weights(weights, self.store.num_atoms())?;
        self.weights = Some(weights.to_vec());
        Ok(())
    }

    /// Returns a non-owning view of the coordinate set at `index`, or `None`
    /// if out of range.
    pub fn conformation(&self, index: usize) -> Option<Conformation<'_>> {
        if index < self.store.num_coordsets() {
            Some(Conformation::new(self, index))
        } else {
            None
        }
    }

    /// Returns an iterator over views of every stored coordinate set.
    pub fn conformations(&self) -> impl Iterator<Item = Conformation<'_>> {
        (0..self.store.num_coordsets()).map(move |index| Conformation::new(self, index))
    }

    /// Builds a new ensemble containing copies of the coordinate sets in
    /// `range`, sharing this ensemble's reference coordinates and weights.
    /// The result owns its data independently.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::IndexOutOfRange`] if the range end exceeds
    /// the number of stored sets.
    pub fn slice(&self, range: Range<usize>) -> Result<Self, EnsembleError> {
        if range.end > self.store.num_coordsets() {
            return Err(EnsembleError::IndexOutOfRange {
                index: range.end,
                len: self.store.num_coordsets(),
            });
        }
        let indices: Vec<usize> = range.collect();
        self.select(&indices)
    }

    /// Builds a new ensemble containing copies of the coordinate sets at
    /// `indices`, in the requested order.
    ///
    /// A zero-set result carries no weights, matching the absent state a
    /// collection reaches when every set is removed.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::IndexOutOfRange`] on a bad index.
    pub fn select(&self, indices: &[usize]) -> Result<Self, EnsembleError> {
        let weights = if indices.is_empty() {
            None
        } else {
            self.weights.clone()
        };
        Ok(Self {
            store: self.store.subset(indices)?,
            weights,
        })
    }

    /// Builds a new ensemble holding this ensemble's coordinate sets followed
    /// by `other`'s.
    ///
    /// The result keeps the left operand's reference coordinates and shared
    /// weight vector; the right operand's weights are ignored, since two
    /// shared vectors cannot be merged meaningfully.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::NoCoordinates`] if this ensemble is
    /// uninitialized, and [`EnsembleError::AtomCountMismatch`] if the atom
    /// counts disagree.
    pub fn concat(&self, other: &Self) -> Result<Self, EnsembleError> {
        let reference = self
            .store
            .reference_cloned()
            .ok_or(EnsembleError::NoCoordinates)?;
        if other.num_atoms() != self.num_atoms() {
            return Err(EnsembleError::AtomCountMismatch {
                expected: self.num_atoms(),
                found: other.num_atoms(),
            });
        }

        let mut store = CoordsetStore::new();
        store.set_reference(reference)?;
        for set in self.store.iter().chain(other.store.iter()) {
            store.push_set(set.to_vec())?;
        }

        Ok(Self {
            store,
            weights: self.weights.clone(),
        })
    }
}

impl ConformationCollection for Ensemble {
    fn num_atoms(&self) -> usize {
        self.store.num_atoms()
    }

    fn num_coordsets(&self) -> usize {
        self.store.num_coordsets()
    }

    fn set_coordinates(&mut self, coords: Vec<Point3<f64>>) -> Result<(), EnsembleError> {
        self.store.set_reference(coords)
    }

    fn coordinates(&self) -> Option<&[Point3<f64>]> {
        self.store.reference()
    }

    fn add_coordset(
        &mut self,
        coords: Vec<Point3<f64>>,
        weights: Option<&[f64]>,
    ) -> Result<(), EnsembleError> {
        let expected = if self.store.is_initialized() {
            self.store.num_atoms()
        } else {
            coords.len()
        };
        if let Some(w) = weights {
            validate_weights(w, expected)?;
        }
        self.store.push_set(coords)?;
        if let Some(w) = weights {
            self.weights = Some(w.to_vec());
        }
        Ok(())
    }

    fn coordset(&self, index: usize) -> Option<&[Point3<f64>]> {
        self.store.get(index)
    }

    fn coordsets(&self) -> Option<&[Vec<Point3<f64>>]> {
        self.store.sets()
    }

    fn coordsets_at(&self, indices: &[usize]) -> Result<Vec<Vec<Point3<f64>>>, EnsembleError> {
        self.store.sets_at(indices)
    }

    fn iter_coordsets(&self) -> CoordsetIter<'_> {
        self.store.iter()
    }

    fn remove_coordset(&mut self, index: usize) -> Result<(), EnsembleError> {
        self.remove_coordsets(&[index])
    }

    fn remove_coordsets(&mut self, indices: &[usize]) -> Result<(), EnsembleError> {
        let keep = removal_mask(indices, self.store.num_coordsets())?;
        self.store.retain_by_mask(&keep);
        if self.store.num_coordsets() == 0 {
            self.weights = None;
        }
        Ok(())
    }

    fn deviations(&self) -> Option<Vec<Vec<Vector3<f64>>>> {
        self.store.deviations()
    }

    #[instrument(skip(self), name = "ensemble_superpose")]
    fn superpose(&mut self) -> Vec<Result<Transform, FitError>> {
        let reference = match self.store.reference_cloned() {
            Some(reference) => reference,
            None => return Vec::new(),
        };
        let weights = self.weights.clone();

        let mut outcomes = Vec::with_capacity(self.store.num_coordsets());
        for index in 0..self.store.num_coordsets() {
            let result = calculate_transformation(
                &reference,
                self.store.set_slice(index),
                weights.as_deref(),
            );
            match result {
                Ok(transform) => {
                    self.store.apply_transform(index, &transform);
                    outcomes.push(Ok(transform));
                }
                Err(error) => outcomes.push(Err(error)),
            }
        }

        let failures = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        debug!(
            coordsets = outcomes.len(),
            failures, "Superposed coordinate sets onto the reference."
        );
        outcomes
    }

    #[instrument(skip(self), name = "ensemble_iterpose")]
    fn iterpose(&mut self, threshold: f64) -> Result<usize, EnsembleError> {
        let mut reference = self
            .store
            .reference_cloned()
            .ok_or(EnsembleError::NoCoordinates)?;
        if self.store.num_coordsets() == 0 {
            return Ok(0);
        }
        let weights = self.weights.clone();
        let num_atoms = reference.len();
        let count = self.store.num_coordsets() as f64;

        let mut steps = 0;
        loop {
            for index in 0..self.store.num_coordsets() {
                let transform = calculate_transformation(
                    &reference,
                    self.store.set_slice(index),
                    weights.as_deref(),
                )
                .map_err(|source| EnsembleError::Fit { index, source })?;
                self.store.apply_transform(index, &transform);
            }

            // A shared weight vector scales every set identically, so it
            // cancels in the mean; the plain per-atom average suffices.
            let mut mean = vec![Vector3::zeros(); num_atoms];
            for set in self.store.iter() {
                for (accumulated, point) in mean.iter_mut().zip(set.iter()) {
                    *accumulated += point.coords;
                }
            }
            let new_reference: Vec<Point3<f64>> = mean
                .into_iter()
                .map(|sum| Point3::from(sum / count))
                .collect();

            let shift = super::reference_shift(&reference, &new_reference);
            reference = new_reference;
            steps += 1;
            debug!(step = steps, shift, "Iterative superposition step complete.");
            if shift <= threshold {
                break;
            }
        }

        self.store.set_reference(reference)?;
        Ok(steps)
    }

    fn rmsds(&self) -> Result<Vec<f64>, EnsembleError> {
        let reference = self.store.reference().ok_or(EnsembleError::NoCoordinates)?;
        self.store
            .iter()
            .enumerate()
            .map(|(index, set)| {
                calculate_rmsd(reference, set, self.weights.as_deref())
                    .map_err(|source| EnsembleError::Rmsd { index, source })
            })
            .collect()
    }
}
