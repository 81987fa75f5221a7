use super::ConformationCollection;
use super::CoordsetIter;
use super::conformation::PdbConformation;
use super::error::EnsembleError;
use super::storage::{CoordsetStore, removal_mask, validate_weights};
use crate::core::geometry::fit::{FitError, Transform, calculate_transformation};
use crate::core::geometry::rmsd::calculate_rmsd;
use crate::core::source::{CoordinateSource, InitialWeights};
use nalgebra::{Point3, Vector3};
use std::ops::Range;
use tracing::{debug, instrument};

/// A conformational ensemble with an independent per-atom weight row for
/// every coordinate set.
///
/// This variant models heterogeneous structures of (nearly) the same
/// molecule: a weight of zero at atom *i* of set *m* marks that atom as
/// absent in that particular structure, excluding it from superposition and
/// RMSD for that set only. The number of weight rows always equals the
/// number of stored sets; a set added without weights gets an all-ones row.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdbEnsemble {
    pub(crate) store: CoordsetStore,
    /// One row per stored set, kept in lockstep with the store.
    weights: Vec<Vec<f64>>,
    label: Option<String>,
}

impl PdbEnsemble {
    /// Creates a new, uninitialized, unlabeled ensemble.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, uninitialized ensemble carrying an identifying label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Builds an ensemble from a coordinate provider.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::EmptySource`] if the provider yields no sets,
    /// [`EnsembleError::AtomCountMismatch`] if any set disagrees with the
    /// provider's atom count, and [`EnsembleError::WeightShapeMismatch`] if
    /// the provider carries a shared weight vector instead of per-set rows,
    /// or a row count that disagrees with the set count.
    pub fn from_source(source: &impl CoordinateSource) -> Result<Self, EnsembleError> {
        let sets = source.coordinate_sets();
        if sets.is_empty() {
            return Err(EnsembleError::EmptySource);
        }
        let num_atoms = source.num_atoms();

        let weights = match source.initial_weights() {
            None => vec![vec![1.0; num_atoms]; sets.len()],
            Some(InitialWeights::PerSet(rows)) => {
                if rows.len() != sets.len() {
                    return Err(EnsembleError::WeightShapeMismatch {
                        expected: "one weight row per coordinate set",
                    });
                }
                for row in &rows {
                    validate_weights(row, num_atoms)?;
                }
                rows
            }
            Some(InitialWeights::Shared(_)) => {
                return Err(EnsembleError::WeightShapeMismatch {
                    expected: "per-set weight rows",
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

        Ok(Self {
            store,
            weights,
            label: None,
        })
    }

    /// Returns the identifying label, if one is set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets or replaces the identifying label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Returns all weight rows in set order, or `None` when the ensemble
    /// holds zero coordinate sets.
    pub fn weights(&self) -> Option<&[Vec<f64>]> {
        if self.weights.is_empty() {
            None
        } else {
            Some(&self.weights)
        }
    }

    /// Returns the weight row of the coordinate set at `index`, or `None`
    /// if out of range.
    pub fn weights_for(&self, index: usize) -> Option<&[f64]> {
        self.weights.get(index).map(Vec::as_slice)
    }

    /// Returns a non-owning view of the coordinate set at `index`, or `None`
    /// if out of range.
    pub fn conformation(&self, index: usize) -> Option<PdbConformation<'_>> {
        if index < self.store.num_coordsets() {
            Some(PdbConformation::new(self, index))
        } else {
            None
        }
    }

    /// Returns an iterator over views of every stored coordinate set.
    pub fn conformations(&self) -> impl Iterator<Item = PdbConformation<'_>> {
        (0..self.store.num_coordsets()).map(move |index| PdbConformation::new(self, index))
    }

    /// Builds a new ensemble containing copies of the coordinate sets and
    /// weight rows in `range`, sharing this ensemble's reference coordinates
    /// and label. The result owns its data independently.
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

    /// Builds a new ensemble containing copies of the coordinate sets and
    /// weight rows at `indices`, in the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::IndexOutOfRange`] on a bad index.
    pub fn select(&self, indices: &[usize]) -> Result<Self, EnsembleError> {
        let store = self.store.subset(indices)?;
        // Rows are in lockstep with the sets, so the indices are valid here.
        let weights = indices
            .iter()
            .map(|&index| self.weights[index].clone())
            .collect();
        Ok(Self {
            store,
            weights,
            label: self.label.clone(),
        })
    }

    /// Builds a new ensemble holding this ensemble's coordinate sets and
    /// weight rows followed by `other`'s; rows travel with their sets. The
    /// labels are combined when both operands carry one.
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
        let weights = self
            .weights
            .iter()
            .chain(other.weights.iter())
            .cloned()
            .collect();
        let label = match (&self.label, &other.label) {
            (Some(left), Some(right)) => Some(format!("{} + {}", left, right)),
            (Some(left), None) => Some(left.clone()),
            (None, Some(right)) => Some(right.clone()),
            (None, None) => None,
        };

        Ok(Self {
            store,
            weights,
            label,
        })
    }
}

impl ConformationCollection for PdbEnsemble {
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
        if let Some(row) = weights {
            validate_weights(row, expected)?;
        }
        self.store.push_set(coords)?;
        self.weights
            .push(weights.map_or_else(|| vec![1.0; expected], <[f64]>::to_vec));
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
        let mut position = 0;
        self.weights.retain(|_| {
            let kept = keep[position];
            position += 1;
            kept
        });
        Ok(())
    }

    fn deviations(&self) -> Option<Vec<Vec<Vector3<f64>>>> {
        self.store.deviations()
    }

    #[instrument(skip(self), name = "pdb_ensemble_superpose")]
    fn superpose(&mut self) -> Vec<Result<Transform, FitError>> {
        let reference = match self.store.reference_cloned() {
            Some(reference) => reference,
            None => return Vec::new(),
        };

        let mut outcomes = Vec::with_capacity(self.store.num_coordsets());
        for index in 0..self.store.num_coordsets() {
            let result = calculate_transformation(
                &reference,
                self.store.set_slice(index),
                Some(&self.weights[index]),
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

    #[instrument(skip(self), name = "pdb_ensemble_iterpose")]
    fn iterpose(&mut self, threshold: f64) -> Result<usize, EnsembleError> {
        let mut reference = self
            .store
            .reference_cloned()
            .ok_or(EnsembleError::NoCoordinates)?;
        if self.store.num_coordsets() == 0 {
            return Ok(0);
        }
        let num_atoms = reference.len();

        let mut steps = 0;
        loop {
            for index in 0..self.store.num_coordsets() {
                let transform = calculate_transformation(
                    &reference,
                    self.store.set_slice(index),
                    Some(&self.weights[index]),
                )
                .map_err(|source| EnsembleError::Fit { index, source })?;
                self.store.apply_transform(index, &transform);
            }

            // Weighted per-atom mean; an atom absent from every set keeps
            // its previous reference position.
            let mut sums = vec![Vector3::zeros(); num_atoms];
            let mut totals = vec![0.0; num_atoms];
            for (set, row) in self.store.iter().zip(self.weights.iter()) {
                for (atom, (point, &weight)) in set.iter().zip(row.iter()).enumerate() {
                    sums[atom] += point.coords * weight;
                    totals[atom] += weight;
                }
            }
            let new_reference: Vec<Point3<f64>> = reference
                .iter()
                .enumerate()
                .map(|(atom, previous)| {
                    if totals[atom] > 0.0 {
                        Point3::from(sums[atom] / totals[atom])
                    } else {
                        *previous
                    }
                })
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
            .zip(self.weights.iter())
            .enumerate()
            .map(|(index, (set, row))| {
                calculate_rmsd(reference, set, Some(row))
                    .map_err(|source| EnsembleError::Rmsd { index, source })
            })
            .collect()
    }

    fn as_pdb_ensemble(&self) -> Option<&PdbEnsemble> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    fn square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.5),
        ]
    }

    fn shifted(points: &[Point3<f64>], offset: Vector3<f64>) -> Vec<Point3<f64>> {
        points.iter().map(|p| p + offset).collect()
    }

    fn rotated_about_z(
        points: &[Point3<f64>],
        degrees: f64,
        offset: Vector3<f64>,
    ) -> Vec<Point3<f64>> {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), degrees.to_radians());
        points.iter().map(|p| rotation * p + offset).collect()
    }

    fn points_eq(a: &[Point3<f64>], b: &[Point3<f64>]) -> bool {
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(p, q)| (p - q).norm() < 1e-12)
    }

    struct StubSource {
        sets: Vec<Vec<Point3<f64>>>,
        weights: Option<InitialWeights>,
    }

    impl CoordinateSource for StubSource {
        fn num_atoms(&self) -> usize {
            self.sets.first().map_or(0, Vec::len)
        }

        fn coordinate_sets(&self) -> Vec<Vec<Point3<f64>>> {
            self.sets.clone()
        }

        fn initial_weights(&self) -> Option<InitialWeights> {
            self.weights.clone()
        }
    }

    #[test]
    fn omitted_weights_default_to_all_ones() {
        let mut ensemble = PdbEnsemble::new();
        ensemble.add_coordset(square(), None).unwrap();
        ensemble
            .add_coordset(square(), Some(&[1.0, 0.0, 1.0, 2.0]))
            .unwrap();

        assert_eq!(ensemble.weights_for(0).unwrap(), &[1.0; 4]);
        assert_eq!(ensemble.weights_for(1).unwrap(), &[1.0, 0.0, 1.0, 2.0]);
        assert_eq!(ensemble.weights().unwrap().len(), 2);
        assert!(ensemble.weights_for(2).is_none());
    }

    #[test]
    fn weight_rows_are_validated_on_add() {
        let mut ensemble = PdbEnsemble::new();
        ensemble.add_coordset(square(), None).unwrap();

        assert!(matches!(
            ensemble.add_coordset(square(), Some(&[1.0, 1.0])),
            Err(EnsembleError::WeightCountMismatch {
                expected: 4,
                found: 2
            })
        ));
        assert!(matches!(
            ensemble.add_coordset(square(), Some(&[1.0, -1.0, 1.0, 1.0])),
            Err(EnsembleError::NegativeWeight { index: 1, .. })
        ));
        // Failed adds must not leave a dangling row or set behind.
        assert_eq!(ensemble.num_coordsets(), 1);
        assert_eq!(ensemble.weights().unwrap().len(), 1);
    }

    #[test]
    fn from_source_accepts_per_set_rows_only() {
        let sets = vec![square(), shifted(&square(), Vector3::new(0.0, 0.0, 1.0))];

        let per_set = StubSource {
            sets: sets.clone(),
            weights: Some(InitialWeights::PerSet(vec![
                vec![1.0; 4],
                vec![1.0, 1.0, 0.0, 1.0],
            ])),
        };
        let ensemble = PdbEnsemble::from_source(&per_set).unwrap();
        assert_eq!(ensemble.weights_for(1).unwrap(), &[1.0, 1.0, 0.0, 1.0]);

        let shared = StubSource {
            sets: sets.clone(),
            weights: Some(InitialWeights::Shared(vec![1.0; 4])),
        };
        assert!(matches!(
            PdbEnsemble::from_source(&shared),
            Err(EnsembleError::WeightShapeMismatch { .. })
        ));

        let short = StubSource {
            sets,
            weights: Some(InitialWeights::PerSet(vec![vec![1.0; 4]])),
        };
        assert!(matches!(
            PdbEnsemble::from_source(&short),
            Err(EnsembleError::WeightShapeMismatch { .. })
        ));
    }

    #[test]
    fn masked_atom_rmsd_matches_physical_removal() {
        let reference = square();
        let mut displaced = shifted(&reference, Vector3::new(0.5, -0.25, 1.0));
        displaced[2] = Point3::new(99.0, 99.0, 99.0);

        let mut ensemble = PdbEnsemble::new();
        ensemble.add_coordset(reference.clone(), None).unwrap();
        ensemble
            .add_coordset(displaced.clone(), Some(&[1.0, 1.0, 0.0, 1.0]))
            .unwrap();

        let masked = ensemble.rmsds().unwrap()[1];

        let stripped_reference: Vec<_> = [0, 1, 3].iter().map(|&i| reference[i]).collect();
        let stripped: Vec<_> = [0, 1, 3].iter().map(|&i| displaced[i]).collect();
        let removed = calculate_rmsd(&stripped_reference, &stripped, None).unwrap();

        assert!((masked - removed).abs() < 1e-12);
    }

    #[test]
    fn masked_atom_superposition_matches_physical_removal() {
        let reference = square();
        let mut moved = rotated_about_z(&reference, 40.0, Vector3::new(1.0, 2.0, -0.5));
        moved[2] = Point3::new(-50.0, 10.0, 3.0);

        let mut ensemble = PdbEnsemble::new();
        ensemble.add_coordset(reference.clone(), None).unwrap();
        ensemble
            .add_coordset(moved.clone(), Some(&[1.0, 1.0, 0.0, 1.0]))
            .unwrap();

        let outcomes = ensemble.superpose();
        let masked = outcomes[1].as_ref().unwrap();

        let stripped_reference: Vec<_> = [0, 1, 3].iter().map(|&i| reference[i]).collect();
        let stripped: Vec<_> = [0, 1, 3].iter().map(|&i| moved[i]).collect();
        let removed = calculate_transformation(&stripped_reference, &stripped, None).unwrap();

        // Matrix comparison: `angle_to` on identical rotations can push the
        // acos argument outside its domain and yield NaN.
        assert!((masked.rotation.matrix() - removed.rotation.matrix()).norm() < 1e-9);
        assert!((masked.translation - removed.translation).norm() < 1e-9);
        // The excluded atoms align exactly, so the masked RMSD drops to zero.
        assert!(ensemble.rmsds().unwrap()[1] < 1e-9);
    }

    #[test]
    fn deletion_keeps_weight_rows_in_lockstep() {
        let mut ensemble = PdbEnsemble::new();
        for m in 0..3 {
            let mut row = vec![1.0; 4];
            row[m] = 0.0;
            ensemble.add_coordset(square(), Some(&row)).unwrap();
        }

        ensemble.remove_coordset(1).unwrap();

        assert_eq!(ensemble.num_coordsets(), 2);
        assert_eq!(ensemble.weights_for(0).unwrap(), &[0.0, 1.0, 1.0, 1.0]);
        assert_eq!(ensemble.weights_for(1).unwrap(), &[1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn deleting_every_set_collapses_weights_to_absent() {
        let mut ensemble = PdbEnsemble::new();
        ensemble.add_coordset(square(), None).unwrap();
        ensemble.add_coordset(square(), None).unwrap();

        ensemble.remove_coordsets(&[0, 1]).unwrap();

        assert!(ensemble.coordsets().is_none());
        assert!(ensemble.weights().is_none());
        assert_eq!(ensemble.num_atoms(), 4);
        assert!(ensemble.coordinates().is_some());
    }

    #[test]
    fn slicing_copies_sets_and_rows_independently() {
        let mut ensemble = PdbEnsemble::with_label("heterogeneous");
        for m in 0..3 {
            let mut row = vec![1.0; 4];
            row[m] = 0.0;
            ensemble
                .add_coordset(
                    shifted(&square(), Vector3::new(m as f64, 0.0, 0.0)),
                    Some(&row),
                )
                .unwrap();
        }

        let mut sliced = ensemble.slice(1..3).unwrap();
        assert_eq!(sliced.num_coordsets(), 2);
        assert_eq!(sliced.label(), Some("heterogeneous"));
        assert_eq!(sliced.weights_for(0).unwrap(), &[1.0, 0.0, 1.0, 1.0]);
        assert_eq!(sliced.weights_for(1).unwrap(), &[1.0, 1.0, 0.0, 1.0]);

        sliced.remove_coordset(0).unwrap();

        // The parent keeps all three sets and rows.
        assert_eq!(ensemble.num_coordsets(), 3);
        assert_eq!(ensemble.weights_for(1).unwrap(), &[1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn select_honors_the_requested_order() {
        let mut ensemble = PdbEnsemble::new();
        for m in 0..3 {
            let mut row = vec![1.0; 4];
            row[m] = 0.0;
            ensemble.add_coordset(square(), Some(&row)).unwrap();
        }

        let reversed = ensemble.select(&[2, 0]).unwrap();
        assert_eq!(reversed.weights_for(0).unwrap(), &[1.0, 1.0, 0.0, 1.0]);
        assert_eq!(reversed.weights_for(1).unwrap(), &[0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn concat_carries_rows_with_their_sets() {
        let mut left = PdbEnsemble::with_label("left");
        left.add_coordset(square(), Some(&[1.0, 0.0, 1.0, 1.0]))
            .unwrap();
        let mut right = PdbEnsemble::with_label("right");
        right.add_coordset(square(), None).unwrap();
        right
            .add_coordset(square(), Some(&[0.0, 1.0, 1.0, 1.0]))
            .unwrap();

        let combined = left.concat(&right).unwrap();

        assert_eq!(combined.num_coordsets(), 3);
        assert_eq!(combined.weights_for(0).unwrap(), &[1.0, 0.0, 1.0, 1.0]);
        assert_eq!(combined.weights_for(1).unwrap(), &[1.0; 4]);
        assert_eq!(combined.weights_for(2).unwrap(), &[0.0, 1.0, 1.0, 1.0]);
        assert_eq!(combined.label(), Some("left + right"));
    }

    #[test]
    fn iterpose_leaves_fully_masked_atoms_at_the_reference() {
        let reference = square();
        let mut ensemble = PdbEnsemble::new();
        // Atom 3 is absent from every set; its reference position must survive.
        ensemble
            .add_coordset(
                shifted(&reference, Vector3::new(0.0, 0.0, 1.0)),
                Some(&[1.0, 1.0, 1.0, 0.0]),
            )
            .unwrap();
        ensemble
            .add_coordset(
                shifted(&reference, Vector3::new(0.0, 1.0, 0.0)),
                Some(&[1.0, 1.0, 1.0, 0.0]),
            )
            .unwrap();
        let original_reference = ensemble.coordinates().unwrap().to_vec();

        ensemble.iterpose(1e-9).unwrap();

        let converged = ensemble.coordinates().unwrap();
        assert!((converged[3] - original_reference[3]).norm() < 1e-12);
    }

    #[test]
    fn views_expose_the_per_set_row() {
        let mut ensemble = PdbEnsemble::new();
        ensemble.add_coordset(square(), None).unwrap();
        ensemble
            .add_coordset(
                shifted(&square(), Vector3::new(0.0, 0.0, 2.0)),
                Some(&[1.0, 1.0, 0.0, 1.0]),
            )
            .unwrap();

        let view = ensemble.conformation(1).unwrap();
        assert_eq!(view.index(), 1);
        assert_eq!(view.num_atoms(), 4);
        assert_eq!(view.weights().unwrap(), &[1.0, 1.0, 0.0, 1.0]);
        assert!(points_eq(view.coordinates(), ensemble.coordset(1).unwrap()));

        let batch = ensemble.rmsds().unwrap();
        assert!((view.rmsd().unwrap() - batch[1]).abs() < 1e-12);
    }

    #[test]
    fn all_zero_row_surfaces_as_an_rmsd_error() {
        let mut ensemble = PdbEnsemble::new();
        ensemble.add_coordset(square(), None).unwrap();
        ensemble
            .add_coordset(square(), Some(&[0.0, 0.0, 0.0, 0.0]))
            .unwrap();

        let result = ensemble.rmsds();
        assert!(matches!(
            result,
            Err(EnsembleError::Rmsd { index: 1, .. })
        ));
    }

    #[test]
    fn degenerate_fit_does_not_abort_the_batch() {
        let mut ensemble = PdbEnsemble::new();
        ensemble.add_coordset(square(), None).unwrap();
        // Only two usable atoms: the fit for this set must fail alone.
        ensemble
            .add_coordset(
                shifted(&square(), Vector3::new(0.0, 0.0, 3.0)),
                Some(&[1.0, 1.0, 0.0, 0.0]),
            )
            .unwrap();
        ensemble
            .add_coordset(shifted(&square(), Vector3::new(2.0, 0.0, 0.0)), None)
            .unwrap();
        let untouched = ensemble.coordset(1).unwrap().to_vec();

        let outcomes = ensemble.superpose();

        assert!(outcomes[0].is_ok());
        assert!(matches!(
            outcomes[1],
            Err(FitError::Degenerate { usable: 2 })
        ));
        assert!(outcomes[2].is_ok());
        // The failed set is left exactly as it was.
        assert!(points_eq(ensemble.coordset(1).unwrap(), &untouched));
        assert!(ensemble.rmsds().unwrap()[2] < 1e-9);
    }
}
