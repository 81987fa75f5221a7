use super::CoordsetIter;
use super::error::EnsembleError;
use crate::core::geometry::fit::Transform;
use nalgebra::{Point3, Vector3};

/// Ordered coordinate-set storage shared by both collection variants.
///
/// Owns the reference coordinates and the stored sets, and enforces the one
/// structural invariant they share: once an atom count is established, every
/// set and the reference have exactly that many points. Weight bookkeeping is
/// variant-specific and lives in the owning collection.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct CoordsetStore {
    /// Alignment target; `None` while the collection is uninitialized.
    reference: Option<Vec<Point3<f64>>>,
    /// Stored coordinate sets in insertion order.
    sets: Vec<Vec<Point3<f64>>>,
}

impl CoordsetStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Atom count established for this collection, or 0 while uninitialized.
    pub(crate) fn num_atoms(&self) -> usize {
        self.reference.as_ref().map_or(0, Vec::len)
    }

    pub(crate) fn num_coordsets(&self) -> usize {
        self.sets.len()
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.reference.is_some()
    }

    pub(crate) fn reference(&self) -> Option<&[Point3<f64>]> {
        self.reference.as_deref()
    }

    pub(crate) fn reference_cloned(&self) -> Option<Vec<Point3<f64>>> {
        self.reference.clone()
    }

    /// Sets or replaces the reference coordinates. Once an atom count has
    /// been established the replacement must match it.
    pub(crate) fn set_reference(&mut self, coords: Vec<Point3<f64>>) -> Result<(), EnsembleError> {
        if let Some(reference) = &self.reference {
            if coords.len() != reference.len() {
                return Err(EnsembleError::AtomCountMismatch {
                    expected: reference.len(),
                    found: coords.len(),
                });
            }
        }
        self.reference = Some(coords);
        Ok(())
    }

    /// Appends a coordinate set. The first set added to an uninitialized
    /// store also establishes the reference as a copy of itself.
    pub(crate) fn push_set(&mut self, coords: Vec<Point3<f64>>) -> Result<(), EnsembleError> {
        match &self.reference {
            Some(reference) => {
                if coords.len() != reference.len() {
                    return Err(EnsembleError::AtomCountMismatch {
                        expected: reference.len(),
                        found: coords.len(),
                    });
                }
            }
            None => self.reference = Some(coords.clone()),
        }
        self.sets.push(coords);
        Ok(())
    }

    pub(crate) fn get(&self, index: usize) -> Option<&[Point3<f64>]> {
        self.sets.get(index).map(Vec::as_slice)
    }

    /// Unvalidated access for views, which are constructed bounds-checked.
    pub(crate) fn set_slice(&self, index: usize) -> &[Point3<f64>] {
        &self.sets[index]
    }

    pub(crate) fn sets(&self) -> Option<&[Vec<Point3<f64>>]> {
        if self.sets.is_empty() {
            None
        } else {
            Some(&self.sets)
        }
    }

    pub(crate) fn sets_at(&self, indices: &[usize]) -> Result<Vec<Vec<Point3<f64>>>, EnsembleError> {
        indices
            .iter()
            .map(|&index| {
                self.sets
                    .get(index)
                    .cloned()
                    .ok_or(EnsembleError::IndexOutOfRange {
                        index,
                        len: self.sets.len(),
                    })
            })
            .collect()
    }

    pub(crate) fn iter(&self) -> CoordsetIter<'_> {
        CoordsetIter::new(&self.sets)
    }

    pub(crate) fn apply_transform(&mut self, index: usize, transform: &Transform) {
        transform.apply_to_all(&mut self.sets[index]);
    }

    /// Keeps exactly the sets whose mask entry is true; order is preserved.
    pub(crate) fn retain_by_mask(&mut self, keep: &[bool]) {
        let mut position = 0;
        self.sets.retain(|_| {
            let kept = keep[position];
            position += 1;
            kept
        });
    }

    /// Builds a new store holding a copy of the reference and copies of the
    /// sets at `indices`, in the requested order.
    pub(crate) fn subset(&self, indices: &[usize]) -> Result<Self, EnsembleError> {
        Ok(Self {
            reference: self.reference.clone(),
            sets: self.sets_at(indices)?,
        })
    }

    /// Per-atom difference vectors `set − reference`, one row per set.
    pub(crate) fn deviations(&self) -> Option<Vec<Vec<Vector3<f64>>>> {
        let reference = self.reference.as_deref()?;
        if self.sets.is_empty() {
            return None;
        }
        Some(
            self.sets
                .iter()
                .map(|set| {
                    set.iter()
                        .zip(reference.iter())
                        .map(|(c, r)| c - r)
                        .collect()
                })
                .collect(),
        )
    }
}

/// Validates a deletion index list against the current set count and turns
/// it into a keep-mask. Duplicate indices are collapsed.
pub(crate) fn removal_mask(indices: &[usize], len: usize) -> Result<Vec<bool>, EnsembleError> {
    let mut keep = vec![true; len];
    for &index in indices {
        if index >= len {
            return Err(EnsembleError::IndexOutOfRange { index, len });
        }
        keep[index] = false;
    }
    Ok(keep)
}

/// Validates a per-atom weight vector: length must match the atom count and
/// every entry must be nonnegative.
pub(crate) fn validate_weights(weights: &[f64], expected: usize) -> Result<(), EnsembleError> {
    if weights.len() != expected {
        return Err(EnsembleError::WeightCountMismatch {
            expected,
            found: weights.len(),
        });
    }
    for (index, &value) in weights.iter().enumerate() {
        if value < 0.0 {
            return Err(EnsembleError::NegativeWeight { index, value });
        }
    }
    Ok(())
}
