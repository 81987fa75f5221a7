//! # Analysis Module
//!
//! This module is the thin user-facing layer of aggregate computations over
//! collections. It ties the collection contract and the geometry kernels
//! together without adding state of its own; higher-level analyses excluded
//! from this core (PCA, normal modes) would build on the same surface.

use crate::core::ensemble::ConformationCollection;
use crate::core::ensemble::error::EnsembleError;

/// Sums the per-atom weight rows of a per-set-weight ensemble across all of
/// its coordinate sets.
///
/// The result has one entry per atom: how much total weight that atom
/// carries over the whole ensemble, which for 0/1 masks is simply the number
/// of structures the atom is present in.
///
/// # Arguments
///
/// * `collection` - The collection to aggregate; must be a `PdbEnsemble`.
///
/// # Return
///
/// Returns the elementwise sum of all weight rows, or `None` if the ensemble
/// holds zero coordinate sets.
///
/// # Errors
///
/// Returns [`EnsembleError::TypeMismatch`] for any other collection variant:
/// a shared weight vector has no meaningful per-set sum.
pub fn calculate_sum_of_weights(
    collection: &dyn ConformationCollection,
) -> Result<Option<Vec<f64>>, EnsembleError> {
    let ensemble = collection
        .as_pdb_ensemble()
        .ok_or(EnsembleError::TypeMismatch {
            operation: "calculate_sum_of_weights",
        })?;

    let Some(rows) = ensemble.weights() else {
        return Ok(None);
    };

    let mut totals = vec![0.0; ensemble.num_atoms()];
    for row in rows {
        for (total, &weight) in totals.iter_mut().zip(row.iter()) {
            *total += weight;
        }
    }
    Ok(Some(totals))
}
