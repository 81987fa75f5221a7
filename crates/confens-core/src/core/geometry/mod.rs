//! # Geometry Module
//!
//! This module contains the numerical kernels of the library: weighted
//! rigid-body superposition and weighted RMSD. Both are pure functions over
//! plain coordinate slices with no collection state, so they can be reused
//! directly by callers that manage their own storage.
//!
//! - [`fit`] - Weighted least-squares rotation/translation fitting (Kabsch)
//! - [`rmsd`] - Weighted root-mean-square deviation

pub mod fit;
pub mod rmsd;
