//! # Confens Core Library
//!
//! A library for managing collections of 3D atomic coordinate sets
//! ("conformations") of the same molecule and computing geometric similarity
//! between them: weighted rigid-body superposition and weighted RMSD over
//! ordered ensembles.
//!
//! ## Architectural Philosophy
//!
//! The library is a pure in-memory core with two narrow seams to the outside
//! world, keeping it testable without any file or format dependencies.
//!
//! - **[`core`]: The Foundation.** Coordinate-set collections in two
//!   weighting variants (`Ensemble` with one shared per-atom weight vector,
//!   `PdbEnsemble` with an independent weight row per set), the Kabsch-style
//!   fitting and RMSD kernels, and the `CoordinateSource` trait through which
//!   excluded structure loaders seed a collection.
//!
//! - **[`analysis`]: The Public Aggregates.** User-facing computations over
//!   whole collections, such as per-atom weight sums across a heterogeneous
//!   ensemble.
//!
//! Structure-file parsing, selection languages, trajectory I/O, and
//! higher-level analyses are deliberately outside this crate; they consume
//! the operation surface re-exported below.

pub mod analysis;
pub mod core;

pub use crate::analysis::calculate_sum_of_weights;
pub use crate::core::ensemble::conformation::{Conformation, PdbConformation};
pub use crate::core::ensemble::ensemble::Ensemble;
pub use crate::core::ensemble::error::EnsembleError;
pub use crate::core::ensemble::pdb::PdbEnsemble;
pub use crate::core::ensemble::{ConformationCollection, CoordsetIter};
pub use crate::core::geometry::fit::{FitError, Transform, calculate_transformation};
pub use crate::core::geometry::rmsd::{RmsdError, calculate_rmsd};
pub use crate::core::source::{CoordinateSource, InitialWeights};
