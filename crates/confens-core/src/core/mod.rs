//! # Core Module
//!
//! This module provides the data model and numerical kernels for
//! conformational ensemble analysis, serving as the computational core of
//! the library.
//!
//! ## Overview
//!
//! The core module implements everything needed to hold ordered collections
//! of matched coordinate sets and to measure geometric similarity between
//! them: the two collection variants with their weighting regimes, the
//! weighted superposition and RMSD kernels they invoke, and the narrow
//! provider seam through which external structure loaders feed coordinates
//! in.
//!
//! ## Architecture
//!
//! - **Collections** ([`ensemble`]) - Ordered coordinate-set storage, the two
//!   weighting variants, non-owning conformation views
//! - **Numerics** ([`geometry`]) - Weighted least-squares superposition and
//!   weighted RMSD over plain slices
//! - **Provider seam** ([`source`]) - The only inbound interface; file
//!   parsing and atom selection live entirely behind it
//!
//! All computation here is pure and synchronous: no I/O, no global
//! configuration, no background work.

pub mod ensemble;
pub mod geometry;
pub mod source;
