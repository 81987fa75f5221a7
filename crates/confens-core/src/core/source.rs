use nalgebra::Point3;

/// Initial weights supplied by a coordinate provider, in one of the two
/// shapes the collection variants accept.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialWeights {
    /// One per-atom weight vector shared by every coordinate set.
    Shared(Vec<f64>),
    /// One per-atom weight row per coordinate set.
    PerSet(Vec<Vec<f64>>),
}

/// Defines the interface for seeding a collection from an external structure
/// loader.
///
/// This is the only inbound contract of the core: an ordered sequence of
/// per-atom coordinate sets, the atom count they share, and optionally an
/// initial weight vector or mask. Parsing, selection, and trajectory I/O all
/// live behind implementations of this trait.
pub trait CoordinateSource {
    /// Returns the number of atoms in every coordinate set.
    fn num_atoms(&self) -> usize;

    /// Returns the coordinate sets in order. Must yield at least one set.
    fn coordinate_sets(&self) -> Vec<Vec<Point3<f64>>>;

    /// Returns the provider's initial weights, if it carries any.
    ///
    /// The shape must match the collection variant being constructed:
    /// [`InitialWeights::Shared`] for an `Ensemble`,
    /// [`InitialWeights::PerSet`] for a `PdbEnsemble`.
    fn initial_weights(&self) -> Option<InitialWeights> {
        None
    }
}
