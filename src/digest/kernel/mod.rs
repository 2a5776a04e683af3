//! Numeric embedding backends.
//!
//! The digester never computes descriptors itself; it hands a
//! [`KernelQuery`] to an [`EmbeddingKernel`], one method per algorithm
//! family. [`NativeKernel`] is the built-in pure-Rust backend; another
//! backend can be substituted without touching the pipeline.

mod harmonics;
mod native;

pub use harmonics::real_spherical_harmonics;
pub use native::NativeKernel;

use super::Target;
use super::config::HarmonicsConfig;
use super::error::Error;
use crate::model::geometry::distance;
use crate::model::types::Element;
use ndarray::ArrayD;

/// Everything a kernel needs to describe environments in one molecule.
#[derive(Debug, Clone, Copy)]
pub struct KernelQuery<'a> {
    /// Atom coordinates.
    pub coords: &'a [[f64; 3]],
    /// Atom species, parallel to `coords`.
    pub species: &'a [Element],
    /// Sorted element channels.
    pub elements: &'a [Element],
    /// Probe positions for [`Target::Atom`]; ignored for [`Target::All`].
    pub positions: &'a [[f64; 3]],
    pub target: Target,
    /// Environment cutoff radius.
    pub radius: f64,
    /// Grid resolution of the radial embeddings.
    pub ngrid: usize,
}

/// A neighbor of a center inside the cutoff radius.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    /// Atom index.
    pub index: usize,
    /// Element channel.
    pub channel: usize,
    /// Neighbor position minus center.
    pub offset: [f64; 3],
    /// Distance to the center.
    pub r: f64,
}

impl KernelQuery<'_> {
    /// Environment centers, each paired with the atom it excludes from its
    /// own environment.
    ///
    /// For [`Target::Atom`] the excluded atom is moved to every probe
    /// position; for [`Target::All`] every atom is a center at its own
    /// coordinate.
    pub fn centers(&self) -> Vec<([f64; 3], usize)> {
        match self.target {
            Target::Atom(atom) => self.positions.iter().map(|&p| (p, atom)).collect(),
            Target::All => self.coords.iter().copied().zip(0..).collect(),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.elements.len()
    }

    pub fn channel_of(&self, element: Element) -> Option<usize> {
        self.elements.binary_search(&element).ok()
    }

    /// Atoms within the cutoff of `center`, skipping `excluded`, coincident
    /// atoms, and species outside the element set.
    pub fn neighbors(&self, center: [f64; 3], excluded: usize) -> Vec<Neighbor> {
        self.coords
            .iter()
            .zip(self.species)
            .enumerate()
            .filter(|(i, _)| *i != excluded)
            .filter_map(|(index, (&xyz, &element))| {
                let channel = self.channel_of(element)?;
                let r = distance(xyz, center);
                (r > 1e-10 && r < self.radius).then(|| Neighbor {
                    index,
                    channel,
                    offset: [xyz[0] - center[0], xyz[1] - center[1], xyz[2] - center[2]],
                    r,
                })
            })
            .collect()
    }
}

/// Per-channel parameter families of the symmetry-function embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryParams {
    /// Angular exponents.
    pub zeta: Vec<f64>,
    /// Radial Gaussian widths.
    pub eta1: Vec<f64>,
    /// Angular Gaussian widths.
    pub eta2: Vec<f64>,
    /// Radial shifts.
    pub rs: Vec<f64>,
}

/// Numeric backend computing raw embedding arrays.
///
/// Every method returns the case axis first, one row per center in
/// [`KernelQuery::centers`] order, except the symmetry-function and
/// pairwise-Gaussian variants whose raw output stacks `channels` rows per
/// center and is folded by the digester.
pub trait EmbeddingKernel {
    /// `(centers, channels, ngrid)`.
    fn coulomb(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error>;

    /// `(centers, channels, ngrid)`.
    fn radial_distribution(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error>;

    /// `(centers, channels, ngrid)`.
    fn overlap_basis(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error>;

    /// `(centers, channels, radial_count, (lmax + 1)²)`.
    fn spherical_harmonic(
        &self,
        query: &KernelQuery<'_>,
        harmonics: &HarmonicsConfig,
    ) -> Result<ArrayD<f64>, Error>;

    /// `(centers, channels, radial_count, lmax + 1)`.
    fn invariant(
        &self,
        query: &KernelQuery<'_>,
        harmonics: &HarmonicsConfig,
    ) -> Result<ArrayD<f64>, Error>;

    /// Raw `(centers · nsym, ngrid, ngrid)`.
    fn symmetry_functions(
        &self,
        query: &KernelQuery<'_>,
        params: &SymmetryParams,
    ) -> Result<ArrayD<f64>, Error>;

    /// Raw `(centers · channels, eta.len(), 1)`.
    fn pairwise_gaussian(&self, query: &KernelQuery<'_>, eta: &[f64]) -> Result<ArrayD<f64>, Error>;
}
