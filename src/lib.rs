//! A pure Rust library for turning molecular geometries into fixed-shape training
//! data. It describes each atom's chemical environment with one of several embedding
//! families and pairs every embedding with a supervised label (displacement, force,
//! occupancy probability or energy).
//!
//! # Features
//!
//! - **Embeddings** — Coulomb-like, radial distribution, overlap basis, Gaussian
//!   spherical harmonics and their rotational invariants, Behler symmetry functions,
//!   and pairwise Gaussians, all computed by a pluggable [`EmbeddingKernel`]
//! - **Labels** — Go-model relaxations and forces, stored forces and energies,
//!   hard and stochastic occupancies, oracle energies, and smooth occupancy fits
//! - **Sampling** — Distance-biased radial sampling, Gaussian sampling and
//!   uniform cubic grids around an atom
//! - **Batches** — Per-element and whole-molecule digestion with shapes
//!   discovered once and enforced for every later molecule
//! - **Evaluation** — Error and sign-agreement statistics of predicted vectors
//!
//! # Quick Start
//!
//! Build a [`Digester`] from a [`DigesterConfig`] and call
//! [`Digester::train_digest`] with a molecule and the element of interest:
//!
//! ```
//! use mol_digest::{Digester, DigesterConfig, Element, EmbeddingKind, Molecule, OutputKind};
//! use rand::SeedableRng;
//! use rand_pcg::Pcg64;
//!
//! // Water at its Go-model equilibrium, then slightly distorted
//! let mut water = Molecule::new(
//!     vec![Element::O, Element::H, Element::H],
//!     vec![[0.0, 0.0, 0.0], [0.9572, 0.0, 0.0], [-0.2400, 0.9266, 0.0]],
//! );
//! let mut rng = Pcg64::seed_from_u64(7);
//! water.distort(&mut rng, 0.05);
//!
//! let digester = Digester::new(DigesterConfig {
//!     elements: vec![Element::H, Element::O],
//!     embedding: EmbeddingKind::GauInv,
//!     output: OutputKind::GoForce,
//!     ..DigesterConfig::default()
//! })?;
//!
//! // One case per hydrogen: invariants of shape (channels, radial, lmax + 1)
//! let batch = digester.train_digest(&water, Element::H, &mut rng)?;
//! assert_eq!(batch.atoms, vec![1, 2]);
//! assert_eq!(batch.inputs.shape(), &[2, 2, 6, 5]);
//! assert_eq!(batch.labels.shape(), &[2, 3]);
//!
//! // Later molecules must match the shapes discovered on the first one
//! let shapes = digester.shapes().unwrap();
//! assert_eq!(shapes.label, vec![3]);
//! # Ok::<(), mol_digest::DigestError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`] — Molecule file reading (multi-frame XYZ)
//! - [`sampling`] — Probe position generators
//! - [`kernel`] — The embedding backend trait and the native backend
//! - [`geometry`] — Small vector helpers
//!
//! # Data Types
//!
//! ## Molecules
//!
//! - [`MoleculeView`] — Read interface the digester consumes
//! - [`Molecule`] — Concrete molecule with a Go-model energy oracle
//! - [`Element`] — Chemical element (H through Og)
//! - [`Property`] — Stored molecular properties
//!
//! ## Digestion
//!
//! - [`Digester`] — Embedding, labeling and batching pipeline
//! - [`DigestBatch`] — Inputs, labels and source atoms of one molecule
//! - [`DigestShapes`] — Discovered per-case shapes
//! - [`Target`] — One atom at probe positions, or every atom
//! - [`Normalization`] — Label (de)normalization
//! - [`EvaluationReport`] — Prediction error statistics
//!
//! ## Configuration
//!
//! - [`DigesterConfig`] — All digester options, loadable from TOML
//! - [`EmbeddingKind`] — Embedding family selection
//! - [`OutputKind`] — Label semantics selection
//! - [`SamplingMode`] — Biased or smooth probe sampling
//! - [`NormalizationMode`] — None, linear or logarithmic labels
//! - [`HarmonicsConfig`] — Spherical-harmonic resolution
//! - [`Grids`] — Occupancy probability grid

mod digest;
mod model;

pub mod io;

pub use digest::{kernel, sampling};
pub use model::geometry;

pub use model::go::GoModel;
pub use model::molecule::{Molecule, MoleculeView, Properties, Property};
pub use model::types::{Element, ParseElementError};

pub use digest::{
    DigestBatch, DigestShapes, Digester, DigesterConfig, EmbeddingKernel, EmbeddingKind,
    ErrorStats, EvaluationReport, Grids, HarmonicsConfig, KAYBEETEE, KernelQuery, NativeKernel,
    Normalization, NormalizationMode, OutputKind, SamplingMode, SymmetryParams, Target,
    fold_channels, hard_cut, pgaussian_eta, symmetry_params,
};

pub use digest::Error as DigestError;
