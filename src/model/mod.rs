//! Molecular data consumed by the digester.
//!
//! - [`types`] – Chemical elements keyed by atomic number.
//! - [`molecule`] – The [`MoleculeView`](molecule::MoleculeView) read interface and
//!   the concrete [`Molecule`](molecule::Molecule) backed by a Go-model oracle.
//! - [`go`] – Harmonic Go model around an equilibrium geometry.
//! - [`geometry`] – Small `[f64; 3]` vector helpers.

pub mod geometry;
pub mod go;
pub mod molecule;
pub mod types;
