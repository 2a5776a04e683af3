//! Error types for molecule digestion.
//!
//! Errors fall into a few classes: configuration problems (unknown names,
//! invalid values, unparsable TOML), missing molecule data, empty oracle
//! results, unsupported pipeline or evaluation combinations, and shape
//! violations against the discovered per-case shapes.

use super::config::{EmbeddingKind, OutputKind};
use crate::model::molecule::Property;
use thiserror::Error;

/// Errors that can occur while digesting molecules.
#[derive(Debug, Error)]
pub enum Error {
    /// The embedding algorithm name is not recognized.
    #[error("unknown embedding algorithm '{0}'")]
    UnknownEmbedding(String),

    /// The output type name is not recognized.
    #[error("unknown digester output type '{0}'")]
    UnknownOutput(String),

    /// A configuration value is out of range.
    #[error("invalid digester configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse a TOML digester configuration.
    #[error("failed to parse digester configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The requested output needs a property the molecule does not carry.
    #[error("molecule is missing the '{0}' property")]
    MissingProperty(Property),

    /// The energy oracle returned nothing for a perturbed-geometry query.
    #[error("energy oracle returned no energies for atom {atom}")]
    EmptyEnergies {
        /// Atom that was moved.
        atom: usize,
    },

    /// The embedding and output pairing is not supported by the requested pipeline.
    #[error("{pipeline} does not support embedding '{embedding}' with output '{output}'")]
    UnsupportedCombination {
        /// Pipeline or target that rejected the pairing.
        pipeline: &'static str,
        /// Configured embedding.
        embedding: EmbeddingKind,
        /// Configured output.
        output: OutputKind,
    },

    /// The evaluation reporter has no summary for this output type.
    #[error("evaluation is not supported for output type '{0}'")]
    UnsupportedEvaluation(OutputKind),

    /// An atom index is outside the molecule.
    #[error("atom index {index} out of range for molecule with {count} atoms")]
    AtomIndex {
        /// Requested index.
        index: usize,
        /// Number of atoms in the molecule.
        count: usize,
    },

    /// A produced case does not match the discovered shape.
    #[error("{what} shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// `"embedding"` or `"label"`.
        what: &'static str,
        /// Expected shape.
        expected: Vec<usize>,
        /// Shape actually produced.
        found: Vec<usize>,
    },

    /// An array could not be reshaped.
    #[error("array reshape failed: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// The embedding kernel rejected its input.
    #[error("embedding kernel failed: {0}")]
    Kernel(String),
}

impl Error {
    /// Creates an [`UnsupportedCombination`](Error::UnsupportedCombination) error.
    pub fn unsupported_combination(
        pipeline: &'static str,
        embedding: EmbeddingKind,
        output: OutputKind,
    ) -> Self {
        Self::UnsupportedCombination {
            pipeline,
            embedding,
            output,
        }
    }

    /// Creates a [`ShapeMismatch`](Error::ShapeMismatch) error.
    pub fn shape_mismatch(what: &'static str, expected: &[usize], found: &[usize]) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }

    /// Returns `true` for errors caused by the digester configuration itself.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownEmbedding(_)
                | Error::UnknownOutput(_)
                | Error::InvalidConfig(_)
                | Error::ConfigParse(_)
        )
    }
}
