//! Molecule digestion: embeddings plus labels in fixed-shape batches.
//!
//! A [`Digester`] is built once per training configuration and reused
//! across molecules. It owns the sorted element set, the embedding and
//! output selections, the label normalization and the per-case shapes
//! discovered from the first molecule it sees.

mod batch;
pub mod config;
mod embedding;
pub mod error;
mod evaluate;
pub mod grids;
pub mod kernel;
mod labels;
mod normalize;
pub mod sampling;

pub use batch::DigestBatch;
pub use config::{
    DigesterConfig, EmbeddingKind, HarmonicsConfig, KAYBEETEE, NormalizationMode, OutputKind,
    SamplingMode,
};
pub use embedding::{fold_channels, pgaussian_eta, symmetry_params};
pub use error::Error;
pub use evaluate::{ErrorStats, EvaluationReport};
pub use grids::Grids;
pub use kernel::{EmbeddingKernel, KernelQuery, NativeKernel, SymmetryParams};
pub use labels::hard_cut;
pub use normalize::Normalization;

use crate::model::molecule::MoleculeView;
use crate::model::types::Element;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{info, warn};

/// Which atoms an embedding or label call describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// One atom, moved to each probe position in turn.
    Atom(usize),
    /// Every atom at its own coordinate, batched along the case axis.
    All,
}

/// Trailing (per-case) shapes of embeddings and labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestShapes {
    pub embedding: Vec<usize>,
    pub label: Vec<usize>,
}

impl DigestShapes {
    /// Full embedding shape for `cases` cases.
    pub fn embedding_batch(&self, cases: usize) -> Vec<usize> {
        with_leading(cases, &self.embedding)
    }

    /// Full label shape for `cases` cases.
    pub fn label_batch(&self, cases: usize) -> Vec<usize> {
        with_leading(cases, &self.label)
    }
}

fn with_leading(cases: usize, trailing: &[usize]) -> Vec<usize> {
    let mut shape = Vec::with_capacity(trailing.len() + 1);
    shape.push(cases);
    shape.extend_from_slice(trailing);
    shape
}

/// Turns molecules into embedding/label training cases.
///
/// # Examples
///
/// ```
/// use mol_digest::{Digester, DigesterConfig, Element, EmbeddingKind, OutputKind};
///
/// let config = DigesterConfig {
///     elements: vec![Element::O, Element::H],
///     embedding: EmbeddingKind::Coulomb,
///     output: OutputKind::GoForce,
///     ..DigesterConfig::default()
/// };
/// let digester = Digester::new(config)?;
/// assert_eq!(digester.elements(), &[Element::H, Element::O]);
/// assert_eq!(digester.nsym(), 8);
/// # Ok::<(), mol_digest::DigestError>(())
/// ```
#[derive(Debug)]
pub struct Digester<K = NativeKernel> {
    config: DigesterConfig,
    normalization: Normalization,
    shapes: OnceLock<DigestShapes>,
    probe_lock: Mutex<()>,
    kernel: K,
}

impl Digester<NativeKernel> {
    /// Creates a digester backed by [`NativeKernel`].
    pub fn new(config: DigesterConfig) -> Result<Self, Error> {
        Self::with_kernel(config, NativeKernel)
    }

    /// Creates a digester from element symbols and algorithm names, all
    /// other options at their defaults.
    pub fn from_names(elements: &[&str], embedding: &str, output: &str) -> Result<Self, Error> {
        let elements = elements
            .iter()
            .map(|s| {
                s.parse::<Element>()
                    .map_err(|e| Error::InvalidConfig(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(DigesterConfig {
            elements,
            embedding: embedding.parse()?,
            output: output.parse()?,
            ..DigesterConfig::default()
        })
    }
}

impl<K: EmbeddingKernel> Digester<K> {
    /// Creates a digester over a custom embedding backend.
    ///
    /// The element set is sorted and deduplicated; the configuration is
    /// validated first.
    pub fn with_kernel(mut config: DigesterConfig, kernel: K) -> Result<Self, Error> {
        config.validate()?;
        config.elements.sort();
        config.elements.dedup();

        if config.output.is_direct() && config.samples_per_atom > 1 {
            warn!(
                output = %config.output,
                requested = config.samples_per_atom,
                "direct outputs use one sample per atom"
            );
        }
        info!(
            embedding = %config.embedding,
            output = %config.output,
            elements = ?config.elements,
            sampling = ?config.sampling,
            normalization = ?config.normalization,
            "digester configured"
        );

        Ok(Self {
            normalization: Normalization::new(config.normalization),
            config,
            shapes: OnceLock::new(),
            probe_lock: Mutex::new(()),
            kernel,
        })
    }

    pub fn config(&self) -> &DigesterConfig {
        &self.config
    }

    /// Sorted, deduplicated element channels.
    pub fn elements(&self) -> &[Element] {
        &self.config.elements
    }

    pub fn embedding(&self) -> EmbeddingKind {
        self.config.embedding
    }

    pub fn output(&self) -> OutputKind {
        self.config.output
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Number of element channels.
    pub fn channel_count(&self) -> usize {
        self.config.elements.len()
    }

    /// Symmetry-function channel count, `n + (n + 1)·n` for `n` elements.
    pub fn nsym(&self) -> usize {
        let n = self.channel_count();
        n + (n + 1) * n
    }

    /// Cases produced per atom: always 1 for direct outputs.
    pub fn samples_per_atom(&self) -> usize {
        if self.config.output.is_direct() {
            1
        } else {
            self.config.samples_per_atom
        }
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    /// Replaces the label statistics. The mode stays as configured.
    pub fn assign_normalization(&mut self, mean: f64, std: f64) {
        self.normalization.mean = mean;
        self.normalization.std = std;
    }

    /// Shapes discovered so far, if any.
    pub fn shapes(&self) -> Option<&DigestShapes> {
        self.shapes.get()
    }

    fn check_target<M: MoleculeView + ?Sized>(&self, mol: &M, target: Target) -> Result<(), Error> {
        match target {
            Target::Atom(index) if index >= mol.atom_count() => Err(Error::AtomIndex {
                index,
                count: mol.atom_count(),
            }),
            _ => Ok(()),
        }
    }

    fn probe_guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.probe_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_are_sorted_and_deduplicated() {
        let config = DigesterConfig {
            elements: vec![Element::O, Element::H, Element::C, Element::H],
            ..DigesterConfig::default()
        };
        let digester = Digester::new(config).unwrap();
        assert_eq!(digester.elements(), &[Element::H, Element::C, Element::O]);
        assert_eq!(digester.channel_count(), 3);
        assert_eq!(digester.nsym(), 3 + 4 * 3);
    }

    #[test]
    fn direct_outputs_use_a_single_sample() {
        let config = DigesterConfig {
            output: OutputKind::Disp,
            samples_per_atom: 10,
            ..DigesterConfig::default()
        };
        assert_eq!(Digester::new(config).unwrap().samples_per_atom(), 1);

        let config = DigesterConfig {
            output: OutputKind::StoP,
            samples_per_atom: 10,
            ..DigesterConfig::default()
        };
        assert_eq!(Digester::new(config).unwrap().samples_per_atom(), 10);
    }

    #[test]
    fn from_names_rejects_unknown_names() {
        let err = Digester::from_names(&["H", "O"], "Zernike", "Disp").unwrap_err();
        assert!(matches!(err, Error::UnknownEmbedding(ref s) if s == "Zernike"));
        assert!(err.is_configuration());

        let err = Digester::from_names(&["H", "O"], "GauSH", "Dipole").unwrap_err();
        assert!(matches!(err, Error::UnknownOutput(_)));
        assert!(err.is_configuration());

        let err = Digester::from_names(&["Xx"], "GauSH", "Disp").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = DigesterConfig {
            elements: Vec::new(),
            ..DigesterConfig::default()
        };
        assert!(matches!(
            Digester::new(config).unwrap_err(),
            Error::InvalidConfig(_)
        ));
    }

    #[test]
    fn assign_normalization_keeps_mode() {
        let config = DigesterConfig {
            normalization: NormalizationMode::Linear,
            ..DigesterConfig::default()
        };
        let mut digester = Digester::new(config).unwrap();
        digester.assign_normalization(1.5, 0.5);
        let n = digester.normalization();
        assert_eq!(n.mode, NormalizationMode::Linear);
        assert_eq!((n.mean, n.std), (1.5, 0.5));
    }

    #[test]
    fn batch_shapes_prepend_case_axis() {
        let shapes = DigestShapes {
            embedding: vec![2, 5],
            label: vec![],
        };
        assert_eq!(shapes.embedding_batch(7), vec![7, 2, 5]);
        assert_eq!(shapes.label_batch(7), vec![7]);
    }
}
