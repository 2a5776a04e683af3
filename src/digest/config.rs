//! Configuration types for molecule digestion.
//!
//! - [`DigesterConfig`] — Main configuration struct, loadable from TOML
//! - [`EmbeddingKind`] — Embedding algorithm selection
//! - [`OutputKind`] — Supervised label semantics
//! - [`SamplingMode`] — Probe position sampler for non-direct outputs
//! - [`NormalizationMode`] — How stored labels are (de)normalized
//! - [`HarmonicsConfig`] — Spherical-harmonic embedding resolution

use super::error::Error;
use super::grids::Grids;
use crate::model::types::Element;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Thermal energy at 300 K in Hartree.
pub const KAYBEETEE: f64 = 0.000950048;

/// Embedding algorithm used to describe an atom's environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmbeddingKind {
    /// Sorted Coulomb-matrix rows per element channel.
    Coulomb,
    /// Radial Gaussians times real spherical harmonics.
    #[default]
    GauSh,
    /// Rotation-invariant power spectrum of [`GauSh`](Self::GauSh).
    GauInv,
    /// Gaussian-smeared radial distribution function.
    Rdf,
    /// Overlaps with a set of centered Gaussian basis functions.
    SensoryBasis,
    /// Behler-style radial and angular symmetry functions.
    SymFunc,
    /// Pairwise Gaussians with geometrically spaced widths.
    PGaussian,
}

impl EmbeddingKind {
    pub fn name(&self) -> &'static str {
        match self {
            EmbeddingKind::Coulomb => "Coulomb",
            EmbeddingKind::GauSh => "GauSH",
            EmbeddingKind::GauInv => "GauInv",
            EmbeddingKind::Rdf => "RDF",
            EmbeddingKind::SensoryBasis => "SensoryBasis",
            EmbeddingKind::SymFunc => "SymFunc",
            EmbeddingKind::PGaussian => "PGaussian",
        }
    }

    /// Whether whole-molecule digestion accepts this embedding.
    pub fn supports_molwise(&self) -> bool {
        matches!(self, EmbeddingKind::GauSh | EmbeddingKind::GauInv)
    }
}

impl fmt::Display for EmbeddingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmbeddingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Coulomb" => Ok(EmbeddingKind::Coulomb),
            "GauSH" => Ok(EmbeddingKind::GauSh),
            "GauInv" => Ok(EmbeddingKind::GauInv),
            "RDF" => Ok(EmbeddingKind::Rdf),
            "SensoryBasis" => Ok(EmbeddingKind::SensoryBasis),
            "SymFunc" => Ok(EmbeddingKind::SymFunc),
            "PGaussian" => Ok(EmbeddingKind::PGaussian),
            _ => Err(Error::UnknownEmbedding(s.to_string())),
        }
    }
}

/// The quantity learned as the supervised label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputKind {
    /// Binary occupancy: 1 within the hard cutoff of the atom.
    HardP,
    /// Gaussian-mixture occupancy fit followed by the relaxation displacement.
    SmoothP,
    /// Stochastic Boltzmann occupancy of sampled positions.
    StoP,
    /// Relaxation displacement toward the Go minimum.
    #[default]
    Disp,
    /// Go-model force.
    GoForce,
    /// Go-model force in spherical coordinates.
    GoForceSphere,
    /// Stored per-atom forces.
    Force,
    /// Stored total energy.
    Energy,
    /// Stored atomization energy.
    AtomizationEnergy,
    /// Oracle energies of sampled positions, shifted by their minimum.
    CalcEnergy,
}

impl OutputKind {
    pub fn name(&self) -> &'static str {
        match self {
            OutputKind::HardP => "HardP",
            OutputKind::SmoothP => "SmoothP",
            OutputKind::StoP => "StoP",
            OutputKind::Disp => "Disp",
            OutputKind::GoForce => "GoForce",
            OutputKind::GoForceSphere => "GoForceSphere",
            OutputKind::Force => "Force",
            OutputKind::Energy => "Energy",
            OutputKind::AtomizationEnergy => "AtomizationEnergy",
            OutputKind::CalcEnergy => "CalcEnergy",
        }
    }

    /// Outputs embedded once at the atom's own position rather than at
    /// sampled probe positions.
    pub fn is_direct(&self) -> bool {
        matches!(
            self,
            OutputKind::SmoothP
                | OutputKind::Disp
                | OutputKind::Force
                | OutputKind::GoForce
                | OutputKind::GoForceSphere
        )
    }

    /// Whether whole-molecule digestion accepts this output.
    pub fn supports_molwise(&self) -> bool {
        matches!(
            self,
            OutputKind::GoForce | OutputKind::GoForceSphere | OutputKind::Force
        )
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HardP" => Ok(OutputKind::HardP),
            "SmoothP" => Ok(OutputKind::SmoothP),
            "StoP" => Ok(OutputKind::StoP),
            "Disp" => Ok(OutputKind::Disp),
            "GoForce" => Ok(OutputKind::GoForce),
            "GoForceSphere" => Ok(OutputKind::GoForceSphere),
            "Force" => Ok(OutputKind::Force),
            "Energy" => Ok(OutputKind::Energy),
            "AtomizationEnergy" => Ok(OutputKind::AtomizationEnergy),
            "CalcEnergy" => Ok(OutputKind::CalcEnergy),
            _ => Err(Error::UnknownOutput(s.to_string())),
        }
    }
}

fn deserialize_by_name<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = Error>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl<'de> Deserialize<'de> for EmbeddingKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_by_name(deserializer)
    }
}

impl<'de> Deserialize<'de> for OutputKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_by_name(deserializer)
    }
}

/// Sampler used for outputs that are not embedded directly at the atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Isotropic Gaussian offsets around the atom.
    #[default]
    Smooth,
    /// Distance-biased radial sampling concentrated near the atom.
    Biased,
}

/// Transform relating stored labels to physical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    /// Labels are stored as-is.
    #[default]
    None,
    /// Labels are stored as `(value - mean) / std`.
    Linear,
    /// Labels are stored as `sign(value) · log10(1 + |value|)`.
    Log,
}

/// Resolution of the spherical-harmonic embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HarmonicsConfig {
    /// Highest angular momentum included.
    pub lmax: usize,
    /// Number of radial Gaussians spread over the sensory radius.
    pub radial_count: usize,
}

impl Default for HarmonicsConfig {
    fn default() -> Self {
        Self {
            lmax: 4,
            radial_count: 6,
        }
    }
}

/// Main configuration for a [`Digester`](super::Digester).
///
/// # Examples
///
/// ```
/// use mol_digest::{DigesterConfig, EmbeddingKind, OutputKind};
///
/// let config = DigesterConfig::from_toml(
///     r#"
///     elements = ["O", "H"]
///     embedding = "SymFunc"
///     output = "CalcEnergy"
///     samples_per_atom = 8
///     "#,
/// )?;
/// assert_eq!(config.embedding, EmbeddingKind::SymFunc);
/// assert_eq!(config.output, OutputKind::CalcEnergy);
/// assert_eq!(config.samples_per_atom, 8);
/// # Ok::<(), mol_digest::DigestError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DigesterConfig {
    /// Elements the embedding has channels for. Sorted and deduplicated by
    /// the digester.
    pub elements: Vec<Element>,

    /// Embedding algorithm.
    pub embedding: EmbeddingKind,

    /// Label semantics.
    pub output: OutputKind,

    /// Probe positions per atom for sampled outputs. Direct outputs always
    /// use one.
    pub samples_per_atom: usize,

    /// Mean distance (Å) of sampled probe positions from the atom.
    pub sample_distance: f64,

    /// Sampler for non-direct outputs.
    pub sampling: SamplingMode,

    /// Width (Å) of the Gaussian smeared over each grid center when a
    /// [`OutputKind::SmoothP`] prediction is rasterized.
    pub blur_radius: f64,

    /// Environment cutoff radius (Å) of every embedding.
    pub sensory_radius: f64,

    /// Grid resolution shared by the radial embeddings.
    pub ngrid: usize,

    /// Distance (Å) under which [`OutputKind::HardP`] labels are 1.
    pub hard_cut_cutoff: f64,

    /// How labels relate to physical values in evaluation.
    pub normalization: NormalizationMode,

    /// Spherical-harmonic resolution.
    pub harmonics: HarmonicsConfig,

    /// Probability grid for [`OutputKind::SmoothP`] evaluation.
    pub grids: Grids,

    /// Thermal scale of [`OutputKind::StoP`] Boltzmann weights.
    pub boltzmann_kt: f64,
}

impl Default for DigesterConfig {
    fn default() -> Self {
        Self {
            elements: vec![Element::H, Element::C, Element::N, Element::O],
            embedding: EmbeddingKind::default(),
            output: OutputKind::default(),
            samples_per_atom: 1,
            sample_distance: 2.0,
            sampling: SamplingMode::default(),
            blur_radius: 0.05,
            sensory_radius: 6.0,
            ngrid: 5,
            hard_cut_cutoff: 0.05,
            normalization: NormalizationMode::default(),
            harmonics: HarmonicsConfig::default(),
            grids: Grids::default(),
            boltzmann_kt: KAYBEETEE,
        }
    }
}

impl DigesterConfig {
    /// Parses a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    /// Checks value ranges. Called by [`Digester::new`](super::Digester::new).
    pub fn validate(&self) -> Result<(), Error> {
        if self.elements.is_empty() {
            return Err(Error::InvalidConfig("element set is empty".into()));
        }
        if self.samples_per_atom == 0 {
            return Err(Error::InvalidConfig("samples_per_atom must be positive".into()));
        }
        if self.ngrid == 0 {
            return Err(Error::InvalidConfig("ngrid must be positive".into()));
        }
        if self.harmonics.radial_count == 0 {
            return Err(Error::InvalidConfig(
                "harmonics.radial_count must be positive".into(),
            ));
        }
        if self.grids.points_per_axis == 0 {
            return Err(Error::InvalidConfig(
                "grids.points_per_axis must be positive".into(),
            ));
        }
        for (name, value) in [
            ("sample_distance", self.sample_distance),
            ("blur_radius", self.blur_radius),
            ("sensory_radius", self.sensory_radius),
            ("hard_cut_cutoff", self.hard_cut_cutoff),
            ("boltzmann_kt", self.boltzmann_kt),
        ] {
            if !(value > 0.0) {
                return Err(Error::InvalidConfig(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}
