use super::config::SamplingMode;
use super::error::Error;
use super::kernel::EmbeddingKernel;
use super::sampling::{biased_radial_sample, points_near, uniform_cubic_grid};
use super::{DigestShapes, Digester, Target};
use crate::model::molecule::MoleculeView;
use crate::model::types::Element;
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use rand::Rng;
use tracing::debug;

/// Half-width (Å) of the uniform grid used by [`Digester::sample_energies`].
const ENERGY_GRID_HALF_EXTENT: f64 = 4.0;
/// Grid points per axis used by [`Digester::sample_energies`].
const ENERGY_GRID_STEPS: usize = 20;

/// Training cases from one molecule.
///
/// `inputs` and `labels` share the case axis; `atoms[i]` is the atom that
/// produced case `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestBatch {
    pub inputs: ArrayD<f64>,
    pub labels: ArrayD<f64>,
    pub atoms: Vec<usize>,
}

impl DigestBatch {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

fn check_case(
    what: &'static str,
    case: &ArrayD<f64>,
    rows: usize,
    trailing: &[usize],
) -> Result<(), Error> {
    let expected = super::with_leading(rows, trailing);
    if case.shape() != expected.as_slice() {
        return Err(Error::shape_mismatch(what, &expected, case.shape()));
    }
    Ok(())
}

impl<K: EmbeddingKernel> Digester<K> {
    /// One embedding plus its label.
    pub fn embed_case<M, R>(
        &self,
        mol: &M,
        target: Target,
        positions: &[[f64; 3]],
        rng: &mut R,
    ) -> Result<(ArrayD<f64>, ArrayD<f64>), Error>
    where
        M: MoleculeView + ?Sized,
        R: Rng + ?Sized,
    {
        let inputs = self.embed(mol, target, positions)?;
        let labels = self.label(mol, target, positions, rng)?;
        Ok((inputs, labels))
    }

    /// Discovers the per-case shapes by digesting atom 0 of `mol` at the
    /// origin. Later calls return the cached shapes without probing.
    pub fn initialize<M, R>(&self, mol: &M, rng: &mut R) -> Result<DigestShapes, Error>
    where
        M: MoleculeView + ?Sized,
        R: Rng + ?Sized,
    {
        if let Some(shapes) = self.shapes.get() {
            return Ok(shapes.clone());
        }
        let _guard = self.probe_guard();
        if let Some(shapes) = self.shapes.get() {
            return Ok(shapes.clone());
        }

        let (inputs, labels) = self.embed_case(mol, Target::Atom(0), &[[0.0; 3]], rng)?;
        let shapes = DigestShapes {
            embedding: inputs.shape()[1..].to_vec(),
            label: labels.shape()[1..].to_vec(),
        };
        debug!(
            embedding = ?shapes.embedding,
            label = ?shapes.label,
            "discovered digest shapes"
        );
        Ok(self.shapes.get_or_init(|| shapes).clone())
    }

    /// Probe positions for one atom at `point`.
    ///
    /// Direct outputs describe the atom where it is; the rest sample
    /// [`samples_per_atom`](Self::samples_per_atom) positions with the
    /// configured sampler.
    pub fn sample_positions<R: Rng + ?Sized>(&self, point: [f64; 3], rng: &mut R) -> Vec<[f64; 3]> {
        if self.config.output.is_direct() {
            return vec![point];
        }
        let count = self.samples_per_atom();
        let distance = self.config.sample_distance;
        match self.config.sampling {
            SamplingMode::Smooth => points_near(point, count, distance, rng),
            SamplingMode::Biased => biased_radial_sample(point, count, distance, rng),
        }
    }

    /// Digests every atom of `element` in `mol`.
    ///
    /// Produces `k · samples_per_atom()` cases for `k` atoms of `element`,
    /// grouped by atom in index order.
    pub fn train_digest<M, R>(
        &self,
        mol: &M,
        element: Element,
        rng: &mut R,
    ) -> Result<DigestBatch, Error>
    where
        M: MoleculeView + ?Sized,
        R: Rng + ?Sized,
    {
        let per_atom = self.samples_per_atom();
        let ncase = mol.count_atoms_of(element) * per_atom;
        let shapes = match self.shapes.get() {
            Some(shapes) if ncase == 0 => shapes.clone(),
            _ => self.initialize(mol, rng)?,
        };

        let mut inputs = ArrayD::zeros(IxDyn(&shapes.embedding_batch(ncase)));
        let mut labels = ArrayD::zeros(IxDyn(&shapes.label_batch(ncase)));
        let mut atoms = Vec::with_capacity(ncase);

        let mut casep = 0;
        for (atom, _) in mol
            .species()
            .iter()
            .enumerate()
            .filter(|&(_, &e)| e == element)
        {
            let positions = self.sample_positions(mol.coordinates()[atom], rng);
            let (ins, outs) = self.embed_case(mol, Target::Atom(atom), &positions, rng)?;
            check_case("embedding", &ins, per_atom, &shapes.embedding)?;
            check_case("label", &outs, per_atom, &shapes.label)?;

            let rows = Slice::from(casep..casep + per_atom);
            inputs.slice_axis_mut(Axis(0), rows).assign(&ins);
            labels.slice_axis_mut(Axis(0), rows).assign(&outs);
            atoms.extend(std::iter::repeat_n(atom, per_atom));
            casep += per_atom;
        }

        debug!(
            element = %element,
            cases = ncase,
            per_atom,
            "digested element"
        );
        Ok(DigestBatch {
            inputs,
            labels,
            atoms,
        })
    }

    /// Digests every atom of `mol` in a single kernel call.
    ///
    /// Only force-family outputs with spherical-harmonic embeddings are
    /// supported.
    pub fn train_digest_molwise<M, R>(&self, mol: &M, rng: &mut R) -> Result<DigestBatch, Error>
    where
        M: MoleculeView + ?Sized,
        R: Rng + ?Sized,
    {
        let (embedding, output) = (self.config.embedding, self.config.output);
        if !(embedding.supports_molwise() && output.supports_molwise()) {
            return Err(Error::unsupported_combination(
                "molecule-wise digestion",
                embedding,
                output,
            ));
        }

        let shapes = self.initialize(mol, rng)?;
        let natoms = mol.atom_count();
        let (inputs, labels) = self.embed_case(mol, Target::All, mol.coordinates(), rng)?;
        check_case("embedding", &inputs, natoms, &shapes.embedding)?;
        check_case("label", &labels, natoms, &shapes.label)?;

        debug!(cases = natoms, "digested molecule");
        Ok(DigestBatch {
            inputs,
            labels,
            atoms: (0..natoms).collect(),
        })
    }

    /// Embeddings of `atom` moved over a `steps³` cubic grid of half-width
    /// `half_extent` around its position. No labels.
    pub fn uniform_digest<M: MoleculeView + ?Sized>(
        &self,
        mol: &M,
        atom: usize,
        half_extent: f64,
        steps: usize,
    ) -> Result<(Vec<[f64; 3]>, ArrayD<f64>), Error> {
        self.check_target(mol, Target::Atom(atom))?;
        let positions = uniform_cubic_grid(mol.coordinates()[atom], half_extent, steps);
        let inputs = self.embed(mol, Target::Atom(atom), &positions)?;
        Ok((positions, inputs))
    }

    /// Oracle energies for every atom of `element` moved over sampled
    /// positions, without embeddings.
    ///
    /// `uniform` selects a 4 Å, 20-step cubic grid; otherwise
    /// `samples_per_atom` biased radial samples are drawn.
    pub fn sample_energies<M, R>(
        &self,
        mol: &M,
        element: Element,
        uniform: bool,
        rng: &mut R,
    ) -> Result<Vec<(usize, Vec<f64>)>, Error>
    where
        M: MoleculeView + ?Sized,
        R: Rng + ?Sized,
    {
        let mut out = Vec::with_capacity(mol.count_atoms_of(element));
        for (atom, _) in mol
            .species()
            .iter()
            .enumerate()
            .filter(|&(_, &e)| e == element)
        {
            let point = mol.coordinates()[atom];
            let positions = if uniform {
                uniform_cubic_grid(point, ENERGY_GRID_HALF_EXTENT, ENERGY_GRID_STEPS)
            } else {
                biased_radial_sample(
                    point,
                    self.config.samples_per_atom,
                    self.config.sample_distance,
                    rng,
                )
            };
            let energies = mol
                .energies_for_perturbed_positions(&positions, atom)
                .filter(|e| !e.is_empty())
                .ok_or(Error::EmptyEnergies { atom })?;
            out.push((atom, energies));
        }
        Ok(out)
    }

    /// Applies the configured label normalization to `batch`.
    pub fn normalize_batch(&self, batch: &mut DigestBatch) {
        batch.labels = self.normalization.normalize(&batch.labels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::config::{
        DigesterConfig, EmbeddingKind, HarmonicsConfig, NormalizationMode, OutputKind,
        SamplingMode,
    };
    use crate::digest::grids::Grids;
    use crate::digest::kernel::{KernelQuery, NativeKernel, SymmetryParams};
    use crate::model::molecule::Molecule;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn water() -> Molecule {
        Molecule::new(
            vec![Element::O, Element::H, Element::H],
            vec![[0.0, 0.0, 0.0], [0.9572, 0.0, 0.0], [-0.2400, 0.9266, 0.0]],
        )
    }

    fn methane() -> Molecule {
        Molecule::new(
            vec![Element::C, Element::H, Element::H, Element::H, Element::H],
            vec![
                [0.0, 0.0, 0.0],
                [0.629, 0.629, 0.629],
                [-0.629, -0.629, 0.629],
                [-0.629, 0.629, -0.629],
                [0.629, -0.629, -0.629],
            ],
        )
    }

    fn config(embedding: EmbeddingKind, output: OutputKind) -> DigesterConfig {
        DigesterConfig {
            elements: vec![Element::H, Element::C, Element::O],
            embedding,
            output,
            ngrid: 4,
            ..DigesterConfig::default()
        }
    }

    #[test]
    fn case_count_is_atoms_times_samples() {
        let mut rng = Pcg64::seed_from_u64(11);
        let digester = Digester::new(DigesterConfig {
            samples_per_atom: 4,
            sampling: SamplingMode::Biased,
            ..config(EmbeddingKind::Coulomb, OutputKind::CalcEnergy)
        })
        .unwrap();

        let batch = digester.train_digest(&methane(), Element::H, &mut rng).unwrap();
        assert_eq!(batch.len(), 16);
        assert_eq!(batch.inputs.shape(), &[16, 3, 4]);
        assert_eq!(batch.labels.shape(), &[16]);
        assert_eq!(&batch.atoms[..5], &[1, 1, 1, 1, 2]);
        assert_eq!(&batch.atoms[12..], &[4, 4, 4, 4]);
    }

    #[test]
    fn every_case_matches_its_source_atom() {
        let mut rng = Pcg64::seed_from_u64(12);
        let mut mol = water();
        mol.distort(&mut rng, 0.05);
        let digester = Digester::new(config(EmbeddingKind::GauInv, OutputKind::GoForce)).unwrap();

        let batch = digester.train_digest(&mol, Element::H, &mut rng).unwrap();
        assert_eq!(batch.atoms, vec![1, 2]);
        for (case, &atom) in batch.atoms.iter().enumerate() {
            let (ins, outs) = digester
                .embed_case(&mol, Target::Atom(atom), &[mol.coordinates()[atom]], &mut rng)
                .unwrap();
            assert_eq!(batch.inputs.index_axis(Axis(0), case), ins.index_axis(Axis(0), 0));
            assert_eq!(batch.labels.index_axis(Axis(0), case), outs.index_axis(Axis(0), 0));
        }
    }

    #[test]
    fn shapes_are_stable_across_molecules() {
        let mut rng = Pcg64::seed_from_u64(13);
        let digester = Digester::new(config(EmbeddingKind::SymFunc, OutputKind::SmoothP)).unwrap();
        assert!(digester.shapes().is_none());

        let first = digester.train_digest(&water(), Element::H, &mut rng).unwrap();
        let shapes = digester.shapes().cloned().unwrap();
        let second = digester.train_digest(&methane(), Element::H, &mut rng).unwrap();
        let third = digester.train_digest(&methane(), Element::C, &mut rng).unwrap();

        assert_eq!(digester.shapes(), Some(&shapes));
        for batch in [&first, &second, &third] {
            assert_eq!(batch.inputs.shape()[1..], shapes.embedding[..]);
            assert_eq!(batch.labels.shape()[1..], shapes.label[..]);
        }
        assert_eq!(second.len(), 4);
        assert_eq!(third.len(), 1);
    }

    #[test]
    fn absent_element_yields_empty_batch() {
        let mut rng = Pcg64::seed_from_u64(14);
        let digester = Digester::new(config(EmbeddingKind::Rdf, OutputKind::Disp)).unwrap();
        let batch = digester.train_digest(&water(), Element::C, &mut rng).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.inputs.shape(), &[0, 3, 4]);
        assert_eq!(batch.labels.shape(), &[0, 3]);
    }

    #[test]
    fn empty_molecule_after_discovery_yields_empty_batch() {
        let mut rng = Pcg64::seed_from_u64(20);
        let digester = Digester::new(config(EmbeddingKind::Rdf, OutputKind::Disp)).unwrap();
        let empty = Molecule::new(Vec::new(), Vec::new());
        assert!(matches!(
            digester.train_digest(&empty, Element::H, &mut rng),
            Err(Error::AtomIndex { index: 0, count: 0 })
        ));

        digester.train_digest(&water(), Element::H, &mut rng).unwrap();
        let batch = digester.train_digest(&empty, Element::H, &mut rng).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.inputs.shape(), &[0, 3, 4]);
        assert_eq!(batch.labels.shape(), &[0, 3]);
    }

    #[test]
    fn case_off_the_discovered_shape_fails() {
        let mut rng = Pcg64::seed_from_u64(21);
        let digester = Digester::new(config(EmbeddingKind::SymFunc, OutputKind::SmoothP)).unwrap();
        let ngau = Grids::default().len();
        digester.train_digest(&water(), Element::H, &mut rng).unwrap();

        let coarse = water().with_grids(Grids {
            points_per_axis: 3,
            half_extent: 1.0,
        });
        let err = digester.train_digest(&coarse, Element::H, &mut rng).unwrap_err();
        match err {
            Error::ShapeMismatch {
                what,
                expected,
                found,
            } => {
                assert_eq!(what, "label");
                assert_eq!(expected, vec![ngau + 3]);
                assert_eq!(found, vec![27 + 3]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[derive(Debug, Default)]
    struct CountingKernel {
        calls: AtomicUsize,
    }

    impl EmbeddingKernel for CountingKernel {
        fn coulomb(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            NativeKernel.coulomb(query)
        }

        fn radial_distribution(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error> {
            NativeKernel.radial_distribution(query)
        }

        fn overlap_basis(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error> {
            NativeKernel.overlap_basis(query)
        }

        fn spherical_harmonic(
            &self,
            query: &KernelQuery<'_>,
            harmonics: &HarmonicsConfig,
        ) -> Result<ArrayD<f64>, Error> {
            NativeKernel.spherical_harmonic(query, harmonics)
        }

        fn invariant(
            &self,
            query: &KernelQuery<'_>,
            harmonics: &HarmonicsConfig,
        ) -> Result<ArrayD<f64>, Error> {
            NativeKernel.invariant(query, harmonics)
        }

        fn symmetry_functions(
            &self,
            query: &KernelQuery<'_>,
            params: &SymmetryParams,
        ) -> Result<ArrayD<f64>, Error> {
            NativeKernel.symmetry_functions(query, params)
        }

        fn pairwise_gaussian(
            &self,
            query: &KernelQuery<'_>,
            eta: &[f64],
        ) -> Result<ArrayD<f64>, Error> {
            NativeKernel.pairwise_gaussian(query, eta)
        }
    }

    #[test]
    fn concurrent_initialization_probes_once() {
        let digester = Digester::with_kernel(
            config(EmbeddingKind::Coulomb, OutputKind::Disp),
            CountingKernel::default(),
        )
        .unwrap();
        let mol = water();

        let shapes: Vec<DigestShapes> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8u64)
                .map(|seed| {
                    let (digester, mol) = (&digester, &mol);
                    s.spawn(move || {
                        let mut rng = Pcg64::seed_from_u64(seed);
                        digester.initialize(mol, &mut rng).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(digester.kernel().calls.load(Ordering::SeqCst), 1);
        assert!(shapes.iter().all(|s| Some(s) == digester.shapes()));
    }

    #[test]
    fn energy_output_without_energy_fails() {
        let mut rng = Pcg64::seed_from_u64(15);
        let digester = Digester::new(config(EmbeddingKind::Coulomb, OutputKind::Energy)).unwrap();
        let err = digester.train_digest(&water(), Element::H, &mut rng).unwrap_err();
        assert!(matches!(err, Error::MissingProperty(_)));
    }

    #[test]
    fn molwise_digest_covers_every_atom() {
        let mut rng = Pcg64::seed_from_u64(16);
        let mut mol = methane();
        mol.distort(&mut rng, 0.05);
        let digester =
            Digester::new(config(EmbeddingKind::GauSh, OutputKind::GoForceSphere)).unwrap();
        let batch = digester.train_digest_molwise(&mol, &mut rng).unwrap();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.atoms, vec![0, 1, 2, 3, 4]);
        assert_eq!(batch.labels.shape(), &[5, 3]);
        assert_eq!(batch.inputs.shape()[0], 5);
    }

    #[test]
    fn molwise_digest_rejects_other_combinations() {
        let mut rng = Pcg64::seed_from_u64(17);
        for (embedding, output) in [
            (EmbeddingKind::Coulomb, OutputKind::GoForce),
            (EmbeddingKind::GauSh, OutputKind::Disp),
        ] {
            let digester = Digester::new(config(embedding, output)).unwrap();
            let err = digester.train_digest_molwise(&water(), &mut rng).unwrap_err();
            assert!(matches!(err, Error::UnsupportedCombination { .. }));
        }
    }

    #[test]
    fn uniform_digest_embeds_grid_positions() {
        let digester = Digester::new(config(EmbeddingKind::PGaussian, OutputKind::Disp)).unwrap();
        let (positions, inputs) = digester.uniform_digest(&water(), 1, 0.5, 3).unwrap();
        assert_eq!(positions.len(), 27);
        assert_eq!(inputs.shape(), &[27, 3, 4]);
        assert!(digester.uniform_digest(&water(), 7, 0.5, 3).is_err());
    }

    #[test]
    fn sample_energies_per_atom() {
        let mut rng = Pcg64::seed_from_u64(18);
        let digester = Digester::new(DigesterConfig {
            samples_per_atom: 6,
            ..config(EmbeddingKind::Coulomb, OutputKind::StoP)
        })
        .unwrap();

        let biased = digester
            .sample_energies(&water(), Element::H, false, &mut rng)
            .unwrap();
        assert_eq!(biased.len(), 2);
        assert_eq!(biased[0].0, 1);
        assert_eq!(biased[1].1.len(), 6);

        let uniform = digester
            .sample_energies(&water(), Element::O, true, &mut rng)
            .unwrap();
        assert_eq!(uniform.len(), 1);
        assert_eq!(uniform[0].1.len(), 20 * 20 * 20);
    }

    #[test]
    fn normalize_batch_transforms_labels_only() {
        let mut rng = Pcg64::seed_from_u64(19);
        let mut mol = water();
        mol.distort(&mut rng, 0.05);
        let mut digester = Digester::new(DigesterConfig {
            normalization: NormalizationMode::Linear,
            ..config(EmbeddingKind::Coulomb, OutputKind::GoForce)
        })
        .unwrap();
        digester.assign_normalization(1.0, 2.0);

        let mut batch = digester.train_digest(&mol, Element::H, &mut rng).unwrap();
        let raw = batch.clone();
        digester.normalize_batch(&mut batch);
        assert_eq!(batch.inputs, raw.inputs);
        for (n, r) in batch.labels.iter().zip(raw.labels.iter()) {
            assert!((n - (r - 1.0) / 2.0).abs() < 1e-12);
        }
    }
}
