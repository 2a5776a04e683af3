use super::config::EmbeddingKind;
use super::error::Error;
use super::kernel::{EmbeddingKernel, KernelQuery, SymmetryParams};
use super::{Digester, Target};
use crate::model::molecule::MoleculeView;
use ndarray::ArrayD;

const PGAUSSIAN_ETA_MIN: f64 = 0.5;
const PGAUSSIAN_ETA_MAX: f64 = 12.0;

/// Symmetry-function parameter families for `ngrid` points inside `radius`.
pub fn symmetry_params(ngrid: usize, radius: f64) -> SymmetryParams {
    SymmetryParams {
        zeta: (0..ngrid).map(|i| 1.5f64.powi(i as i32)).collect(),
        eta1: (0..ngrid).map(|i| 0.008 * 2f64.powi(i as i32)).collect(),
        eta2: (0..ngrid).map(|i| 0.002 * 2f64.powi(i as i32)).collect(),
        rs: (0..ngrid).map(|i| i as f64 * radius / ngrid as f64).collect(),
    }
}

/// Geometric ladder of pairwise-Gaussian exponents from 0.5 to 12.0.
pub fn pgaussian_eta(ngrid: usize) -> Vec<f64> {
    if ngrid <= 1 {
        return vec![PGAUSSIAN_ETA_MIN; ngrid];
    }
    let step = (PGAUSSIAN_ETA_MAX / PGAUSSIAN_ETA_MIN).ln() / (ngrid - 1) as f64;
    (0..ngrid)
        .map(|i| PGAUSSIAN_ETA_MIN * (i as f64 * step).exp())
        .collect()
}

/// Reshapes raw `(rows, a, b)` kernel output into `(rows / channels, channels, a·b)`.
pub fn fold_channels(raw: ArrayD<f64>, channels: usize) -> Result<ArrayD<f64>, Error> {
    let &[rows, a, b] = raw.shape() else {
        return Err(Error::Kernel(format!(
            "expected a rank-3 raw embedding, found shape {:?}",
            raw.shape()
        )));
    };
    if channels == 0 || rows % channels != 0 {
        return Err(Error::Kernel(format!(
            "{rows} raw rows do not split into {channels} channels"
        )));
    }
    Ok(raw.into_shape_with_order(vec![rows / channels, channels, a * b])?)
}

impl<K: EmbeddingKernel> Digester<K> {
    /// Embeds the environment of `target`.
    ///
    /// For [`Target::Atom`] the atom is moved to each of `positions` and one
    /// row per position is returned; for [`Target::All`] `positions` is
    /// ignored and one row per atom is returned.
    pub fn embed<M: MoleculeView + ?Sized>(
        &self,
        mol: &M,
        target: Target,
        positions: &[[f64; 3]],
    ) -> Result<ArrayD<f64>, Error> {
        self.check_target(mol, target)?;
        let config = &self.config;
        let query = KernelQuery {
            coords: mol.coordinates(),
            species: mol.species(),
            elements: &config.elements,
            positions,
            target,
            radius: config.sensory_radius,
            ngrid: config.ngrid,
        };

        match config.embedding {
            EmbeddingKind::Coulomb => self.kernel.coulomb(&query),
            EmbeddingKind::GauSh => self.kernel.spherical_harmonic(&query, &config.harmonics),
            EmbeddingKind::GauInv => self.kernel.invariant(&query, &config.harmonics),
            EmbeddingKind::Rdf => self.kernel.radial_distribution(&query),
            EmbeddingKind::SensoryBasis => self.kernel.overlap_basis(&query),
            EmbeddingKind::SymFunc => {
                let params = symmetry_params(config.ngrid, config.sensory_radius);
                let raw = self.kernel.symmetry_functions(&query, &params)?;
                fold_channels(raw, self.nsym())
            }
            EmbeddingKind::PGaussian => {
                let raw = self
                    .kernel
                    .pairwise_gaussian(&query, &pgaussian_eta(config.ngrid))?;
                fold_channels(raw, self.channel_count())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::config::DigesterConfig;
    use crate::model::molecule::Molecule;
    use crate::model::types::Element;
    use ndarray::{Array3, IxDyn};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps * (1.0 + a.abs().max(b.abs()))
    }

    fn water() -> Molecule {
        Molecule::new(
            vec![Element::O, Element::H, Element::H],
            vec![[0.0, 0.0, 0.0], [0.9572, 0.0, 0.0], [-0.2400, 0.9266, 0.0]],
        )
    }

    fn digester(embedding: EmbeddingKind) -> Digester {
        Digester::new(DigesterConfig {
            elements: vec![Element::H, Element::O],
            embedding,
            ngrid: 4,
            ..DigesterConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn symmetry_params_follow_geometric_ladders() {
        let p = symmetry_params(4, 6.0);
        assert_eq!(p.zeta, vec![1.0, 1.5, 2.25, 3.375]);
        assert_eq!(p.eta1, vec![0.008, 0.016, 0.032, 0.064]);
        assert_eq!(p.eta2, vec![0.002, 0.004, 0.008, 0.016]);
        assert_eq!(p.rs, vec![0.0, 1.5, 3.0, 4.5]);
    }

    #[test]
    fn pgaussian_eta_spans_its_range() {
        let eta = pgaussian_eta(5);
        assert_eq!(eta.len(), 5);
        assert!(approx_eq(eta[0], 0.5, 1e-12));
        assert!(approx_eq(eta[4], 12.0, 1e-12));
        let ratio = eta[1] / eta[0];
        for w in eta.windows(2) {
            assert!(approx_eq(w[1] / w[0], ratio, 1e-12));
        }
        assert_eq!(pgaussian_eta(1), vec![0.5]);
    }

    #[test]
    fn fold_channels_regroups_rows() {
        let raw = Array3::from_shape_fn((6, 2, 2), |(r, a, b)| (r * 4 + a * 2 + b) as f64).into_dyn();
        let folded = fold_channels(raw, 3).unwrap();
        assert_eq!(folded.shape(), &[2, 3, 4]);
        assert_eq!(folded[IxDyn(&[1, 0, 0])], 12.0);
        assert_eq!(folded[IxDyn(&[0, 2, 3])], 11.0);
    }

    #[test]
    fn fold_channels_rejects_uneven_rows() {
        let raw = ArrayD::<f64>::zeros(IxDyn(&[5, 2, 2]));
        assert!(matches!(fold_channels(raw, 3), Err(Error::Kernel(_))));
        let raw = ArrayD::<f64>::zeros(IxDyn(&[4, 2]));
        assert!(matches!(fold_channels(raw, 2), Err(Error::Kernel(_))));
    }

    #[test]
    fn every_embedding_has_a_fixed_trailing_shape() {
        let mol = water();
        let positions = [[0.1, 0.0, 0.0], [0.0, 0.2, 0.0], [0.0, 0.0, -0.1]];
        for kind in [
            EmbeddingKind::Coulomb,
            EmbeddingKind::GauSh,
            EmbeddingKind::GauInv,
            EmbeddingKind::Rdf,
            EmbeddingKind::SensoryBasis,
            EmbeddingKind::SymFunc,
            EmbeddingKind::PGaussian,
        ] {
            let d = digester(kind);
            let one = d.embed(&mol, Target::Atom(0), &positions).unwrap();
            let all = d.embed(&mol, Target::All, &[]).unwrap();
            assert_eq!(one.shape()[0], 3, "{kind}");
            assert_eq!(all.shape()[0], 3, "{kind}");
            assert_eq!(one.shape()[1..], all.shape()[1..], "{kind}");
        }
    }

    #[test]
    fn folded_embeddings_have_channel_axis() {
        let mol = water();
        let sym = digester(EmbeddingKind::SymFunc)
            .embed(&mol, Target::Atom(1), &[[1.0, 0.0, 0.0]])
            .unwrap();
        assert_eq!(sym.shape(), &[1, 8, 16]);
        let pg = digester(EmbeddingKind::PGaussian)
            .embed(&mol, Target::Atom(1), &[[1.0, 0.0, 0.0]])
            .unwrap();
        assert_eq!(pg.shape(), &[1, 2, 4]);
    }

    #[test]
    fn out_of_range_atom_is_rejected() {
        let err = digester(EmbeddingKind::Coulomb)
            .embed(&water(), Target::Atom(3), &[[0.0; 3]])
            .unwrap_err();
        assert!(matches!(err, Error::AtomIndex { index: 3, count: 3 }));
    }
}
