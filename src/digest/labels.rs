use super::config::OutputKind;
use super::error::Error;
use super::kernel::EmbeddingKernel;
use super::{Digester, Target};
use crate::model::geometry::distance;
use crate::model::molecule::{MoleculeView, Property};
use ndarray::{Array1, Array2, ArrayD, Axis};
use rand::Rng;

/// 1 for each position strictly closer than `cutoff` to `center`, else 0.
pub fn hard_cut(center: [f64; 3], positions: &[[f64; 3]], cutoff: f64) -> ArrayD<f64> {
    positions
        .iter()
        .map(|&p| if distance(p, center) < cutoff { 1.0 } else { 0.0 })
        .collect::<Array1<f64>>()
        .into_dyn()
}

/// Energies shifted so their minimum is zero.
fn min_shifted(energies: &[f64]) -> Vec<f64> {
    let e0 = energies.iter().copied().fold(f64::INFINITY, f64::min);
    energies.iter().map(|e| e - e0).collect()
}

fn rows<F>(atoms: &[usize], width: usize, mut row: F) -> Result<ArrayD<f64>, Error>
where
    F: FnMut(usize) -> Vec<f64>,
{
    let mut flat = Vec::with_capacity(atoms.len() * width);
    for &atom in atoms {
        let values = row(atom);
        if values.len() != width {
            return Err(Error::shape_mismatch("label", &[width], &[values.len()]));
        }
        flat.extend(values);
    }
    Ok(Array2::from_shape_vec((atoms.len(), width), flat)?.into_dyn())
}

impl<K: EmbeddingKernel> Digester<K> {
    /// Label for `target` under the configured output semantics.
    ///
    /// Position-dependent outputs (HardP, StoP, CalcEnergy) produce one
    /// entry per position and need [`Target::Atom`]. Relaxation, force and
    /// probability outputs produce one row per described atom. Energy and
    /// AtomizationEnergy broadcast the stored scalar over the cases.
    pub fn label<M, R>(
        &self,
        mol: &M,
        target: Target,
        positions: &[[f64; 3]],
        rng: &mut R,
    ) -> Result<ArrayD<f64>, Error>
    where
        M: MoleculeView + ?Sized,
        R: Rng + ?Sized,
    {
        self.check_target(mol, target)?;
        let output = self.config.output;
        let atoms: Vec<usize> = match target {
            Target::Atom(a) => vec![a],
            Target::All => (0..mol.atom_count()).collect(),
        };
        let cases = match target {
            Target::Atom(_) => positions.len(),
            Target::All => mol.atom_count(),
        };

        match (output, target) {
            (OutputKind::HardP, Target::Atom(a)) => Ok(hard_cut(
                mol.coordinates()[a],
                positions,
                self.config.hard_cut_cutoff,
            )),
            (OutputKind::StoP, Target::Atom(a)) => {
                let energies = self.oracle_energies(mol, positions, a)?;
                let kt = self.config.boltzmann_kt;
                Ok(min_shifted(&energies)
                    .into_iter()
                    .map(|e| {
                        let weight = (-e / kt).exp();
                        if rng.gen_range(0.0..1.0) < weight { 1.0 } else { 0.0 }
                    })
                    .collect::<Array1<f64>>()
                    .into_dyn())
            }
            (OutputKind::CalcEnergy, Target::Atom(a)) => {
                let energies = self.oracle_energies(mol, positions, a)?;
                Ok(Array1::from(min_shifted(&energies)).into_dyn())
            }
            (OutputKind::HardP | OutputKind::StoP | OutputKind::CalcEnergy, Target::All) => Err(
                Error::unsupported_combination("whole-molecule labels", self.config.embedding, output),
            ),
            (OutputKind::Disp, _) => {
                rows(&atoms, 3, |i| mol.relaxation_displacement(i).to_vec())
            }
            (OutputKind::GoForce, _) => {
                rows(&atoms, 3, |i| mol.relaxation_force(i, false).to_vec())
            }
            (OutputKind::GoForceSphere, _) => {
                rows(&atoms, 3, |i| mol.relaxation_force(i, true).to_vec())
            }
            (OutputKind::SmoothP, _) => {
                let width = self.config.grids.len() + 3;
                rows(&atoms, width, |i| mol.fit_occupancy_probability(i))
            }
            (OutputKind::Force, _) => {
                let forces = mol
                    .stored_property(Property::Forces)
                    .ok_or(Error::MissingProperty(Property::Forces))?;
                let expected = [mol.atom_count(), 3];
                if forces.shape() != expected {
                    return Err(Error::shape_mismatch("label", &expected, forces.shape()));
                }
                rows(&atoms, 3, |i| forces.index_axis(Axis(0), i).iter().copied().collect())
            }
            (OutputKind::Energy, _) => self.stored_scalar(mol, Property::Energy, cases),
            (OutputKind::AtomizationEnergy, _) => {
                self.stored_scalar(mol, Property::Atomization, cases)
            }
        }
    }

    fn oracle_energies<M: MoleculeView + ?Sized>(
        &self,
        mol: &M,
        positions: &[[f64; 3]],
        atom: usize,
    ) -> Result<Vec<f64>, Error> {
        mol.energies_for_perturbed_positions(positions, atom)
            .filter(|e| !e.is_empty())
            .ok_or(Error::EmptyEnergies { atom })
    }

    fn stored_scalar<M: MoleculeView + ?Sized>(
        &self,
        mol: &M,
        property: Property,
        cases: usize,
    ) -> Result<ArrayD<f64>, Error> {
        let value = mol
            .stored_property(property)
            .and_then(|v| v.iter().next().copied())
            .ok_or(Error::MissingProperty(property))?;
        Ok(Array1::from_elem(cases, value).into_dyn())
    }
}
