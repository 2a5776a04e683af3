use super::geometry::{add, cart_to_sphere};
use super::go::GoModel;
use super::types::Element;
use crate::digest::grids::Grids;
use ndarray::{Array2, ArrayD, arr0};
use rand::Rng;
use std::fmt;

/// Named physical property a molecule may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Total energy, a scalar.
    Energy,
    /// Atomization energy, a scalar.
    Atomization,
    /// One force 3-vector per atom.
    Forces,
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::Energy => "energy",
            Property::Atomization => "atomization",
            Property::Forces => "forces",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub energy: Option<f64>,
    pub atomization: Option<f64>,
    pub forces: Option<Vec<[f64; 3]>>,
}

/// Read interface the digester consumes.
///
/// Coordinates and species are parallel sequences. The geometry queries
/// (`energies_for_perturbed_positions`, `relaxation_*`,
/// `fit_occupancy_probability`) are treated as blocking oracle calls.
pub trait MoleculeView {
    fn coordinates(&self) -> &[[f64; 3]];

    fn species(&self) -> &[Element];

    /// Returns the stored property, if present. Scalars come back as
    /// zero-dimensional arrays, forces as `(natoms, 3)`.
    fn stored_property(&self, property: Property) -> Option<ArrayD<f64>>;

    /// Energies of the molecule with `atom` moved to each of `positions`.
    ///
    /// `None` signals that the oracle produced nothing.
    fn energies_for_perturbed_positions(&self, positions: &[[f64; 3]], atom: usize)
    -> Option<Vec<f64>>;

    fn relaxation_displacement(&self, atom: usize) -> [f64; 3];

    /// Force on `atom`, as `(r, theta, phi)` when `spherical` is set.
    fn relaxation_force(&self, atom: usize, spherical: bool) -> [f64; 3];

    fn fit_occupancy_probability(&self, atom: usize) -> Vec<f64>;

    #[inline]
    fn atom_count(&self) -> usize {
        self.species().len()
    }

    fn count_atoms_of(&self, element: Element) -> usize {
        self.species().iter().filter(|&&e| e == element).count()
    }
}

/// A molecule with a Go-model oracle built from its initial geometry.
///
/// The Go model holds one rest distance per atom pair, so the atom list is
/// fixed at construction; coordinates change only through
/// [`distort`](Molecule::distort).
///
/// ```compile_fail
/// use mol_digest::{Element, Molecule};
///
/// let mut h2 = Molecule::new(vec![Element::H; 2], vec![[0.0; 3], [0.74, 0.0, 0.0]]);
/// h2.coords.push([1.5, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Molecule {
    atoms: Vec<Element>,
    coords: Vec<[f64; 3]>,
    pub properties: Properties,
    go: GoModel,
    /// Grid used by [`MoleculeView::fit_occupancy_probability`].
    pub grids: Grids,
}

impl Molecule {
    /// Creates a molecule whose current geometry is its Go equilibrium.
    ///
    /// # Panics
    ///
    /// Panics if `atoms` and `coords` differ in length.
    pub fn new(atoms: Vec<Element>, coords: Vec<[f64; 3]>) -> Self {
        assert_eq!(
            atoms.len(),
            coords.len(),
            "atoms and coordinates must be parallel"
        );
        let go = GoModel::from_coords(&coords);
        Self {
            atoms,
            coords,
            properties: Properties::default(),
            go,
            grids: Grids::default(),
        }
    }

    /// Go model built from the construction geometry.
    pub fn go(&self) -> &GoModel {
        &self.go
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.properties.energy = Some(energy);
        self
    }

    pub fn with_atomization(mut self, atomization: f64) -> Self {
        self.properties.atomization = Some(atomization);
        self
    }

    pub fn with_forces(mut self, forces: Vec<[f64; 3]>) -> Self {
        self.properties.forces = Some(forces);
        self
    }

    pub fn with_grids(mut self, grids: Grids) -> Self {
        self.grids = grids;
        self
    }

    /// Shifts every coordinate by a uniform random offset in
    /// `[-amplitude, amplitude)` per axis. The Go equilibrium is kept, so
    /// relaxation targets become non-trivial.
    pub fn distort<R: Rng + ?Sized>(&mut self, rng: &mut R, amplitude: f64) {
        for xyz in &mut self.coords {
            for c in xyz.iter_mut() {
                *c += rng.gen_range(-amplitude..amplitude);
            }
        }
    }
}

impl MoleculeView for Molecule {
    fn coordinates(&self) -> &[[f64; 3]] {
        &self.coords
    }

    fn species(&self) -> &[Element] {
        &self.atoms
    }

    fn stored_property(&self, property: Property) -> Option<ArrayD<f64>> {
        match property {
            Property::Energy => self.properties.energy.map(|e| arr0(e).into_dyn()),
            Property::Atomization => self.properties.atomization.map(|e| arr0(e).into_dyn()),
            Property::Forces => self.properties.forces.as_ref().map(|forces| {
                Array2::from_shape_fn((forces.len(), 3), |(i, k)| forces[i][k]).into_dyn()
            }),
        }
    }

    fn energies_for_perturbed_positions(
        &self,
        positions: &[[f64; 3]],
        atom: usize,
    ) -> Option<Vec<f64>> {
        if positions.is_empty() || atom >= self.coords.len() {
            return None;
        }
        Some(
            positions
                .iter()
                .map(|&p| self.go.energy_with_atom_at(&self.coords, atom, p))
                .collect(),
        )
    }

    fn relaxation_displacement(&self, atom: usize) -> [f64; 3] {
        self.go.relax_atom(&self.coords, atom)
    }

    fn relaxation_force(&self, atom: usize, spherical: bool) -> [f64; 3] {
        let f = self.go.force(&self.coords, atom);
        if spherical { cart_to_sphere(f) } else { f }
    }

    fn fit_occupancy_probability(&self, atom: usize) -> Vec<f64> {
        let center = self.coords[atom];
        let energies: Vec<f64> = self
            .grids
            .points()
            .into_iter()
            .map(|g| self.go.energy_with_atom_at(&self.coords, atom, add(center, g)))
            .collect();
        let e0 = energies.iter().copied().fold(f64::INFINITY, f64::min);
        let mut weights: Vec<f64> = energies
            .iter()
            .map(|e| (-(e - e0) / self.go.temperature).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= total;
        }
        weights.extend(self.relaxation_displacement(atom));
        weights
    }
}
