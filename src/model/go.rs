//! Harmonic "Go" model around an equilibrium geometry.
//!
//! Every atom pair is tied by a spring whose rest length is the pair distance
//! at the moment the model was built. The model answers the geometry queries
//! the digester needs for its physically derived labels: energies of trial
//! positions, forces, and the relaxed position of a single atom.

use super::geometry::{add, distance, norm, scale, sub};

/// Default spring constant (energy per squared length unit).
pub const DEFAULT_FORCE_CONSTANT: f64 = 0.15;

/// Default temperature used to turn Go energies into occupancy weights.
pub const DEFAULT_PROBABILITY_TEMPERATURE: f64 = 0.05;

const RELAX_MAX_STEPS: usize = 500;
const RELAX_FORCE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct GoModel {
    /// Spring constant shared by all pairs.
    pub force_constant: f64,
    /// Temperature used by occupancy fits.
    pub temperature: f64,
    natoms: usize,
    /// Row-major `natoms × natoms` rest distances.
    equilibrium: Vec<f64>,
}

impl GoModel {
    /// Captures `coords` as the equilibrium geometry.
    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        let natoms = coords.len();
        let mut equilibrium = vec![0.0; natoms * natoms];
        for i in 0..natoms {
            for j in 0..natoms {
                equilibrium[i * natoms + j] = distance(coords[i], coords[j]);
            }
        }
        Self {
            force_constant: DEFAULT_FORCE_CONSTANT,
            temperature: DEFAULT_PROBABILITY_TEMPERATURE,
            natoms,
            equilibrium,
        }
    }

    #[inline]
    fn rest(&self, i: usize, j: usize) -> f64 {
        self.equilibrium[i * self.natoms + j]
    }

    pub fn atom_count(&self) -> usize {
        self.natoms
    }

    /// Total energy of `coords`.
    pub fn energy(&self, coords: &[[f64; 3]]) -> f64 {
        let mut e = 0.0;
        for i in 0..coords.len() {
            for j in (i + 1)..coords.len() {
                let dr = distance(coords[i], coords[j]) - self.rest(i, j);
                e += self.force_constant * dr * dr;
            }
        }
        e
    }

    /// Total energy of `coords` with `atom` placed at `position`.
    pub fn energy_with_atom_at(&self, coords: &[[f64; 3]], atom: usize, position: [f64; 3]) -> f64 {
        let at = |i: usize| if i == atom { position } else { coords[i] };
        let mut e = 0.0;
        for i in 0..coords.len() {
            for j in (i + 1)..coords.len() {
                let dr = distance(at(i), at(j)) - self.rest(i, j);
                e += self.force_constant * dr * dr;
            }
        }
        e
    }

    /// Force `-dE/dx` on `atom` when it sits at `position`.
    pub fn force_at(&self, coords: &[[f64; 3]], atom: usize, position: [f64; 3]) -> [f64; 3] {
        let mut f = [0.0; 3];
        for (j, &xj) in coords.iter().enumerate() {
            if j == atom {
                continue;
            }
            let d = sub(position, xj);
            let r = norm(d);
            if r < 1e-12 {
                continue;
            }
            let coef = -2.0 * self.force_constant * (r - self.rest(atom, j)) / r;
            f = add(f, scale(d, coef));
        }
        f
    }

    pub fn force(&self, coords: &[[f64; 3]], atom: usize) -> [f64; 3] {
        self.force_at(coords, atom, coords[atom])
    }

    /// Relaxes `atom` alone by steepest descent, all other atoms held fixed,
    /// and returns the displacement from its current position.
    pub fn relax_atom(&self, coords: &[[f64; 3]], atom: usize) -> [f64; 3] {
        let neighbors = coords.len().saturating_sub(1);
        if neighbors == 0 {
            return [0.0; 3];
        }
        let step = 0.25 / (self.force_constant * neighbors as f64);
        let start = coords[atom];
        let mut position = start;
        for _ in 0..RELAX_MAX_STEPS {
            let f = self.force_at(coords, atom, position);
            if norm(f) < RELAX_FORCE_TOLERANCE {
                break;
            }
            position = add(position, scale(f, step));
        }
        sub(position, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn water() -> Vec<[f64; 3]> {
        vec![[0.0, 0.0, 0.0], [0.9575, 0.0, 0.0], [-0.2399, 0.9270, 0.0]]
    }

    #[test]
    fn equilibrium_has_zero_energy_and_force() {
        let coords = water();
        let go = GoModel::from_coords(&coords);
        assert!(approx_eq(go.energy(&coords), 0.0, 1e-12));
        for atom in 0..3 {
            let f = go.force(&coords, atom);
            assert!(norm(f) < 1e-12);
        }
    }

    #[test]
    fn stretched_bond_pulls_back() {
        let coords = water();
        let go = GoModel::from_coords(&coords);
        let mut moved = coords.clone();
        moved[1][0] += 0.2;

        let f = go.force(&moved, 1);
        assert!(f[0] < 0.0);
        assert!(go.energy(&moved) > 0.0);
        assert!(approx_eq(
            go.energy(&moved),
            go.energy_with_atom_at(&coords, 1, moved[1]),
            1e-12
        ));
    }

    #[test]
    fn relaxation_returns_to_equilibrium() {
        let coords = water();
        let go = GoModel::from_coords(&coords);
        let mut moved = coords.clone();
        moved[2] = [moved[2][0] + 0.1, moved[2][1] - 0.05, moved[2][2]];

        let disp = go.relax_atom(&moved, 2);
        let relaxed = add(moved[2], disp);
        assert!(distance(relaxed, coords[2]) < 1e-4);
    }

    #[test]
    fn lone_atom_does_not_move() {
        let coords = vec![[1.0, 2.0, 3.0]];
        let go = GoModel::from_coords(&coords);
        assert_eq!(go.relax_atom(&coords, 0), [0.0; 3]);
    }
}
