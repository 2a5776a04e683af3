use super::harmonics::real_spherical_harmonics;
use super::{EmbeddingKernel, KernelQuery, Neighbor, SymmetryParams};
use crate::digest::config::HarmonicsConfig;
use crate::digest::error::Error;
use crate::model::geometry::{distance, dot};
use ndarray::{Array3, Array4, ArrayD, Axis};
use std::f64::consts::PI;

/// Width (Å) of the Gaussian standing in for a neighbor atom in the overlap basis.
const ATOM_GAUSSIAN_WIDTH: f64 = 0.5;
/// Width (Å) of the narrowest overlap basis function.
const BASIS_MIN_WIDTH: f64 = 0.25;

/// Pure-Rust implementation of every embedding family.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeKernel;

/// Cosine cutoff `½(cos(πr/rc) + 1)`, zero beyond `rc`.
#[inline]
fn cutoff(r: f64, rc: f64) -> f64 {
    if r < rc {
        0.5 * ((PI * r / rc).cos() + 1.0)
    } else {
        0.0
    }
}

/// Index of the unordered channel pair `(a, b)`, `a ≤ b`, among `n` channels.
#[inline]
fn pair_index(a: usize, b: usize, n: usize) -> usize {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    a * (2 * n - a + 1) / 2 + (b - a)
}

fn radial_centers(radius: f64, count: usize) -> (Vec<f64>, f64) {
    let width = radius / (count + 1) as f64;
    let centers = (1..=count).map(|k| k as f64 * width).collect();
    (centers, width)
}

impl NativeKernel {
    /// Shared radial-grid driver: `fill(neighbor, row)` accumulates one
    /// neighbor into the `ngrid` row of its channel.
    fn radial_grid<F>(&self, query: &KernelQuery<'_>, mut fill: F) -> ArrayD<f64>
    where
        F: FnMut(&Neighbor, &mut [f64]),
    {
        let centers = query.centers();
        let mut out = Array3::<f64>::zeros((centers.len(), query.channel_count(), query.ngrid));
        for (row, &(center, excluded)) in centers.iter().enumerate() {
            for neighbor in query.neighbors(center, excluded) {
                let mut lane = out.slice_mut(ndarray::s![row, neighbor.channel, ..]);
                if let Some(slice) = lane.as_slice_mut() {
                    fill(&neighbor, slice);
                }
            }
        }
        out.into_dyn()
    }
}

impl EmbeddingKernel for NativeKernel {
    fn coulomb(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error> {
        let centers = query.centers();
        let nch = query.channel_count();
        let mut out = Array3::<f64>::zeros((centers.len(), nch, query.ngrid));
        for (row, &(center, excluded)) in centers.iter().enumerate() {
            let zc = query.species[excluded].atomic_number() as f64;
            let mut per_channel: Vec<Vec<f64>> = vec![Vec::new(); nch];
            for n in query.neighbors(center, excluded) {
                let zj = query.species[n.index].atomic_number() as f64;
                per_channel[n.channel].push(zc * zj / n.r);
            }
            for (channel, mut values) in per_channel.into_iter().enumerate() {
                values.sort_by(|a, b| b.total_cmp(a));
                for (k, v) in values.into_iter().take(query.ngrid).enumerate() {
                    out[[row, channel, k]] = v;
                }
            }
        }
        Ok(out.into_dyn())
    }

    fn radial_distribution(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error> {
        let width = query.radius / query.ngrid as f64;
        let inv = 1.0 / (2.0 * width * width);
        let rc = query.radius;
        Ok(self.radial_grid(query, |n, lane| {
            let fc = cutoff(n.r, rc);
            for (k, v) in lane.iter_mut().enumerate() {
                let rk = (k as f64 + 0.5) * width;
                *v += (-(n.r - rk).powi(2) * inv).exp() * fc;
            }
        }))
    }

    fn overlap_basis(&self, query: &KernelQuery<'_>) -> Result<ArrayD<f64>, Error> {
        let max_width = (0.5 * query.radius).max(BASIS_MIN_WIDTH);
        let widths: Vec<f64> = if query.ngrid == 1 {
            vec![BASIS_MIN_WIDTH]
        } else {
            let ratio = (max_width / BASIS_MIN_WIDTH).ln() / (query.ngrid - 1) as f64;
            (0..query.ngrid)
                .map(|k| BASIS_MIN_WIDTH * (ratio * k as f64).exp())
                .collect()
        };
        let beta = 1.0 / (2.0 * ATOM_GAUSSIAN_WIDTH * ATOM_GAUSSIAN_WIDTH);
        let rc = query.radius;
        Ok(self.radial_grid(query, |n, lane| {
            let fc = cutoff(n.r, rc);
            for (v, sigma) in lane.iter_mut().zip(&widths) {
                let alpha = 1.0 / (2.0 * sigma * sigma);
                let sum = alpha + beta;
                *v += (PI / sum).powf(1.5) * (-alpha * beta / sum * n.r * n.r).exp() * fc;
            }
        }))
    }

    fn spherical_harmonic(
        &self,
        query: &KernelQuery<'_>,
        harmonics: &HarmonicsConfig,
    ) -> Result<ArrayD<f64>, Error> {
        let centers = query.centers();
        let nlm = (harmonics.lmax + 1) * (harmonics.lmax + 1);
        let (mus, width) = radial_centers(query.radius, harmonics.radial_count);
        let inv = 1.0 / (2.0 * width * width);
        let mut out = Array4::<f64>::zeros((
            centers.len(),
            query.channel_count(),
            harmonics.radial_count,
            nlm,
        ));
        for (row, &(center, excluded)) in centers.iter().enumerate() {
            for n in query.neighbors(center, excluded) {
                let ylm = real_spherical_harmonics(harmonics.lmax, n.offset);
                let fc = cutoff(n.r, query.radius);
                for (k, mu) in mus.iter().enumerate() {
                    let g = (-(n.r - mu).powi(2) * inv).exp() * fc;
                    for (idx, y) in ylm.iter().enumerate() {
                        out[[row, n.channel, k, idx]] += g * y;
                    }
                }
            }
        }
        Ok(out.into_dyn())
    }

    fn invariant(
        &self,
        query: &KernelQuery<'_>,
        harmonics: &HarmonicsConfig,
    ) -> Result<ArrayD<f64>, Error> {
        let sh = self.spherical_harmonic(query, harmonics)?;
        let shape = sh.shape().to_vec();
        let lmax = harmonics.lmax;
        let mut out = Array4::<f64>::zeros((shape[0], shape[1], shape[2], lmax + 1));
        for ((row, ch, k, idx), v) in sh.into_dimensionality::<ndarray::Ix4>()?.indexed_iter() {
            let l = (idx as f64).sqrt() as usize;
            out[[row, ch, k, l]] += v * v;
        }
        Ok(out.into_dyn())
    }

    fn symmetry_functions(
        &self,
        query: &KernelQuery<'_>,
        params: &SymmetryParams,
    ) -> Result<ArrayD<f64>, Error> {
        let ngrid = params.rs.len();
        if [params.zeta.len(), params.eta1.len(), params.eta2.len()]
            .iter()
            .any(|&len| len != ngrid)
        {
            return Err(Error::Kernel(
                "symmetry-function parameter families differ in length".into(),
            ));
        }

        let nch = query.channel_count();
        let nsym = nch + (nch + 1) * nch;
        let centers = query.centers();
        let rc = query.radius;
        let mut out = Array3::<f64>::zeros((centers.len() * nsym, ngrid, ngrid));

        for (row, &(center, excluded)) in centers.iter().enumerate() {
            let base = row * nsym;
            let neighbors = query.neighbors(center, excluded);

            for n in &neighbors {
                let fc = cutoff(n.r, rc);
                for (i, eta) in params.eta1.iter().enumerate() {
                    for (j, rs) in params.rs.iter().enumerate() {
                        out[[base + n.channel, i, j]] += (-eta * (n.r - rs).powi(2)).exp() * fc;
                    }
                }
            }

            for (a, na) in neighbors.iter().enumerate() {
                for nb in &neighbors[a + 1..] {
                    let rab = distance(na.offset, nb.offset);
                    let fc = cutoff(na.r, rc) * cutoff(nb.r, rc) * cutoff(rab, rc);
                    if fc == 0.0 {
                        continue;
                    }
                    let cos = dot(na.offset, nb.offset) / (na.r * nb.r);
                    let r2 = na.r * na.r + nb.r * nb.r + rab * rab;
                    let channel = nch + 2 * pair_index(na.channel, nb.channel, nch);
                    for (lambda_slot, lambda) in [1.0, -1.0].into_iter().enumerate() {
                        let angular = (1.0 + lambda * cos).max(0.0);
                        for (i, zeta) in params.zeta.iter().enumerate() {
                            let ang = 2f64.powf(1.0 - zeta) * angular.powf(*zeta);
                            for (j, eta) in params.eta2.iter().enumerate() {
                                out[[base + channel + lambda_slot, i, j]] +=
                                    ang * (-eta * r2).exp() * fc;
                            }
                        }
                    }
                }
            }
        }
        Ok(out.into_dyn())
    }

    fn pairwise_gaussian(&self, query: &KernelQuery<'_>, eta: &[f64]) -> Result<ArrayD<f64>, Error> {
        let nch = query.channel_count();
        let centers = query.centers();
        let rc = query.radius;
        let mut out = Array3::<f64>::zeros((centers.len() * nch, eta.len(), 1));
        for (row, &(center, excluded)) in centers.iter().enumerate() {
            for n in query.neighbors(center, excluded) {
                let fc = cutoff(n.r, rc);
                let mut lane = out.index_axis_mut(Axis(0), row * nch + n.channel);
                for (i, e) in eta.iter().enumerate() {
                    lane[[i, 0]] += (-e * n.r * n.r).exp() * fc;
                }
            }
        }
        Ok(out.into_dyn())
    }
}
