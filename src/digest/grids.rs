//! Cubic grid of Gaussian centers for occupancy probabilities.

use super::sampling::uniform_cubic_grid;
use crate::model::geometry::distance;
use serde::Deserialize;
use std::f64::consts::PI;

/// Normalized isotropic Gaussian density at `distance` from its center.
///
/// Same convention as the atom smearing: the exponent is `-d²/σ²`, the
/// prefactor `(2πσ²)^(-3/2)`.
pub fn blur(distance: f64, radius: f64) -> f64 {
    let r2 = radius * radius;
    (-(distance * distance) / r2).exp() / (2.0 * PI * r2).powf(1.5)
}

/// Cubic grid of Gaussian centers around an atom, relative to its position.
///
/// An occupancy probability is stored as one coefficient per center. The
/// grid turns such coefficients into a rasterized density and into the
/// expected position they imply.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Grids {
    /// Centers along each axis.
    pub points_per_axis: usize,
    /// Half-width (Å) of the cube.
    pub half_extent: f64,
}

impl Default for Grids {
    fn default() -> Self {
        Self {
            points_per_axis: 6,
            half_extent: 1.0,
        }
    }
}

impl Grids {
    /// Number of centers, `points_per_axis³`.
    pub fn len(&self) -> usize {
        self.points_per_axis.pow(3)
    }

    pub fn is_empty(&self) -> bool {
        self.points_per_axis == 0
    }

    /// Center offsets, in the order of [`uniform_cubic_grid`].
    pub fn points(&self) -> Vec<[f64; 3]> {
        uniform_cubic_grid([0.0; 3], self.half_extent, self.points_per_axis)
    }

    /// Superposes one [`blur`] Gaussian of width `blur_radius` per center,
    /// weighted by `coefficients`, and evaluates it on the centers.
    pub fn rasterize(&self, coefficients: &[f64], blur_radius: f64) -> Vec<f64> {
        let points = self.points();
        points
            .iter()
            .map(|&p| {
                points
                    .iter()
                    .zip(coefficients)
                    .map(|(&c, w)| w * blur(distance(p, c), blur_radius))
                    .sum()
            })
            .collect()
    }

    /// Expected offset under the normalized rasterized density. A density
    /// with no mass maps to the origin.
    pub fn expectation(&self, coefficients: &[f64], blur_radius: f64) -> [f64; 3] {
        let density = self.rasterize(coefficients, blur_radius);
        let total: f64 = density.iter().sum();
        if total == 0.0 {
            return [0.0; 3];
        }
        let mut mean = [0.0; 3];
        for (p, w) in self.points().iter().zip(&density) {
            for k in 0..3 {
                mean[k] += p[k] * w / total;
            }
        }
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_size() {
        let grids = Grids {
            points_per_axis: 5,
            half_extent: 1.0,
        };
        assert_eq!(grids.len(), 125);
        assert_eq!(grids.points().len(), 125);
    }

    #[test]
    fn uniform_coefficients_expect_the_origin() {
        let grids = Grids::default();
        let coefficients = vec![1.0; grids.len()];
        let e = grids.expectation(&coefficients, 0.05);
        for c in e {
            assert!(c.abs() < 1e-9);
        }
    }

    #[test]
    fn expectation_leans_toward_weighted_corner() {
        let grids = Grids::default();
        let mut coefficients = vec![0.0; grids.len()];
        let last = grids.len() - 1;
        coefficients[last] = 1.0;
        let e = grids.expectation(&coefficients, 0.05);
        for c in e {
            assert!(c > 0.5);
        }
    }

    #[test]
    fn zero_density_maps_to_origin() {
        let grids = Grids::default();
        assert_eq!(grids.expectation(&vec![0.0; grids.len()], 0.05), [0.0; 3]);
    }

    #[test]
    fn blur_peaks_at_its_center() {
        let radius = 0.3;
        let peak = blur(0.0, radius);
        assert!((peak - (2.0 * PI * radius * radius).powf(-1.5)).abs() < 1e-9);
        assert!(blur(0.3, radius) < peak);
        assert!((blur(0.3, radius) / peak - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn wide_blur_pulls_expectation_toward_the_middle() {
        let grids = Grids::default();
        let mut coefficients = vec![0.0; grids.len()];
        let last = grids.len() - 1;
        coefficients[last] = 1.0;

        let sharp = grids.expectation(&coefficients, 0.05);
        let wide = grids.expectation(&coefficients, 10.0);
        for k in 0..3 {
            assert!((sharp[k] - 1.0).abs() < 1e-9);
            assert!(wide[k] > 0.0 && wide[k] < 0.2);
        }
    }
}
