//! Probe position generation around a reference point.
//!
//! The samplers here are pure functions of their inputs (and of the random
//! stream passed in). A zero sample count is a caller bug and panics.

use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

/// Offset of the rational sampling density `M / (x + SHIFT)² + N`.
///
/// With this shift a mean distance of 5.0 puts 38% of the radii in `(0, 0.1)`.
pub const SAMPLING_SHIFT: f64 = 0.72;

/// Maps a uniform draw `x ∈ [0, d)` to a radius in `(0, d]`.
///
/// The map is `f(x) = M / (x + a)² + N` with `f(0) = d` and `f(d) = 0`, which
/// piles most of the mass close to zero.
fn biased_radius(x: f64, d: f64) -> f64 {
    let a = SAMPLING_SHIFT;
    let m = d / (1.0 / (a * a) - 1.0 / ((d + a) * (d + a)));
    let n = -m / ((d + a) * (d + a));
    m / ((x + a) * (x + a)) + n
}

/// Draws `count` positions around `point` with radii biased toward zero.
///
/// # Panics
///
/// Panics if `count == 0` or `mean_distance <= 0.0`.
pub fn biased_radial_sample<R: Rng + ?Sized>(
    point: [f64; 3],
    count: usize,
    mean_distance: f64,
    rng: &mut R,
) -> Vec<[f64; 3]> {
    assert!(count > 0, "sample count must be positive");
    assert!(mean_distance > 0.0, "mean sampling distance must be positive");

    (0..count)
        .map(|_| {
            let r = biased_radius(rng.gen_range(0.0..mean_distance), mean_distance);
            let theta = rng.gen_range(0.0..PI);
            let phi = rng.gen_range(0.0..2.0 * PI);
            [
                point[0] + r * theta.cos(),
                point[1] + r * theta.sin() * phi.cos(),
                point[2] + r * theta.sin() * phi.sin(),
            ]
        })
        .collect()
}

/// Draws `count` positions with isotropic Gaussian offsets of standard
/// deviation `distance` around `point`.
///
/// # Panics
///
/// Panics if `count == 0` or `distance <= 0.0`.
pub fn points_near<R: Rng + ?Sized>(
    point: [f64; 3],
    count: usize,
    distance: f64,
    rng: &mut R,
) -> Vec<[f64; 3]> {
    assert!(count > 0, "sample count must be positive");
    assert!(distance > 0.0, "sampling distance must be positive");

    (0..count)
        .map(|_| {
            let mut p = point;
            for c in &mut p {
                let z: f64 = rng.sample(StandardNormal);
                *c += z * distance;
            }
            p
        })
        .collect()
}

/// Regular `steps³` lattice spanning `[-half_extent, half_extent]` on each
/// axis around `point`. x varies fastest, then y, then z.
///
/// A single step per axis yields `point` itself.
///
/// # Panics
///
/// Panics if `steps == 0`.
pub fn uniform_cubic_grid(point: [f64; 3], half_extent: f64, steps: usize) -> Vec<[f64; 3]> {
    assert!(steps > 0, "grid steps per axis must be positive");

    let ticks: Vec<f64> = if steps == 1 {
        vec![0.0]
    } else {
        let spacing = 2.0 * half_extent / (steps - 1) as f64;
        (0..steps)
            .map(|i| -half_extent + spacing * i as f64)
            .collect()
    };

    let mut grid = Vec::with_capacity(steps * steps * steps);
    for &dz in &ticks {
        for &dy in &ticks {
            for &dx in &ticks {
                grid.push([point[0] + dx, point[1] + dy, point[2] + dz]);
            }
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geometry::distance;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn biased_radius_endpoints() {
        assert!((biased_radius(0.0, 2.0) - 2.0).abs() < 1e-12);
        assert!(biased_radius(2.0, 2.0).abs() < 1e-12);
    }

    #[test]
    fn biased_sample_concentrates_near_zero() {
        let mut rng = Pcg64::seed_from_u64(2024);
        let origin = [0.0; 3];
        let samples = biased_radial_sample(origin, 20_000, 5.0, &mut rng);
        assert_eq!(samples.len(), 20_000);

        let close = samples
            .iter()
            .map(|&p| distance(p, origin))
            .filter(|&r| r > 0.0 && r < 0.1)
            .count();
        let fraction = close as f64 / samples.len() as f64;
        assert!((fraction - 0.38).abs() < 0.02, "fraction = {fraction}");
    }

    #[test]
    fn biased_sample_is_translated_and_bounded() {
        let mut rng = Pcg64::seed_from_u64(1);
        let center = [1.0, -2.0, 3.0];
        for p in biased_radial_sample(center, 500, 2.0, &mut rng) {
            assert!(distance(p, center) <= 2.0 + 1e-9);
        }
    }

    #[test]
    fn points_near_centers_on_point() {
        let mut rng = Pcg64::seed_from_u64(11);
        let center = [0.5, 0.5, 0.5];
        let samples = points_near(center, 4000, 0.3, &mut rng);
        assert_eq!(samples.len(), 4000);
        for k in 0..3 {
            let mean: f64 = samples.iter().map(|p| p[k]).sum::<f64>() / samples.len() as f64;
            assert!((mean - center[k]).abs() < 0.03);
        }
    }

    #[test]
    fn uniform_grid_count_bounds_and_determinism() {
        let center = [1.0, 2.0, 3.0];
        let grid = uniform_cubic_grid(center, 0.5, 4);
        assert_eq!(grid.len(), 64);
        for p in &grid {
            let chebyshev = (0..3).map(|k| (p[k] - center[k]).abs()).fold(0.0, f64::max);
            assert!(chebyshev <= 0.5 + 1e-12);
        }
        assert_eq!(grid, uniform_cubic_grid(center, 0.5, 4));

        assert_eq!(grid[0], [0.5, 1.5, 2.5]);
        assert_eq!(grid[63], [1.5, 2.5, 3.5]);
        assert!(grid[1][0] > grid[0][0]);
    }

    #[test]
    fn uniform_grid_single_step_is_the_point() {
        assert_eq!(uniform_cubic_grid([1.0, 1.0, 1.0], 3.0, 1), vec![[1.0, 1.0, 1.0]]);
    }

    #[test]
    #[should_panic(expected = "sample count must be positive")]
    fn zero_samples_panics() {
        let mut rng = Pcg64::seed_from_u64(0);
        biased_radial_sample([0.0; 3], 0, 1.0, &mut rng);
    }
}
