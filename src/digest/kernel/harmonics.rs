use std::f64::consts::PI;

/// Real spherical harmonics `Y_lm` of the direction `v` for `l ≤ lmax`.
///
/// Entry `l² + l + m` holds `Y_lm`, `m ∈ [-l, l]`. Negative `m` carry the
/// `sin(|m|φ)` part, positive `m` the `cos(mφ)` part. A zero vector is
/// treated as pointing along +z.
pub fn real_spherical_harmonics(lmax: usize, v: [f64; 3]) -> Vec<f64> {
    let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    let (x, phi) = if r > 0.0 {
        ((v[2] / r).clamp(-1.0, 1.0), v[1].atan2(v[0]))
    } else {
        (1.0, 0.0)
    };

    let legendre = associated_legendre(lmax, x);
    let mut out = vec![0.0; (lmax + 1) * (lmax + 1)];
    for l in 0..=lmax {
        let base = l * l + l;
        out[base] = normalization(l, 0) * legendre[l][0];
        for m in 1..=l {
            let scaled = std::f64::consts::SQRT_2 * normalization(l, m) * legendre[l][m];
            out[base + m] = scaled * (m as f64 * phi).cos();
            out[base - m] = scaled * (m as f64 * phi).sin();
        }
    }
    out
}

/// `P_l^m(x)` for `0 ≤ m ≤ l ≤ lmax`, indexed `[l][m]`.
fn associated_legendre(lmax: usize, x: f64) -> Vec<Vec<f64>> {
    let mut p: Vec<Vec<f64>> = (0..=lmax).map(|l| vec![0.0; l + 1]).collect();
    let s = (1.0 - x * x).max(0.0).sqrt();

    let mut pmm = 1.0;
    for m in 0..=lmax {
        if m > 0 {
            pmm *= -((2 * m - 1) as f64) * s;
        }
        p[m][m] = pmm;
        if m < lmax {
            p[m + 1][m] = x * (2 * m + 1) as f64 * pmm;
        }
        for l in (m + 2)..=lmax {
            p[l][m] = ((2 * l - 1) as f64 * x * p[l - 1][m] - (l + m - 1) as f64 * p[l - 2][m])
                / (l - m) as f64;
        }
    }
    p
}

fn normalization(l: usize, m: usize) -> f64 {
    let ratio: f64 = ((l - m + 1)..=(l + m)).map(|k| 1.0 / k as f64).product();
    ((2 * l + 1) as f64 / (4.0 * PI) * ratio).sqrt()
}
