//! Small vector helpers on `[f64; 3]` used by the Go model, the label
//! derivations and the native embedding kernel.

#[inline]
pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(sub(a, b))
}

/// Converts a Cartesian vector to `(r, theta, phi)` with `theta` the polar
/// angle from +z and `phi` the azimuth in the xy-plane.
pub fn cart_to_sphere(v: [f64; 3]) -> [f64; 3] {
    let r = norm(v);
    if r == 0.0 {
        return [0.0, 0.0, 0.0];
    }
    let theta = (v[2] / r).clamp(-1.0, 1.0).acos();
    let phi = v[1].atan2(v[0]);
    [r, theta, phi]
}

/// Inverse of [`cart_to_sphere`].
pub fn sphere_to_cart(s: [f64; 3]) -> [f64; 3] {
    let [r, theta, phi] = s;
    [
        r * theta.sin() * phi.cos(),
        r * theta.sin() * phi.sin(),
        r * theta.cos(),
    ]
}
