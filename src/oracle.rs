//! Closed-form reference solutions.

use std::f64::consts::PI;

use crate::{field::Field, mesh::Grid, Float};

/// Wave speed of the sawtooth solution.
pub const SAWTOOTH_SPEED: Float = 4.0;

/// Exact solution of the viscous Burgers equation `u_t + u u_x = ν u_xx` on
/// `[0, 2π]`, obtained from the Cole-Hopf transform of a sum of two heat
/// kernels. At `t = 0` it is a sawtooth of slope `+1` with its jump at `x = π`;
/// the jump then travels right at [`SAWTOOTH_SPEED`] while smoothing.
pub fn burgers_sawtooth(x: Float, t: Float, nu: Float) -> Float {
    let width = 4.0 * nu * (t + 1.0);
    let a = x - SAWTOOTH_SPEED * t;
    let b = a - 2.0 * PI;
    let (ea, eb) = ((-a * a / width).exp(), (-b * b / width).exp());

    let phi = ea + eb;
    let dphi = -2.0 * (a * ea + b * eb) / width;
    -2.0 * nu * dphi / phi + SAWTOOTH_SPEED
}

/// [`burgers_sawtooth`] sampled on `grid`. A planar grid gets the same profile
/// on every row.
pub fn sawtooth_field(name: impl AsRef<str>, grid: &Grid, t: Float, nu: Float) -> Field {
    Field::new(name, grid, |x, _| burgers_sawtooth(x, t, nu))
}

/// `2` on `[lower, upper]`, `1` elsewhere.
pub fn hat(x: Float, lower: Float, upper: Float) -> Float {
    if (lower..=upper).contains(&x) {
        2.0
    } else {
        1.0
    }
}
