//! Blend formulas for smoothed boolean operations
//!
//! Each `*_min` joins two distances with a fillet of size `k`; the matching
//! max is `-min(-a, -b)`. All of them agree with the hard `min` wherever
//! `|a - b|` is large compared to `k`.

use crate::SQRT_HALF;

/// Linear interpolation from `x` to `y`, `a` in `[0, 1]`
pub fn mix(x: f64, y: f64, a: f64) -> f64 {
    x + a * (y - x)
}

/// Sawtooth wave of the given period, returns values in `[-period/2, period/2)`
pub fn saw_tooth(x: f64, period: f64) -> f64 {
    let t = (x + period * 0.5) / period;
    period * (t - t.floor()) - period * 0.5
}

/// Polynomial smooth minimum
pub fn poly_min(a: f64, b: f64, k: f64) -> f64 {
    let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
    mix(b, a, h) - k * h * (1.0 - h)
}

/// Polynomial smooth maximum
pub fn poly_max(a: f64, b: f64, k: f64) -> f64 {
    -poly_min(-a, -b, k)
}

/// Quarter-circle fillet of radius `k`
pub fn round_min(a: f64, b: f64, k: f64) -> f64 {
    let u = glam::DVec2::new((k - a).max(0.0), (k - b).max(0.0));
    k.max(a.min(b)) - u.length()
}

/// 45 degree chamfer, the diagonal of a square of size `k`
pub fn chamfer_min(a: f64, b: f64, k: f64) -> f64 {
    a.min(b).min((a - k + b) * SQRT_HALF)
}

/// Exponential smooth minimum with sharpness `k` (larger is sharper).
///
/// Written around the hard minimum so large `k * a` cannot overflow.
pub fn exp_min(a: f64, b: f64, k: f64) -> f64 {
    let m = a.min(b);
    m - (-k * (a - b).abs()).exp().ln_1p() / k
}
