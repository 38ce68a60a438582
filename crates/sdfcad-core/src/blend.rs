//! Blend functions for smoothed boolean operations

use crate::error::{Result, ensure};
use sdfcad_math::blend;
use serde::{Deserialize, Serialize};

/// How two distances are joined by a union (min) or difference/intersection (max).
///
/// Every smoothed variant carries a radius. A radius of zero gives [`Blend::Hard`],
/// and on and outside the joined surface each variant converges to the hard
/// min/max as its radius shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Blend {
    /// Plain `min`/`max`, creases at the seam
    #[default]
    Hard,
    /// Polynomial fillet
    Poly(f64),
    /// Circular fillet
    Round(f64),
    /// 45 degree chamfer
    Chamfer(f64),
    /// Exponential fillet, sharpness `1 / radius`
    Exp(f64),
}

impl Blend {
    pub fn poly(radius: f64) -> Result<Self> {
        Self::checked(radius, Self::Poly)
    }

    pub fn round(radius: f64) -> Result<Self> {
        Self::checked(radius, Self::Round)
    }

    pub fn chamfer(radius: f64) -> Result<Self> {
        Self::checked(radius, Self::Chamfer)
    }

    pub fn exp(radius: f64) -> Result<Self> {
        Self::checked(radius, Self::Exp)
    }

    fn checked(radius: f64, make: fn(f64) -> Self) -> Result<Self> {
        ensure(
            radius.is_finite() && radius >= 0.0,
            "blend radius must be finite and >= 0",
        )?;
        Ok(if radius == 0.0 { Self::Hard } else { make(radius) })
    }

    /// Size of the fillet, used to grow bounding boxes
    pub fn radius(&self) -> f64 {
        match *self {
            Self::Hard => 0.0,
            Self::Poly(k) | Self::Round(k) | Self::Chamfer(k) | Self::Exp(k) => k,
        }
    }

    /// Blended minimum
    pub fn min(&self, a: f64, b: f64) -> f64 {
        match *self {
            Self::Hard => a.min(b),
            Self::Poly(k) => blend::poly_min(a, b, k),
            Self::Round(k) => blend::round_min(a, b, k),
            Self::Chamfer(k) => blend::chamfer_min(a, b, k),
            Self::Exp(k) => blend::exp_min(a, b, 1.0 / k),
        }
    }

    /// Blended maximum
    pub fn max(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Hard => a.max(b),
            _ => -self.min(-a, -b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_radius_is_hard() {
        assert_eq!(Blend::poly(0.0).unwrap(), Blend::Hard);
        assert_eq!(Blend::round(0.0).unwrap(), Blend::Hard);
    }

    #[test]
    fn negative_radius_is_rejected() {
        assert!(Blend::poly(-0.1).is_err());
        assert!(Blend::exp(f64::NAN).is_err());
    }

    #[test]
    fn smoothed_min_never_exceeds_hard_min() {
        let blends = [
            Blend::poly(0.5).unwrap(),
            Blend::round(0.5).unwrap(),
            Blend::chamfer(0.5).unwrap(),
            Blend::exp(0.5).unwrap(),
        ];
        for b in blends {
            for (x, y) in [(0.1, 0.2), (1.0, -0.3), (0.0, 0.0), (2.0, 2.5)] {
                assert!(b.min(x, y) <= x.min(y) + 1e-12, "{b:?} at ({x}, {y})");
            }
        }
    }

    #[test]
    fn shrinking_radius_converges_to_hard_outside() {
        for make in [Blend::poly, Blend::round, Blend::chamfer, Blend::exp] {
            let coarse = (make(0.5).unwrap().min(0.3, 0.35) - 0.3).abs();
            let fine = (make(1e-4).unwrap().min(0.3, 0.35) - 0.3).abs();
            assert!(fine <= coarse);
            assert!(fine < 1e-6);
        }
    }

    #[test]
    fn max_mirrors_min() {
        let b = Blend::poly(0.4).unwrap();
        assert_relative_eq!(b.max(1.0, 1.0), 1.1, epsilon = 1e-12);
        assert_relative_eq!(Blend::Hard.max(-1.0, 2.0), 2.0);
    }
}
