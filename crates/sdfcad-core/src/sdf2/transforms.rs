//! 2D transforms - translation, affine maps, uniform scale

use super::Sdf2;
use crate::error::{Result, ensure};
use glam::{DAffine2, DVec2};
use sdfcad_math::{Aabb2, transform::distance_scale2};

/// Translation
pub struct Translate2<S: Sdf2> {
    pub inner: S,
    pub offset: DVec2,
}

impl<S: Sdf2> Translate2<S> {
    pub fn new(inner: S, offset: DVec2) -> Self {
        Self { inner, offset }
    }
}

impl<S: Sdf2> Sdf2 for Translate2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        self.inner.distance(p - self.offset)
    }

    fn bounds(&self) -> Aabb2 {
        self.inner.bounds().translate(self.offset)
    }
}

/// Affine transform evaluated through the inverse matrix.
///
/// The child's distance is multiplied by the smallest stretch of the map, so
/// the result stays a valid distance bound. It is exact only for rotations,
/// translations and uniform scales ([`Transform2::is_exact`]); otherwise blend
/// radii inside the child are distorted along with the shape.
pub struct Transform2<S: Sdf2> {
    inner: S,
    matrix: DAffine2,
    inverse: DAffine2,
    factor: f64,
    exact: bool,
}

impl<S: Sdf2> Transform2<S> {
    pub fn new(inner: S, matrix: DAffine2) -> Result<Self> {
        let det = matrix.matrix2.determinant();
        ensure(
            det.is_finite() && det.abs() > f64::EPSILON && matrix.translation.is_finite(),
            "transform matrix must be finite and invertible",
        )?;
        let (factor, exact) = distance_scale2(matrix.matrix2);
        if !exact {
            tracing::debug!(factor, "non-uniform 2D transform yields a distance bound");
        }
        Ok(Self {
            inner,
            matrix,
            inverse: matrix.inverse(),
            factor,
            exact,
        })
    }

    /// Rotation plus translation; skips validation
    pub(crate) fn rigid(inner: S, matrix: DAffine2) -> Self {
        Self {
            inner,
            matrix,
            inverse: matrix.inverse(),
            factor: 1.0,
            exact: true,
        }
    }

    /// Whether distances are preserved exactly (up to uniform scale)
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn matrix(&self) -> DAffine2 {
        self.matrix
    }
}

impl<S: Sdf2> Sdf2 for Transform2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        self.inner.distance(self.inverse.transform_point2(p)) * self.factor
    }

    fn bounds(&self) -> Aabb2 {
        self.inner.bounds().transform(&self.matrix)
    }
}

/// Uniform scale about the origin, exact
pub struct ScaleUniform2<S: Sdf2> {
    pub inner: S,
    pub factor: f64,
}

impl<S: Sdf2> ScaleUniform2<S> {
    pub fn new(inner: S, factor: f64) -> Result<Self> {
        ensure(factor > 0.0 && factor.is_finite(), "scale factor must be > 0")?;
        Ok(Self { inner, factor })
    }
}

impl<S: Sdf2> Sdf2 for ScaleUniform2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        self.inner.distance(p / self.factor) * self.factor
    }

    fn bounds(&self) -> Aabb2 {
        let b = self.inner.bounds();
        Aabb2::new(b.min * self.factor, b.max * self.factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf2::{Sdf2Ext, circle, rectangle};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn translate_moves_the_zero_set() {
        let c = circle(1.0).unwrap().translate(DVec2::new(3.0, 0.0));
        assert_relative_eq!(c.distance(DVec2::new(4.0, 0.0)), 0.0);
        assert_relative_eq!(c.bounds().min.x, 2.0);
    }

    #[test]
    fn rotation_preserves_distance() {
        let r = rectangle(DVec2::new(4.0, 2.0), 0.0).unwrap().rotate(FRAC_PI_2);
        // long side now along Y
        assert_relative_eq!(r.distance(DVec2::new(0.0, 2.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.distance(DVec2::new(3.0, 0.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn uniform_scale_is_exact() {
        let c = circle(1.0).unwrap().scale(2.5).unwrap();
        assert_relative_eq!(c.distance(DVec2::new(5.0, 0.0)), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn non_uniform_scale_keeps_sign_and_bounds_distance() {
        let m = DAffine2::from_scale(DVec2::new(3.0, 1.0));
        let t = Transform2::new(circle(1.0).unwrap(), m).unwrap();
        assert!(!t.is_exact());
        // ellipse with semi axes 3 and 1
        assert_relative_eq!(t.distance(DVec2::new(3.0, 0.0)), 0.0, epsilon = 1e-12);
        assert!(t.distance(DVec2::new(2.5, 0.0)) < 0.0);
        // true distance from (0, 3) is 2; the bound must not exceed it
        let d = t.distance(DVec2::new(0.0, 3.0));
        assert!(d > 0.0 && d <= 2.0);
        assert_relative_eq!(t.bounds().max.x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let m = DAffine2::from_scale(DVec2::new(1.0, 0.0));
        assert!(Transform2::new(circle(1.0).unwrap(), m).is_err());
        assert!(circle(1.0).unwrap().scale(0.0).is_err());
    }
}
