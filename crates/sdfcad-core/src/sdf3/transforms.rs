//! 3D transforms

use super::Sdf3;
use crate::error::{Result, ensure};
use glam::{DAffine3, DVec3};
use sdfcad_math::{Aabb3, transform::distance_scale3};

pub struct Translate3<S: Sdf3> {
    pub inner: S,
    pub offset: DVec3,
}

impl<S: Sdf3> Translate3<S> {
    pub fn new(inner: S, offset: DVec3) -> Self {
        Self { inner, offset }
    }
}

impl<S: Sdf3> Sdf3 for Translate3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.inner.distance(p - self.offset)
    }

    fn bounds(&self) -> Aabb3 {
        self.inner.bounds().translate(self.offset)
    }
}

/// Affine transform evaluated through the inverse matrix.
///
/// Rigid motions and uniform scales keep the distance exact. Anything else
/// scales the child's distance by a lower bound on the map's stretch, so the
/// result is a conservative bound and [`Transform3::is_exact`] is false.
pub struct Transform3<S: Sdf3> {
    inner: S,
    matrix: DAffine3,
    inverse: DAffine3,
    factor: f64,
    exact: bool,
}

impl<S: Sdf3> Transform3<S> {
    pub fn new(inner: S, matrix: DAffine3) -> Result<Self> {
        let det = matrix.matrix3.determinant();
        ensure(
            det.is_finite() && det.abs() > f64::EPSILON && matrix.translation.is_finite(),
            "transform matrix must be finite and invertible",
        )?;
        let (factor, exact) = distance_scale3(matrix.matrix3);
        if !exact {
            tracing::debug!(factor, "non-uniform 3D transform yields a distance bound");
        }
        Ok(Self {
            inner,
            matrix,
            inverse: matrix.inverse(),
            factor,
            exact,
        })
    }

    pub(crate) fn rigid(inner: S, matrix: DAffine3) -> Self {
        Self {
            inner,
            matrix,
            inverse: matrix.inverse(),
            factor: 1.0,
            exact: true,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn matrix(&self) -> DAffine3 {
        self.matrix
    }
}

impl<S: Sdf3> Sdf3 for Transform3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.inner.distance(self.inverse.transform_point3(p)) * self.factor
    }

    fn bounds(&self) -> Aabb3 {
        self.inner.bounds().transform(&self.matrix)
    }
}

pub struct ScaleUniform3<S: Sdf3> {
    pub inner: S,
    pub factor: f64,
}

impl<S: Sdf3> ScaleUniform3<S> {
    pub fn new(inner: S, factor: f64) -> Result<Self> {
        ensure(factor > 0.0 && factor.is_finite(), "scale factor must be > 0")?;
        Ok(Self { inner, factor })
    }
}

impl<S: Sdf3> Sdf3 for ScaleUniform3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.inner.distance(p / self.factor) * self.factor
    }

    fn bounds(&self) -> Aabb3 {
        let b = self.inner.bounds();
        Aabb3::new(b.min * self.factor, b.max * self.factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf3::{Sdf3Ext, cuboid, sphere};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotations_move_long_axis() {
        let b = cuboid(DVec3::new(6.0, 2.0, 2.0), 0.0).unwrap();
        let r = b.rotate_z(FRAC_PI_2);
        assert_relative_eq!(r.distance(DVec3::new(0.0, 3.0, 0.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.bounds().max.y, 3.0, epsilon = 1e-12);

        let r = b.rotate_y(FRAC_PI_2);
        assert_relative_eq!(r.distance(DVec3::new(0.0, 0.0, 3.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn translate_then_scale() {
        let s = sphere(1.0)
            .unwrap()
            .translate(DVec3::X)
            .scale(2.0)
            .unwrap();
        assert_relative_eq!(s.distance(DVec3::new(4.0, 0.0, 0.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(s.bounds().min.x, 0.0);
    }

    #[test]
    fn uniform_affine_scale_is_exact() {
        let t = Transform3::new(sphere(1.0).unwrap(), DAffine3::from_scale(DVec3::splat(3.0)))
            .unwrap();
        assert!(t.is_exact());
        assert_relative_eq!(t.distance(DVec3::new(5.0, 0.0, 0.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn stretched_sphere_is_a_bound() {
        let t = Transform3::new(
            sphere(1.0).unwrap(),
            DAffine3::from_scale(DVec3::new(1.0, 1.0, 4.0)),
        )
        .unwrap();
        assert!(!t.is_exact());
        assert_relative_eq!(t.distance(DVec3::new(0.0, 0.0, 4.0)), 0.0, epsilon = 1e-12);
        let d = t.distance(DVec3::new(3.0, 0.0, 0.0));
        assert!(d > 0.0 && d <= 2.0);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let m = DAffine3::from_scale(DVec3::new(1.0, 1.0, 0.0));
        assert!(Transform3::new(sphere(1.0).unwrap(), m).is_err());
    }
}
