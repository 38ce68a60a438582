//! Checked field evaluation
//!
//! [`Sdf2::distance`] and [`Sdf3::distance`] are total and never fail. The
//! extractors go through these helpers instead so that a NaN or infinite
//! distance aborts the render with [`Error::Evaluation`].

use crate::error::{Error, Result};
use crate::sdf2::Sdf2;
use crate::sdf3::Sdf3;
use glam::{DVec2, DVec3};
use rayon::prelude::*;

/// Reject non-finite distances
#[inline]
pub(crate) fn finite(value: f64, location: impl FnOnce() -> String) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::Evaluation {
            value,
            location: location(),
        })
    }
}

/// Evaluate a 2D field, failing on a non-finite result
pub fn evaluate2<S: Sdf2 + ?Sized>(field: &S, p: DVec2) -> Result<f64> {
    finite(field.distance(p), || format!("{p}"))
}

/// Evaluate a 3D field, failing on a non-finite result
pub fn evaluate3<S: Sdf3 + ?Sized>(field: &S, p: DVec3) -> Result<f64> {
    finite(field.distance(p), || format!("{p}"))
}

/// Evaluate a 2D field at many points in parallel
pub fn evaluate2_batch<S: Sdf2 + ?Sized>(field: &S, points: &[DVec2]) -> Result<Vec<f64>> {
    points.par_iter().map(|&p| evaluate2(field, p)).collect()
}

/// Evaluate a 3D field at many points in parallel
pub fn evaluate3_batch<S: Sdf3 + ?Sized>(field: &S, points: &[DVec3]) -> Result<Vec<f64>> {
    points.par_iter().map(|&p| evaluate3(field, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf3::{Sdf3Ext, sphere};
    use approx::assert_relative_eq;
    use sdfcad_math::Aabb3;

    struct Broken;

    impl Sdf3 for Broken {
        fn distance(&self, p: DVec3) -> f64 {
            if p.x > 0.0 { f64::NAN } else { p.length() - 1.0 }
        }

        fn bounds(&self) -> Aabb3 {
            Aabb3::from_center_size(DVec3::ZERO, DVec3::splat(2.0))
        }
    }

    #[test]
    fn finite_values_pass_through() {
        let s = sphere(1.0).unwrap();
        assert_relative_eq!(evaluate3(&s, DVec3::new(0.0, 2.0, 0.0)).unwrap(), 1.0);
    }

    #[test]
    fn nan_is_an_evaluation_error() {
        let err = evaluate3(&Broken, DVec3::X).unwrap_err();
        assert!(matches!(err, Error::Evaluation { value, .. } if value.is_nan()));
    }

    #[test]
    fn batch_matches_pointwise_and_propagates_errors() {
        let s = sphere(1.0).unwrap().translate(DVec3::Z);
        let pts: Vec<DVec3> = (0..100_i32)
            .map(|i| DVec3::new(f64::from(i) * 0.03, 0.1, -0.4))
            .collect();
        let values = evaluate3_batch(&s, &pts).unwrap();
        for (p, v) in pts.iter().zip(&values) {
            assert_relative_eq!(*v, s.distance(*p));
        }

        let mixed = [DVec3::new(-0.5, 0.0, 0.0), DVec3::new(0.5, 0.0, 0.0)];
        assert!(evaluate3_batch(&Broken, &mixed).is_err());
    }
}
