//! Distance behaviour of affine maps
//!
//! A field evaluated through the inverse of a linear map `M` has to be scaled
//! by the smallest singular value of `M` to stay a valid distance bound. For
//! similarities (rotation + uniform scale) that factor is exact; for anything
//! else we use `1 / |M^-1|_F`, which never exceeds the smallest singular value.

use glam::{DMat2, DMat3};

const SIMILARITY_TOLERANCE: f64 = 1e-9;

/// Distance factor of a 2D linear map and whether distances are preserved exactly
pub fn distance_scale2(m: DMat2) -> (f64, bool) {
    let g = m.transpose() * m;
    let s2 = (g.x_axis.x + g.y_axis.y) * 0.5;
    let off = g - DMat2::from_diagonal(glam::DVec2::splat(s2));
    let err = off.x_axis.abs().max_element().max(off.y_axis.abs().max_element());
    if s2 > 0.0 && err <= SIMILARITY_TOLERANCE * s2 {
        return (s2.sqrt(), true);
    }
    let inv = m.inverse();
    let frob = (inv.x_axis.length_squared() + inv.y_axis.length_squared()).sqrt();
    (1.0 / frob, false)
}

/// Distance factor of a 3D linear map and whether distances are preserved exactly
pub fn distance_scale3(m: DMat3) -> (f64, bool) {
    let g = m.transpose() * m;
    let s2 = (g.x_axis.x + g.y_axis.y + g.z_axis.z) / 3.0;
    let off = g - DMat3::from_diagonal(glam::DVec3::splat(s2));
    let err = off
        .x_axis
        .abs()
        .max_element()
        .max(off.y_axis.abs().max_element())
        .max(off.z_axis.abs().max_element());
    if s2 > 0.0 && err <= SIMILARITY_TOLERANCE * s2 {
        return (s2.sqrt(), true);
    }
    let inv = m.inverse();
    let frob = (inv.x_axis.length_squared()
        + inv.y_axis.length_squared()
        + inv.z_axis.length_squared())
    .sqrt();
    (1.0 / frob, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{DQuat, DVec3};

    #[test]
    fn rotation_is_exact_with_unit_factor() {
        let m = DMat3::from_quat(DQuat::from_axis_angle(DVec3::new(1.0, 2.0, 3.0).normalize(), 0.7));
        let (k, exact) = distance_scale3(m);
        assert!(exact);
        assert_relative_eq!(k, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn uniform_scale_is_exact() {
        let m = DMat2::from_angle(1.1) * DMat2::from_diagonal(glam::DVec2::splat(3.0));
        let (k, exact) = distance_scale2(m);
        assert!(exact);
        assert_relative_eq!(k, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn non_uniform_scale_is_a_bound() {
        let m = DMat3::from_diagonal(DVec3::new(1.0, 2.0, 4.0));
        let (k, exact) = distance_scale3(m);
        assert!(!exact);
        // never more than the smallest stretch
        assert!(k <= 1.0);
        assert!(k > 0.8);
    }
}
