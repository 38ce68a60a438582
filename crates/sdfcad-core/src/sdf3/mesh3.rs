//! Solids given by a closed triangle mesh

use super::Sdf3;
use crate::error::{Result, ensure};
use crate::mesh::Mesh;
use glam::DVec3;
use sdfcad_math::Aabb3;
use std::f64::consts::TAU;

/// Solid bounded by a closed triangle mesh, such as one read back from STL.
///
/// The distance is exact: the nearest point over every triangle, negative
/// where the mesh winds around the query point. Evaluation visits every
/// triangle, so cost grows linearly with the mesh.
#[derive(Debug, Clone)]
pub struct Mesh3 {
    triangles: Vec<[DVec3; 3]>,
    bounds: Aabb3,
}

impl Mesh3 {
    /// Fails when the mesh is empty or not closed
    pub fn new(mesh: &Mesh) -> Result<Self> {
        ensure(!mesh.is_empty(), "mesh has no triangles")?;
        mesh.check_manifold()?;
        let bounds = mesh
            .bounds()
            .filter(Aabb3::is_finite)
            .ok_or_else(|| crate::Error::parameter("mesh vertices must be finite"))?;
        Ok(Self {
            triangles: mesh.iter_triangles().collect(),
            bounds,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Times the surface wraps around `p`: ±1 inside, 0 outside
    fn winding_number(&self, p: DVec3) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| solid_angle(a - p, b - p, c - p))
            .sum::<f64>()
            / (2.0 * TAU)
    }
}

impl Sdf3 for Mesh3 {
    fn distance(&self, p: DVec3) -> f64 {
        let d = self
            .triangles
            .iter()
            .map(|&[a, b, c]| p.distance_squared(closest_on_triangle(p, a, b, c)))
            .fold(f64::INFINITY, f64::min)
            .sqrt();
        if self.winding_number(p).abs() > 0.5 {
            -d
        } else {
            d
        }
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

/// Signed solid angle of a triangle seen from the origin (Van Oosterom and
/// Strackee)
fn solid_angle(a: DVec3, b: DVec3, c: DVec3) -> f64 {
    let (la, lb, lc) = (a.length(), b.length(), c.length());
    let det = a.dot(b.cross(c));
    let div = la * lb * lc + a.dot(b) * lc + a.dot(c) * lb + b.dot(c) * la;
    2.0 * det.atan2(div)
}

/// Point of triangle `abc` nearest to `p`, by Voronoi region of the corners
/// and edges
fn closest_on_triangle(p: DVec3, a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && d4 - d3 >= 0.0 && d5 - d6 >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::unit_cube;
    use crate::sdf3::{Sdf3Ext, cuboid};
    use approx::assert_relative_eq;

    #[test]
    fn cube_mesh_matches_the_exact_cube() {
        let solid = Mesh3::new(&unit_cube()).unwrap();
        let exact = cuboid(DVec3::ONE, 0.0)
            .unwrap()
            .translate(DVec3::splat(0.5));
        for i in -3..=5 {
            for j in -3..=5 {
                for k in -3..=5 {
                    let p = DVec3::new(f64::from(i), f64::from(j), f64::from(k)) * 0.37
                        + DVec3::new(0.011, 0.023, 0.017);
                    assert_relative_eq!(solid.distance(p), exact.distance(p), epsilon = 1e-12);
                }
            }
        }
        assert_eq!(solid.bounds(), Aabb3::new(DVec3::ZERO, DVec3::ONE));
        assert_eq!(solid.triangle_count(), 12);
    }

    #[test]
    fn winding_order_does_not_flip_the_sign() {
        let mut inverted = unit_cube();
        for tri in &mut inverted.triangles {
            tri.swap(1, 2);
        }
        let solid = Mesh3::new(&inverted).unwrap();
        assert_relative_eq!(solid.distance(DVec3::splat(0.5)), -0.5, epsilon = 1e-12);
        assert_relative_eq!(solid.distance(DVec3::new(2.0, 0.5, 0.5)), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn nearest_points_cover_every_region() {
        let (a, b, c) = (DVec3::ZERO, DVec3::X, DVec3::Y);
        let cases = [
            (DVec3::new(-1.0, -1.0, 0.5), a),
            (DVec3::new(2.0, -0.5, 0.0), b),
            (DVec3::new(-0.5, 3.0, 1.0), c),
            (DVec3::new(0.5, -2.0, 0.0), DVec3::new(0.5, 0.0, 0.0)),
            (DVec3::new(-1.0, 0.25, 0.0), DVec3::new(0.0, 0.25, 0.0)),
            (DVec3::new(1.0, 1.0, 0.0), DVec3::new(0.5, 0.5, 0.0)),
            (DVec3::new(0.2, 0.3, 4.0), DVec3::new(0.2, 0.3, 0.0)),
        ];
        for (p, expected) in cases {
            let q = closest_on_triangle(p, a, b, c);
            assert_relative_eq!(q.distance(expected), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn open_or_empty_meshes_are_rejected() {
        assert!(Mesh3::new(&Mesh::new()).is_err());
        let mut open = unit_cube();
        open.triangles.pop();
        assert!(Mesh3::new(&open).is_err());
    }
}
