//! Indexed triangle meshes produced by the 3D extractor
//!
//! A [`Mesh`] owns a deduplicated vertex list and counter-clockwise (seen from
//! outside) index triples. After a successful render it is closed: every edge
//! is used by exactly two triangles, once in each direction.

mod simplify;
mod split;

use crate::error::{Error, Result};
use glam::DVec3;
use sdfcad_math::Aabb3;
use std::collections::HashMap;

/// A triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<DVec3>,
    pub triangles: Vec<[u32; 3]>,
}

/// Edge statistics used by the manifold check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeReport {
    /// Edges used by a single triangle
    pub boundary_edges: usize,
    /// Edges used by three or more triangles
    pub overshared_edges: usize,
    /// Edges used twice in the same direction
    pub misoriented_edges: usize,
}

impl EdgeReport {
    pub fn is_manifold(&self) -> bool {
        self.boundary_edges == 0 && self.overshared_edges == 0 && self.misoriented_edges == 0
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from a triangle soup, welding vertices closer than `epsilon`
    /// and dropping triangles that collapse in the process.
    pub fn from_soup(soup: &[[DVec3; 3]], epsilon: f64) -> Self {
        let mut mesh = Self {
            vertices: Vec::with_capacity(soup.len() * 3),
            triangles: Vec::with_capacity(soup.len()),
        };
        for tri in soup {
            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend_from_slice(tri);
            mesh.triangles.push([base, base + 1, base + 2]);
        }
        mesh.weld(epsilon);
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner positions of triangle `i`
    pub fn triangle(&self, i: usize) -> [DVec3; 3] {
        self.triangles[i].map(|v| self.vertices[v as usize])
    }

    /// Unit normal of triangle `i` by the right-hand rule, zero when degenerate
    pub fn face_normal(&self, i: usize) -> DVec3 {
        let [a, b, c] = self.triangle(i);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Iterate over triangles as corner positions
    pub fn iter_triangles(&self) -> impl Iterator<Item = [DVec3; 3]> + '_ {
        (0..self.triangles.len()).map(|i| self.triangle(i))
    }

    /// Bounding box of the vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Aabb3> {
        Aabb3::from_points(&self.vertices)
    }

    /// Volume enclosed by a closed mesh; positive when normals face outward
    pub fn signed_volume(&self) -> f64 {
        self.iter_triangles()
            .map(|[a, b, c]| a.dot(b.cross(c)))
            .sum::<f64>()
            / 6.0
    }

    pub fn surface_area(&self) -> f64 {
        self.iter_triangles()
            .map(|[a, b, c]| (b - a).cross(c - a).length() * 0.5)
            .sum()
    }

    /// Merge vertices closer than `epsilon` and drop collapsed triangles.
    ///
    /// A zero epsilon merges bit-identical positions only.
    pub fn weld(&mut self, epsilon: f64) {
        if self.vertices.is_empty() {
            return;
        }
        let remap = if epsilon > 0.0 {
            self.weld_within(epsilon)
        } else {
            self.weld_exact()
        };

        for tri in &mut self.triangles {
            *tri = tri.map(|v| remap[v as usize]);
        }
        self.triangles
            .retain(|&[a, b, c]| a != b && b != c && c != a);
        self.compact();
    }

    fn weld_exact(&mut self) -> Vec<u32> {
        let mut seen: HashMap<[u64; 3], u32> = HashMap::with_capacity(self.vertices.len());
        let mut merged = Vec::with_capacity(self.vertices.len());
        let remap = self
            .vertices
            .iter()
            .map(|&v| {
                // fold -0.0 into 0.0
                let v = v + DVec3::ZERO;
                let key = v.to_array().map(f64::to_bits);
                *seen.entry(key).or_insert_with(|| {
                    merged.push(v);
                    (merged.len() - 1) as u32
                })
            })
            .collect();
        self.vertices = merged;
        remap
    }

    fn weld_within(&mut self, epsilon: f64) -> Vec<u32> {
        let eps_sq = epsilon * epsilon;
        let cell_size = epsilon * 2.0;
        let key_of = |p: DVec3| (p / cell_size).floor().as_i64vec3().to_array();

        let mut grid: HashMap<[i64; 3], Vec<u32>> = HashMap::new();
        let mut merged: Vec<DVec3> = Vec::with_capacity(self.vertices.len());
        let mut remap = Vec::with_capacity(self.vertices.len());

        for &p in &self.vertices {
            let key = key_of(p);
            let mut found = None;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(cands) = grid.get(&[key[0] + dx, key[1] + dy, key[2] + dz])
                        else {
                            continue;
                        };
                        for &j in cands {
                            if merged[j as usize].distance_squared(p) <= eps_sq {
                                found = Some(j);
                                break 'search;
                            }
                        }
                    }
                }
            }
            let idx = found.unwrap_or_else(|| {
                merged.push(p);
                let j = (merged.len() - 1) as u32;
                grid.entry(key).or_default().push(j);
                j
            });
            remap.push(idx);
        }
        self.vertices = merged;
        remap
    }

    /// Drop vertices no triangle refers to
    pub(crate) fn compact(&mut self) {
        let mut used = vec![u32::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for tri in &mut self.triangles {
            for v in tri.iter_mut() {
                let slot = &mut used[*v as usize];
                if *slot == u32::MAX {
                    *slot = vertices.len() as u32;
                    vertices.push(self.vertices[*v as usize]);
                }
                *v = *slot;
            }
        }
        self.vertices = vertices;
    }

    /// Count boundary, over-shared and inconsistently wound edges
    pub fn edge_report(&self) -> EdgeReport {
        // undirected edge -> (uses low->high, uses high->low)
        let mut edges: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
        for tri in &self.triangles {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                let entry = edges.entry((a.min(b), a.max(b))).or_default();
                if a < b {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }

        let mut report = EdgeReport::default();
        for &(fwd, back) in edges.values() {
            match fwd + back {
                1 => report.boundary_edges += 1,
                2 if fwd != 1 => report.misoriented_edges += 1,
                2 => {}
                _ => report.overshared_edges += 1,
            }
        }
        report
    }

    /// Fail with [`Error::NonManifold`] unless every edge is shared by exactly
    /// two oppositely wound triangles
    pub fn check_manifold(&self) -> Result<()> {
        let r = self.edge_report();
        if r.is_manifold() {
            Ok(())
        } else {
            Err(Error::NonManifold {
                boundary_edges: r.boundary_edges,
                overshared_edges: r.overshared_edges,
                misoriented_edges: r.misoriented_edges,
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit cube as 12 outward-facing triangles
    pub(crate) fn unit_cube() -> Mesh {
        let vertices = (0..8_u32)
            .map(|i| DVec3::new(f64::from(i & 1), f64::from((i >> 1) & 1), f64::from(i >> 2)))
            .collect();
        let triangles = vec![
            [0, 2, 1],
            [1, 2, 3],
            [4, 5, 6],
            [5, 7, 6],
            [0, 1, 4],
            [1, 5, 4],
            [2, 6, 3],
            [3, 6, 7],
            [0, 4, 2],
            [2, 4, 6],
            [1, 3, 5],
            [3, 7, 5],
        ];
        Mesh {
            vertices,
            triangles,
        }
    }

    #[test]
    fn cube_is_closed_and_outward() {
        let m = unit_cube();
        assert!(m.check_manifold().is_ok());
        assert_relative_eq!(m.signed_volume(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.surface_area(), 6.0, epsilon = 1e-12);
        for i in 0..m.triangle_count() {
            let [a, b, c] = m.triangle(i);
            let centroid = (a + b + c) / 3.0;
            assert!(m.face_normal(i).dot(centroid - DVec3::splat(0.5)) > 0.0);
        }
    }

    #[test]
    fn soup_welds_shared_corners() {
        let m = unit_cube();
        let soup: Vec<[DVec3; 3]> = m.iter_triangles().collect();
        let welded = Mesh::from_soup(&soup, 1e-9);
        assert_eq!(welded.vertex_count(), 8);
        assert_eq!(welded.triangle_count(), 12);
        assert!(welded.check_manifold().is_ok());

        let exact = Mesh::from_soup(&soup, 0.0);
        assert_eq!(exact.vertex_count(), 8);
    }

    #[test]
    fn weld_drops_collapsed_triangles() {
        let soup = [
            [DVec3::ZERO, DVec3::X, DVec3::Y],
            [DVec3::ZERO, DVec3::new(1e-12, 0.0, 0.0), DVec3::Y],
        ];
        let m = Mesh::from_soup(&soup, 1e-9);
        assert_eq!(m.triangle_count(), 1);
        assert_eq!(m.vertex_count(), 3);
    }

    #[test]
    fn open_and_flipped_meshes_are_reported() {
        let mut open = unit_cube();
        open.triangles.pop();
        let r = open.edge_report();
        assert_eq!(r.boundary_edges, 3);
        assert!(matches!(
            open.check_manifold(),
            Err(Error::NonManifold {
                boundary_edges: 3,
                ..
            })
        ));

        let mut flipped = unit_cube();
        flipped.triangles[0].swap(1, 2);
        assert_eq!(flipped.edge_report().misoriented_edges, 3);
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        let m = Mesh::new();
        assert!(m.bounds().is_none());
        assert!(m.is_empty());
        assert!(m.check_manifold().is_ok());
    }
}
