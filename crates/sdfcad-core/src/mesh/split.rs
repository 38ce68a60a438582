//! Separating sheets that touch
//!
//! A feature thinner than one lattice cell can leave two surface sheets
//! sharing a lattice point or a lattice edge. Here every directed half-edge is
//! paired with one oppositely directed twin, the triangle corners around each
//! vertex are grouped into fans connected through those pairs, and each fan
//! beyond the first gets its own copy of the vertex.

use super::Mesh;
use std::collections::HashMap;

/// One use of an undirected edge by a triangle
#[derive(Clone, Copy)]
struct HalfEdge {
    /// Corner the edge leaves from, `3 * triangle + slot`
    corner: usize,
    /// Runs from the lower to the higher vertex index
    forward: bool,
}

/// Following corner of the same triangle
fn next(corner: usize) -> usize {
    corner - corner % 3 + (corner + 1) % 3
}

/// Union-find over triangle corners
struct Fans {
    parent: Vec<usize>,
}

impl Fans {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parent[b] = a;
        }
    }

    /// Record `a` and `b` as twins: their endpoints meet crosswise
    fn join(&mut self, a: HalfEdge, b: HalfEdge) {
        self.union(a.corner, next(b.corner));
        self.union(next(a.corner), b.corner);
    }
}

impl Mesh {
    /// Give every fan of triangles around a vertex its own vertex.
    ///
    /// An edge used by more than two triangles is resolved by sorting them by
    /// angle about the edge and pairing each with its neighbour across its
    /// solid side. Returns the number of vertices added.
    pub fn split_non_manifold(&mut self) -> usize {
        let corners = self.triangles.len() * 3;
        let mut uses: HashMap<(u32, u32), Vec<HalfEdge>> = HashMap::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                uses.entry((a.min(b), a.max(b))).or_default().push(HalfEdge {
                    corner: 3 * t + k,
                    forward: a < b,
                });
            }
        }

        let mut fans = Fans::new(corners);
        for (&(lo, hi), half_edges) in &mut uses {
            if let [a, b] = half_edges[..] {
                if a.forward != b.forward {
                    fans.join(a, b);
                }
            } else if half_edges.len() > 2 {
                self.sort_about_edge(lo, hi, half_edges);
                let n = half_edges.len();
                for i in 0..n {
                    let (a, b) = (half_edges[i], half_edges[(i + 1) % n]);
                    if !a.forward && b.forward {
                        fans.join(a, b);
                    }
                }
            }
        }

        // fan root -> vertex index serving it
        let mut owner: Vec<Option<usize>> = vec![None; self.vertices.len()];
        let mut copies: HashMap<usize, u32> = HashMap::new();
        let before = self.vertices.len();
        for corner in 0..corners {
            let (t, k) = (corner / 3, corner % 3);
            let v = self.triangles[t][k] as usize;
            let root = fans.find(corner);
            match owner[v] {
                None => owner[v] = Some(root),
                Some(r) if r == root => {}
                Some(_) => {
                    let vertices = &mut self.vertices;
                    let copy = *copies.entry(root).or_insert_with(|| {
                        vertices.push(vertices[v]);
                        (vertices.len() - 1) as u32
                    });
                    self.triangles[t][k] = copy;
                }
            }
        }

        let added = self.vertices.len() - before;
        if added > 0 {
            tracing::debug!(added, "split vertices shared by separate sheets");
        }
        added
    }

    /// Order the triangles on edge `lo -> hi` counter-clockwise about it
    fn sort_about_edge(&self, lo: u32, hi: u32, half_edges: &mut [HalfEdge]) {
        let origin = self.vertices[lo as usize];
        let axis = (self.vertices[hi as usize] - origin).normalize_or_zero();
        let u = axis.any_orthonormal_vector();
        let w = axis.cross(u);
        let angle = |h: &HalfEdge| {
            let apex = self.vertices[self.triangles[h.corner / 3][(h.corner + 2) % 3] as usize];
            let d = apex - origin;
            d.dot(w).atan2(d.dot(u))
        };
        half_edges.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::unit_cube;
    use glam::DVec3;

    /// Two unit cubes touching along the edge x = 1, y = 1
    fn cubes_on_an_edge() -> Mesh {
        let a = unit_cube();
        let mut soup: Vec<[DVec3; 3]> = a.iter_triangles().collect();
        soup.extend(a.iter_triangles().map(|t| t.map(|p| p + DVec3::new(1.0, 1.0, 0.0))));
        Mesh::from_soup(&soup, 0.0)
    }

    #[test]
    fn closed_meshes_are_left_alone() {
        let mut m = unit_cube();
        assert_eq!(m.split_non_manifold(), 0);
        assert_eq!(m, unit_cube());
    }

    #[test]
    fn cubes_sharing_an_edge_come_apart() {
        let mut m = cubes_on_an_edge();
        assert_eq!(m.vertex_count(), 14);
        assert_eq!(m.edge_report().overshared_edges, 1);

        assert_eq!(m.split_non_manifold(), 2);
        assert_eq!(m.vertex_count(), 16);
        m.check_manifold().unwrap();
        assert!((m.signed_volume() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn cubes_sharing_a_corner_come_apart() {
        let a = unit_cube();
        let mut soup: Vec<[DVec3; 3]> = a.iter_triangles().collect();
        soup.extend(a.iter_triangles().map(|t| t.map(|p| p + DVec3::ONE)));
        let mut m = Mesh::from_soup(&soup, 0.0);
        // edge-manifold already, but one vertex joins two fans
        m.check_manifold().unwrap();
        assert_eq!(m.vertex_count(), 15);
        assert_eq!(m.split_non_manifold(), 1);
        assert_eq!(m.vertex_count(), 16);
        m.check_manifold().unwrap();
    }
}
