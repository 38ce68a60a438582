//! Coplanar region merging
//!
//! Marching cubes tiles every flat face with two triangles per cell. This pass
//! finds edge-connected regions of coplanar triangles, drops the vertices that
//! only sit on straight runs of region boundaries, and re-triangulates each
//! region by ear clipping. Boundary vertices are filtered with one global
//! keep-set, so two regions sharing an edge keep the same vertices along it
//! and no T-junctions appear.

use super::Mesh;
use glam::{DVec2, DVec3};
use sdfcad_math::geometry::orient;
use std::collections::{HashMap, HashSet};

const NORMAL_TOLERANCE: f64 = 1e-10;

/// Plane of a triangle
#[derive(Clone, Copy)]
struct Plane {
    normal: DVec3,
    offset: f64,
}

impl Plane {
    fn matches(&self, other: &Self, tol: f64) -> bool {
        self.normal.dot(other.normal) >= 1.0 - NORMAL_TOLERANCE
            && (self.offset - other.offset).abs() <= tol
    }
}

/// Region with its oriented boundary loop, when it has exactly one
struct Region {
    triangles: Vec<usize>,
    normal: DVec3,
    boundary: Option<Vec<u32>>,
}

impl Mesh {
    /// Merge connected coplanar triangles into as few triangles as possible.
    ///
    /// Only meaningful on a manifold mesh. Returns the number of triangles
    /// removed.
    pub fn collapse_coplanar(&mut self) -> usize {
        let before = self.triangles.len();
        let Some(bounds) = self.bounds() else {
            return 0;
        };
        let scale = bounds.size().max_element().max(1.0);
        let tol = 1e-9 * scale;

        let planes: Vec<Option<Plane>> = (0..self.triangles.len())
            .map(|i| {
                let n = self.face_normal(i);
                (n != DVec3::ZERO).then(|| Plane {
                    normal: n,
                    offset: n.dot(self.vertices[self.triangles[i][0] as usize]),
                })
            })
            .collect();

        let mut regions = self.coplanar_regions(&planes, tol);
        let mut triangulated: Vec<Option<Vec<[u32; 3]>>> = vec![None; regions.len()];

        // Dropping a region's vertices can starve a neighbour's ear clipping, so
        // repeat until every remaining region triangulates.
        loop {
            let keep = self.kept_vertices(&regions, tol);
            let mut failed = false;
            for (r, region) in regions.iter_mut().enumerate() {
                triangulated[r] = None;
                let Some(loop_) = &region.boundary else {
                    continue;
                };
                let kept: Vec<u32> = loop_.iter().copied().filter(|v| keep.contains(v)).collect();
                match self.ear_clip(&kept, region.normal, tol) {
                    Some(tris) => triangulated[r] = Some(tris),
                    None => {
                        region.boundary = None;
                        failed = true;
                    }
                }
            }
            if !failed {
                break;
            }
            tracing::debug!("coplanar region failed to triangulate, retrying without it");
        }

        let mut triangles = Vec::with_capacity(self.triangles.len());
        for (region, tris) in regions.iter().zip(triangulated) {
            match tris {
                Some(t) => triangles.extend(t),
                None => triangles.extend(region.triangles.iter().map(|&t| self.triangles[t])),
            }
        }
        self.triangles = triangles;
        self.compact();

        let removed = before.saturating_sub(self.triangles.len());
        tracing::debug!(
            before,
            after = self.triangles.len(),
            "collapsed coplanar regions"
        );
        removed
    }

    /// Group triangles into edge-connected coplanar regions
    fn coplanar_regions(&self, planes: &[Option<Plane>], tol: f64) -> Vec<Region> {
        let mut by_edge: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                by_edge.entry((a.min(b), a.max(b))).or_default().push(t);
            }
        }

        let mut region_of = vec![usize::MAX; self.triangles.len()];
        let mut regions = Vec::new();
        for seed in 0..self.triangles.len() {
            if region_of[seed] != usize::MAX {
                continue;
            }
            let id = regions.len();
            region_of[seed] = id;
            let mut members = vec![seed];
            let mut stack = vec![seed];
            while let Some(t) = stack.pop() {
                let Some(plane) = planes[t] else { continue };
                let tri = self.triangles[t];
                for k in 0..3 {
                    let (a, b) = (tri[k], tri[(k + 1) % 3]);
                    let Some(users) = by_edge.get(&(a.min(b), a.max(b))) else {
                        continue;
                    };
                    if users.len() != 2 {
                        continue;
                    }
                    for &u in users {
                        if region_of[u] != usize::MAX {
                            continue;
                        }
                        if planes[u].is_some_and(|p| p.matches(&plane, tol)) {
                            region_of[u] = id;
                            members.push(u);
                            stack.push(u);
                        }
                    }
                }
            }

            let normal = planes[seed].map_or(DVec3::ZERO, |p| p.normal);
            let boundary = if members.len() > 1 {
                self.single_boundary_loop(&members)
            } else {
                None
            };
            regions.push(Region {
                triangles: members,
                normal,
                boundary,
            });
        }
        regions
    }

    /// Directed boundary of a set of triangles if it forms one simple loop
    fn single_boundary_loop(&self, members: &[usize]) -> Option<Vec<u32>> {
        let mut directed: HashSet<(u32, u32)> = HashSet::new();
        for &t in members {
            let tri = self.triangles[t];
            for k in 0..3 {
                directed.insert((tri[k], tri[(k + 1) % 3]));
            }
        }
        let mut next: HashMap<u32, u32> = HashMap::new();
        for &(a, b) in &directed {
            if !directed.contains(&(b, a)) && next.insert(a, b).is_some() {
                return None;
            }
        }
        let &start = next.keys().next()?;
        let mut loop_ = vec![start];
        let mut v = *next.get(&start)?;
        while v != start {
            if loop_.len() > next.len() {
                return None;
            }
            loop_.push(v);
            v = *next.get(&v)?;
        }
        (loop_.len() == next.len()).then_some(loop_)
    }

    /// Vertices that must survive: corners of any collapsible region and every
    /// vertex of a region left as is
    fn kept_vertices(&self, regions: &[Region], tol: f64) -> HashSet<u32> {
        let mut keep = HashSet::new();
        for region in regions {
            match &region.boundary {
                Some(loop_) => {
                    let n = loop_.len();
                    for i in 0..n {
                        let a = self.vertices[loop_[(i + n - 1) % n] as usize];
                        let b = self.vertices[loop_[i] as usize];
                        let c = self.vertices[loop_[(i + 1) % n] as usize];
                        let turn = (b - a).cross(c - b).length();
                        if turn > tol * (b - a).length().max((c - b).length()) {
                            keep.insert(loop_[i]);
                        }
                    }
                }
                None => {
                    for &t in &region.triangles {
                        keep.extend(self.triangles[t]);
                    }
                }
            }
        }
        keep
    }

    /// Triangulate a planar loop, `None` if no valid ear remains at some step
    fn ear_clip(&self, loop_: &[u32], normal: DVec3, tol: f64) -> Option<Vec<[u32; 3]>> {
        if loop_.len() < 3 {
            return None;
        }
        let pts: Vec<DVec2> = loop_
            .iter()
            .map(|&v| project(self.vertices[v as usize], normal))
            .collect();
        let area_tol = tol * tol;
        if sdfcad_math::geometry::signed_area(&pts) <= area_tol {
            return None;
        }

        let mut idx: Vec<usize> = (0..pts.len()).collect();
        let mut out = Vec::with_capacity(pts.len() - 2);
        while idx.len() > 3 {
            let n = idx.len();
            let ear = (0..n).find(|&i| {
                let (a, b, c) = (idx[(i + n - 1) % n], idx[i], idx[(i + 1) % n]);
                if orient(pts[a], pts[b], pts[c]) <= area_tol {
                    return false;
                }
                idx.iter()
                    .filter(|&&j| j != a && j != b && j != c)
                    .all(|&j| !in_triangle(pts[j], pts[a], pts[b], pts[c], area_tol))
            })?;
            let (a, b, c) = (idx[(ear + n - 1) % n], idx[ear], idx[(ear + 1) % n]);
            out.push([loop_[a], loop_[b], loop_[c]]);
            idx.remove(ear);
        }
        if orient(pts[idx[0]], pts[idx[1]], pts[idx[2]]) <= area_tol {
            return None;
        }
        out.push([loop_[idx[0]], loop_[idx[1]], loop_[idx[2]]]);
        Some(out)
    }
}

/// Drop the dominant normal axis, keeping counter-clockwise loops counter-clockwise
fn project(p: DVec3, n: DVec3) -> DVec2 {
    let a = n.abs();
    let (u, v, s) = if a.x >= a.y && a.x >= a.z {
        (p.y, p.z, n.x)
    } else if a.y >= a.z {
        (p.z, p.x, n.y)
    } else {
        (p.x, p.y, n.z)
    };
    if s >= 0.0 {
        DVec2::new(u, v)
    } else {
        DVec2::new(v, u)
    }
}

/// Point in or on a counter-clockwise triangle
fn in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2, tol: f64) -> bool {
    orient(a, b, p) >= -tol && orient(b, c, p) >= -tol && orient(c, a, p) >= -tol
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::unit_cube;
    use approx::assert_relative_eq;

    /// Cube whose faces are split into an `n` x `n` grid of quads
    fn tessellated_cube(n: u32) -> Mesh {
        let mut soup = Vec::new();
        let step = 1.0 / f64::from(n);
        for face in 0..6 {
            let axis = face / 2;
            let positive = face % 2 == 1;
            for i in 0..n {
                for j in 0..n {
                    let (u0, u1) = (f64::from(i) * step, f64::from(i + 1) * step);
                    let (v0, v1) = (f64::from(j) * step, f64::from(j + 1) * step);
                    let w = if positive { 1.0 } else { 0.0 };
                    let place = |u: f64, v: f64| match axis {
                        0 => DVec3::new(w, u, v),
                        1 => DVec3::new(v, w, u),
                        _ => DVec3::new(u, v, w),
                    };
                    let (a, b, c, d) = (place(u0, v0), place(u1, v0), place(u1, v1), place(u0, v1));
                    if positive {
                        soup.push([a, b, c]);
                        soup.push([a, c, d]);
                    } else {
                        soup.push([a, c, b]);
                        soup.push([a, d, c]);
                    }
                }
            }
        }
        Mesh::from_soup(&soup, 1e-9)
    }

    #[test]
    fn tessellated_cube_is_closed() {
        let m = tessellated_cube(4);
        assert!(m.check_manifold().is_ok());
        assert_relative_eq!(m.signed_volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tessellated_cube_collapses_to_twelve_triangles() {
        let mut m = tessellated_cube(5);
        assert_eq!(m.triangle_count(), 6 * 5 * 5 * 2);
        m.collapse_coplanar();
        assert_eq!(m.triangle_count(), 12);
        assert_eq!(m.vertex_count(), 8);
        assert!(m.check_manifold().is_ok());
        assert_relative_eq!(m.signed_volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn minimal_cube_is_unchanged() {
        let mut m = unit_cube();
        let removed = m.collapse_coplanar();
        assert_eq!(removed, 0);
        assert_eq!(m.triangle_count(), 12);
        assert!(m.check_manifold().is_ok());
    }

    #[test]
    fn projection_preserves_orientation() {
        let tri = [DVec3::ZERO, DVec3::Y, DVec3::Z];
        let n = DVec3::X;
        let p: Vec<DVec2> = tri.iter().map(|&v| project(v, n)).collect();
        assert!(orient(p[0], p[1], p[2]) > 0.0);
        let p: Vec<DVec2> = tri.iter().rev().map(|&v| project(v, -n)).collect();
        assert!(orient(p[0], p[1], p[2]) > 0.0);
    }
}
