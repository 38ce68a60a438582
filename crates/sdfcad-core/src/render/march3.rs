//! Octree-guided marching cubes
//!
//! The bounding box is covered by an integer lattice of cubic cells of edge
//! `step`. The root octree cell spans a power-of-two number of leaf cells; a
//! cell is discarded when the field value at its center proves no surface can
//! pass through it, otherwise it is split down to single lattice cells, which
//! are triangulated with the classic tables.
//!
//! Every triangle is produced at leaf level, and a vertex on a lattice edge is
//! computed from the edge's endpoints in a fixed order, so neighbouring cells
//! (in the same or in a different octree branch) agree bit for bit on shared
//! vertices. No transition cells are needed.

use super::ExtractStats;
use super::tables::{CORNERS, EDGE_TABLE, EDGES, TRI_TABLE};
use crate::Result;
use crate::eval::finite;
use crate::sdf3::Sdf3;
use glam::{DVec3, IVec3};
use rayon::prelude::*;
use sdfcad_math::Aabb3;
use std::collections::HashMap;

/// Values closer to zero than this snap the vertex onto the lattice point
const SNAP_EPSILON: f64 = 1e-12;

/// Cells of edge `step` needed to cover `size`. A side that does not divide
/// evenly gets an even count, so a lattice plane runs through its middle and
/// thin centered features are sampled.
pub(crate) fn cells_across(size: f64, step: f64) -> i32 {
    let n = size / step;
    let whole = n.round();
    if (n - whole).abs() < 1e-9 {
        (whole as i32).max(1)
    } else {
        let up = n.ceil() as i32;
        up + up % 2
    }
}

/// Sampling lattice over a box
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lattice3 {
    pub origin: DVec3,
    pub step: f64,
    /// Leaf cells per axis
    pub cells: IVec3,
    /// Edge of the root octree cell in leaf cells, a power of two
    pub root: i32,
}

impl Lattice3 {
    /// `resolution` cells across the longest axis of `bounds`, centered on
    /// the box
    pub fn new(bounds: Aabb3, resolution: u32) -> Self {
        let size = bounds.size();
        let step = size.max_element() / f64::from(resolution);
        let cells = IVec3::from_array(size.to_array().map(|s| cells_across(s, step)));
        let root = (cells.max_element() as u32).next_power_of_two() as i32;
        Self {
            origin: bounds.center() - cells.as_dvec3() * step * 0.5,
            step,
            cells,
            root,
        }
    }

    pub fn point(&self, k: IVec3) -> DVec3 {
        self.origin + k.as_dvec3() * self.step
    }

    pub fn contains_cell(&self, corner: IVec3) -> bool {
        corner.cmplt(self.cells).all()
    }
}

/// Per-branch extraction state
struct Octree<'a, S: Sdf3 + ?Sized> {
    field: &'a S,
    lattice: Lattice3,
    adaptive: bool,
    cache: HashMap<IVec3, f64>,
    triangles: Vec<[DVec3; 3]>,
    stats: ExtractStats,
}

impl<'a, S: Sdf3 + ?Sized> Octree<'a, S> {
    fn new(field: &'a S, lattice: Lattice3, adaptive: bool) -> Self {
        Self {
            field,
            lattice,
            adaptive,
            cache: HashMap::new(),
            triangles: Vec::new(),
            stats: ExtractStats::default(),
        }
    }

    fn value(&mut self, k: IVec3) -> Result<f64> {
        if let Some(&v) = self.cache.get(&k) {
            return Ok(v);
        }
        let p = self.lattice.point(k);
        let v = finite(self.field.distance(p), || format!("{p}"))?;
        self.stats.evaluations += 1;
        self.cache.insert(k, v);
        Ok(v)
    }

    fn cell(&mut self, corner: IVec3, n: i32) -> Result<()> {
        if !self.lattice.contains_cell(corner) {
            return Ok(());
        }
        if n == 1 {
            return self.leaf(corner);
        }
        let half = n / 2;
        if self.adaptive {
            // the center is a lattice point because n is even
            let d = self.value(corner + IVec3::splat(half))?;
            let half_diagonal = 0.5 * 3.0_f64.sqrt() * f64::from(n) * self.lattice.step;
            if d.abs() > half_diagonal {
                self.stats.pruned_cells += 1;
                return Ok(());
            }
        }
        for offset in CORNERS {
            self.cell(corner + IVec3::from_array(offset) * half, half)?;
        }
        Ok(())
    }

    fn leaf(&mut self, corner: IVec3) -> Result<()> {
        let mut keys = [IVec3::ZERO; 8];
        let mut values = [0.0; 8];
        let mut case = 0_usize;
        for (i, offset) in CORNERS.iter().enumerate() {
            keys[i] = corner + IVec3::from_array(*offset);
            values[i] = self.value(keys[i])?;
            if values[i] <= 0.0 {
                case |= 1 << i;
            }
        }
        let crossed = EDGE_TABLE[case];
        if crossed == 0 {
            return Ok(());
        }
        self.stats.leaf_cells += 1;

        let mut points = [DVec3::ZERO; 12];
        for (e, &[a, b]) in EDGES.iter().enumerate() {
            if crossed & (1 << e) != 0 {
                points[e] = self.edge_vertex((keys[a], values[a]), (keys[b], values[b]));
            }
        }

        // the tables wind clockwise seen from outside
        for tri in TRI_TABLE[case].chunks_exact(3) {
            if tri[0] < 0 {
                break;
            }
            self.triangles.push([
                points[tri[2] as usize],
                points[tri[1] as usize],
                points[tri[0] as usize],
            ]);
        }
        Ok(())
    }

    /// Zero crossing on a lattice edge, independent of the cell asking
    fn edge_vertex(&self, a: (IVec3, f64), b: (IVec3, f64)) -> DVec3 {
        let ((k0, v0), (k1, v1)) = if a.0.to_array() <= b.0.to_array() {
            (a, b)
        } else {
            (b, a)
        };
        let p0 = self.lattice.point(k0);
        let p1 = self.lattice.point(k1);
        let near0 = v0.abs() < SNAP_EPSILON;
        let near1 = v1.abs() < SNAP_EPSILON;
        let t = match (near0, near1) {
            (true, false) => return p0,
            (false, true) => return p1,
            (true, true) => 0.5,
            (false, false) => v0 / (v0 - v1),
        };
        p0 + (p1 - p0) * t
    }
}

/// Triangle soup of the zero set of `field` inside `bounds`
pub(crate) fn march3<S: Sdf3 + ?Sized>(
    field: &S,
    bounds: Aabb3,
    resolution: u32,
    adaptive: bool,
) -> Result<(Vec<[DVec3; 3]>, ExtractStats)> {
    let lattice = Lattice3::new(bounds, resolution);
    tracing::debug!(
        cells = ?lattice.cells,
        root = lattice.root,
        step = lattice.step,
        adaptive,
        "octree lattice"
    );

    let half = lattice.root / 2;
    let roots: Vec<(IVec3, i32)> = if half == 0 {
        vec![(IVec3::ZERO, 1)]
    } else {
        CORNERS
            .iter()
            .map(|o| (IVec3::from_array(*o) * half, half))
            .collect()
    };

    let branches: Vec<(Vec<[DVec3; 3]>, ExtractStats)> = roots
        .par_iter()
        .map(|&(corner, n)| {
            let mut tree = Octree::new(field, lattice, adaptive);
            tree.cell(corner, n)?;
            Ok((tree.triangles, tree.stats))
        })
        .collect::<Result<_>>()?;

    let mut stats = ExtractStats::default();
    let mut soup = Vec::with_capacity(branches.iter().map(|b| b.0.len()).sum());
    for (tris, s) in branches {
        soup.extend(tris);
        stats += s;
    }
    tracing::debug!(
        evaluations = stats.evaluations,
        pruned = stats.pruned_cells,
        leaves = stats.leaf_cells,
        triangles = soup.len(),
        "octree extraction finished"
    );
    Ok((soup, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::sdf3::{Sdf3Ext, cuboid, sphere};

    fn padded(field: &impl Sdf3) -> Aabb3 {
        field.bounds().scale_about_center(1.01)
    }

    #[test]
    fn lattice_rounds_cells_up_to_a_power_of_two_root() {
        let b = Aabb3::new(DVec3::ZERO, DVec3::new(10.0, 5.0, 2.5));
        let l = Lattice3::new(b, 20);
        assert_eq!(l.step, 0.5);
        assert_eq!(l.cells, IVec3::new(20, 10, 5));
        assert_eq!(l.root, 32);
        assert!(l.contains_cell(IVec3::new(19, 9, 4)));
        assert!(!l.contains_cell(IVec3::new(19, 10, 4)));
    }

    #[test]
    fn lattice_is_centered_on_the_bounds() {
        let b = Aabb3::new(DVec3::new(-2.0, -2.0, -0.05), DVec3::new(2.0, 2.0, 0.05));
        let l = Lattice3::new(b, 16);
        assert_eq!(l.cells, IVec3::new(16, 16, 2));
        assert_eq!(l.origin, DVec3::new(-2.0, -2.0, -0.25));
        // the middle plane is sampled
        assert_eq!(l.point(IVec3::new(8, 8, 1)), DVec3::ZERO);

        assert_eq!(cells_across(3.0, 1.0), 3);
        assert_eq!(cells_across(3.2, 1.0), 4);
        assert_eq!(cells_across(4.5, 1.0), 6);
        assert_eq!(cells_across(0.1, 1.0), 2);
        assert_eq!(cells_across(12.5, 12.5 / 50.0), 50);
    }

    #[test]
    fn single_cell_lattice() {
        let s = sphere(1.0).unwrap();
        let (soup, stats) = march3(&s, Aabb3::new(DVec3::splat(-0.5), DVec3::splat(1.5)), 1, true)
            .unwrap();
        // only the corner at -0.5 is inside
        assert_eq!(stats.leaf_cells, 1);
        assert_eq!(soup.len(), 1);
    }

    #[test]
    fn triangles_face_outward() {
        let s = sphere(1.0).unwrap().translate(DVec3::new(0.1, -0.2, 0.05));
        let (soup, _) = march3(&s, padded(&s), 24, true).unwrap();
        assert!(!soup.is_empty());
        let center = DVec3::new(0.1, -0.2, 0.05);
        for [a, b, c] in &soup {
            let n = (*b - *a).cross(*c - *a);
            if n.length() > 1e-12 {
                assert!(n.dot((*a + *b + *c) / 3.0 - center) > 0.0);
            }
        }
    }

    #[test]
    fn branches_share_vertices_exactly() {
        let s = cuboid(DVec3::new(1.3, 0.7, 0.9), 0.2).unwrap();
        let (soup, _) = march3(&s, padded(&s), 33, true).unwrap();
        let m = Mesh::from_soup(&soup, 0.0);
        assert!(m.check_manifold().is_ok());
        assert!(m.signed_volume() > 0.0);
    }

    #[test]
    fn pruning_saves_evaluations_without_changing_the_surface() {
        let s = sphere(1.0).unwrap();
        let (a, adaptive) = march3(&s, padded(&s), 40, true).unwrap();
        let (d, dense) = march3(&s, padded(&s), 40, false).unwrap();
        assert_eq!(a.len(), d.len());
        assert_eq!(adaptive.leaf_cells, dense.leaf_cells);
        assert!(adaptive.evaluations < dense.evaluations);
        assert!(adaptive.pruned_cells > 0);
        assert_eq!(dense.pruned_cells, 0);
    }
}
