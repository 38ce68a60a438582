//! Quadtree-guided marching squares
//!
//! Same lattice scheme as the 3D extractor, one dimension down. Each leaf cell
//! emits oriented segments with the solid on their left, so chained loops come
//! out counter-clockwise around material and clockwise around holes.

use super::ExtractStats;
use super::march3::cells_across;
use crate::Result;
use crate::eval::finite;
use crate::sdf2::Sdf2;
use glam::{DVec2, IVec2};
use rayon::prelude::*;
use sdfcad_math::Aabb2;
use std::collections::HashMap;

const SNAP_EPSILON: f64 = 1e-12;

/// Cell corners, counter-clockwise from the minimum corner
const CORNERS: [[i32; 2]; 4] = [[0, 0], [1, 0], [1, 1], [0, 1]];

/// Cell edges as corner pairs: bottom, right, top, left
const EDGES: [[usize; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];

/// Segments per corner case as `[from_edge, to_edge]`. The saddle cases 5 and
/// 10 are resolved by the center sample, see [`saddle`].
const SEGMENTS: [&[[usize; 2]]; 16] = [
    &[],
    &[[0, 3]],
    &[[1, 0]],
    &[[1, 3]],
    &[[2, 1]],
    &[],
    &[[2, 0]],
    &[[2, 3]],
    &[[3, 2]],
    &[[0, 2]],
    &[],
    &[[1, 2]],
    &[[3, 1]],
    &[[0, 1]],
    &[[3, 0]],
    &[],
];

/// Segments for the two saddle cases given whether the cell center is inside
fn saddle(case: usize, center_inside: bool) -> &'static [[usize; 2]] {
    match (case, center_inside) {
        (5, false) => &[[0, 3], [2, 1]],
        (5, true) => &[[0, 1], [2, 3]],
        (10, false) => &[[1, 0], [3, 2]],
        _ => &[[3, 0], [1, 2]],
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Lattice2 {
    pub origin: DVec2,
    pub step: f64,
    pub cells: IVec2,
    pub root: i32,
}

impl Lattice2 {
    pub fn new(bounds: Aabb2, resolution: u32) -> Self {
        let size = bounds.size();
        let step = size.max_element() / f64::from(resolution);
        let cells = IVec2::new(cells_across(size.x, step), cells_across(size.y, step));
        let root = (cells.max_element() as u32).next_power_of_two() as i32;
        Self {
            origin: bounds.center() - cells.as_dvec2() * step * 0.5,
            step,
            cells,
            root,
        }
    }

    pub fn point(&self, k: IVec2) -> DVec2 {
        self.origin + k.as_dvec2() * self.step
    }
}

struct Quadtree<'a, S: Sdf2 + ?Sized> {
    field: &'a S,
    lattice: Lattice2,
    adaptive: bool,
    cache: HashMap<IVec2, f64>,
    segments: Vec<[DVec2; 2]>,
    stats: ExtractStats,
}

impl<'a, S: Sdf2 + ?Sized> Quadtree<'a, S> {
    fn new(field: &'a S, lattice: Lattice2, adaptive: bool) -> Self {
        Self {
            field,
            lattice,
            adaptive,
            cache: HashMap::new(),
            segments: Vec::new(),
            stats: ExtractStats::default(),
        }
    }

    fn sample(&mut self, p: DVec2) -> Result<f64> {
        self.stats.evaluations += 1;
        finite(self.field.distance(p), || format!("{p}"))
    }

    fn value(&mut self, k: IVec2) -> Result<f64> {
        if let Some(&v) = self.cache.get(&k) {
            return Ok(v);
        }
        let v = self.sample(self.lattice.point(k))?;
        self.cache.insert(k, v);
        Ok(v)
    }

    fn cell(&mut self, corner: IVec2, n: i32) -> Result<()> {
        if !corner.cmplt(self.lattice.cells).all() {
            return Ok(());
        }
        if n == 1 {
            return self.leaf(corner);
        }
        let half = n / 2;
        if self.adaptive {
            let d = self.value(corner + IVec2::splat(half))?;
            let half_diagonal = std::f64::consts::FRAC_1_SQRT_2 * f64::from(n) * self.lattice.step;
            if d.abs() > half_diagonal {
                self.stats.pruned_cells += 1;
                return Ok(());
            }
        }
        for offset in CORNERS {
            self.cell(corner + IVec2::from_array(offset) * half, half)?;
        }
        Ok(())
    }

    fn leaf(&mut self, corner: IVec2) -> Result<()> {
        let mut keys = [IVec2::ZERO; 4];
        let mut values = [0.0; 4];
        let mut case = 0_usize;
        for (i, offset) in CORNERS.iter().enumerate() {
            keys[i] = corner + IVec2::from_array(*offset);
            values[i] = self.value(keys[i])?;
            if values[i] <= 0.0 {
                case |= 1 << i;
            }
        }
        if case == 0 || case == 15 {
            return Ok(());
        }
        self.stats.leaf_cells += 1;

        let segments = if case == 5 || case == 10 {
            let center = self.lattice.point(corner) + DVec2::splat(0.5 * self.lattice.step);
            saddle(case, self.sample(center)? <= 0.0)
        } else {
            SEGMENTS[case]
        };
        for &[from, to] in segments {
            let [a0, a1] = EDGES[from];
            let [b0, b1] = EDGES[to];
            self.segments.push([
                self.edge_vertex((keys[a0], values[a0]), (keys[a1], values[a1])),
                self.edge_vertex((keys[b0], values[b0]), (keys[b1], values[b1])),
            ]);
        }
        Ok(())
    }

    fn edge_vertex(&self, a: (IVec2, f64), b: (IVec2, f64)) -> DVec2 {
        let ((k0, v0), (k1, v1)) = if a.0.to_array() <= b.0.to_array() {
            (a, b)
        } else {
            (b, a)
        };
        let p0 = self.lattice.point(k0);
        let p1 = self.lattice.point(k1);
        let t = match (v0.abs() < SNAP_EPSILON, v1.abs() < SNAP_EPSILON) {
            (true, false) => return p0,
            (false, true) => return p1,
            (true, true) => 0.5,
            (false, false) => v0 / (v0 - v1),
        };
        p0 + (p1 - p0) * t
    }
}

/// Oriented segment soup of the zero set of `field` inside `bounds`
pub(crate) fn march2<S: Sdf2 + ?Sized>(
    field: &S,
    bounds: Aabb2,
    resolution: u32,
    adaptive: bool,
) -> Result<(Vec<[DVec2; 2]>, ExtractStats)> {
    let lattice = Lattice2::new(bounds, resolution);
    let half = lattice.root / 2;
    let roots: Vec<(IVec2, i32)> = if half == 0 {
        vec![(IVec2::ZERO, 1)]
    } else {
        CORNERS
            .iter()
            .map(|o| (IVec2::from_array(*o) * half, half))
            .collect()
    };

    let branches: Vec<(Vec<[DVec2; 2]>, ExtractStats)> = roots
        .par_iter()
        .map(|&(corner, n)| {
            let mut tree = Quadtree::new(field, lattice, adaptive);
            tree.cell(corner, n)?;
            Ok((tree.segments, tree.stats))
        })
        .collect::<Result<_>>()?;

    let mut stats = ExtractStats::default();
    let mut soup = Vec::new();
    for (segments, s) in branches {
        soup.extend(segments);
        stats += s;
    }
    tracing::debug!(
        evaluations = stats.evaluations,
        pruned = stats.pruned_cells,
        leaves = stats.leaf_cells,
        segments = soup.len(),
        "quadtree extraction finished"
    );
    Ok((soup, stats))
}
