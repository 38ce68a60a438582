//! Closed 2D contours produced by the 2D extractor
//!
//! A [`ContourSet`] holds closed loops (the closing edge is implicit). Loops
//! bounding material run counter-clockwise, holes run clockwise, so the sum of
//! signed areas is the filled area and the summed winding number is a valid
//! inside test.

use glam::DVec2;
use sdfcad_math::{Aabb2, geometry};
use std::collections::HashMap;

/// One closed polyline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<DVec2>,
}

impl Contour {
    pub fn new(points: Vec<DVec2>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Positive for counter-clockwise loops
    pub fn signed_area(&self) -> f64 {
        geometry::signed_area(&self.points)
    }

    /// Clockwise loops are holes
    pub fn is_hole(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    /// Edges including the closing one
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        Aabb2::from_points(&self.points)
    }

    /// Winding number of this loop around `p`
    pub fn winding(&self, p: DVec2) -> i32 {
        geometry::winding_number(&self.points, p)
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }
}

/// All loops of a 2D extraction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    pub contours: Vec<Contour>,
}

impl ContourSet {
    pub fn new(contours: Vec<Contour>) -> Self {
        Self { contours }
    }

    /// Chain oriented segments into closed loops, orient them by nesting depth
    /// and optionally drop vertices on straight runs.
    ///
    /// Segments are joined where an end point is bit-identical to a start
    /// point. Chains that fail to close are dropped with a warning.
    pub fn from_segments(segments: &[[DVec2; 2]], simplify: bool) -> Self {
        let (loops, open) = chain(segments);
        if open > 0 {
            tracing::warn!(open, "dropped open contour chains");
        }

        let mut contours: Vec<Contour> = loops.into_iter().map(Contour::new).collect();
        if simplify {
            let scale = contours
                .iter()
                .filter_map(Contour::bounds)
                .map(|b| b.size().max_element())
                .fold(1.0_f64, f64::max);
            let tol = 1e-9 * scale;
            for c in &mut contours {
                drop_collinear(&mut c.points, tol);
            }
        }
        contours.retain(|c| c.len() >= 3 && c.signed_area().abs() > 0.0);

        let mut set = Self { contours };
        set.classify();
        set
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.contours.iter()
    }

    /// Loops bounding material
    pub fn outer_count(&self) -> usize {
        self.contours.iter().filter(|c| !c.is_hole()).count()
    }

    pub fn hole_count(&self) -> usize {
        self.contours.iter().filter(|c| c.is_hole()).count()
    }

    /// Filled area, holes subtracted
    pub fn area(&self) -> f64 {
        self.contours.iter().map(Contour::signed_area).sum()
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        self.contours
            .iter()
            .filter_map(Contour::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Inside test using the summed winding number of all loops
    pub fn contains(&self, p: DVec2) -> bool {
        self.contours.iter().map(|c| c.winding(p)).sum::<i32>() != 0
    }

    /// Orient every loop by how many other loops enclose it: even depth runs
    /// counter-clockwise, odd depth clockwise.
    fn classify(&mut self) {
        let depths: Vec<usize> = self
            .contours
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let start = c.points[0];
                self.contours
                    .iter()
                    .enumerate()
                    .filter(|&(j, other)| j != i && other.winding(start) != 0)
                    .count()
            })
            .collect();
        for (c, depth) in self.contours.iter_mut().zip(depths) {
            let want_ccw = depth % 2 == 0;
            if (c.signed_area() > 0.0) != want_ccw {
                c.reverse();
            }
        }
    }
}

impl<'a> IntoIterator for &'a ContourSet {
    type Item = &'a Contour;
    type IntoIter = std::slice::Iter<'a, Contour>;

    fn into_iter(self) -> Self::IntoIter {
        self.contours.iter()
    }
}

fn key(p: DVec2) -> [u64; 2] {
    (p + DVec2::ZERO).to_array().map(f64::to_bits)
}

/// Join segments end to start. Returns the closed loops and the number of
/// chains that could not be closed.
fn chain(segments: &[[DVec2; 2]]) -> (Vec<Vec<DVec2>>, usize) {
    let segments: Vec<[DVec2; 2]> = segments
        .iter()
        .copied()
        .filter(|[a, b]| key(*a) != key(*b))
        .collect();

    let mut starts: HashMap<[u64; 2], Vec<usize>> = HashMap::with_capacity(segments.len());
    for (i, [a, _]) in segments.iter().enumerate() {
        starts.entry(key(*a)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();
    let mut open = 0;
    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let [start, mut end] = segments[seed];
        let mut points = vec![start];
        loop {
            if key(end) == key(start) {
                loops.push(points);
                break;
            }
            let next = starts
                .get_mut(&key(end))
                .and_then(|candidates| {
                    while let Some(i) = candidates.pop() {
                        if !used[i] {
                            return Some(i);
                        }
                    }
                    None
                });
            let Some(next) = next else {
                open += 1;
                break;
            };
            used[next] = true;
            points.push(end);
            end = segments[next][1];
        }
    }
    (loops, open)
}

/// Interior vertex of a straight run
fn straight(a: DVec2, b: DVec2, c: DVec2, tol: f64) -> bool {
    (b - a).perp_dot(c - b).abs() <= tol * a.distance(c) && (b - a).dot(c - b) >= 0.0
}

/// Remove vertices lying on a straight line between their neighbours
fn drop_collinear(points: &mut Vec<DVec2>, tol: f64) {
    let mut out: Vec<DVec2> = Vec::with_capacity(points.len());
    for &p in points.iter() {
        while out.len() >= 2 && straight(out[out.len() - 2], out[out.len() - 1], p, tol) {
            out.pop();
        }
        out.push(p);
    }
    // the seam between the last and first vertex
    loop {
        let n = out.len();
        if n > 3 && straight(out[n - 2], out[n - 1], out[0], tol) {
            out.pop();
        } else if n > 3 && straight(out[n - 1], out[0], out[1], tol) {
            out.remove(0);
        } else {
            break;
        }
    }
    *points = out;
}
