//! Curved outlines flattened to polygons
//!
//! Bézier paths, natural cubic splines through knots and corner rounding all
//! produce vertex lists; [`Polygon`] turns them into fields.

use super::Polygon;
use crate::error::{Error, Result, ensure};
use glam::{DMat2, DVec2, DVec3};
use sdfcad_math::geometry;
use std::f64::consts::PI;

// ============================================================================
// Bézier Paths
// ============================================================================

/// Flatness limit, the sine of the angle a chord may deviate from the curve
const FLATNESS: f64 = 0.02;
/// Subdivision depth at which a span is accepted as a chord regardless
const MAX_DEPTH: u32 = 8;
/// Fraction of a span used for the off-center flatness check
const OFF_CENTER: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexKind {
    /// The curve passes through it
    End,
    /// Control point pulling the curve
    Mid,
}

/// Handle given in polar form relative to its vertex
#[derive(Debug, Clone, Copy)]
struct Handle {
    angle: f64,
    length: f64,
}

impl Handle {
    fn control_point(self, from: DVec2) -> DVec2 {
        from + geometry::polar(self.length, self.angle)
    }
}

/// One vertex of a [`Bezier`] path
#[derive(Debug, Clone, Copy)]
pub struct BezierVertex {
    position: DVec2,
    kind: VertexKind,
    forward: Option<Handle>,
    reverse: Option<Handle>,
}

impl BezierVertex {
    /// Make this a control point the curve is pulled toward but does not cross
    pub fn mid(&mut self) -> &mut Self {
        self.kind = VertexKind::Mid;
        self
    }

    /// Control handle leaving the vertex in the direction of travel
    pub fn handle_forward(&mut self, angle: f64, length: f64) -> &mut Self {
        self.forward = Some(Handle {
            angle,
            length: length.abs(),
        });
        self
    }

    /// Control handle on the incoming side
    pub fn handle_reverse(&mut self, angle: f64, length: f64) -> &mut Self {
        self.reverse = Some(Handle {
            angle,
            length: length.abs(),
        });
        self
    }

    /// Smooth handle pair: `forward` along `angle`, `reverse` opposite to it
    pub fn handle(&mut self, angle: f64, forward: f64, reverse: f64) -> &mut Self {
        self.handle_forward(angle, forward)
            .handle_reverse(angle + PI, reverse)
    }
}

/// A path of Bézier spans.
///
/// End vertices lie on the curve; mid vertices and handles pull it. Each run
/// of mid vertices between two ends forms one span whose degree is the
/// number of points in it minus one.
///
/// ```rust,ignore
/// let mut path = Bezier::new();
/// path.add(DVec2::new(-1.0, 0.0));
/// path.add(DVec2::new(0.0, 2.0)).mid();
/// path.add(DVec2::new(1.0, 0.0));
/// let arch = path.closed().polygon()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bezier {
    vertices: Vec<BezierVertex>,
    closed: bool,
}

impl Bezier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the last vertex back to the first
    pub fn closed(&mut self) -> &mut Self {
        self.closed = true;
        self
    }

    /// Append an end vertex; chain [`BezierVertex::mid`] or a handle onto it
    pub fn add(&mut self, position: DVec2) -> &mut BezierVertex {
        let i = self.vertices.len();
        self.vertices.push(BezierVertex {
            position,
            kind: VertexKind::End,
            forward: None,
            reverse: None,
        });
        &mut self.vertices[i]
    }

    /// Flatten the path into polygon vertices
    pub fn points(&self) -> Result<Vec<DVec2>> {
        let controls = self.controls()?;
        let mut points: Vec<DVec2> = Vec::new();
        let mut start = 0;
        for i in 1..controls.len() {
            if controls[i].kind == VertexKind::Mid {
                continue;
            }
            let span: Vec<DVec2> = controls[start..=i].iter().map(|v| v.position).collect();
            start = i;
            // a span that never leaves its start point adds nothing
            if span.iter().all(|&p| p == span[0]) {
                continue;
            }
            if points.is_empty() {
                points.push(span[0]);
            }
            flatten(&span, 0.0, 1.0, span[0], span[span.len() - 1], 0, &mut points);
        }
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Ok(points)
    }

    pub fn polygon(&self) -> Result<Polygon> {
        Polygon::new(self.points()?)
    }

    /// Expand handles into mid vertices and close the loop if asked
    fn controls(&self) -> Result<Vec<BezierVertex>> {
        ensure(
            self.vertices.iter().all(|v| v.position.is_finite()),
            "bezier vertices must be finite",
        )?;
        let mut controls = Vec::with_capacity(self.vertices.len() * 3);
        for v in &self.vertices {
            if v.kind == VertexKind::Mid && (v.forward.is_some() || v.reverse.is_some()) {
                return Err(Error::parameter("handles belong on end vertices"));
            }
            let control = |h: Handle| BezierVertex {
                position: h.control_point(v.position),
                kind: VertexKind::Mid,
                forward: None,
                reverse: None,
            };
            controls.extend(v.reverse.map(&control));
            controls.push(*v);
            controls.extend(v.forward.map(&control));
        }

        // leading mid vertices belong to the closing span
        let first_end = controls
            .iter()
            .position(|v| v.kind == VertexKind::End)
            .unwrap_or(0);
        controls.rotate_left(first_end);

        if self.closed {
            ensure(controls.len() >= 2, "closed bezier needs at least two vertices")?;
            let first = controls[0];
            ensure(
                first.kind == VertexKind::End,
                "closed bezier needs an end vertex",
            )?;
            let last = controls[controls.len() - 1];
            if last.kind == VertexKind::Mid || !last.position.abs_diff_eq(first.position, 1e-9) {
                controls.push(first);
            }
        }

        ensure(controls.len() >= 2, "bezier needs at least two vertices")?;
        ensure(
            controls[0].kind == VertexKind::End,
            "bezier must start with an end vertex",
        )?;
        ensure(
            controls[controls.len() - 1].kind == VertexKind::End,
            "open bezier must end with an end vertex",
        )?;
        Ok(controls)
    }
}

/// Point at `t` on the curve with control points `span` (de Casteljau)
fn evaluate(span: &[DVec2], t: f64) -> DVec2 {
    let mut work = span.to_vec();
    for level in (1..work.len()).rev() {
        for i in 0..level {
            work[i] = work[i].lerp(work[i + 1], t);
        }
    }
    work[0]
}

/// `p` lies on the chord through `a` and `b` within [`FLATNESS`]
fn on_chord(p: DVec2, a: DVec2, b: DVec2) -> bool {
    match ((p - b).try_normalize(), (a - b).try_normalize()) {
        (Some(u), Some(v)) => u.perp_dot(v).abs() < FLATNESS,
        _ => false,
    }
}

/// Append the end of every chord approximating the span between `t0` and `t1`
fn flatten(
    span: &[DVec2],
    t0: f64,
    t1: f64,
    p0: DVec2,
    p1: DVec2,
    depth: u32,
    out: &mut Vec<DVec2>,
) {
    let tm = 0.5 * (t0 + t1);
    let pm = evaluate(span, tm);
    // the off-center check catches spans whose midpoint happens to sit on the chord
    let flat = on_chord(pm, p0, p1)
        && on_chord(evaluate(span, t0 + OFF_CENTER * (t1 - t0)), p0, p1);
    if flat || depth >= MAX_DEPTH {
        if !flat {
            tracing::warn!(depth, "bezier span still curved at the subdivision limit");
        }
        out.push(p1);
        return;
    }
    flatten(span, t0, tm, p0, pm, depth + 1, out);
    flatten(span, tm, t1, pm, p1, depth + 1, out);
}

// ============================================================================
// Cubic Splines
// ============================================================================

/// Cubic `a + bt + ct² + dt³` per axis
#[derive(Debug, Clone, Copy)]
struct Cubic {
    a: DVec2,
    b: DVec2,
    c: DVec2,
    d: DVec2,
}

impl Cubic {
    /// Hermite span from `y0` to `y1` with end slopes `d0` and `d1`
    fn hermite(y0: DVec2, y1: DVec2, d0: DVec2, d1: DVec2) -> Self {
        Self {
            a: y0,
            b: d0,
            c: 3.0 * (y1 - y0) - 2.0 * d0 - d1,
            d: 2.0 * (y0 - y1) + d0 + d1,
        }
    }

    fn at(&self, t: f64) -> DVec2 {
        self.a + t * (self.b + t * (self.c + t * self.d))
    }
}

/// Natural cubic spline through a list of knots.
///
/// Slopes and curvature are continuous at every knot and the curvature is
/// zero at both ends. Span `i` runs from knot `i` at `t = i` to knot `i + 1`.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    spans: Vec<Cubic>,
}

impl CubicSpline {
    pub fn new(knots: &[DVec2]) -> Result<Self> {
        ensure(knots.len() >= 2, "cubic spline needs at least 2 knots")?;
        ensure(
            knots.iter().all(|k| k.is_finite()),
            "spline knots must be finite",
        )?;

        let n = knots.len();
        let mut rows = vec![DVec3::new(1.0, 4.0, 1.0); n];
        rows[0] = DVec3::new(0.0, 2.0, 1.0);
        rows[n - 1] = DVec3::new(1.0, 2.0, 0.0);
        let rhs: Vec<DVec2> = (0..n)
            .map(|i| 3.0 * (knots[(i + 1).min(n - 1)] - knots[i.saturating_sub(1)]))
            .collect();
        let slopes = solve_tridiagonal(&rows, &rhs);

        let spans = knots
            .windows(2)
            .zip(slopes.windows(2))
            .map(|(k, s)| Cubic::hermite(k[0], k[1], s[0], s[1]))
            .collect();
        Ok(Self { spans })
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Point at parameter `t`, clamped to `[0, span_count]`
    pub fn point(&self, t: f64) -> DVec2 {
        let last = self.spans.len() - 1;
        let t = t.clamp(0.0, self.spans.len() as f64);
        let i = (t.floor() as usize).min(last);
        self.spans[i].at(t - i as f64)
    }

    /// `n` points evenly spaced in the parameter, both end knots included
    pub fn polygonize(&self, n: usize) -> Result<Vec<DVec2>> {
        ensure(n >= 2, "spline needs at least 2 samples")?;
        let span = self.spans.len() as f64;
        let last = (n - 1) as f64;
        Ok((0..n)
            .map(|i| self.point(span * i as f64 / last))
            .collect())
    }

    /// Closed outline of `n` samples; the last knot joins the first with a
    /// straight edge
    pub fn polygon(&self, n: usize) -> Result<Polygon> {
        Polygon::new(self.polygonize(n)?)
    }
}

/// Thomas algorithm for a diagonally dominant tridiagonal system. Each row
/// holds (sub, diagonal, super) coefficients.
fn solve_tridiagonal(rows: &[DVec3], rhs: &[DVec2]) -> Vec<DVec2> {
    let n = rows.len();
    let mut upper = vec![0.0; n];
    let mut x = vec![DVec2::ZERO; n];
    upper[0] = rows[0].z / rows[0].y;
    x[0] = rhs[0] / rows[0].y;
    for i in 1..n {
        let denom = rows[i].y - rows[i].x * upper[i - 1];
        upper[i] = rows[i].z / denom;
        x[i] = (rhs[i] - rows[i].x * x[i - 1]) / denom;
    }
    for i in (0..n - 1).rev() {
        let after = x[i + 1];
        x[i] -= upper[i] * after;
    }
    x
}

// ============================================================================
// Corner Smoothing
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct SmoothPoint {
    position: DVec2,
    facets: u32,
    radius: f64,
}

/// Vertex list whose marked corners are replaced by circular arcs.
///
/// A corner is left sharp when the arc would not fit between its
/// neighbours, and the end points of an open list are never rounded.
#[derive(Debug, Clone, Default)]
pub struct Smoother {
    points: Vec<SmoothPoint>,
    closed: bool,
}

impl Smoother {
    /// `closed` treats the first and last points as neighbours
    pub fn new(closed: bool) -> Self {
        Self {
            points: Vec::new(),
            closed,
        }
    }

    /// Append a sharp corner
    pub fn add(&mut self, position: DVec2) -> &mut Self {
        self.points.push(SmoothPoint {
            position,
            facets: 0,
            radius: 0.0,
        });
        self
    }

    /// Append a corner rounded to `radius` with `facets` straight pieces
    pub fn add_smooth(&mut self, position: DVec2, facets: u32, radius: f64) -> Result<&mut Self> {
        ensure(facets > 0, "corner needs at least one facet")?;
        ensure(
            radius >= 0.0 && radius.is_finite(),
            "corner radius must be >= 0",
        )?;
        self.points.push(SmoothPoint {
            position,
            facets,
            radius,
        });
        Ok(self)
    }

    /// Vertex list with every corner that fits rounded
    pub fn smooth(&self) -> Vec<DVec2> {
        let mut points = self.points.clone();
        let mut i = 0;
        while i < points.len() {
            match self.corner_arc(&points, i) {
                Some(arc) => {
                    let n = arc.len();
                    points.splice(i..=i, arc);
                    i += n;
                }
                None => i += 1,
            }
        }
        points.into_iter().map(|p| p.position).collect()
    }

    pub fn polygon(&self) -> Result<Polygon> {
        Polygon::new(self.smooth())
    }

    /// Arc replacing corner `i`, `None` when it stays sharp
    fn corner_arc(&self, points: &[SmoothPoint], i: usize) -> Option<Vec<SmoothPoint>> {
        let p = points[i];
        if p.radius == 0.0 {
            return None;
        }
        let n = points.len();
        let (prev, next) = match (i, self.closed) {
            (0, false) => return None,
            (_, false) if i == n - 1 => return None,
            _ => (points[(i + n - 1) % n].position, points[(i + 1) % n].position),
        };

        let v0 = (prev - p.position).try_normalize()?;
        let v1 = (next - p.position).try_normalize()?;
        let theta = v0.dot(v1).clamp(-1.0, 1.0).acos();
        // straight through or folded back
        if theta < 1e-9 || PI - theta < 1e-9 {
            return None;
        }

        let tangent = p.radius / (0.5 * theta).tan();
        if tangent > prev.distance(p.position) || tangent > next.distance(p.position) {
            return None;
        }
        let center = p.position + (v0 + v1).normalize() * (p.radius / (0.5 * theta).sin());
        let step = DMat2::from_angle(v1.perp_dot(v0).signum() * (PI - theta) / f64::from(p.facets));

        let mut spoke = p.position + v0 * tangent - center;
        let arc = (0..=p.facets)
            .map(|_| {
                let position = center + spoke;
                spoke = step * spoke;
                SmoothPoint {
                    position,
                    facets: 0,
                    radius: 0.0,
                }
            })
            .collect();
        Some(arc)
    }
}

// ============================================================================
// Tests
// ============================================================================
