//! 2D primitive shapes
//!
//! All constructors validate their parameters and fail with
//! [`Error::Parameter`](crate::Error::Parameter); evaluation never fails.

use super::Sdf2;
use crate::error::{Result, ensure};
use glam::DVec2;
use sdfcad_math::{Aabb2, geometry};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constructor Functions
// ============================================================================

/// Circle centered at the origin
pub fn circle(radius: f64) -> Result<Circle> {
    Circle::new(radius)
}

/// Rectangle of full `size` centered at the origin, corners rounded by `round`
pub fn rectangle(size: DVec2, round: f64) -> Result<Rectangle> {
    Rectangle::new(size, round)
}

/// Simple polygon using the non-zero winding rule
pub fn polygon(points: Vec<DVec2>) -> Result<Polygon> {
    Polygon::new(points)
}

/// Regular polygon with `sides` vertices on a circle of `radius`, first vertex on +X
pub fn regular_polygon(sides: u32, radius: f64) -> Result<Polygon> {
    ensure(sides >= 3, "regular polygon needs at least 3 sides")?;
    ensure(radius > 0.0 && radius.is_finite(), "radius must be > 0")?;
    let step = std::f64::consts::TAU / f64::from(sides);
    let points = (0..sides)
        .map(|i| geometry::polar(radius, f64::from(i) * step))
        .collect();
    Polygon::new(points)
}

/// Segment of `length` along X centered at the origin, thickened by `round`
pub fn line(length: f64, round: f64) -> Result<Line> {
    Line::new(length, round)
}

/// Unbounded half plane through `point`; `normal` points out of the solid
pub fn half_plane(point: DVec2, normal: DVec2) -> Result<HalfPlane> {
    HalfPlane::new(point, normal)
}

/// Signed distance to an axis aligned box with half extents `half`
pub(crate) fn box_distance(p: DVec2, half: DVec2) -> f64 {
    let d = p.abs() - half;
    d.max(DVec2::ZERO).length() + d.max_element().min(0.0)
}

// ============================================================================
// Circle
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Circle {
    pub radius: f64,
}

impl Circle {
    pub fn new(radius: f64) -> Result<Self> {
        ensure(radius > 0.0 && radius.is_finite(), "radius must be > 0")?;
        Ok(Self { radius })
    }
}

impl Sdf2 for Circle {
    fn distance(&self, p: DVec2) -> f64 {
        p.length() - self.radius
    }

    fn bounds(&self) -> Aabb2 {
        Aabb2::from_center_size(DVec2::ZERO, DVec2::splat(2.0 * self.radius))
    }
}

// ============================================================================
// Rectangle
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Rectangle {
    /// Half extents of the outer boundary
    pub half: DVec2,
    /// Corner radius
    pub round: f64,
}

impl Rectangle {
    pub fn new(size: DVec2, round: f64) -> Result<Self> {
        ensure(
            size.is_finite() && size.cmpgt(DVec2::ZERO).all(),
            "rectangle size must be > 0",
        )?;
        ensure(round >= 0.0, "round must be >= 0")?;
        ensure(
            round <= 0.5 * size.min_element(),
            "round must not exceed half the smallest side",
        )?;
        Ok(Self {
            half: size * 0.5,
            round,
        })
    }
}

impl Sdf2 for Rectangle {
    fn distance(&self, p: DVec2) -> f64 {
        box_distance(p, self.half - DVec2::splat(self.round)) - self.round
    }

    fn bounds(&self) -> Aabb2 {
        Aabb2::new(-self.half, self.half)
    }
}

// ============================================================================
// Polygon
// ============================================================================

/// Inside/outside rule for polygons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    /// Inside where the winding number is non-zero
    #[default]
    NonZero,
    /// Inside where a ray crosses the outline an odd number of times
    EvenOdd,
}

/// Polygon given by its vertex loop (closing edge implied). Works for any
/// orientation and for concave outlines.
#[derive(Debug, Clone)]
pub struct Polygon {
    points: Vec<DVec2>,
    fill_rule: FillRule,
    bounds: Aabb2,
}

impl Polygon {
    /// Simple (non self-intersecting) polygon, non-zero winding rule
    pub fn new(points: Vec<DVec2>) -> Result<Self> {
        Self::validate(&points)?;
        ensure(
            !geometry::is_self_intersecting(&points),
            "polygon edges must not intersect",
        )?;
        Self::build(points, FillRule::NonZero)
    }

    /// Polygon that may self-intersect or wind multiple times; `rule` decides
    /// which regions are solid
    pub fn with_fill_rule(points: Vec<DVec2>, rule: FillRule) -> Result<Self> {
        Self::validate(&points)?;
        Self::build(points, rule)
    }

    fn validate(points: &[DVec2]) -> Result<()> {
        ensure(points.len() >= 3, "polygon needs at least 3 vertices")?;
        ensure(
            points.iter().all(|p| p.is_finite()),
            "polygon vertices must be finite",
        )?;
        let n = points.len();
        ensure(
            (0..n).all(|i| points[i] != points[(i + 1) % n]),
            "polygon has a zero length edge",
        )?;
        ensure(
            geometry::signed_area(points).abs() > 0.0,
            "polygon has zero area",
        )?;
        Ok(())
    }

    fn build(points: Vec<DVec2>, fill_rule: FillRule) -> Result<Self> {
        let bounds = Aabb2::from_points(&points)
            .ok_or_else(|| crate::Error::parameter("polygon has no vertices"))?;
        Ok(Self {
            points,
            fill_rule,
            bounds,
        })
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    fn is_inside(&self, p: DVec2) -> bool {
        match self.fill_rule {
            FillRule::NonZero => geometry::winding_number(&self.points, p) != 0,
            FillRule::EvenOdd => geometry::crossings_odd(&self.points, p),
        }
    }
}

impl Sdf2 for Polygon {
    fn distance(&self, p: DVec2) -> f64 {
        let n = self.points.len();
        let d2 = (0..n)
            .map(|i| {
                geometry::segment_distance_squared(p, self.points[i], self.points[(i + 1) % n])
            })
            .fold(f64::INFINITY, f64::min);
        let d = d2.sqrt();
        if self.is_inside(p) { -d } else { d }
    }

    fn bounds(&self) -> Aabb2 {
        self.bounds
    }
}

// ============================================================================
// Line
// ============================================================================

/// Rounded segment (a 2D capsule)
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub half_length: f64,
    pub round: f64,
}

impl Line {
    pub fn new(length: f64, round: f64) -> Result<Self> {
        ensure(length >= 0.0 && length.is_finite(), "length must be >= 0")?;
        ensure(round > 0.0 && round.is_finite(), "round must be > 0")?;
        Ok(Self {
            half_length: length * 0.5,
            round,
        })
    }
}

impl Sdf2 for Line {
    fn distance(&self, p: DVec2) -> f64 {
        let a = DVec2::new(-self.half_length, 0.0);
        let b = DVec2::new(self.half_length, 0.0);
        geometry::segment_distance_squared(p, a, b).sqrt() - self.round
    }

    fn bounds(&self) -> Aabb2 {
        let h = DVec2::new(self.half_length + self.round, self.round);
        Aabb2::new(-h, h)
    }
}

// ============================================================================
// Half Plane
// ============================================================================

/// Everything on the inner side of a line. Explicitly unbounded.
#[derive(Debug, Clone, Copy)]
pub struct HalfPlane {
    pub point: DVec2,
    pub normal: DVec2,
}

impl HalfPlane {
    pub fn new(point: DVec2, normal: DVec2) -> Result<Self> {
        let normal = normal
            .try_normalize()
            .ok_or_else(|| crate::Error::parameter("half plane normal must be non-zero"))?;
        ensure(point.is_finite(), "half plane point must be finite")?;
        Ok(Self { point, normal })
    }
}

impl Sdf2 for HalfPlane {
    fn distance(&self, p: DVec2) -> f64 {
        (p - self.point).dot(self.normal)
    }

    fn bounds(&self) -> Aabb2 {
        Aabb2::INFINITE
    }
}

// ============================================================================
// Tests
// ============================================================================
