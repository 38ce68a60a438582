//! 3D operators - booleans, modifiers and repetition

use super::{Sdf3, Sdf3Node};
use crate::blend::Blend;
use crate::error::{Error, Result, ensure};
use glam::{DQuat, DVec3, UVec3};
use sdfcad_math::{Aabb3, blend::saw_tooth, geometry};
use std::f64::consts::TAU;

// ============================================================================
// Boolean Operations
// ============================================================================

/// Union of two fields
pub struct Union3<A: Sdf3, B: Sdf3> {
    pub a: A,
    pub b: B,
    pub blend: Blend,
}

impl<A: Sdf3, B: Sdf3> Union3<A, B> {
    pub fn new(a: A, b: B, blend: Blend) -> Self {
        Self { a, b, blend }
    }
}

impl<A: Sdf3, B: Sdf3> Sdf3 for Union3<A, B> {
    fn distance(&self, p: DVec3) -> f64 {
        self.blend.min(self.a.distance(p), self.b.distance(p))
    }

    fn bounds(&self) -> Aabb3 {
        self.a
            .bounds()
            .union(&self.b.bounds())
            .expand(self.blend.radius())
    }
}

/// Subtract `b` from `a`
pub struct Difference3<A: Sdf3, B: Sdf3> {
    pub a: A,
    pub b: B,
    pub blend: Blend,
}

impl<A: Sdf3, B: Sdf3> Difference3<A, B> {
    pub fn new(a: A, b: B, blend: Blend) -> Self {
        Self { a, b, blend }
    }
}

impl<A: Sdf3, B: Sdf3> Sdf3 for Difference3<A, B> {
    fn distance(&self, p: DVec3) -> f64 {
        self.blend.max(self.a.distance(p), -self.b.distance(p))
    }

    fn bounds(&self) -> Aabb3 {
        self.a.bounds()
    }
}

/// Intersection of two fields
pub struct Intersection3<A: Sdf3, B: Sdf3> {
    pub a: A,
    pub b: B,
    pub blend: Blend,
}

impl<A: Sdf3, B: Sdf3> Intersection3<A, B> {
    pub fn new(a: A, b: B, blend: Blend) -> Self {
        Self { a, b, blend }
    }
}

impl<A: Sdf3, B: Sdf3> Sdf3 for Intersection3<A, B> {
    fn distance(&self, p: DVec3) -> f64 {
        self.blend.max(self.a.distance(p), self.b.distance(p))
    }

    fn bounds(&self) -> Aabb3 {
        self.a.bounds().intersection(&self.b.bounds())
    }
}

/// Union of a list of fields
pub struct UnionAll3 {
    children: Vec<Sdf3Node>,
    blend: Blend,
    bounds: Aabb3,
}

impl UnionAll3 {
    pub fn new(children: Vec<Sdf3Node>, blend: Blend) -> Result<Self> {
        let bounds = children
            .iter()
            .map(Sdf3::bounds)
            .reduce(|acc, b| acc.union(&b))
            .ok_or_else(|| Error::parameter("union of an empty list"))?
            .expand(blend.radius());
        Ok(Self {
            children,
            blend,
            bounds,
        })
    }
}

impl Sdf3 for UnionAll3 {
    fn distance(&self, p: DVec3) -> f64 {
        self.children
            .iter()
            .map(|c| c.distance(p))
            .reduce(|acc, d| self.blend.min(acc, d))
            .unwrap_or(f64::INFINITY)
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

// ============================================================================
// Modifiers
// ============================================================================

pub struct Offset3<S: Sdf3> {
    pub inner: S,
    pub distance: f64,
}

impl<S: Sdf3> Offset3<S> {
    pub fn new(inner: S, distance: f64) -> Self {
        Self { inner, distance }
    }
}

impl<S: Sdf3> Sdf3 for Offset3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.inner.distance(p) - self.distance
    }

    fn bounds(&self) -> Aabb3 {
        self.inner.bounds().expand(self.distance)
    }
}

/// Wall of `thickness` straddling the child's surface
pub struct Shell3<S: Sdf3> {
    inner: S,
    half: f64,
}

impl<S: Sdf3> Shell3<S> {
    pub fn new(inner: S, thickness: f64) -> Result<Self> {
        ensure(
            thickness > 0.0 && thickness.is_finite(),
            "shell thickness must be > 0",
        )?;
        Ok(Self {
            inner,
            half: thickness * 0.5,
        })
    }
}

impl<S: Sdf3> Sdf3 for Shell3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.inner.distance(p).abs() - self.half
    }

    fn bounds(&self) -> Aabb3 {
        self.inner.bounds().expand(self.half)
    }
}

/// Splits the child at the origin planes and inserts straight sections
pub struct Elongate3<S: Sdf3> {
    inner: S,
    half: DVec3,
}

impl<S: Sdf3> Elongate3<S> {
    pub fn new(inner: S, size: DVec3) -> Result<Self> {
        ensure(
            size.is_finite() && size.cmpge(DVec3::ZERO).all(),
            "elongation must be finite and >= 0",
        )?;
        Ok(Self {
            inner,
            half: size * 0.5,
        })
    }
}

impl<S: Sdf3> Sdf3 for Elongate3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.inner.distance(p - p.clamp(-self.half, self.half))
    }

    fn bounds(&self) -> Aabb3 {
        let b = self.inner.bounds();
        b.translate(self.half).union(&b.translate(-self.half))
    }
}

/// Half-space cut; keeps the side `normal` points to
pub struct Cut3<S: Sdf3> {
    inner: S,
    point: DVec3,
    normal: DVec3,
}

impl<S: Sdf3> Cut3<S> {
    pub fn new(inner: S, point: DVec3, normal: DVec3) -> Result<Self> {
        let normal = normal
            .try_normalize()
            .ok_or_else(|| Error::parameter("cut normal must be non-zero"))?;
        Ok(Self {
            inner,
            point,
            normal,
        })
    }
}

impl<S: Sdf3> Sdf3 for Cut3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        let plane = -(p - self.point).dot(self.normal);
        self.inner.distance(p).max(plane)
    }

    fn bounds(&self) -> Aabb3 {
        self.inner.bounds()
    }
}

// ============================================================================
// Repetition
// ============================================================================

/// XYZ array of copies, the first one untranslated
pub struct Array3<S: Sdf3> {
    pub inner: S,
    pub count: UVec3,
    pub step: DVec3,
    pub blend: Blend,
}

impl<S: Sdf3> Array3<S> {
    pub fn new(inner: S, count: UVec3, step: DVec3) -> Result<Self> {
        ensure(count.cmpgt(UVec3::ZERO).all(), "array count must be > 0")?;
        ensure(step.is_finite(), "array step must be finite")?;
        Ok(Self {
            inner,
            count,
            step,
            blend: Blend::Hard,
        })
    }

    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }
}

impl<S: Sdf3> Sdf3 for Array3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        let mut d = f64::INFINITY;
        for i in 0..self.count.x {
            for j in 0..self.count.y {
                for k in 0..self.count.z {
                    let offset = UVec3::new(i, j, k).as_dvec3() * self.step;
                    let dk = self.inner.distance(p - offset);
                    d = if d.is_infinite() { dk } else { self.blend.min(d, dk) };
                }
            }
        }
        d
    }

    fn bounds(&self) -> Aabb3 {
        let b = self.inner.bounds();
        let last = (self.count - UVec3::ONE).as_dvec3() * self.step;
        b.union(&b.translate(last)).expand(self.blend.radius())
    }
}

/// `count` copies about Z, each rotated a further `step` radians
pub struct RotateUnion3<S: Sdf3> {
    inner: S,
    rotations: Vec<DQuat>,
    bounds: Aabb3,
}

impl<S: Sdf3> RotateUnion3<S> {
    pub fn new(inner: S, count: u32, step: f64) -> Result<Self> {
        ensure(count > 0, "rotate union count must be > 0")?;
        ensure(step.is_finite(), "rotate union step must be finite")?;
        let base = inner.bounds();
        let mut bounds = base;
        let mut rotations = Vec::with_capacity(count as usize);
        for i in 0..count {
            let q = DQuat::from_rotation_z(f64::from(i) * step);
            bounds = bounds.union(&base.transform(&glam::DAffine3::from_quat(q)));
            rotations.push(q.inverse());
        }
        Ok(Self {
            inner,
            rotations,
            bounds,
        })
    }
}

impl<S: Sdf3> Sdf3 for RotateUnion3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.rotations
            .iter()
            .map(|q| self.inner.distance(*q * p))
            .fold(f64::INFINITY, f64::min)
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

/// `count` evenly spaced copies about Z with a single child evaluation.
/// The child should fit in the sector centered on +X.
pub struct RotateCopy3<S: Sdf3> {
    inner: S,
    sector: f64,
    bounds: Aabb3,
}

impl<S: Sdf3> RotateCopy3<S> {
    pub fn new(inner: S, count: u32) -> Result<Self> {
        ensure(count > 0, "rotate copy count must be > 0")?;
        let b = inner.bounds();
        ensure(b.is_finite(), "rotate copy needs a bounded child")?;
        let r = b
            .corners()
            .iter()
            .map(|c| c.truncate().length())
            .fold(0.0, f64::max);
        Ok(Self {
            inner,
            sector: TAU / f64::from(count),
            bounds: Aabb3::new(
                DVec3::new(-r, -r, b.min.z),
                DVec3::new(r, r, b.max.z),
            ),
        })
    }
}

impl<S: Sdf3> Sdf3 for RotateCopy3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        let xy = p.truncate();
        let theta = saw_tooth(xy.y.atan2(xy.x), self.sector);
        self.inner
            .distance(geometry::polar(xy.length(), theta).extend(p.z))
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

/// Grid repetition, infinite or limited to `2 * limit + 1` copies per axis
pub struct Repeat3<S: Sdf3> {
    inner: S,
    spacing: DVec3,
    limit: Option<UVec3>,
}

impl<S: Sdf3> Repeat3<S> {
    pub fn new(inner: S, spacing: DVec3) -> Result<Self> {
        Self::check(spacing)?;
        Ok(Self {
            inner,
            spacing,
            limit: None,
        })
    }

    pub fn limited(inner: S, spacing: DVec3, limit: UVec3) -> Result<Self> {
        Self::check(spacing)?;
        Ok(Self {
            inner,
            spacing,
            limit: Some(limit),
        })
    }

    fn check(spacing: DVec3) -> Result<()> {
        ensure(
            spacing.is_finite() && spacing.cmpge(DVec3::ZERO).all(),
            "repeat spacing must be finite and >= 0",
        )?;
        ensure(spacing != DVec3::ZERO, "repeat needs at least one axis")
    }

    fn fold(&self, v: f64, s: f64, limit: Option<u32>) -> f64 {
        if s <= 0.0 {
            return v;
        }
        let cell = (v / s).round();
        let cell = match limit {
            Some(l) => cell.clamp(-f64::from(l), f64::from(l)),
            None => cell,
        };
        v - s * cell
    }
}

impl<S: Sdf3> Sdf3 for Repeat3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        let s = self.spacing;
        let l = self.limit;
        let q = DVec3::new(
            self.fold(p.x, s.x, l.map(|l| l.x)),
            self.fold(p.y, s.y, l.map(|l| l.y)),
            self.fold(p.z, s.z, l.map(|l| l.z)),
        );
        self.inner.distance(q)
    }

    fn bounds(&self) -> Aabb3 {
        let b = self.inner.bounds();
        let repeated = self.spacing.cmpgt(DVec3::ZERO);
        match self.limit {
            Some(limit) => {
                let reach = limit.as_dvec3() * self.spacing;
                Aabb3::new(b.min - reach, b.max + reach)
            }
            None => Aabb3 {
                min: DVec3::select(repeated, Aabb3::INFINITE.min, b.min),
                max: DVec3::select(repeated, Aabb3::INFINITE.max, b.max),
            },
        }
    }
}

/// Union of translated copies of one child
pub struct Multi3<S: Sdf3> {
    inner: S,
    positions: Vec<DVec3>,
    bounds: Aabb3,
}

impl<S: Sdf3> Multi3<S> {
    pub fn new(inner: S, positions: Vec<DVec3>) -> Result<Self> {
        ensure(!positions.is_empty(), "multi needs at least one position")?;
        ensure(
            positions.iter().all(|p| p.is_finite()),
            "positions must be finite",
        )?;
        let b = inner.bounds();
        let bounds = positions
            .iter()
            .map(|p| b.translate(*p))
            .reduce(|acc, x| acc.union(&x))
            .unwrap_or(b);
        Ok(Self {
            inner,
            positions,
            bounds,
        })
    }
}

impl<S: Sdf3> Sdf3 for Multi3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.positions
            .iter()
            .map(|x| self.inner.distance(p - *x))
            .fold(f64::INFINITY, f64::min)
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

/// Copies of one child turned so that its `base` axis points along each
/// of a set of directions
pub struct Orient3<S: Sdf3> {
    inner: S,
    rotations: Vec<DQuat>,
    bounds: Aabb3,
}

impl<S: Sdf3> Orient3<S> {
    pub fn new(inner: S, base: DVec3, directions: &[DVec3]) -> Result<Self> {
        ensure(!directions.is_empty(), "orient needs at least one direction")?;
        let base = base
            .try_normalize()
            .ok_or_else(|| Error::parameter("orient base must be non-zero"))?;
        let b = inner.bounds();
        let mut bounds: Option<Aabb3> = None;
        let mut rotations = Vec::with_capacity(directions.len());
        for d in directions {
            let d = d
                .try_normalize()
                .ok_or_else(|| Error::parameter("orient directions must be non-zero"))?;
            let q = DQuat::from_rotation_arc(base, d);
            let turned = b.transform(&glam::DAffine3::from_quat(q));
            bounds = Some(bounds.map_or(turned, |acc| acc.union(&turned)));
            rotations.push(q.inverse());
        }
        Ok(Self {
            inner,
            rotations,
            bounds: bounds.unwrap_or(b),
        })
    }
}

impl<S: Sdf3> Sdf3 for Orient3<S> {
    fn distance(&self, p: DVec3) -> f64 {
        self.rotations
            .iter()
            .map(|q| self.inner.distance(*q * p))
            .fold(f64::INFINITY, f64::min)
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

/// Positions for a row of copies from `start` toward `end`.
///
/// The segment is cut into one step per character of `pattern`; an `x`
/// places a copy at the start of its step and any other character skips it.
pub fn line_positions(start: DVec3, end: DVec3, pattern: &str) -> Result<Vec<DVec3>> {
    ensure(
        start.is_finite() && end.is_finite(),
        "line end points must be finite",
    )?;
    let steps = pattern.chars().count();
    ensure(steps > 0, "line pattern is empty")?;
    let step = (end - start) / steps as f64;
    let positions: Vec<DVec3> = pattern
        .chars()
        .enumerate()
        .filter(|&(_, c)| c == 'x')
        .map(|(i, _)| start + step * i as f64)
        .collect();
    ensure(!positions.is_empty(), "line pattern places no copies")?;
    Ok(positions)
}
