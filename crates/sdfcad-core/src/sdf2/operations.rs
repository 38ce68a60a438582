//! 2D operators - booleans, offsets, cuts and repetition

use super::{Sdf2, Sdf2Node};
use crate::blend::Blend;
use crate::error::{Result, ensure};
use glam::{DAffine2, DVec2, UVec2};
use sdfcad_math::{Aabb2, blend::saw_tooth, geometry};
use std::f64::consts::TAU;

// ============================================================================
// Boolean Operations
// ============================================================================

/// Union of two fields
pub struct Union2<A: Sdf2, B: Sdf2> {
    pub a: A,
    pub b: B,
    pub blend: Blend,
}

impl<A: Sdf2, B: Sdf2> Union2<A, B> {
    pub fn new(a: A, b: B, blend: Blend) -> Self {
        Self { a, b, blend }
    }
}

impl<A: Sdf2, B: Sdf2> Sdf2 for Union2<A, B> {
    fn distance(&self, p: DVec2) -> f64 {
        self.blend.min(self.a.distance(p), self.b.distance(p))
    }

    fn bounds(&self) -> Aabb2 {
        self.a
            .bounds()
            .union(&self.b.bounds())
            .expand(self.blend.radius())
    }
}

/// Subtract `b` from `a`
pub struct Difference2<A: Sdf2, B: Sdf2> {
    pub a: A,
    pub b: B,
    pub blend: Blend,
}

impl<A: Sdf2, B: Sdf2> Difference2<A, B> {
    pub fn new(a: A, b: B, blend: Blend) -> Self {
        Self { a, b, blend }
    }
}

impl<A: Sdf2, B: Sdf2> Sdf2 for Difference2<A, B> {
    fn distance(&self, p: DVec2) -> f64 {
        self.blend.max(self.a.distance(p), -self.b.distance(p))
    }

    fn bounds(&self) -> Aabb2 {
        self.a.bounds()
    }
}

/// Intersection of two fields
pub struct Intersection2<A: Sdf2, B: Sdf2> {
    pub a: A,
    pub b: B,
    pub blend: Blend,
}

impl<A: Sdf2, B: Sdf2> Intersection2<A, B> {
    pub fn new(a: A, b: B, blend: Blend) -> Self {
        Self { a, b, blend }
    }
}

impl<A: Sdf2, B: Sdf2> Sdf2 for Intersection2<A, B> {
    fn distance(&self, p: DVec2) -> f64 {
        self.blend.max(self.a.distance(p), self.b.distance(p))
    }

    fn bounds(&self) -> Aabb2 {
        self.a.bounds().intersection(&self.b.bounds())
    }
}

/// Union of a list of fields, folded left to right
pub struct UnionAll2 {
    children: Vec<Sdf2Node>,
    blend: Blend,
    bounds: Aabb2,
}

impl UnionAll2 {
    pub fn new(children: Vec<Sdf2Node>, blend: Blend) -> Result<Self> {
        let bounds = children
            .iter()
            .map(Sdf2::bounds)
            .reduce(|acc, b| acc.union(&b))
            .ok_or_else(|| crate::Error::parameter("union of an empty list"))?
            .expand(blend.radius());
        Ok(Self {
            children,
            blend,
            bounds,
        })
    }
}

impl Sdf2 for UnionAll2 {
    fn distance(&self, p: DVec2) -> f64 {
        self.children
            .iter()
            .map(|c| c.distance(p))
            .reduce(|acc, d| self.blend.min(acc, d))
            .unwrap_or(f64::INFINITY)
    }

    fn bounds(&self) -> Aabb2 {
        self.bounds
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// Constant offset of the zero set
pub struct Offset2<S: Sdf2> {
    pub inner: S,
    pub distance: f64,
}

impl<S: Sdf2> Offset2<S> {
    pub fn new(inner: S, distance: f64) -> Self {
        Self { inner, distance }
    }
}

impl<S: Sdf2> Sdf2 for Offset2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        self.inner.distance(p) - self.distance
    }

    fn bounds(&self) -> Aabb2 {
        self.inner.bounds().expand(self.distance)
    }
}

/// Keep the part of the shape left of a directed line
pub struct Cut2<S: Sdf2> {
    inner: S,
    point: DVec2,
    // unit normal pointing into the kept half
    normal: DVec2,
}

impl<S: Sdf2> Cut2<S> {
    pub fn new(inner: S, point: DVec2, direction: DVec2) -> Result<Self> {
        let dir = direction.try_normalize().ok_or_else(|| {
            crate::Error::parameter("cut direction must be non-zero")
        })?;
        Ok(Self {
            inner,
            point,
            normal: dir.perp(),
        })
    }
}

impl<S: Sdf2> Sdf2 for Cut2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        let plane = -(p - self.point).dot(self.normal);
        self.inner.distance(p).max(plane)
    }

    fn bounds(&self) -> Aabb2 {
        self.inner.bounds()
    }
}

// ============================================================================
// Repetition
// ============================================================================

/// Rectangular array of copies, the first one untranslated
pub struct Array2<S: Sdf2> {
    pub inner: S,
    pub count: UVec2,
    pub step: DVec2,
    pub blend: Blend,
}

impl<S: Sdf2> Array2<S> {
    pub fn new(inner: S, count: UVec2, step: DVec2) -> Result<Self> {
        ensure(count.x > 0 && count.y > 0, "array count must be > 0")?;
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

impl<S: Sdf2> Sdf2 for Array2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        let mut d = f64::INFINITY;
        for j in 0..self.count.x {
            for k in 0..self.count.y {
                let offset = DVec2::new(f64::from(j), f64::from(k)) * self.step;
                let dk = self.inner.distance(p - offset);
                d = if d.is_infinite() { dk } else { self.blend.min(d, dk) };
            }
        }
        d
    }

    fn bounds(&self) -> Aabb2 {
        let b = self.inner.bounds();
        let last = (self.count - UVec2::ONE).as_dvec2() * self.step;
        b.union(&b.translate(last)).expand(self.blend.radius())
    }
}

/// `count` copies, each rotated by a further `step` radians about the origin
pub struct RotateUnion2<S: Sdf2> {
    inner: S,
    // inverse rotation per copy
    rotations: Vec<DAffine2>,
    bounds: Aabb2,
}

impl<S: Sdf2> RotateUnion2<S> {
    pub fn new(inner: S, count: u32, step: f64) -> Result<Self> {
        ensure(count > 0, "rotate union count must be > 0")?;
        ensure(step.is_finite(), "rotate union step must be finite")?;
        let base = inner.bounds();
        let mut bounds = base;
        let mut rotations = Vec::with_capacity(count as usize);
        for i in 0..count {
            let m = DAffine2::from_angle(f64::from(i) * step);
            bounds = bounds.union(&base.transform(&m));
            rotations.push(m.inverse());
        }
        Ok(Self {
            inner,
            rotations,
            bounds,
        })
    }
}

impl<S: Sdf2> Sdf2 for RotateUnion2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        self.rotations
            .iter()
            .map(|m| self.inner.distance(m.transform_point2(p)))
            .fold(f64::INFINITY, f64::min)
    }

    fn bounds(&self) -> Aabb2 {
        self.bounds
    }
}

/// `count` evenly spaced copies about the origin.
///
/// The query point is folded into the sector around +X, so the cost is one
/// child evaluation regardless of `count`. The child should lie within that
/// sector.
pub struct RotateCopy2<S: Sdf2> {
    inner: S,
    sector: f64,
    bounds: Aabb2,
}

impl<S: Sdf2> RotateCopy2<S> {
    pub fn new(inner: S, count: u32) -> Result<Self> {
        ensure(count > 0, "rotate copy count must be > 0")?;
        let b = inner.bounds();
        ensure(b.is_finite(), "rotate copy needs a bounded child")?;
        let r = b
            .corners()
            .iter()
            .map(|c| c.length())
            .fold(0.0, f64::max);
        Ok(Self {
            inner,
            sector: TAU / f64::from(count),
            bounds: Aabb2::from_center_size(DVec2::ZERO, DVec2::splat(2.0 * r)),
        })
    }
}

impl<S: Sdf2> Sdf2 for RotateCopy2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        let theta = saw_tooth(p.y.atan2(p.x), self.sector);
        self.inner.distance(geometry::polar(p.length(), theta))
    }

    fn bounds(&self) -> Aabb2 {
        self.bounds
    }
}

/// Infinite repetition on a grid
pub struct Repeat2<S: Sdf2> {
    pub inner: S,
    pub spacing: DVec2,
}

impl<S: Sdf2> Repeat2<S> {
    pub fn new(inner: S, spacing: DVec2) -> Result<Self> {
        ensure(
            spacing.is_finite() && spacing.cmpge(DVec2::ZERO).all(),
            "repeat spacing must be finite and >= 0",
        )?;
        ensure(spacing != DVec2::ZERO, "repeat needs at least one axis")?;
        Ok(Self { inner, spacing })
    }
}

impl<S: Sdf2> Sdf2 for Repeat2<S> {
    fn distance(&self, p: DVec2) -> f64 {
        let s = self.spacing;
        let fold = |v: f64, s: f64| if s > 0.0 { v - s * (v / s).round() } else { v };
        self.inner.distance(DVec2::new(fold(p.x, s.x), fold(p.y, s.y)))
    }

    fn bounds(&self) -> Aabb2 {
        let b = self.inner.bounds();
        let repeated = self.spacing.cmpgt(DVec2::ZERO);
        Aabb2 {
            min: DVec2::select(repeated, Aabb2::INFINITE.min, b.min),
            max: DVec2::select(repeated, Aabb2::INFINITE.max, b.max),
        }
    }
}
