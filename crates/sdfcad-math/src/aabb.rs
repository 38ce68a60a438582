//! Axis-aligned bounding boxes in 2D and 3D

use glam::{DAffine2, DAffine3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

// ============================================================================
// 2D
// ============================================================================

/// Axis-aligned 2D bounding box. Invariant: `min <= max` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb2 {
    /// The whole plane, used by unbounded fields
    pub const INFINITE: Self = Self {
        min: DVec2::NEG_INFINITY,
        max: DVec2::INFINITY,
    };

    /// Create a box from two corners, in any order
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create from center and full size
    pub fn from_center_size(center: DVec2, size: DVec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// Smallest box containing all `points`, or `None` for an empty slice
    pub fn from_points(points: &[DVec2]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Self::new(first, first), |b, &p| {
            Self::new(b.min.min(p), b.max.max(p))
        }))
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Grow the box by `margin` on every side (shrinks for negative margins,
    /// collapsing to the center rather than inverting)
    pub fn expand(&self, margin: f64) -> Self {
        if !self.is_finite() {
            return *self;
        }
        let min = self.min - DVec2::splat(margin);
        let max = self.max + DVec2::splat(margin);
        let c = self.center();
        Self {
            min: min.min(c),
            max: max.max(c),
        }
    }

    /// Scale the box about its own center
    pub fn scale_about_center(&self, k: f64) -> Self {
        Self::from_center_size(self.center(), self.size() * k)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Overlap of two boxes. Disjoint boxes yield a degenerate box at the
    /// midpoint between them so the `min <= max` invariant holds.
    pub fn intersection(&self, other: &Self) -> Self {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        let mid = (min + max) * 0.5;
        Self {
            min: min.min(mid),
            max: max.max(mid),
        }
    }

    pub fn translate(&self, offset: DVec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }

    /// Bounds of the box after an affine map. Infinite boxes stay infinite.
    pub fn transform(&self, m: &DAffine2) -> Self {
        if !self.is_finite() {
            return Self::INFINITE;
        }
        let corners = self.corners().map(|c| m.transform_point2(c));
        Self::from_points(&corners).unwrap_or(*self)
    }
}

// ============================================================================
// 3D
// ============================================================================

/// Axis-aligned 3D bounding box. Invariant: `min <= max` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb3 {
    /// All of space, used by unbounded fields
    pub const INFINITE: Self = Self {
        min: DVec3::NEG_INFINITY,
        max: DVec3::INFINITY,
    };

    /// Create a box from two corners, in any order
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create from center and full size
    pub fn from_center_size(center: DVec3, size: DVec3) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// Smallest box containing all `points`, or `None` for an empty slice
    pub fn from_points(points: &[DVec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Self::new(first, first), |b, &p| {
            Self::new(b.min.min(p), b.max.max(p))
        }))
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Grow the box by `margin` on every side (shrinks for negative margins,
    /// collapsing to the center rather than inverting)
    pub fn expand(&self, margin: f64) -> Self {
        if !self.is_finite() {
            return *self;
        }
        let min = self.min - DVec3::splat(margin);
        let max = self.max + DVec3::splat(margin);
        let c = self.center();
        Self {
            min: min.min(c),
            max: max.max(c),
        }
    }

    /// Scale the box about its own center
    pub fn scale_about_center(&self, k: f64) -> Self {
        Self::from_center_size(self.center(), self.size() * k)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Overlap of two boxes. Disjoint boxes yield a degenerate box at the
    /// midpoint between them so the `min <= max` invariant holds.
    pub fn intersection(&self, other: &Self) -> Self {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        let mid = (min + max) * 0.5;
        Self {
            min: min.min(mid),
            max: max.max(mid),
        }
    }

    pub fn translate(&self, offset: DVec3) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(a.x, b.y, b.z),
            DVec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of the box after an affine map. Infinite boxes stay infinite.
    pub fn transform(&self, m: &DAffine3) -> Self {
        if !self.is_finite() {
            return Self::INFINITE;
        }
        let corners = self.corners().map(|c| m.transform_point3(c));
        Self::from_points(&corners).unwrap_or(*self)
    }

    /// Project onto the XY plane
    pub fn xy(&self) -> Aabb2 {
        Aabb2 {
            min: self.min.truncate(),
            max: self.max.truncate(),
        }
    }
}
