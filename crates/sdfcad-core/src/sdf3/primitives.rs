//! 3D primitive shapes
//!
//! Every primitive is centered on the origin with Z as its axis of symmetry.
//! Constructors validate their parameters; evaluation never fails.

use super::Sdf3;
use crate::error::{Result, ensure};
use crate::sdf2::box_distance;
use glam::{DVec2, DVec3};
use sdfcad_math::Aabb3;

// ============================================================================
// Constructor Functions
// ============================================================================

pub fn sphere(radius: f64) -> Result<Sphere> {
    Sphere::new(radius)
}

/// Box of full `size` with edges rounded by `round`
pub fn cuboid(size: DVec3, round: f64) -> Result<Cuboid> {
    Cuboid::new(size, round)
}

/// Cylinder along Z with edges rounded by `round`
pub fn cylinder(height: f64, radius: f64, round: f64) -> Result<Cylinder> {
    Cylinder::new(height, radius, round)
}

/// Cylinder with hemispherical ends; `height` is the total length
pub fn capsule(height: f64, radius: f64) -> Result<Cylinder> {
    Cylinder::new(height, radius, radius)
}

/// Truncated cone from radius `r0` at the bottom to `r1` at the top
pub fn cone(height: f64, r0: f64, r1: f64, round: f64) -> Result<Cone> {
    Cone::new(height, r0, r1, round)
}

/// Torus around Z: `major` is the ring radius, `minor` the tube radius
pub fn torus(major: f64, minor: f64) -> Result<Torus> {
    Torus::new(major, minor)
}

fn check_round(round: f64) -> Result<()> {
    ensure(round >= 0.0 && round.is_finite(), "round must be >= 0")
}

// ============================================================================
// Sphere
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub radius: f64,
}

impl Sphere {
    pub fn new(radius: f64) -> Result<Self> {
        ensure(radius > 0.0 && radius.is_finite(), "radius must be > 0")?;
        Ok(Self { radius })
    }
}

impl Sdf3 for Sphere {
    fn distance(&self, p: DVec3) -> f64 {
        p.length() - self.radius
    }

    fn bounds(&self) -> Aabb3 {
        Aabb3::from_center_size(DVec3::ZERO, DVec3::splat(2.0 * self.radius))
    }
}

// ============================================================================
// Cuboid
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Cuboid {
    half: DVec3,
    round: f64,
}

impl Cuboid {
    pub fn new(size: DVec3, round: f64) -> Result<Self> {
        ensure(
            size.is_finite() && size.cmpgt(DVec3::ZERO).all(),
            "box size must be > 0",
        )?;
        check_round(round)?;
        ensure(
            2.0 * round <= size.min_element(),
            "round must not exceed half the smallest side",
        )?;
        Ok(Self {
            half: size * 0.5,
            round,
        })
    }

    pub fn size(&self) -> DVec3 {
        self.half * 2.0
    }
}

impl Sdf3 for Cuboid {
    fn distance(&self, p: DVec3) -> f64 {
        let d = p.abs() - (self.half - DVec3::splat(self.round));
        d.max(DVec3::ZERO).length() + d.max_element().min(0.0) - self.round
    }

    fn bounds(&self) -> Aabb3 {
        Aabb3::new(-self.half, self.half)
    }
}

// ============================================================================
// Cylinder / Capsule
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Cylinder {
    half_height: f64,
    radius: f64,
    round: f64,
}

impl Cylinder {
    pub fn new(height: f64, radius: f64, round: f64) -> Result<Self> {
        ensure(radius > 0.0 && radius.is_finite(), "radius must be > 0")?;
        ensure(height > 0.0 && height.is_finite(), "height must be > 0")?;
        check_round(round)?;
        ensure(round <= radius, "round must not exceed the radius")?;
        ensure(height >= 2.0 * round, "height must be at least 2 * round")?;
        Ok(Self {
            half_height: height * 0.5,
            radius,
            round,
        })
    }
}

impl Sdf3 for Cylinder {
    fn distance(&self, p: DVec3) -> f64 {
        let q = DVec2::new(p.truncate().length(), p.z);
        let inner = DVec2::new(self.radius, self.half_height) - DVec2::splat(self.round);
        box_distance(q, inner) - self.round
    }

    fn bounds(&self) -> Aabb3 {
        let h = DVec3::new(self.radius, self.radius, self.half_height);
        Aabb3::new(-h, h)
    }
}

// ============================================================================
// Cone
// ============================================================================

/// Truncated cone, evaluated in the (radius, z) half plane
#[derive(Debug, Clone, Copy)]
pub struct Cone {
    r0: f64,
    r1: f64,
    // half height, inset by round
    height: f64,
    round: f64,
    // unit slope direction and its outward normal
    u: DVec2,
    n: DVec2,
    slope_length: f64,
    bounds: Aabb3,
}

impl Cone {
    pub fn new(height: f64, r0: f64, r1: f64, round: f64) -> Result<Self> {
        ensure(height > 0.0 && height.is_finite(), "height must be > 0")?;
        ensure(
            r0 >= 0.0 && r1 >= 0.0 && r0.is_finite() && r1.is_finite(),
            "cone radii must be >= 0",
        )?;
        ensure(r0 + r1 > 0.0, "cone needs a non-zero radius")?;
        check_round(round)?;
        ensure(height >= 2.0 * round, "height must be at least 2 * round")?;

        let half = height * 0.5;
        let u = (DVec2::new(r1, half) - DVec2::new(r0, -half)).normalize();
        let n = DVec2::new(u.y, -u.x);
        // pull the profile in so the rounded edge lands on the nominal shape
        let ofs = round / n.x;
        let r0i = r0 - (1.0 + n.y) * ofs;
        let r1i = r1 - (1.0 - n.y) * ofs;
        ensure(
            r0i >= 0.0 && r1i >= 0.0,
            "round is too large for the cone radii",
        )?;
        let h = half - round;
        let r = r0.max(r1);
        Ok(Self {
            r0: r0i,
            r1: r1i,
            height: h,
            round,
            u,
            n,
            slope_length: (DVec2::new(r1i, h) - DVec2::new(r0i, -h)).length(),
            bounds: Aabb3::new(DVec3::new(-r, -r, -half), DVec3::new(r, r, half)),
        })
    }
}

impl Sdf3 for Cone {
    fn distance(&self, p: DVec3) -> f64 {
        let q = DVec2::new(p.truncate().length(), p.z);
        if q.y >= self.height && q.x <= self.r1 {
            return q.y - self.height - self.round;
        }
        if q.y <= -self.height && q.x <= self.r0 {
            return -q.y - self.height - self.round;
        }
        let v = q - DVec2::new(self.r0, -self.height);
        let d_slope = v.dot(self.n);
        if d_slope < 0.0 && q.y.abs() < self.height {
            return -(-d_slope).min(self.height - q.y.abs()) - self.round;
        }
        let t = v.dot(self.u);
        if (0.0..=self.slope_length).contains(&t) {
            d_slope - self.round
        } else if t < 0.0 {
            v.length() - self.round
        } else {
            (q - DVec2::new(self.r1, self.height)).length() - self.round
        }
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

// ============================================================================
// Torus
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Torus {
    pub major: f64,
    pub minor: f64,
}

impl Torus {
    pub fn new(major: f64, minor: f64) -> Result<Self> {
        ensure(
            minor > 0.0 && minor.is_finite(),
            "torus tube radius must be > 0",
        )?;
        ensure(
            major > minor && major.is_finite(),
            "torus ring radius must exceed the tube radius",
        )?;
        Ok(Self { major, minor })
    }
}

impl Sdf3 for Torus {
    fn distance(&self, p: DVec3) -> f64 {
        DVec2::new(p.truncate().length() - self.major, p.z).length() - self.minor
    }

    fn bounds(&self) -> Aabb3 {
        let r = self.major + self.minor;
        Aabb3::new(
            DVec3::new(-r, -r, -self.minor),
            DVec3::new(r, r, self.minor),
        )
    }
}
