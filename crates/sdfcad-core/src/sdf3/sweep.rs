//! Operators that move between dimensions: extrusions, lofts and revolutions
//! lift a 2D profile into 3D, slices cut a 2D section out of a 3D field.

use super::Sdf3;
use crate::error::{Error, Result, ensure};
use crate::sdf2::{Sdf2, Sdf2Node};
use glam::{DMat2, DVec2, DVec3};
use sdfcad_math::{Aabb2, Aabb3, blend::mix};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

fn check_height(height: f64) -> Result<()> {
    ensure(height > 0.0 && height.is_finite(), "height must be > 0")
}

fn check_round(height: f64, round: f64) -> Result<()> {
    ensure(round >= 0.0 && round.is_finite(), "round must be >= 0")?;
    ensure(height >= 2.0 * round, "height must be at least 2 * round")
}

/// Lift a 2D box to 3D between `-half` and `half` in Z
fn prism(b: Aabb2, half: f64) -> Aabb3 {
    Aabb3::new(b.min.extend(-half), b.max.extend(half))
}

/// Distance from the origin to the farthest corner of `b`
fn corner_radius(b: Aabb2) -> f64 {
    b.corners().iter().map(|c| c.length()).fold(0.0, f64::max)
}

/// Square in XY that contains `b` rotated by any angle about the origin
fn swept_square(b: Aabb2, half: f64) -> Aabb3 {
    let l = corner_radius(b);
    Aabb3::new(DVec3::new(-l, -l, -half), DVec3::new(l, l, half))
}

/// Signed distance to the rectangle `b`
fn box_distance(b: Aabb2, p: DVec2) -> f64 {
    let q = (p - b.center()).abs() - b.size() * 0.5;
    q.max(DVec2::ZERO).length() + q.max_element().min(0.0)
}

/// Combine a profile distance `a` with a slab distance `b` using a rounded
/// edge of radius `round`
fn rounded_slab(a: f64, b: f64, round: f64) -> f64 {
    let d = if b > 0.0 {
        if a < 0.0 { b } else { a.hypot(b) }
    } else if a < 0.0 {
        a.max(b)
    } else {
        a
    };
    d - round
}

// ============================================================================
// Extrude
// ============================================================================

/// How the profile is sampled at each height
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExtrudeKind {
    Straight,
    /// Section at height `z` is the profile scaled by `1 / (slope * z +
    /// intercept)` and then turned by `rate * z` radians
    Distorted {
        slope: DVec2,
        intercept: DVec2,
        rate: f64,
    },
}

/// Linear extrusion of a profile along Z, centered on the XY plane.
///
/// Straight extrusions are exact. Twisted and scaled variants stretch the
/// profile's field with height; their distance is divided by a Lipschitz
/// bound of that stretch over the cylinder holding the solid, and points
/// outside the cylinder are measured from its wall, so the result never
/// exceeds the distance to the surface.
pub struct Extrude<S: Sdf2> {
    profile: S,
    half: f64,
    kind: ExtrudeKind,
    // radius of a cylinder about Z holding the solid
    radius: f64,
    lipschitz: f64,
    bounds: Aabb3,
}

impl<S: Sdf2> Extrude<S> {
    pub fn new(profile: S, height: f64) -> Result<Self> {
        check_height(height)?;
        let half = height * 0.5;
        let bounds = prism(profile.bounds(), half);
        Ok(Self {
            profile,
            half,
            kind: ExtrudeKind::Straight,
            radius: f64::INFINITY,
            lipschitz: 1.0,
            bounds,
        })
    }

    /// Rotate the profile counter-clockwise by `twist` radians from bottom to
    /// top; the section at `z = 0` is unrotated
    pub fn twisted(profile: S, height: f64, twist: f64) -> Result<Self> {
        Self::distorted(profile, height, twist, DVec2::ONE)
    }

    /// Scale the profile from 1 at the bottom to `scale` at the top
    pub fn scaled(profile: S, height: f64, scale: DVec2) -> Result<Self> {
        Self::distorted(profile, height, 0.0, scale)
    }

    /// Scale, then twist, the profile over the height
    pub fn scaled_twisted(profile: S, height: f64, twist: f64, scale: DVec2) -> Result<Self> {
        Self::distorted(profile, height, twist, scale)
    }

    fn distorted(profile: S, height: f64, twist: f64, scale: DVec2) -> Result<Self> {
        check_height(height)?;
        ensure(twist.is_finite(), "twist must be finite")?;
        ensure(
            scale.is_finite() && scale.cmpgt(DVec2::ZERO).all(),
            "extrusion scale must be > 0",
        )?;
        let b = profile.bounds();
        ensure(b.is_finite(), "twisted or scaled extrusion needs a bounded profile")?;

        let half = height * 0.5;
        let rate = twist / height;
        // inverse scale runs linearly from 1 at -h/2 to 1/scale at h/2
        let inv = scale.recip();
        let slope = (inv - DVec2::ONE) / height;
        let intercept = inv * 0.5 + DVec2::splat(0.5);

        let section = b.union(&Aabb2::new(b.min * scale, b.max * scale));
        let radius = corner_radius(section);
        let stretch = inv.max_element().max(1.0);
        let lipschitz = stretch.hypot(radius * (rate.abs() * stretch + slope.abs().max_element()));
        let bounds = if twist == 0.0 {
            prism(section, half)
        } else {
            swept_square(section, half)
        };
        Ok(Self {
            profile,
            half,
            kind: ExtrudeKind::Distorted {
                slope,
                intercept,
                rate,
            },
            radius,
            lipschitz,
            bounds,
        })
    }
}

impl<S: Sdf2> Sdf3 for Extrude<S> {
    fn distance(&self, p: DVec3) -> f64 {
        let slab = p.z.abs() - self.half;
        let xy = p.truncate();
        let ExtrudeKind::Distorted {
            slope,
            intercept,
            rate,
        } = self.kind
        else {
            return self.profile.distance(xy).max(slab);
        };

        let r = xy.length();
        let wall = if r > self.radius {
            xy * (self.radius / r)
        } else {
            xy
        };
        let z = p.z.clamp(-self.half, self.half);
        let q = DMat2::from_angle(-z * rate) * (wall * (slope * z + intercept));
        let a = self.profile.distance(q) / self.lipschitz;
        a.max(r - self.radius).max(slab)
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

/// Straight extrusion with the top and bottom edges rounded
pub struct ExtrudeRounded<S: Sdf2> {
    profile: S,
    half: f64,
    round: f64,
}

impl<S: Sdf2> ExtrudeRounded<S> {
    pub fn new(profile: S, height: f64, round: f64) -> Result<Self> {
        check_height(height)?;
        check_round(height, round)?;
        Ok(Self {
            profile,
            half: height * 0.5 - round,
            round,
        })
    }
}

impl<S: Sdf2> Sdf3 for ExtrudeRounded<S> {
    fn distance(&self, p: DVec3) -> f64 {
        let a = self.profile.distance(p.truncate());
        rounded_slab(a, p.z.abs() - self.half, self.round)
    }

    fn bounds(&self) -> Aabb3 {
        prism(self.profile.bounds(), self.half).expand(self.round)
    }
}

// ============================================================================
// Loft
// ============================================================================

/// Extrusion that morphs from one profile at the bottom to another at the top.
///
/// The blend changes with height at a rate set by the gap between the two
/// profile fields, so the distance is divided by a bound on that rate.
pub struct Loft {
    bottom: Sdf2Node,
    top: Sdf2Node,
    half: f64,
    round: f64,
    // XY box holding the solid
    region: Aabb2,
    lipschitz: f64,
}

impl Loft {
    pub fn new(bottom: Sdf2Node, top: Sdf2Node, height: f64, round: f64) -> Result<Self> {
        check_height(height)?;
        check_round(height, round)?;
        let outline = bottom.bounds().union(&top.bounds());
        ensure(outline.is_finite(), "loft needs bounded profiles")?;
        let region = outline.expand(round);
        let half = height * 0.5 - round;
        let lipschitz = if half > 0.0 {
            1.0_f64.hypot(max_gap(&bottom, &top, region) * 0.5 / half)
        } else {
            1.0
        };
        Ok(Self {
            bottom,
            top,
            half,
            round,
            region,
            lipschitz,
        })
    }
}

/// Upper bound of `|top - bottom|` over `region`: the largest gap on a grid
/// of samples plus the most the 2-Lipschitz difference can grow between them
fn max_gap(bottom: &Sdf2Node, top: &Sdf2Node, region: Aabb2) -> f64 {
    const SAMPLES: u32 = 16;
    let step = region.size() / f64::from(SAMPLES);
    let mut gap = 0.0_f64;
    for i in 0..=SAMPLES {
        for j in 0..=SAMPLES {
            let p = region.min + step * DVec2::new(f64::from(i), f64::from(j));
            gap = gap.max((top.distance(p) - bottom.distance(p)).abs());
        }
    }
    gap + step.length()
}

impl Sdf3 for Loft {
    fn distance(&self, p: DVec3) -> f64 {
        let xy = p.truncate();
        let inside = xy.clamp(self.region.min, self.region.max);
        let k = if self.half > 0.0 {
            0.5 * p.z.clamp(-self.half, self.half) / self.half + 0.5
        } else {
            0.5
        };
        let a = mix(self.bottom.distance(inside), self.top.distance(inside), k);
        let d = rounded_slab(a, p.z.abs() - self.half, self.round) / self.lipschitz;
        d.max(box_distance(self.region, xy))
    }

    fn bounds(&self) -> Aabb3 {
        let b = self.region;
        Aabb3::new(
            b.min.extend(-self.half - self.round),
            b.max.extend(self.half + self.round),
        )
    }
}

// ============================================================================
// Revolve
// ============================================================================

/// Solid of revolution about Z. The profile's X is the radius and its Y the
/// height; only the `x >= 0` half of the profile matters.
pub struct Revolve<S: Sdf2> {
    profile: S,
    // zero means a full turn
    theta: f64,
    // normal of the closing plane at `theta`
    norm: DVec2,
    bounds: Aabb3,
}

impl<S: Sdf2> Revolve<S> {
    /// Revolve through `theta` radians from +X counter-clockwise. Zero (or
    /// any multiple of a full turn) revolves all the way round.
    pub fn new(profile: S, theta: f64) -> Result<Self> {
        ensure(theta >= 0.0 && theta.is_finite(), "revolve angle must be >= 0")?;
        let b = profile.bounds();
        ensure(b.is_finite(), "revolve needs a bounded profile")?;
        let theta = theta % TAU;
        let (sin, cos) = theta.sin_cos();
        let r = b.min.x.abs().max(b.max.x.abs());

        let xy = if theta == 0.0 {
            Aabb2::new(DVec2::splat(-r), DVec2::splat(r))
        } else {
            let mut pts = vec![DVec2::ZERO, DVec2::X, DVec2::new(cos, sin)];
            // axis directions swept past on the way round
            for (limit, dir) in [(FRAC_PI_2, DVec2::Y), (PI, -DVec2::X), (1.5 * PI, -DVec2::Y)] {
                if theta > limit {
                    pts.push(dir);
                }
            }
            let pts: Vec<DVec2> = pts.into_iter().map(|v| v * r).collect();
            Aabb2::from_points(&pts).ok_or_else(|| Error::parameter("empty revolve bounds"))?
        };
        Ok(Self {
            profile,
            theta,
            norm: DVec2::new(-sin, cos),
            bounds: Aabb3::new(xy.min.extend(b.min.y), xy.max.extend(b.max.y)),
        })
    }
}

impl<S: Sdf2> Sdf3 for Revolve<S> {
    fn distance(&self, p: DVec3) -> f64 {
        let xy = p.truncate();
        let a = self.profile.distance(DVec2::new(xy.length(), p.z));
        if self.theta == 0.0 {
            return a;
        }
        // wedge between the XZ plane and the plane at theta
        let d = self.norm.dot(xy);
        let wedge = if self.theta < PI {
            (-p.y).max(d)
        } else {
            (-p.y).min(d)
        };
        a.max(wedge)
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

// ============================================================================
// Slice
// ============================================================================

/// Planar cross-section of a 3D field.
///
/// The plane passes through `point` with unit `normal`; 2D coordinates are
/// measured along an in-plane basis `(u, v)` with `u x v = normal`. A Z
/// normal gives `u = X`, `v = Y`.
pub struct Slice<S: Sdf3> {
    inner: S,
    origin: DVec3,
    u: DVec3,
    v: DVec3,
    bounds: Aabb2,
}

impl<S: Sdf3> Slice<S> {
    pub fn new(inner: S, point: DVec3, normal: DVec3) -> Result<Self> {
        let n = normal
            .try_normalize()
            .ok_or_else(|| Error::parameter("slice normal must be non-zero"))?;
        let u = if n.z.abs() > 1.0 - 1e-9 {
            DVec3::X * n.z.signum()
        } else {
            DVec3::Z.cross(n).normalize()
        };
        let v = n.cross(u);

        let b3 = inner.bounds();
        let bounds = if b3.is_finite() {
            let projected: Vec<DVec2> = b3
                .corners()
                .iter()
                .map(|c| {
                    let d = *c - point;
                    DVec2::new(d.dot(u), d.dot(v))
                })
                .collect();
            Aabb2::from_points(&projected).unwrap_or(Aabb2::INFINITE)
        } else {
            Aabb2::INFINITE
        };
        Ok(Self {
            inner,
            origin: point,
            u,
            v,
            bounds,
        })
    }
}

impl<S: Sdf3> Sdf2 for Slice<S> {
    fn distance(&self, p: DVec2) -> f64 {
        self.inner.distance(self.origin + self.u * p.x + self.v * p.y)
    }

    fn bounds(&self) -> Aabb2 {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf2::{Sdf2Ext, circle, rectangle};
    use crate::sdf3::{Sdf3Ext, cylinder, loft, sphere};
    use approx::assert_relative_eq;

    #[test]
    fn extruded_circle_matches_cylinder() {
        let e = circle(1.0).unwrap().extrude(4.0).unwrap();
        let c = cylinder(4.0, 1.0, 0.0).unwrap();
        for p in [
            DVec3::new(0.5, 0.2, 1.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 3.0),
            DVec3::new(0.3, 0.3, -1.9),
        ] {
            assert_relative_eq!(e.distance(p), c.distance(p), epsilon = 1e-12);
        }
        assert_relative_eq!(e.bounds().max.z, 2.0);
        assert!(circle(1.0).unwrap().extrude(0.0).is_err());
    }

    #[test]
    fn twist_turns_the_profile_with_height() {
        let bar = rectangle(DVec2::new(4.0, 1.0), 0.0).unwrap();
        let t = bar.twist_extrude(2.0, FRAC_PI_2).unwrap();
        // the bar sits at -45 degrees at the bottom and +45 at the top
        assert!(t.distance(DVec3::new(1.2, -1.2, -0.99)) < 0.0);
        assert!(t.distance(DVec3::new(1.2, 1.2, -0.99)) > 0.0);
        assert!(t.distance(DVec3::new(1.2, 1.2, 0.99)) < 0.0);
        assert!(t.distance(DVec3::new(1.2, -1.2, 0.99)) > 0.0);
    }

    #[test]
    fn scale_extrude_narrows_toward_the_top() {
        let s = circle(1.0)
            .unwrap()
            .scale_extrude(2.0, DVec2::splat(0.5))
            .unwrap();
        assert_relative_eq!(s.distance(DVec3::new(1.0, 0.0, -1.0)), 0.0, epsilon = 1e-12);
        assert!(s.distance(DVec3::new(0.5, 0.0, 0.99)) < 0.01);
        assert!(s.distance(DVec3::new(0.9, 0.0, 0.99)) > 0.0);
        assert!(
            circle(1.0)
                .unwrap()
                .scale_extrude(2.0, DVec2::new(1.0, 0.0))
                .is_err()
        );
    }

    #[test]
    fn scale_twist_extrude_stays_inside_bounds() {
        let s = rectangle(DVec2::new(2.0, 1.0), 0.0)
            .unwrap()
            .scale_twist_extrude(3.0, PI, DVec2::splat(2.0))
            .unwrap();
        let b = s.bounds();
        assert!(b.max.x >= 5.0_f64.sqrt() - 1e-12);
        assert!(s.distance(DVec3::ZERO) < 0.0);
    }

    /// `|d(p) - d(q)| <= |p - q|` over near and far pairs around the bounds
    fn assert_one_lipschitz(field: &impl Sdf3) {
        let b = field.bounds().scale_about_center(1.5);
        let n = 12;
        let step = b.size() / f64::from(n);
        let mut points = Vec::new();
        for i in 0..=n {
            for j in 0..=n {
                for k in 0..=n {
                    let ijk = DVec3::new(f64::from(i), f64::from(j), f64::from(k));
                    points.push(b.min + step * ijk);
                }
            }
        }
        let nudge = step * DVec3::new(0.13, -0.07, 0.11);
        for (i, &p) in points.iter().enumerate() {
            let near = [p + nudge];
            for &q in near.iter().chain(points.iter().skip(i + 1).step_by(97)) {
                let gap = (field.distance(p) - field.distance(q)).abs();
                assert!(gap <= p.distance(q) * (1.0 + 1e-9), "{p} {q}");
            }
        }
    }

    #[test]
    fn distorted_sweeps_are_one_lipschitz() {
        let disc = || circle(1.0).unwrap();
        assert_one_lipschitz(&disc().scale_extrude(2.0, DVec2::splat(0.05)).unwrap());
        assert_one_lipschitz(&disc().scale_extrude(2.0, DVec2::new(0.5, 3.0)).unwrap());
        let bar = || rectangle(DVec2::new(4.0, 0.5), 0.0).unwrap();
        assert_one_lipschitz(&bar().twist_extrude(2.0, 30.0).unwrap());
        assert_one_lipschitz(&bar().scale_twist_extrude(3.0, -PI, DVec2::splat(2.0)).unwrap());
        let l = loft(
            circle(3.0).unwrap().into_node(),
            circle(0.2).unwrap().into_node(),
            0.5,
            0.0,
        )
        .unwrap();
        assert_one_lipschitz(&l);
        let rounded = loft(
            circle(2.0).unwrap().into_node(),
            rectangle(DVec2::new(1.0, 2.0), 0.0).unwrap().into_node(),
            2.0,
            0.25,
        )
        .unwrap();
        assert_one_lipschitz(&rounded);
    }

    #[test]
    fn steep_taper_stays_below_the_surface_distance() {
        let s = circle(1.0)
            .unwrap()
            .scale_extrude(2.0, DVec2::splat(0.05))
            .unwrap();
        // mid-height section has radius 1 / 10.5
        let rim = DVec3::new(1.0 / 10.5, 0.0, 0.0);
        assert!(s.distance(rim).abs() < 1e-12);
        for p in [
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 3.0, 0.5),
            DVec3::new(0.5, 0.5, -0.5),
        ] {
            assert!(s.distance(p) > 0.0);
            assert!(s.distance(p) <= p.distance(rim), "{p}");
        }
    }

    #[test]
    fn rounded_extrusion_keeps_height() {
        let e = rectangle(DVec2::splat(4.0), 0.0)
            .unwrap()
            .extrude_rounded(2.0, 0.25)
            .unwrap();
        assert_relative_eq!(e.distance(DVec3::new(0.0, 0.0, 1.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(e.distance(DVec3::new(2.25, 0.0, 0.0)), 0.0, epsilon = 1e-12);
        // edge is rounded off
        assert!(e.distance(DVec3::new(2.2, 0.0, 0.97)) > 0.0);
        assert!(rectangle(DVec2::ONE, 0.0).unwrap().extrude_rounded(1.0, 0.6).is_err());
    }

    #[test]
    fn loft_interpolates_profiles() {
        let l = loft(
            circle(2.0).unwrap().into_node(),
            circle(1.0).unwrap().into_node(),
            2.0,
            0.0,
        )
        .unwrap();
        assert_relative_eq!(l.distance(DVec3::new(2.0, 0.0, -1.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(l.distance(DVec3::new(1.0, 0.0, 1.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(l.distance(DVec3::new(1.5, 0.0, 0.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(l.bounds().max.x, 2.0);
    }

    #[test]
    fn revolved_circle_is_a_torus() {
        let t = circle(0.5)
            .unwrap()
            .translate(DVec2::new(2.0, 0.0))
            .revolve()
            .unwrap();
        assert_relative_eq!(t.distance(DVec3::new(0.0, 2.5, 0.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(t.distance(DVec3::new(-2.0, 0.0, 0.0)), -0.5, epsilon = 1e-12);
        let b = t.bounds();
        assert_relative_eq!(b.min.x, -2.5);
        assert_relative_eq!(b.max.z, 0.5);
    }

    #[test]
    fn partial_revolve_keeps_the_swept_wedge() {
        let profile = rectangle(DVec2::new(2.0, 1.0), 0.0)
            .unwrap()
            .translate(DVec2::new(2.0, 0.0));
        let quarter = profile.clone().revolve_theta(FRAC_PI_2).unwrap();
        assert!(quarter.distance(DVec3::new(1.4, 1.4, 0.0)) < 0.0);
        assert!(quarter.distance(DVec3::new(-1.4, 1.4, 0.0)) > 0.0);
        assert!(quarter.distance(DVec3::new(1.4, -1.4, 0.0)) > 0.0);
        let b = quarter.bounds();
        assert_relative_eq!(b.min.x, 0.0);
        assert_relative_eq!(b.max.y, 3.0, epsilon = 1e-12);

        let most = profile.revolve_theta(1.5 * PI).unwrap();
        assert!(most.distance(DVec3::new(-1.4, -1.4, 0.0)) < 0.0);
        assert!(most.distance(DVec3::new(1.4, -1.4, 0.0)) > 0.0);
        assert!(circle(1.0).unwrap().revolve_theta(-1.0).is_err());
    }

    #[test]
    fn slice_through_sphere_is_a_circle() {
        let s = sphere(2.0)
            .unwrap()
            .slice(DVec3::new(0.0, 0.0, 1.0), DVec3::Z)
            .unwrap();
        let r = 3.0_f64.sqrt();
        assert_relative_eq!(s.distance(DVec2::new(r, 0.0)), 0.0, epsilon = 1e-12);
        assert!(s.distance(DVec2::ZERO) < 0.0);

        let side = sphere(2.0).unwrap().slice(DVec3::ZERO, DVec3::X).unwrap();
        assert_relative_eq!(side.distance(DVec2::new(0.0, 2.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(side.bounds().max.y, 2.0, epsilon = 1e-12);
    }
}
