//! 2D signed distance fields
//!
//! Profiles live in the XY plane. They are rendered directly to DXF/SVG/PNG
//! or lifted into 3D with the extrusion and revolution operators.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sdfcad_core::prelude::*;
//!
//! // A plate with a hole, extruded to 3mm
//! let plate = rectangle(DVec2::new(40.0, 20.0), 2.0)?
//!     .difference(circle(4.0)?)
//!     .extrude(3.0)?;
//! ```

pub mod curves;
pub mod operations;
pub mod primitives;
pub mod transforms;

use crate::Result;
use crate::blend::Blend;
use crate::sdf3::{Sdf3Node, sweep};
use glam::{DAffine2, DVec2, UVec2};
use sdfcad_math::Aabb2;
use std::fmt;
use std::sync::Arc;

/// A 2D signed distance field
pub trait Sdf2: Send + Sync {
    /// Signed distance from `p` to the boundary: negative inside, positive outside.
    fn distance(&self, p: DVec2) -> f64;

    /// Box containing the zero set. Only explicitly unbounded fields return
    /// [`Aabb2::INFINITE`].
    fn bounds(&self) -> Aabb2;
}

/// A shared, type-erased 2D field
#[derive(Clone)]
pub struct Sdf2Node {
    inner: Arc<dyn Sdf2>,
}

impl Sdf2Node {
    pub fn new<S: Sdf2 + 'static>(sdf: S) -> Self {
        Self {
            inner: Arc::new(sdf),
        }
    }
}

impl Sdf2 for Sdf2Node {
    fn distance(&self, p: DVec2) -> f64 {
        self.inner.distance(p)
    }

    fn bounds(&self) -> Aabb2 {
        self.inner.bounds()
    }
}

impl fmt::Debug for Sdf2Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdf2Node")
            .field("bounds", &self.bounds())
            .finish_non_exhaustive()
    }
}

/// Union of any number of fields. Fails when `children` is empty.
pub fn union_all(children: Vec<Sdf2Node>, blend: Blend) -> Result<Sdf2Node> {
    Ok(Sdf2Node::new(operations::UnionAll2::new(children, blend)?))
}

/// Extension trait providing chainable operations on 2D fields
pub trait Sdf2Ext: Sdf2 + Sized + 'static {
    /// Erase the concrete type
    fn into_node(self) -> Sdf2Node {
        Sdf2Node::new(self)
    }

    // === Boolean Operations ===

    fn union<S: Sdf2 + 'static>(self, other: S) -> Sdf2Node {
        Sdf2Node::new(operations::Union2::new(self, other, Blend::Hard))
    }

    /// Remove `other` from `self`
    fn difference<S: Sdf2 + 'static>(self, other: S) -> Sdf2Node {
        Sdf2Node::new(operations::Difference2::new(self, other, Blend::Hard))
    }

    fn intersection<S: Sdf2 + 'static>(self, other: S) -> Sdf2Node {
        Sdf2Node::new(operations::Intersection2::new(self, other, Blend::Hard))
    }

    fn smooth_union<S: Sdf2 + 'static>(self, other: S, blend: Blend) -> Sdf2Node {
        Sdf2Node::new(operations::Union2::new(self, other, blend))
    }

    fn smooth_difference<S: Sdf2 + 'static>(self, other: S, blend: Blend) -> Sdf2Node {
        Sdf2Node::new(operations::Difference2::new(self, other, blend))
    }

    fn smooth_intersection<S: Sdf2 + 'static>(self, other: S, blend: Blend) -> Sdf2Node {
        Sdf2Node::new(operations::Intersection2::new(self, other, blend))
    }

    // === Transforms ===

    fn translate(self, offset: DVec2) -> Sdf2Node {
        Sdf2Node::new(transforms::Translate2::new(self, offset))
    }

    /// Rotate counter-clockwise about the origin (radians)
    fn rotate(self, angle: f64) -> Sdf2Node {
        Sdf2Node::new(transforms::Transform2::rigid(self, DAffine2::from_angle(angle)))
    }

    /// Uniform scale about the origin
    fn scale(self, factor: f64) -> Result<Sdf2Node> {
        Ok(Sdf2Node::new(transforms::ScaleUniform2::new(self, factor)?))
    }

    /// Arbitrary invertible affine map. Non-uniform scale and shear give a
    /// distance bound rather than an exact distance.
    fn transform(self, matrix: DAffine2) -> Result<Sdf2Node> {
        Ok(Sdf2Node::new(transforms::Transform2::new(self, matrix)?))
    }

    // === Modifiers ===

    /// Grow the shape by `distance` (shrink when negative)
    fn offset(self, distance: f64) -> Sdf2Node {
        Sdf2Node::new(operations::Offset2::new(self, distance))
    }

    /// Keep the half of the shape to the left of the line through `point`
    /// along `direction`
    fn cut(self, point: DVec2, direction: DVec2) -> Result<Sdf2Node> {
        Ok(Sdf2Node::new(operations::Cut2::new(self, point, direction)?))
    }

    // === Repetition ===

    /// `count.x * count.y` copies stepped by `step`
    fn array(self, count: UVec2, step: DVec2) -> Result<Sdf2Node> {
        Ok(Sdf2Node::new(operations::Array2::new(self, count, step)?))
    }

    /// `count` copies, each rotated by `step` radians from the previous one
    fn rotate_union(self, count: u32, step: f64) -> Result<Sdf2Node> {
        Ok(Sdf2Node::new(operations::RotateUnion2::new(self, count, step)?))
    }

    /// `count` evenly spaced copies about the origin, evaluated in O(1)
    fn rotate_copy(self, count: u32) -> Result<Sdf2Node> {
        Ok(Sdf2Node::new(operations::RotateCopy2::new(self, count)?))
    }

    /// Infinite repetition; a zero spacing component leaves that axis alone
    fn repeat(self, spacing: DVec2) -> Result<Sdf2Node> {
        Ok(Sdf2Node::new(operations::Repeat2::new(self, spacing)?))
    }

    // === Lifting into 3D ===

    /// Linear extrusion along Z, centered on the XY plane
    fn extrude(self, height: f64) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(sweep::Extrude::new(self, height)?))
    }

    /// Extrusion with edges rounded by `round`
    fn extrude_rounded(self, height: f64, round: f64) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(sweep::ExtrudeRounded::new(self, height, round)?))
    }

    /// Extrusion rotating the profile by `twist` radians over the height
    fn twist_extrude(self, height: f64, twist: f64) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(sweep::Extrude::twisted(self, height, twist)?))
    }

    /// Extrusion scaling the profile from 1 at the bottom to `scale` at the top
    fn scale_extrude(self, height: f64, scale: DVec2) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(sweep::Extrude::scaled(self, height, scale)?))
    }

    /// Extrusion that scales and then twists the profile
    fn scale_twist_extrude(self, height: f64, twist: f64, scale: DVec2) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(sweep::Extrude::scaled_twisted(
            self, height, twist, scale,
        )?))
    }

    /// Full revolution about the Z axis; profile X is the radius, Y the height
    fn revolve(self) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(sweep::Revolve::new(self, 0.0)?))
    }

    /// Partial revolution through `theta` radians starting at +X
    fn revolve_theta(self, theta: f64) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(sweep::Revolve::new(self, theta)?))
    }
}

impl<T: Sdf2 + 'static> Sdf2Ext for T {}

pub use curves::{Bezier, BezierVertex, CubicSpline, Smoother};
pub use operations::*;
pub use primitives::*;
pub use transforms::*;
