//! 3D signed distance fields
//!
//! Z is up. Primitives are centered on the origin; [`Sdf3Ext`] adds the
//! chainable booleans, transforms and repetition operators to every field.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sdfcad_core::prelude::*;
//!
//! let part = cuboid(DVec3::new(20.0, 20.0, 10.0), 1.0)?
//!     .difference(cylinder(12.0, 4.0, 0.0)?)
//!     .smooth_union(sphere(6.0)?.translate(DVec3::Z * 6.0), Blend::round(1.5)?);
//! ```

pub mod mesh3;
pub mod operations;
pub mod primitives;
pub mod sweep;
pub mod transforms;

use crate::Result;
use crate::blend::Blend;
use crate::sdf2::Sdf2Node;
use glam::{DAffine3, DQuat, DVec3, UVec3};
use sdfcad_math::Aabb3;
use std::fmt;
use std::sync::Arc;

/// A 3D signed distance field
pub trait Sdf3: Send + Sync {
    /// Signed distance from `p` to the surface: negative inside, positive outside.
    fn distance(&self, p: DVec3) -> f64;

    /// Box containing the zero set. Only explicitly unbounded fields return
    /// [`Aabb3::INFINITE`].
    fn bounds(&self) -> Aabb3;
}

/// A shared, type-erased 3D field
#[derive(Clone)]
pub struct Sdf3Node {
    inner: Arc<dyn Sdf3>,
}

impl Sdf3Node {
    pub fn new<S: Sdf3 + 'static>(sdf: S) -> Self {
        Self {
            inner: Arc::new(sdf),
        }
    }
}

impl Sdf3 for Sdf3Node {
    fn distance(&self, p: DVec3) -> f64 {
        self.inner.distance(p)
    }

    fn bounds(&self) -> Aabb3 {
        self.inner.bounds()
    }
}

impl fmt::Debug for Sdf3Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdf3Node")
            .field("bounds", &self.bounds())
            .finish_non_exhaustive()
    }
}

/// Union of any number of fields. Fails when `children` is empty.
pub fn union_all(children: Vec<Sdf3Node>, blend: Blend) -> Result<Sdf3Node> {
    Ok(Sdf3Node::new(operations::UnionAll3::new(children, blend)?))
}

/// Blend from profile `bottom` at `z = -height/2` to `top` at `z = height/2`
pub fn loft(bottom: Sdf2Node, top: Sdf2Node, height: f64, round: f64) -> Result<Sdf3Node> {
    Ok(Sdf3Node::new(sweep::Loft::new(bottom, top, height, round)?))
}

/// Extension trait providing chainable operations on 3D fields
pub trait Sdf3Ext: Sdf3 + Sized + 'static {
    fn into_node(self) -> Sdf3Node {
        Sdf3Node::new(self)
    }

    // === Boolean Operations ===

    fn union<S: Sdf3 + 'static>(self, other: S) -> Sdf3Node {
        Sdf3Node::new(operations::Union3::new(self, other, Blend::Hard))
    }

    /// Remove `other` from `self`
    fn difference<S: Sdf3 + 'static>(self, other: S) -> Sdf3Node {
        Sdf3Node::new(operations::Difference3::new(self, other, Blend::Hard))
    }

    fn intersection<S: Sdf3 + 'static>(self, other: S) -> Sdf3Node {
        Sdf3Node::new(operations::Intersection3::new(self, other, Blend::Hard))
    }

    fn smooth_union<S: Sdf3 + 'static>(self, other: S, blend: Blend) -> Sdf3Node {
        Sdf3Node::new(operations::Union3::new(self, other, blend))
    }

    fn smooth_difference<S: Sdf3 + 'static>(self, other: S, blend: Blend) -> Sdf3Node {
        Sdf3Node::new(operations::Difference3::new(self, other, blend))
    }

    fn smooth_intersection<S: Sdf3 + 'static>(self, other: S, blend: Blend) -> Sdf3Node {
        Sdf3Node::new(operations::Intersection3::new(self, other, blend))
    }

    // === Transforms ===

    fn translate(self, offset: DVec3) -> Sdf3Node {
        Sdf3Node::new(transforms::Translate3::new(self, offset))
    }

    /// Rotate about the X axis (radians)
    fn rotate_x(self, angle: f64) -> Sdf3Node {
        self.rotate(DQuat::from_rotation_x(angle))
    }

    /// Rotate about the Y axis (radians)
    fn rotate_y(self, angle: f64) -> Sdf3Node {
        self.rotate(DQuat::from_rotation_y(angle))
    }

    /// Rotate about the Z axis (radians)
    fn rotate_z(self, angle: f64) -> Sdf3Node {
        self.rotate(DQuat::from_rotation_z(angle))
    }

    fn rotate(self, rotation: DQuat) -> Sdf3Node {
        Sdf3Node::new(transforms::Transform3::rigid(
            self,
            DAffine3::from_quat(rotation.normalize()),
        ))
    }

    /// Uniform scale about the origin
    fn scale(self, factor: f64) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(transforms::ScaleUniform3::new(self, factor)?))
    }

    /// Arbitrary invertible affine map. Non-uniform scale and shear give a
    /// distance bound rather than an exact distance.
    fn transform(self, matrix: DAffine3) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(transforms::Transform3::new(self, matrix)?))
    }

    // === Modifiers ===

    /// Grow the shape by `distance` (shrink when negative)
    fn offset(self, distance: f64) -> Sdf3Node {
        Sdf3Node::new(operations::Offset3::new(self, distance))
    }

    /// Hollow shell of the given wall thickness centered on the surface
    fn shell(self, thickness: f64) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::Shell3::new(self, thickness)?))
    }

    /// Stretch the shape by inserting `size` at the origin along each axis
    fn elongate(self, size: DVec3) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::Elongate3::new(self, size)?))
    }

    /// Keep the half of the shape on the side `normal` points to
    fn cut(self, point: DVec3, normal: DVec3) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::Cut3::new(self, point, normal)?))
    }

    /// Cross-section through `point`, orthogonal to `normal`, as a 2D field
    fn slice(self, point: DVec3, normal: DVec3) -> Result<Sdf2Node> {
        Ok(Sdf2Node::new(sweep::Slice::new(self, point, normal)?))
    }

    // === Repetition ===

    /// `count.x * count.y * count.z` copies stepped by `step`
    fn array(self, count: UVec3, step: DVec3) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::Array3::new(self, count, step)?))
    }

    /// `count` copies about Z, each rotated by `step` radians from the previous one
    fn rotate_union(self, count: u32, step: f64) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::RotateUnion3::new(self, count, step)?))
    }

    /// `count` evenly spaced copies about Z, evaluated in O(1)
    fn rotate_copy(self, count: u32) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::RotateCopy3::new(self, count)?))
    }

    /// Infinite repetition; a zero spacing component leaves that axis alone
    fn repeat(self, spacing: DVec3) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::Repeat3::new(self, spacing)?))
    }

    /// Repetition limited to `2 * limit + 1` copies per axis, centered on the origin
    fn repeat_limited(self, spacing: DVec3, limit: UVec3) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::Repeat3::limited(
            self, spacing, limit,
        )?))
    }

    /// Union of copies placed at each of `positions`
    fn multi(self, positions: Vec<DVec3>) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::Multi3::new(self, positions)?))
    }

    /// Row of copies from `start` toward `end`, one step per pattern
    /// character; `x` places a copy, anything else leaves a gap
    fn line_of(self, start: DVec3, end: DVec3, pattern: &str) -> Result<Sdf3Node> {
        self.multi(operations::line_positions(start, end, pattern)?)
    }

    /// Union of copies rotated so that `base` points along each direction
    fn orient(self, base: DVec3, directions: &[DVec3]) -> Result<Sdf3Node> {
        Ok(Sdf3Node::new(operations::Orient3::new(self, base, directions)?))
    }
}

impl<T: Sdf3 + 'static> Sdf3Ext for T {}

pub use mesh3::Mesh3;
pub use operations::*;
pub use primitives::*;
pub use sweep::*;
pub use transforms::*;
