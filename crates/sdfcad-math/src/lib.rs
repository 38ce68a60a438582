//! sdfcad Math - bounding boxes, blend formulas and planar geometry
//!
//! This crate holds the small numeric building blocks shared by the field
//! algebra and the extractors in `sdfcad-core`:
//!
//! - [`Aabb2`] / [`Aabb3`]: axis-aligned bounds, possibly infinite
//! - [`blend`]: smooth minimum/maximum formulas used by blended booleans
//! - [`geometry`]: segment distances, winding numbers, polygon areas
//! - [`transform`]: distance-bound factors for affine maps
//!
//! # Example
//!
//! ```rust
//! use sdfcad_math::{Aabb3, blend};
//! use glam::DVec3;
//!
//! let b = Aabb3::from_center_size(DVec3::ZERO, DVec3::splat(2.0));
//! assert_eq!(b.max, DVec3::ONE);
//!
//! // A blended minimum never exceeds the hard minimum
//! assert!(blend::poly_min(1.0, 1.2, 0.5) <= 1.0);
//! ```

mod aabb;
pub mod blend;
pub mod geometry;
pub mod transform;

pub use aabb::{Aabb2, Aabb3};

/// sqrt(0.5), used by chamfer blends and diagonal cell extents
pub const SQRT_HALF: f64 = std::f64::consts::FRAC_1_SQRT_2;
