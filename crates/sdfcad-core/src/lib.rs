//! # sdfcad Core
//!
//! Solid modeling with signed distance fields.
//!
//! Shapes are trees of primitives and combinators that map a point to a
//! signed distance. They are turned into files by sampling: an adaptive
//! octree marching-cubes pass for 3D meshes (STL), a quadtree marching-squares
//! pass for 2D outlines (DXF, SVG), and a raster for PNG previews.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sdfcad_core::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> sdfcad_core::Result<()> {
//! // A rounded block with a bore
//! let block = cuboid(DVec3::new(30.0, 20.0, 10.0), 1.0)?
//!     .difference(cylinder(12.0, 4.0, 0.0)?);
//!
//! render_stl(&block, 200, Path::new("block.stl"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Units and Conventions
//!
//! - **Distances**: millimetres in every exporter
//! - **Angles**: radians
//! - **Precision**: `f64` throughout
//! - **Coordinate system**: right-handed, Z-up; 2D profiles live in the XY plane
//! - **Sign**: negative inside, zero on the surface, positive outside

pub mod bench;
pub mod blend;
pub mod contour;
pub mod eval;
pub mod export;
pub mod mesh;
pub mod render;
pub mod sdf2;
pub mod sdf3;

mod error;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    // Fields
    pub use crate::sdf2::{
        Bezier, CubicSpline, FillRule, Polygon, Sdf2, Sdf2Ext, Sdf2Node, Smoother, circle,
        half_plane, line, polygon, rectangle, regular_polygon,
    };
    pub use crate::sdf3::{
        Mesh3, Sdf3, Sdf3Ext, Sdf3Node, capsule, cone, cuboid, cylinder, loft, sphere, torus,
    };
    pub use crate::blend::Blend;

    // Extraction and output
    pub use crate::contour::{Contour, ContourSet};
    pub use crate::export::{ExportFormat, StlEncoding};
    pub use crate::mesh::Mesh;
    pub use crate::render::{
        ContourConfig, MeshConfig, PngConfig, ToContours, ToMesh, extract_contours, extract_mesh,
        render_dxf, render_png, render_stl, render_svg,
    };

    // Math
    pub use glam::{DAffine2, DAffine3, DQuat, DVec2, DVec3, UVec2, UVec3};
    pub use sdfcad_math::{Aabb2, Aabb3};

    // Error handling
    pub use crate::{Error, Result};
}
