//! Extraction and rendering entry points
//!
//! The extractors sample fields on a lattice refined by an octree (3D) or a
//! quadtree (2D), skipping cells the distance value proves empty. Render
//! functions chain extraction with an encoder from [`crate::export`] and
//! write through a temporary file.

mod march2;
mod march3;
mod raster;
mod tables;

use crate::contour::ContourSet;
use crate::error::{Error, Result, ensure};
use crate::export::{self, Raster, StlEncoding};
use crate::mesh::Mesh;
use crate::sdf2::Sdf2;
use crate::sdf3::Sdf3;
use glam::{DVec2, DVec3};
use sdfcad_math::{Aabb2, Aabb3};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::path::Path;

/// Padding applied to a field's own bounds so the surface never lies on the
/// outer lattice faces
const BOUNDS_PADDING: f64 = 1.01;

/// Margin around a field's bounds for raster previews
const RASTER_PADDING: f64 = 1.1;

// ============================================================================
// Configuration
// ============================================================================

/// Options for 3D mesh extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Lattice cells across the longest axis of the bounds
    pub resolution: u32,
    /// Sampling box; the field's bounds padded by 1% when unset
    pub bounds: Option<Aabb3>,
    /// Skip octree cells the distance proves empty
    pub adaptive: bool,
    /// Fail instead of warning when the mesh is not manifold
    pub strict: bool,
    /// Merge coplanar triangle regions
    pub simplify: bool,
    /// Vertex weld distance; zero merges bit-identical positions only
    pub weld_epsilon: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            resolution: 200,
            bounds: None,
            adaptive: true,
            strict: false,
            simplify: true,
            weld_epsilon: 0.0,
        }
    }
}

impl MeshConfig {
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_bounds(mut self, bounds: Aabb3) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    pub fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.resolution >= 1, "resolution must be >= 1")?;
        ensure(
            self.weld_epsilon >= 0.0 && self.weld_epsilon.is_finite(),
            "weld epsilon must be finite and >= 0",
        )?;
        if let Some(b) = self.bounds {
            ensure(
                b.is_finite() && b.size().cmpgt(DVec3::ZERO).all(),
                "mesh bounds must be finite and non-empty",
            )?;
        }
        Ok(())
    }

    /// The box that will actually be sampled for `field`
    pub fn domain<S: Sdf3 + ?Sized>(&self, field: &S) -> Result<Aabb3> {
        if let Some(b) = self.bounds {
            return Ok(b);
        }
        let b = field.bounds();
        if !b.is_finite() {
            return Err(Error::parameter(
                "field is unbounded, explicit mesh bounds are required",
            ));
        }
        Ok(b.scale_about_center(BOUNDS_PADDING))
    }
}

/// Options for 2D contour extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    pub resolution: u32,
    pub bounds: Option<Aabb2>,
    pub adaptive: bool,
    /// Drop vertices on straight runs
    pub simplify: bool,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            resolution: 200,
            bounds: None,
            adaptive: true,
            simplify: true,
        }
    }
}

impl ContourConfig {
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_bounds(mut self, bounds: Aabb2) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.resolution >= 1, "resolution must be >= 1")?;
        if let Some(b) = self.bounds {
            ensure(
                b.is_finite() && b.size().cmpgt(DVec2::ZERO).all(),
                "contour bounds must be finite and non-empty",
            )?;
        }
        Ok(())
    }

    pub fn domain<S: Sdf2 + ?Sized>(&self, field: &S) -> Result<Aabb2> {
        if let Some(b) = self.bounds {
            return Ok(b);
        }
        let b = field.bounds();
        if !b.is_finite() {
            return Err(Error::parameter(
                "field is unbounded, explicit contour bounds are required",
            ));
        }
        Ok(b.scale_about_center(BOUNDS_PADDING))
    }
}

/// Options for PNG distance rasters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PngConfig {
    /// Pixels along the longer side
    pub pixels: u32,
    /// Area to draw; the field's bounds plus 10% when unset
    pub bounds: Option<Aabb2>,
    /// Fixed `(min, max)` distances for black and white; taken from the
    /// samples when unset
    pub range: Option<(f64, f64)>,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            pixels: 512,
            bounds: None,
            range: None,
        }
    }
}

impl PngConfig {
    pub fn with_pixels(mut self, pixels: u32) -> Self {
        self.pixels = pixels;
        self
    }

    pub fn with_bounds(mut self, bounds: Aabb2) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.pixels >= 1, "pixel count must be >= 1")?;
        if let Some((lo, hi)) = self.range {
            ensure(lo < 0.0 && hi > 0.0, "distance range must straddle zero")?;
        }
        if let Some(b) = self.bounds {
            ensure(
                b.is_finite() && b.size().cmpgt(DVec2::ZERO).all(),
                "image bounds must be finite and non-empty",
            )?;
        }
        Ok(())
    }

    pub fn domain<S: Sdf2 + ?Sized>(&self, field: &S) -> Result<Aabb2> {
        if let Some(b) = self.bounds {
            return Ok(b);
        }
        let b = field.bounds();
        if !b.is_finite() {
            return Err(Error::parameter(
                "field is unbounded, explicit image bounds are required",
            ));
        }
        Ok(b.scale_about_center(RASTER_PADDING))
    }
}

/// Counters gathered during an extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Field evaluations, including tree cell centers
    pub evaluations: usize,
    /// Tree cells discarded by the distance test
    pub pruned_cells: usize,
    /// Lattice cells that produced geometry
    pub leaf_cells: usize,
}

impl AddAssign for ExtractStats {
    fn add_assign(&mut self, rhs: Self) {
        self.evaluations += rhs.evaluations;
        self.pruned_cells += rhs.pruned_cells;
        self.leaf_cells += rhs.leaf_cells;
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Extract a closed triangle mesh of the zero set of `field`
pub fn extract_mesh<S: Sdf3 + ?Sized>(field: &S, config: &MeshConfig) -> Result<Mesh> {
    extract_mesh_with_stats(field, config).map(|(mesh, _)| mesh)
}

/// [`extract_mesh`] that also reports extraction counters
pub fn extract_mesh_with_stats<S: Sdf3 + ?Sized>(
    field: &S,
    config: &MeshConfig,
) -> Result<(Mesh, ExtractStats)> {
    config.validate()?;
    let bounds = config.domain(field)?;
    let (soup, stats) = march3::march3(field, bounds, config.resolution, config.adaptive)?;
    let mut mesh = Mesh::from_soup(&soup, config.weld_epsilon);
    mesh.split_non_manifold();

    let report = mesh.edge_report();
    if report.is_manifold() {
        if config.simplify {
            mesh.collapse_coplanar();
        }
    } else if config.strict {
        mesh.check_manifold()?;
    } else {
        tracing::warn!(
            boundary = report.boundary_edges,
            overshared = report.overshared_edges,
            misoriented = report.misoriented_edges,
            "extracted mesh is not manifold"
        );
    }
    Ok((mesh, stats))
}

/// Extract the closed contours of the zero set of `field`
pub fn extract_contours<S: Sdf2 + ?Sized>(field: &S, config: &ContourConfig) -> Result<ContourSet> {
    extract_contours_with_stats(field, config).map(|(set, _)| set)
}

/// [`extract_contours`] that also reports extraction counters
pub fn extract_contours_with_stats<S: Sdf2 + ?Sized>(
    field: &S,
    config: &ContourConfig,
) -> Result<(ContourSet, ExtractStats)> {
    config.validate()?;
    let bounds = config.domain(field)?;
    let (segments, stats) = march2::march2(field, bounds, config.resolution, config.adaptive)?;
    Ok((ContourSet::from_segments(&segments, config.simplify), stats))
}

/// Sample `field` into a grayscale raster
pub fn rasterize<S: Sdf2 + ?Sized>(field: &S, config: &PngConfig) -> Result<Raster> {
    config.validate()?;
    let bounds = config.domain(field)?;
    raster::rasterize(field, bounds, config)
}

/// Extension trait for meshing 3D fields
pub trait ToMesh {
    fn to_mesh(&self, config: &MeshConfig) -> Result<Mesh>;
}

impl<S: Sdf3 + ?Sized> ToMesh for S {
    fn to_mesh(&self, config: &MeshConfig) -> Result<Mesh> {
        extract_mesh(self, config)
    }
}

/// Extension trait for contouring 2D fields
pub trait ToContours {
    fn to_contours(&self, config: &ContourConfig) -> Result<ContourSet>;
}

impl<S: Sdf2 + ?Sized> ToContours for S {
    fn to_contours(&self, config: &ContourConfig) -> Result<ContourSet> {
        extract_contours(self, config)
    }
}

// ============================================================================
// Render Entry Points
// ============================================================================

/// Mesh `field` with `resolution` cells on the longest axis and write a binary STL
pub fn render_stl<S: Sdf3 + ?Sized>(field: &S, resolution: u32, path: &Path) -> Result<Mesh> {
    render_stl_with(
        field,
        path,
        &MeshConfig::default().with_resolution(resolution),
        StlEncoding::Binary,
    )
}

/// Mesh `field` and write it as STL
pub fn render_stl_with<S: Sdf3 + ?Sized>(
    field: &S,
    path: &Path,
    config: &MeshConfig,
    encoding: StlEncoding,
) -> Result<Mesh> {
    config.validate()?;
    let bounds = config.domain(field)?;
    let cells = march3::Lattice3::new(bounds, config.resolution).cells;
    tracing::info!(
        "rendering {} ({}x{}x{}, resolution {})",
        path.display(),
        cells.x,
        cells.y,
        cells.z,
        config.resolution
    );
    let mesh = extract_mesh(field, config)?;
    export::write_stl(&mesh, path, encoding)?;
    tracing::info!(
        triangles = mesh.triangle_count(),
        vertices = mesh.vertex_count(),
        "wrote {}",
        path.display()
    );
    Ok(mesh)
}

/// Contour `field` with `resolution` cells on the longest axis and write a DXF
pub fn render_dxf<S: Sdf2 + ?Sized>(field: &S, resolution: u32, path: &Path) -> Result<ContourSet> {
    render_dxf_with(field, path, &ContourConfig::default().with_resolution(resolution))
}

pub fn render_dxf_with<S: Sdf2 + ?Sized>(
    field: &S,
    path: &Path,
    config: &ContourConfig,
) -> Result<ContourSet> {
    let contours = contours_for(field, path, config)?;
    export::write_dxf(&contours, path)?;
    log_contours(&contours, path);
    Ok(contours)
}

/// Contour `field` and write an SVG outline
pub fn render_svg<S: Sdf2 + ?Sized>(field: &S, resolution: u32, path: &Path) -> Result<ContourSet> {
    render_svg_with(field, path, &ContourConfig::default().with_resolution(resolution))
}

pub fn render_svg_with<S: Sdf2 + ?Sized>(
    field: &S,
    path: &Path,
    config: &ContourConfig,
) -> Result<ContourSet> {
    let contours = contours_for(field, path, config)?;
    export::write_svg(&contours, path)?;
    log_contours(&contours, path);
    Ok(contours)
}

/// Write a grayscale distance preview of `field`
pub fn render_png<S: Sdf2 + ?Sized>(field: &S, path: &Path) -> Result<Raster> {
    render_png_with(field, path, &PngConfig::default())
}

pub fn render_png_with<S: Sdf2 + ?Sized>(
    field: &S,
    path: &Path,
    config: &PngConfig,
) -> Result<Raster> {
    let raster = rasterize(field, config)?;
    tracing::info!(
        "rendering {} ({}x{} pixels)",
        path.display(),
        raster.width,
        raster.height
    );
    export::write_png(&raster, path)?;
    Ok(raster)
}

fn contours_for<S: Sdf2 + ?Sized>(
    field: &S,
    path: &Path,
    config: &ContourConfig,
) -> Result<ContourSet> {
    config.validate()?;
    let bounds = config.domain(field)?;
    let cells = march2::Lattice2::new(bounds, config.resolution).cells;
    tracing::info!(
        "rendering {} ({}x{}, resolution {})",
        path.display(),
        cells.x,
        cells.y,
        config.resolution
    );
    extract_contours(field, config)
}

fn log_contours(contours: &ContourSet, path: &Path) {
    tracing::info!(
        contours = contours.len(),
        holes = contours.hole_count(),
        points = contours.point_count(),
        "wrote {}",
        path.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf2::{Sdf2Ext, circle, half_plane};
    use crate::sdf3::{Sdf3Ext, cuboid, sphere};
    use approx::assert_relative_eq;
    use glam::{DVec2, DVec3};

    #[test]
    fn config_defaults_and_builders() {
        let c = MeshConfig::default();
        assert_eq!(c.resolution, 200);
        assert!(c.adaptive && c.simplify && !c.strict);

        let c = MeshConfig::default()
            .with_resolution(10)
            .with_strict(true)
            .with_simplify(false);
        assert_eq!(c.resolution, 10);
        assert!(c.strict && !c.simplify);
        assert_eq!(PngConfig::default().pixels, 512);
    }

    #[test]
    fn configs_load_from_partial_json() {
        let c: MeshConfig = serde_json::from_str(r#"{"resolution": 64, "strict": true}"#).unwrap();
        assert_eq!(c.resolution, 64);
        assert!(c.strict);
        assert!(c.simplify);
        assert_eq!(c.bounds, None);

        let p: PngConfig = serde_json::from_str(r#"{"range": [-2.0, 3.0]}"#).unwrap();
        assert_eq!(p.range, Some((-2.0, 3.0)));
        assert_eq!(p.pixels, 512);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let s = sphere(1.0).unwrap();
        let zero = MeshConfig::default().with_resolution(0);
        assert!(matches!(extract_mesh(&s, &zero), Err(Error::Parameter(_))));

        let flat = MeshConfig::default().with_bounds(Aabb3::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0)));
        assert!(matches!(extract_mesh(&s, &flat), Err(Error::Parameter(_))));

        let png = PngConfig::default().with_range(1.0, 2.0);
        assert!(png.validate().is_err());
    }

    #[test]
    fn unbounded_fields_need_explicit_bounds() {
        let h = half_plane(DVec2::ZERO, DVec2::Y).unwrap();
        assert!(matches!(
            extract_contours(&h, &ContourConfig::default()),
            Err(Error::Parameter(_))
        ));
        let bounded = ContourConfig::default()
            .with_resolution(8)
            .with_bounds(Aabb2::new(DVec2::splat(-1.0), DVec2::splat(1.0)));
        // the cut runs along the frame edge, so the chain is open and dropped
        assert!(extract_contours(&h, &bounded).is_ok());
    }

    #[test]
    fn sphere_mesh_is_closed_with_the_right_volume() {
        let s = sphere(1.0).unwrap();
        let m = extract_mesh(&s, &MeshConfig::default().with_resolution(48)).unwrap();
        assert!(m.check_manifold().is_ok());
        let exact = 4.0 / 3.0 * std::f64::consts::PI;
        assert_relative_eq!(m.signed_volume(), exact, max_relative = 0.02);
        for v in &m.vertices {
            assert_relative_eq!(v.length(), 1.0, epsilon = 0.01);
        }
    }

    #[test]
    fn empty_region_gives_an_empty_mesh() {
        let s = sphere(1.0).unwrap();
        let far = Aabb3::new(DVec3::splat(5.0), DVec3::splat(6.0));
        let m = extract_mesh(&s, &MeshConfig::default().with_resolution(8).with_bounds(far)).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn simplify_reduces_flat_faces() {
        let c = cuboid(DVec3::new(2.0, 2.0, 2.0), 0.0).unwrap();
        let bounds = Aabb3::new(DVec3::splat(-1.5), DVec3::splat(1.5));
        let dense = MeshConfig::default()
            .with_resolution(12)
            .with_bounds(bounds)
            .with_simplify(false);
        let raw = extract_mesh(&c, &dense).unwrap();
        let merged = extract_mesh(&c, &dense.with_simplify(true)).unwrap();
        assert_eq!(merged.triangle_count(), 12);
        assert!(raw.triangle_count() > merged.triangle_count());
        assert_relative_eq!(raw.signed_volume(), merged.signed_volume(), epsilon = 1e-9);
    }

    #[test]
    fn ring_has_one_outer_loop_and_one_hole() {
        let ring = circle(2.0)
            .unwrap()
            .difference(circle(1.0).unwrap());
        let set = extract_contours(&ring, &ContourConfig::default().with_resolution(64)).unwrap();
        assert_eq!(set.outer_count(), 1);
        assert_eq!(set.hole_count(), 1);
        let exact = std::f64::consts::PI * (4.0 - 1.0);
        assert_relative_eq!(set.area(), exact, max_relative = 0.01);
        assert!(set.contains(DVec2::new(1.5, 0.0)));
        assert!(!set.contains(DVec2::ZERO));
    }

    #[test]
    fn rotated_field_meshes_like_the_original() {
        let c = cuboid(DVec3::new(2.0, 1.0, 1.0), 0.1).unwrap();
        let config = MeshConfig::default().with_resolution(32);
        let a = extract_mesh(&c, &config).unwrap();
        let b = extract_mesh(&c.rotate_z(0.3), &config).unwrap();
        assert!(b.check_manifold().is_ok());
        assert_relative_eq!(a.signed_volume(), b.signed_volume(), max_relative = 0.03);
    }
}
