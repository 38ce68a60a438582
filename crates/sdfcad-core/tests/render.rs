//! End-to-end rendering: fields in, files out

use approx::assert_relative_eq;
use sdfcad_core::export::{read_stl, read_stl_from};
use sdfcad_core::prelude::*;
use sdfcad_core::render::{extract_mesh_with_stats, render_stl_with};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sdfcad-it-{}-{name}", std::process::id()))
}

fn cube_config() -> MeshConfig {
    let b = Aabb3::new(DVec3::splat(-6.25), DVec3::splat(6.25));
    MeshConfig::default().with_resolution(50).with_bounds(b)
}

#[test]
fn lattice_aligned_cube_collapses_to_twelve_triangles() {
    let cube = cuboid(DVec3::splat(10.0), 0.0).unwrap();

    let raw = extract_mesh(&cube, &cube_config().with_simplify(false)).unwrap();
    // 40x40 quads on each face, degenerate edge triangles dropped
    assert_eq!(raw.triangle_count(), 6 * 40 * 40 * 2);
    raw.check_manifold().unwrap();
    assert_relative_eq!(raw.signed_volume(), 1000.0, epsilon = 1e-6);

    let simple = extract_mesh(&cube, &cube_config()).unwrap();
    assert_eq!(simple.triangle_count(), 12);
    assert_eq!(simple.vertex_count(), 8);
    simple.check_manifold().unwrap();
    assert_relative_eq!(simple.signed_volume(), 1000.0, epsilon = 1e-6);
    assert_relative_eq!(simple.surface_area(), 600.0, epsilon = 1e-6);
}

#[test]
fn sphere_renders_a_closed_outward_stl() {
    let path = temp_path("sphere.stl");
    let mesh = render_stl(&sphere(1.0).unwrap(), 16, &path).unwrap();
    assert!(!mesh.is_empty());
    mesh.check_manifold().unwrap();
    // inscribed polyhedron: a little below 4/3 pi
    let volume = mesh.signed_volume();
    assert!(volume > 3.6 && volume < 4.19, "volume {volume}");

    let read = read_stl(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(read.triangle_count(), mesh.triangle_count());
    read.check_manifold().unwrap();
    for v in &read.vertices {
        let nearest = mesh
            .vertices
            .iter()
            .map(|w| v.distance(*w))
            .fold(f64::INFINITY, f64::min);
        assert!(nearest < 1e-5);
    }
    assert!(read.signed_volume() > 0.0);
}

#[test]
fn cube_survives_an_stl_round_trip_exactly() {
    let cube = cuboid(DVec3::splat(10.0), 0.0).unwrap();
    let mesh = extract_mesh(&cube, &cube_config()).unwrap();

    for encoding in [StlEncoding::Binary, StlEncoding::Ascii] {
        let mut buf = Vec::new();
        sdfcad_core::export::write_stl_to(&mesh, &mut buf, encoding).unwrap();
        let read = read_stl_from(&buf).unwrap();
        assert_eq!(read.triangle_count(), 12);
        assert_eq!(read.vertex_count(), 8);
        let mut a = read.vertices.clone();
        let mut b = mesh.vertices.clone();
        let order = |p: &DVec3, q: &DVec3| p.to_array().partial_cmp(&q.to_array()).unwrap();
        a.sort_by(order);
        b.sort_by(order);
        assert_eq!(a, b);
    }
}

#[test]
fn stl_reads_back_as_a_solid() {
    let cube = cuboid(DVec3::splat(10.0), 0.0).unwrap();
    let mesh = extract_mesh(&cube, &cube_config()).unwrap();
    let mut buf = Vec::new();
    sdfcad_core::export::write_stl_to(&mesh, &mut buf, StlEncoding::Binary).unwrap();

    let solid = Mesh3::new(&read_stl_from(&buf).unwrap()).unwrap();
    for p in [
        DVec3::ZERO,
        DVec3::new(7.0, 1.0, -2.0),
        DVec3::new(4.0, -3.5, 4.5),
        DVec3::new(6.0, 6.0, 6.0),
    ] {
        assert_relative_eq!(solid.distance(p), cube.distance(p), epsilon = 1e-9);
    }

    // lattice off the faces so no sample sits on the surface
    let config = cube_config().with_resolution(21);
    let again = extract_mesh(&solid, &config).unwrap();
    again.check_manifold().unwrap();
    assert_relative_eq!(again.signed_volume(), 1000.0, max_relative = 1e-2);
}

#[test]
fn adaptive_mesh_matches_dense_mesh() {
    let part = sphere(3.0)
        .unwrap()
        .union(sphere(0.6).unwrap().translate(DVec3::new(3.3, 0.0, 0.0)));
    let config = MeshConfig::default()
        .with_resolution(48)
        .with_simplify(false)
        .with_strict(true);

    let (adaptive, a_stats) = extract_mesh_with_stats(&part, &config).unwrap();
    let (dense, d_stats) = extract_mesh_with_stats(&part, &config.with_adaptive(false)).unwrap();
    assert_eq!(adaptive.triangle_count(), dense.triangle_count());
    assert_eq!(adaptive.vertex_count(), dense.vertex_count());
    assert!(a_stats.evaluations < d_stats.evaluations);
    assert!(a_stats.pruned_cells > 0);
}

/// Every sweep mesh must come out the same with and without octree pruning
fn assert_pruning_is_lossless(name: &str, part: &Sdf3Node) {
    let config = MeshConfig::default()
        .with_resolution(40)
        .with_simplify(false)
        .with_strict(true);
    let (adaptive, a_stats) = extract_mesh_with_stats(part, &config).unwrap();
    let (dense, d_stats) = extract_mesh_with_stats(part, &config.with_adaptive(false)).unwrap();
    assert!(!dense.is_empty(), "{name}");
    assert_eq!(adaptive.triangle_count(), dense.triangle_count(), "{name}");
    assert_eq!(adaptive.vertex_count(), dense.vertex_count(), "{name}");
    adaptive.check_manifold().unwrap();
    assert!(a_stats.evaluations <= d_stats.evaluations, "{name}");
}

#[test]
fn adaptive_sweeps_match_dense_sweeps() {
    let disc = || circle(1.0).unwrap();
    let bar = || rectangle(DVec2::new(4.0, 0.5), 0.0).unwrap();
    let cases = [
        ("steep taper", disc().scale_extrude(2.0, DVec2::splat(0.05)).unwrap()),
        ("taper", disc().scale_extrude(2.0, DVec2::splat(0.5)).unwrap()),
        ("twist", bar().twist_extrude(2.0, 30.0).unwrap()),
        (
            "scale and twist",
            rectangle(DVec2::new(2.0, 1.0), 0.0)
                .unwrap()
                .scale_twist_extrude(3.0, std::f64::consts::PI, DVec2::splat(2.0))
                .unwrap(),
        ),
        (
            "loft",
            loft(disc().into_node(), circle(0.2).unwrap().into_node(), 0.5, 0.0).unwrap(),
        ),
        (
            "rounded loft",
            loft(
                circle(2.0).unwrap().into_node(),
                rectangle(DVec2::new(1.0, 2.0), 0.0).unwrap().into_node(),
                2.0,
                0.25,
            )
            .unwrap(),
        ),
        (
            "partial revolve",
            rectangle(DVec2::new(2.0, 1.0), 0.0)
                .unwrap()
                .translate(DVec2::new(2.0, 0.0))
                .revolve_theta(1.25 * std::f64::consts::PI)
                .unwrap(),
        ),
    ];
    for (name, part) in &cases {
        assert_pruning_is_lossless(name, part);
    }
}

#[test]
fn steep_taper_is_not_pruned_away() {
    let part = circle(1.0)
        .unwrap()
        .scale_extrude(2.0, DVec2::splat(0.05))
        .unwrap();
    let mesh = part
        .to_mesh(&MeshConfig::default().with_resolution(64).with_strict(true))
        .unwrap();
    // section radius is 1 / (1 + k (z + 1)) with k = (1 / 0.05 - 1) / 2
    let k = 9.5;
    let exact = std::f64::consts::PI / k * (1.0 - 0.05);
    assert_relative_eq!(mesh.signed_volume(), exact, max_relative = 0.1);
}

#[test]
fn lattice_aligned_thin_plate_is_manifold() {
    let plate = cuboid(DVec3::new(3.0, 3.0, 0.1), 0.0).unwrap();
    let bounds = Aabb3::new(DVec3::splat(-2.0), DVec3::splat(2.0));
    let config = MeshConfig::default()
        .with_resolution(16)
        .with_bounds(bounds)
        .with_strict(true);

    let raw = extract_mesh(&plate, &config.with_simplify(false)).unwrap();
    raw.check_manifold().unwrap();
    assert!(raw.signed_volume() > 0.5);

    let simple = extract_mesh(&plate, &config).unwrap();
    assert!(!simple.is_empty());
}

#[test]
fn thin_plate_with_default_bounds_is_sampled() {
    let plate = cuboid(DVec3::new(3.0, 3.0, 0.1), 0.0).unwrap();
    let mesh = plate
        .to_mesh(
            &MeshConfig::default()
                .with_resolution(16)
                .with_simplify(false)
                .with_strict(true),
        )
        .unwrap();
    assert!(!mesh.is_empty());
    mesh.check_manifold().unwrap();
    let b = mesh.bounds().unwrap();
    assert_relative_eq!(b.max.z, 0.05, epsilon = 1e-9);
    assert_relative_eq!(b.min.z, -0.05, epsilon = 1e-9);
}

#[test]
fn meshes_of_composite_parts_are_crack_free() {
    let block = cuboid(DVec3::new(6.0, 4.0, 2.0), 0.3).unwrap();
    let bore = cylinder(4.0, 1.0, 0.0).unwrap();
    let boss = capsule(3.0, 0.5).unwrap().translate(DVec3::new(2.0, 0.0, 0.5));
    let part = block.difference(bore).union(boss).rotate_z(0.3);
    let mesh = part
        .to_mesh(&MeshConfig::default().with_resolution(40).with_strict(true))
        .unwrap();
    mesh.check_manifold().unwrap();
    assert!(mesh.signed_volume() > 0.0);
}

#[test]
fn region_without_surface_gives_an_empty_file() {
    let path = temp_path("empty.stl");
    let far = Aabb3::new(DVec3::splat(10.0), DVec3::splat(11.0));
    let mesh = render_stl_with(
        &sphere(1.0).unwrap(),
        &path,
        &MeshConfig::default().with_resolution(8).with_bounds(far),
        StlEncoding::Binary,
    )
    .unwrap();
    assert!(mesh.is_empty());
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(bytes.len(), 84);
    assert_eq!(&bytes[80..84], &[0, 0, 0, 0]);
}

struct Poisoned;

impl Sdf3 for Poisoned {
    fn distance(&self, p: DVec3) -> f64 {
        if p.z > 0.5 { f64::NAN } else { p.length() - 1.0 }
    }

    fn bounds(&self) -> Aabb3 {
        Aabb3::new(DVec3::splat(-1.0), DVec3::splat(1.0))
    }
}

#[test]
fn non_finite_distance_aborts_and_keeps_the_old_file() {
    let path = temp_path("poisoned.stl");
    std::fs::write(&path, b"keep").unwrap();
    let err = render_stl(&Poisoned, 16, &path).unwrap_err();
    let kept = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, Error::Evaluation { .. }), "{err}");
    assert_eq!(kept, b"keep");
}

#[test]
fn unwritable_destination_is_an_io_error() {
    let path = temp_path("missing-dir").join("part.stl");
    let err = render_stl(&sphere(1.0).unwrap(), 8, &path).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
}

#[test]
fn overlapping_circles_form_one_loop() {
    let pair = |gap: f64| {
        circle(5.0)
            .unwrap()
            .union(circle(5.0).unwrap().translate(DVec2::new(gap, 0.0)))
    };
    let config = ContourConfig::default().with_resolution(120);

    let joined = pair(8.0).to_contours(&config).unwrap();
    assert_eq!(joined.len(), 1);
    assert_eq!(joined.outer_count(), 1);

    let apart = pair(12.0).to_contours(&config).unwrap();
    assert_eq!(apart.len(), 2);
    assert_eq!(apart.hole_count(), 0);
    let expected = 2.0 * std::f64::consts::PI * 25.0;
    assert_relative_eq!(apart.area(), expected, max_relative = 0.01);
}

#[test]
fn offset_in_and_out_restores_the_outline() {
    let plate = rectangle(DVec2::new(8.0, 5.0), 0.0).unwrap();
    let round_trip = rectangle(DVec2::new(8.0, 5.0), 0.0)
        .unwrap()
        .offset(1.0)
        .offset(-1.0);
    for &p in &[
        DVec2::new(4.0, 0.0),
        DVec2::new(3.9, 2.5),
        DVec2::new(0.0, 0.0),
        DVec2::new(5.0, 3.0),
    ] {
        assert_relative_eq!(round_trip.distance(p), plate.distance(p), epsilon = 1e-12);
    }

    let config = ContourConfig::default().with_resolution(80);
    let a = plate.to_contours(&config).unwrap();
    let b = round_trip.to_contours(&config).unwrap();
    assert_relative_eq!(a.area(), 40.0, max_relative = 0.01);
    assert_relative_eq!(a.area(), b.area(), max_relative = 1e-6);
}

#[test]
fn outline_files_are_written() {
    let washer = circle(10.0).unwrap().difference(circle(4.0).unwrap());

    let dxf = temp_path("washer.dxf");
    let contours = render_dxf(&washer, 100, &dxf).unwrap();
    assert_eq!(contours.outer_count(), 1);
    assert_eq!(contours.hole_count(), 1);
    assert!(contours.contains(DVec2::new(7.0, 0.0)));
    assert!(!contours.contains(DVec2::ZERO));
    let text = std::fs::read_to_string(&dxf).unwrap();
    std::fs::remove_file(&dxf).unwrap();
    assert_eq!(text.matches("POLYLINE").count(), 2);
    assert!(text.trim_end().ends_with("EOF"));

    let svg = temp_path("washer.svg");
    render_svg(&washer, 100, &svg).unwrap();
    let text = std::fs::read_to_string(&svg).unwrap();
    std::fs::remove_file(&svg).unwrap();
    assert!(text.starts_with("<?xml") || text.starts_with("<svg"));
    assert_eq!(text.matches("<path").count(), 1);
    assert_eq!(text.matches('Z').count(), 2);
}

#[test]
fn png_preview_is_written() {
    let path = temp_path("disc.png");
    let raster = render_png(&circle(2.0).unwrap(), &path).unwrap();
    assert_eq!((raster.width, raster.height), (512, 512));
    // center dark, corner light
    assert!(raster.get(256, 256) < 64);
    assert!(raster.get(0, 0) > 192);

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let decoded = image::load_from_memory(&bytes).unwrap().to_luma8();
    assert_eq!(decoded.dimensions(), (512, 512));
    assert_eq!(decoded.as_raw(), &raster.pixels);
}

#[test]
fn extruded_profile_meshes_like_the_solid() {
    let profile = rectangle(DVec2::new(4.0, 2.0), 0.0).unwrap();
    let slab = profile.extrude(1.0).unwrap();
    let mesh = slab
        .to_mesh(&MeshConfig::default().with_resolution(40).with_strict(true))
        .unwrap();
    assert_relative_eq!(mesh.signed_volume(), 8.0, max_relative = 0.02);
}
