//! STL (stereolithography) output and read-back
//!
//! Binary layout:
//! - 80 bytes: header, never starting with `solid`
//! - 4 bytes: triangle count (u32 little-endian)
//! - per triangle, 50 bytes: normal (3 x f32), 3 vertices (9 x f32), 2 attribute bytes
//!
//! Coordinates are stored as f32 in both encodings. The reader welds
//! bit-identical positions back into an indexed [`Mesh`].

use super::write_atomic;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

const HEADER: &[u8] = b"sdfcad binary STL";

/// STL flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlEncoding {
    #[default]
    Binary,
    Ascii,
}

/// Write `mesh` to `path` atomically
pub fn write_stl(mesh: &Mesh, path: &Path, encoding: StlEncoding) -> Result<()> {
    write_atomic(path, |w| write_stl_to(mesh, w, encoding))
}

/// Write `mesh` as STL into any writer
pub fn write_stl_to(mesh: &Mesh, w: &mut dyn Write, encoding: StlEncoding) -> Result<()> {
    match encoding {
        StlEncoding::Binary => write_binary(mesh, w),
        StlEncoding::Ascii => write_ascii(mesh, w),
    }
}

fn write_binary(mesh: &Mesh, w: &mut dyn Write) -> Result<()> {
    let mut header = [b' '; 80];
    header[..HEADER.len()].copy_from_slice(HEADER);
    w.write_all(&header)?;

    let count = u32::try_from(mesh.triangle_count())
        .map_err(|_| Error::Format("too many triangles for binary STL".into()))?;
    w.write_all(&count.to_le_bytes())?;

    let mut record = [0_u8; 50];
    for i in 0..mesh.triangle_count() {
        let normal = mesh.face_normal(i).as_vec3();
        let [a, b, c] = mesh.triangle(i);
        let values = [normal, a.as_vec3(), b.as_vec3(), c.as_vec3()];
        for (k, v) in values.iter().flat_map(|v| v.to_array()).enumerate() {
            record[k * 4..k * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
        w.write_all(&record)?;
    }
    Ok(())
}

fn write_ascii(mesh: &Mesh, w: &mut dyn Write) -> Result<()> {
    writeln!(w, "solid sdfcad")?;
    for i in 0..mesh.triangle_count() {
        let n = mesh.face_normal(i).as_vec3();
        writeln!(w, "  facet normal {} {} {}", n.x, n.y, n.z)?;
        writeln!(w, "    outer loop")?;
        for v in mesh.triangle(i) {
            let v = v.as_vec3();
            writeln!(w, "      vertex {} {} {}", v.x, v.y, v.z)?;
        }
        writeln!(w, "    endloop")?;
        writeln!(w, "  endfacet")?;
    }
    writeln!(w, "endsolid sdfcad")?;
    Ok(())
}

/// Read an STL file, detecting the encoding
pub fn read_stl(path: &Path) -> Result<Mesh> {
    let data = std::fs::read(path)?;
    read_stl_from(&data)
}

/// Parse STL bytes, detecting the encoding.
///
/// A buffer whose length matches its binary triangle count is binary even
/// when the header happens to start with `solid`.
pub fn read_stl_from(data: &[u8]) -> Result<Mesh> {
    if data.len() >= 84 {
        let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
        if count.checked_mul(50).and_then(|n| n.checked_add(84)) == Some(data.len()) {
            return read_binary(data, count);
        }
    }
    if data.starts_with(b"solid") {
        return read_ascii(data);
    }
    Err(Error::Format(format!(
        "not an STL file ({} bytes, no ascii header and no consistent binary length)",
        data.len()
    )))
}

fn read_binary(data: &[u8], count: usize) -> Result<Mesh> {
    let read_f32 = |offset: usize| {
        f32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    };
    let read_vec = |offset: usize| {
        Vec3::new(read_f32(offset), read_f32(offset + 4), read_f32(offset + 8)).as_dvec3()
    };

    let soup: Vec<[DVec3; 3]> = (0..count)
        .map(|t| {
            let base = 84 + t * 50 + 12;
            [read_vec(base), read_vec(base + 12), read_vec(base + 24)]
        })
        .collect();
    Ok(Mesh::from_soup(&soup, 0.0))
}

fn read_ascii(data: &[u8]) -> Result<Mesh> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::Format(format!("ascii STL is not UTF-8: {e}")))?;

    let mut soup = Vec::new();
    let mut corners: Vec<DVec3> = Vec::with_capacity(3);
    for (n, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("vertex") => {
                let mut xyz = [0.0_f32; 3];
                for slot in &mut xyz {
                    *slot = words
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| Error::Format(format!("line {}: bad vertex", n + 1)))?;
                }
                corners.push(Vec3::from_array(xyz).as_dvec3());
            }
            Some("endloop") => {
                let [a, b, c] = corners[..] else {
                    return Err(Error::Format(format!(
                        "line {}: facet has {} vertices",
                        n + 1,
                        corners.len()
                    )));
                };
                soup.push([a, b, c]);
                corners.clear();
            }
            _ => {}
        }
    }
    Ok(Mesh::from_soup(&soup, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::unit_cube;

    fn sorted_vertices(m: &Mesh) -> Vec<[f64; 3]> {
        let mut v: Vec<[f64; 3]> = m.vertices.iter().map(|p| p.to_array()).collect();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        v
    }

    fn encode(mesh: &Mesh, encoding: StlEncoding) -> Vec<u8> {
        let mut buf = Vec::new();
        write_stl_to(mesh, &mut buf, encoding).unwrap();
        buf
    }

    #[test]
    fn binary_size_is_fixed_per_triangle() {
        let buf = encode(&unit_cube(), StlEncoding::Binary);
        assert_eq!(buf.len(), 80 + 4 + 50 * 12);
        assert!(!buf.starts_with(b"solid"));
    }

    #[test]
    fn binary_round_trip_keeps_vertex_set() {
        let cube = unit_cube();
        let back = read_stl_from(&encode(&cube, StlEncoding::Binary)).unwrap();
        assert_eq!(back.triangle_count(), 12);
        assert_eq!(sorted_vertices(&back), sorted_vertices(&cube));
        assert!(back.check_manifold().is_ok());
        assert!(back.signed_volume() > 0.0);
    }

    #[test]
    fn ascii_round_trip_keeps_vertex_set() {
        let cube = unit_cube();
        let buf = encode(&cube, StlEncoding::Ascii);
        assert!(buf.starts_with(b"solid sdfcad"));
        let back = read_stl_from(&buf).unwrap();
        assert_eq!(back.triangle_count(), 12);
        assert_eq!(sorted_vertices(&back), sorted_vertices(&cube));
    }

    #[test]
    fn stored_normals_face_outward() {
        let buf = encode(&unit_cube(), StlEncoding::Binary);
        for t in 0..12 {
            let base = 84 + t * 50;
            let f = |o: usize| f32::from_le_bytes(buf[base + o..base + o + 4].try_into().unwrap());
            let n = Vec3::new(f(0), f(4), f(8));
            let centroid = (Vec3::new(f(12), f(16), f(20))
                + Vec3::new(f(24), f(28), f(32))
                + Vec3::new(f(36), f(40), f(44)))
                / 3.0;
            assert!(n.dot(centroid - Vec3::splat(0.5)) > 0.0);
        }
    }

    #[test]
    fn malformed_input_is_a_format_error() {
        assert!(matches!(read_stl_from(b"hello"), Err(Error::Format(_))));

        let mut truncated = encode(&unit_cube(), StlEncoding::Binary);
        truncated.truncate(300);
        assert!(matches!(read_stl_from(&truncated), Err(Error::Format(_))));

        let bad = b"solid x\n facet normal 0 0 1\n outer loop\n vertex 0 0 0\n vertex 1 0 0\n endloop\n";
        assert!(matches!(read_stl_from(bad), Err(Error::Format(_))));
    }

    #[test]
    fn empty_mesh_is_a_valid_file() {
        let buf = encode(&Mesh::new(), StlEncoding::Binary);
        assert_eq!(buf.len(), 84);
        assert!(read_stl_from(&buf).unwrap().is_empty());
    }
}
