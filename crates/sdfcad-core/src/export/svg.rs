//! SVG outline of a contour set
//!
//! All loops go into a single path with the non-zero fill rule, which matches
//! the orientation convention of [`ContourSet`]. The y axis is flipped so the
//! drawing reads the same as the XY plane.

use super::write_atomic;
use crate::contour::ContourSet;
use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Write `contours` to `path` atomically
pub fn write_svg(contours: &ContourSet, path: &Path) -> Result<()> {
    write_atomic(path, |w| write_svg_to(contours, w))
}

/// Write `contours` as SVG into any writer
pub fn write_svg_to(contours: &ContourSet, w: &mut dyn Write) -> Result<()> {
    let Some(bounds) = contours.bounds() else {
        writeln!(w, r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="0"/>"#)?;
        return Ok(());
    };
    let size = bounds.size();
    let stroke = size.max_element() / 500.0;

    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        w,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}mm" height="{}mm" viewBox="0 0 {} {}">"#,
        size.x, size.y, size.x, size.y
    )?;
    write!(w, r#"<path fill="lightgray" fill-rule="nonzero" stroke="black" stroke-width="{stroke}" d=""#)?;
    for contour in contours {
        for (i, p) in contour.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            write!(w, "{cmd}{} {} ", p.x - bounds.min.x, bounds.max.y - p.y)?;
        }
        write!(w, "Z ")?;
    }
    writeln!(w, r#""/>"#)?;
    writeln!(w, "</svg>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Contour;
    use glam::DVec2;

    #[test]
    fn path_is_flipped_and_closed() {
        let set = ContourSet::new(vec![Contour::new(vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(3.0, 1.0),
            DVec2::new(3.0, 2.0),
        ])]);
        let mut buf = Vec::new();
        write_svg_to(&set, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#"viewBox="0 0 2 1""#));
        assert!(text.contains("M0 1 L2 1 L2 0 Z"));
        assert!(text.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn empty_set_is_an_empty_drawing() {
        let mut buf = Vec::new();
        write_svg_to(&ContourSet::default(), &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains(r#"width="0""#));
    }
}
