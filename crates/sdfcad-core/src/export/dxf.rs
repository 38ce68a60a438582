//! DXF output of contours as closed R12 polylines in millimetres

use super::write_atomic;
use crate::contour::ContourSet;
use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Write `contours` to `path` atomically
pub fn write_dxf(contours: &ContourSet, path: &Path) -> Result<()> {
    write_atomic(path, |w| write_dxf_to(contours, w))
}

/// Write `contours` as DXF into any writer
pub fn write_dxf_to(contours: &ContourSet, w: &mut dyn Write) -> Result<()> {
    let mut out = Groups(w);
    out.pair(0, "SECTION")?;
    out.pair(2, "HEADER")?;
    out.pair(9, "$ACADVER")?;
    out.pair(1, "AC1009")?;
    out.pair(9, "$INSUNITS")?;
    out.pair(70, 4)?;
    out.pair(0, "ENDSEC")?;

    out.pair(0, "SECTION")?;
    out.pair(2, "ENTITIES")?;
    for contour in contours {
        out.pair(0, "POLYLINE")?;
        out.pair(8, 0)?;
        // vertices follow
        out.pair(66, 1)?;
        // closed
        out.pair(70, 1)?;
        out.point(0.0, 0.0)?;
        for p in &contour.points {
            out.pair(0, "VERTEX")?;
            out.pair(8, 0)?;
            out.point(p.x, p.y)?;
        }
        out.pair(0, "SEQEND")?;
        out.pair(8, 0)?;
    }
    out.pair(0, "ENDSEC")?;
    out.pair(0, "EOF")?;
    Ok(())
}

/// Group code / value writer
struct Groups<'a>(&'a mut dyn Write);

impl Groups<'_> {
    fn pair(&mut self, code: u16, value: impl std::fmt::Display) -> Result<()> {
        writeln!(self.0, "{code:>3}\n{value}")?;
        Ok(())
    }

    fn point(&mut self, x: f64, y: f64) -> Result<()> {
        self.pair(10, x)?;
        self.pair(20, y)?;
        self.pair(30, 0.0)
    }
}
