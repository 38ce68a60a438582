//! File output for meshes, contours and rasters
//!
//! Every writer streams into a [`Write`] and is wrapped by a path variant that
//! goes through [`write_atomic`], so a failed render never leaves a truncated
//! file behind.

mod dxf;
mod png;
mod stl;
mod svg;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

pub use dxf::{write_dxf, write_dxf_to};
pub use png::{Raster, write_png, write_png_to};
pub use stl::{StlEncoding, read_stl, read_stl_from, write_stl, write_stl_to};
pub use svg::{write_svg, write_svg_to};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Stl,
    Dxf,
    Svg,
    Png,
}

impl ExportFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "stl" => Some(Self::Stl),
            "dxf" => Some(Self::Dxf),
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Dxf => "dxf",
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stl => "STL (mesh)",
            Self::Dxf => "DXF (R12 polylines)",
            Self::Svg => "SVG (outline)",
            Self::Png => "PNG (distance raster)",
        }
    }

    /// Whether the format is produced from a 3D field
    pub fn is_3d(&self) -> bool {
        matches!(self, Self::Stl)
    }
}

/// Write `path` through a sibling temporary file.
///
/// `write` fills a buffered writer; the data is flushed, synced and then
/// renamed over `path`. On any error the temporary file is removed and an
/// existing `path` is left untouched.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let tmp = temp_sibling(path);
    let result = (|| -> Result<()> {
        let file = File::create(&tmp)?;
        let mut w = BufWriter::new(file);
        write(&mut w)?;
        w.flush()?;
        let file = w.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        // the temp file may never have been created
        let _ = fs::remove_file(&tmp);
        tracing::warn!(path = %path.display(), "write failed, destination untouched");
    }
    result
}

/// Temporary files written so far by this process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Hidden sibling of `path`, unique per process and per call
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.{}.{n}.tmp", std::process::id()))
}
