//! Error types for sdfcad

use thiserror::Error;

/// Result type alias using sdfcad's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, extracting or writing shapes
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid shape or operator parameters, reported at construction time
    #[error("Invalid parameter: {0}")]
    Parameter(String),

    /// A field evaluation returned NaN or infinity
    #[error("Field evaluation returned {value} at {location}")]
    Evaluation { value: f64, location: String },

    /// The extracted mesh failed the two-triangles-per-edge check
    #[error(
        "Mesh is not manifold: {boundary_edges} boundary edges, \
         {overshared_edges} edges shared by more than two triangles, \
         {misoriented_edges} inconsistently wound edges"
    )]
    NonManifold {
        boundary_edges: usize,
        overshared_edges: usize,
        misoriented_edges: usize,
    },

    /// Malformed input while reading a mesh file
    #[error("Format error: {0}")]
    Format(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn parameter(msg: impl Into<String>) -> Self {
        Self::Parameter(msg.into())
    }
}

/// Fail with a parameter error unless `cond` holds
pub(crate) fn ensure(cond: bool, msg: &str) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(Error::parameter(msg))
    }
}
