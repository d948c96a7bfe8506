use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced outside the numeric core.
///
/// The alignment recursion itself never fails: unreachable states are the
/// `-inf` sentinel and propagate through scores. These variants cover the
/// seams around it: file I/O, decoding, interchange parsing, and parameter
/// validation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AlignError {
    #[error("failed to load raster {path}: {detail}")]
    ImageLoad { path: PathBuf, detail: String },

    #[error("failed to save image {path}: {detail}")]
    ImageSave { path: PathBuf, detail: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid or unresolvable JSON pointer \"{0}\"")]
    JsonPointer(String),

    #[error("{0}")]
    Geojson(String),

    #[error("failed to write output: {0}")]
    Output(String),

    #[error("polyline has {0} vertices; need at least 2")]
    TooFewVertices(usize),

    #[error("vertex {index} at ({x}, {y}) lies outside the {w}x{h} raster")]
    VertexOutOfBounds {
        index: usize,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    },

    #[error("invalid alignment parameters: {0}")]
    InvalidParams(String),
}
