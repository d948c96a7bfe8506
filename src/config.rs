//! Layered run configuration.
//!
//! Settings resolve in three layers: built-in defaults, then any number of
//! JSON config files in the order given, then command-line flags. Each
//! file may set any subset of fields; later layers win. The effective
//! config is serializable so the CLI can show it and embed it in the
//! output document.

use crate::align::AlignParams;
use crate::error::AlignError;
use crate::surface::io::RasterFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Background raster (PNG or TIFF).
    pub image: Option<PathBuf>,
    /// GeoJSON LineString feature to align.
    pub linestring: Option<PathBuf>,
    /// Result destination; standard out when absent.
    pub output: Option<PathBuf>,
    /// Likelihood heat-map destination, if requested.
    pub debug_image: Option<PathBuf>,
    /// JSON pointer to the feature inside the linestring document.
    pub pointer: String,
    /// Free-form string copied into the output config object.
    pub tag: Option<String>,
    /// Raster decode override.
    pub format: RasterFormat,
    /// Window radius: maximum vertex displacement in pixels.
    pub window_size: i32,
    /// Sigma of the Gaussian displacement penalty, in pixels.
    pub sigma: f64,
    /// Keep only every n-th input vertex.
    pub stride: usize,
    /// Extra vertices inserted per input segment, after stride.
    pub subdivide: usize,
    /// Write the whole input document rather than just the feature.
    pub output_full_dom: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            image: None,
            linestring: None,
            output: None,
            debug_image: None,
            pointer: String::new(),
            tag: None,
            format: RasterFormat::Auto,
            window_size: 15,
            sigma: 10.0,
            stride: 1,
            subdivide: 0,
            output_full_dom: false,
        }
    }
}

impl RunConfig {
    /// Overlay settings from a JSON file; only the keys present in the
    /// file change.
    pub fn ingest_file(&mut self, path: &Path) -> Result<(), AlignError> {
        let contents = fs::read_to_string(path).map_err(|e| AlignError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let patch: Value = serde_json::from_str(&contents).map_err(|e| AlignError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.apply_value(patch).map_err(|e| AlignError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Overlay a parsed JSON object onto the current settings.
    pub fn apply_value(&mut self, patch: Value) -> Result<(), serde_json::Error> {
        let mut base = serde_json::to_value(&*self)?;
        merge(&mut base, patch);
        *self = serde_json::from_value(base)?;
        Ok(())
    }

    /// Effective settings as pretty-printed JSON.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn align_params(&self) -> AlignParams {
        AlignParams {
            window_size: self.window_size,
            sigma: self.sigma,
        }
    }
}

fn merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (key, value) in src_map {
                match dst_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        dst_map.insert(key, value);
                    }
                }
            }
        }
        (dst_slot, src_value) => *dst_slot = src_value,
    }
}
