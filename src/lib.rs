#![doc = include_str!("../README.md")]

pub mod align;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geojson;
pub mod geometry;
pub mod polyline;
pub mod site;
pub mod surface;

// --- High-level re-exports -------------------------------------------------

pub use crate::align::{align, align_observed, AlignParams, Alignment};
pub use crate::error::AlignError;
pub use crate::geometry::{LocalPoint, Segment, WorldPoint};
pub use crate::surface::CostSurface;

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::align::{align, AlignParams, Alignment};
    pub use crate::geometry::WorldPoint;
    pub use crate::surface::CostSurface;
}
