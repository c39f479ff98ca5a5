//! Marker detector orchestrating segmentation, the rotation sweep, the
//! validation cascade and the fallback.
//!
//! Modules
//! - [`params`] – configuration types used by the detector and the CLI.
//! - `pipeline` – the [`MarkerDetector`] implementation.
//! - [`fallback`] – validation of the unrotated base rectangle.
//!
//! Key Ideas
//! - Segmentation thresholds adapt to each photograph's saturation and value
//!   distribution, so the same parameters work across lighting.
//! - The base rectangle only centres the sweep; the sweep re-fits the marker
//!   at each trial angle and keeps the tightest validated fit.
//! - A candidate needs both hue richness and one structural validator.

pub mod fallback;
pub mod params;
mod pipeline;

pub use params::{
    load_params, ComponentParams, ConfigError, DetectorParams, SegmentationParams, SweepParams,
    ValidationParams,
};
pub use pipeline::MarkerDetector;
