#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod batch;
pub mod detector;
pub mod diagnostics;
pub mod image;
pub mod types;

// Pipeline stages – public for tools and tests, but considered internals.
pub mod angle;
pub mod component;
pub mod coverage;
pub mod edges;
pub mod geometry;
pub mod homography;
pub mod normalize;
pub mod orientation;
pub mod segmentation;
pub mod sweep;
pub mod validation;

// --- High-level re-exports -------------------------------------------------

pub use crate::detector::{DetectorParams, MarkerDetector};
pub use crate::geometry::Quad;
pub use crate::types::{DetectOutput, DetectionSource, Telemetry};

pub use crate::diagnostics::{save_artifacts, DetectionReport, DetectionTrace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use marker_coverage::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let image = load_rgb_image(std::path::Path::new("photo.jpg"))?;
/// let out = MarkerDetector::new(DetectorParams::default()).detect(&image);
/// println!("found={} coverage={:?}", out.found, out.coverage_percent);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::io::load_rgb_image;
    pub use crate::{DetectOutput, DetectorParams, MarkerDetector, Quad};
}
