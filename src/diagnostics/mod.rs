//! Diagnostics data model exposed by the detector.
//!
//! `DetectionReport` is the entry point returned by
//! `MarkerDetector::detect_with_diagnostics`: it bundles the plain
//! [`DetectOutput`](crate::DetectOutput), a [`DetectionTrace`] describing each
//! stage that ran, and optionally the intermediate images.

pub mod artifacts;
pub mod timing;
pub mod trace;

pub use artifacts::{save_artifacts, ArtifactPaths, DiagnosticImages};
pub use timing::{StageTiming, TimingBreakdown};
pub use trace::{DetectionReport, DetectionTrace, FallbackReport, InputDescriptor};
