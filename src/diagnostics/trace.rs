use super::artifacts::DiagnosticImages;
use super::timing::TimingBreakdown;
use crate::component::{ComponentRejection, ComponentStats};
use crate::orientation::BaseOrientation;
use crate::segmentation::HsvThresholds;
use crate::sweep::SweepPassReport;
use crate::types::DetectOutput;
use crate::validation::Verdict;
use serde::Serialize;

/// Result of [`MarkerDetector::detect_with_diagnostics`](crate::MarkerDetector).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub output: DetectOutput,
    pub trace: DetectionTrace,
    #[serde(skip)]
    pub images: Option<DiagnosticImages>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: u32,
    pub height: u32,
    /// Full-resolution pixels per working pixel (1 without downscaling).
    pub working_scale: f32,
}

/// Fallback attempt on the unrotated base rectangle.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackReport {
    pub verdict: Verdict,
    pub accepted: bool,
}

/// Stage-by-stage record of one detection.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionTrace {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    pub thresholds: HsvThresholds,
    pub close_kernel: u32,
    pub open_kernel: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_rejection: Option<ComponentRejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseOrientation>,
    pub passes: Vec<SweepPassReport>,
    pub early_stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReport>,
}

impl DetectionTrace {
    pub fn new(input: InputDescriptor) -> Self {
        Self {
            input,
            timings: TimingBreakdown::default(),
            thresholds: HsvThresholds::default(),
            close_kernel: 0,
            open_kernel: 0,
            component: None,
            component_rejection: None,
            base: None,
            passes: Vec::new(),
            early_stopped: false,
            fallback: None,
        }
    }
}
