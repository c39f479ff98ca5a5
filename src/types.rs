use crate::geometry::Quad;
use crate::segmentation::HsvThresholds;
use crate::validation::ValidatorKind;
use serde::Serialize;

/// Which stage produced the accepted quadrilateral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Sweep,
    Fallback,
}

impl DetectionSource {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sweep => "sweep",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub best_angle_deg: Option<f32>,
    pub occupancy: Option<f32>,
    pub hue_score: Option<f32>,
    pub grid_validated: bool,
    pub validator: Option<ValidatorKind>,
    pub source: Option<DetectionSource>,
    pub thresholds: HsvThresholds,
}

/// Result of one detection. `coverage_percent == None` means no marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectOutput {
    pub found: bool,
    pub quad: Option<Quad>,
    pub coverage_percent: Option<u8>,
    pub telemetry: Telemetry,
}

impl DetectOutput {
    pub fn not_found(thresholds: HsvThresholds) -> Self {
        Self {
            telemetry: Telemetry {
                thresholds,
                ..Telemetry::default()
            },
            ..Self::default()
        }
    }
}
