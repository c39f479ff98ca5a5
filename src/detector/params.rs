//! Parameter types configuring the detector stages.
//!
//! Every group derives `Deserialize` with `#[serde(default)]`, so a JSON file
//! only needs to name the knobs it overrides:
//!
//! ```json
//! { "sweep": { "min_occupancy": 0.25 }, "validation": { "warp_size": 300 } }
//! ```
//!
//! Defaults are tuned for phone photographs of a printed marker. When tuning,
//! start with the segmentation clamps and the sweep occupancy gate.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Detector-wide parameters, immutable for the duration of a run.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorParams {
    pub segmentation: SegmentationParams,
    pub component: ComponentParams,
    pub sweep: SweepParams,
    pub validation: ValidationParams,
}

/// Percentile-adaptive HSV thresholds and mask cleanup.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Percentile of the saturation histogram used for the floor.
    pub s_percentile: f32,
    /// Subtracted from the saturation percentile before clamping.
    pub s_offset: i32,
    pub s_min_clamp: [u8; 2],
    pub v_min_percentile: f32,
    pub v_min_clamp: [u8; 2],
    pub v_max_percentile: f32,
    pub v_max_clamp: [u8; 2],
    /// Inclusive hue bands (0..=180 scale) considered marker colors.
    pub hue_bands: Vec<[u8; 2]>,
    /// Closing kernel side is `min(w, h) / close_div`, forced odd and ≥ 3.
    pub close_div: u32,
    /// Opening kernel side is `min(w, h) / open_div`, forced odd and ≥ 3.
    pub open_div: u32,
    /// Longest side of the segmentation working image; 0 keeps full size.
    pub working_max_side: u32,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            s_percentile: 85.0,
            s_offset: 10,
            s_min_clamp: [35, 80],
            v_min_percentile: 60.0,
            v_min_clamp: [40, 90],
            v_max_percentile: 99.0,
            v_max_clamp: [180, 255],
            hue_bands: vec![
                [0, 10],
                [170, 180],
                [20, 35],
                [40, 85],
                [86, 100],
                [101, 130],
                [131, 169],
            ],
            close_div: 55,
            open_div: 110,
            working_max_side: 0,
        }
    }
}

/// Connected-component gating.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ComponentParams {
    /// Components smaller than this many pixels are ignored.
    pub min_area_px: u32,
    pub min_comp_frac: f32,
    pub max_comp_frac: f32,
    /// Base rectangles above this image fraction are reported, not rejected.
    pub max_quad_area_frac: f32,
}

impl Default for ComponentParams {
    fn default() -> Self {
        Self {
            min_area_px: 100,
            min_comp_frac: 0.0002,
            max_comp_frac: 0.95,
            max_quad_area_frac: 0.99,
        }
    }
}

/// Coarse-to-fine rotation search.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepParams {
    pub coarse_step_deg: f32,
    pub coarse_range_deg: f32,
    pub fine_step_deg: f32,
    pub fine_range_deg: f32,
    pub min_occupancy: f32,
    pub max_aspect: f32,
    /// A validated candidate above both thresholds ends the search.
    pub early_stop_occupancy: f32,
    pub early_stop_hue: f32,
    /// Let workers cancel the rest of a pass as soon as one candidate meets
    /// the early-stop thresholds. Faster, but the winner then depends on
    /// scheduling.
    pub eager_stop: bool,
    /// ROI padding around a candidate, as a fraction of its longest side.
    pub roi_pad_frac: f32,
    pub roi_pad_min_px: u32,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            coarse_step_deg: 2.0,
            coarse_range_deg: 25.0,
            fine_step_deg: 1.0,
            fine_range_deg: 6.0,
            min_occupancy: 0.30,
            max_aspect: 3.0,
            early_stop_occupancy: 0.78,
            early_stop_hue: 0.85,
            eager_stop: false,
            roi_pad_frac: 0.10,
            roi_pad_min_px: 2,
        }
    }
}

/// Canonical warp, hue richness, and the structural validator cascade.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationParams {
    /// Side of the canonical square the candidate is warped to.
    pub warp_size: u32,
    pub min_hue_score: f32,
    pub hue: HueParams,
    pub glare: GlareParams,
    pub peaks: PeakParams,
    /// Warps with a shorter side than this run in small mode.
    pub small_side: u32,
    pub line_peaks: LinePeakParams,
    /// Weight of the value channel in the color-gradient validator.
    pub gradient_value_weight: f32,
    pub clustering: ClusterParams,
    pub template: TemplateParams,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            warp_size: 360,
            min_hue_score: 0.25,
            hue: HueParams::default(),
            glare: GlareParams::default(),
            peaks: PeakParams::default(),
            small_side: 60,
            line_peaks: LinePeakParams::default(),
            gradient_value_weight: 0.35,
            clustering: ClusterParams::default(),
            template: TemplateParams::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HueParams {
    pub bins: usize,
    /// Only pixels with saturation strictly above this vote.
    pub min_saturation: u8,
    /// A bin counts once it holds `max(min_count, density · area)` pixels.
    pub density: f32,
    pub min_count: u32,
    /// Distinct bins needed for a full score.
    pub full_score_bins: usize,
}

impl Default for HueParams {
    fn default() -> Self {
        Self {
            bins: 18,
            min_saturation: 40,
            density: 0.002,
            min_count: 10,
            full_score_bins: 9,
        }
    }
}

/// Bright, washed-out band at the top of a warp (printed label, glare).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GlareParams {
    pub top_frac: f32,
    pub brightness_ratio: f32,
    pub max_saturation: f32,
    pub crop_frac: f32,
}

impl Default for GlareParams {
    fn default() -> Self {
        Self {
            top_frac: 0.10,
            brightness_ratio: 1.15,
            max_saturation: 60.0,
            crop_frac: 0.12,
        }
    }
}

/// Shared two-peak test thresholds.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PeakParams {
    /// Minimum prominence over the median of the normalised profile.
    pub min_line_peak: f32,
    /// Minimum peak separation as a fraction of the profile length.
    pub min_peak_sep: f32,
    /// Allowed distance from 1/3 or 2/3, as a fraction of the length.
    pub thirds_tol: f32,
    /// Profiles shorter than this are never accepted.
    pub min_profile_len: usize,
    /// Ceiling applied to prominence and separation in small mode.
    pub small_cap: f32,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            min_line_peak: 0.12,
            min_peak_sep: 0.12,
            thirds_tol: 0.15,
            min_profile_len: 8,
            small_cap: 0.12,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LinePeakParams {
    pub clahe_clip: f32,
    pub clahe_grid: usize,
    pub block_size: usize,
    pub offset: f32,
}

impl Default for LinePeakParams {
    fn default() -> Self {
        Self {
            clahe_clip: 2.0,
            clahe_grid: 8,
            block_size: 21,
            offset: 5.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterParams {
    pub k: usize,
    pub stride: usize,
    pub small_stride: usize,
    pub min_samples: usize,
    pub max_iters: usize,
    pub epsilon: f32,
    pub seed: u64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            k: 6,
            stride: 6,
            small_stride: 8,
            min_samples: 64,
            max_iters: 10,
            epsilon: 1e-3,
            seed: 0x5eed,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateParams {
    pub line_thickness: usize,
    pub min_correlation: f32,
}

impl Default for TemplateParams {
    fn default() -> Self {
        Self {
            line_thickness: 2,
            min_correlation: 0.25,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load detector parameters from a (possibly partial) JSON file.
pub fn load_params(path: &Path) -> Result<DetectorParams, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
