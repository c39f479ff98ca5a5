//! Grid-structure validation of a canonical (warped) candidate.
//!
//! A candidate is accepted when its hue richness reaches the configured floor
//! and at least one structural validator recognises the 3×3 layout. The
//! validators run in a fixed order and the first acceptance wins:
//!
//! 1. [`LinePeaks`] – dark separator lines in thresholded grayscale.
//! 2. [`ColorGradient`] – color-vector edges between neighbouring cells.
//! 3. [`MaxGapTwoCuts`] – strongest pair of grayscale edge positions.
//! 4. [`ColorClustering`] – label transitions of a k-means color map.
//! 5. [`TemplateCorrelation`] – correlation with an ideal thirds template.
//!
//! Every validator consumes the same [`ValidationInput`] (glare-stripped HSV
//! and grayscale planes) and only answers accept/reject.
pub mod color_cluster;
pub mod color_gradient;
pub mod glare;
pub mod hue;
pub mod line_peaks;
pub mod max_gap;
pub mod profile;
pub mod template;

pub use color_cluster::ColorClustering;
pub use color_gradient::ColorGradient;
pub use line_peaks::LinePeaks;
pub use max_gap::MaxGapTwoCuts;
pub use template::TemplateCorrelation;

use crate::detector::params::ValidationParams;
use crate::image::hsv::rgb_to_gray;
use crate::image::HsvImage;
use image::{GrayImage, RgbImage};
use serde::Serialize;

/// Identifies the validator that accepted a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    LinePeaks,
    ColorGradient,
    MaxGapTwoCuts,
    ColorClustering,
    TemplateCorrelation,
}

impl ValidatorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::LinePeaks => "line_peaks",
            Self::ColorGradient => "color_gradient",
            Self::MaxGapTwoCuts => "max_gap",
            Self::ColorClustering => "color_clustering",
            Self::TemplateCorrelation => "template",
        }
    }
}

/// Planes shared by the structural validators.
#[derive(Clone, Debug)]
pub struct ValidationInput {
    pub hsv: HsvImage,
    pub gray: GrayImage,
    /// Shorter side below the small-mode limit.
    pub small: bool,
    /// Rows removed from the top by the glare strip.
    pub glare_rows: usize,
}

impl ValidationInput {
    /// Strip a glare band if present and derive HSV and grayscale planes.
    pub fn prepare(warp: &RgbImage, params: &ValidationParams) -> Self {
        Self::from_hsv(warp, HsvImage::from_rgb(warp), params)
    }

    /// Like [`prepare`](Self::prepare), reusing the HSV planes of `warp`.
    pub fn from_hsv(warp: &RgbImage, hsv: HsvImage, params: &ValidationParams) -> Self {
        let glare_rows = glare::glare_rows(&hsv, &params.glare);
        let (hsv, gray) = if glare_rows > 0 {
            let (w, h) = warp.dimensions();
            let cropped =
                image::imageops::crop_imm(warp, 0, glare_rows as u32, w, h - glare_rows as u32)
                    .to_image();
            (hsv.crop_top(glare_rows), rgb_to_gray(&cropped))
        } else {
            (hsv, rgb_to_gray(warp))
        };
        let small = (gray.width().min(gray.height())) < params.small_side;
        Self {
            hsv,
            gray,
            small,
            glare_rows,
        }
    }
}

/// One structural test of the 3×3 layout.
pub trait StructuralValidator: Send + Sync {
    fn kind(&self) -> ValidatorKind;
    fn accept(&self, input: &ValidationInput, params: &ValidationParams) -> bool;
}

/// Outcome of validating one warp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub hue_score: f32,
    /// First validator that accepted, if any ran and accepted.
    pub validator: Option<ValidatorKind>,
}

impl Verdict {
    #[inline]
    pub fn grid_ok(&self) -> bool {
        self.validator.is_some()
    }

    pub fn accepted(&self, params: &ValidationParams) -> bool {
        self.hue_score >= params.min_hue_score && self.grid_ok()
    }
}

/// Ordered list of structural validators.
pub struct GridValidationCascade {
    validators: Vec<Box<dyn StructuralValidator>>,
}

impl Default for GridValidationCascade {
    fn default() -> Self {
        Self::new(vec![
            Box::new(LinePeaks),
            Box::new(ColorGradient),
            Box::new(MaxGapTwoCuts),
            Box::new(ColorClustering),
            Box::new(TemplateCorrelation),
        ])
    }
}

impl GridValidationCascade {
    pub fn new(validators: Vec<Box<dyn StructuralValidator>>) -> Self {
        Self { validators }
    }

    pub fn kinds(&self) -> Vec<ValidatorKind> {
        self.validators.iter().map(|v| v.kind()).collect()
    }

    /// First validator accepting `input`.
    pub fn structural(
        &self,
        input: &ValidationInput,
        params: &ValidationParams,
    ) -> Option<ValidatorKind> {
        self.validators
            .iter()
            .find(|v| v.accept(input, params))
            .map(|v| v.kind())
    }

    /// Hue richness of the whole warp, then the structural cascade. The
    /// cascade is skipped when richness is already below the floor.
    pub fn evaluate(&self, warp: &RgbImage, params: &ValidationParams) -> Verdict {
        let hsv = HsvImage::from_rgb(warp);
        let hue_score = hue::hue_richness(&hsv, &params.hue);
        if hue_score < params.min_hue_score {
            return Verdict {
                hue_score,
                validator: None,
            };
        }
        let input = ValidationInput::from_hsv(warp, hsv, params);
        Verdict {
            hue_score,
            validator: self.structural(&input, params),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{Rgb, RgbImage};

    /// Hues 0°, 40°, …, 320° at 75% saturation and full value.
    pub const PALETTE: [[u8; 3]; 9] = [
        [255, 64, 64],
        [255, 191, 64],
        [191, 255, 64],
        [64, 255, 64],
        [64, 255, 191],
        [64, 191, 255],
        [64, 64, 255],
        [191, 64, 255],
        [255, 64, 191],
    ];

    /// Canonical 3×3 marker: nine saturated cells with hues 40° apart,
    /// separated by dark lines of `line` pixels.
    pub fn canonical_marker(size: u32, line: u32) -> RgbImage {
        let third = size as f32 / 3.0;
        RgbImage::from_fn(size, size, |x, y| {
            let near = |p: u32| {
                let p = p as f32;
                (p - third).abs() < line as f32 / 2.0 || (p - 2.0 * third).abs() < line as f32 / 2.0
            };
            if near(x) || near(y) {
                return Rgb([25, 25, 25]);
            }
            let cx = ((x as f32 / third) as usize).min(2);
            let cy = ((y as f32 / third) as usize).min(2);
            Rgb(PALETTE[cy * 3 + cx])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::canonical_marker;
    use super::*;
    use image::Rgb;

    #[test]
    fn canonical_marker_is_accepted_by_the_first_validator() {
        let params = ValidationParams::default();
        let verdict = GridValidationCascade::default().evaluate(&canonical_marker(360, 10), &params);
        assert!(verdict.hue_score > 0.85, "hue={}", verdict.hue_score);
        assert_eq!(verdict.validator, Some(ValidatorKind::LinePeaks));
        assert!(verdict.accepted(&params));
    }

    #[test]
    fn flat_gray_square_is_rejected() {
        let params = ValidationParams::default();
        let warp = RgbImage::from_pixel(360, 360, Rgb([128, 128, 128]));
        let verdict = GridValidationCascade::default().evaluate(&warp, &params);
        assert_eq!(verdict.hue_score, 0.0);
        assert!(!verdict.accepted(&params));
    }

    #[test]
    fn glare_strip_slices_the_warp_hsv() {
        let params = ValidationParams::default();
        let warp = RgbImage::from_fn(360, 360, |_, y| {
            if y < 40 {
                Rgb([250, 250, 250])
            } else {
                Rgb([40, 120, 160])
            }
        });
        let hsv = HsvImage::from_rgb(&warp);
        let input = ValidationInput::from_hsv(&warp, hsv.clone(), &params);
        assert_eq!(input.glare_rows, 43);
        assert_eq!(input.hsv.data, hsv.crop_top(input.glare_rows).data);
        assert_eq!(input.gray.height() as usize, 360 - input.glare_rows);
        assert_eq!(input.hsv.data, ValidationInput::prepare(&warp, &params).hsv.data);
    }

    #[test]
    fn default_order_is_stable() {
        assert_eq!(
            GridValidationCascade::default().kinds(),
            vec![
                ValidatorKind::LinePeaks,
                ValidatorKind::ColorGradient,
                ValidatorKind::MaxGapTwoCuts,
                ValidatorKind::ColorClustering,
                ValidatorKind::TemplateCorrelation,
            ]
        );
    }
}
