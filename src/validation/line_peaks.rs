//! Dark separator lines: local-contrast grayscale, inverted adaptive
//! threshold, then two-peak tests on the column and row projections.
use super::profile::{two_peaks_near_thirds, PeakThresholds};
use super::{StructuralValidator, ValidationInput, ValidatorKind};
use crate::detector::params::ValidationParams;
use crate::image::contrast::{adaptive_mean_threshold_inv, clahe};
use crate::image::filters::{convolve_separable, BorderMode, GAUSSIAN_3TAP};
use crate::image::ImageF32;
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

pub struct LinePeaks;

/// Binary map of dark line pixels (255), dilated by one pixel.
pub fn line_map(input: &ValidationInput, params: &ValidationParams) -> GrayImage {
    let lp = &params.line_peaks;
    let gray = if input.small {
        input.gray.clone()
    } else {
        clahe(&input.gray, lp.clahe_clip, lp.clahe_grid)
    };
    let blurred = convolve_separable(
        &ImageF32::from_gray(&gray),
        &GAUSSIAN_3TAP,
        BorderMode::Reflect101,
    )
    .to_gray();
    let bin = adaptive_mean_threshold_inv(&blurred, lp.block_size, lp.offset);
    // 3×1 followed by 1×3 is the 3×3 square.
    dilate(&bin, Norm::LInf, 1)
}

impl StructuralValidator for LinePeaks {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::LinePeaks
    }

    fn accept(&self, input: &ValidationInput, params: &ValidationParams) -> bool {
        let map = ImageF32::from_gray(&line_map(input, params));
        let mut thresholds = PeakThresholds::from_params(&params.peaks);
        if input.small {
            thresholds = thresholds.capped(params.peaks.small_cap);
        }
        two_peaks_near_thirds(&map.column_sums(), &thresholds)
            && two_peaks_near_thirds(&map.row_sums(), &thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_support::canonical_marker;
    use image::{Rgb, RgbImage};

    #[test]
    fn separator_lines_show_up_in_the_line_map() {
        let params = ValidationParams::default();
        let input = ValidationInput::prepare(&canonical_marker(360, 10), &params);
        let map = line_map(&input, &params);
        assert_eq!(map.get_pixel(120, 60)[0], 255);
        assert_eq!(map.get_pixel(60, 60)[0], 0);
    }

    #[test]
    fn lines_off_the_thirds_are_rejected() {
        let params = ValidationParams::default();
        let warp = RgbImage::from_fn(360, 360, |x, y| {
            if x.abs_diff(40) < 5 || y.abs_diff(40) < 5 || x.abs_diff(320) < 5 || y.abs_diff(320) < 5 {
                Rgb([20, 20, 20])
            } else {
                Rgb([230, 200, 40])
            }
        });
        let input = ValidationInput::prepare(&warp, &params);
        assert!(!LinePeaks.accept(&input, &params));
    }

    #[test]
    fn small_warps_still_find_their_lines() {
        let params = ValidationParams::default();
        let input = ValidationInput::prepare(&canonical_marker(48, 3), &params);
        assert!(input.small);
        assert!(LinePeaks.accept(&input, &params));
    }
}
