//! Adaptive color segmentation.
//!
//! Saturation and value thresholds follow the photograph's own histograms
//! (percentiles, then clamped), so dim and overexposed shots produce usable
//! masks. A pixel is marker-colored when its hue falls in one of the
//! configured bands and its saturation/value pass the derived gates. The raw
//! mask is cleaned with a close followed by an open, both sized from the
//! image's shorter side.
use crate::detector::params::SegmentationParams;
use crate::image::{HsvImage, ImageView};
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use log::debug;
use serde::Serialize;

/// Saturation/value gates derived for one image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HsvThresholds {
    pub s_min: u8,
    pub v_min: u8,
    pub v_max: u8,
}

#[derive(Clone, Debug)]
pub struct Segmentation {
    /// Binary mask (0/255) at the segmented image's resolution.
    pub mask: GrayImage,
    pub thresholds: HsvThresholds,
    pub close_kernel: u32,
    pub open_kernel: u32,
}

fn clamp_u8(v: i32, bounds: [u8; 2]) -> u8 {
    v.clamp(bounds[0] as i32, bounds[1] as i32) as u8
}

pub fn derive_thresholds(hsv: &HsvImage, params: &SegmentationParams) -> HsvThresholds {
    use crate::image::hsv::percentile;
    let (s_hist, v_hist) = hsv.sv_histograms();
    let s_p = percentile(&s_hist, params.s_percentile) as i32;
    HsvThresholds {
        s_min: clamp_u8(s_p - params.s_offset, params.s_min_clamp),
        v_min: clamp_u8(percentile(&v_hist, params.v_min_percentile) as i32, params.v_min_clamp),
        v_max: clamp_u8(percentile(&v_hist, params.v_max_percentile) as i32, params.v_max_clamp),
    }
}

/// Raw (uncleaned) band mask.
pub fn color_mask(hsv: &HsvImage, thresholds: &HsvThresholds, bands: &[[u8; 2]]) -> GrayImage {
    let mut mask = GrayImage::new(hsv.w as u32, hsv.h as u32);
    for (y, row) in hsv.rows().enumerate() {
        for (x, px) in row.iter().enumerate() {
            let sv_ok = px.s >= thresholds.s_min && px.v >= thresholds.v_min && px.v <= thresholds.v_max;
            if sv_ok && bands.iter().any(|b| px.h >= b[0] && px.h <= b[1]) {
                mask.put_pixel(x as u32, y as u32, Luma([255]));
            }
        }
    }
    mask
}

/// Odd kernel side `max(3, (min_side / div) | 1)`.
#[inline]
pub fn kernel_side(min_side: u32, div: u32) -> u32 {
    ((min_side / div.max(1)) | 1).max(3)
}

/// Square structuring element of odd side `k` as an L∞ radius.
#[inline]
fn radius(k: u32) -> u8 {
    (k / 2).min(u8::MAX as u32) as u8
}

/// Segment an RGB image into a cleaned marker-color mask.
pub fn segment(hsv: &HsvImage, params: &SegmentationParams) -> Segmentation {
    let thresholds = derive_thresholds(hsv, params);
    let raw = color_mask(hsv, &thresholds, &params.hue_bands);

    let min_side = hsv.w.min(hsv.h) as u32;
    let close_kernel = kernel_side(min_side, params.close_div);
    let open_kernel = kernel_side(min_side, params.open_div);
    let closed = morphology::close(&raw, Norm::LInf, radius(close_kernel));
    let mask = morphology::open(&closed, Norm::LInf, radius(open_kernel));

    debug!(
        "segmentation: s_min={} v_min={} v_max={} close={} open={}",
        thresholds.s_min, thresholds.v_min, thresholds.v_max, close_kernel, open_kernel
    );
    Segmentation {
        mask,
        thresholds,
        close_kernel,
        open_kernel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn kernels_are_odd_and_at_least_three() {
        assert_eq!(kernel_side(1000, 55), 19);
        assert_eq!(kernel_side(1000, 110), 9);
        assert_eq!(kernel_side(100, 55), 3);
        assert_eq!(kernel_side(120, 10), 13);
    }

    #[test]
    fn thresholds_are_clamped_into_their_ranges() {
        let gray = RgbImage::from_pixel(50, 50, Rgb([128, 128, 128]));
        let t = derive_thresholds(&HsvImage::from_rgb(&gray), &SegmentationParams::default());
        assert_eq!(t, HsvThresholds { s_min: 35, v_min: 90, v_max: 180 });
    }

    #[test]
    fn saturated_square_survives_cleanup_and_gray_does_not() {
        let mut rgb = RgbImage::from_pixel(200, 200, Rgb([120, 120, 120]));
        for y in 60..140 {
            for x in 60..140 {
                rgb.put_pixel(x, y, Rgb([30, 200, 40]));
            }
        }
        let seg = segment(&HsvImage::from_rgb(&rgb), &SegmentationParams::default());
        assert_eq!(seg.mask.get_pixel(100, 100)[0], 255);
        assert_eq!(seg.mask.get_pixel(10, 10)[0], 0);
    }
}
