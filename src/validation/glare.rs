//! Detection of a bright, desaturated band along the top of a warp (a printed
//! label or specular glare) that would otherwise dominate the projections.
use crate::detector::params::GlareParams;
use crate::image::HsvImage;

/// Number of top rows to drop; 0 when no glare band is present.
pub fn glare_rows(hsv: &HsvImage, params: &GlareParams) -> usize {
    let rows = hsv.h;
    if rows == 0 {
        return 0;
    }
    let top = ((rows as f32 * params.top_frac) as usize).max(1);
    let mid_start = rows / 4;
    let mid_len = (rows / 2).max(1);
    let (top_s, top_v) = hsv.mean_sv_rows(0, top);
    let (_, mid_v) = hsv.mean_sv_rows(mid_start, mid_start + mid_len);
    if top_v > params.brightness_ratio * mid_v && top_s < params.max_saturation {
        ((params.crop_frac * rows as f32).round() as usize).clamp(1, rows - 1)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn white_band_over_darker_colors_is_cropped() {
        let rgb = RgbImage::from_fn(100, 100, |_, y| {
            if y < 10 {
                Rgb([250, 250, 250])
            } else {
                Rgb([40, 120, 160])
            }
        });
        assert_eq!(glare_rows(&HsvImage::from_rgb(&rgb), &GlareParams::default()), 12);
    }

    #[test]
    fn uniform_warp_keeps_every_row() {
        let rgb = RgbImage::from_pixel(100, 100, Rgb([40, 120, 160]));
        assert_eq!(glare_rows(&HsvImage::from_rgb(&rgb), &GlareParams::default()), 0);
    }
}
