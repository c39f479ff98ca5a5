//! Hue richness: how many distinct, well-populated hue bins a warp contains.
use crate::detector::params::HueParams;
use crate::image::HsvImage;

/// `min(1, populated_bins / full_score_bins)` over pixels whose saturation
/// exceeds `min_saturation`. A bin is populated once it holds
/// `max(min_count, round(density · area))` pixels.
pub fn hue_richness(hsv: &HsvImage, params: &HueParams) -> f32 {
    if params.bins == 0 || params.full_score_bins == 0 {
        return 0.0;
    }
    let mut hist = vec![0u32; params.bins];
    for px in &hsv.data {
        if px.s > params.min_saturation {
            let bin = (px.h as usize * params.bins / 180).min(params.bins - 1);
            hist[bin] += 1;
        }
    }
    let area = (hsv.w * hsv.h) as f32;
    let threshold = params.min_count.max((params.density * area).round() as u32);
    let populated = hist.iter().filter(|&&c| c >= threshold).count();
    (populated as f32 / params.full_score_bins as f32).min(1.0)
}
