//! Correlation of the normalised edge magnitude with an ideal template that
//! has lines at the thirds.
use super::{StructuralValidator, ValidationInput, ValidatorKind};
use crate::detector::params::ValidationParams;
use crate::edges::sobel_gradients;
use crate::image::ImageF32;

pub struct TemplateCorrelation;

/// `1.0` on lines of `thickness` pixels at x, y ∈ {w/3, 2w/3}, else `0.0`.
pub fn thirds_template(w: usize, h: usize, thickness: usize) -> ImageF32 {
    let on = |p: usize, n: usize| {
        [n / 3, 2 * n / 3]
            .iter()
            .any(|&c| p >= c && p < c + thickness.max(1))
    };
    ImageF32::from_fn(w, h, |x, y| if on(x, w) || on(y, h) { 1.0 } else { 0.0 })
}

/// Pearson correlation of two equally sized planes; 0 when either is flat.
pub fn normalized_correlation(a: &ImageF32, b: &ImageF32) -> f32 {
    let n = a.data.len().min(b.data.len());
    if n == 0 {
        return 0.0;
    }
    let mean = |d: &[f32]| d[..n].iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let (ma, mb) = (mean(&a.data), mean(&b.data));
    let (mut sab, mut saa, mut sbb) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.data[..n].iter().zip(&b.data[..n]) {
        let (dx, dy) = (x as f64 - ma, y as f64 - mb);
        sab += dx * dy;
        saa += dx * dx;
        sbb += dy * dy;
    }
    let denom = (saa * sbb).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (sab / denom) as f32
}

impl StructuralValidator for TemplateCorrelation {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::TemplateCorrelation
    }

    fn accept(&self, input: &ValidationInput, params: &ValidationParams) -> bool {
        let mut mag = sobel_gradients(&ImageF32::from_gray(&input.gray)).l1_magnitude();
        mag.normalize_min_max();
        let template = thirds_template(mag.w, mag.h, params.template.line_thickness);
        normalized_correlation(&mag, &template) > params.template.min_correlation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::{Rgb, RgbImage};

    #[test]
    fn correlation_of_a_plane_with_itself_is_one() {
        let t = thirds_template(90, 90, 2);
        assert_abs_diff_eq!(normalized_correlation(&t, &t), 1.0, epsilon = 1e-6);
        assert_eq!(normalized_correlation(&t, &ImageF32::new(90, 90)), 0.0);
    }

    #[test]
    fn thin_lines_at_thirds_correlate() {
        let warp = RgbImage::from_fn(150, 150, |x, y| {
            if x == 50 || y == 50 || x == 100 || y == 100 {
                Rgb([0, 0, 0])
            } else {
                Rgb([220, 220, 220])
            }
        });
        let params = ValidationParams::default();
        let input = ValidationInput::prepare(&warp, &params);
        assert!(TemplateCorrelation.accept(&input, &params));
    }
}
