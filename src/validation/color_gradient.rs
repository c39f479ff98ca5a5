//! Color-vector edges between neighbouring cells.
//!
//! Hue is embedded as a unit vector scaled by saturation, so adjacent cells
//! of different colors produce a gradient even at equal brightness. Value is
//! added with a reduced weight.
use super::profile::{two_peaks_near_thirds, PeakThresholds};
use super::{StructuralValidator, ValidationInput, ValidatorKind};
use crate::detector::params::ValidationParams;
use crate::edges::sobel_gradients;
use crate::image::{ImageF32, ImageView};

pub struct ColorGradient;

/// Per-axis edge energy `(along x, along y)`.
pub fn color_edge_planes(input: &ValidationInput, value_weight: f32) -> (ImageF32, ImageF32) {
    let hsv = &input.hsv;
    let (w, h) = (hsv.width(), hsv.height());
    let px = |x: usize, y: usize| hsv.pixel(x, y);
    let cos_plane = ImageF32::from_fn(w, h, |x, y| {
        let p = px(x, y);
        p.hue_radians().cos() * p.s as f32 / 255.0
    });
    let sin_plane = ImageF32::from_fn(w, h, |x, y| {
        let p = px(x, y);
        p.hue_radians().sin() * p.s as f32 / 255.0
    });
    let val_plane = ImageF32::from_fn(w, h, |x, y| px(x, y).v as f32 / 255.0);

    let gc = sobel_gradients(&cos_plane);
    let gs = sobel_gradients(&sin_plane);
    let gv = sobel_gradients(&val_plane);

    let combine = |a: &ImageF32, b: &ImageF32, c: &ImageF32| {
        let mut out = ImageF32::new(w, h);
        for (i, o) in out.data.iter_mut().enumerate() {
            *o = a.data[i].abs() + b.data[i].abs() + value_weight * c.data[i].abs();
        }
        out
    };
    (
        combine(&gc.gx, &gs.gx, &gv.gx),
        combine(&gc.gy, &gs.gy, &gv.gy),
    )
}

impl StructuralValidator for ColorGradient {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::ColorGradient
    }

    fn accept(&self, input: &ValidationInput, params: &ValidationParams) -> bool {
        let (ex, ey) = color_edge_planes(input, params.gradient_value_weight);
        let thresholds = PeakThresholds::from_params(&params.peaks);
        two_peaks_near_thirds(&ex.column_sums(), &thresholds)
            && two_peaks_near_thirds(&ey.row_sums(), &thresholds)
    }
}
