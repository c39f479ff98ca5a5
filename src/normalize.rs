//! Perspective normalisation of a candidate quadrilateral.
//!
//! The canonical square of side `S` has corners `(0,0) (S−1,0) (S−1,S−1)
//! (0,S−1)`. Each output pixel is mapped into the photograph through the
//! square→quad homography and sampled bilinearly, but only inside the padded
//! candidate region; anything outside is black.
use crate::geometry::{PixelRect, Quad};
use crate::homography::{apply_homography, quad_to_quad};
use image::{Rgb, RgbImage};
use nalgebra::Matrix3;

/// Padded, clipped bounding rectangle of `quad`.
///
/// `longest_side` is the candidate's longer side; padding is
/// `max(pad_min_px, round(pad_frac · longest_side))`.
pub fn candidate_roi(
    quad: &Quad,
    longest_side: f32,
    pad_frac: f32,
    pad_min_px: u32,
    width: u32,
    height: u32,
) -> Option<PixelRect> {
    let pad = (pad_min_px as i64).max((pad_frac * longest_side).round() as i64);
    quad.bounding_rect().padded(pad).clipped(width, height)
}

fn square_corners(w: u32, h: u32) -> [[f32; 2]; 4] {
    let (x1, y1) = (w.saturating_sub(1) as f32, h.saturating_sub(1) as f32);
    [[0.0, 0.0], [x1, 0.0], [x1, y1], [0.0, y1]]
}

/// Bilinear sample at `(x, y)` restricted to `region`. `None` outside.
#[inline]
fn sample_bilinear(src: &RgbImage, region: &PixelRect, x: f64, y: f64) -> Option<[f32; 3]> {
    let (rx0, ry0) = (region.x as f64, region.y as f64);
    let (rx1, ry1) = ((region.x + region.w - 1) as f64, (region.y + region.h - 1) as f64);
    if !(x >= rx0 - 0.5 && x <= rx1 + 0.5 && y >= ry0 - 0.5 && y <= ry1 + 0.5) {
        return None;
    }
    let x = x.clamp(rx0, rx1);
    let y = y.clamp(ry0, ry1);
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = ((x - x0) as f32, (y - y0) as f32);
    let (xi, yi) = (x0 as u32, y0 as u32);
    let xn = (xi + 1).min(rx1 as u32);
    let yn = (yi + 1).min(ry1 as u32);
    let p00 = src.get_pixel(xi, yi);
    let p10 = src.get_pixel(xn, yi);
    let p01 = src.get_pixel(xi, yn);
    let p11 = src.get_pixel(xn, yn);
    let mut out = [0.0f32; 3];
    for (c, o) in out.iter_mut().enumerate() {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        *o = top * (1.0 - fy) + bottom * fy;
    }
    Some(out)
}

fn render(src: &RgbImage, h: &Matrix3<f64>, region: &PixelRect, w: u32, hgt: u32) -> RgbImage {
    RgbImage::from_fn(w, hgt, |u, v| {
        apply_homography(h, [u as f64, v as f64])
            .and_then(|p| sample_bilinear(src, region, p[0], p[1]))
            .map(|c| Rgb(c.map(|v| v.round().clamp(0.0, 255.0) as u8)))
            .unwrap_or(Rgb([0, 0, 0]))
    })
}

/// Warp `quad` to a `size × size` square, sampling only inside `region`.
/// A degenerate quad yields an all-black square.
pub fn warp_to_square(src: &RgbImage, quad: &Quad, region: &PixelRect, size: u32) -> RgbImage {
    if quad.area() < 1.0 {
        return RgbImage::new(size, size);
    }
    match quad_to_quad(&square_corners(size, size), &quad.corners()) {
        Some(h) => render(src, &h, region, size, size),
        None => RgbImage::new(size, size),
    }
}

/// Perspective-corrected crop at the quad's natural size (each side at least
/// `min_side`), with replicated borders.
pub fn perspective_crop(src: &RgbImage, quad: &Quad, min_side: u32) -> RgbImage {
    let dist = |a: [f32; 2], b: [f32; 2]| ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
    let w = (dist(quad.tl, quad.tr).round() as u32).max(min_side);
    let h = (dist(quad.tl, quad.bl).round() as u32).max(min_side);
    let full = PixelRect {
        x: 0,
        y: 0,
        w: src.width() as i64,
        h: src.height() as i64,
    };
    match quad_to_quad(&square_corners(w, h), &quad.corners()) {
        Some(hm) => RgbImage::from_fn(w, h, |u, v| {
            let p = apply_homography(&hm, [u as f64, v as f64]).unwrap_or([0.0, 0.0]);
            let x = p[0].clamp(0.0, (full.w - 1).max(0) as f64);
            let y = p[1].clamp(0.0, (full.h - 1).max(0) as f64);
            sample_bilinear(src, &full, x, y)
                .map(|c| Rgb(c.map(|v| v.round().clamp(0.0, 255.0) as u8)))
                .unwrap_or(Rgb([0, 0, 0]))
        }),
        None => RgbImage::new(w, h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadrant_image() -> RgbImage {
        RgbImage::from_fn(200, 200, |x, y| match (x < 100, y < 100) {
            (true, true) => Rgb([255, 0, 0]),
            (false, true) => Rgb([0, 255, 0]),
            (true, false) => Rgb([0, 0, 255]),
            (false, false) => Rgb([255, 255, 0]),
        })
    }

    #[test]
    fn axis_aligned_warp_preserves_layout() {
        let src = quadrant_image();
        let quad = Quad::from_points(&[[50.0, 50.0], [149.0, 50.0], [149.0, 149.0], [50.0, 149.0]]);
        let roi = candidate_roi(&quad, 100.0, 0.1, 2, 200, 200).expect("roi");
        let warp = warp_to_square(&src, &quad, &roi, 64);
        assert_eq!(warp.get_pixel(10, 10), &Rgb([255, 0, 0]));
        assert_eq!(warp.get_pixel(54, 10), &Rgb([0, 255, 0]));
        assert_eq!(warp.get_pixel(10, 54), &Rgb([0, 0, 255]));
        assert_eq!(warp.get_pixel(54, 54), &Rgb([255, 255, 0]));
    }

    #[test]
    fn pixels_outside_the_region_are_black() {
        let src = RgbImage::from_pixel(100, 100, Rgb([200, 200, 200]));
        let quad = Quad::from_points(&[[0.0, 0.0], [99.0, 0.0], [99.0, 99.0], [0.0, 99.0]]);
        let region = PixelRect { x: 0, y: 0, w: 50, h: 100 };
        let warp = warp_to_square(&src, &quad, &region, 40);
        assert_eq!(warp.get_pixel(5, 20), &Rgb([200, 200, 200]));
        assert_eq!(warp.get_pixel(35, 20), &Rgb([0, 0, 0]));
    }

    #[test]
    fn degenerate_quad_produces_black_square() {
        let src = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let quad = Quad::from_points(&[[3.0, 3.0], [4.0, 4.0], [5.0, 5.0], [6.0, 6.0]]);
        let region = PixelRect { x: 0, y: 0, w: 10, h: 10 };
        let warp = warp_to_square(&src, &quad, &region, 16);
        assert!(warp.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn natural_crop_respects_the_minimum_side() {
        let src = quadrant_image();
        let quad = Quad::from_points(&[[10.0, 10.0], [15.0, 10.0], [15.0, 60.0], [10.0, 60.0]]);
        let crop = perspective_crop(&src, &quad, 20);
        assert_eq!(crop.dimensions(), (20, 50));
    }
}
