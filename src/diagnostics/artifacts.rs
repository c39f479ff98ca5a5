//! Intermediate images of a detection and their persistence.
//!
//! The detector only builds these in memory; [`save_artifacts`] is the single
//! place that writes them, as `<base>_debug_{mask,quad,warp,crop,clip}.png`.
use crate::detector::params::DetectorParams;
use crate::geometry::Quad;
use crate::image::io::{save_gray_image, save_rgb_image, ImageIoError};
use crate::normalize::{candidate_roi, perspective_crop, warp_to_square};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use serde::Serialize;
use std::path::{Path, PathBuf};

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);
const MIN_CROP_SIDE: u32 = 20;

#[derive(Clone, Debug)]
pub struct DiagnosticImages {
    /// Cleaned segmentation mask at working resolution.
    pub mask: GrayImage,
    /// Photograph with the accepted quad outlined; a plain copy when nothing
    /// was found.
    pub overlay: RgbImage,
    pub warp: Option<RgbImage>,
    pub crop: Option<RgbImage>,
    pub clip: Option<RgbImage>,
}

impl DiagnosticImages {
    /// The warp is sampled through the same padded region the validators
    /// saw for `quad`.
    pub fn build(image: &RgbImage, mask: GrayImage, quad: Option<&Quad>, params: &DetectorParams) -> Self {
        let mut overlay = image.clone();
        let Some(quad) = quad else {
            return Self {
                mask,
                overlay,
                warp: None,
                crop: None,
                clip: None,
            };
        };
        draw_quad_outline(&mut overlay, quad);
        let sweep = &params.sweep;
        let roi = candidate_roi(
            quad,
            quad.longest_side(),
            sweep.roi_pad_frac,
            sweep.roi_pad_min_px,
            image.width(),
            image.height(),
        );
        Self {
            mask,
            overlay,
            warp: roi.map(|roi| warp_to_square(image, quad, &roi, params.validation.warp_size)),
            crop: Some(perspective_crop(image, quad, MIN_CROP_SIDE)),
            clip: Some(clip_to_quad(image, quad)),
        }
    }
}

/// Green outline, three pixels wide.
pub fn draw_quad_outline(canvas: &mut RgbImage, quad: &Quad) {
    let pts = quad.corners();
    for i in 0..4 {
        let (a, b) = (pts[i], pts[(i + 1) % 4]);
        for (dx, dy) in [(0.0, 0.0), (1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
            draw_line_segment_mut(canvas, (a[0] + dx, a[1] + dy), (b[0] + dx, b[1] + dy), OUTLINE);
        }
    }
}

/// Whether `p` lies inside the convex quad (boundary included).
fn inside_convex(quad: &Quad, p: [f32; 2]) -> bool {
    let pts = quad.corners();
    let mut sign = 0.0f32;
    for i in 0..4 {
        let (a, b) = (pts[i], pts[(i + 1) % 4]);
        let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Original image with everything outside the quad blacked out.
pub fn clip_to_quad(image: &RgbImage, quad: &Quad) -> RgbImage {
    let bounds = quad.bounding_rect();
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = [x as f32, y as f32];
        if bounds.contains(p[0], p[1]) && inside_convex(quad, p) {
            *image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Paths written by [`save_artifacts`].
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPaths {
    pub mask: Option<PathBuf>,
    pub quad: Option<PathBuf>,
    pub warp: Option<PathBuf>,
    pub crop: Option<PathBuf>,
    pub clip: Option<PathBuf>,
}

fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!("_debug_{suffix}.png"));
    base.with_file_name(name)
}

fn save_rgb_opt(image: Option<&RgbImage>, base: &Path, suffix: &str) -> Result<Option<PathBuf>, ImageIoError> {
    match image {
        Some(img) => {
            let path = suffixed(base, suffix);
            save_rgb_image(img, &path)?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}

/// Write every available image next to `base` and return the written paths.
pub fn save_artifacts(images: &DiagnosticImages, base: &Path) -> Result<ArtifactPaths, ImageIoError> {
    let mask = suffixed(base, "mask");
    save_gray_image(&images.mask, &mask)?;
    let quad = suffixed(base, "quad");
    save_rgb_image(&images.overlay, &quad)?;
    Ok(ArtifactPaths {
        mask: Some(mask),
        quad: Some(quad),
        warp: save_rgb_opt(images.warp.as_ref(), base, "warp")?,
        crop: save_rgb_opt(images.crop.as_ref(), base, "crop")?,
        clip: save_rgb_opt(images.clip.as_ref(), base, "clip")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_warp() -> DetectorParams {
        let mut params = DetectorParams::default();
        params.validation.warp_size = 60;
        params
    }

    fn square() -> Quad {
        Quad::from_points(&[[10.0, 10.0], [30.0, 10.0], [30.0, 30.0], [10.0, 30.0]])
    }

    #[test]
    fn clip_keeps_only_the_quad_interior() {
        let img = RgbImage::from_pixel(40, 40, Rgb([200, 100, 50]));
        let clip = clip_to_quad(&img, &square());
        assert_eq!(*clip.get_pixel(20, 20), Rgb([200, 100, 50]));
        assert_eq!(*clip.get_pixel(10, 10), Rgb([200, 100, 50]));
        assert_eq!(*clip.get_pixel(5, 20), Rgb([0, 0, 0]));
        assert_eq!(*clip.get_pixel(35, 35), Rgb([0, 0, 0]));
    }

    #[test]
    fn overlay_outlines_in_green() {
        let img = RgbImage::new(40, 40);
        let images = DiagnosticImages::build(&img, GrayImage::new(40, 40), Some(&square()), &small_warp());
        assert_eq!(*images.overlay.get_pixel(20, 10), OUTLINE);
        assert_eq!(*images.overlay.get_pixel(20, 20), Rgb([0, 0, 0]));
        assert_eq!(images.warp.as_ref().map(|w| w.dimensions()), Some((60, 60)));
        let crop = images.crop.as_ref().map(|c| c.dimensions());
        assert_eq!(crop, Some((20, 20)));
    }

    #[test]
    fn warp_samples_the_padded_candidate_region() {
        let img = RgbImage::from_fn(40, 40, |x, y| Rgb([(x * 6) as u8, (y * 6) as u8, 90]));
        let params = small_warp();
        let images = DiagnosticImages::build(&img, GrayImage::new(40, 40), Some(&square()), &params);
        let sweep = &params.sweep;
        let roi = candidate_roi(&square(), 20.0, sweep.roi_pad_frac, sweep.roi_pad_min_px, 40, 40)
            .expect("roi");
        let expected = warp_to_square(&img, &square(), &roi, 60);
        assert_eq!(images.warp.as_ref(), Some(&expected));
    }

    #[test]
    fn saved_names_follow_the_base_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("shot");
        let img = RgbImage::new(40, 40);
        let images = DiagnosticImages::build(&img, GrayImage::new(40, 40), Some(&square()), &small_warp());
        let paths = save_artifacts(&images, &base).expect("save");
        let clip = paths.clip.expect("clip path");
        assert_eq!(clip.file_name().and_then(|n| n.to_str()), Some("shot_debug_clip.png"));
        assert!(clip.exists());
        assert!(dir.path().join("shot_debug_mask.png").exists());
    }
}
