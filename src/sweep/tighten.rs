//! Tightening of the base rectangle under a trial rotation.
//!
//! The component mask is resampled (nearest neighbour) in a frame turned by
//! the trial angle about the base centre, cropped to the base rectangle's
//! extent. The largest contour's bounding box in that frame is the tight
//! rectangle; occupancy is the filled fraction of the crop.
use crate::angle::rotate_about;
use crate::component::largest_outer_contour;
use crate::geometry::RotatedRect;
use image::{GrayImage, Luma};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tightened {
    /// Tight rectangle in mask coordinates, at the trial angle.
    pub rect: RotatedRect,
    /// Non-zero fraction of the crop, in [0, 1].
    pub occupancy: f32,
}

/// Crop of the mask in the frame rotated by `angle_deg` about `base.center`,
/// with its top-left position in that frame.
pub fn rotated_crop(mask: &GrayImage, base: &RotatedRect, angle_deg: f32) -> Option<(GrayImage, [i64; 2])> {
    let (w, h) = (mask.width() as i64, mask.height() as i64);
    let (cw, ch) = (base.size[0].round() as i64, base.size[1].round() as i64);
    let x0 = (base.center[0] - cw as f32 / 2.0).round() as i64;
    let y0 = (base.center[1] - ch as f32 / 2.0).round() as i64;
    let (cx0, cy0) = (x0.max(0), y0.max(0));
    let (cx1, cy1) = ((x0 + cw).min(w), (y0 + ch).min(h));
    if cx1 <= cx0 || cy1 <= cy0 {
        return None;
    }
    let crop = GrayImage::from_fn((cx1 - cx0) as u32, (cy1 - cy0) as u32, |i, j| {
        let r = [(cx0 + i as i64) as f32, (cy0 + j as i64) as f32];
        let p = rotate_about(r, base.center, angle_deg);
        let (sx, sy) = (p[0].round() as i64, p[1].round() as i64);
        if sx < 0 || sy < 0 || sx >= w || sy >= h {
            return Luma([0]);
        }
        *mask.get_pixel(sx as u32, sy as u32)
    });
    Some((crop, [cx0, cy0]))
}

/// Tight rectangle and occupancy at `angle_deg`; `None` when the crop is
/// empty or holds no contour.
pub fn rotate_and_tighten(mask: &GrayImage, base: &RotatedRect, angle_deg: f32) -> Option<Tightened> {
    let (crop, origin) = rotated_crop(mask, base, angle_deg)?;
    let filled = crop.as_raw().iter().filter(|&&v| v != 0).count();
    let occupancy = filled as f32 / (crop.width() as f32 * crop.height() as f32);

    let (points, _) = largest_outer_contour(&crop)?;
    let (mut bx0, mut by0) = (f32::INFINITY, f32::INFINITY);
    let (mut bx1, mut by1) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in &points {
        bx0 = bx0.min(p[0]);
        by0 = by0.min(p[1]);
        bx1 = bx1.max(p[0]);
        by1 = by1.max(p[1]);
    }
    let size = [bx1 - bx0 + 1.0, by1 - by0 + 1.0];
    let center_rot = [
        origin[0] as f32 + (bx0 + bx1) * 0.5,
        origin[1] as f32 + (by0 + by1) * 0.5,
    ];
    Some(Tightened {
        rect: RotatedRect {
            center: rotate_about(center_rot, base.center, angle_deg),
            size,
            angle_deg,
        },
        occupancy,
    })
}
