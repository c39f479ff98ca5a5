//! Base orientation of the selected component: the minimum-area rectangle
//! around its outer contour. The rectangle's angle centres the rotation
//! sweep; its area fraction is reported but never used as a gate.
use crate::component::{largest_outer_contour, SelectedComponent};
use crate::detector::params::ComponentParams;
use crate::geometry::{min_area_rect, RotatedRect};
use log::{debug, warn};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseOrientation {
    pub rect: RotatedRect,
    /// Rectangle area over the mask area.
    pub area_frac: f32,
}

pub fn estimate_base_orientation(
    component: &SelectedComponent,
    params: &ComponentParams,
) -> Option<BaseOrientation> {
    let (points, _) = largest_outer_contour(&component.mask)?;
    let rect = min_area_rect(&points)?;
    let total = (component.mask.width() as f32 * component.mask.height() as f32).max(1.0);
    let area_frac = rect.area() / total;
    debug!(
        "base rect: center=({:.1}, {:.1}) size={:.1}x{:.1} angle={:.2} frac={:.4}",
        rect.center[0], rect.center[1], rect.size[0], rect.size[1], rect.angle_deg, area_frac
    );
    if area_frac > params.max_quad_area_frac {
        warn!(
            "base rect covers {:.1}% of the image (above {:.1}%)",
            area_frac * 100.0,
            params.max_quad_area_frac * 100.0
        );
    }
    Some(BaseOrientation { rect, area_frac })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::select_component;
    use image::{GrayImage, Luma};

    #[test]
    fn rotated_block_yields_its_angle() {
        let truth = RotatedRect {
            center: [150.0, 150.0],
            size: [120.0, 120.0],
            angle_deg: 12.0,
        };
        let mask = GrayImage::from_fn(300, 300, |x, y| {
            let local = crate::angle::rotate_about([x as f32, y as f32], truth.center, -truth.angle_deg);
            let inside = (local[0] - 150.0).abs() <= 60.0 && (local[1] - 150.0).abs() <= 60.0;
            Luma([if inside { 255 } else { 0 }])
        });
        let comp = select_component(&mask, &ComponentParams::default()).expect("component");
        let base = estimate_base_orientation(&comp, &ComponentParams::default()).expect("base");
        assert!((base.rect.angle_deg - 12.0).abs() < 1.0, "angle={}", base.rect.angle_deg);
        assert!((base.rect.area() - 14400.0).abs() < 800.0);
    }
}
