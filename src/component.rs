//! Connected-component selection on the segmentation mask.
//!
//! Components are 8-connected. Each surviving component is scored by its
//! area divided by the aspect ratio of its bounding box, which favours large,
//! squarish blobs over long streaks of background color.
use crate::detector::params::ComponentParams;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::region_labelling::{connected_components, Connectivity};
use log::debug;
use serde::Serialize;

/// Statistics of the selected component.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStats {
    pub label: u32,
    pub area: u32,
    /// `[x, y, w, h]` of the bounding box.
    pub bbox: [u32; 4],
    pub score: f32,
    /// Area over the mask's pixel count.
    pub area_frac: f32,
}

/// Why no component was selected.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum ComponentRejection {
    /// Nothing above the pixel-area floor.
    NoComponent,
    /// The best component's image fraction is outside the allowed range.
    AreaFraction { area_frac: f32 },
}

#[derive(Clone, Debug)]
pub struct SelectedComponent {
    pub stats: ComponentStats,
    /// 255 on the component, 0 elsewhere; same size as the input mask.
    pub mask: GrayImage,
}

#[derive(Clone, Copy)]
struct Accum {
    area: u32,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

/// Label `mask` and keep the best-scoring component that passes the gates.
pub fn select_component(
    mask: &GrayImage,
    params: &ComponentParams,
) -> Result<SelectedComponent, ComponentRejection> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let mut accs: Vec<Option<Accum>> = Vec::new();
    for (x, y, px) in labels.enumerate_pixels() {
        let label = px[0] as usize;
        if label == 0 {
            continue;
        }
        if accs.len() <= label {
            accs.resize(label + 1, None);
        }
        let acc = accs[label].get_or_insert(Accum {
            area: 0,
            x0: x,
            y0: y,
            x1: x,
            y1: y,
        });
        acc.area += 1;
        acc.x0 = acc.x0.min(x);
        acc.y0 = acc.y0.min(y);
        acc.x1 = acc.x1.max(x);
        acc.y1 = acc.y1.max(y);
    }

    let total = (mask.width() as u64 * mask.height() as u64).max(1) as f32;
    let mut best: Option<ComponentStats> = None;
    for (label, acc) in accs.iter().enumerate() {
        let Some(acc) = acc else { continue };
        if acc.area < params.min_area_px {
            continue;
        }
        let (bw, bh) = (acc.x1 - acc.x0 + 1, acc.y1 - acc.y0 + 1);
        let aspect = bw.max(bh) as f32 / bw.min(bh).max(1) as f32;
        let score = acc.area as f32 / aspect;
        if best.is_some_and(|b| score <= b.score) {
            continue;
        }
        best = Some(ComponentStats {
            label: label as u32,
            area: acc.area,
            bbox: [acc.x0, acc.y0, bw, bh],
            score,
            area_frac: acc.area as f32 / total,
        });
    }

    let stats = best.ok_or(ComponentRejection::NoComponent)?;
    debug!(
        "component: label={} area={} frac={:.4} bbox={:?}",
        stats.label, stats.area, stats.area_frac, stats.bbox
    );
    if stats.area_frac < params.min_comp_frac || stats.area_frac > params.max_comp_frac {
        return Err(ComponentRejection::AreaFraction {
            area_frac: stats.area_frac,
        });
    }

    let mut out = GrayImage::new(mask.width(), mask.height());
    for (x, y, px) in labels.enumerate_pixels() {
        if px[0] == stats.label {
            out.put_pixel(x, y, Luma([255]));
        }
    }
    Ok(SelectedComponent { stats, mask: out })
}

/// Points of the largest outer contour in a binary image, with its area.
pub fn largest_outer_contour(mask: &GrayImage) -> Option<(Vec<[f32; 2]>, f32)> {
    let mut best: Option<(Vec<[f32; 2]>, f32)> = None;
    for contour in find_contours::<u32>(mask) {
        if contour.border_type != BorderType::Outer || contour.points.is_empty() {
            continue;
        }
        let pts: Vec<[f32; 2]> = contour
            .points
            .iter()
            .map(|p| [p.x as f32, p.y as f32])
            .collect();
        let area = crate::geometry::polygon_area(&pts);
        if best.as_ref().is_some_and(|(_, a)| area <= *a) {
            continue;
        }
        best = Some((pts, area));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn squarish_blob_beats_a_larger_streak() {
        let mut mask = GrayImage::new(400, 400);
        fill(&mut mask, 0, 0, 400, 30); // 12000 px, aspect 13.3
        fill(&mut mask, 100, 100, 90, 90); // 8100 px, aspect 1
        let sel = select_component(&mask, &ComponentParams::default()).expect("component");
        assert_eq!(sel.stats.area, 8100);
        assert_eq!(sel.stats.bbox, [100, 100, 90, 90]);
        assert_eq!(sel.mask.get_pixel(5, 5)[0], 0);
        assert_eq!(sel.mask.get_pixel(150, 150)[0], 255);
    }

    #[test]
    fn tiny_and_oversized_components_are_rejected() {
        let mut mask = GrayImage::new(100, 100);
        fill(&mut mask, 10, 10, 5, 5);
        assert_eq!(
            select_component(&mask, &ComponentParams::default()).unwrap_err(),
            ComponentRejection::NoComponent
        );
        fill(&mut mask, 0, 0, 100, 100);
        assert!(matches!(
            select_component(&mask, &ComponentParams::default()),
            Err(ComponentRejection::AreaFraction { .. })
        ));
    }

    #[test]
    fn outer_contour_spans_the_blob() {
        let mut mask = GrayImage::new(50, 50);
        fill(&mut mask, 10, 12, 20, 15);
        let (pts, area) = largest_outer_contour(&mask).expect("contour");
        assert!(pts.iter().all(|p| p[0] >= 10.0 && p[0] <= 29.0));
        assert_eq!(area, 19.0 * 14.0);
    }
}
