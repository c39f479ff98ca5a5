//! Coverage of the image by an accepted quadrilateral.
use crate::geometry::Quad;

/// `round(100 · area(quad) / (width · height))`, clamped to `[0, 100]`.
/// An empty image has zero coverage.
pub fn coverage_percent(quad: &Quad, width: u32, height: u32) -> u8 {
    let total = width as f64 * height as f64;
    if total <= 0.0 {
        return 0;
    }
    let pct = (100.0 * quad.area() as f64 / total).round();
    pct.clamp(0.0, 100.0) as u8
}
