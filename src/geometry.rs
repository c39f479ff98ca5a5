//! Planar geometry for candidate rectangles: rotated rectangles, ordered
//! quadrilaterals, convex hulls and the minimum-area enclosing rectangle.
use crate::angle::{rotate_vec, wrap_quarter_turn};
use serde::Serialize;

/// Four corners ordered top-left, top-right, bottom-right, bottom-left.
///
/// Corners run clockwise (in image coordinates) around their centroid,
/// starting from the one with the smallest `x + y`; ties on `x + y` go to the
/// smaller `x − y`. At exact 45° rotations this keeps all four corners
/// distinct where pure sum/difference extrema would collapse two of them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quad {
    pub tl: [f32; 2],
    pub tr: [f32; 2],
    pub br: [f32; 2],
    pub bl: [f32; 2],
}

impl Quad {
    pub fn from_points(pts: &[[f32; 2]; 4]) -> Self {
        let cx = pts.iter().map(|p| p[0]).sum::<f32>() * 0.25;
        let cy = pts.iter().map(|p| p[1]).sum::<f32>() * 0.25;
        let polar = |p: &[f32; 2]| (p[1] - cy).atan2(p[0] - cx);
        let mut ring = *pts;
        ring.sort_by(|a, b| polar(a).total_cmp(&polar(b)));
        let start = (0..4)
            .min_by(|&i, &j| {
                let (a, b) = (ring[i], ring[j]);
                (a[0] + a[1])
                    .total_cmp(&(b[0] + b[1]))
                    .then((a[0] - a[1]).total_cmp(&(b[0] - b[1])))
            })
            .unwrap_or(0);
        ring.rotate_left(start);
        Self {
            tl: ring[0],
            tr: ring[1],
            br: ring[2],
            bl: ring[3],
        }
    }

    #[inline]
    pub fn corners(&self) -> [[f32; 2]; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    /// Shoelace area of the TL→TR→BR→BL polygon.
    pub fn area(&self) -> f32 {
        polygon_area(&self.corners())
    }

    /// Length of the longest edge.
    pub fn longest_side(&self) -> f32 {
        let c = self.corners();
        (0..4)
            .map(|i| {
                let (a, b) = (c[i], c[(i + 1) % 4]);
                (b[0] - a[0]).hypot(b[1] - a[1])
            })
            .fold(0.0, f32::max)
    }

    /// Integer bounding box enclosing every corner.
    pub fn bounding_rect(&self) -> PixelRect {
        let c = self.corners();
        let (mut x0, mut y0) = (f32::INFINITY, f32::INFINITY);
        let (mut x1, mut y1) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &c {
            x0 = x0.min(p[0]);
            y0 = y0.min(p[1]);
            x1 = x1.max(p[0]);
            y1 = y1.max(p[1]);
        }
        let (x0, y0) = (x0.floor() as i64, y0.floor() as i64);
        PixelRect {
            x: x0,
            y: y0,
            w: (x1.ceil() as i64 - x0 + 1).max(0),
            h: (y1.ceil() as i64 - y0 + 1).max(0),
        }
    }
}

/// Axis-aligned integer rectangle; may extend past the image until clipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl PixelRect {
    pub fn padded(&self, pad: i64) -> Self {
        Self {
            x: self.x - pad,
            y: self.y - pad,
            w: self.w + 2 * pad,
            h: self.h + 2 * pad,
        }
    }

    /// Intersection with `[0, width) × [0, height)`; `None` when empty.
    pub fn clipped(&self, width: u32, height: u32) -> Option<Self> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.w).min(width as i64);
        let y1 = (self.y + self.h).min(height as i64);
        (x1 > x0 && y1 > y0).then_some(Self {
            x: x0,
            y: y0,
            w: x1 - x0,
            h: y1 - y0,
        })
    }

    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32
            && y >= self.y as f32
            && x <= (self.x + self.w - 1) as f32
            && y <= (self.y + self.h - 1) as f32
    }
}

/// Rectangle of `size = [w, h]` centred at `center`, its width axis turned by
/// `angle_deg` from the image x axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotatedRect {
    pub center: [f32; 2],
    pub size: [f32; 2],
    pub angle_deg: f32,
}

impl RotatedRect {
    /// Corners in the order `(−,−) (+,−) (+,+) (−,+)` of the local frame.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        let (hw, hh) = (self.size[0] * 0.5, self.size[1] * 0.5);
        [[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]].map(|local| {
            let r = rotate_vec(local, self.angle_deg);
            [self.center[0] + r[0], self.center[1] + r[1]]
        })
    }

    pub fn quad(&self) -> Quad {
        Quad::from_points(&self.corners())
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.size[0] * self.size[1]
    }

    /// `max(w, h) / max(1, min(w, h))`.
    #[inline]
    pub fn aspect(&self) -> f32 {
        let (w, h) = (self.size[0], self.size[1]);
        w.max(h) / w.min(h).max(1.0)
    }

    pub fn scaled(&self, s: f32) -> Self {
        Self {
            center: [self.center[0] * s, self.center[1] * s],
            size: [self.size[0] * s, self.size[1] * s],
            angle_deg: self.angle_deg,
        }
    }
}

/// Absolute shoelace area of a closed polygon.
pub fn polygon_area(pts: &[[f32; 2]]) -> f32 {
    if pts.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..pts.len() {
        let p = pts[i];
        let q = pts[(i + 1) % pts.len()];
        acc += p[0] as f64 * q[1] as f64 - q[0] as f64 * p[1] as f64;
    }
    (acc.abs() * 0.5) as f32
}

#[inline]
fn cross(o: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f64 {
    (a[0] - o[0]) as f64 * (b[1] - o[1]) as f64 - (a[1] - o[1]) as f64 * (b[0] - o[0]) as f64
}

/// Andrew's monotone chain; collinear points are dropped.
pub fn convex_hull(points: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let mut pts: Vec<[f32; 2]> = points.to_vec();
    pts.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }
    let mut hull: Vec<[f32; 2]> = Vec::with_capacity(2 * pts.len());
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Minimum-area rectangle enclosing `points` (rotating hull edges). The
/// angle is wrapped into [−45°, 45°) with the sides swapped accordingly.
pub fn min_area_rect(points: &[[f32; 2]]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0],
                size: [0.0, 0.0],
                angle_deg: 0.0,
            })
        }
        _ => {}
    }

    let mut best: Option<(f64, RotatedRect)> = None;
    for i in 0..hull.len() {
        let p = hull[i];
        let q = hull[(i + 1) % hull.len()];
        let (dx, dy) = ((q[0] - p[0]) as f64, (q[1] - p[1]) as f64);
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f64::EPSILON {
            continue;
        }
        let (ux, uy) = (dx / len, dy / len);
        let (mut u0, mut u1, mut v0, mut v1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for h in &hull {
            let (rx, ry) = ((h[0] - p[0]) as f64, (h[1] - p[1]) as f64);
            let u = rx * ux + ry * uy;
            let v = -rx * uy + ry * ux;
            u0 = u0.min(u);
            u1 = u1.max(u);
            v0 = v0.min(v);
            v1 = v1.max(v);
        }
        let area = (u1 - u0) * (v1 - v0);
        if best.as_ref().is_some_and(|(a, _)| area >= *a) {
            continue;
        }
        let (cu, cv) = ((u0 + u1) * 0.5, (v0 + v1) * 0.5);
        let center = [
            (p[0] as f64 + cu * ux - cv * uy) as f32,
            (p[1] as f64 + cu * uy + cv * ux) as f32,
        ];
        let (angle, swapped) = wrap_quarter_turn(uy.atan2(ux).to_degrees() as f32);
        let (w, h) = ((u1 - u0) as f32, (v1 - v0) as f32);
        let size = if swapped { [h, w] } else { [w, h] };
        best = Some((
            area,
            RotatedRect {
                center,
                size,
                angle_deg: angle,
            },
        ));
    }
    best.map(|(_, rect)| rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn quad_ordering_follows_sum_and_difference_extrema() {
        let q = Quad::from_points(&[[90.0, 95.0], [10.0, 12.0], [8.0, 88.0], [92.0, 9.0]]);
        assert_eq!(q.tl, [10.0, 12.0]);
        assert_eq!(q.tr, [92.0, 9.0]);
        assert_eq!(q.br, [90.0, 95.0]);
        assert_eq!(q.bl, [8.0, 88.0]);
        assert_abs_diff_eq!(q.area(), polygon_area(&[[10.0, 12.0], [92.0, 9.0], [90.0, 95.0], [8.0, 88.0]]));
    }

    #[test]
    fn diagonal_squares_keep_four_distinct_corners() {
        for angle_deg in [45.0, -45.0] {
            let r = RotatedRect {
                center: [500.0, 500.0],
                size: [300.0, 300.0],
                angle_deg,
            };
            let q = r.quad();
            let c = q.corners();
            for i in 0..4 {
                for j in i + 1..4 {
                    assert_ne!(c[i], c[j], "angle={angle_deg} quad={q:?}");
                }
            }
            assert_abs_diff_eq!(q.area(), r.area(), epsilon = 1.0);
            // Clockwise from the upper-left vertex.
            assert!(q.tl[0] < q.tr[0] && q.tr[1] < q.br[1] && q.br[0] > q.bl[0]);
        }
    }

    #[test]
    fn rotated_rect_corners_keep_area() {
        let r = RotatedRect {
            center: [50.0, 40.0],
            size: [30.0, 20.0],
            angle_deg: 17.0,
        };
        assert_abs_diff_eq!(polygon_area(&r.corners()), 600.0, epsilon = 1e-2);
        assert_abs_diff_eq!(r.quad().area(), 600.0, epsilon = 1e-2);
    }

    #[test]
    fn min_area_rect_recovers_a_rotated_rectangle() {
        let truth = RotatedRect {
            center: [200.0, 150.0],
            size: [120.0, 60.0],
            angle_deg: 20.0,
        };
        let mut pts = truth.corners().to_vec();
        pts.push(truth.center);
        let rect = min_area_rect(&pts).expect("rect");
        assert_abs_diff_eq!(rect.angle_deg, 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(rect.area(), 7200.0, epsilon = 0.5);
        assert_abs_diff_eq!(rect.center[0], 200.0, epsilon = 1e-3);
        assert_abs_diff_eq!(rect.center[1], 150.0, epsilon = 1e-3);
    }

    #[test]
    fn steep_rectangles_wrap_into_the_quarter_turn() {
        let truth = RotatedRect {
            center: [0.0, 0.0],
            size: [80.0, 40.0],
            angle_deg: 70.0,
        };
        let rect = min_area_rect(&truth.corners()).expect("rect");
        assert_abs_diff_eq!(rect.angle_deg, -20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(rect.size[0], 40.0, epsilon = 1e-3);
        assert_abs_diff_eq!(rect.size[1], 80.0, epsilon = 1e-3);
    }

    #[test]
    fn roi_clipping_discards_empty_regions() {
        let r = PixelRect { x: -5, y: 10, w: 20, h: 5 };
        assert_eq!(r.clipped(100, 100), Some(PixelRect { x: 0, y: 10, w: 15, h: 5 }));
        assert_eq!(r.clipped(100, 8), None);
    }
}
