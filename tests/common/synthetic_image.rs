use image::{Rgb, RgbImage};
use marker_coverage::angle::rotate_about;

/// Hues 0°, 40°, …, 320° at 75% saturation and full value.
pub const PALETTE: [[u8; 3]; 9] = [
    [255, 64, 64],
    [255, 191, 64],
    [191, 255, 64],
    [64, 255, 64],
    [64, 255, 191],
    [64, 191, 255],
    [64, 64, 255],
    [191, 64, 255],
    [255, 64, 191],
];

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const SEPARATOR: Rgb<u8> = Rgb([25, 25, 25]);

/// Marker-local coordinates of pixel `(x, y)` for a square of `side` centred
/// on the canvas and turned by `angle_deg`; `None` outside the square.
fn marker_local(canvas: u32, side: f32, angle_deg: f32, x: u32, y: u32) -> Option<[f32; 2]> {
    let c = canvas as f32 / 2.0;
    let q = rotate_about([x as f32, y as f32], [c, c], -angle_deg);
    let (u, v) = (q[0] - c + side / 2.0, q[1] - c + side / 2.0);
    (u >= 0.0 && v >= 0.0 && u < side && v < side).then_some([u, v])
}

fn near_third(p: f32, side: f32, line: f32) -> bool {
    (p - side / 3.0).abs() < line / 2.0 || (p - 2.0 * side / 3.0).abs() < line / 2.0
}

/// White canvas with a 3×3 marker of [`PALETTE`] cells separated by dark
/// lines, centred and rotated by `angle_deg`.
pub fn grid_marker(canvas: u32, side: f32, line: f32, angle_deg: f32) -> RgbImage {
    assert!(side < canvas as f32, "marker must fit the canvas");
    RgbImage::from_fn(canvas, canvas, |x, y| {
        let Some([u, v]) = marker_local(canvas, side, angle_deg, x, y) else {
            return WHITE;
        };
        if near_third(u, side, line) || near_third(v, side, line) {
            return SEPARATOR;
        }
        let cx = ((u * 3.0 / side) as usize).min(2);
        let cy = ((v * 3.0 / side) as usize).min(2);
        Rgb(PALETTE[cy * 3 + cx])
    })
}

/// Axis-aligned marker drawn only as colored lines on white: a frame plus
/// the two inner lines per axis. Its mask is too sparse for the sweep, but
/// its base rectangle validates.
///
/// Frame hues are 0°/90°/180°/270° (top, right, bottom, left); inner lines
/// are 45°/135° (vertical) and 225°/315° (horizontal).
pub fn lattice_marker(canvas: u32, side: f32, line: f32) -> RgbImage {
    const TOP: Rgb<u8> = Rgb([255, 64, 64]);
    const RIGHT: Rgb<u8> = Rgb([160, 255, 64]);
    const BOTTOM: Rgb<u8> = Rgb([64, 255, 255]);
    const LEFT: Rgb<u8> = Rgb([160, 64, 255]);
    const VERTICAL: [Rgb<u8>; 2] = [Rgb([255, 207, 64]), Rgb([64, 255, 112])];
    const HORIZONTAL: [Rgb<u8>; 2] = [Rgb([64, 112, 255]), Rgb([255, 64, 207])];

    RgbImage::from_fn(canvas, canvas, |x, y| {
        let Some([u, v]) = marker_local(canvas, side, 0.0, x, y) else {
            return WHITE;
        };
        let which = |p: f32| usize::from(p > side / 2.0);
        if v < line {
            TOP
        } else if v >= side - line {
            BOTTOM
        } else if u < line {
            LEFT
        } else if u >= side - line {
            RIGHT
        } else if near_third(u, side, line) {
            VERTICAL[which(u)]
        } else if near_third(v, side, line) {
            HORIZONTAL[which(v)]
        } else {
            WHITE
        }
    })
}
