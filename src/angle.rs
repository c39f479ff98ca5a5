//! Angle utilities shared by the rectangle geometry and the rotation sweep.
//!
//! Angles are in degrees, measured in image coordinates (x right, y down), so
//! a positive angle turns the x axis towards the y axis.

/// Wraps `deg` into [−45°, 45°). The flag is true when an odd number of
/// quarter turns was removed, i.e. the rectangle's sides swap roles.
#[inline]
pub fn wrap_quarter_turn(deg: f32) -> (f32, bool) {
    let turns = ((deg + 45.0) / 90.0).floor();
    let mut wrapped = deg - turns * 90.0;
    if wrapped >= 45.0 {
        wrapped -= 90.0;
    }
    (wrapped, (turns as i64).rem_euclid(2) == 1)
}

/// Rotates a vector by `deg`.
#[inline]
pub fn rotate_vec(v: [f32; 2], deg: f32) -> [f32; 2] {
    let (s, c) = deg.to_radians().sin_cos();
    [c * v[0] - s * v[1], s * v[0] + c * v[1]]
}

/// Rotates `p` about `center` by `deg`.
#[inline]
pub fn rotate_about(p: [f32; 2], center: [f32; 2], deg: f32) -> [f32; 2] {
    let r = rotate_vec([p[0] - center[0], p[1] - center[1]], deg);
    [center[0] + r[0], center[1] + r[1]]
}

/// Offsets `−range, −range + step, …` up to and including `range` when it is
/// reachable. Non-positive steps yield the single offset `0`.
pub fn sweep_offsets(step: f32, range: f32) -> Vec<f32> {
    if step <= 0.0 || range < 0.0 {
        return vec![0.0];
    }
    let count = ((2.0 * range) / step + 1e-4).floor() as usize + 1;
    (0..count).map(|i| -range + i as f32 * step).collect()
}
