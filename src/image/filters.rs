//! Separable linear filters over [`ImageF32`] planes.
use super::traits::{ImageView, ImageViewMut};
use super::ImageF32;

/// Trait implemented by separable 1D filters. The same taps are applied along
/// rows and then along columns.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order, odd length).
    fn taps(&self) -> &[f32];
}

/// Simple wrapper around a static filter kernel.
#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 3-tap binomial `[1, 2, 1] / 4` (3×3 Gaussian).
pub const GAUSSIAN_3TAP: StaticSeparableFilter = StaticSeparableFilter::new(&[0.25, 0.5, 0.25]);

/// Normalised box of `2·radius + 1` taps.
#[derive(Clone, Debug)]
pub struct BoxFilter {
    taps: Vec<f32>,
}

impl BoxFilter {
    pub fn new(radius: usize) -> Self {
        let n = 2 * radius + 1;
        Self {
            taps: vec![1.0 / n as f32; n],
        }
    }
}

impl SeparableFilter for BoxFilter {
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// How samples outside the plane are synthesised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderMode {
    /// `aaa|abcd|ddd`
    Replicate,
    /// `cb|abcd|cb`
    Reflect101,
}

#[inline]
fn border_index(i: isize, n: usize, mode: BorderMode) -> usize {
    let last = n as isize - 1;
    if n == 1 {
        return 0;
    }
    match mode {
        BorderMode::Replicate => i.clamp(0, last) as usize,
        BorderMode::Reflect101 => {
            let mut j = i;
            while j < 0 || j > last {
                j = if j < 0 { -j } else { 2 * last - j };
            }
            j as usize
        }
    }
}

/// Convolve rows then columns with `filter`.
pub fn convolve_separable<F: SeparableFilter + ?Sized>(
    src: &ImageF32,
    filter: &F,
    border: BorderMode,
) -> ImageF32 {
    let (w, h) = (src.w, src.h);
    if w == 0 || h == 0 {
        return src.clone();
    }
    let taps = filter.taps();
    let half = (taps.len() / 2) as isize;

    let mut tmp = ImageF32::new(w, h);
    for y in 0..h {
        let row = src.row(y);
        let out = tmp.row_mut(y);
        for (x, dst) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &t) in taps.iter().enumerate() {
                let xi = border_index(x as isize + k as isize - half, w, border);
                acc += t * row[xi];
            }
            *dst = acc;
        }
    }

    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        let rows: Vec<&[f32]> = (0..taps.len())
            .map(|k| tmp.row(border_index(y as isize + k as isize - half, h, border)))
            .collect();
        let dst = out.row_mut(y);
        for (x, d) in dst.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (r, &t) in rows.iter().zip(taps) {
                acc += t * r[x];
            }
            *d = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reflect101_mirrors_without_repeating_the_edge() {
        assert_eq!(border_index(-1, 4, BorderMode::Reflect101), 1);
        assert_eq!(border_index(4, 4, BorderMode::Reflect101), 2);
        assert_eq!(border_index(-3, 4, BorderMode::Replicate), 0);
    }

    #[test]
    fn box_filter_preserves_constant_planes() {
        let img = ImageF32::from_fn(9, 7, |_, _| 42.0);
        let out = convolve_separable(&img, &BoxFilter::new(3), BorderMode::Replicate);
        for &v in &out.data {
            assert_relative_eq!(v, 42.0, epsilon = 1e-3);
        }
    }
}
