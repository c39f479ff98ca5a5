//! 8-bit HSV planes in the compact hue convention (hue 0..=180, saturation
//! and value 0..=255), plus grayscale conversion and histogram percentiles.
use super::traits::ImageView;
use image::{GrayImage, Luma, RgbImage};

/// One HSV sample. `h` is half the hue angle in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    /// Hue angle in radians.
    #[inline]
    pub fn hue_radians(self) -> f32 {
        (self.h as f32 * 2.0).to_radians()
    }
}

/// Convert one RGB triple.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;
    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };
    let mut h = if diff <= 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    Hsv {
        h: (h * 0.5).round().clamp(0.0, 180.0) as u8,
        s: s.round().clamp(0.0, 255.0) as u8,
        v: v as u8,
    }
}

/// Owned HSV image, row-major.
#[derive(Clone, Debug)]
pub struct HsvImage {
    pub w: usize,
    pub h: usize,
    pub data: Vec<Hsv>,
}

impl HsvImage {
    pub fn from_rgb(rgb: &RgbImage) -> Self {
        let data = rgb
            .pixels()
            .map(|p| rgb_to_hsv(p[0], p[1], p[2]))
            .collect();
        Self {
            w: rgb.width() as usize,
            h: rgb.height() as usize,
            data,
        }
    }

    /// Histograms of the saturation and value channels.
    pub fn sv_histograms(&self) -> ([u32; 256], [u32; 256]) {
        let mut s_hist = [0u32; 256];
        let mut v_hist = [0u32; 256];
        for px in &self.data {
            s_hist[px.s as usize] += 1;
            v_hist[px.v as usize] += 1;
        }
        (s_hist, v_hist)
    }

    /// Mean saturation and value over rows `[y0, y1)`.
    pub fn mean_sv_rows(&self, y0: usize, y1: usize) -> (f32, f32) {
        let y1 = y1.min(self.h);
        if y0 >= y1 || self.w == 0 {
            return (0.0, 0.0);
        }
        let (mut s, mut v) = (0u64, 0u64);
        for row in self.rows().skip(y0).take(y1 - y0) {
            for px in row {
                s += px.s as u64;
                v += px.v as u64;
            }
        }
        let n = ((y1 - y0) * self.w) as f32;
        (s as f32 / n, v as f32 / n)
    }

    /// Copy of rows `[y0, h)`.
    pub fn crop_top(&self, y0: usize) -> Self {
        let y0 = y0.min(self.h);
        Self {
            w: self.w,
            h: self.h - y0,
            data: self.data[y0 * self.w..].to_vec(),
        }
    }
}

impl ImageView for HsvImage {
    type Pixel = Hsv;

    fn width(&self) -> usize {
        self.w
    }
    fn height(&self) -> usize {
        self.h
    }
    fn stride(&self) -> usize {
        self.w
    }
    fn row(&self, y: usize) -> &[Hsv] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

/// Luma with BT.601 weights.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let p = rgb.get_pixel(x, y);
        let l = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
        Luma([l.round().clamp(0.0, 255.0) as u8])
    })
}

/// Smallest value whose cumulative count reaches `round(p/100 · total)`.
pub fn percentile(hist: &[u32; 256], p: f32) -> u8 {
    let total: u64 = hist.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0;
    }
    let target = ((p / 100.0) * total as f32).round() as u64;
    let mut acc = 0u64;
    for (value, &count) in hist.iter().enumerate() {
        acc += count as u64;
        if acc >= target {
            return value as u8;
        }
    }
    255
}
