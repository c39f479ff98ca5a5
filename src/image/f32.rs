//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Used for every numeric plane of the validators: grayscale, gradient
//! responses, color-vector components. Also hosts the axis projections the
//! peak tests consume.
use super::traits::{ImageView, ImageViewMut};
use image::GrayImage;

#[derive(Clone, Debug)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Build a plane by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(w: usize, h: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(f(x, y));
            }
        }
        Self {
            w,
            h,
            stride: w,
            data,
        }
    }

    /// Lift an 8-bit gray image into float intensities (0..=255).
    pub fn from_gray(gray: &GrayImage) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        Self {
            w,
            h,
            stride: w,
            data: gray.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }

    /// Round and saturate back into an 8-bit gray image.
    pub fn to_gray(&self) -> GrayImage {
        let raw = self
            .data
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        GrayImage::from_raw(self.w as u32, self.h as u32, raw)
            .unwrap_or_else(|| GrayImage::new(self.w as u32, self.h as u32))
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    /// Sum of every column, one entry per x.
    pub fn column_sums(&self) -> Vec<f32> {
        let mut sums = vec![0.0f32; self.w];
        for row in self.rows() {
            for (acc, &v) in sums.iter_mut().zip(row) {
                *acc += v;
            }
        }
        sums
    }

    /// Sum of every row, one entry per y.
    pub fn row_sums(&self) -> Vec<f32> {
        self.rows().map(|row| row.iter().sum()).collect()
    }

    /// `(min, max)` over all pixels; `None` for an empty plane.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.data.iter().copied();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Rescale to [0, 1] in place. A flat plane becomes all zeros.
    pub fn normalize_min_max(&mut self) {
        let Some((lo, hi)) = self.min_max() else {
            return;
        };
        let range = hi - lo;
        if range <= f32::EPSILON {
            self.data.fill(0.0);
            return;
        }
        let inv = 1.0 / range;
        self.map_in_place(|v| (v - lo) * inv);
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}
