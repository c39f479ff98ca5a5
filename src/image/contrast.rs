//! Local contrast operators on 8-bit gray images: tile-based CLAHE and an
//! inverted adaptive mean threshold.
use super::filters::{convolve_separable, BorderMode, BoxFilter};
use super::ImageF32;
use image::{GrayImage, Luma};

/// Contrast-limited adaptive histogram equalisation.
///
/// The image is split into `grid × grid` tiles (fewer on tiny inputs). Each
/// tile's histogram is clipped at `clip_limit · area / 256`, the excess is
/// spread uniformly, and the per-tile lookup tables are blended bilinearly
/// between tile centres.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: usize) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w == 0 || h == 0 || grid == 0 {
        return gray.clone();
    }
    let tile_w = w.div_ceil(grid.min(w));
    let tile_h = h.div_ceil(grid.min(h));
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, y0) = (tx * tile_w, ty * tile_h);
            let (x1, y1) = ((x0 + tile_w).min(w), (y0 + tile_h).min(h));
            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x as u32, y as u32)[0] as usize] += 1;
                }
            }
            let area = ((x1 - x0) * (y1 - y0)) as u32;
            luts[ty * tiles_x + tx] = tile_lut(&mut hist, area, clip_limit);
        }
    }

    let axis = |p: usize, tile: usize, tiles: usize| -> (usize, usize, f32) {
        let f = (p as f32 + 0.5) / tile as f32 - 0.5;
        if f <= 0.0 {
            return (0, 0, 0.0);
        }
        let i0 = (f.floor() as usize).min(tiles - 1);
        let i1 = (i0 + 1).min(tiles - 1);
        (i0, i1, (f - i0 as f32).clamp(0.0, 1.0))
    };

    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let v = gray.get_pixel(x, y)[0] as usize;
        let (tx0, tx1, ax) = axis(x as usize, tile_w, tiles_x);
        let (ty0, ty1, ay) = axis(y as usize, tile_h, tiles_y);
        let lut = |tx: usize, ty: usize| luts[ty * tiles_x + tx][v] as f32;
        let top = lut(tx0, ty0) * (1.0 - ax) + lut(tx1, ty0) * ax;
        let bottom = lut(tx0, ty1) * (1.0 - ax) + lut(tx1, ty1) * ax;
        Luma([(top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8])
    })
}

fn tile_lut(hist: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if area == 0 {
        return lut;
    }
    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut clipped = 0u32;
        for bin in hist.iter_mut() {
            if *bin > limit {
                clipped += *bin - limit;
                *bin = limit;
            }
        }
        let batch = clipped / 256;
        let residual = (clipped % 256) as usize;
        for bin in hist.iter_mut() {
            *bin += batch;
        }
        if residual > 0 {
            let step = (256 / residual).max(1);
            for bin in hist.iter_mut().step_by(step).take(residual) {
                *bin += 1;
            }
        }
    }
    let scale = 255.0 / area as f32;
    let mut acc = 0u32;
    for (dst, &count) in lut.iter_mut().zip(hist.iter()) {
        acc += count;
        *dst = (acc as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Marks pixels at least `offset` darker than their `block × block` mean
/// (replicated border) with 255, everything else with 0.
pub fn adaptive_mean_threshold_inv(gray: &GrayImage, block: usize, offset: f32) -> GrayImage {
    let src = ImageF32::from_gray(gray);
    let mean = convolve_separable(&src, &BoxFilter::new(block / 2), BorderMode::Replicate);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let (xi, yi) = (x as usize, y as usize);
        let m = mean.get(xi, yi).round();
        if src.get(xi, yi) > m - offset {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}
