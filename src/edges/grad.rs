//! 3×3 Sobel derivatives with border clamping.
//!
//! Validators only need the per-axis responses and the L1 magnitude
//! `|gx| + |gy|`, so no orientation or Euclidean magnitude is cached.
//!
//! Complexity: O(W·H) per pass.
use crate::image::{ImageF32, ImageView, ImageViewMut};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Horizontal and vertical derivative planes.
#[derive(Clone, Debug)]
pub struct Grad {
    /// Horizontal derivative (convolution with kernel X)
    pub gx: ImageF32,
    /// Vertical derivative (convolution with kernel Y)
    pub gy: ImageF32,
}

impl Grad {
    /// `|gx| + |gy|` per pixel.
    pub fn l1_magnitude(&self) -> ImageF32 {
        let mut out = ImageF32::new(self.gx.w, self.gx.h);
        for ((o, &x), &y) in out.data.iter_mut().zip(&self.gx.data).zip(&self.gy.data) {
            *o = x.abs() + y.abs();
        }
        out
    }
}

/// Sobel derivatives of `l`.
pub fn sobel_gradients(l: &ImageF32) -> Grad {
    let w = l.w;
    let h = l.h;
    let mut gx = ImageF32::new(w, h);
    let mut gy = ImageF32::new(w, h);

    if w == 0 || h == 0 {
        return Grad { gx, gy };
    }

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        let rows = [l.row(y_idx[0]), l.row(y_idx[1]), l.row(y_idx[2])];
        let out_gx = gx.row_mut(y);
        let out_gy = gy.row_mut(y);
        for x in 0..w {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, yy_row) in rows.iter().enumerate() {
                let kx_row = &SOBEL_KERNEL_X[ky];
                let ky_row = &SOBEL_KERNEL_Y[ky];
                sum_x += yy_row[x_idx[0]] * kx_row[0]
                    + yy_row[x_idx[1]] * kx_row[1]
                    + yy_row[x_idx[2]] * kx_row[2];
                sum_y += yy_row[x_idx[0]] * ky_row[0]
                    + yy_row[x_idx[1]] * ky_row[1]
                    + yy_row[x_idx[2]] * ky_row[2];
            }

            out_gx[x] = sum_x;
            out_gy[x] = sum_y;
        }
    }

    Grad { gx, gy }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_step_responds_only_in_x() {
        let img = ImageF32::from_fn(8, 8, |x, _| if x < 4 { 0.0 } else { 1.0 });
        let g = sobel_gradients(&img);
        assert_eq!(g.gx.get(4, 4), 4.0);
        assert_eq!(g.gy.get(4, 4), 0.0);
        assert_eq!(g.l1_magnitude().get(0, 4), 0.0);
    }
}
