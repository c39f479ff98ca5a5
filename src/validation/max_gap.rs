//! Two strongest, well separated grayscale edge positions per axis; both must
//! sit at the thirds.
use super::profile::{best_cut_pair, nearest_third, smooth5};
use super::{StructuralValidator, ValidationInput, ValidatorKind};
use crate::detector::params::ValidationParams;
use crate::edges::sobel_gradients;
use crate::image::ImageF32;

pub struct MaxGapTwoCuts;

fn cuts_at_thirds(profile: &[f32], params: &ValidationParams) -> bool {
    let n = profile.len();
    if n < params.peaks.min_profile_len {
        return false;
    }
    let smoothed = smooth5(profile);
    let min_gap = (params.peaks.min_peak_sep * n as f32).round() as usize;
    let Some((i, j)) = best_cut_pair(&smoothed, min_gap) else {
        return false;
    };
    let tol = params.peaks.thirds_tol;
    nearest_third(i, n, tol) == Some(0) && nearest_third(j, n, tol) == Some(1)
}

impl StructuralValidator for MaxGapTwoCuts {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::MaxGapTwoCuts
    }

    fn accept(&self, input: &ValidationInput, params: &ValidationParams) -> bool {
        let mag = sobel_gradients(&ImageF32::from_gray(&input.gray)).l1_magnitude();
        cuts_at_thirds(&mag.column_sums(), params) && cuts_at_thirds(&mag.row_sums(), params)
    }
}
