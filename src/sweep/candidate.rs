//! Per-angle candidate evaluation and the candidate ordering.
use super::tighten::rotate_and_tighten;
use crate::detector::params::{DetectorParams, SweepParams};
use crate::geometry::{Quad, RotatedRect};
use crate::normalize::{candidate_roi, warp_to_square};
use crate::validation::{GridValidationCascade, ValidatorKind, Verdict};
use image::{GrayImage, RgbImage};
use serde::Serialize;

/// Read-only inputs shared by every evaluation of a run.
#[derive(Clone, Copy)]
pub struct SweepContext<'a> {
    /// Full-resolution photograph; warps are sampled from it.
    pub image: &'a RgbImage,
    /// Selected component at working resolution.
    pub mask: &'a GrayImage,
    /// Base rectangle at working resolution.
    pub base: &'a RotatedRect,
    /// Full-resolution pixels per working pixel.
    pub scale: f32,
    pub params: &'a DetectorParams,
    pub cascade: &'a GridValidationCascade,
}

/// An accepted trial rotation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Position of the trial in evaluation order across passes.
    pub index: usize,
    pub angle_deg: f32,
    /// Tight rectangle at full resolution.
    pub rect: RotatedRect,
    pub quad: Quad,
    pub occupancy: f32,
    pub hue_score: f32,
    pub validator: Option<ValidatorKind>,
    pub score: f32,
}

impl Candidate {
    /// Validated with occupancy and hue above the early-stop thresholds.
    pub fn is_strong(&self, sweep: &SweepParams) -> bool {
        self.validator.is_some()
            && self.occupancy > sweep.early_stop_occupancy
            && self.hue_score > sweep.early_stop_hue
    }

    /// Higher score wins; equal scores go to the earlier trial.
    #[inline]
    pub fn beats(&self, other: &Candidate) -> bool {
        self.score > other.score || (self.score == other.score && self.index < other.index)
    }
}

/// Commutative, associative merge of two optional bests.
pub fn pick_better(a: Option<Candidate>, b: Option<Candidate>) -> Option<Candidate> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if y.beats(&x) { y } else { x }),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Composite score `occupancy · (0.5 + 0.5 · hue)`.
#[inline]
pub fn candidate_score(occupancy: f32, hue_score: f32) -> f32 {
    occupancy * (0.5 + 0.5 * hue_score)
}

/// Warp a full-resolution rectangle through its padded region and run the
/// cascade. `None` when the region falls outside the image.
pub fn validate_rect(ctx: &SweepContext<'_>, rect: &RotatedRect) -> Option<(Quad, Verdict)> {
    let sweep = &ctx.params.sweep;
    let quad = rect.quad();
    let roi = candidate_roi(
        &quad,
        rect.size[0].max(rect.size[1]),
        sweep.roi_pad_frac,
        sweep.roi_pad_min_px,
        ctx.image.width(),
        ctx.image.height(),
    )?;
    let warp = warp_to_square(ctx.image, &quad, &roi, ctx.params.validation.warp_size);
    Some((quad, ctx.cascade.evaluate(&warp, &ctx.params.validation)))
}

/// Tighten, gate, warp and validate one trial angle.
pub fn evaluate_angle(ctx: &SweepContext<'_>, index: usize, angle_deg: f32) -> Option<Candidate> {
    let sweep = &ctx.params.sweep;
    let tight = rotate_and_tighten(ctx.mask, ctx.base, angle_deg)?;
    let rect = tight.rect;
    if rect.size[0] <= 0.0 || rect.size[1] <= 0.0 {
        return None;
    }
    if rect.aspect() > sweep.max_aspect || tight.occupancy < sweep.min_occupancy {
        return None;
    }

    let rect = rect.scaled(ctx.scale);
    let (quad, verdict) = validate_rect(ctx, &rect)?;
    if !verdict.accepted(&ctx.params.validation) {
        return None;
    }
    Some(Candidate {
        index,
        angle_deg,
        rect,
        quad,
        occupancy: tight.occupancy,
        hue_score: verdict.hue_score,
        validator: verdict.validator,
        score: candidate_score(tight.occupancy, verdict.hue_score),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: usize, score: f32) -> Candidate {
        let rect = RotatedRect {
            center: [0.0, 0.0],
            size: [1.0, 1.0],
            angle_deg: 0.0,
        };
        Candidate {
            index,
            angle_deg: 0.0,
            rect,
            quad: rect.quad(),
            occupancy: 1.0,
            hue_score: 1.0,
            validator: Some(ValidatorKind::LinePeaks),
            score,
        }
    }

    #[test]
    fn merge_prefers_score_then_earlier_index() {
        let a = candidate(3, 0.8);
        let b = candidate(1, 0.8);
        let c = candidate(7, 0.9);
        assert_eq!(pick_better(Some(a), Some(b)).map(|x| x.index), Some(1));
        assert_eq!(pick_better(Some(b), Some(a)).map(|x| x.index), Some(1));
        assert_eq!(pick_better(Some(a), Some(c)).map(|x| x.index), Some(7));
        assert_eq!(pick_better(None, Some(a)).map(|x| x.index), Some(3));
        assert_eq!(pick_better(None, None), None);
    }

    #[test]
    fn score_weights_hue_by_half() {
        assert_eq!(candidate_score(0.8, 0.0), 0.4);
        assert_eq!(candidate_score(0.8, 1.0), 0.8);
    }
}
