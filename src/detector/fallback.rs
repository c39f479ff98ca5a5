//! Validation of the unrotated base rectangle when the sweep accepted nothing.
use crate::diagnostics::FallbackReport;
use crate::geometry::{Quad, RotatedRect};
use crate::sweep::{validate_rect, SweepContext};
use crate::validation::Verdict;
use log::debug;

#[derive(Clone, Copy, Debug)]
pub struct FallbackAttempt {
    /// Base rectangle at full resolution.
    pub rect: RotatedRect,
    pub quad: Quad,
    pub verdict: Verdict,
    pub accepted: bool,
}

impl FallbackAttempt {
    pub fn report(&self) -> FallbackReport {
        FallbackReport {
            verdict: self.verdict,
            accepted: self.accepted,
        }
    }
}

pub fn validate_base_rect(ctx: &SweepContext<'_>) -> Option<FallbackAttempt> {
    let rect = ctx.base.scaled(ctx.scale);
    if rect.size[0] <= 0.0 || rect.size[1] <= 0.0 {
        return None;
    }
    let (quad, verdict) = validate_rect(ctx, &rect)?;
    let accepted = verdict.accepted(&ctx.params.validation);
    debug!(
        "fallback: hue={:.3} validator={:?} accepted={}",
        verdict.hue_score,
        verdict.validator.map(|v| v.name()),
        accepted
    );
    Some(FallbackAttempt {
        rect,
        quad,
        verdict,
        accepted,
    })
}
