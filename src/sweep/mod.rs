//! Coarse-to-fine rotation sweep.
//!
//! Each pass evaluates a symmetric set of trial angles around a centre: the
//! coarse pass around the base angle, the fine pass around the coarse winner
//! (or the base angle when the coarse pass accepted nothing). Evaluations of
//! one pass are independent and run on the rayon pool; every worker folds its
//! own best and the partial bests are merged by score, then trial index, so
//! the winner does not depend on scheduling.
//!
//! A validated candidate with high occupancy and hue ends the sweep after its
//! pass. With `eager_stop`, the worker that finds it raises a shared flag and
//! trials that have not started yet are skipped.
pub mod candidate;
pub mod tighten;

pub use candidate::{evaluate_angle, pick_better, validate_rect, Candidate, SweepContext};

use crate::angle::sweep_offsets;
use log::debug;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Summary of one pass for diagnostics.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepPassReport {
    pub label: String,
    pub center_deg: f32,
    pub step_deg: f32,
    pub range_deg: f32,
    pub trials: usize,
    pub evaluated: usize,
    pub accepted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_angle_deg: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<f32>,
    pub early_stop: bool,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug)]
pub struct SweepOutcome {
    pub best: Option<Candidate>,
    pub passes: Vec<SweepPassReport>,
    pub early_stopped: bool,
}

#[derive(Clone, Copy, Default)]
struct PassAccum {
    best: Option<Candidate>,
    evaluated: usize,
    accepted: usize,
}

impl PassAccum {
    fn visit(
        mut self,
        ctx: &SweepContext<'_>,
        index: usize,
        angle: f32,
        stop: &AtomicBool,
    ) -> Self {
        if stop.load(Ordering::Relaxed) {
            return self;
        }
        self.evaluated += 1;
        if let Some(c) = evaluate_angle(ctx, index, angle) {
            self.accepted += 1;
            if ctx.params.sweep.eager_stop && c.is_strong(&ctx.params.sweep) {
                stop.store(true, Ordering::Relaxed);
            }
            self.best = pick_better(self.best, Some(c));
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            best: pick_better(self.best, other.best),
            evaluated: self.evaluated + other.evaluated,
            accepted: self.accepted + other.accepted,
        }
    }
}

fn run_trials(
    ctx: &SweepContext<'_>,
    trials: &[(usize, f32)],
    stop: &AtomicBool,
) -> PassAccum {
    #[cfg(feature = "parallel")]
    {
        trials
            .par_iter()
            .fold(PassAccum::default, |acc, &(i, a)| acc.visit(ctx, i, a, stop))
            .reduce(PassAccum::default, PassAccum::merge)
    }
    #[cfg(not(feature = "parallel"))]
    {
        trials
            .iter()
            .fold(PassAccum::default(), |acc, &(i, a)| acc.visit(ctx, i, a, stop))
    }
}

/// Runs the coarse pass and, unless it was already conclusive, the fine pass.
pub struct AngleSweepOptimizer<'a> {
    ctx: SweepContext<'a>,
}

impl<'a> AngleSweepOptimizer<'a> {
    pub fn new(ctx: SweepContext<'a>) -> Self {
        Self { ctx }
    }

    fn pass(
        &self,
        label: &str,
        center: f32,
        step: f32,
        range: f32,
        first_index: usize,
        stop: &AtomicBool,
    ) -> (PassAccum, SweepPassReport) {
        let start = Instant::now();
        let trials: Vec<(usize, f32)> = sweep_offsets(step, range)
            .into_iter()
            .enumerate()
            .map(|(i, d)| (first_index + i, center + d))
            .collect();
        let acc = run_trials(&self.ctx, &trials, stop);
        let strong = acc
            .best
            .is_some_and(|c| c.is_strong(&self.ctx.params.sweep));
        if strong {
            stop.store(true, Ordering::Relaxed);
        }
        let report = SweepPassReport {
            label: label.to_string(),
            center_deg: center,
            step_deg: step,
            range_deg: range,
            trials: trials.len(),
            evaluated: acc.evaluated,
            accepted: acc.accepted,
            best_angle_deg: acc.best.map(|c| c.angle_deg),
            best_score: acc.best.map(|c| c.score),
            early_stop: strong,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        debug!(
            "sweep {}: center={:.2} trials={} evaluated={} accepted={} best={:?} early_stop={}",
            label,
            center,
            report.trials,
            report.evaluated,
            report.accepted,
            report.best_angle_deg,
            strong
        );
        (acc, report)
    }

    pub fn run(&self) -> SweepOutcome {
        let sweep = &self.ctx.params.sweep;
        let base_angle = self.ctx.base.angle_deg;
        let stop = AtomicBool::new(false);
        let mut passes = Vec::with_capacity(2);

        let (coarse, report) = self.pass(
            "coarse",
            base_angle,
            sweep.coarse_step_deg,
            sweep.coarse_range_deg,
            0,
            &stop,
        );
        let coarse_trials = report.trials;
        passes.push(report);
        if stop.load(Ordering::Relaxed) {
            return SweepOutcome {
                best: coarse.best,
                passes,
                early_stopped: true,
            };
        }

        let fine_center = coarse.best.map_or(base_angle, |c| c.angle_deg);
        let (fine, report) = self.pass(
            "fine",
            fine_center,
            sweep.fine_step_deg,
            sweep.fine_range_deg,
            coarse_trials,
            &stop,
        );
        passes.push(report);
        SweepOutcome {
            best: pick_better(coarse.best, fine.best),
            passes,
            early_stopped: stop.load(Ordering::Relaxed),
        }
    }
}
