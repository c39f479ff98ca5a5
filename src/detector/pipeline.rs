//! The [`MarkerDetector`]: one photograph in, one [`DetectOutput`] out.
//!
//! ```no_run
//! use marker_coverage::{DetectorParams, MarkerDetector};
//!
//! # fn example(image: image::RgbImage) {
//! let detector = MarkerDetector::new(DetectorParams::default());
//! let out = detector.detect(&image);
//! match out.coverage_percent {
//!     Some(pct) => println!("marker covers {pct}%"),
//!     None => println!("no marker found"),
//! }
//! # }
//! ```
//!
//! Stages
//! - Segmentation: per-image HSV gates, hue-band mask, close then open.
//! - Component: best-scoring 8-connected blob within the area limits.
//! - Orientation: minimum-area rectangle around its outer contour.
//! - Sweep: coarse then fine trial rotations, each tightened, warped and
//!   validated; the best composite score wins.
//! - Fallback: the base rectangle itself, validated the same way.
//! - Coverage: quad area over image area.
use super::fallback::validate_base_rect;
use super::params::DetectorParams;
use crate::component::select_component;
use crate::coverage::coverage_percent;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{DetectionReport, DetectionTrace, DiagnosticImages, InputDescriptor};
use crate::geometry::Quad;
use crate::image::HsvImage;
use crate::orientation::estimate_base_orientation;
use crate::segmentation::{segment, HsvThresholds};
use crate::sweep::{AngleSweepOptimizer, SweepContext};
use crate::types::{DetectOutput, DetectionSource, Telemetry};
use crate::validation::{GridValidationCascade, ValidatorKind};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use log::debug;
use std::time::Instant;

/// Detects the 3×3 color marker and reports its coverage.
///
/// Holds only immutable state; a single detector can serve many images and
/// threads.
pub struct MarkerDetector {
    params: DetectorParams,
    cascade: GridValidationCascade,
}

impl Default for MarkerDetector {
    fn default() -> Self {
        Self::new(DetectorParams::default())
    }
}

/// Accepted geometry plus the telemetry describing it.
struct Acceptance {
    quad: Quad,
    angle_deg: f32,
    occupancy: f32,
    hue_score: f32,
    validator: Option<ValidatorKind>,
    source: DetectionSource,
}

impl Acceptance {
    fn into_output(self, thresholds: HsvThresholds, width: u32, height: u32) -> DetectOutput {
        DetectOutput {
            found: true,
            quad: Some(self.quad),
            coverage_percent: Some(coverage_percent(&self.quad, width, height)),
            telemetry: Telemetry {
                best_angle_deg: Some(self.angle_deg),
                occupancy: Some(self.occupancy),
                hue_score: Some(self.hue_score),
                grid_validated: self.validator.is_some(),
                validator: self.validator,
                source: Some(self.source),
                thresholds,
            },
        }
    }
}

/// Downscaled copy when the longer side exceeds `max_side`, with the
/// full-resolution pixels per working pixel.
fn working_image(image: &RgbImage, max_side: u32) -> Option<(RgbImage, f32)> {
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    if max_side == 0 || longest <= max_side {
        return None;
    }
    let f = max_side as f32 / longest as f32;
    let nw = ((w as f32 * f).round() as u32).max(1);
    let nh = ((h as f32 * f).round() as u32).max(1);
    let small = imageops::resize(image, nw, nh, FilterType::Triangle);
    Some((small, w as f32 / nw as f32))
}

impl MarkerDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self::with_cascade(params, GridValidationCascade::default())
    }

    /// Detector with a custom validator list.
    pub fn with_cascade(params: DetectorParams, cascade: GridValidationCascade) -> Self {
        Self { params, cascade }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    pub fn cascade(&self) -> &GridValidationCascade {
        &self.cascade
    }

    /// Locate the marker and compute its coverage.
    pub fn detect(&self, image: &RgbImage) -> DetectOutput {
        self.run(image, false).output
    }

    /// Same as [`detect`](Self::detect) plus a stage trace and, when
    /// `capture_images` is set, the intermediate images.
    pub fn detect_with_diagnostics(&self, image: &RgbImage, capture_images: bool) -> DetectionReport {
        self.run(image, capture_images)
    }

    fn finish(
        &self,
        image: &RgbImage,
        output: DetectOutput,
        mut trace: DetectionTrace,
        mask: Option<GrayImage>,
        capture: bool,
        total: Instant,
    ) -> DetectionReport {
        trace.timings.total_ms = elapsed_ms(total);
        let images = match (capture, mask) {
            (true, Some(mask)) => Some(DiagnosticImages::build(
                image,
                mask,
                output.quad.as_ref(),
                &self.params,
            )),
            _ => None,
        };
        debug!(
            "detect: found={} coverage={:?} total={:.2}ms",
            output.found, output.coverage_percent, trace.timings.total_ms
        );
        DetectionReport {
            output,
            trace,
            images,
        }
    }

    fn run(&self, image: &RgbImage, capture: bool) -> DetectionReport {
        let total = Instant::now();
        let params = &self.params;
        let (width, height) = image.dimensions();
        let mut trace = DetectionTrace::new(InputDescriptor {
            width,
            height,
            working_scale: 1.0,
        });
        if width == 0 || height == 0 {
            debug!("detect: empty image");
            return self.finish(image, DetectOutput::default(), trace, None, false, total);
        }

        // Segmentation
        let mut t = Instant::now();
        let working = working_image(image, params.segmentation.working_max_side);
        let (work_img, scale) = match &working {
            Some((img, s)) => (img, *s),
            None => (image, 1.0),
        };
        trace.input.working_scale = scale;
        let hsv = HsvImage::from_rgb(work_img);
        let seg = segment(&hsv, &params.segmentation);
        t = trace.timings.lap("segmentation", t);
        let thresholds = seg.thresholds;
        trace.thresholds = thresholds;
        trace.close_kernel = seg.close_kernel;
        trace.open_kernel = seg.open_kernel;
        let not_found = DetectOutput::not_found(thresholds);

        // Component and base orientation
        let component = match select_component(&seg.mask, &params.component) {
            Ok(c) => c,
            Err(reason) => {
                debug!("component rejected: {:?}", reason);
                trace.component_rejection = Some(reason);
                trace.timings.lap("component", t);
                return self.finish(image, not_found, trace, Some(seg.mask), capture, total);
            }
        };
        trace.component = Some(component.stats);
        let base = estimate_base_orientation(&component, &params.component);
        t = trace.timings.lap("component", t);
        let Some(base) = base else {
            return self.finish(image, not_found, trace, Some(seg.mask), capture, total);
        };
        trace.base = Some(base);

        // Sweep
        let ctx = SweepContext {
            image,
            mask: &component.mask,
            base: &base.rect,
            scale,
            params,
            cascade: &self.cascade,
        };
        let outcome = AngleSweepOptimizer::new(ctx).run();
        t = trace.timings.lap("sweep", t);
        trace.passes = outcome.passes;
        trace.early_stopped = outcome.early_stopped;

        let accepted = match outcome.best {
            Some(best) => Some(Acceptance {
                quad: best.quad,
                angle_deg: best.angle_deg,
                occupancy: best.occupancy,
                hue_score: best.hue_score,
                validator: best.validator,
                source: DetectionSource::Sweep,
            }),
            None => {
                let attempt = validate_base_rect(&ctx);
                trace.timings.lap("fallback", t);
                trace.fallback = attempt.as_ref().map(|a| a.report());
                attempt.filter(|a| a.accepted).map(|a| Acceptance {
                    quad: a.quad,
                    angle_deg: a.rect.angle_deg,
                    occupancy: 1.0,
                    hue_score: a.verdict.hue_score,
                    validator: a.verdict.validator,
                    source: DetectionSource::Fallback,
                })
            }
        };

        let output = accepted.map_or(not_found, |a| a.into_output(thresholds, width, height));
        self.finish(image, output, trace, Some(seg.mask), capture, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn empty_image_is_not_found() {
        let out = MarkerDetector::default().detect(&RgbImage::new(0, 0));
        assert!(!out.found);
        assert_eq!(out.coverage_percent, None);
        assert_eq!(out.quad, None);
    }

    #[test]
    fn flat_gray_image_reports_no_component() {
        let img = RgbImage::from_pixel(200, 150, Rgb([128, 128, 128]));
        let report = MarkerDetector::default().detect_with_diagnostics(&img, true);
        assert!(!report.output.found);
        assert!(report.trace.component.is_none());
        assert!(report.trace.component_rejection.is_some());
        assert!(report.trace.passes.is_empty());
        let images = report.images.expect("images");
        assert!(images.warp.is_none());
        assert_eq!(images.mask.dimensions(), (200, 150));
    }

    #[test]
    fn working_image_keeps_the_aspect_ratio() {
        let img = RgbImage::new(1000, 500);
        let (small, scale) = working_image(&img, 400).expect("downscaled");
        assert_eq!(small.dimensions(), (400, 200));
        assert_eq!(scale, 2.5);
        assert!(working_image(&img, 0).is_none());
        assert!(working_image(&img, 1000).is_none());
    }
}
