//! Batch driver: input discovery, per-image detection and the CSV report.
use crate::diagnostics::{save_artifacts, ArtifactPaths};
use crate::image::io::{ensure_parent_dir, load_rgb_image, ImageIoError};
use crate::MarkerDetector;
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("input path does not exist: {path}")]
    Missing { path: PathBuf },
    #[error("no images found in {path}")]
    NoImages { path: PathBuf },
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Io(#[from] ImageIoError),
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// A file yields itself; a directory yields its image files sorted by path
/// (non-recursive).
pub fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(BatchError::Missing {
            path: path.to_path_buf(),
        });
    }
    let entries = fs::read_dir(path).map_err(|source| BatchError::ReadDir {
        path: path.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image_path(p))
        .collect();
    if files.is_empty() {
        return Err(BatchError::NoImages {
            path: path.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

#[derive(Clone, Debug, Default)]
pub struct BatchOptions {
    /// Directory for debug images; defaults to each input's own directory.
    pub artifacts_dir: Option<PathBuf>,
    pub save_debug: bool,
}

impl BatchOptions {
    fn artifact_base(&self, input: &Path) -> PathBuf {
        let stem = input.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
        match &self.artifacts_dir {
            Some(dir) => dir.join(stem),
            None => input.with_file_name(stem),
        }
    }
}

/// One line of the batch report.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchRow {
    pub path: String,
    pub found: bool,
    /// Coverage percentage, `-1` when no marker was found.
    pub percent: i32,
    pub angle: Option<f32>,
    pub occupancy: Option<f32>,
    pub hue_score: Option<f32>,
    pub line_ok: bool,
    pub validator: Option<&'static str>,
    pub source: Option<&'static str>,
    pub elapsed_ms: f64,
    pub s_min: Option<u8>,
    pub v_min: Option<u8>,
    pub v_max: Option<u8>,
    pub debug_mask: Option<String>,
    pub debug_quad: Option<String>,
    pub debug_warp: Option<String>,
    pub debug_crop: Option<String>,
    pub debug_clip: Option<String>,
    pub error: Option<String>,
}

impl BatchRow {
    fn failed(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            percent: -1,
            error: Some(error),
            ..Self::default()
        }
    }

    fn set_artifacts(&mut self, paths: &ArtifactPaths) {
        let s = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        self.debug_mask = s(&paths.mask);
        self.debug_quad = s(&paths.quad);
        self.debug_warp = s(&paths.warp);
        self.debug_crop = s(&paths.crop);
        self.debug_clip = s(&paths.clip);
    }
}

/// Detect on one image file. Decode and artifact failures are recorded in
/// the row's error note.
pub fn process_image(path: &Path, detector: &MarkerDetector, options: &BatchOptions) -> BatchRow {
    let image = match load_rgb_image(path) {
        Ok(img) => img,
        Err(e) => {
            warn!("{}", e);
            return BatchRow::failed(path, e.to_string());
        }
    };
    let start = Instant::now();
    let report = detector.detect_with_diagnostics(&image, options.save_debug);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let out = &report.output;
    let t = &out.telemetry;
    let mut row = BatchRow {
        path: path.display().to_string(),
        found: out.found,
        percent: out.coverage_percent.map_or(-1, i32::from),
        angle: t.best_angle_deg,
        occupancy: t.occupancy,
        hue_score: t.hue_score,
        line_ok: t.grid_validated,
        validator: t.validator.map(|v| v.name()),
        source: t.source.map(|s| s.name()),
        elapsed_ms,
        s_min: Some(t.thresholds.s_min),
        v_min: Some(t.thresholds.v_min),
        v_max: Some(t.thresholds.v_max),
        ..BatchRow::default()
    };
    if let Some(images) = &report.images {
        match save_artifacts(images, &options.artifact_base(path)) {
            Ok(paths) => row.set_artifacts(&paths),
            Err(e) => {
                warn!("{}", e);
                row.error = Some(e.to_string());
            }
        }
    }
    debug!("{}: found={} percent={}", row.path, row.found, row.percent);
    row
}

pub fn run_batch(paths: &[PathBuf], detector: &MarkerDetector, options: &BatchOptions) -> Vec<BatchRow> {
    paths
        .iter()
        .map(|p| process_image(p, detector, options))
        .collect()
}

pub fn write_csv_report(path: &Path, rows: &[BatchRow]) -> Result<(), BatchError> {
    ensure_parent_dir(path)?;
    let report = |source| BatchError::Report {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(report)?;
    for row in rows {
        writer.serialize(row).map_err(report)?;
    }
    writer.flush().map_err(|e| report(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn directories_yield_sorted_images_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["b.PNG", "a.jpg", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").expect("write");
        }
        fs::create_dir(dir.path().join("nested.png")).expect("mkdir");
        let files = collect_inputs(dir.path()).expect("inputs");
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, ["a.jpg", "b.PNG"]);
    }

    #[test]
    fn missing_and_empty_inputs_are_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            collect_inputs(&dir.path().join("nope")),
            Err(BatchError::Missing { .. })
        ));
        assert!(matches!(
            collect_inputs(dir.path()),
            Err(BatchError::NoImages { .. })
        ));
    }

    #[test]
    fn undecodable_file_becomes_a_failed_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bogus = dir.path().join("broken.png");
        fs::write(&bogus, b"not an image").expect("write");
        let gray = dir.path().join("gray.png");
        RgbImage::from_pixel(64, 48, Rgb([128, 128, 128]))
            .save(&gray)
            .expect("save");

        let rows = run_batch(
            &[bogus, gray],
            &MarkerDetector::default(),
            &BatchOptions::default(),
        );
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].found);
        assert_eq!(rows[0].percent, -1);
        assert!(rows[0].error.is_some());
        assert!(!rows[1].found);
        assert!(rows[1].error.is_none());

        let report = dir.path().join("out/report.csv");
        write_csv_report(&report, &rows).expect("csv");
        let text = fs::read_to_string(&report).expect("read");
        let mut lines = text.lines();
        assert!(lines.next().is_some_and(|h| h.starts_with("path,found,percent,")));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn artifact_base_uses_the_stem() {
        let opts = BatchOptions {
            artifacts_dir: Some(PathBuf::from("/tmp/dbg")),
            save_debug: true,
        };
        assert_eq!(
            opts.artifact_base(Path::new("/data/shot.jpg")),
            PathBuf::from("/tmp/dbg/shot")
        );
        assert_eq!(
            BatchOptions::default().artifact_base(Path::new("/data/shot.jpg")),
            PathBuf::from("/data/shot")
        );
    }
}
