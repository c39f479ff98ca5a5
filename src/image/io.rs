//! I/O helpers for photographs, diagnostic images and JSON.
//!
//! - `load_rgb_image`: decode any supported format into 8-bit RGB.
//! - `save_gray_image` / `save_rgb_image`: write PNG/JPEG/etc. by extension.
//! - `write_json_file`: pretty-print a serializable value to disk.
use image::{GrayImage, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageIoError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to serialize JSON for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load an image from disk and convert to 8-bit RGB.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage, ImageIoError> {
    let img = image::open(path).map_err(|source| ImageIoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.into_rgb8())
}

pub fn save_gray_image(image: &GrayImage, path: &Path) -> Result<(), ImageIoError> {
    ensure_parent_dir(path)?;
    image.save(path).map_err(|source| ImageIoError::Save {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_rgb_image(image: &RgbImage, path: &Path) -> Result<(), ImageIoError> {
    ensure_parent_dir(path)?;
    image.save(path).map_err(|source| ImageIoError::Save {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), ImageIoError> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|source| ImageIoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ImageIoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), ImageIoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ImageIoError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}
