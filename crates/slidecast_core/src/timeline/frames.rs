//! Renderer-compatibility frame preparation.
//!
//! yuv420p encoders require even pixel dimensions. Slide rasterizers do
//! not guarantee that, so odd-sized frames are cropped (never resampled)
//! to the nearest even size. This is the only place the engine touches
//! pixels; DSP code never sees images.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from frame preparation.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to open slide image {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to save prepared frame {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Slide image {path} is too small to crop to even dimensions")]
    TooSmall { path: String },
}

/// Prepare a slide image for encoding.
///
/// Returns the original path when the dimensions are already even.
/// Otherwise writes an even-cropped copy into `work_dir` under a name
/// derived from `index` and returns that path.
pub fn prepare_frame(image_path: &Path, work_dir: &Path, index: u64) -> Result<PathBuf, FrameError> {
    let img = image::open(image_path).map_err(|source| FrameError::Open {
        path: image_path.display().to_string(),
        source,
    })?;

    let (width, height) = (img.width(), img.height());
    let even_width = width - (width % 2);
    let even_height = height - (height % 2);

    if even_width == width && even_height == height {
        return Ok(image_path.to_path_buf());
    }

    if even_width == 0 || even_height == 0 {
        return Err(FrameError::TooSmall {
            path: image_path.display().to_string(),
        });
    }

    tracing::debug!(
        "Cropping {} from {}x{} to {}x{}",
        image_path.display(),
        width,
        height,
        even_width,
        even_height
    );

    let cropped = img.crop_imm(0, 0, even_width, even_height);
    let out_path = prepared_frame_path(work_dir, index);
    cropped.save(&out_path).map_err(|source| FrameError::Save {
        path: out_path.display().to_string(),
        source,
    })?;

    Ok(out_path)
}

/// Derived path for a prepared frame. Re-derivable across retries.
pub fn prepared_frame_path(work_dir: &Path, index: u64) -> PathBuf {
    work_dir.join(format!("frame_{:03}.png", index))
}
