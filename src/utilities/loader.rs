use std::{io::ErrorKind, path::Path};

use image::{imageops::FilterType, DynamicImage, ImageError};
use ndarray::Array3;

use crate::{Result, StatsConfig, StatsError, Transform};


/// Opens and decodes `path`, guessing the format from the content when the
/// extension says nothing.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let io_err = |source| StatsError::Io { path: path.to_path_buf(), source };

    image::io::Reader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?
        .decode()
        .map_err(|e| classify_decode_error(path, e))
}

fn classify_decode_error(path: &Path, err: ImageError) -> StatsError {
    let path = path.to_path_buf();
    match err {
        ImageError::Unsupported(e) => StatsError::UnsupportedFormat { path, reason: e.to_string() },
        // truncated files surface as io errors from some decoders
        ImageError::IoError(source)
            if !matches!(source.kind(), ErrorKind::UnexpectedEof | ErrorKind::InvalidData) =>
        {
            StatsError::Io { path, source }
        }
        other => StatsError::CorruptData { path, reason: other.to_string() },
    }
}

pub fn check_channels(path: &Path, img: &DynamicImage, expected: usize) -> Result<()> {
    let found = img.color().channel_count() as usize;
    if found != expected {
        return Err(StatsError::ShapeMismatch { path: path.to_path_buf(), expected, found });
    }
    Ok(())
}

pub fn apply_transforms(mut img: DynamicImage, transforms: &[Transform]) -> DynamicImage {
    for t in transforms {
        img = match *t {
            Transform::Resize { width, height } => img.resize_exact(width, height, FilterType::Triangle),
            Transform::CenterCrop { width, height } => {
                let width = width.min(img.width());
                let height = height.min(img.height());
                let x = (img.width() - width) / 2;
                let y = (img.height() - height) / 2;
                img.crop_imm(x, y, width, height)
            }
        };
    }
    img
}

/// Decode, validate channel count, run the transform pipeline.
pub fn load_img(path: &Path, config: &StatsConfig) -> Result<DynamicImage> {
    let img = open_image(path)?;
    check_channels(path, &img, config.channels)?;
    let img = apply_transforms(img, &config.transforms);
    if img.width() == 0 || img.height() == 0 {
        return Err(StatsError::CorruptData {
            path: path.to_path_buf(),
            reason: "image has no pixels".to_string(),
        });
    }
    Ok(img)
}

/// Image as a `(C, H, W)` tensor in `[0, 1]`, whatever the stored bit depth.
pub fn load_img_normalized_chw(path: &Path, config: &StatsConfig) -> Result<Array3<f64>> {
    let img = load_img(path, config)?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    let raw: Vec<f32> = match config.channels {
        1 => img.to_luma32f().into_raw(),
        4 => img.to_rgba32f().into_raw(),
        _ => img.to_rgb32f().into_raw(),
    };
    let hwc = Array3::from_shape_vec((h, w, config.channels), raw).map_err(|e| {
        StatsError::CorruptData { path: path.to_path_buf(), reason: e.to_string() }
    })?;
    Ok(hwc.mapv(f64::from).permuted_axes([2, 0, 1]))
}

/// Image as an `(H, W, C)` array of 8-bit intensities divided by 255.
pub fn load_img_normalized_hwc(path: &Path, config: &StatsConfig) -> Result<Array3<f64>> {
    let img = load_img(path, config)?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    let raw: Vec<u8> = match config.channels {
        1 => img.to_luma8().into_raw(),
        4 => img.to_rgba8().into_raw(),
        _ => img.to_rgb8().into_raw(),
    };
    let hwc = Array3::from_shape_vec((h, w, config.channels), raw).map_err(|e| {
        StatsError::CorruptData { path: path.to_path_buf(), reason: e.to_string() }
    })?;
    Ok(hwc.mapv(|b| b as f64 / 255.))
}
