use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::Array3;
use walkdir::WalkDir;

use crate::{utilities::load_img_normalized_chw, Result, StatsConfig, StatsError};

use super::{ensure_dir, Dataset, Sample};

/// Extensions accepted inside class folders, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp", "gif", "tga",
];

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Labeled image folder: every immediate subdirectory of the root is a class,
/// labels are assigned in sorted name order.
///
/// ```text
/// root/
/// ├── daisy/
/// │   ├── 001.jpg
/// │   └── 002.jpg
/// └── roses/
///     └── ...
/// ```
#[derive(Debug)]
pub struct ImageFolder {
    root: PathBuf,
    classes: Vec<String>,
    samples: Vec<Sample>,
}

impl ImageFolder {
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        ensure_dir(&root)?;

        let io_err = |source| StatsError::Io { path: root.clone(), source };
        let mut classes = Vec::new();
        for entry in std::fs::read_dir(&root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if entry.path().is_dir() {
                classes.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        classes.sort();

        let mut samples = Vec::new();
        for (label, class) in classes.iter().enumerate() {
            let before = samples.len();
            for entry in WalkDir::new(root.join(class)).min_depth(1).sort_by_file_name() {
                let entry = entry?;
                let path = entry.into_path();
                if path.is_file() && has_image_extension(&path) {
                    samples.push(Sample { path, label: Some(label) });
                }
            }
            debug!("class '{}' (label {}): {} images", class, label, samples.len() - before);
        }

        if classes.is_empty() {
            warn!("no class folders under {:?}", root);
        }
        info!("image folder {:?}: {} classes, {} images", root, classes.len(), samples.len());

        Ok(Self { root, classes, samples })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Decodes sample `index` into a `(C, H, W)` tensor in `[0, 1]` with its label.
    pub fn get(&self, index: usize, config: &StatsConfig) -> Result<(Array3<f64>, usize)> {
        let sample = &self.samples[index];
        let tensor = load_img_normalized_chw(&sample.path, config)?;
        Ok((tensor, sample.label.unwrap_or_default()))
    }
}

impl Dataset for ImageFolder {
    fn root(&self) -> &Path {
        &self.root
    }

    fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn class_name(&self, num: usize) -> Option<String> {
        self.classes.get(num).cloned()
    }
}
