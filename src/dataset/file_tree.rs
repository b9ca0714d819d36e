use std::path::{Path, PathBuf};

use log::info;
use walkdir::WalkDir;

use crate::Result;

use super::{ensure_dir, Dataset, Sample};

/// Every regular file below a root, at any depth, in sorted path order.
///
/// Extensions are not looked at, so anything that is not an image shows up
/// later as a decode error.
#[derive(Debug)]
pub struct FileTree {
    root: PathBuf,
    samples: Vec<Sample>,
}

impl FileTree {
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        ensure_dir(&root)?;

        let mut samples = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let path = entry?.into_path();
            if path.is_file() {
                samples.push(Sample { path, label: None });
            }
        }
        info!("file tree {:?}: {} files", root, samples.len());

        Ok(Self { root, samples })
    }
}

impl Dataset for FileTree {
    fn root(&self) -> &Path {
        &self.root
    }

    fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn class_name(&self, _num: usize) -> Option<String> {
        None
    }
}
