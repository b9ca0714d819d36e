use std::path::{Path, PathBuf};

mod file_tree;
mod image_folder;
pub use file_tree::*;
pub use image_folder::*;

/// One file of a dataset. The label is only known for labeled layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: PathBuf,
    pub label: Option<usize>,
}

/// An ordered, fully enumerated set of image files below a root directory.
pub trait Dataset: Sync {
    fn root(&self) -> &Path;
    fn samples(&self) -> &[Sample];
    fn class_name(&self, num: usize) -> Option<String>;

    fn len(&self) -> usize {
        self.samples().len()
    }

    fn is_empty(&self) -> bool {
        self.samples().is_empty()
    }
}

pub(crate) fn ensure_dir(root: &Path) -> crate::Result<()> {
    if !root.is_dir() {
        return Err(crate::StatsError::DirectoryNotFound(root.to_path_buf()));
    }
    Ok(())
}
