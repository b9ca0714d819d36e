use std::path::Path;

use log::{debug, info};

use crate::{
    dataset::{Dataset, FileTree},
    utilities::load_img_normalized_hwc,
    ChannelAccumulator, ChannelStats, ImageStats, Result, StatsConfig,
};

use super::{record, StatsStrategy};

/// Every file below the root, read sequentially, reduced over (H, W) at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkStrategy;

impl StatsStrategy for WalkStrategy {
    fn name(&self) -> &'static str {
        "walk"
    }

    fn compute(&self, data_dir: &Path, config: &StatsConfig) -> Result<ChannelStats> {
        compute_stat_walk(data_dir, config)
    }
}

/// Mean and std per channel over every regular file below `img_dir`.
///
/// Fails with `DirectoryNotFound` before reading anything when `img_dir` is
/// missing. Files that do not decode abort the run unless the config says to
/// skip them.
pub fn compute_stat_walk(img_dir: &Path, config: &StatsConfig) -> Result<ChannelStats> {
    let tree = FileTree::load(img_dir)?;
    info!("computing mean and std over {} files by walking {:?}", tree.len(), img_dir);

    let mut acc = ChannelAccumulator::new(config.channels);
    for sample in tree.samples() {
        let result = load_img_normalized_hwc(&sample.path, config)
            .map(|a| ImageStats::from_hwc(&a, config.ddof));
        record(&mut acc, &sample.path, result, config.on_error)?;
        debug!("{:?}", sample.path);
    }

    let stats = acc.finish(tree.root(), config.std_estimate, config.ddof)?;
    info!("walk: {} ({} skipped)", stats, stats.skipped.len());
    Ok(stats)
}
