use std::path::Path;

use log::{debug, info};

use crate::{
    dataset::{Dataset, ImageFolder},
    utilities::load_img_normalized_chw,
    ChannelAccumulator, ChannelStats, DataLoader, ImageStats, Result, StatsConfig,
};

use super::{record, StatsStrategy};

/// Labeled image folder, batched loader, channel-by-channel reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderStrategy;

impl StatsStrategy for LoaderStrategy {
    fn name(&self) -> &'static str {
        "loader"
    }

    fn compute(&self, data_dir: &Path, config: &StatsConfig) -> Result<ChannelStats> {
        let dataset = ImageFolder::load(data_dir)?;
        compute_stat(&dataset, config)
    }
}

/// Mean and std per channel, averaged over every sample of `dataset`.
///
/// Each sample is decoded to a `(C, H, W)` tensor by the loader's workers;
/// per-channel spatial mean and std are summed here in the calling thread and
/// divided by the sample count at the end.
pub fn compute_stat<D: Dataset>(dataset: &D, config: &StatsConfig) -> Result<ChannelStats> {
    info!("computing mean and std over {} images with the data loader", dataset.len());

    let loader = DataLoader::new(dataset, &config.loader)?;
    let mut acc = ChannelAccumulator::new(config.channels);

    let batches = loader.batches(|sample| {
        load_img_normalized_chw(&sample.path, config).map(|t| ImageStats::from_chw(&t, config.ddof))
    });
    for (b, batch) in batches.enumerate() {
        for (i, result) in batch {
            record(&mut acc, &dataset.samples()[i].path, result, config.on_error)?;
        }
        debug!("batch {}/{}: {} images accumulated", b + 1, loader.len(), acc.images());
    }

    let stats = acc.finish(dataset.root(), config.std_estimate, config.ddof)?;
    info!("loader: {} ({} skipped)", stats, stats.skipped.len());
    Ok(stats)
}
