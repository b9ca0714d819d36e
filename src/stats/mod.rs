//! The two ways of computing dataset normalization constants, behind one
//! [`StatsStrategy`] interface and one shared [`ChannelAccumulator`].

use std::path::Path;

use log::warn;

use crate::{ChannelAccumulator, ChannelStats, ErrorPolicy, ImageStats, Result, StatsConfig, Strategy};

mod filesystem_walk;
mod loader_based;
pub use filesystem_walk::*;
pub use loader_based::*;

pub trait StatsStrategy {
    fn name(&self) -> &'static str;
    fn compute(&self, data_dir: &Path, config: &StatsConfig) -> Result<ChannelStats>;
}

pub fn strategy_for(strategy: Strategy) -> Box<dyn StatsStrategy> {
    match strategy {
        Strategy::Loader => Box::new(LoaderStrategy),
        Strategy::Walk => Box::new(WalkStrategy),
    }
}

/// Validates `config` and runs the strategy it names over `data_dir`.
pub fn compute_stats(data_dir: &Path, config: &StatsConfig) -> Result<ChannelStats> {
    config.validate()?;
    strategy_for(config.strategy).compute(data_dir, config)
}

/// Folds one per-image result into `acc`, applying the error policy.
fn record(
    acc: &mut ChannelAccumulator,
    path: &Path,
    result: Result<ImageStats>,
    policy: ErrorPolicy,
) -> Result<()> {
    match result {
        Ok(stats) => {
            acc.push(&stats);
            Ok(())
        }
        Err(e) if policy == ErrorPolicy::Skip && e.is_decode_failure() => {
            warn!("skipping {}", e);
            acc.skip(path.to_path_buf());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
