//! Per-channel mean and standard deviation of an image dataset, for use as
//! normalization constants in image-classification pipelines.
//!
//! Two strategies compute the same quantity: [`LoaderStrategy`] reads a
//! labeled image folder through a batched [`DataLoader`], [`WalkStrategy`]
//! reads every file below a directory. Both feed a [`ChannelAccumulator`].
//!
//! ```no_run
//! use channel_stats::{compute_stats, StatsConfig, Strategy};
//!
//! let stats = compute_stats("flower_data".as_ref(), &StatsConfig::new(Strategy::Walk))?;
//! println!("{}", stats);
//! # Ok::<(), channel_stats::StatsError>(())
//! ```

use colored::Colorize;

mod accumulator;
mod config;
mod error;
mod loader;
pub mod dataset;
pub mod stats;
pub mod utilities;

pub use {
    accumulator::*,
    config::*,
    error::*,
    loader::*,
    stats::{compute_stat, compute_stat_walk, compute_stats, strategy_for, LoaderStrategy, StatsStrategy, WalkStrategy},
};


/// Prints `label: [a, b, c]`, each value tinted from red (0) to green (1).
pub fn print_channels(label: &str, values: &[f64]) {
    let cells: Vec<String> = values
        .iter()
        .map(|v| {
            let t = v.clamp(0., 1.);
            let g = (t * 255.) as u8;
            let r = ((1. - t) * 255.) as u8;
            format!("{:.5}", v).truecolor(r, g, 0).to_string()
        })
        .collect();
    println!("{}: [{}]", label, cells.join(", "));
}

pub fn print_stats(title: &str, stats: &ChannelStats) {
    println!("{} ({} images)", title.bold(), stats.images);
    print_channels("mean", &stats.mean);
    print_channels("std", &stats.std);
    if !stats.skipped.is_empty() {
        println!("{}", format!("skipped {} unreadable file(s)", stats.skipped.len()).yellow());
    }
}
