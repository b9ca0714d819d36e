use std::{collections::BTreeMap, path::PathBuf, str::FromStr};

use anyhow::Context;
use clap::Parser;
use channel_stats::{compute_stats, print_stats, strategy_for, ErrorPolicy, StatsConfig, StdEstimate, Strategy};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Loader,
    Walk,
    Both,
}

impl Mode {
    fn strategies(self) -> Vec<Strategy> {
        match self {
            Mode::Loader => vec![Strategy::Loader],
            Mode::Walk => vec![Strategy::Walk],
            Mode::Both => vec![Strategy::Loader, Strategy::Walk],
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "both" => Ok(Mode::Both),
            other => other.parse::<Strategy>().map(|s| match s {
                Strategy::Loader => Mode::Loader,
                Strategy::Walk => Mode::Walk,
            }),
        }
    }
}

/// Per-channel mean and std of an image dataset
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Dataset root; one subdirectory per class for the loader mode
    #[clap(short, long)]
    data_dir: PathBuf,
    /// loader, walk or both (loader first)
    #[clap(short, long, default_value = "both")]
    mode: Mode,
    /// YAML or JSON file with a StatsConfig; flags below override it
    #[clap(short, long)]
    config: Option<PathBuf>,
    #[clap(long)]
    channels: Option<usize>,
    /// mean-of-image-std or pooled
    #[clap(long)]
    std: Option<StdEstimate>,
    #[clap(long)]
    ddof: Option<u8>,
    /// Skip files that fail to decode instead of aborting
    #[clap(long)]
    skip_unreadable: bool,
    #[clap(long)]
    batch_size: Option<usize>,
    #[clap(long)]
    num_workers: Option<usize>,
    #[clap(long)]
    shuffle: bool,
    #[clap(long)]
    seed: Option<u64>,
    /// Print the result as JSON instead of text
    #[clap(long)]
    json: bool,
    #[clap(short, long)]
    verbose: bool,
}

impl Args {
    fn stats_config(&self) -> anyhow::Result<StatsConfig> {
        let mut config = match &self.config {
            Some(path) => StatsConfig::from_file(path)
                .with_context(|| format!("failed to load config {:?}", path))?,
            None => StatsConfig::default(),
        };

        if let Some(channels) = self.channels { config.channels = channels }
        if let Some(std) = self.std { config.std_estimate = std }
        if let Some(ddof) = self.ddof { config.ddof = ddof }
        if self.skip_unreadable { config.on_error = ErrorPolicy::Skip }
        if let Some(batch_size) = self.batch_size { config.loader.batch_size = batch_size }
        if let Some(num_workers) = self.num_workers { config.loader.num_workers = num_workers }
        if self.shuffle { config.loader.shuffle = true }
        if let Some(seed) = self.seed { config.loader.seed = seed }

        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let base = args.stats_config()?;
    let mut results = BTreeMap::new();

    for strategy in args.mode.strategies() {
        let name = strategy_for(strategy).name();
        let config = StatsConfig { strategy, ..base.clone() };
        let stats = compute_stats(&args.data_dir, &config)
            .with_context(|| format!("{} statistics over {:?} failed", name, args.data_dir))?;

        if !args.json {
            print_stats(name, &stats);
        }
        results.insert(name, stats);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}
