use std::{path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Result, StatsError};

/// Which of the two computation paths to run.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Labeled image folder read through the batched [`crate::DataLoader`].
    Loader,
    /// Every regular file below the root, read one after another.
    Walk,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Loader
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loader" => Ok(Strategy::Loader),
            "walk" => Ok(Strategy::Walk),
            _ => Err(format!("unknown strategy '{}', expected 'loader' or 'walk'", s)),
        }
    }
}

/// How the per-channel standard deviation of the whole dataset is estimated.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StdEstimate {
    /// Average of every image's own spatial std.
    MeanOfImageStd,
    /// Std over all pixels of the dataset at once. The mean becomes pixel weighted.
    Pooled,
}

impl Default for StdEstimate {
    fn default() -> Self {
        StdEstimate::MeanOfImageStd
    }
}

impl FromStr for StdEstimate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean-of-image-std" | "mean" => Ok(StdEstimate::MeanOfImageStd),
            "pooled" => Ok(StdEstimate::Pooled),
            _ => Err(format!(
                "unknown std estimate '{}', expected 'mean-of-image-std' or 'pooled'",
                s
            )),
        }
    }
}

/// What to do with a file that cannot be decoded as an image.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    FailFast,
    /// Skip it, log a warning and report it in [`crate::ChannelStats::skipped`].
    Skip,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::FailFast
    }
}

/// One preprocessing step applied to each decoded image, in order.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Transform {
    Resize { width: u32, height: u32 },
    CenterCrop { width: u32, height: u32 },
}

impl Transform {
    fn dims(&self) -> (u32, u32) {
        match *self {
            Transform::Resize { width, height } | Transform::CenterCrop { width, height } => {
                (width, height)
            }
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderConfig {
    pub batch_size: usize,
    /// Decode threads. `0` decodes on the calling thread.
    pub num_workers: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            num_workers: 8,
            shuffle: false,
            seed: 0,
        }
    }
}

/// Everything a statistics pass needs besides the data directory.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    pub strategy: Strategy,
    /// Declared channel count; every image must match it.
    pub channels: usize,
    /// Delta degrees of freedom of the std, 0 or 1.
    pub ddof: u8,
    pub std_estimate: StdEstimate,
    pub on_error: ErrorPolicy,
    pub transforms: Vec<Transform>,
    pub loader: LoaderConfig,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            channels: 3,
            ddof: 0,
            std_estimate: StdEstimate::default(),
            on_error: ErrorPolicy::default(),
            transforms: Vec::new(),
            loader: LoaderConfig::default(),
        }
    }
}

impl StatsConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Reads a config from a `.yaml`/`.yml` or `.json` file and validates it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StatsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let config: StatsConfig = match ext.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
                .map_err(|e| StatsError::Config(format!("{}: {}", path.display(), e)))?,
            Some("json") => serde_json::from_str(&text)
                .map_err(|e| StatsError::Config(format!("{}: {}", path.display(), e)))?,
            _ => {
                return Err(StatsError::Config(format!(
                    "{}: expected a .yaml, .yml or .json file",
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(StatsError::Config(format!(
                "channels must be 1, 3 or 4, got {}",
                self.channels
            )));
        }
        if self.ddof > 1 {
            return Err(StatsError::Config(format!("ddof must be 0 or 1, got {}", self.ddof)));
        }
        if self.loader.batch_size == 0 {
            return Err(StatsError::Config("batch_size must be at least 1".to_string()));
        }
        if let Some(t) = self.transforms.iter().find(|t| {
            let (w, h) = t.dims();
            w == 0 || h == 0
        }) {
            return Err(StatsError::Config(format!("zero-sized transform {:?}", t)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_original_run() {
        let config = StatsConfig::default();
        assert_eq!(config.channels, 3);
        assert_eq!(config.ddof, 0);
        assert_eq!(config.on_error, ErrorPolicy::FailFast);
        assert_eq!(config.loader.batch_size, 1);
        assert_eq!(config.loader.num_workers, 8);
        assert!(!config.loader.shuffle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_config() {
        let yaml = r#"
strategy: walk
std_estimate: pooled
on_error: skip
transforms:
  - op: resize
    width: 32
    height: 32
loader:
  num_workers: 2
"#;
        let config: StatsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.strategy, Strategy::Walk);
        assert_eq!(config.std_estimate, StdEstimate::Pooled);
        assert_eq!(config.on_error, ErrorPolicy::Skip);
        assert_eq!(config.transforms, vec![Transform::Resize { width: 32, height: 32 }]);
        assert_eq!(config.loader.num_workers, 2);
        assert_eq!(config.loader.batch_size, 1);
        assert_eq!(config.channels, 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StatsConfig::default();
        config.channels = 2;
        assert!(config.validate().is_err());

        let mut config = StatsConfig::default();
        config.ddof = 2;
        assert!(config.validate().is_err());

        let mut config = StatsConfig::default();
        config.loader.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = StatsConfig::default();
        config.transforms.push(Transform::CenterCrop { width: 0, height: 4 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Loader".parse::<Strategy>().unwrap(), Strategy::Loader);
        assert_eq!("walk".parse::<Strategy>().unwrap(), Strategy::Walk);
        assert!("both".parse::<Strategy>().is_err());
        assert_eq!("pooled".parse::<StdEstimate>().unwrap(), StdEstimate::Pooled);
    }

    #[test]
    fn test_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        std::fs::write(&path, r#"{"channels": 4, "ddof": 1}"#).unwrap();
        let config = StatsConfig::from_file(&path).unwrap();
        assert_eq!(config.channels, 4);
        assert_eq!(config.ddof, 1);

        let bad = dir.path().join("stats.toml");
        std::fs::write(&bad, "channels = 3").unwrap();
        assert!(matches!(StatsConfig::from_file(&bad), Err(StatsError::Config(_))));
    }
}
