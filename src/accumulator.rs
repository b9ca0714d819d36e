use std::{fmt, path::{Path, PathBuf}};

use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::{Result, StatsError, StdEstimate};


/// Per-channel statistics of a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub sum: Vec<f64>,
    pub sum_sq: Vec<f64>,
    /// Pixels per channel.
    pub pixels: usize,
}

fn has_spread(pixels: usize, ddof: u8) -> bool {
    pixels > ddof as usize
}

impl ImageStats {
    /// Channel by channel over a `(C, H, W)` tensor.
    pub fn from_chw(tensor: &Array3<f64>, ddof: u8) -> Self {
        let (c, h, w) = tensor.dim();
        let pixels = h * w;
        let mut stats = Self::zeros(c, pixels);
        for d in 0..c {
            let plane = tensor.index_axis(Axis(0), d);
            stats.mean[d] = plane.mean().unwrap_or(0.);
            if has_spread(pixels, ddof) {
                stats.std[d] = plane.std(ddof as f64);
            }
            stats.sum[d] = plane.sum();
            stats.sum_sq[d] = plane.fold(0., |acc, x| acc + x * x);
        }
        stats
    }

    /// Reduces an `(H, W, C)` array over the height and width axes at once.
    pub fn from_hwc(array: &Array3<f64>, ddof: u8) -> Self {
        let (h, w, c) = array.dim();
        let pixels = h * w;
        let flat = Array2::from_shape_fn((pixels, c), |(i, d)| array[[i / w, i % w, d]]);

        let mean = flat.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(c));
        let std = if has_spread(pixels, ddof) {
            flat.std_axis(Axis(0), ddof as f64)
        } else {
            Array1::zeros(c)
        };

        Self {
            mean: mean.to_vec(),
            std: std.to_vec(),
            sum: flat.sum_axis(Axis(0)).to_vec(),
            sum_sq: flat.mapv(|x| x * x).sum_axis(Axis(0)).to_vec(),
            pixels,
        }
    }

    fn zeros(channels: usize, pixels: usize) -> Self {
        Self {
            mean: vec![0.; channels],
            std: vec![0.; channels],
            sum: vec![0.; channels],
            sum_sq: vec![0.; channels],
            pixels,
        }
    }
}

/// Running sums shared by both computation paths.
///
/// `cumulative_mean`/`cumulative_std` hold sums of per-image statistics, the
/// pixel sums feed the pooled estimate. Nothing is divided until [`finish`].
///
/// [`finish`]: ChannelAccumulator::finish
#[derive(Debug, Clone)]
pub struct ChannelAccumulator {
    channels: usize,
    images: usize,
    cumulative_mean: Vec<f64>,
    cumulative_std: Vec<f64>,
    pixel_sum: Vec<f64>,
    pixel_sq_sum: Vec<f64>,
    pixel_count: usize,
    skipped: Vec<PathBuf>,
}

impl ChannelAccumulator {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            images: 0,
            cumulative_mean: vec![0.; channels],
            cumulative_std: vec![0.; channels],
            pixel_sum: vec![0.; channels],
            pixel_sq_sum: vec![0.; channels],
            pixel_count: 0,
            skipped: Vec::new(),
        }
    }

    pub fn channels(&self) -> usize { self.channels }

    pub fn images(&self) -> usize { self.images }

    pub fn skipped(&self) -> &[PathBuf] { &self.skipped }

    pub fn push(&mut self, stats: &ImageStats) {
        debug_assert_eq!(stats.mean.len(), self.channels);
        for d in 0..self.channels {
            self.cumulative_mean[d] += stats.mean[d];
            self.cumulative_std[d] += stats.std[d];
            self.pixel_sum[d] += stats.sum[d];
            self.pixel_sq_sum[d] += stats.sum_sq[d];
        }
        self.pixel_count += stats.pixels;
        self.images += 1;
    }

    pub fn skip(&mut self, path: PathBuf) {
        self.skipped.push(path);
    }

    pub fn merge(&mut self, other: ChannelAccumulator) {
        debug_assert_eq!(other.channels, self.channels);
        for d in 0..self.channels {
            self.cumulative_mean[d] += other.cumulative_mean[d];
            self.cumulative_std[d] += other.cumulative_std[d];
            self.pixel_sum[d] += other.pixel_sum[d];
            self.pixel_sq_sum[d] += other.pixel_sq_sum[d];
        }
        self.pixel_count += other.pixel_count;
        self.images += other.images;
        self.skipped.extend(other.skipped);
    }

    /// Divides the running sums. `root` only names the dataset in the error.
    pub fn finish(self, root: &Path, estimate: StdEstimate, ddof: u8) -> Result<ChannelStats> {
        if self.images == 0 {
            return Err(StatsError::EmptyDataset(root.to_path_buf()));
        }

        let (mean, std) = match estimate {
            StdEstimate::MeanOfImageStd => {
                let n = self.images as f64;
                (
                    self.cumulative_mean.iter().map(|m| m / n).collect(),
                    self.cumulative_std.iter().map(|s| s / n).collect(),
                )
            }
            StdEstimate::Pooled => {
                let n = self.pixel_count as f64;
                let mean: Vec<f64> = self.pixel_sum.iter().map(|s| s / n).collect();
                let std = mean
                    .iter()
                    .zip(&self.pixel_sq_sum)
                    .map(|(m, sq)| {
                        if has_spread(self.pixel_count, ddof) {
                            ((sq - n * m * m) / (n - ddof as f64)).max(0.).sqrt()
                        } else {
                            0.
                        }
                    })
                    .collect();
                (mean, std)
            }
        };

        Ok(ChannelStats { mean, std, images: self.images, skipped: self.skipped })
    }
}

/// Final per-channel normalization constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    /// Images that contributed.
    pub images: usize,
    pub skipped: Vec<PathBuf>,
}

fn write_channels(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    write!(f, "[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{:.5}", v)?;
    }
    write!(f, "]")
}

impl fmt::Display for ChannelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mean: ")?;
        write_channels(f, &self.mean)?;
        write!(f, "\nstd: ")?;
        write_channels(f, &self.std)
    }
}
