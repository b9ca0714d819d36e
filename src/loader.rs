use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};

use crate::{dataset::{Dataset, Sample}, LoaderConfig, Result, StatsError};


/// Hands out a dataset in batches, decoding each batch on a bounded worker pool.
///
/// Workers only produce per-sample results; they never touch the consumer's
/// state. Results of a batch come back in sample order.
pub struct DataLoader<'a, D: Dataset> {
    dataset: &'a D,
    batch_size: usize,
    order: Vec<usize>,
    pool: Option<ThreadPool>,
}

impl<'a, D: Dataset> DataLoader<'a, D> {
    pub fn new(dataset: &'a D, config: &LoaderConfig) -> Result<Self> {
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if config.shuffle {
            order.shuffle(&mut StdRng::seed_from_u64(config.seed));
        }

        let pool = if config.num_workers > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.num_workers)
                .thread_name(|i| format!("loader-{}", i))
                .build()
                .map_err(|e| StatsError::WorkerPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self { dataset, batch_size: config.batch_size.max(1), order, pool })
    }

    pub fn dataset(&self) -> &D {
        self.dataset
    }

    /// Sample indices in visiting order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Number of batches.
    pub fn len(&self) -> usize {
        (self.order.len() + self.batch_size - 1) / self.batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates batches of `(sample index, load(sample))`.
    pub fn batches<T, F>(&self, load: F) -> Batches<'_, 'a, D, F>
    where
        T: Send,
        F: Fn(&Sample) -> Result<T> + Sync,
    {
        Batches { loader: self, load, next: 0 }
    }
}

pub struct Batches<'l, 'a, D: Dataset, F> {
    loader: &'l DataLoader<'a, D>,
    load: F,
    next: usize,
}

impl<'l, 'a, D, F, T> Iterator for Batches<'l, 'a, D, F>
where
    D: Dataset,
    T: Send,
    F: Fn(&Sample) -> Result<T> + Sync,
{
    type Item = Vec<(usize, Result<T>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let order = &self.loader.order;
        if self.next >= order.len() {
            return None;
        }
        let end = (self.next + self.loader.batch_size).min(order.len());
        let indices = &order[self.next..end];
        self.next = end;

        let samples = self.loader.dataset.samples();
        let load = &self.load;
        let batch = match &self.loader.pool {
            Some(pool) => pool.install(|| {
                indices.par_iter().map(|&i| (i, load(&samples[i]))).collect::<Vec<_>>()
            }),
            None => indices.iter().map(|&i| (i, load(&samples[i]))).collect(),
        };
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    struct Listed {
        samples: Vec<Sample>,
    }

    impl Listed {
        fn new(n: usize) -> Self {
            let samples = (0..n)
                .map(|i| Sample { path: PathBuf::from(format!("{}.png", i)), label: None })
                .collect();
            Self { samples }
        }
    }

    impl Dataset for Listed {
        fn root(&self) -> &Path { Path::new(".") }
        fn samples(&self) -> &[Sample] { &self.samples }
        fn class_name(&self, _num: usize) -> Option<String> { None }
    }

    fn config(batch_size: usize, num_workers: usize, shuffle: bool) -> LoaderConfig {
        LoaderConfig { batch_size, num_workers, shuffle, seed: 7 }
    }

    #[test]
    fn test_batches_cover_every_sample_once() {
        let data = Listed::new(10);
        let loader = DataLoader::new(&data, &config(4, 3, false)).unwrap();
        assert_eq!(loader.len(), 3);

        let batches: Vec<_> = loader.batches(|s| Ok(s.path.clone())).collect();
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 4, 2]);

        let seen: Vec<usize> = batches.into_iter().flatten().map(|(i, r)| {
            assert_eq!(r.unwrap(), PathBuf::from(format!("{}.png", i)));
            i
        }).collect();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_is_seeded_permutation() {
        let data = Listed::new(20);
        let a = DataLoader::new(&data, &config(1, 0, true)).unwrap();
        let b = DataLoader::new(&data, &config(1, 0, true)).unwrap();
        assert_eq!(a.order(), b.order());

        let mut sorted = a.order().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_errors_stay_with_their_sample() {
        let data = Listed::new(5);
        let loader = DataLoader::new(&data, &config(5, 2, false)).unwrap();
        let batch = loader
            .batches(|s| {
                if s.path == Path::new("3.png") {
                    Err(StatsError::EmptyDataset(s.path.clone()))
                } else {
                    Ok(())
                }
            })
            .next()
            .unwrap();
        let failed: Vec<_> = batch.iter().filter(|(_, r)| r.is_err()).map(|(i, _)| *i).collect();
        assert_eq!(failed, vec![3]);
    }
}
