// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    hash::{KeyHasher, Xxh3Hasher},
    storage::WriteDiscipline,
    Error,
};
use std::{num::NonZeroUsize, sync::Arc};

#[cfg(feature = "metrics")]
use crate::metrics::Metrics;

/// Default target false positive probability
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Default quotient filter load factor
pub const DEFAULT_LOAD_FACTOR: f64 = 0.5;

/// Default cuckoo eviction kick limit
pub const DEFAULT_KICKS_LIMIT: usize = 500;

/// Filter configuration builder
///
/// ```
/// use amq_filters::{AmqFilter, Config, CuckooFilter};
///
/// let filter = CuckooFilter::new(&Config::new(1_000).kicks_limit(100))?;
/// filter.set("a")?;
/// assert!(filter.contains("a"));
/// #
/// # Ok::<(), amq_filters::Error>(())
/// ```
#[derive(Clone)]
pub struct Config {
    /// Desired number of items
    #[doc(hidden)]
    pub item_count: Option<u64>,

    /// Target false positive probability
    #[doc(hidden)]
    pub false_positive_rate: f64,

    /// Target fill ratio (quotient filter)
    #[doc(hidden)]
    pub load_factor: f64,

    /// Eviction walk length (cuckoo filter)
    #[doc(hidden)]
    pub kicks_limit: usize,

    /// Multi-writer attempt limit, `None` = single writer
    write_attempts: Option<usize>,

    /// Key hash provider
    #[doc(hidden)]
    pub hasher: Arc<dyn KeyHasher>,

    /// Seed of the eviction walk / xor construction
    #[doc(hidden)]
    pub seed: Option<u64>,

    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<Arc<Metrics>>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("item_count", &self.item_count)
            .field("false_positive_rate", &self.false_positive_rate)
            .field("load_factor", &self.load_factor)
            .field("kicks_limit", &self.kicks_limit)
            .field("write_attempts", &self.write_attempts)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            item_count: None,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
            load_factor: DEFAULT_LOAD_FACTOR,
            kicks_limit: DEFAULT_KICKS_LIMIT,
            write_attempts: None,
            hasher: Arc::new(Xxh3Hasher),
            seed: None,

            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }
}

impl Config {
    /// Initializes a new config for `item_count` desired items.
    #[must_use]
    pub fn new(item_count: u64) -> Self {
        Self {
            item_count: Some(item_count),
            ..Default::default()
        }
    }

    /// Sets the target false positive probability.
    ///
    /// Must lie in `(0, 1]`.
    ///
    /// Defaults to 0.01.
    #[must_use]
    pub fn false_positive_rate(mut self, fpp: f64) -> Self {
        self.false_positive_rate = fpp;
        self
    }

    /// Sets the target load factor of the quotient filter.
    ///
    /// Must lie in `(0, 1]`.
    ///
    /// Defaults to 0.5.
    #[must_use]
    pub fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the maximum length of a cuckoo eviction walk.
    ///
    /// Defaults to 500.
    #[must_use]
    pub fn kicks_limit(mut self, kicks_limit: usize) -> Self {
        self.kicks_limit = kicks_limit;
        self
    }

    /// Sets how bucket words are written.
    ///
    /// Defaults to [`WriteDiscipline::SingleWriter`].
    #[must_use]
    pub fn write_discipline(mut self, discipline: WriteDiscipline) -> Self {
        self.write_attempts = match discipline {
            WriteDiscipline::SingleWriter => None,
            WriteDiscipline::MultiWriter { write_attempts } => Some(write_attempts.get()),
        };
        self
    }

    /// Switches to the multi-writer discipline, retrying each
    /// compare-and-swap at most `write_attempts` times.
    #[must_use]
    pub fn concurrent(mut self, write_attempts: usize) -> Self {
        self.write_attempts = Some(write_attempts);
        self
    }

    /// Sets the key hash provider.
    ///
    /// Defaults to XXH3.
    #[must_use]
    pub fn hasher(mut self, hasher: Arc<dyn KeyHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Fixes the seed of randomized decisions, making them reproducible.
    ///
    /// Defaults to a random seed for the cuckoo eviction walk and a fixed
    /// seed for xor filter construction.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attaches a metrics sink.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub(crate) fn validated_item_count(&self) -> crate::Result<u64> {
        match self.item_count {
            Some(n) if n > 0 => Ok(n),
            _ => Err(Error::MissingItemCount),
        }
    }

    pub(crate) fn validated_false_positive_rate(&self) -> crate::Result<f64> {
        let fpp = self.false_positive_rate;

        if fpp > 0.0 && fpp <= 1.0 {
            Ok(fpp)
        } else {
            Err(Error::InvalidFalsePositiveRate(fpp))
        }
    }

    pub(crate) fn validated_load_factor(&self) -> crate::Result<f64> {
        let load = self.load_factor;

        if load > 0.0 && load <= 1.0 {
            Ok(load)
        } else {
            Err(Error::InvalidLoadFactor(load))
        }
    }

    pub(crate) fn validated_kicks_limit(&self) -> crate::Result<usize> {
        if self.kicks_limit == 0 {
            Err(Error::InvalidKicksLimit)
        } else {
            Ok(self.kicks_limit)
        }
    }

    pub(crate) fn validated_discipline(&self) -> crate::Result<WriteDiscipline> {
        match self.write_attempts {
            None => Ok(WriteDiscipline::SingleWriter),
            Some(n) => NonZeroUsize::new(n)
                .map(|write_attempts| WriteDiscipline::MultiWriter { write_attempts })
                .ok_or(Error::InvalidWriteAttempts),
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn metrics_sink(&self) -> Option<Arc<Metrics>> {
        self.metrics.clone()
    }
}
