// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::sync::atomic::Ordering::Relaxed;
use std::sync::atomic::{AtomicU64, AtomicUsize};

/// Runtime counters of a filter
///
/// Hand the same `Arc<Metrics>` to several filters through
/// [`Config::metrics`](crate::Config::metrics) to aggregate them.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Configured capacity of the most recently constructed filter
    pub(crate) capacity: AtomicU64,

    /// Number of successful inserts
    pub(crate) sets: AtomicUsize,

    /// Number of successful removals
    pub(crate) unsets: AtomicUsize,

    /// Number of membership queries that were performed
    pub(crate) contains_queries: AtomicUsize,

    /// Number of membership queries that answered `true`
    pub(crate) contains_hits: AtomicUsize,
}

#[allow(clippy::cast_precision_loss)]
impl Metrics {
    /// Capacity of the most recently constructed filter.
    pub fn capacity(&self) -> u64 {
        self.capacity.load(Relaxed)
    }

    /// Number of successful inserts.
    pub fn sets(&self) -> usize {
        self.sets.load(Relaxed)
    }

    /// Number of successful removals.
    pub fn unsets(&self) -> usize {
        self.unsets.load(Relaxed)
    }

    /// Number of membership queries.
    pub fn contains_queries(&self) -> usize {
        self.contains_queries.load(Relaxed)
    }

    /// Number of membership queries that answered `true`.
    pub fn contains_hits(&self) -> usize {
        self.contains_hits.load(Relaxed)
    }

    /// Ratio of positive membership answers (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let queries = self.contains_queries.load(Relaxed);
        if queries == 0 {
            return 0.0;
        }

        let hits = self.contains_hits.load(Relaxed) as f64;
        hits / queries as f64
    }

    pub(crate) fn record_capacity(&self, capacity: u64) {
        self.capacity.store(capacity, Relaxed);
    }

    pub(crate) fn record_contains(&self, hit: bool) {
        self.contains_queries.fetch_add(1, Relaxed);

        if hit {
            self.contains_hits.fetch_add(1, Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AmqFilter, Config, CuckooFilter, QuotientFilter};
    use std::sync::Arc;
    use test_log::test;

    #[test]
    fn metrics_count_operations() -> crate::Result<()> {
        let metrics = Arc::new(Metrics::default());

        let filter = CuckooFilter::new(&Config::new(100).metrics(metrics.clone()))?;
        assert_eq!(filter.capacity(), metrics.capacity());
        assert!(metrics.hit_rate().abs() < f64::EPSILON);

        filter.set("a")?;
        filter.set("b")?;
        filter.unset("a")?;
        filter.unset("missing")?;

        assert!(filter.contains("b"));

        assert_eq!(2, metrics.sets());
        assert_eq!(1, metrics.unsets());
        assert_eq!(1, metrics.contains_queries());
        assert_eq!(1, metrics.contains_hits());
        assert!((metrics.hit_rate() - 1.0).abs() < f64::EPSILON);

        Ok(())
    }

    #[test]
    fn metrics_shared_between_filters() -> crate::Result<()> {
        let metrics = Arc::new(Metrics::default());
        let config = Config::new(1_000).metrics(metrics.clone());

        let cuckoo = CuckooFilter::new(&config)?;
        let quotient = QuotientFilter::new(&config)?;
        assert_eq!(quotient.capacity(), metrics.capacity());

        cuckoo.set(&1u64)?;
        quotient.set(&1u64)?;

        assert_eq!(2, metrics.sets());

        Ok(())
    }
}
