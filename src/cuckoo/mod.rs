// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Cuckoo filter
//!
//! Every key maps to an 8-bit fingerprint and two candidate buckets of
//! four slots each. The second bucket is derived from the first one and
//! the fingerprint alone, so a stored fingerprint can always be moved to
//! its alternate bucket without knowing the key.

use crate::{
    coding::{DecodeError, Encode, Header, CUCKOO_MAGIC},
    hash::KeyHasher,
    storage::{
        bucket::{BucketArray, BUCKETS_PER_WORD, SLOTS_PER_BUCKET},
        PackedWords,
    },
    AmqFilter, Config, Error,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::{
    io::{Read, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

#[cfg(feature = "metrics")]
use crate::metrics::Metrics;

/// Target fill ratio used for sizing
const TARGET_LOAD: f64 = 0.95;

/// Largest bucket count, `2^31` storage words
const MAX_BUCKETS: u64 = 1 << 32;

/// Salt of the fingerprint hashes that derive the alternate bucket
const ALT_SALT: u64 = 0x5bd1_e995;

/// Calculates the bucket count for `n` items.
///
/// Always a power of two, so bucket indexes can be masked.
///
/// # Errors
///
/// Will return `Err` if `n` items need more than `2^32` buckets.
pub fn optimal_m(n: u64) -> crate::Result<u64> {
    #[expect(clippy::cast_precision_loss, reason = "rounding is fine for sizing")]
    let items = n as f64;

    // NOTE: Saturates for huge counts, which the bound below rejects
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "the bucket count is positive"
    )]
    let buckets = (items / (SLOTS_PER_BUCKET as f64 * TARGET_LOAD)).ceil() as u64;

    if buckets > MAX_BUCKETS {
        return Err(Error::ItemCountOverflow(n));
    }

    Ok(buckets.max(BUCKETS_PER_WORD).next_power_of_two())
}

/// Hashes every possible fingerprint.
fn alt_hash_table(hasher: &dyn KeyHasher) -> Box<[u64; 256]> {
    let mut table = Box::new([0; 256]);

    for (fp, slot) in (0..=u8::MAX).zip(table.iter_mut()) {
        *slot = hasher.hash64_salted(&[fp], ALT_SALT);
    }

    table
}

/// A cuckoo filter
///
/// With the multi-writer discipline the filter can be shared through
/// `Arc` and written from several threads; every single slot swap is
/// atomic, an eviction walk as a whole is not.
pub struct CuckooFilter {
    buckets: BucketArray,

    /// `bucket_count - 1`
    mask: u64,

    /// Fingerprint hash per fingerprint value
    alt_hashes: Box<[u64; 256]>,

    size: AtomicU64,

    kicks_limit: usize,

    rng: Mutex<SmallRng>,

    hasher: Arc<dyn KeyHasher>,

    #[cfg(feature = "metrics")]
    metrics: Option<Arc<Metrics>>,
}

impl std::fmt::Debug for CuckooFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CuckooFilter")
            .field("buckets", &self.bucket_count())
            .field("size", &self.size())
            .field("kicks_limit", &self.kicks_limit)
            .field("discipline", &self.buckets.words().discipline())
            .finish_non_exhaustive()
    }
}

impl CuckooFilter {
    /// Creates an empty filter sized for the configured item count.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the config is invalid.
    pub fn new(config: &Config) -> crate::Result<Self> {
        let n = config.validated_item_count()?;
        config.validated_false_positive_rate()?;
        let kicks_limit = config.validated_kicks_limit()?;
        let discipline = config.validated_discipline()?;

        let m = optimal_m(n)?;

        log::debug!(
            "Creating cuckoo filter for {n} items: {m} buckets, {} slots, {discipline:?}",
            m * SLOTS_PER_BUCKET as u64,
        );

        let words = PackedWords::zeroed(BucketArray::words_for(m), discipline);
        let seed = config.seed.unwrap_or_else(rand::random);

        let filter = Self {
            buckets: BucketArray::new(words, m),
            mask: m - 1,
            alt_hashes: alt_hash_table(config.hasher.as_ref()),
            size: AtomicU64::default(),
            kicks_limit,
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            hasher: config.hasher.clone(),

            #[cfg(feature = "metrics")]
            metrics: config.metrics_sink(),
        };

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &filter.metrics {
            metrics.record_capacity(filter.capacity());
        }

        Ok(filter)
    }

    /// Number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> u64 {
        self.buckets.len()
    }

    /// Ratio of occupied slots (0.0 - 1.0).
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.size() as f64 / self.capacity() as f64
    }

    fn alt_index(&self, idx: u64, fp: u8) -> u64 {
        // NOTE: Indexing a 256 element table with a u8 cannot go out of bounds
        #[expect(clippy::indexing_slicing)]
        let alt_hash = self.alt_hashes[usize::from(fp)];

        (idx ^ alt_hash) & self.mask
    }

    /// Returns both candidate buckets and the fingerprint of a hash.
    fn coordinates(&self, hash: u64) -> (u64, u64, u8) {
        #[expect(clippy::cast_possible_truncation, reason = "value is in 1..=255")]
        let fp = (hash % 255 + 1) as u8;

        let i0 = (hash >> 32) & self.mask;
        let i1 = self.alt_index(i0, fp);

        (i0, i1, fp)
    }

    fn record_set(&self) {
        self.size.fetch_add(1, Ordering::AcqRel);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.sets.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_unset(&self) {
        let _ = self
            .size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.unsets.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Moves fingerprints around until `fp` finds a free slot.
    ///
    /// Every swap is recorded in `walk` as `(bucket, slot, evicted)`.
    /// Returns `false` if the kick limit was reached.
    fn kick(
        &self,
        rng: &mut SmallRng,
        mut idx: u64,
        mut fp: u8,
        walk: &mut Vec<(u64, usize, u8)>,
    ) -> crate::Result<bool> {
        for _ in 0..self.kicks_limit {
            let slot = rng.random_range(0..SLOTS_PER_BUCKET);

            let evicted = self.buckets.swap(idx, slot, fp)?;
            walk.push((idx, slot, evicted));

            // A concurrent unset may have freed the slot in the meantime
            if evicted == 0 {
                return Ok(true);
            }

            fp = evicted;
            idx = self.alt_index(idx, fp);

            if self.buckets.try_insert(idx, fp)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Reverts the eviction walk that tried to place `fp`.
    ///
    /// A step is only undone while its slot still holds what the walk put
    /// there. Once a concurrent writer has changed a slot, the rollback
    /// stops and the fingerprint in hand goes back into one of its own
    /// buckets, leaving the rest of the walk (and `fp`) in place.
    ///
    /// Returns `true` if the whole walk was reverted.
    fn undo(&self, fp: u8, walk: &[(u64, usize, u8)]) -> crate::Result<bool> {
        for (step, &(idx, slot, evicted)) in walk.iter().enumerate().rev() {
            let placed = step
                .checked_sub(1)
                .and_then(|prev| walk.get(prev))
                .map_or(fp, |&(_, _, prev_evicted)| prev_evicted);

            match self.buckets.compare_swap(idx, slot, placed, evicted) {
                Ok(true) => {}
                Ok(false) | Err(Error::WriteLimitReached) => {
                    log::debug!("Rollback of eviction walk interrupted at bucket {idx}");
                    self.rehome(idx, evicted)?;
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(true)
    }

    /// Puts a fingerprint that was taken out of bucket `idx` back into one of its buckets.
    fn rehome(&self, idx: u64, fp: u8) -> crate::Result<()> {
        if self.buckets.try_insert(idx, fp)?
            || self.buckets.try_insert(self.alt_index(idx, fp), fp)?
        {
            return Ok(());
        }

        log::error!("Fingerprint {fp} displaced from bucket {idx} found no free slot");
        Err(Error::EvictionConflict)
    }

    fn relocate(&self, i0: u64, i1: u64, fp: u8) -> crate::Result<()> {
        #[expect(clippy::expect_used)]
        let mut rng = self.rng.lock().expect("lock is poisoned");

        let start = if rng.random_bool(0.5) { i0 } else { i1 };
        let mut walk = Vec::with_capacity(self.kicks_limit.min(64));

        let error = match self.kick(&mut rng, start, fp, &mut walk) {
            Ok(true) => {
                self.record_set();
                return Ok(());
            }
            Ok(false) => {
                log::trace!(
                    "Eviction walk starting at bucket {start} hit the kick limit ({})",
                    self.kicks_limit,
                );
                Error::FilterFull
            }
            Err(e) => e,
        };

        match self.undo(fp, &walk) {
            Ok(true) => {
                if matches!(error, Error::FilterFull) {
                    log::warn!(
                        "Cuckoo filter is full ({} items in {} slots)",
                        self.size(),
                        self.capacity(),
                    );
                }
                Err(error)
            }
            // Part of the walk stays applied, so `fp` was stored
            Ok(false) => {
                self.record_set();
                Ok(())
            }
            Err(e) => {
                self.record_set();
                Err(e)
            }
        }
    }
}

impl AmqFilter for CuckooFilter {
    fn hasher(&self) -> &dyn KeyHasher {
        self.hasher.as_ref()
    }

    fn set_hash(&self, hash: u64) -> crate::Result<()> {
        let (i0, i1, fp) = self.coordinates(hash);

        if self.buckets.try_insert(i0, fp)? || self.buckets.try_insert(i1, fp)? {
            self.record_set();
            return Ok(());
        }

        self.relocate(i0, i1, fp)
    }

    fn unset_hash(&self, hash: u64) -> crate::Result<()> {
        let (i0, i1, fp) = self.coordinates(hash);

        if self.buckets.remove(i0, fp)? || self.buckets.remove(i1, fp)? {
            self.record_unset();
        }

        Ok(())
    }

    fn contains_hash(&self, hash: u64) -> bool {
        let (i0, i1, fp) = self.coordinates(hash);
        let hit = self.buckets.contains(i0, fp) || self.buckets.contains(i1, fp);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_contains(hit);
        }

        hit
    }

    fn capacity(&self) -> u64 {
        self.bucket_count() * SLOTS_PER_BUCKET as u64
    }

    fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    fn reset(&mut self) {
        self.buckets.clear();
        self.size.store(0, Ordering::Release);
    }

    fn read_from<R: Read>(&mut self, reader: &mut R) -> crate::Result<u64> {
        let header = Header::decode_expecting(reader, CUCKOO_MAGIC)?;
        let words = PackedWords::decode_with(reader, self.buckets.words().discipline())?;

        let buckets = words.len() as u64 * BUCKETS_PER_WORD;

        if buckets < BUCKETS_PER_WORD || !buckets.is_power_of_two() {
            return Err(DecodeError::InvalidHeader("CuckooFilter").into());
        }
        if header.item_count > buckets * SLOTS_PER_BUCKET as u64 {
            return Err(DecodeError::InvalidHeader("CuckooFilter").into());
        }

        let bytes_read = Header::SERIALIZED_LEN + words.serialized_len();

        self.buckets = BucketArray::new(words, buckets);
        self.mask = buckets - 1;
        self.size.store(header.item_count, Ordering::Release);

        log::debug!(
            "Loaded cuckoo filter with {buckets} buckets and {} items",
            header.item_count,
        );

        Ok(bytes_read)
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> crate::Result<u64> {
        let words = self.buckets.words();

        Header::new(CUCKOO_MAGIC, self.size()).encode_into(writer)?;
        words.encode_into(writer)?;

        Ok(Header::SERIALIZED_LEN + words.serialized_len())
    }
}
