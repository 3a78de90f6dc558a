// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Quotient filter
//!
//! A key hash is split into a quotient `fq` (home slot) and a remainder `fr`
//! (stored value). Remainders sharing a quotient form a sorted, contiguous
//! *run*; adjacent runs form a *cluster*. Three control bits per slot make
//! it possible to recover which run a shifted remainder belongs to.
//!
//! The table has `2^q` home slots plus an overflow tail of `2^q / 8` slots,
//! so runs never wrap around to the front.

mod slot;

use crate::{
    coding::{DecodeError, Encode, Header, QUOTIENT_MAGIC},
    hash::KeyHasher,
    storage::{
        bit_window::{low_mask, BitWindow},
        PackedWords,
    },
    AmqFilter, Config, Error,
};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use slot::{Slot, CONTROL_BITS};
use std::{
    io::{Read, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

#[cfg(feature = "metrics")]
use crate::metrics::Metrics;

fn check_bits(quotient_bits: u32, remainder_bits: u32) -> crate::Result<()> {
    let overflow = quotient_bits == 0
        || remainder_bits == 0
        || 2 * quotient_bits > u64::BITS
        || quotient_bits + remainder_bits > u64::BITS
        || remainder_bits + CONTROL_BITS > u64::BITS;

    if overflow {
        Err(Error::BucketOverflow {
            quotient_bits,
            remainder_bits,
        })
    } else {
        Ok(())
    }
}

/// Physical slot count for `q` quotient bits (home slots + overflow tail).
fn slot_count(quotient_bits: u32) -> u64 {
    let home = 1u64 << quotient_bits;
    home + home / 8
}

/// Calculates `(m, q, r)`: slot count, quotient bits and remainder bits for
/// `n` items at false positive probability `fpp` and the given load factor.
///
/// # Errors
///
/// Will return `Err` if the split does not fit into 64-bit hashes and slots.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "bit counts are small, overflow is rejected below"
)]
pub fn optimal_mqr(n: u64, fpp: f64, load_factor: f64) -> crate::Result<(u64, u32, u32)> {
    let q = ((n as f64) / load_factor).log2().ceil().max(1.0) as i64;
    let r = (-(fpp / load_factor).log2()).ceil().max(1.0) as i64;

    let quotient_bits = u32::try_from(q).unwrap_or(u32::MAX);
    let remainder_bits = u32::try_from(r).unwrap_or(u32::MAX);

    // NOTE: Guard the sums in check_bits against u32 overflow
    let quotient_bits = quotient_bits.min(u64::BITS + 1);
    let remainder_bits = remainder_bits.min(u64::BITS + 1);

    check_bits(quotient_bits, remainder_bits)?;

    Ok((slot_count(quotient_bits), quotient_bits, remainder_bits))
}

/// A quotient filter
///
/// Inserts and removals shift whole clusters, so they are serialized by an
/// internal writer lock regardless of the write discipline; lookups are
/// lock-free.
pub struct QuotientFilter {
    slots: BitWindow,

    quotient_bits: u32,

    remainder_bits: u32,

    /// Physical number of slots
    slot_count: u64,

    len: AtomicU64,

    writer: Mutex<()>,

    hasher: Arc<dyn KeyHasher>,

    #[cfg(feature = "metrics")]
    metrics: Option<Arc<Metrics>>,
}

impl std::fmt::Debug for QuotientFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotientFilter")
            .field("slots", &self.slot_count)
            .field("quotient_bits", &self.quotient_bits)
            .field("remainder_bits", &self.remainder_bits)
            .field("len", &self.size())
            .finish_non_exhaustive()
    }
}

impl QuotientFilter {
    /// Creates an empty filter sized for the configured item count,
    /// false positive probability and load factor.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the config is invalid or the resulting
    /// quotient/remainder split does not fit.
    pub fn new(config: &Config) -> crate::Result<Self> {
        let n = config.validated_item_count()?;
        let fpp = config.validated_false_positive_rate()?;
        let load_factor = config.validated_load_factor()?;
        let discipline = config.validated_discipline()?;

        let (m, q, r) = optimal_mqr(n, fpp, load_factor)?;

        log::debug!(
            "Creating quotient filter for {n} items (fpp={fpp}, load={load_factor}): \
             {m} slots, q={q}, r={r}",
        );

        let width = r + CONTROL_BITS;
        let words = PackedWords::zeroed(BitWindow::words_for(m, width), discipline);

        let filter = Self {
            slots: BitWindow::new(words, width),
            quotient_bits: q,
            remainder_bits: r,
            slot_count: m,
            len: AtomicU64::default(),
            writer: Mutex::default(),
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

    /// Number of quotient bits.
    #[must_use]
    pub fn quotient_bits(&self) -> u32 {
        self.quotient_bits
    }

    /// Number of remainder bits.
    #[must_use]
    pub fn remainder_bits(&self) -> u32 {
        self.remainder_bits
    }

    /// Number of items after which inserts are refused.
    #[must_use]
    pub fn max_items(&self) -> u64 {
        1 << self.quotient_bits
    }

    fn get(&self, idx: u64) -> Slot {
        Slot::from_raw(self.slots.get(idx))
    }

    fn put(&self, idx: u64, slot: Slot) -> crate::Result<()> {
        self.slots.set(idx, slot.into_raw())
    }

    /// Splits a hash into quotient and remainder.
    fn split(&self, hash: u64) -> (u64, u64) {
        let fr = hash & low_mask(self.remainder_bits);
        let fq = (hash >> self.remainder_bits) & low_mask(self.quotient_bits);
        (fq, fr)
    }

    /// Finds where the run of quotient `fq` starts (or would start).
    ///
    /// `fq` has to be marked occupied.
    fn run_start(&self, fq: u64) -> u64 {
        // Walk back to the start of the cluster
        let mut b = fq;
        while b > 0 && self.get(b).is_shifted() {
            b -= 1;
        }

        // Walk forward, skipping one run per occupied quotient
        let mut s = b;
        while b < fq {
            loop {
                s += 1;
                if s >= self.slot_count || !self.get(s).is_continuation() {
                    break;
                }
            }

            loop {
                b += 1;
                if b >= fq || self.get(b).is_occupied() {
                    break;
                }
            }
        }

        s
    }

    /// Scans a run for `fr`.
    ///
    /// Returns the position of the match, or the position `fr` would have
    /// to be inserted at to keep the run sorted.
    fn probe(&self, start: u64, fr: u64) -> (u64, bool) {
        let mut s = start;

        if s >= self.slot_count {
            return (s, false);
        }

        loop {
            let remainder = self.get(s).remainder();

            if remainder == fr {
                return (s, true);
            }
            if remainder > fr {
                return (s, false);
            }

            s += 1;

            if s >= self.slot_count || !self.get(s).is_continuation() {
                return (s, false);
            }
        }
    }

    fn first_empty(&self, from: u64) -> Option<u64> {
        (from..self.slot_count).find(|&idx| self.get(idx).is_empty())
    }

    fn next_occupied(&self, from: u64) -> u64 {
        let mut idx = from + 1;
        while idx < self.slot_count && !self.get(idx).is_occupied() {
            idx += 1;
        }
        idx
    }

    fn lookup(&self, fq: u64, fr: u64) -> bool {
        if !self.get(fq).is_occupied() {
            return false;
        }

        let start = self.run_start(fq);
        self.probe(start, fr).1
    }

    /// Returns `false` if the remainder was already in the run.
    fn insert(&self, fq: u64, fr: u64) -> crate::Result<bool> {
        let home = self.get(fq);

        if home.is_empty() {
            self.put(fq, Slot::with_remainder(fr).occupied(true))?;
            return Ok(true);
        }

        let run_exists = home.is_occupied();
        if !run_exists {
            self.put(fq, home.occupied(true))?;
        }

        let start = self.run_start(fq);

        let s = if run_exists {
            match self.probe(start, fr) {
                (_, true) => return Ok(false),
                (s, false) => s,
            }
        } else {
            start
        };

        let Some(empty) = self.first_empty(s) else {
            if !run_exists {
                self.put(fq, self.get(fq).occupied(false))?;
            }

            log::warn!(
                "Quotient filter ran out of slots at quotient {fq} ({} items in {} slots)",
                self.size(),
                self.slot_count,
            );
            return Err(Error::FilterOverflowed);
        };

        let mut entry = Slot::with_remainder(fr).shifted(s != fq);

        if run_exists {
            if s == start {
                // New run head, the old head continues it
                self.put(s, self.get(s).continuation(true))?;
            } else {
                entry = entry.continuation(true);
            }
        }

        // Shift [s, empty) one slot to the right, occupied bits stay in place
        for idx in (s + 1..=empty).rev() {
            let moved = self.get(idx - 1);
            let occupied = self.get(idx).is_occupied();
            self.put(idx, moved.shifted(true).occupied(occupied))?;
        }

        let occupied = self.get(s).is_occupied();
        self.put(s, entry.occupied(occupied))?;

        Ok(true)
    }

    /// Compacts the cluster after `s` one slot to the left, overwriting `s`.
    fn delete_at(&self, mut s: u64, fq: u64) -> crate::Result<()> {
        let mut quot = fq;
        let mut curr = self.get(s);

        loop {
            let sp = s + 1;
            let next = if sp < self.slot_count {
                self.get(sp)
            } else {
                Slot::default()
            };

            // An element in its home slot (or an empty slot) ends the cluster
            if !next.is_shifted() {
                self.put(s, Slot::default().occupied(curr.is_occupied()))?;
                return Ok(());
            }

            let mut moved = next;

            if next.is_run_start() {
                quot = self.next_occupied(quot);
                moved = moved.shifted(quot != s);
            }

            self.put(s, moved.occupied(curr.is_occupied()))?;

            s = sp;
            curr = next;
        }
    }

    /// Returns `false` if the remainder was not in the run.
    fn remove(&self, fq: u64, fr: u64) -> crate::Result<bool> {
        if !self.get(fq).is_occupied() {
            return Ok(false);
        }

        let start = self.run_start(fq);

        let s = match self.probe(start, fr) {
            (s, true) => s,
            (_, false) => return Ok(false),
        };

        let was_head = s == start;
        let run_empties =
            was_head && (s + 1 >= self.slot_count || !self.get(s + 1).is_continuation());

        if run_empties {
            self.put(fq, self.get(fq).occupied(false))?;
        }

        self.delete_at(s, fq)?;

        if was_head && !run_empties {
            // The next element of the run becomes its head
            let head = self.get(s);
            self.put(s, head.continuation(false).shifted(s != fq))?;
        }

        Ok(true)
    }

    #[expect(clippy::expect_used)]
    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer.lock().expect("lock is poisoned")
    }
}

impl AmqFilter for QuotientFilter {
    fn hasher(&self) -> &dyn KeyHasher {
        self.hasher.as_ref()
    }

    fn set_hash(&self, hash: u64) -> crate::Result<()> {
        let (fq, fr) = self.split(hash);
        let _guard = self.lock_writer();

        // A duplicate is a no-op even when the filter is full
        if self.size() >= self.max_items() && !self.lookup(fq, fr) {
            log::warn!("Quotient filter is overflowed ({} items)", self.size());
            return Err(Error::FilterOverflowed);
        }

        if self.insert(fq, fr)? {
            self.len.fetch_add(1, Ordering::AcqRel);

            #[cfg(feature = "metrics")]
            if let Some(metrics) = &self.metrics {
                metrics.sets.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    fn unset_hash(&self, hash: u64) -> crate::Result<()> {
        let (fq, fr) = self.split(hash);
        let _guard = self.lock_writer();

        if self.remove(fq, fr)? {
            let _ = self
                .len
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

            #[cfg(feature = "metrics")]
            if let Some(metrics) = &self.metrics {
                metrics.unsets.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    fn contains_hash(&self, hash: u64) -> bool {
        let (fq, fr) = self.split(hash);
        let hit = self.lookup(fq, fr);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_contains(hit);
        }

        hit
    }

    fn capacity(&self) -> u64 {
        self.slot_count
    }

    fn size(&self) -> u64 {
        self.len.load(Ordering::Acquire)
    }

    fn reset(&mut self) {
        self.slots.clear();
        self.len.store(0, Ordering::Release);
    }

    fn read_from<R: Read>(&mut self, reader: &mut R) -> crate::Result<u64> {
        let header = Header::decode_expecting(reader, QUOTIENT_MAGIC)?;

        let quotient_bits = u32::try_from(reader.read_u64::<LE>()?)
            .map_err(|_| DecodeError::InvalidHeader("QuotientFilter"))?;
        let remainder_bits = u32::try_from(reader.read_u64::<LE>()?)
            .map_err(|_| DecodeError::InvalidHeader("QuotientFilter"))?;

        check_bits(quotient_bits, remainder_bits)
            .map_err(|_| DecodeError::InvalidHeader("QuotientFilter"))?;

        let words = PackedWords::decode_with(reader, self.slots.words().discipline())?;

        let slot_count = slot_count(quotient_bits);
        let width = remainder_bits + CONTROL_BITS;

        if words.len() != BitWindow::words_for(slot_count, width)
            || header.item_count > 1 << quotient_bits
        {
            return Err(DecodeError::InvalidHeader("QuotientFilter").into());
        }

        let bytes_read = Header::SERIALIZED_LEN + 16 + words.serialized_len();

        self.slots = BitWindow::new(words, width);
        self.quotient_bits = quotient_bits;
        self.remainder_bits = remainder_bits;
        self.slot_count = slot_count;
        self.len.store(header.item_count, Ordering::Release);

        log::debug!(
            "Loaded quotient filter with {slot_count} slots (q={quotient_bits}, r={remainder_bits}) and {} items",
            header.item_count,
        );

        Ok(bytes_read)
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> crate::Result<u64> {
        let _guard = self.lock_writer();
        let words = self.slots.words();

        Header::new(QUOTIENT_MAGIC, self.size()).encode_into(writer)?;
        writer.write_u64::<LE>(u64::from(self.quotient_bits))?;
        writer.write_u64::<LE>(u64::from(self.remainder_bits))?;
        words.encode_into(writer)?;

        Ok(Header::SERIALIZED_LEN + 16 + words.serialized_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use std::collections::HashSet;
    use test_log::test;

    /// q=6, r=6: 64 home slots, 72 physical slots
    fn small() -> crate::Result<QuotientFilter> {
        QuotientFilter::new(&Config::new(32))
    }

    fn hash(fq: u64, fr: u64) -> u64 {
        (fq << 6) | fr
    }

    /// Checks the control bits are consistent with each other.
    fn assert_well_formed(filter: &QuotientFilter) {
        for idx in 0..filter.slot_count {
            let slot = filter.get(idx);

            if slot.is_continuation() {
                assert!(slot.is_shifted(), "continuation without shift at {idx}");
                assert!(idx > 0 && !filter.get(idx - 1).is_empty(), "broken run at {idx}");
            }
            if slot.is_occupied() {
                assert!(!slot.is_empty());
            }
        }
    }

    #[test]
    fn quotient_optimal_mqr() -> crate::Result<()> {
        assert_eq!((2_304, 11, 6), optimal_mqr(1_000, 0.01, 0.5)?);
        assert_eq!((72, 6, 6), optimal_mqr(32, 0.01, 0.5)?);
        assert_eq!((2, 1, 1), optimal_mqr(1, 1.0, 1.0)?);
        Ok(())
    }

    #[test]
    fn quotient_bucket_overflow() {
        assert!(matches!(
            optimal_mqr(1 << 40, 0.01, 0.5),
            Err(Error::BucketOverflow {
                quotient_bits: 41,
                ..
            }),
        ));
        assert!(matches!(
            optimal_mqr(1_000, 1e-19, 0.5),
            Err(Error::BucketOverflow {
                quotient_bits: 11,
                remainder_bits: 63,
            }),
        ));
    }

    #[test]
    fn quotient_invalid_config() {
        assert!(matches!(
            QuotientFilter::new(&Config::default()),
            Err(Error::MissingItemCount),
        ));
        assert!(matches!(
            QuotientFilter::new(&Config::new(10).false_positive_rate(0.0)),
            Err(Error::InvalidFalsePositiveRate(_)),
        ));
        assert!(matches!(
            QuotientFilter::new(&Config::new(10).load_factor(1.5)),
            Err(Error::InvalidLoadFactor(_)),
        ));
    }

    #[test]
    fn quotient_sizing() -> crate::Result<()> {
        let filter = QuotientFilter::new(&Config::new(1_000))?;
        assert_eq!(2_304, filter.capacity());
        assert_eq!(11, filter.quotient_bits());
        assert_eq!(6, filter.remainder_bits());
        assert_eq!(2_048, filter.max_items());
        Ok(())
    }

    #[test]
    fn quotient_run_roundtrip() -> crate::Result<()> {
        let filter = small()?;
        let (a, b, c) = (hash(5, 10), hash(5, 20), hash(5, 30));

        filter.set_hash(c)?;
        filter.set_hash(a)?;
        filter.set_hash(b)?;
        assert_eq!(3, filter.size());

        let head = filter.get(5);
        assert!(head.is_occupied() && !head.is_continuation() && !head.is_shifted());
        assert_eq!(10, head.remainder());

        for (idx, remainder) in [(6, 20), (7, 30)] {
            let slot = filter.get(idx);
            assert!(!slot.is_occupied() && slot.is_continuation() && slot.is_shifted());
            assert_eq!(remainder, slot.remainder());
        }

        filter.unset_hash(b)?;
        assert_eq!(2, filter.size());
        assert_eq!(10, filter.get(5).remainder());
        assert!(filter.get(6).is_continuation());
        assert_eq!(30, filter.get(6).remainder());
        assert!(filter.get(7).is_empty());
        assert!(filter.contains_hash(a));
        assert!(!filter.contains_hash(b));
        assert!(filter.contains_hash(c));

        filter.unset_hash(a)?;
        let head = filter.get(5);
        assert!(head.is_occupied() && !head.is_continuation() && !head.is_shifted());
        assert_eq!(30, head.remainder());
        assert!(filter.get(6).is_empty());

        filter.unset_hash(c)?;
        assert_eq!(0, filter.size());

        for idx in 0..filter.slot_count {
            assert!(filter.get(idx).is_empty(), "slot {idx} is not empty");
        }

        Ok(())
    }

    #[test]
    fn quotient_shifted_runs() -> crate::Result<()> {
        let filter = small()?;

        // Run of 5 pushes the run of 6 out of its home slot
        for fr in [3, 1, 2] {
            filter.set_hash(hash(5, fr))?;
        }
        filter.set_hash(hash(6, 9))?;
        filter.set_hash(hash(6, 4))?;
        filter.set_hash(hash(8, 7))?;
        assert_well_formed(&filter);

        let slot = filter.get(8);
        assert!(slot.is_occupied() && slot.is_run_start() && slot.is_shifted());
        assert_eq!(4, slot.remainder());
        assert_eq!(9, filter.get(9).remainder());
        assert_eq!(7, filter.get(10).remainder());
        assert!(filter.get(10).is_shifted());

        // Emptying the run of 5 slides everything back
        for fr in [2, 1, 3] {
            filter.unset_hash(hash(5, fr))?;
            assert_well_formed(&filter);
        }

        assert!(!filter.get(5).is_occupied());
        assert!(filter.get(5).is_empty());

        let slot = filter.get(6);
        assert!(slot.is_cluster_start());
        assert_eq!(4, slot.remainder());
        assert_eq!(9, filter.get(7).remainder());

        let slot = filter.get(8);
        assert!(slot.is_cluster_start());
        assert_eq!(7, slot.remainder());

        for (fq, fr) in [(6, 9), (6, 4), (8, 7)] {
            assert!(filter.contains_hash(hash(fq, fr)));
        }

        Ok(())
    }

    #[test]
    fn quotient_duplicate_is_noop() -> crate::Result<()> {
        let filter = small()?;

        filter.set("a")?;
        filter.set("a")?;
        assert_eq!(1, filter.size());

        filter.unset("a")?;
        assert_eq!(0, filter.size());
        assert!(!filter.contains("a"));

        filter.unset("a")?;
        assert_eq!(0, filter.size());

        Ok(())
    }

    #[test]
    fn quotient_overflowed_at_max_items() -> crate::Result<()> {
        let filter = small()?;

        for fq in 0..64 {
            filter.set_hash(hash(fq, 1))?;
        }
        assert_eq!(64, filter.size());

        assert!(matches!(
            filter.set_hash(hash(3, 2)),
            Err(Error::FilterOverflowed),
        ));
        assert_eq!(64, filter.size());

        filter.set_hash(hash(3, 1))?;
        assert_eq!(64, filter.size());

        Ok(())
    }

    #[test]
    fn quotient_overflowed_at_table_end() -> crate::Result<()> {
        let filter = small()?;

        // Run of 60 fills the last 12 slots
        for fr in 0..12 {
            filter.set_hash(hash(60, fr))?;
        }
        assert!(filter.get(71).is_continuation());

        assert!(matches!(
            filter.set_hash(hash(60, 20)),
            Err(Error::FilterOverflowed),
        ));

        // Home slot 62 is taken by the run of 60
        assert!(matches!(
            filter.set_hash(hash(62, 20)),
            Err(Error::FilterOverflowed),
        ));
        assert!(!filter.get(62).is_occupied());

        assert_eq!(12, filter.size());
        assert_well_formed(&filter);

        for fr in 0..12 {
            assert!(filter.contains_hash(hash(60, fr)));
        }

        Ok(())
    }

    #[test]
    fn quotient_matches_model() -> crate::Result<()> {
        let filter = small()?;
        let mut model = HashSet::new();
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..5_000 {
            // Keep clusters away from the table end
            let fq = rng.random_range(0..32);
            let fr = rng.random_range(0..64);

            if rng.random_bool(0.55) && model.len() < 24 {
                filter.set_hash(hash(fq, fr))?;
                model.insert((fq, fr));
            } else if let Some(&victim) = model.iter().next() {
                filter.unset_hash(hash(victim.0, victim.1))?;
                model.remove(&victim);
            }

            assert_eq!(model.len() as u64, filter.size());
        }

        assert_well_formed(&filter);

        for &(fq, fr) in &model {
            assert!(filter.contains_hash(hash(fq, fr)));
        }

        for (fq, fr) in model.drain() {
            filter.unset_hash(hash(fq, fr))?;
        }

        for idx in 0..filter.slot_count {
            assert!(filter.get(idx).is_empty(), "slot {idx} is not empty");
        }

        Ok(())
    }

    #[test]
    fn quotient_serde_roundtrip() -> crate::Result<()> {
        let filter = QuotientFilter::new(&Config::new(1_000))?;

        for key in 0..800u64 {
            filter.set(&key)?;
        }

        let mut bytes = vec![];
        let written = filter.write_to(&mut bytes)?;
        assert_eq!(bytes.len() as u64, written);

        let mut copy = small()?;
        assert_eq!(written, copy.read_from(&mut &bytes[..])?);

        assert_eq!(filter.size(), copy.size());
        assert_eq!(2_304, copy.capacity());
        assert_eq!(11, copy.quotient_bits());

        for key in 0..800u64 {
            assert!(copy.contains(&key));
        }

        Ok(())
    }

    #[test]
    fn quotient_read_rejects_foreign_dump() -> crate::Result<()> {
        let mut bytes = vec![];
        crate::CuckooFilter::new(&Config::new(10))?.write_to(&mut bytes)?;

        let mut filter = small()?;
        assert!(matches!(
            filter.read_from(&mut &bytes[..]),
            Err(Error::Decode(DecodeError::InvalidSignature)),
        ));

        Ok(())
    }

    #[test]
    fn quotient_reset() -> crate::Result<()> {
        let mut filter = small()?;

        filter.set("a")?;
        filter.reset();

        assert_eq!(0, filter.size());
        assert!(!filter.contains("a"));

        Ok(())
    }
}
