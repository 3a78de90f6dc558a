// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::PackedWords;

/// Number of fingerprint slots per cuckoo bucket
pub const SLOTS_PER_BUCKET: usize = 4;

const SLOT_BITS: u32 = 8;
const BUCKET_BITS: u32 = SLOT_BITS * SLOTS_PER_BUCKET as u32;

/// Number of buckets packed into one storage word
pub const BUCKETS_PER_WORD: u64 = (u64::BITS / BUCKET_BITS) as u64;

/// A cuckoo bucket: 4 one-byte fingerprint slots packed into 32 bits
///
/// A slot value of `0` means "empty".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Bucket(u32);

impl Bucket {
    /// Raw 32-bit representation.
    #[must_use]
    pub fn into_raw(self) -> u32 {
        self.0
    }

    /// Gets the fingerprint in slot `idx`.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "we want a single byte")]
    pub fn slot(self, idx: usize) -> u8 {
        debug_assert!(idx < SLOTS_PER_BUCKET);
        (self.0 >> (idx as u32 * SLOT_BITS)) as u8
    }

    /// Returns a copy with slot `idx` set to `fp`.
    #[must_use]
    pub fn with_slot(self, idx: usize, fp: u8) -> Self {
        debug_assert!(idx < SLOTS_PER_BUCKET);

        let shift = idx as u32 * SLOT_BITS;
        let cleared = self.0 & !(0xFF << shift);
        Self(cleared | (u32::from(fp) << shift))
    }

    /// Index of the first slot holding `fp`.
    #[must_use]
    pub fn find(self, fp: u8) -> Option<usize> {
        (0..SLOTS_PER_BUCKET).find(|&idx| self.slot(idx) == fp)
    }

    /// Index of the first free slot.
    #[must_use]
    pub fn first_empty(self) -> Option<usize> {
        self.find(0)
    }

    /// Number of non-empty slots.
    #[must_use]
    pub fn occupied(self) -> usize {
        (0..SLOTS_PER_BUCKET).filter(|&idx| self.slot(idx) != 0).count()
    }
}

/// Array of cuckoo buckets, two per storage word
#[derive(Debug)]
pub struct BucketArray {
    words: PackedWords,
    buckets: u64,
}

impl BucketArray {
    /// Number of words needed for `buckets` buckets.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "bucket count is bounded by the allocation"
    )]
    pub fn words_for(buckets: u64) -> usize {
        buckets.div_ceil(BUCKETS_PER_WORD) as usize
    }

    /// Wraps `words` as an array of `buckets` buckets.
    #[must_use]
    pub fn new(words: PackedWords, buckets: u64) -> Self {
        debug_assert!(words.len() >= Self::words_for(buckets));
        Self { words, buckets }
    }

    /// Number of buckets.
    #[must_use]
    #[expect(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.buckets
    }

    /// Underlying words.
    #[must_use]
    pub fn words(&self) -> &PackedWords {
        &self.words
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "word index is bounded by the allocation"
    )]
    fn locate(bucket: u64) -> (usize, u32) {
        let word = (bucket / BUCKETS_PER_WORD) as usize;
        let shift = (bucket % BUCKETS_PER_WORD) as u32 * BUCKET_BITS;
        (word, shift)
    }

    fn extract(word: u64, shift: u32) -> Bucket {
        #[expect(clippy::cast_possible_truncation, reason = "we mask to 32 bits")]
        let raw = (word >> shift) as u32;
        Bucket(raw)
    }

    fn replace(word: u64, shift: u32, bucket: Bucket) -> u64 {
        let cleared = word & !(u64::from(u32::MAX) << shift);
        cleared | (u64::from(bucket.0) << shift)
    }

    /// Loads bucket `idx`.
    #[must_use]
    pub fn get(&self, idx: u64) -> Bucket {
        let (word, shift) = Self::locate(idx);
        Self::extract(self.words.load(word), shift)
    }

    /// Returns `true` if bucket `idx` holds `fp`.
    #[must_use]
    pub fn contains(&self, idx: u64, fp: u8) -> bool {
        self.get(idx).find(fp).is_some()
    }

    /// Applies `f` to bucket `idx` through a single word update.
    fn modify<T>(
        &self,
        idx: u64,
        mut f: impl FnMut(Bucket) -> Option<(Bucket, T)>,
    ) -> crate::Result<Option<T>> {
        let (word, shift) = Self::locate(idx);

        self.words.update(word, |w| {
            f(Self::extract(w, shift)).map(|(bucket, out)| (Self::replace(w, shift, bucket), out))
        })
    }

    /// Stores `fp` in the first empty slot of bucket `idx`.
    ///
    /// Returns `false` if the bucket is full.
    pub fn try_insert(&self, idx: u64, fp: u8) -> crate::Result<bool> {
        debug_assert_ne!(0, fp, "fingerprint 0 marks an empty slot");

        self.modify(idx, |bucket| {
            bucket
                .first_empty()
                .map(|slot| (bucket.with_slot(slot, fp), ()))
        })
        .map(|inserted| inserted.is_some())
    }

    /// Clears one slot holding `fp` in bucket `idx`.
    ///
    /// Returns `false` if no slot matched.
    pub fn remove(&self, idx: u64, fp: u8) -> crate::Result<bool> {
        self.modify(idx, |bucket| {
            bucket.find(fp).map(|slot| (bucket.with_slot(slot, 0), ()))
        })
        .map(|removed| removed.is_some())
    }

    /// Puts `fp` into `slot` of bucket `idx`, returning what was there before.
    pub fn swap(&self, idx: u64, slot: usize, fp: u8) -> crate::Result<u8> {
        self.modify(idx, |bucket| {
            Some((bucket.with_slot(slot, fp), bucket.slot(slot)))
        })
        .map(Option::unwrap_or_default)
    }

    /// Puts `fp` into `slot` of bucket `idx` only if the slot still holds `expected`.
    ///
    /// Returns `false` if the slot changed in the meantime.
    pub fn compare_swap(&self, idx: u64, slot: usize, expected: u8, fp: u8) -> crate::Result<bool> {
        self.modify(idx, |bucket| {
            (bucket.slot(slot) == expected).then(|| (bucket.with_slot(slot, fp), ()))
        })
        .map(|swapped| swapped.is_some())
    }

    /// Counts occupied slots over all buckets.
    #[must_use]
    pub fn occupied(&self) -> u64 {
        (0..self.buckets)
            .map(|idx| self.get(idx).occupied() as u64)
            .sum()
    }

    /// Empties every bucket.
    pub fn clear(&self) {
        self.words.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::WriteDiscipline;
    use test_log::test;

    #[test]
    fn bucket_slots() {
        let bucket = Bucket::default().with_slot(0, 7).with_slot(3, 255);

        assert_eq!(7, bucket.slot(0));
        assert_eq!(0, bucket.slot(1));
        assert_eq!(255, bucket.slot(3));
        assert_eq!(0xFF00_0007, bucket.into_raw());

        assert_eq!(Some(3), bucket.find(255));
        assert_eq!(Some(1), bucket.first_empty());
        assert_eq!(2, bucket.occupied());

        let bucket = bucket.with_slot(0, 0);
        assert_eq!(Some(0), bucket.first_empty());
        assert_eq!(0xFF00_0000, bucket.into_raw());
    }

    #[test]
    fn bucket_array_neighbours_are_independent() -> crate::Result<()> {
        let array = BucketArray::new(
            PackedWords::zeroed(BucketArray::words_for(4), WriteDiscipline::SingleWriter),
            4,
        );
        assert_eq!(2, array.words().len());

        for fp in 1..=4 {
            assert!(array.try_insert(1, fp)?);
        }
        assert!(!array.try_insert(1, 5)?);

        assert_eq!(Bucket::default(), array.get(0));
        assert_eq!(Bucket::default(), array.get(2));
        assert_eq!(4, array.get(1).occupied());
        assert_eq!(0x0403_0201_0000_0000, array.words().load(0));

        assert!(array.try_insert(0, 9)?);
        assert!(array.contains(0, 9));
        assert!(!array.contains(1, 9));

        assert_eq!(3, array.swap(1, 2, 42)?);
        assert!(array.contains(1, 42));
        assert!(!array.contains(1, 3));

        assert!(!array.compare_swap(1, 2, 3, 7)?);
        assert!(array.contains(1, 42));
        assert!(array.compare_swap(1, 2, 42, 3)?);
        assert_eq!(3, array.get(1).slot(2));
        assert!(array.compare_swap(1, 2, 3, 42)?);

        assert!(array.remove(1, 42)?);
        assert!(!array.remove(1, 42)?);
        assert_eq!(4, array.occupied());

        array.clear();
        assert_eq!(0, array.occupied());

        Ok(())
    }
}
