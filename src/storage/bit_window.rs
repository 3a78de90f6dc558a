// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::PackedWords;

const WORD_BITS: u64 = u64::BITS as u64;

/// Mask of the lowest `width` bits
#[must_use]
pub fn low_mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

/// Fixed-width fields laid out back to back over a [`PackedWords`]
///
/// Field `i` covers bits `[i * width, (i + 1) * width)`; a field may straddle
/// two words, in which case its upper bits spill into the low bits of the
/// next word.
#[derive(Debug)]
pub struct BitWindow {
    words: PackedWords,
    width: u32,
}

impl BitWindow {
    /// Wraps `words` as an array of `width`-bit fields.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or larger than 64.
    #[must_use]
    pub fn new(words: PackedWords, width: u32) -> Self {
        assert!((1..=u64::BITS).contains(&width), "field width out of range");
        Self { words, width }
    }

    /// Number of words needed to hold `fields` fields of `width` bits.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the word count is allocated, so it fits into usize"
    )]
    pub fn words_for(fields: u64, width: u32) -> usize {
        let bits = fields * u64::from(width);
        bits.div_ceil(WORD_BITS) as usize
    }

    /// Field width in bits.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Underlying words.
    #[must_use]
    pub fn words(&self) -> &PackedWords {
        &self.words
    }

    /// Number of whole fields the window holds.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.words.len() as u64 * WORD_BITS / u64::from(self.width)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "word index is bounded by the allocated word count"
    )]
    fn locate(&self, idx: u64) -> (usize, u32) {
        let offset = idx * u64::from(self.width);
        ((offset / WORD_BITS) as usize, (offset % WORD_BITS) as u32)
    }

    /// Reads field `idx`.
    #[must_use]
    pub fn get(&self, idx: u64) -> u64 {
        let (word, shift) = self.locate(idx);
        let mask = low_mask(self.width);

        let lo = self.words.load(word) >> shift;

        if shift + self.width > u64::BITS {
            let hi = self.words.load(word + 1) << (u64::BITS - shift);
            (lo | hi) & mask
        } else {
            lo & mask
        }
    }

    /// Overwrites field `idx` with the low `width` bits of `value`.
    ///
    /// A straddling field is written as two independent word updates.
    pub fn set(&self, idx: u64, value: u64) -> crate::Result<()> {
        let (word, shift) = self.locate(idx);
        let mask = low_mask(self.width);
        let value = value & mask;

        self.words.update(word, |w| {
            let cleared = w & !(mask << shift);
            Some((cleared | (value << shift), ()))
        })?;

        if shift + self.width > u64::BITS {
            let spill = shift + self.width - u64::BITS;
            let spill_mask = low_mask(spill);
            let spill_value = value >> (u64::BITS - shift);

            self.words.update(word + 1, |w| {
                Some(((w & !spill_mask) | spill_value, ()))
            })?;
        }

        Ok(())
    }

    /// Zeroes every field.
    pub fn clear(&self) {
        self.words.clear();
    }
}
