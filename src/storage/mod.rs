// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Packed bucket storage
//!
//! All mutable filters keep their buckets in a flat array of 64-bit words.
//! How those words are written depends on the [`WriteDiscipline`].

/// Arbitrary-width fields over packed words
pub mod bit_window;

/// Cuckoo buckets over packed words
pub mod bucket;

use crate::coding::{Decode, DecodeError, Encode, Header, VECTOR_MAGIC};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{Read, Write};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

/// How bucket words are mutated
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WriteDiscipline {
    /// Plain load + store
    ///
    /// `set`/`unset` must be serialized by the caller.
    #[default]
    SingleWriter,

    /// Load → compute → compare-and-swap, retried at most `write_attempts` times
    ///
    /// Exhausting the attempts surfaces [`crate::Error::WriteLimitReached`].
    MultiWriter {
        /// Maximum number of CAS attempts per word update
        write_attempts: NonZeroUsize,
    },
}

/// Flat array of bucket words
#[derive(Debug)]
pub struct PackedWords {
    words: Box<[AtomicU64]>,
    discipline: WriteDiscipline,
}

impl PackedWords {
    /// Allocates `len` zeroed words.
    #[must_use]
    pub fn zeroed(len: usize, discipline: WriteDiscipline) -> Self {
        let words = (0..len).map(|_| AtomicU64::new(0)).collect();
        Self { words, discipline }
    }

    /// How the words are written.
    #[must_use]
    pub fn discipline(&self) -> WriteDiscipline {
        self.discipline
    }

    /// Number of words.
    #[must_use]
    #[expect(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Size of the payload in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.words.len() * std::mem::size_of::<u64>()
    }

    /// Loads the word at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    #[must_use]
    pub fn load(&self, idx: usize) -> u64 {
        // NOTE: We trust the caller
        #[expect(clippy::expect_used)]
        let word = self.words.get(idx).expect("word index should be in bounds");

        word.load(Ordering::Acquire)
    }

    /// Applies `f` to the word at `idx`.
    ///
    /// `f` receives the current word and returns the replacement word plus a
    /// value handed back to the caller, or `None` to leave the word untouched.
    /// Under the multi-writer discipline `f` may be called several times.
    pub fn update<T, F>(&self, idx: usize, mut f: F) -> crate::Result<Option<T>>
    where
        F: FnMut(u64) -> Option<(u64, T)>,
    {
        // NOTE: We trust the caller
        #[expect(clippy::expect_used)]
        let word = self.words.get(idx).expect("word index should be in bounds");

        match self.discipline {
            WriteDiscipline::SingleWriter => {
                let current = word.load(Ordering::Acquire);

                Ok(f(current).map(|(new, out)| {
                    word.store(new, Ordering::Release);
                    out
                }))
            }
            WriteDiscipline::MultiWriter { write_attempts } => {
                for _ in 0..write_attempts.get() {
                    let current = word.load(Ordering::Acquire);

                    let Some((new, out)) = f(current) else {
                        return Ok(None);
                    };

                    if word
                        .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return Ok(Some(out));
                    }
                }

                Err(crate::Error::WriteLimitReached)
            }
        }
    }

    /// Zeroes every word.
    pub fn clear(&self) {
        for word in &self.words {
            word.store(0, Ordering::Release);
        }
    }

    /// Writes the raw words (without header).
    fn write_words<W: Write>(&self, writer: &mut W) -> crate::Result<()> {
        for word in &self.words {
            writer.write_u64::<LE>(word.load(Ordering::Acquire))?;
        }
        Ok(())
    }

    /// Reads a packed vector dump, adopting the given discipline.
    pub fn decode_with<R: Read>(
        reader: &mut R,
        discipline: WriteDiscipline,
    ) -> crate::Result<Self> {
        let header = Header::decode_expecting(reader, VECTOR_MAGIC)?;

        let len = usize::try_from(header.item_count)
            .map_err(|_| DecodeError::InvalidHeader("PackedWords"))?;

        let mut words = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            words.push(AtomicU64::new(reader.read_u64::<LE>()?));
        }

        Ok(Self {
            words: words.into_boxed_slice(),
            discipline,
        })
    }

    /// Number of bytes [`Encode::encode_into`] writes.
    #[must_use]
    pub fn serialized_len(&self) -> u64 {
        Header::SERIALIZED_LEN + self.byte_len() as u64
    }
}

impl Encode for PackedWords {
    fn encode_into<W: Write>(&self, writer: &mut W) -> crate::Result<()> {
        Header::new(VECTOR_MAGIC, self.words.len() as u64).encode_into(writer)?;
        self.write_words(writer)
    }
}

impl Decode for PackedWords {
    fn decode_from<R: Read>(reader: &mut R) -> crate::Result<Self> {
        Self::decode_with(reader, WriteDiscipline::SingleWriter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Arc;
    use test_log::test;

    fn multi(write_attempts: usize) -> WriteDiscipline {
        WriteDiscipline::MultiWriter {
            write_attempts: NonZeroUsize::new(write_attempts).unwrap_or(NonZeroUsize::MIN),
        }
    }

    #[test]
    fn packed_words_update_single_writer() -> crate::Result<()> {
        let words = PackedWords::zeroed(4, WriteDiscipline::SingleWriter);

        assert_eq!(Some(0), words.update(2, |w| Some((w | 0b101, w)))?);
        assert_eq!(0b101, words.load(2));

        assert_eq!(None::<()>, words.update(2, |_| None)?);
        assert_eq!(0b101, words.load(2));

        words.clear();
        assert_eq!(0, words.load(2));

        Ok(())
    }

    #[test]
    fn packed_words_cas_gives_up() {
        let words = PackedWords::zeroed(1, multi(3));

        let mut calls = 0;
        let result = words.update(0, |w| {
            calls += 1;

            // Sneak in a concurrent write so the CAS always fails
            if let Some(word) = words.words.first() {
                word.store(w + 1, Ordering::Release);
            }

            Some((w + 100, ()))
        });

        assert!(matches!(result, Err(Error::WriteLimitReached)));
        assert_eq!(3, calls);
    }

    #[test]
    fn packed_words_concurrent_increments() -> crate::Result<()> {
        let words = Arc::new(PackedWords::zeroed(1, multi(1_000_000)));

        let handles = (0..4)
            .map(|_| {
                let words = words.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        words.update(0, |w| Some((w + 1, ()))).map(|_| ())?;
                    }
                    Ok::<_, Error>(())
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            #[allow(clippy::expect_used)]
            handle.join().expect("thread should not panic")?;
        }

        assert_eq!(4_000, words.load(0));

        Ok(())
    }

    #[test]
    fn packed_words_serde_roundtrip() -> crate::Result<()> {
        let words = PackedWords::zeroed(3, WriteDiscipline::SingleWriter);
        words.update(0, |_| Some((u64::MAX, ())))?;
        words.update(2, |_| Some((42, ())))?;

        let bytes = words.encode_into_vec();
        assert_eq!(words.serialized_len(), bytes.len() as u64);

        let copy = PackedWords::decode_from(&mut &bytes[..])?;
        assert_eq!(3, copy.len());
        assert_eq!(u64::MAX, copy.load(0));
        assert_eq!(0, copy.load(1));
        assert_eq!(42, copy.load(2));

        Ok(())
    }
}
