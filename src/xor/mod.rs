// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Binary fuse (xor) filter
//!
//! Built once from a batch of keys, immutable afterwards. Every key maps to
//! three slots in consecutive segments of a byte array; a key is contained
//! if the three stored bytes xor to its tag.

mod builder;
pub mod layout;
mod pool;

pub use pool::{Scratch, ScratchGuard, ScratchPool};

use crate::{
    coding::{DecodeError, Encode, Header, XOR_MAGIC},
    hash::{hash_key, mix_split, Hashable, KeyHasher},
    AmqFilter, Config, Error,
};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use layout::{tag, Layout};
use std::{
    io::{Read, Write},
    sync::Arc,
};

#[cfg(feature = "metrics")]
use crate::metrics::Metrics;

/// Start of the seed sequence, unless configured otherwise
const DEFAULT_SEED: u64 = 0x726b_2b9d_438b_9d4d;

/// seed + segment length + segment count + array length
const LAYOUT_LEN: u64 = 4 * std::mem::size_of::<u64>() as u64;

/// An immutable binary fuse filter with 8-bit fingerprints
///
/// The false positive rate is about 1/256.
pub struct XorFilter {
    seed: u64,
    layout: Layout,
    fingerprints: Box<[u8]>,
    len: u64,

    hasher: Arc<dyn KeyHasher>,

    #[cfg(feature = "metrics")]
    metrics: Option<Arc<Metrics>>,
}

impl std::fmt::Debug for XorFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XorFilter")
            .field("len", &self.len)
            .field("seed", &self.seed)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl XorFilter {
    /// Builds a filter over `keys` with the default hasher.
    ///
    /// # Errors
    ///
    /// Will return `Err` if there are no keys, or no seed could be found
    /// that makes the key set peelable.
    pub fn build<K: Hashable, I: IntoIterator<Item = K>>(keys: I) -> crate::Result<Self> {
        Self::build_with(&Config::default(), &ScratchPool::new(), keys)
    }

    /// Builds a filter over `keys`, using the config's hasher and seed,
    /// and borrowing build space from `pool`.
    ///
    /// Duplicate keys are ignored.
    ///
    /// # Errors
    ///
    /// Same as [`XorFilter::build`].
    pub fn build_with<K: Hashable, I: IntoIterator<Item = K>>(
        config: &Config,
        pool: &ScratchPool,
        keys: I,
    ) -> crate::Result<Self> {
        let hashes = keys
            .into_iter()
            .map(|key| hash_key(config.hasher.as_ref(), &key))
            .collect();

        Self::build_from_hashes(config, pool, hashes)
    }

    /// Builds a filter over precomputed key hashes.
    ///
    /// # Errors
    ///
    /// Same as [`XorFilter::build`].
    pub fn build_from_hashes(
        config: &Config,
        pool: &ScratchPool,
        mut hashes: Vec<u64>,
    ) -> crate::Result<Self> {
        hashes.sort_unstable();
        hashes.dedup();

        if hashes.is_empty() {
            return Err(Error::EmptyKeyset);
        }

        let built = {
            let mut scratch = pool.acquire();
            builder::build(&hashes, config.seed.unwrap_or(DEFAULT_SEED), &mut scratch)?
        };

        let len = hashes.len() as u64;

        #[expect(clippy::cast_precision_loss)]
        let bits_per_key = (built.fingerprints.len() * 8) as f64 / len as f64;

        log::debug!(
            "Built xor filter over {len} keys: {} slots ({bits_per_key:.2} bits per key) after {} attempt(s)",
            built.layout.array_length,
            built.attempts,
        );

        let filter = Self {
            seed: built.seed,
            layout: built.layout,
            fingerprints: built.fingerprints,
            len,
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

    /// Seed the key hashes are mixed with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Segment geometry.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn lookup(&self, hash: u64) -> bool {
        let hash = mix_split(hash, self.seed);
        let [h0, h1, h2] = self.layout.hash3(hash);

        let (Some(a), Some(b), Some(c)) = (
            self.fingerprints.get(h0),
            self.fingerprints.get(h1),
            self.fingerprints.get(h2),
        ) else {
            return false;
        };

        tag(hash) ^ a ^ b ^ c == 0
    }
}

impl AmqFilter for XorFilter {
    fn hasher(&self) -> &dyn KeyHasher {
        self.hasher.as_ref()
    }

    fn set_hash(&self, _: u64) -> crate::Result<()> {
        Err(Error::UnsupportedSet)
    }

    fn unset_hash(&self, _: u64) -> crate::Result<()> {
        Err(Error::UnsupportedUnset)
    }

    fn contains_hash(&self, hash: u64) -> bool {
        let hit = self.lookup(hash);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_contains(hit);
        }

        hit
    }

    fn capacity(&self) -> u64 {
        u64::from(self.layout.array_length)
    }

    fn size(&self) -> u64 {
        self.len
    }

    fn reset(&mut self) {
        self.seed = 0;
        self.layout = Layout::EMPTY;
        self.fingerprints = Box::default();
        self.len = 0;
    }

    fn read_from<R: Read>(&mut self, reader: &mut R) -> crate::Result<u64> {
        let header = Header::decode_expecting(reader, XOR_MAGIC)?;

        let seed = reader.read_u64::<LE>()?;

        let mut parts = [0u32; 3];
        for part in &mut parts {
            *part = u32::try_from(reader.read_u64::<LE>()?)
                .map_err(|_| DecodeError::InvalidHeader("XorFilter"))?;
        }
        let [segment_length, segment_count, array_length] = parts;

        let layout = Layout::from_parts(segment_length, segment_count, array_length)
            .ok_or(DecodeError::InvalidHeader("XorFilter"))?;

        // NOTE: An empty filter stores no keys, a non-empty one has at most
        // one key per slot
        if header.item_count > u64::from(array_length)
            || (array_length == 0) != (header.item_count == 0)
        {
            return Err(DecodeError::InvalidHeader("XorFilter").into());
        }

        // NOTE: The length comes from an untrusted header, so the buffer
        // only grows with the bytes that actually arrive
        let mut fingerprints = Vec::with_capacity((array_length as usize).min(1 << 20));
        reader
            .by_ref()
            .take(u64::from(array_length))
            .read_to_end(&mut fingerprints)?;

        if fingerprints.len() != array_length as usize {
            return Err(DecodeError::UnexpectedEndOfStream.into());
        }

        self.seed = seed;
        self.layout = layout;
        self.fingerprints = fingerprints.into_boxed_slice();
        self.len = header.item_count;

        log::debug!(
            "Loaded xor filter with {array_length} slots and {} keys",
            header.item_count,
        );

        Ok(Header::SERIALIZED_LEN + LAYOUT_LEN + u64::from(array_length))
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> crate::Result<u64> {
        Header::new(XOR_MAGIC, self.len).encode_into(writer)?;

        writer.write_u64::<LE>(self.seed)?;
        writer.write_u64::<LE>(u64::from(self.layout.segment_length))?;
        writer.write_u64::<LE>(u64::from(self.layout.segment_count))?;
        writer.write_u64::<LE>(u64::from(self.layout.array_length))?;
        writer.write_all(&self.fingerprints)?;

        Ok(Header::SERIALIZED_LEN + LAYOUT_LEN + self.fingerprints.len() as u64)
    }
}
