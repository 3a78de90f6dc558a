// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::hash::{Hashable, KeyHasher};
use std::io::{Read, Write};

/// Approximate membership query filter
///
/// `contains` may answer `true` for a key that was never inserted (false
/// positive), but never answers `false` for a key that is still stored.
///
/// Every keyed operation encodes the key, hashes it with the filter's
/// [`KeyHasher`] and delegates to the `*_hash` variant, so callers holding
/// precomputed digests can skip the encoding step.
pub trait AmqFilter {
    /// Hash provider the filter was configured with.
    fn hasher(&self) -> &dyn KeyHasher;

    /// Digests `key` the same way the keyed operations do.
    fn hash_key<K: Hashable + ?Sized>(&self, key: &K) -> u64 {
        crate::hash::hash_key(self.hasher(), key)
    }

    /// Inserts a precomputed key hash.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the filter is full or immutable,
    /// or a concurrent write gave up.
    fn set_hash(&self, hash: u64) -> crate::Result<()>;

    /// Removes a precomputed key hash.
    ///
    /// Removing a hash that is not present is a no-op.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the filter is immutable,
    /// or a concurrent write gave up.
    fn unset_hash(&self, hash: u64) -> crate::Result<()>;

    /// Returns `true` if the hash may be contained.
    fn contains_hash(&self, hash: u64) -> bool;

    /// Inserts a key.
    ///
    /// # Errors
    ///
    /// See [`AmqFilter::set_hash`].
    fn set<K: Hashable + ?Sized>(&self, key: &K) -> crate::Result<()> {
        self.set_hash(self.hash_key(key))
    }

    /// Removes a key.
    ///
    /// # Errors
    ///
    /// See [`AmqFilter::unset_hash`].
    fn unset<K: Hashable + ?Sized>(&self, key: &K) -> crate::Result<()> {
        self.unset_hash(self.hash_key(key))
    }

    /// Returns `true` if the key may be contained.
    fn contains<K: Hashable + ?Sized>(&self, key: &K) -> bool {
        self.contains_hash(self.hash_key(key))
    }

    /// Number of slots the filter was sized to.
    fn capacity(&self) -> u64;

    /// Number of items currently stored.
    fn size(&self) -> u64;

    /// Removes every item.
    fn reset(&mut self);

    /// Replaces the filter's contents with a dump, returning the number of
    /// bytes consumed.
    ///
    /// The hash provider and write discipline are kept.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the dump is invalid or an IO error occurs.
    fn read_from<R: Read>(&mut self, reader: &mut R) -> crate::Result<u64>;

    /// Writes a dump of the filter, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs.
    fn write_to<W: Write>(&self, writer: &mut W) -> crate::Result<u64>;
}
