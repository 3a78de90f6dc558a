// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Hashing base shared by all filters.
//!
//! A key is first turned into its canonical byte encoding ([`Hashable`]),
//! then digested by an injected [`KeyHasher`].

/// A key that can be encoded into bytes for hashing
///
/// Integers and floats are encoded little-endian, strings as UTF-8 and
/// character sequences as their `u32` scalar values.
pub trait Hashable {
    /// Appends the canonical byte encoding of `self` to `buf`.
    fn encode_key(&self, buf: &mut Vec<u8>);
}

macro_rules! impl_hashable_le {
    ($($t:ty),*) => {
        $(
            impl Hashable for $t {
                fn encode_key(&self, buf: &mut Vec<u8>) {
                    buf.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_hashable_le!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl Hashable for [u8] {
    fn encode_key(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}

impl<const N: usize> Hashable for [u8; N] {
    fn encode_key(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}

impl Hashable for Vec<u8> {
    fn encode_key(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}

impl Hashable for str {
    fn encode_key(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }
}

impl Hashable for String {
    fn encode_key(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }
}

impl Hashable for [char] {
    fn encode_key(&self, buf: &mut Vec<u8>) {
        for c in self {
            buf.extend_from_slice(&u32::from(*c).to_le_bytes());
        }
    }
}

impl Hashable for Vec<char> {
    fn encode_key(&self, buf: &mut Vec<u8>) {
        self.as_slice().encode_key(buf);
    }
}

impl<T: Hashable + ?Sized> Hashable for &T {
    fn encode_key(&self, buf: &mut Vec<u8>) {
        (**self).encode_key(buf);
    }
}

/// Injected hash provider
///
/// Must be deterministic: the same bytes always produce the same digest.
pub trait KeyHasher: Send + Sync {
    /// 64-bit digest of `bytes`.
    fn hash64(&self, bytes: &[u8]) -> u64;

    /// 64-bit digest of `bytes` under `salt`, for multi-probe derivation.
    fn hash64_salted(&self, bytes: &[u8], salt: u64) -> u64;

    /// 128-bit digest of `bytes`.
    fn hash128(&self, bytes: &[u8]) -> u128;
}

/// Default hash provider (XXH3)
#[derive(Copy, Clone, Debug, Default)]
pub struct Xxh3Hasher;

impl KeyHasher for Xxh3Hasher {
    fn hash64(&self, bytes: &[u8]) -> u64 {
        xxhash_rust::xxh3::xxh3_64(bytes)
    }

    fn hash64_salted(&self, bytes: &[u8], salt: u64) -> u64 {
        xxhash_rust::xxh3::xxh3_64_with_seed(bytes, salt)
    }

    fn hash128(&self, bytes: &[u8]) -> u128 {
        xxhash_rust::xxh3::xxh3_128(bytes)
    }
}

/// Encodes `key` and digests it with `hasher`.
pub fn hash_key<K: Hashable + ?Sized>(hasher: &dyn KeyHasher, key: &K) -> u64 {
    let mut buf = Vec::with_capacity(16);
    key.encode_key(&mut buf);
    hasher.hash64(&buf)
}

/// Murmur64 finalizer
#[must_use]
pub fn murmur64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h = h.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    h ^= h >> 33;
    h
}

/// Re-hashes an existing digest under `seed`.
#[must_use]
pub fn mix_split(hash: u64, seed: u64) -> u64 {
    murmur64(hash.wrapping_add(seed))
}

/// Advances a splitmix64 sequence and returns the next value.
pub fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
