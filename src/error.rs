// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::DecodeError;

/// Represents errors that can occur in the filters
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Deserialization of a filter dump failed
    Decode(DecodeError),

    /// No desired item count was configured
    MissingItemCount,

    /// False positive probability outside of `(0, 1]`
    InvalidFalsePositiveRate(f64),

    /// Load factor outside of `(0, 1]`
    InvalidLoadFactor(f64),

    /// Item count needs more buckets than a filter can address
    ItemCountOverflow(u64),

    /// Eviction kick limit of zero
    InvalidKicksLimit,

    /// Multi-writer discipline with a write attempt limit of zero
    InvalidWriteAttempts,

    /// Quotient/remainder split does not fit the packed representation
    BucketOverflow {
        /// Quotient bits that were requested
        quotient_bits: u32,

        /// Remainder bits that were requested
        remainder_bits: u32,
    },

    /// Key batch was empty (after deduplication)
    EmptyKeyset,

    /// Peeling did not consume every key, even after re-seeding
    Unsatisfiable {
        /// Number of seeds that were tried
        attempts: usize,
    },

    /// Eviction walk exhausted the kick limit (cuckoo)
    FilterFull,

    /// Filter has reached its item limit or ran out of slots (quotient)
    FilterOverflowed,

    /// Compare-and-swap loop exhausted the write attempt limit
    WriteLimitReached,

    /// A concurrent write took a slot back from a failed eviction walk
    /// and the fingerprint it displaced found no free slot (cuckoo)
    EvictionConflict,

    /// The filter is immutable and cannot take new keys
    UnsupportedSet,

    /// The filter is immutable and cannot remove keys
    UnsupportedUnset,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AmqFilterError: {self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        if value.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::Decode(DecodeError::UnexpectedEndOfStream)
        } else {
            Self::Io(value)
        }
    }
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

/// Filter result
pub type Result<T> = std::result::Result<T, Error>;
