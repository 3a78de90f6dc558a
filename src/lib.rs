// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Approximate membership query (AMQ) filters.
//!
//! ##### About
//!
//! An AMQ filter answers "is this key (probably) a member of the set?" using
//! a small fingerprint per key instead of the key itself. It may report a key
//! that was never inserted (false positive), but never misses a key that is
//! still stored.
//!
//! This crate ships three filters:
//!
//! - [`CuckooFilter`]: mutable, 8-bit fingerprints in 4-slot buckets, two
//!   candidate buckets per key, bounded eviction walk when both are full
//! - [`QuotientFilter`]: mutable, open addressing with run-length encoded
//!   remainders and three control bits per slot
//! - [`XorFilter`]: immutable binary fuse filter, built once from a key
//!   batch, ~9 bits per key
//!
//! All of them implement the [`AmqFilter`] trait, hash keys through an
//! injectable [`KeyHasher`] (xxh3 by default) and can be dumped to and
//! loaded from any `std::io` stream.
//!
//! Mutable filters keep their slots in atomic words. Configured with
//! [`Config::concurrent`], a filter can be shared through `Arc` and written
//! from several threads.
//!
//! # Example usage
//!
//! ```
//! use amq_filters::{AmqFilter, Config, CuckooFilter, XorFilter};
//!
//! let filter = CuckooFilter::new(&Config::new(1_000))?;
//! filter.set("my_key")?;
//! assert!(filter.contains("my_key"));
//!
//! filter.unset("my_key")?;
//! assert!(!filter.contains("my_key"));
//!
//! let filter = XorFilter::build(["a", "b", "c"])?;
//! assert!(filter.contains("b"));
//! #
//! # Ok::<(), amq_filters::Error>(())
//! ```

#![deny(clippy::all, missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[doc(hidden)]
pub mod coding;

mod config;
mod error;
mod filter;
mod format_version;

pub mod hash;

#[cfg(feature = "metrics")]
mod metrics;

pub mod storage;

pub mod cuckoo;
pub mod quotient;
pub mod xor;

pub use {
    config::Config,
    cuckoo::CuckooFilter,
    error::{Error, Result},
    filter::AmqFilter,
    format_version::FormatVersion,
    hash::{Hashable, KeyHasher, Xxh3Hasher},
    quotient::QuotientFilter,
    storage::WriteDiscipline,
    xor::{ScratchPool, XorFilter},
};

#[cfg(feature = "metrics")]
pub use metrics::Metrics;
