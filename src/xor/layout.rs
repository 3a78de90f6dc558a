// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Binary fuse segment layout

/// Number of candidate slots per key
pub const ARITY: u32 = 3;

/// Upper bound of the segment length
pub const MAX_SEGMENT_LENGTH: u32 = 1 << 18;

/// Segment geometry of a binary fuse filter
///
/// The slot array consists of `segment_count + 2` segments; a key picks a
/// start segment and gets one candidate slot in each of the three
/// consecutive segments starting there.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// Slots per segment (power of two)
    pub segment_length: u32,

    /// `segment_length - 1`
    pub segment_length_mask: u32,

    /// Number of possible start segments
    pub segment_count: u32,

    /// `segment_count * segment_length`
    pub segment_count_length: u32,

    /// Total number of slots
    pub array_length: u32,
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn segment_length(size: u32) -> u32 {
    if size == 0 {
        return 4;
    }

    let ln_size = f64::from(size).ln();
    let exponent = (ln_size / 3.33_f64.ln() + 2.25).floor() as u32;

    (1u32 << exponent.min(18)).min(MAX_SEGMENT_LENGTH)
}

fn size_factor(size: u32) -> f64 {
    let ln_size = f64::from(size).ln();
    1.125_f64.max(0.875 + 0.25 * 1_000_000_f64.ln() / ln_size)
}

impl Layout {
    /// Layout of an empty (reset) filter
    pub const EMPTY: Self = Self {
        segment_length: 0,
        segment_length_mask: 0,
        segment_count: 0,
        segment_count_length: 0,
        array_length: 0,
    };

    /// Computes the layout for `size` distinct keys.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "slot counts are bounded by u32"
    )]
    pub fn for_size(size: u32) -> Self {
        let segment_length = segment_length(size);

        let capacity = if size <= 1 {
            0
        } else {
            (f64::from(size) * size_factor(size)).round() as i64
        };

        let arity = i64::from(ARITY);
        let seg = i64::from(segment_length);

        let n = (capacity + seg - 1) / seg - (arity - 1);
        let array_length = (n + arity - 1) * seg;

        let mut segment_count = (array_length + seg - 1) / seg;
        if segment_count <= arity - 1 {
            segment_count = 1;
        } else {
            segment_count -= arity - 1;
        }

        let array_length = (segment_count + arity - 1) * seg;

        Self {
            segment_length,
            segment_length_mask: segment_length - 1,
            segment_count: segment_count as u32,
            segment_count_length: (segment_count * seg) as u32,
            array_length: array_length as u32,
        }
    }

    /// Rebuilds a layout from its stored parts, checking they fit together.
    #[must_use]
    pub fn from_parts(segment_length: u32, segment_count: u32, array_length: u32) -> Option<Self> {
        if array_length == 0 {
            return (segment_length == 0 && segment_count == 0).then_some(Self::EMPTY);
        }

        if !segment_length.is_power_of_two()
            || segment_length > MAX_SEGMENT_LENGTH
            || segment_count == 0
        {
            return None;
        }

        let expected = (u64::from(segment_count) + u64::from(ARITY) - 1) * u64::from(segment_length);
        if expected != u64::from(array_length) {
            return None;
        }

        Some(Self {
            segment_length,
            segment_length_mask: segment_length - 1,
            segment_count,
            segment_count_length: segment_count * segment_length,
            array_length,
        })
    }

    /// Maps a (seeded) key hash to its three candidate slots.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "slot indexes are below array_length"
    )]
    pub fn hash3(&self, hash: u64) -> [usize; 3] {
        let segment_length = u64::from(self.segment_length);
        let mask = u64::from(self.segment_length_mask);

        let h0 = mulhi(hash, u64::from(self.segment_count_length));
        let h1 = (h0 + segment_length) ^ ((hash >> 18) & mask);
        let h2 = (h0 + 2 * segment_length) ^ (hash & mask);

        [h0 as usize, h1 as usize, h2 as usize]
    }
}

/// Upper 64 bits of the 128-bit product.
#[must_use]
#[expect(clippy::cast_possible_truncation)]
pub fn mulhi(a: u64, b: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) >> 64) as u64
}

/// Fingerprint tag of a seeded key hash.
#[must_use]
#[expect(clippy::cast_possible_truncation, reason = "we want the low byte")]
pub fn tag(hash: u64) -> u8 {
    (hash ^ (hash >> 32)) as u8
}
