// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

const OCCUPIED: u64 = 0b001;
const CONTINUATION: u64 = 0b010;
const SHIFTED: u64 = 0b100;

/// Number of control bits in front of the remainder
pub const CONTROL_BITS: u32 = 3;

/// Quotient filter slot
///
/// Bit 0 is `occupied`, bit 1 `continuation`, bit 2 `shifted`,
/// the remaining bits hold the remainder.
///
/// `occupied` describes the slot *index* (some key has this slot as its
/// home), while the other bits describe the slot *content*.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Slot(u64);

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}:{}",
            if self.is_occupied() { 'o' } else { '-' },
            if self.is_continuation() { 'c' } else { '-' },
            if self.is_shifted() { 's' } else { '-' },
            self.remainder(),
        )
    }
}

impl Slot {
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn into_raw(self) -> u64 {
        self.0
    }

    /// Slot holding `remainder` with all control bits cleared.
    #[must_use]
    pub fn with_remainder(remainder: u64) -> Self {
        Self(remainder << CONTROL_BITS)
    }

    #[must_use]
    pub fn remainder(self) -> u64 {
        self.0 >> CONTROL_BITS
    }

    #[must_use]
    pub fn is_occupied(self) -> bool {
        self.0 & OCCUPIED != 0
    }

    #[must_use]
    pub fn is_continuation(self) -> bool {
        self.0 & CONTINUATION != 0
    }

    #[must_use]
    pub fn is_shifted(self) -> bool {
        self.0 & SHIFTED != 0
    }

    /// No content and not a home slot.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 & (OCCUPIED | CONTINUATION | SHIFTED) == 0
    }

    /// First element of a run.
    #[must_use]
    pub fn is_run_start(self) -> bool {
        !self.is_continuation() && (self.is_occupied() || self.is_shifted())
    }

    /// First element of a cluster (sits in its home slot).
    #[must_use]
    pub fn is_cluster_start(self) -> bool {
        self.is_occupied() && !self.is_continuation() && !self.is_shifted()
    }

    fn with_flag(self, flag: u64, value: bool) -> Self {
        if value {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }

    #[must_use]
    pub fn occupied(self, value: bool) -> Self {
        self.with_flag(OCCUPIED, value)
    }

    #[must_use]
    pub fn continuation(self, value: bool) -> Self {
        self.with_flag(CONTINUATION, value)
    }

    #[must_use]
    pub fn shifted(self, value: bool) -> Self {
        self.with_flag(SHIFTED, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn slot_flags() {
        let slot = Slot::with_remainder(0b1011);
        assert!(slot.is_empty());
        assert_eq!(0b101_1000, slot.into_raw());

        let slot = slot.occupied(true);
        assert!(!slot.is_empty());
        assert!(slot.is_cluster_start());
        assert!(slot.is_run_start());

        let slot = slot.shifted(true).continuation(true);
        assert!(!slot.is_run_start());
        assert!(!slot.is_cluster_start());
        assert_eq!(0b1011, slot.remainder());
        assert_eq!(0b101_1111, slot.into_raw());

        let slot = slot.occupied(false).continuation(false);
        assert!(slot.is_run_start());
        assert_eq!(slot, Slot::from_raw(0b101_1100));
        assert_eq!("--s:11", format!("{slot:?}"));
    }
}
