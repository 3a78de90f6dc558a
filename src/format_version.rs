// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Dump format version
///
/// Stored as an IEEE-754 `f64` in the dump header.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FormatVersion {
    /// Version `1.0`
    V1,
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", f64::from(*self))
    }
}

impl From<FormatVersion> for f64 {
    fn from(value: FormatVersion) -> Self {
        match value {
            FormatVersion::V1 => 1.0,
        }
    }
}

impl TryFrom<f64> for FormatVersion {
    type Error = ();

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        #[expect(clippy::float_cmp, reason = "versions are exact small integers")]
        let is_v1 = value == 1.0;

        if is_v1 {
            Ok(Self::V1)
        } else {
            Err(())
        }
    }
}
