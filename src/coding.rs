// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::FormatVersion;
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{Read, Write};

/// Magic signature of a cuckoo filter dump
pub const CUCKOO_MAGIC: [u8; 8] = *b"AMQCUCKO";

/// Magic signature of a packed word vector dump
pub const VECTOR_MAGIC: [u8; 8] = *b"AMQPKVEC";

/// Magic signature of a quotient filter dump
pub const QUOTIENT_MAGIC: [u8; 8] = *b"AMQQUOTF";

/// Magic signature of a xor filter dump
pub const XOR_MAGIC: [u8; 8] = *b"AMQXORFL";

/// Error during deserialization
#[derive(Debug)]
pub enum DecodeError {
    /// I/O error
    Io(std::io::Error),

    /// Magic signature does not belong to the expected structure
    InvalidSignature,

    /// Unknown dump format version
    VersionMismatch,

    /// Stream ended before the dump was complete
    UnexpectedEndOfStream,

    /// Header fields are inconsistent
    InvalidHeader(&'static str),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DecodeError({})",
            match self {
                Self::Io(e) => e.to_string(),
                e => format!("{e:?}"),
            }
        )
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(value: std::io::Error) -> Self {
        if value.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEndOfStream
        } else {
            Self::Io(value)
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Trait to serialize stuff
pub trait Encode {
    /// Serializes into writer.
    fn encode_into<W: Write>(&self, writer: &mut W) -> crate::Result<()>;

    /// Serializes into vector.
    #[allow(unused)]
    #[expect(clippy::expect_used, reason = "writing into a Vec<u8> cannot fail")]
    fn encode_into_vec(&self) -> Vec<u8> {
        let mut v = vec![];
        self.encode_into(&mut v).expect("cannot fail");
        v
    }
}

/// Trait to deserialize stuff
pub trait Decode {
    /// Deserializes from reader.
    fn decode_from<R: Read>(reader: &mut R) -> crate::Result<Self>
    where
        Self: Sized;
}

/// Fixed 24-byte dump header
///
/// 8 bytes magic, 8 bytes format version (`f64`), 8 bytes item count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 8],
    pub version: FormatVersion,
    pub item_count: u64,
}

impl Header {
    pub const SERIALIZED_LEN: u64 = 24;

    #[must_use]
    pub fn new(magic: [u8; 8], item_count: u64) -> Self {
        Self {
            magic,
            version: FormatVersion::V1,
            item_count,
        }
    }

    /// Reads a header and checks it carries the `expected` signature.
    ///
    /// The signature is checked before the version, and both before the
    /// caller gets to look at the payload.
    pub fn decode_expecting<R: Read>(reader: &mut R, expected: [u8; 8]) -> crate::Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;

        if magic != expected {
            return Err(DecodeError::InvalidSignature.into());
        }

        Self::decode_body(magic, reader)
    }

    fn decode_body<R: Read>(magic: [u8; 8], reader: &mut R) -> crate::Result<Self> {
        let version = f64::from_bits(reader.read_u64::<LE>()?);
        let version =
            FormatVersion::try_from(version).map_err(|()| DecodeError::VersionMismatch)?;

        let item_count = reader.read_u64::<LE>()?;

        Ok(Self {
            magic,
            version,
            item_count,
        })
    }
}

impl Encode for Header {
    fn encode_into<W: Write>(&self, writer: &mut W) -> crate::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u64::<LE>(f64::from(self.version).to_bits())?;
        writer.write_u64::<LE>(self.item_count)?;
        Ok(())
    }
}

impl Decode for Header {
    fn decode_from<R: Read>(reader: &mut R) -> crate::Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        Self::decode_body(magic, reader)
    }
}
