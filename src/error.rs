//! Error taxonomy shared by every public operation (container, chunk codec,
//! and streaming driver).
//!
//! A plain enum with a hand-written `Display` impl rather than a `thiserror`
//! derive, since the set of variants is small, stable, and never carries a
//! payload that needs formatting machinery.

use std::fmt;

/// Stable error identity returned by every fallible public operation.
///
/// No operation in this crate panics on malformed input; corrupt or
/// truncated data always produces one of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZxcError {
    /// Allocation failed while growing a scratch or output buffer.
    Memory,
    /// The caller-supplied output buffer is too small to hold the result.
    DstTooSmall,
    /// The input ended before a required field could be read.
    SrcTooSmall,
    /// The file header's magic word did not match.
    BadMagic,
    /// The file header's format-version byte is not supported.
    BadVersion,
    /// A header's self-check hash (file or block) did not match, or a field
    /// failed a sanity check.
    BadHeader,
    /// A block checksum or the footer's global rolling hash did not match.
    BadChecksum,
    /// Internal stream lengths did not match their section descriptors, or a
    /// cursor did not land exactly on its section end.
    CorruptData,
    /// A sequence's decoded offset exceeded bytes already written, or was
    /// zero after unbiasing.
    BadOffset,
    /// A copy would have exceeded the destination bound.
    Overflow,
    /// Reader/writer failure in streaming mode.
    Io,
    /// A required pointer, reader, or writer was missing where not allowed.
    NullInput,
    /// The block header named an unknown block type.
    BadBlockType,
}

impl ZxcError {
    fn message(self) -> &'static str {
        match self {
            ZxcError::Memory => "allocation failed",
            ZxcError::DstTooSmall => "destination buffer too small",
            ZxcError::SrcTooSmall => "source truncated before a required field",
            ZxcError::BadMagic => "bad magic word",
            ZxcError::BadVersion => "unsupported format version",
            ZxcError::BadHeader => "corrupt header",
            ZxcError::BadChecksum => "checksum mismatch",
            ZxcError::CorruptData => "corrupt stream data",
            ZxcError::BadOffset => "match offset out of range",
            ZxcError::Overflow => "copy would exceed destination bound",
            ZxcError::Io => "I/O error",
            ZxcError::NullInput => "missing required input",
            ZxcError::BadBlockType => "unknown block type",
        }
    }
}

impl fmt::Display for ZxcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ZxcError {}

impl From<std::io::Error> for ZxcError {
    fn from(_: std::io::Error) -> Self {
        ZxcError::Io
    }
}

pub type Result<T> = std::result::Result<T, ZxcError>;
