//! On-disk container: file header, per-block framing, EOF block, footer,
//! and the global rolling hash.
//!
//! This is the only layer allowed to advance the rolling hash; the chunk
//! codecs below it know nothing about framing.

pub mod header;

pub use header::{
    BlockHeader, BlockType, FileHeader, Footer, RollingHash, BLOCK_CHECKSUM_SIZE,
    BLOCK_HEADER_SIZE, FILE_HEADER_SIZE, FOOTER_SIZE, FORMAT_VERSION,
};

use crate::error::{Result, ZxcError};
use crate::primitives::block_hash32;

/// Append one framed, non-EOF block to `out`: header, payload, and (when
/// `checksum` is set) the trailing 4-byte `block_hash32` of the payload.
pub fn write_block(out: &mut Vec<u8>, block_type: BlockType, raw_size: u32, payload: &[u8], checksum: bool) {
    let header = BlockHeader {
        block_type,
        comp_size: payload.len() as u32,
        raw_size,
    };
    header.write(out);
    out.extend_from_slice(payload);
    if checksum {
        let cksum = block_hash32(payload);
        out.extend_from_slice(&cksum.to_le_bytes());
    }
}

pub fn write_eof(out: &mut Vec<u8>) {
    BlockHeader::eof().write(out);
}

pub fn write_footer(out: &mut Vec<u8>, original_size: u64, rolling_hash: u32) {
    Footer { original_size, rolling_hash }.write(out);
}

/// Parsed framing for one block read from a byte stream: its header, the
/// payload slice, and (if present) the verified checksum.
pub struct ParsedBlock<'a> {
    pub header: BlockHeader,
    pub payload: &'a [u8],
    pub consumed: usize,
}

/// Parse one framed block starting at `src[0]`. `checksum` must match the
/// file header's mode. Verifies the block header's self-check byte and,
/// for non-EOF blocks in checksum mode, the trailing block checksum.
pub fn read_block(src: &[u8], checksum: bool) -> Result<ParsedBlock<'_>> {
    let header = BlockHeader::read(src)?;
    if header.block_type == BlockType::Eof {
        return Ok(ParsedBlock { header, payload: &src[0..0], consumed: BLOCK_HEADER_SIZE });
    }
    let comp_size = header.comp_size as usize;
    let mut consumed = BLOCK_HEADER_SIZE
        .checked_add(comp_size)
        .ok_or(ZxcError::Overflow)?;
    if checksum {
        consumed = consumed.checked_add(BLOCK_CHECKSUM_SIZE).ok_or(ZxcError::Overflow)?;
    }
    if src.len() < consumed {
        return Err(ZxcError::SrcTooSmall);
    }
    let payload = &src[BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + comp_size];
    if checksum {
        let stored = crate::primitives::read_u32_le(
            &src[BLOCK_HEADER_SIZE + comp_size..BLOCK_HEADER_SIZE + comp_size + BLOCK_CHECKSUM_SIZE],
        );
        let expect = block_hash32(payload);
        if stored != expect {
            return Err(ZxcError::BadChecksum);
        }
    }
    Ok(ParsedBlock { header, payload, consumed })
}

/// Returns the block's checksum, recomputed for folding into the rolling
/// hash (used whether or not it was already verified by `read_block`).
pub fn block_checksum_of(payload: &[u8]) -> u32 {
    block_hash32(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_header_round_trip() {
        let h = FileHeader { version: FORMAT_VERSION, chunk_size_code: 0, checksum: true };
        let mut buf = Vec::new();
        h.write(&mut buf);
        let (parsed, consumed) = FileHeader::read(&buf).unwrap();
        assert_eq!(consumed, FILE_HEADER_SIZE);
        assert_eq!(parsed, h);
    }

    #[test]
    fn bad_magic_detected() {
        let mut buf = vec![0u8; FILE_HEADER_SIZE];
        assert_eq!(FileHeader::read(&buf).unwrap_err(), ZxcError::BadMagic);
        buf[7] = 0xFF;
        assert_eq!(FileHeader::read(&buf).unwrap_err(), ZxcError::BadMagic);
    }

    #[test]
    fn block_round_trip_with_checksum() {
        let mut buf = Vec::new();
        write_block(&mut buf, BlockType::Raw, 5, b"hello", true);
        let parsed = read_block(&buf, true).unwrap();
        assert_eq!(parsed.payload, b"hello");
        assert_eq!(parsed.header.raw_size, 5);
        assert_eq!(parsed.consumed, buf.len());
    }

    #[test]
    fn tampered_checksum_detected() {
        let mut buf = Vec::new();
        write_block(&mut buf, BlockType::Raw, 5, b"hello", true);
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        assert_eq!(read_block(&buf, true).unwrap_err(), ZxcError::BadChecksum);
    }

    #[test]
    fn rolling_hash_is_order_sensitive() {
        let mut a = RollingHash::new();
        a.fold(1);
        a.fold(2);
        let mut b = RollingHash::new();
        b.fold(2);
        b.fold(1);
        assert_ne!(a.value(), b.value());
    }
}
