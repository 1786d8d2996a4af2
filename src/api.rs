//! The crate's six public operations: two single-shot buffer operations, a
//! footer peek, and the two streaming entry points.

use crate::chunk::{self, types::CHUNK_BYTES};
use crate::container::{self, BlockType, FileHeader, RollingHash};
use crate::driver::{self, StreamOptions};
use crate::error::{Result, ZxcError};

/// Upper bound on the compressed size of `n` input bytes: file header, one
/// framed worst-case (RAW) block per `CHUNK_BYTES`-sized chunk plus its
/// checksum, the EOF block, and the footer.
pub fn compress_bound(n: u64) -> u64 {
    let chunk_bytes = CHUNK_BYTES as u64;
    let chunks = n.div_ceil(chunk_bytes.max(1));
    let per_chunk = chunk_bytes + container::BLOCK_HEADER_SIZE as u64 + container::BLOCK_CHECKSUM_SIZE as u64;
    container::FILE_HEADER_SIZE as u64
        + chunks * per_chunk
        + container::BLOCK_HEADER_SIZE as u64
        + container::FOOTER_SIZE as u64
}

/// Single-shot buffer compress: `level` in `1..=5`.
pub fn compress(src: &[u8], dst: &mut [u8], level: u8, checksum: bool) -> Result<u64> {
    if !(1..=5).contains(&level) {
        return Err(ZxcError::BadHeader);
    }

    let mut out = Vec::with_capacity(compress_bound(src.len() as u64) as usize);
    let header = FileHeader { version: container::FORMAT_VERSION, chunk_size_code: 0, checksum };
    header.write(&mut out);

    let mut hash = RollingHash::new();
    let mut total_raw: u64 = 0;
    for piece in src.chunks(CHUNK_BYTES) {
        let encoded = chunk::encode_chunk(piece, level)?;
        container::write_block(&mut out, encoded.block_type, encoded.raw_size, &encoded.payload, checksum);
        if checksum {
            hash.fold(container::block_checksum_of(&encoded.payload));
        }
        total_raw += encoded.raw_size as u64;
    }
    container::write_eof(&mut out);
    container::write_footer(&mut out, total_raw, hash.value());

    if out.len() > dst.len() {
        return Err(ZxcError::DstTooSmall);
    }
    dst[..out.len()].copy_from_slice(&out);
    Ok(out.len() as u64)
}

/// Single-shot buffer decompress.
pub fn decompress(src: &[u8], dst: &mut [u8], checksum: bool) -> Result<u64> {
    let (file_header, mut pos) = FileHeader::read(src)?;
    // The archive's own flag decides whether a checksum is present; the
    // caller's `checksum` only asks us to also verify it when it is.
    let checksum = checksum && file_header.checksum;

    let mut hash = RollingHash::new();
    let mut total_raw: u64 = 0;
    let mut out = Vec::new();

    loop {
        let parsed = container::read_block(&src[pos..], checksum)?;
        pos += parsed.consumed;
        if parsed.header.block_type == BlockType::Eof {
            break;
        }
        let decoded = chunk::decode_chunk(parsed.header.block_type, parsed.payload, parsed.header.raw_size as usize)?;
        if checksum {
            hash.fold(container::block_checksum_of(parsed.payload));
        }
        total_raw += decoded.len() as u64;
        out.extend_from_slice(&decoded);
    }

    let footer = container::Footer::read(&src[pos..])?;
    if footer.original_size != total_raw {
        return Err(ZxcError::BadChecksum);
    }
    if checksum && footer.rolling_hash != hash.value() {
        return Err(ZxcError::BadChecksum);
    }

    if out.len() > dst.len() {
        return Err(ZxcError::DstTooSmall);
    }
    dst[..out.len()].copy_from_slice(&out);
    Ok(out.len() as u64)
}

/// Read the footer's original-size field without decoding any block.
pub fn decompressed_size(src: &[u8]) -> Option<u64> {
    if src.len() < container::FILE_HEADER_SIZE + container::FOOTER_SIZE {
        return None;
    }
    FileHeader::read(src).ok()?;
    let footer = container::Footer::read(&src[src.len() - container::FOOTER_SIZE..]).ok()?;
    Some(footer.original_size)
}

/// Streaming compress: parallel producer/worker/writer pipeline preserving
/// source order. See [`driver::StreamOptions`].
pub fn stream_compress<R: std::io::Read, W: std::io::Write>(reader: R, writer: W, opts: StreamOptions) -> Result<u64> {
    driver::stream_compress(reader, writer, opts)
}

/// Streaming decompress, symmetric with [`stream_compress`].
pub fn stream_decompress<R: std::io::Read, W: std::io::Write>(reader: R, writer: W, opts: StreamOptions) -> Result<u64> {
    driver::stream_decompress(reader, writer, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &[u8], level: u8, checksum: bool) {
        let bound = compress_bound(input.len() as u64) as usize;
        let mut compressed = vec![0u8; bound];
        let clen = compress(input, &mut compressed, level, checksum).unwrap() as usize;
        compressed.truncate(clen);

        assert_eq!(decompressed_size(&compressed), Some(input.len() as u64));

        let mut decompressed = vec![0u8; input.len()];
        let dlen = decompress(&compressed, &mut decompressed, checksum).unwrap() as usize;
        assert_eq!(&decompressed[..dlen], input);
    }

    #[test]
    fn empty_input_scenario() {
        round_trip(b"", 3, true);
    }

    #[test]
    fn ten_byte_literal_scenario() {
        round_trip(b"Hello ZXC\n", 1, true);
    }

    #[test]
    fn bound_soundness_and_monotonicity() {
        assert!(compress_bound(100) <= compress_bound(200));
        let input = b"ABCDE".repeat(1000);
        let bound = compress_bound(input.len() as u64) as usize;
        let mut dst = vec![0u8; bound];
        let n = compress(&input, &mut dst, 3, true).unwrap();
        assert!(n as usize <= bound);
    }

    #[test]
    fn checksum_tamper_detected() {
        let input = b"ABCDE".repeat(1000);
        let bound = compress_bound(input.len() as u64) as usize;
        let mut dst = vec![0u8; bound];
        let n = compress(&input, &mut dst, 3, true).unwrap() as usize;
        dst[n - 1] ^= 0xFF;
        let mut out = vec![0u8; input.len()];
        assert!(decompress(&dst[..n], &mut out, true).is_err());
    }

    #[test]
    fn truncation_rejected() {
        let input = b"ABCDE".repeat(1000);
        let bound = compress_bound(input.len() as u64) as usize;
        let mut dst = vec![0u8; bound];
        let n = compress(&input, &mut dst, 3, true).unwrap() as usize;
        for k in 1..=(container::FOOTER_SIZE + 1).min(n - 1) {
            let mut out = vec![0u8; input.len()];
            assert!(decompress(&dst[..n - k], &mut out, true).is_err());
        }
    }

    #[test]
    fn levels_all_round_trip() {
        let input = b"the quick brown fox jumps over the lazy dog ".repeat(500);
        for level in 1..=5u8 {
            round_trip(&input, level, true);
            round_trip(&input, level, false);
        }
    }
}
