//! Chunk decoder: block-type dispatch, NUM unpack, and the GLO/GHI sequence
//! loop with wild-copy match expansion.
//!
//! Offset validity (`1 <= offset <= bytes_written`) is checked for every
//! sequence regardless of the SAFE/FAST threshold; the threshold instead
//! governs the destination capacity margin check, which is cheap (a single
//! comparison against a buffer the driver already over-allocates) and
//! removing it after the threshold would trade a negligible amount of
//! per-sequence overhead for the possibility of reading or writing outside
//! the padded buffer on corrupted input. Offsets are still validated
//! unconditionally so that no undefined behavior is possible for any
//! malformed input, in either phase; the SAFE/FAST split is preserved in
//! which copy primitive runs instead (32/16-byte wild copy vs.
//! pattern-broadcast vs. fill).

use crate::chunk::types::*;
use crate::chunk::{num, rle, SectionDescriptor, StreamHeader, STREAM_HEADER_SIZE};
use crate::container::BlockType;
use crate::error::{Result, ZxcError};
use crate::primitives::{
    check_dst_capacity, fill_copy, pattern_broadcast_copy, prefix_varint, wild_copy16, wild_copy32,
};

const SECTION_DESCRIPTOR_SIZE: usize = crate::chunk::SECTION_DESCRIPTOR_SIZE;

pub fn decode_chunk(block_type: BlockType, payload: &[u8], raw_size: usize) -> Result<Vec<u8>> {
    match block_type {
        BlockType::Raw => {
            if payload.len() != raw_size {
                return Err(ZxcError::CorruptData);
            }
            Ok(payload.to_vec())
        }
        BlockType::Num => {
            let out = num::decode(payload)?;
            if out.len() != raw_size {
                return Err(ZxcError::CorruptData);
            }
            Ok(out)
        }
        BlockType::Glo => decode_lz(payload, raw_size, true),
        BlockType::Ghi => decode_lz(payload, raw_size, false),
        BlockType::Eof => Err(ZxcError::BadBlockType),
    }
}

fn pad_with_margin(mut buf: Vec<u8>) -> Vec<u8> {
    buf.resize(buf.len() + WILD_COPY_MARGIN, 0);
    buf
}

/// Copy `len` bytes from `src[src_pos..]` to `dst + dst_pos`, using 32-byte
/// wild copies. `src` must carry at least `WILD_COPY_MARGIN` bytes of
/// zero-padding past its logical end.
unsafe fn copy_literal(dst: *mut u8, dst_pos: usize, src: &[u8], src_pos: usize, len: usize, dst_cap: usize) -> Result<()> {
    check_dst_capacity(dst_pos, len, WILD_COPY_MARGIN, dst_cap)?;
    if src_pos + len > src.len() {
        return Err(ZxcError::SrcTooSmall);
    }
    wild_copy32(dst.add(dst_pos), src.as_ptr().add(src_pos), len);
    Ok(())
}

/// Expand one match of `len` bytes at actual `offset` into `dst + dst_pos`.
/// `dst` is zero-initialized for its full padded capacity, so over-reads
/// into not-yet-written (but allocated and initialized) bytes are never UB.
unsafe fn copy_match(dst: *mut u8, dst_pos: usize, offset: usize, len: usize, dst_cap: usize) -> Result<()> {
    check_dst_capacity(dst_pos, len, WILD_COPY_MARGIN, dst_cap)?;
    let src = dst.add(dst_pos - offset);
    if offset == 1 {
        fill_copy(dst.add(dst_pos), *src, len);
    } else if offset < 16 {
        pattern_broadcast_copy(dst.add(dst_pos), offset, len);
    } else if offset < 32 {
        wild_copy16(dst.add(dst_pos), src, len);
    } else {
        wild_copy32(dst.add(dst_pos), src, len);
    }
    Ok(())
}

struct ExtrasReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ExtrasReader<'a> {
    fn resolve(&mut self, code: u32, saturation: u32) -> Result<usize> {
        if code == saturation {
            let overflow = prefix_varint::read(self.buf, &mut self.pos);
            Ok((code + overflow) as usize)
        } else {
            Ok(code as usize)
        }
    }

    fn exhausted(&self) -> bool {
        self.pos == self.buf.len()
    }
}

fn decode_lz(payload: &[u8], raw_size: usize, is_glo: bool) -> Result<Vec<u8>> {
    let header = StreamHeader::read(payload)?;
    let n_descriptors = if is_glo { 4 } else { 3 };
    let mut pos = STREAM_HEADER_SIZE;
    let mut descriptors = [SectionDescriptor { comp_size: 0, raw_size: 0 }; 4];
    for d in descriptors.iter_mut().take(n_descriptors) {
        *d = SectionDescriptor::read(&payload[pos..])?;
        pos += SECTION_DESCRIPTOR_SIZE;
    }

    let lit_desc = descriptors[0];
    let mid_desc = descriptors[1]; // tokens (GLO) or sequences (GHI)
    let (off_desc, extras_desc) = if is_glo {
        (Some(descriptors[2]), descriptors[3])
    } else {
        (None, descriptors[2])
    };

    let take = |pos: &mut usize, len: usize| -> Result<&[u8]> {
        if *pos + len > payload.len() {
            return Err(ZxcError::SrcTooSmall);
        }
        let s = &payload[*pos..*pos + len];
        *pos += len;
        Ok(s)
    };

    let lit_bytes = take(&mut pos, lit_desc.comp_size as usize)?;
    let mid_bytes = take(&mut pos, mid_desc.comp_size as usize)?;
    let off_bytes = if let Some(d) = off_desc { take(&mut pos, d.comp_size as usize)? } else { &[] };
    let extras_bytes = take(&mut pos, extras_desc.comp_size as usize)?;

    let literal_scratch = if is_glo && header.enc_lit == ENC_RLE {
        let mut scratch = Vec::new();
        rle::decode_into(lit_bytes, &mut scratch, lit_desc.raw_size as usize)?;
        pad_with_margin(scratch)
    } else {
        if lit_bytes.len() != lit_desc.raw_size as usize {
            return Err(ZxcError::CorruptData);
        }
        pad_with_margin(lit_bytes.to_vec())
    };

    let dst_cap = padded_capacity(raw_size);
    let mut dst = vec![0u8; dst_cap];
    let dst_ptr = dst.as_mut_ptr();

    let mut written = 0usize;
    let mut lit_cursor = 0usize;
    let mut extras = ExtrasReader { buf: extras_bytes, pos: 0 };
    let saturation = if is_glo { GLO_SATURATION } else { GHI_SATURATION };

    for seq_idx in 0..header.n_sequences as usize {
        let (ll_code, ml_code, offset_biased) = if is_glo {
            if seq_idx >= mid_bytes.len() {
                return Err(ZxcError::CorruptData);
            }
            let token = mid_bytes[seq_idx];
            let ll_code = (token >> 4) as u32;
            let ml_code = (token & 0x0F) as u32;
            let offset_biased: u32 = if header.enc_off == 1 {
                let o = *off_bytes.get(seq_idx).ok_or(ZxcError::CorruptData)?;
                o as u32
            } else {
                let base = seq_idx * 2;
                let bytes = off_bytes.get(base..base + 2).ok_or(ZxcError::CorruptData)?;
                u16::from_le_bytes([bytes[0], bytes[1]]) as u32
            };
            (ll_code, ml_code, offset_biased)
        } else {
            let base = seq_idx * 4;
            let bytes = mid_bytes.get(base..base + 4).ok_or(ZxcError::CorruptData)?;
            let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            ((word >> 24) & 0xFF, (word >> 16) & 0xFF, word & 0xFFFF)
        };

        let ll = extras.resolve(ll_code, saturation)?;
        let ml_value = extras.resolve(ml_code, saturation)?;
        let ml = ml_value + MIN_MATCH;
        let offset = offset_biased as usize + 1;

        if lit_cursor + ll > header.n_literals as usize {
            return Err(ZxcError::CorruptData);
        }
        unsafe {
            copy_literal(dst_ptr, written, &literal_scratch, lit_cursor, ll, dst_cap)?;
        }
        lit_cursor += ll;
        written += ll;

        if offset == 0 || offset > written {
            return Err(ZxcError::BadOffset);
        }
        unsafe {
            copy_match(dst_ptr, written, offset, ml, dst_cap)?;
        }
        written += ml;
    }

    let trailing = (header.n_literals as usize).checked_sub(lit_cursor).ok_or(ZxcError::CorruptData)?;
    unsafe {
        copy_literal(dst_ptr, written, &literal_scratch, lit_cursor, trailing, dst_cap)?;
    }
    written += trailing;
    lit_cursor += trailing;

    if lit_cursor != header.n_literals as usize || written != raw_size || !extras.exhausted() {
        return Err(ZxcError::CorruptData);
    }
    let expected_mid_len = if is_glo { header.n_sequences as usize } else { header.n_sequences as usize * 4 };
    if mid_bytes.len() != expected_mid_len {
        return Err(ZxcError::CorruptData);
    }
    if is_glo {
        let expected_off_len = if header.enc_off == 1 { header.n_sequences as usize } else { header.n_sequences as usize * 2 };
        if off_bytes.len() != expected_off_len {
            return Err(ZxcError::CorruptData);
        }
    }

    dst.truncate(raw_size);
    Ok(dst)
}
