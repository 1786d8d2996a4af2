//! GLO literal run-length pass.
//!
//! Opcode byte `t`: `t & 0x80 == 0` is a raw run of `(t & 0x7F) + 1` bytes
//! copied verbatim; `t & 0x80 != 0` is a constant run of `(t & 0x7F) + 4`
//! repetitions of one following byte.

use crate::chunk::types::{RLE_MIN_RUN, WILD_COPY_MARGIN};
use crate::error::{Result, ZxcError};
use crate::primitives::{check_dst_capacity, wild_copy32};

const RAW_MAX_LEN: usize = 128;
const CONST_MAX_LEN: usize = 127 + RLE_MIN_RUN;

/// Encode `literals` with the opcode scheme above. Always produces valid
/// output; callers compare `result.len()` against `literals.len()` to
/// decide whether RLE is worth keeping.
pub fn encode(literals: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(literals.len());
    let mut i = 0;
    while i < literals.len() {
        let run_byte = literals[i];
        let mut run_len = 1;
        while i + run_len < literals.len() && literals[i + run_len] == run_byte && run_len < CONST_MAX_LEN {
            run_len += 1;
        }
        if run_len >= RLE_MIN_RUN {
            out.push(0x80 | ((run_len - RLE_MIN_RUN) as u8));
            out.push(run_byte);
            i += run_len;
        } else {
            // Accumulate a raw run up to the next qualifying constant run
            // (or RAW_MAX_LEN, whichever comes first).
            let start = i;
            let mut len = 0usize;
            while i < literals.len() && len < RAW_MAX_LEN {
                let mut j = 1;
                let b = literals[i];
                while i + j < literals.len() && literals[i + j] == b && j < RLE_MIN_RUN {
                    j += 1;
                }
                if j >= RLE_MIN_RUN {
                    break;
                }
                i += 1;
                len += 1;
            }
            out.push(((len - 1) as u8) & 0x7F);
            out.extend_from_slice(&literals[start..start + len]);
        }
    }
    out
}

/// Append `len` bytes from `src[src_pos..]` to the end of `scratch` using a
/// 32-byte wild copy, mirroring `chunk::decoder`'s `copy_literal`. `scratch`
/// is grown to cover the copy's write-side overrun margin before the unsafe
/// write, and `src` must carry at least `WILD_COPY_MARGIN` bytes of padding
/// past `src_pos + len` to cover the read side.
fn push_wild_copy(scratch: &mut Vec<u8>, src: &[u8], src_pos: usize, len: usize) -> Result<()> {
    let start = scratch.len();
    check_dst_capacity(start, len, WILD_COPY_MARGIN, usize::MAX)?;
    check_dst_capacity(src_pos, len, WILD_COPY_MARGIN, src.len())?;
    scratch.reserve(len + WILD_COPY_MARGIN);
    unsafe {
        wild_copy32(scratch.as_mut_ptr().add(start), src.as_ptr().add(src_pos), len);
        scratch.set_len(start + len);
    }
    Ok(())
}

/// Expand an RLE-encoded literal stream into `scratch` (cleared first),
/// returning the number of bytes produced. `scratch` must already carry the
/// crate's wild-copy padding; this reuses it across blocks.
pub fn decode_into(rle: &[u8], scratch: &mut Vec<u8>, expected_raw_len: usize) -> Result<()> {
    scratch.clear();
    scratch.reserve(crate::chunk::types::padded_capacity(expected_raw_len));

    // `rle` itself carries no trailing padding (it's a sub-slice of the
    // block payload), but the raw-run opcode's wild copy reads past its
    // logical length in 32-byte granules. Pad a local copy once so every
    // such read lands in allocated, zeroed memory.
    let rle_len = rle.len();
    let mut padded_rle = Vec::with_capacity(rle_len + WILD_COPY_MARGIN);
    padded_rle.extend_from_slice(rle);
    padded_rle.resize(rle_len + WILD_COPY_MARGIN, 0);

    let mut i = 0;
    while i < rle_len {
        let t = padded_rle[i];
        i += 1;
        if t & 0x80 == 0 {
            let len = (t & 0x7F) as usize + 1;
            if i + len > rle_len {
                return Err(ZxcError::CorruptData);
            }
            push_wild_copy(scratch, &padded_rle, i, len)?;
            i += len;
        } else {
            if i >= rle_len {
                return Err(ZxcError::CorruptData);
            }
            let len = (t & 0x7F) as usize + RLE_MIN_RUN;
            let byte = padded_rle[i];
            i += 1;
            scratch.resize(scratch.len() + len, byte);
        }
    }
    if scratch.len() != expected_raw_len {
        return Err(ZxcError::CorruptData);
    }
    Ok(())
}
