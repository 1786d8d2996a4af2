//! Shared constants for the chunk encoder/decoder pair.

/// Default chunk size: the unit of parallel encode/decode.
pub const CHUNK_BYTES: usize = 256 * 1024;

/// Minimum match length emitted by the LZ encoders.
pub const MIN_MATCH: usize = 5;

/// Match offsets are capped to this 16-bit window.
pub const MAX_OFFSET: usize = 65_535;

/// GLO's 4-bit LL/ML token fields saturate at this value.
pub const GLO_SATURATION: u32 = 15;

/// GHI's 8-bit LL/ML fields saturate at this value.
pub const GHI_SATURATION: u32 = 255;

/// Minimum run length eligible for GLO's literal RLE pass.
pub const RLE_MIN_RUN: usize = 4;

/// Values per NUM frame.
pub const NUM_FRAME_SIZE: usize = 128;

/// Trailing zero-fill headroom every decode destination buffer must carry,
/// so wild copies never write past allocated storage.
pub const WILD_COPY_MARGIN: usize = 32;

/// Encoding selector bytes stored in the GLO/GHI header.
pub const ENC_RAW: u8 = 0;
pub const ENC_RLE: u8 = 1;

/// Bytes-written count at which the decoder's FAST phase begins (the SAFE/
/// FAST threshold governing which wild-copy primitive dispatches).
#[inline(always)]
pub fn bounds_threshold(enc_off_one_byte: bool) -> usize {
    if enc_off_one_byte {
        256
    } else {
        65_536
    }
}

/// Round `n` up to the next multiple of `WILD_COPY_MARGIN`, used when
/// sizing scratch/output buffers that wild copies will overrun.
#[inline(always)]
pub fn padded_capacity(n: usize) -> usize {
    n.checked_add(WILD_COPY_MARGIN)
        .map(|v| v.div_ceil(WILD_COPY_MARGIN) * WILD_COPY_MARGIN)
        .unwrap_or(usize::MAX)
}
