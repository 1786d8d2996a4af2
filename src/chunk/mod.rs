//! The chunk codec: turns one contiguous input chunk into one framed block's
//! payload, and back. Doesn't know anything about container framing — that
//! is `crate::container`'s job.

pub mod decoder;
pub mod encoder;
pub mod num;
pub mod rle;
pub mod types;

pub use decoder::decode_chunk;
pub use encoder::{encode_chunk, EncodedChunk};

use crate::error::{Result, ZxcError};
use crate::primitives::{read_u32_le, write_u32_le};

/// Shared 16-byte GLO/GHI header. Both encodings use the same layout;
/// GLO uses all four following section descriptors, GHI only the first
/// three (Literals, Sequences, Extras).
#[derive(Debug, Clone, Copy)]
pub struct StreamHeader {
    pub n_sequences: u32,
    pub n_literals: u32,
    pub enc_lit: u8,
    pub enc_litlen: u8,
    pub enc_mlen: u8,
    pub enc_off: u8,
}

pub const STREAM_HEADER_SIZE: usize = 16;
pub const SECTION_DESCRIPTOR_SIZE: usize = 8;

impl StreamHeader {
    pub fn write(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; STREAM_HEADER_SIZE];
        write_u32_le(&mut buf[0..4], self.n_sequences);
        write_u32_le(&mut buf[4..8], self.n_literals);
        buf[8] = self.enc_lit;
        buf[9] = self.enc_litlen;
        buf[10] = self.enc_mlen;
        buf[11] = self.enc_off;
        out.extend_from_slice(&buf);
    }

    pub fn read(src: &[u8]) -> Result<Self> {
        if src.len() < STREAM_HEADER_SIZE {
            return Err(ZxcError::SrcTooSmall);
        }
        Ok(StreamHeader {
            n_sequences: read_u32_le(&src[0..4]),
            n_literals: read_u32_le(&src[4..8]),
            enc_lit: src[8],
            enc_litlen: src[9],
            enc_mlen: src[10],
            enc_off: src[11],
        })
    }
}

/// One `u64` section descriptor: low 32 bits compressed size, high 32 bits
/// raw size.
#[derive(Debug, Clone, Copy)]
pub struct SectionDescriptor {
    pub comp_size: u32,
    pub raw_size: u32,
}

impl SectionDescriptor {
    pub fn equal(size: u32) -> Self {
        SectionDescriptor { comp_size: size, raw_size: size }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let word = (self.comp_size as u64) | ((self.raw_size as u64) << 32);
        out.extend_from_slice(&word.to_le_bytes());
    }

    pub fn read(src: &[u8]) -> Result<Self> {
        if src.len() < SECTION_DESCRIPTOR_SIZE {
            return Err(ZxcError::SrcTooSmall);
        }
        let word = u64::from_le_bytes(src[0..8].try_into().unwrap());
        Ok(SectionDescriptor {
            comp_size: word as u32,
            raw_size: (word >> 32) as u32,
        })
    }
}
