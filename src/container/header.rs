//! Fixed-size framing structures: file header, block header, footer, and the
//! global rolling hash accumulator.
//!
//! Small plain structs with explicit little-endian field readers rather than
//! a derive-based wire format, since every field here is fixed-width and the
//! self-check hash byte needs to see the *unparsed* bytes.

use crate::error::{Result, ZxcError};
use crate::primitives::{hash8, read_u32_le, rotl32, write_u32_le};

pub const MAGIC: u32 = 0x30435A5A;
pub const FORMAT_VERSION: u8 = 1;

pub const FILE_HEADER_SIZE: usize = 8;
pub const BLOCK_HEADER_SIZE: usize = 12;
pub const BLOCK_CHECKSUM_SIZE: usize = 4;
pub const FOOTER_SIZE: usize = 12;

/// Flag bit: checksums present after every non-EOF block.
pub const FLAG_CHECKSUM: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u8,
    /// 0 = default `CHUNK_BYTES`; otherwise `code as usize * 4096`.
    pub chunk_size_code: u8,
    pub checksum: bool,
}

impl FileHeader {
    pub fn chunk_bytes(&self) -> usize {
        if self.chunk_size_code == 0 {
            crate::chunk::types::CHUNK_BYTES
        } else {
            self.chunk_size_code as usize * 4096
        }
    }

    /// Encode `chunk_bytes` as the header's size code, or `None` if it is
    /// not an exact multiple of 4096 (callers fall back to code 0 /
    /// `CHUNK_BYTES` in that case).
    pub fn size_code_for(chunk_bytes: usize) -> u8 {
        if chunk_bytes == crate::chunk::types::CHUNK_BYTES {
            0
        } else {
            (chunk_bytes / 4096).min(255) as u8
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        write_u32_le(&mut buf[0..4], MAGIC);
        buf[4] = self.version;
        buf[5] = self.chunk_size_code;
        let mut flags = 0u8;
        if self.checksum {
            flags |= FLAG_CHECKSUM;
        }
        buf[6] = flags;
        buf[7] = hash8(&buf[0..7]);
        out.extend_from_slice(&buf);
    }

    pub fn read(src: &[u8]) -> Result<(Self, usize)> {
        if src.len() < FILE_HEADER_SIZE {
            return Err(ZxcError::SrcTooSmall);
        }
        let magic = read_u32_le(&src[0..4]);
        if magic != MAGIC {
            return Err(ZxcError::BadMagic);
        }
        let version = src[4];
        if version != FORMAT_VERSION {
            return Err(ZxcError::BadVersion);
        }
        let chunk_size_code = src[5];
        let flags = src[6];
        let expect = hash8(&src[0..7]);
        if src[7] != expect {
            return Err(ZxcError::BadHeader);
        }
        Ok((
            FileHeader {
                version,
                chunk_size_code,
                checksum: flags & FLAG_CHECKSUM != 0,
            },
            FILE_HEADER_SIZE,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Raw,
    Glo,
    Num,
    Ghi,
    Eof,
}

impl BlockType {
    fn to_byte(self) -> u8 {
        match self {
            BlockType::Raw => 0,
            BlockType::Glo => 1,
            BlockType::Num => 2,
            BlockType::Ghi => 3,
            BlockType::Eof => 255,
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(BlockType::Raw),
            1 => Ok(BlockType::Glo),
            2 => Ok(BlockType::Num),
            3 => Ok(BlockType::Ghi),
            255 => Ok(BlockType::Eof),
            _ => Err(ZxcError::BadBlockType),
        }
    }
}

/// Self-check hash over a 12-byte block header with its hash slot (byte 3)
/// zeroed.
fn header_hash_byte(header: &[u8; BLOCK_HEADER_SIZE]) -> u8 {
    hash8(header)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub block_type: BlockType,
    pub comp_size: u32,
    pub raw_size: u32,
}

impl BlockHeader {
    pub fn eof() -> Self {
        BlockHeader { block_type: BlockType::Eof, comp_size: 0, raw_size: 0 }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        buf[0] = self.block_type.to_byte();
        buf[1] = 0; // flags, reserved
        buf[2] = 0;
        buf[3] = 0;
        write_u32_le(&mut buf[4..8], self.comp_size);
        write_u32_le(&mut buf[8..12], self.raw_size);
        // The self-check byte is stored in the reserved slot at offset 3;
        // computed over every other header byte.
        buf[3] = header_hash_byte(&buf);
        out.extend_from_slice(&buf);
    }

    pub fn read(src: &[u8]) -> Result<Self> {
        if src.len() < BLOCK_HEADER_SIZE {
            return Err(ZxcError::SrcTooSmall);
        }
        let block_type = BlockType::from_byte(src[0])?;
        let stored_hash = src[3];
        let mut header: [u8; BLOCK_HEADER_SIZE] = src[..BLOCK_HEADER_SIZE].try_into().unwrap();
        header[3] = 0;
        let expect = header_hash_byte(&header);
        if stored_hash != expect {
            return Err(ZxcError::BadHeader);
        }
        let comp_size = read_u32_le(&src[4..8]);
        let raw_size = read_u32_le(&src[8..12]);
        if block_type == BlockType::Eof && comp_size != 0 {
            return Err(ZxcError::BadHeader);
        }
        Ok(BlockHeader { block_type, comp_size, raw_size })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Footer {
    pub original_size: u64,
    pub rolling_hash: u32,
}

impl Footer {
    pub fn write(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; FOOTER_SIZE];
        buf[0..8].copy_from_slice(&self.original_size.to_le_bytes());
        write_u32_le(&mut buf[8..12], self.rolling_hash);
        out.extend_from_slice(&buf);
    }

    pub fn read(src: &[u8]) -> Result<Self> {
        if src.len() < FOOTER_SIZE {
            return Err(ZxcError::SrcTooSmall);
        }
        let original_size = u64::from_le_bytes(src[0..8].try_into().unwrap());
        let rolling_hash = read_u32_le(&src[8..12]);
        Ok(Footer { original_size, rolling_hash })
    }
}

/// Global rolling hash: `h := rotl(h, 1) XOR block_checksum`, folded in
/// emission order. Owned exclusively by the container's writer side.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHash(u32);

impl RollingHash {
    pub fn new() -> Self {
        RollingHash(0)
    }

    pub fn fold(&mut self, block_checksum: u32) {
        self.0 = rotl32(self.0, 1) ^ block_checksum;
    }

    pub fn value(self) -> u32 {
        self.0
    }
}
