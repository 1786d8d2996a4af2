//! Chunk encoder: NUM probe, LZ77 match finder with lazy matching, GLO/GHI
//! tokenization and stream separation, RLE literal pass, RAW fallback.
//!
//! The match finder's hash+chain table: a hash table indexed by a 4-byte key
//! pointing at the most recent position with that key, and a parallel chain
//! table threading every earlier position with the same key.

use crate::chunk::types::*;
use crate::chunk::{num, rle, SectionDescriptor, StreamHeader, STREAM_HEADER_SIZE};
use crate::container::BlockType;
use crate::error::Result;
use crate::primitives::{count_matching, prefix_varint, read_u32_le};

const NIL: u32 = u32::MAX;

/// Chain-walk depth per compression level, bounding match-finder cost at
/// each level.
fn chain_depth(level: u8) -> u32 {
    match level {
        1 => 8,
        2 => 16,
        3 => 32,
        4 => 64,
        _ => 128,
    }
}

fn hash_bits_for(len: usize) -> u32 {
    let wanted = (len.max(16) * 2).next_power_of_two();
    wanted.trailing_zeros().clamp(10, 20)
}

struct MatchFinder<'a> {
    input: &'a [u8],
    head: Vec<u32>,
    chain: Vec<u32>,
    bits: u32,
}

impl<'a> MatchFinder<'a> {
    fn new(input: &'a [u8]) -> Self {
        let bits = hash_bits_for(input.len());
        MatchFinder {
            input,
            head: vec![NIL; 1 << bits],
            chain: vec![NIL; input.len().max(1)],
            bits,
        }
    }

    #[inline(always)]
    fn hash(&self, pos: usize) -> usize {
        let v = read_u32_le(&self.input[pos..pos + 4]);
        ((v.wrapping_mul(2_654_435_761)) >> (32 - self.bits)) as usize
    }

    fn insert(&mut self, pos: usize) {
        if pos + 4 > self.input.len() {
            return;
        }
        let h = self.hash(pos);
        self.chain[pos] = self.head[h];
        self.head[h] = pos as u32;
    }

    /// Best match at `pos` against earlier positions, searching at most
    /// `depth` chain steps.
    fn find_match(&self, pos: usize, depth: u32) -> Option<(usize, usize)> {
        if pos + 4 > self.input.len() {
            return None;
        }
        let h = self.hash(pos);
        let mut candidate = self.head[h];
        let mut best_len = 0usize;
        let mut best_offset = 0usize;
        let mut steps = 0;
        let limit = self.input.len() - pos;
        while candidate != NIL && steps < depth {
            let c = candidate as usize;
            let offset = pos - c;
            if offset > MAX_OFFSET {
                break;
            }
            let len = count_matching(&self.input[c..], &self.input[pos..], limit);
            if len > best_len && len >= MIN_MATCH {
                best_len = len;
                best_offset = offset;
                if len >= limit {
                    break;
                }
            }
            candidate = self.chain[c];
            steps += 1;
        }
        if best_len >= MIN_MATCH {
            Some((best_len, best_offset))
        } else {
            None
        }
    }
}

struct Sequence {
    ll: usize,
    ml: usize,
    offset: usize,
}

struct LzResult {
    sequences: Vec<Sequence>,
    literals: Vec<u8>,
}

fn run_lazy_match(input: &[u8], level: u8) -> LzResult {
    let depth = chain_depth(level);
    let mut finder = MatchFinder::new(input);
    let mut sequences = Vec::new();
    let mut literals = Vec::new();
    let mut pos = 0usize;
    let mut literal_start = 0usize;

    while pos + MIN_MATCH <= input.len() {
        match finder.find_match(pos, depth) {
            None => {
                finder.insert(pos);
                pos += 1;
            }
            Some((len, offset)) => {
                finder.insert(pos);
                let take_next = if pos + 1 + MIN_MATCH <= input.len() {
                    match finder.find_match(pos + 1, depth) {
                        Some((len2, _)) if len2 > len => true,
                        _ => false,
                    }
                } else {
                    false
                };
                if take_next {
                    pos += 1;
                    continue;
                }
                let ll = pos - literal_start;
                literals.extend_from_slice(&input[literal_start..pos]);
                sequences.push(Sequence { ll, ml: len, offset });
                let mut p = pos + 1;
                while p < pos + len {
                    finder.insert(p);
                    p += 1;
                }
                pos += len;
                literal_start = pos;
            }
        }
    }
    literals.extend_from_slice(&input[literal_start..]);
    LzResult { sequences, literals }
}

fn push_code_and_overflow(code_field: &mut u32, extras: &mut Vec<u8>, value: u32, saturation: u32) {
    if value >= saturation {
        *code_field = saturation;
        prefix_varint::write(extras, value - saturation);
    } else {
        *code_field = value;
    }
}

fn encode_glo(lz: &LzResult) -> Vec<u8> {
    let mut tokens = Vec::with_capacity(lz.sequences.len());
    let mut offsets = Vec::with_capacity(lz.sequences.len() * 2);
    let mut extras = Vec::new();

    let max_offset = lz.sequences.iter().map(|s| s.offset).max().unwrap_or(0);
    let enc_off: u8 = if max_offset <= 256 { 1 } else { 0 };

    for seq in &lz.sequences {
        let mut ll_code = 0u32;
        push_code_and_overflow(&mut ll_code, &mut extras, seq.ll as u32, GLO_SATURATION);
        let mut ml_code = 0u32;
        let ml_value = (seq.ml - MIN_MATCH) as u32;
        push_code_and_overflow(&mut ml_code, &mut extras, ml_value, GLO_SATURATION);
        tokens.push(((ll_code as u8) << 4) | (ml_code as u8));

        let biased = (seq.offset - 1) as u32;
        if enc_off == 1 {
            offsets.push(biased as u8);
        } else {
            offsets.extend_from_slice(&(biased as u16).to_le_bytes());
        }
    }

    let (enc_lit, literal_bytes) = {
        let rle_bytes = rle::encode(&lz.literals);
        if rle_bytes.len() < lz.literals.len() {
            (ENC_RLE, rle_bytes)
        } else {
            (ENC_RAW, lz.literals.clone())
        }
    };

    let header = StreamHeader {
        n_sequences: lz.sequences.len() as u32,
        n_literals: lz.literals.len() as u32,
        enc_lit,
        enc_litlen: 0,
        enc_mlen: 0,
        enc_off,
    };

    let mut out = Vec::with_capacity(
        STREAM_HEADER_SIZE + 32 + literal_bytes.len() + tokens.len() + offsets.len() + extras.len(),
    );
    header.write(&mut out);
    SectionDescriptor { comp_size: literal_bytes.len() as u32, raw_size: lz.literals.len() as u32 }
        .write(&mut out);
    SectionDescriptor::equal(tokens.len() as u32).write(&mut out);
    SectionDescriptor::equal(offsets.len() as u32).write(&mut out);
    SectionDescriptor::equal(extras.len() as u32).write(&mut out);
    out.extend_from_slice(&literal_bytes);
    out.extend_from_slice(&tokens);
    out.extend_from_slice(&offsets);
    out.extend_from_slice(&extras);
    out
}

fn encode_ghi(lz: &LzResult) -> Vec<u8> {
    let mut sequences = Vec::with_capacity(lz.sequences.len() * 4);
    let mut extras = Vec::new();

    for seq in &lz.sequences {
        let mut ll_code = 0u32;
        push_code_and_overflow(&mut ll_code, &mut extras, seq.ll as u32, GHI_SATURATION);
        let mut ml_code = 0u32;
        let ml_value = (seq.ml - MIN_MATCH) as u32;
        push_code_and_overflow(&mut ml_code, &mut extras, ml_value, GHI_SATURATION);
        let biased_offset = (seq.offset - 1) as u32;
        let word = (ll_code << 24) | (ml_code << 16) | biased_offset;
        sequences.extend_from_slice(&word.to_le_bytes());
    }

    let header = StreamHeader {
        n_sequences: lz.sequences.len() as u32,
        n_literals: lz.literals.len() as u32,
        enc_lit: ENC_RAW,
        enc_litlen: 0,
        enc_mlen: 0,
        enc_off: 0,
    };

    let mut out = Vec::with_capacity(
        STREAM_HEADER_SIZE + 24 + lz.literals.len() + sequences.len() + extras.len(),
    );
    header.write(&mut out);
    SectionDescriptor::equal(lz.literals.len() as u32).write(&mut out);
    SectionDescriptor::equal(sequences.len() as u32).write(&mut out);
    SectionDescriptor::equal(extras.len() as u32).write(&mut out);
    out.extend_from_slice(&lz.literals);
    out.extend_from_slice(&sequences);
    out.extend_from_slice(&extras);
    out
}

pub struct EncodedChunk {
    pub block_type: BlockType,
    pub raw_size: u32,
    pub payload: Vec<u8>,
}

/// Encode one chunk (at most `CHUNK_BYTES`, though any length is accepted)
/// into its chosen block type and payload.
pub fn encode_chunk(input: &[u8], level: u8) -> Result<EncodedChunk> {
    if input.is_empty() {
        return Ok(EncodedChunk { block_type: BlockType::Raw, raw_size: 0, payload: Vec::new() });
    }

    let lz = run_lazy_match(input, level);
    let use_ghi = level <= 2;
    let lz_payload = if use_ghi { encode_ghi(&lz) } else { encode_glo(&lz) };
    let lz_block_type = if use_ghi { BlockType::Ghi } else { BlockType::Glo };

    let num_candidate = if num::looks_numeric(input) {
        let est = num::estimate_size(&num::lanes_u32(input));
        if est < lz_payload.len() {
            Some(num::encode(&num::lanes_u32(input)))
        } else {
            None
        }
    } else {
        None
    };

    let (block_type, payload) = match num_candidate {
        Some(num_payload) if num_payload.len() < lz_payload.len() => (BlockType::Num, num_payload),
        _ => (lz_block_type, lz_payload),
    };

    if payload.len() >= input.len() {
        return Ok(EncodedChunk {
            block_type: BlockType::Raw,
            raw_size: input.len() as u32,
            payload: input.to_vec(),
        });
    }

    Ok(EncodedChunk { block_type, raw_size: input.len() as u32, payload })
}
