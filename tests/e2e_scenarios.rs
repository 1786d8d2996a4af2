//! E2E Test Suite: Concrete Scenarios
//!
//! Each scenario round-trips `input` through `compress`/`decompress` and
//! checks the additional assertion the scenario calls for.

use zxc::chunk::encode_chunk;
use zxc::container::{BlockType, BLOCK_CHECKSUM_SIZE, BLOCK_HEADER_SIZE, FILE_HEADER_SIZE, FOOTER_SIZE};
use zxc::{compress, compress_bound, decompress, decompressed_size};

fn round_trip(input: &[u8], level: u8, checksum: bool) -> Vec<u8> {
    let bound = compress_bound(input.len() as u64) as usize;
    let mut compressed = vec![0u8; bound];
    let clen = compress(input, &mut compressed, level, checksum).unwrap() as usize;
    compressed.truncate(clen);

    let mut decompressed = vec![0u8; input.len()];
    let dlen = decompress(&compressed, &mut decompressed, checksum).unwrap() as usize;
    assert_eq!(&decompressed[..dlen], input);
    compressed
}

#[test]
fn scenario_1_empty_input() {
    let archive = round_trip(b"", 3, true);
    assert_eq!(decompressed_size(&archive), Some(0));
    // File header, EOF block, footer: no data block, no payload.
    assert_eq!(archive.len(), FILE_HEADER_SIZE + BLOCK_HEADER_SIZE + FOOTER_SIZE);
}

#[test]
fn scenario_2_ten_byte_literal() {
    let input = b"Hello ZXC\n";
    let archive = round_trip(input, 1, true);

    let encoded = encode_chunk(input, 1).unwrap();
    assert_eq!(encoded.block_type, BlockType::Raw, "ten-byte literal should fall back to RAW");

    // File header + one data block (header + 10-byte payload + checksum) +
    // EOF block header + footer.
    let expected =
        FILE_HEADER_SIZE + BLOCK_HEADER_SIZE + input.len() + BLOCK_CHECKSUM_SIZE + BLOCK_HEADER_SIZE + FOOTER_SIZE;
    assert_eq!(archive.len(), expected);

    let mut tampered = archive.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0xFF;
    let mut out = vec![0u8; input.len()];
    assert!(decompress(&tampered, &mut out, true).is_err());
}

#[test]
fn scenario_3_highly_repetitive() {
    let input = b"ABCDE".repeat(100_000);
    let archive = round_trip(&input, 3, true);

    let encoded = encode_chunk(&input[..input.len().min(zxc::chunk::types::CHUNK_BYTES)], 3).unwrap();
    assert_eq!(encoded.block_type, BlockType::Glo, "period-5 repeats should pick GLO with a 1-byte offset");

    let ratio = input.len() as f64 / archive.len() as f64;
    assert!(ratio > 20.0, "expected >20:1 ratio, got {ratio}");
}

#[test]
fn scenario_4_large_offset_periodic() {
    let mut state: u32 = 0xA5A5_1234;
    let mut next_rand = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state & 0xFF) as u8
    };

    let mut input = vec![0u8; 65_536];
    for i in 0..300 {
        input[i] = next_rand();
    }
    for i in 300..65_536 {
        input[i] = input[i - 300];
    }

    let encoded = encode_chunk(&input, 3).unwrap();
    assert_eq!(encoded.block_type, BlockType::Glo, "offset 300 exceeds the 1-byte threshold");

    round_trip(&input, 3, true);

    let mut flipped = input.clone();
    flipped[200] ^= 0xFF;
    round_trip(&flipped, 3, true);
}

#[test]
fn scenario_5_incompressible_falls_back_to_raw() {
    let mut state: u64 = 0x9E3779B97F4A7C15;
    let mut next_rand = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut input = vec![0u8; 256 * 1024];
    for chunk in input.chunks_mut(8) {
        let bytes = next_rand().to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
    }

    let encoded = encode_chunk(&input, 3).unwrap();
    assert_eq!(encoded.block_type, BlockType::Raw);

    let archive = round_trip(&input, 3, true);
    let overhead = archive.len() - input.len();
    assert!(overhead <= 40, "overhead {overhead} exceeded 40 bytes");
}

#[test]
fn scenario_6_numeric() {
    let values: Vec<u32> = (0..65_536u32).map(|i| i * 7).collect();
    let input: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    assert_eq!(input.len(), 262_144);

    let encoded = encode_chunk(&input, 3).unwrap();
    assert_eq!(encoded.block_type, BlockType::Num);

    round_trip(&input, 3, true);
}

#[test]
fn scenario_7_multi_block_stream() {
    let mut input = Vec::with_capacity(1024 * 1024);
    let mut state: u32 = 7;
    while input.len() < 1024 * 1024 {
        if input.len() % (64 * 1024) < 32 * 1024 {
            input.extend_from_slice(b"repeating filler content block ");
        } else {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            input.push((state & 0xFF) as u8);
        }
    }
    input.truncate(1024 * 1024);

    let mut archives = Vec::new();
    for workers in [1usize, 4, 8] {
        let opts = zxc::StreamOptions { workers, level: 3, checksum: true, ..Default::default() };
        let mut out = Vec::new();
        let written = zxc::stream_compress(input.as_slice(), &mut out, opts).unwrap();
        assert_eq!(written, input.len() as u64);
        archives.push(out);
    }
    assert_eq!(archives[0], archives[1], "W=1 and W=4 must produce byte-identical archives");
    assert_eq!(archives[0], archives[2], "W=1 and W=8 must produce byte-identical archives");

    for archive in &archives {
        let opts = zxc::StreamOptions { workers: 4, ..Default::default() };
        let mut decoded = Vec::new();
        let written = zxc::stream_decompress(archive.as_slice(), &mut decoded, opts).unwrap();
        assert_eq!(written, input.len() as u64);
        assert_eq!(decoded, input);
    }

    // Swap the first two data blocks: both are framed right after the
    // 8-byte file header.
    let mut swapped = archives[0].clone();
    let h1 = zxc::container::BlockHeader::read(&swapped[8..20]).unwrap();
    let block1_len = BLOCK_HEADER_SIZE + h1.comp_size as usize + BLOCK_CHECKSUM_SIZE;
    let block2_start = 8 + block1_len;
    let h2 = zxc::container::BlockHeader::read(&swapped[block2_start..block2_start + 12]).unwrap();
    let block2_len = BLOCK_HEADER_SIZE + h2.comp_size as usize + BLOCK_CHECKSUM_SIZE;

    let mut block1 = swapped[8..8 + block1_len].to_vec();
    let mut block2 = swapped[block2_start..block2_start + block2_len].to_vec();
    let tail_start = block2_start + block2_len;
    let mut rebuilt = swapped[..8].to_vec();
    rebuilt.append(&mut block2);
    rebuilt.append(&mut block1);
    rebuilt.extend_from_slice(&swapped[tail_start..]);
    swapped = rebuilt;

    let opts = zxc::StreamOptions { workers: 1, ..Default::default() };
    let mut decoded = Vec::new();
    assert!(zxc::stream_decompress(swapped.as_slice(), &mut decoded, opts).is_err());
}
