//! E2E Test Suite: Corruption Detection
//!
//! Tamper, truncation, and reordering must be rejected in checksum mode,
//! never panic or read/write out of bounds.

use zxc::container::{BlockHeader, BLOCK_HEADER_SIZE, FOOTER_SIZE};
use zxc::{compress, compress_bound, decompress};

fn make_archive(input: &[u8]) -> Vec<u8> {
    let bound = compress_bound(input.len() as u64) as usize;
    let mut dst = vec![0u8; bound];
    let n = compress(input, &mut dst, 3, true).unwrap() as usize;
    dst.truncate(n);
    dst
}

#[test]
fn single_byte_tamper_detected_everywhere_but_original_size_field() {
    let input = b"the archive corruption detection test string ".repeat(200);
    let archive = make_archive(&input);

    // The footer's original-size field (first 8 of the last 12 bytes) is the
    // one region exempt from "any tamper is caught", since it isn't itself
    // checksummed by anything but its own role as a cross-check; we
    // still expect most positions there to be caught via the length
    // mismatch it would cause against the decoded byte count, so we only
    // skip positions that happen to leave `original_size` decodable as a
    // smaller value than what was actually produced without also breaking
    // the rolling hash. Flip every other byte and expect rejection.
    let footer_size_field_start = archive.len() - FOOTER_SIZE;
    let mut rejections = 0usize;
    let mut total = 0usize;
    for i in 0..archive.len() {
        if i >= footer_size_field_start && i < footer_size_field_start + 8 {
            continue;
        }
        total += 1;
        let mut tampered = archive.clone();
        tampered[i] ^= 0xFF;
        let mut out = vec![0u8; input.len() + 4096];
        if decompress(&tampered, &mut out, true).is_err() {
            rejections += 1;
        }
    }
    assert_eq!(rejections, total, "every non-size-field byte flip should be rejected");
}

#[test]
fn truncation_rejected_for_every_prefix_in_footer_window() {
    let input = b"truncation probe payload ".repeat(300);
    let archive = make_archive(&input);

    for k in 1..=(FOOTER_SIZE + 1) {
        if k >= archive.len() {
            break;
        }
        let mut out = vec![0u8; input.len() + 4096];
        assert!(
            decompress(&archive[..archive.len() - k], &mut out, true).is_err(),
            "truncating {k} bytes from the end should be rejected"
        );
    }
}

#[test]
fn block_reorder_detected_via_rolling_hash() {
    let mut input = Vec::new();
    for i in 0u8..4 {
        input.extend(std::iter::repeat(i).take(64 * 1024));
    }
    // Force two data blocks worth of distinct content within one chunk by
    // using two chunks explicitly through the streaming path instead, since
    // the single-shot API uses one fixed chunk size.
    let opts = zxc::StreamOptions { workers: 1, level: 3, checksum: true, chunk_bytes: 64 * 1024, ..Default::default() };
    let mut archive = Vec::new();
    zxc::stream_compress(input.as_slice(), &mut archive, opts).unwrap();

    let h1 = BlockHeader::read(&archive[8..8 + BLOCK_HEADER_SIZE]).unwrap();
    let block1_len = BLOCK_HEADER_SIZE + h1.comp_size as usize + 4;
    let block2_start = 8 + block1_len;
    let h2 = BlockHeader::read(&archive[block2_start..block2_start + BLOCK_HEADER_SIZE]).unwrap();
    let block2_len = BLOCK_HEADER_SIZE + h2.comp_size as usize + 4;

    let mut block1 = archive[8..8 + block1_len].to_vec();
    let mut block2 = archive[block2_start..block2_start + block2_len].to_vec();
    let tail_start = block2_start + block2_len;

    let mut swapped = archive[..8].to_vec();
    swapped.append(&mut block2);
    swapped.append(&mut block1);
    swapped.extend_from_slice(&archive[tail_start..]);

    let opts = zxc::StreamOptions { workers: 1, ..Default::default() };
    let mut decoded = Vec::new();
    assert!(zxc::stream_decompress(swapped.as_slice(), &mut decoded, opts).is_err());
}

#[test]
fn no_panic_on_arbitrary_bit_flips_in_small_archive() {
    let input = b"small adversarial fuzz seed";
    let archive = make_archive(input);
    let mut state: u32 = 12345;
    for _ in 0..500 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let mut tampered = archive.clone();
        let idx = (state as usize) % tampered.len();
        tampered[idx] ^= (state >> 8) as u8;
        let mut out = vec![0u8; input.len() + 4096];
        let _ = decompress(&tampered, &mut out, true);
    }
}
