//! Producer/worker/writer triple for `stream_decompress`.
//!
//! Block parsing and checksum verification happen in the reader thread, not
//! the writer: blocks are read strictly in source order regardless of which
//! worker later decodes them, so the rolling hash can be folded the moment
//! each block is read rather than waiting for a decoded result to come back
//! in order. This mirrors the compress side's "only one thread advances the
//! hash" rule while skipping a pointless indirection through the writer.

use std::io::{Read, Write};

use crate::chunk::decode_chunk;
use crate::container::{self, BlockHeader, BlockType, FileHeader, RollingHash};
use crate::driver::ring::{ring_capacity, Job, JobResult, Ring};
use crate::driver::StreamOptions;
use crate::error::{Result, ZxcError};

type RawBlock = (BlockType, u32, Vec<u8>);

fn read_exact_or_err<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ZxcError::SrcTooSmall
        } else {
            ZxcError::from(e)
        }
    })
}

/// Read one framed block from `reader`. Returns `None` on the EOF block.
fn read_one_block<R: Read>(reader: &mut R, checksum: bool) -> Result<Option<RawBlock>> {
    let mut header_buf = [0u8; container::BLOCK_HEADER_SIZE];
    read_exact_or_err(reader, &mut header_buf)?;
    let header = BlockHeader::read(&header_buf)?;
    if header.block_type == BlockType::Eof {
        return Ok(None);
    }
    let mut payload = vec![0u8; header.comp_size as usize];
    read_exact_or_err(reader, &mut payload)?;
    if checksum {
        let mut cksum_buf = [0u8; container::BLOCK_CHECKSUM_SIZE];
        read_exact_or_err(reader, &mut cksum_buf)?;
        let stored = crate::primitives::read_u32_le(&cksum_buf);
        let expect = crate::primitives::block_hash32(&payload);
        if stored != expect {
            return Err(ZxcError::BadChecksum);
        }
    }
    Ok(Some((header.block_type, header.raw_size, payload)))
}

pub fn stream_decompress<R: Read, W: Write>(mut reader: R, mut writer: W, opts: StreamOptions) -> Result<u64> {
    if opts.workers == 0 {
        return Err(ZxcError::NullInput);
    }

    let mut header_buf = [0u8; container::FILE_HEADER_SIZE];
    read_exact_or_err(&mut reader, &mut header_buf)?;
    let (file_header, _) = FileHeader::read(&header_buf)?;
    let checksum = file_header.checksum;

    let capacity = ring_capacity(opts.workers);
    let ring: Ring<RawBlock, Vec<u8>> = Ring::new(capacity);
    let mut progress = opts.progress;

    let scope_result = std::thread::scope(|scope| -> Result<(u64, u64, u32, container::Footer)> {
        let ring = &ring;

        let reader_handle = scope.spawn(move || -> Result<(u64, u32, container::Footer)> {
            let mut total_raw: u64 = 0;
            let mut hash = RollingHash::new();
            loop {
                let block = match read_one_block(&mut reader, checksum) {
                    Ok(b) => b,
                    Err(e) => {
                        ring.set_error(e);
                        return Err(e);
                    }
                };
                match block {
                    None => {
                        ring.fill(Job::Eof);
                        let mut footer_buf = [0u8; container::FOOTER_SIZE];
                        let footer = match read_exact_or_err(&mut reader, &mut footer_buf)
                            .and_then(|_| container::Footer::read(&footer_buf))
                        {
                            Ok(f) => f,
                            Err(e) => {
                                ring.set_error(e);
                                return Err(e);
                            }
                        };
                        return Ok((total_raw, hash.value(), footer));
                    }
                    Some((block_type, raw_size, payload)) => {
                        if checksum {
                            hash.fold(crate::primitives::block_hash32(&payload));
                        }
                        total_raw += raw_size as u64;
                        ring.fill(Job::Data((block_type, raw_size, payload)));
                    }
                }
            }
        });

        for _ in 0..opts.workers {
            let _ = scope.spawn(move || {
                while let Some((idx, _id, job)) = ring.claim() {
                    match job {
                        Job::Eof => ring.complete(idx, JobResult::Eof),
                        Job::Data((block_type, raw_size, payload)) => {
                            match decode_chunk(block_type, &payload, raw_size as usize) {
                                Ok(bytes) => ring.complete(idx, JobResult::Data(bytes)),
                                Err(e) => {
                                    ring.set_error(e);
                                    ring.complete(idx, JobResult::Err);
                                }
                            }
                        }
                    }
                }
            });
        }

        let mut total_written: u64 = 0;
        loop {
            match ring.drain() {
                JobResult::Data(bytes) => {
                    if let Err(e) = writer.write_all(&bytes) {
                        ring.set_error(ZxcError::from(e));
                        break;
                    }
                    total_written += bytes.len() as u64;
                    if let Some(cb) = progress.as_mut() {
                        cb(total_written, 0);
                    }
                }
                JobResult::Eof => break,
                JobResult::Err => break,
            }
        }
        ring.shutdown();

        let reader_result = reader_handle.join().map_err(|_| ZxcError::Io)?;
        if let Some(e) = ring.first_error() {
            return Err(e);
        }
        let (total_raw_expected, hash_computed, footer) = reader_result?;

        writer.flush().map_err(ZxcError::from)?;
        Ok((total_written, total_raw_expected, hash_computed, footer))
    })?;

    let (total_written, total_raw_expected, hash_computed, footer) = scope_result;
    if total_written != total_raw_expected {
        return Err(ZxcError::CorruptData);
    }
    if footer.original_size != total_written {
        return Err(ZxcError::BadChecksum);
    }
    if checksum && footer.rolling_hash != hash_computed {
        return Err(ZxcError::BadChecksum);
    }

    Ok(total_written)
}
