//! Producer/worker/writer triple for `stream_compress`.

use std::io::{Read, Write};

use crate::chunk::encode_chunk;
use crate::container::{self, BlockType, FileHeader, RollingHash};
use crate::driver::ring::{ring_capacity, Job, JobResult, Ring};
use crate::driver::StreamOptions;
use crate::error::{Result, ZxcError};

type CompressedJob = (BlockType, u32, Vec<u8>);

fn read_chunk<R: Read>(reader: &mut R, chunk_bytes: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; chunk_bytes];
    let mut filled = 0;
    while filled < chunk_bytes {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

pub fn stream_compress<R: Read, W: Write>(mut reader: R, mut writer: W, opts: StreamOptions) -> Result<u64> {
    if opts.workers == 0 {
        return Err(ZxcError::NullInput);
    }

    let header = FileHeader {
        version: container::FORMAT_VERSION,
        chunk_size_code: FileHeader::size_code_for(opts.chunk_bytes),
        checksum: opts.checksum,
    };
    let mut header_buf = Vec::new();
    header.write(&mut header_buf);
    writer.write_all(&header_buf).map_err(ZxcError::from)?;

    let capacity = ring_capacity(opts.workers);
    let ring: Ring<Vec<u8>, CompressedJob> = Ring::new(capacity);
    let level = opts.level;
    let checksum = opts.checksum;
    let chunk_bytes = opts.chunk_bytes;
    let mut progress = opts.progress;

    let total_raw = std::thread::scope(|scope| -> Result<u64> {
        let ring = &ring;

        let reader_handle = scope.spawn(move || -> Result<()> {
            loop {
                let chunk = match read_chunk(&mut reader, chunk_bytes) {
                    Ok(c) => c,
                    Err(e) => {
                        let e = ZxcError::from(e);
                        ring.set_error(e);
                        return Err(e);
                    }
                };
                if chunk.is_empty() {
                    ring.fill(Job::Eof);
                    return Ok(());
                }
                ring.fill(Job::Data(chunk));
            }
        });

        for _ in 0..opts.workers {
            let _ = scope.spawn(move || {
                while let Some((idx, _id, job)) = ring.claim() {
                    match job {
                        Job::Eof => ring.complete(idx, JobResult::Eof),
                        Job::Data(chunk) => match encode_chunk(&chunk, level) {
                            Ok(encoded) => ring.complete(
                                idx,
                                JobResult::Data((encoded.block_type, encoded.raw_size, encoded.payload)),
                            ),
                            Err(e) => {
                                ring.set_error(e);
                                ring.complete(idx, JobResult::Err);
                            }
                        },
                    }
                }
            });
        }

        let mut global_hash = RollingHash::new();
        let mut total_raw: u64 = 0;
        loop {
            match ring.drain() {
                JobResult::Data((block_type, raw_size, payload)) => {
                    let mut framed = Vec::with_capacity(payload.len() + 32);
                    container::write_block(&mut framed, block_type, raw_size, &payload, checksum);
                    if let Err(e) = writer.write_all(&framed) {
                        ring.set_error(ZxcError::from(e));
                        break;
                    }
                    if checksum {
                        global_hash.fold(container::block_checksum_of(&payload));
                    }
                    total_raw += raw_size as u64;
                    if let Some(cb) = progress.as_mut() {
                        cb(total_raw, 0);
                    }
                }
                JobResult::Eof => break,
                JobResult::Err => break,
            }
        }
        // Every early-exit path above ends the loop without necessarily
        // having seen Eof; shutdown unconditionally so the reader and
        // workers, which only stop on Eof or a recorded error, never block
        // forever waiting on a slot nobody will fill or drain again.
        ring.shutdown();

        let reader_result = reader_handle.join().map_err(|_| ZxcError::Io)?;
        if let Some(e) = ring.first_error() {
            return Err(e);
        }
        reader_result?;

        let mut eof_and_footer = Vec::with_capacity(24);
        container::write_eof(&mut eof_and_footer);
        container::write_footer(&mut eof_and_footer, total_raw, global_hash.value());
        writer.write_all(&eof_and_footer).map_err(ZxcError::from)?;
        writer.flush().map_err(ZxcError::from)?;
        Ok(total_raw)
    })?;

    Ok(total_raw)
}
