//! Streaming driver: a producer (reader), `W` workers, and a consumer
//! (writer) cooperating through [`ring::Ring`] to parallelize chunk
//! encode/decode while preserving source order.

pub mod compress;
pub mod decompress;
pub mod ring;

pub use compress::stream_compress;
pub use decompress::stream_decompress;

/// Progress callback invoked by the writer thread as `(bytes_processed,
/// bytes_total)`; `bytes_total` may be zero when the caller didn't supply
/// one (e.g. an unsized reader).
pub type ProgressFn = Box<dyn FnMut(u64, u64) + Send>;

/// Options shared by [`stream_compress`] and [`stream_decompress`],
/// gathering the worker/level/checksum/chunk-size knobs into one struct
/// instead of positional parameters.
pub struct StreamOptions {
    pub workers: usize,
    pub level: u8,
    pub checksum: bool,
    pub chunk_bytes: usize,
    pub progress: Option<ProgressFn>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        StreamOptions {
            workers: num_cpus::get().max(1),
            level: 3,
            checksum: true,
            chunk_bytes: crate::chunk::types::CHUNK_BYTES,
            progress: None,
        }
    }
}
