//! ZXC — a lossless, asymmetric block compressor: fast, parallel
//! compression paired with simple, always-safe decompression.

pub mod api;
pub mod chunk;
pub mod container;
pub mod driver;
pub mod error;
pub mod primitives;

pub use api::{compress, compress_bound, decompress, decompressed_size, stream_compress, stream_decompress};
pub use driver::StreamOptions;
pub use error::{Result, ZxcError};
