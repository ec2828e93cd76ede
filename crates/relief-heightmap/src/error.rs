//! Bitmap loading error types.

use std::path::PathBuf;

/// Errors produced while reading a heightmap bitmap.
#[derive(Debug, thiserror::Error)]
pub enum BitmapError {
    /// The file could not be opened or read.
    #[error("failed to read bitmap {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The buffer is too short to hold the offset/width/height header fields.
    #[error("bitmap header truncated: {len} bytes, need at least {needed}")]
    HeaderTruncated { len: usize, needed: usize },

    /// The header promises more pixel data than the file contains.
    #[error(
        "bitmap pixel data truncated: header implies {needed} bytes, file has {actual}"
    )]
    PixelDataTruncated { needed: u64, actual: usize },

    /// Width or height is zero.
    #[error("bitmap dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
}
