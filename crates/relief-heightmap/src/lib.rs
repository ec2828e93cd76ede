//! Heightmap ingestion from one fixed bitmap variant.
//!
//! Reads 24-bit uncompressed Windows BMP files (14-byte file header followed
//! by a `BITMAPINFOHEADER`), keeps a single channel of each pixel, reverses
//! the row order, and paints the landmark spire.
//! Nothing else about the BMP format is supported.

pub mod bmp;
mod error;
pub mod heightmap;

pub use bmp::{BitmapHeader, parse_bitmap};
pub use error::BitmapError;
pub use heightmap::{DEFAULT_LANDMARK, Heightmap, Landmark};

use std::path::Path;

/// Load a heightmap from a BMP file on disk.
///
/// `landmark` is painted after the conversion; pass `None` to skip it.
pub fn load_bitmap(
    path: impl AsRef<Path>,
    landmark: Option<Landmark>,
) -> Result<Heightmap, BitmapError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| BitmapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    let heightmap = parse_bitmap(&bytes, landmark)?;
    log::info!(
        "Loaded heightmap {} ({}x{})",
        path.display(),
        heightmap.width(),
        heightmap.height()
    );
    Ok(heightmap)
}
