//! Fixed-layout BMP header fields and pixel conversion.
//!
//! Only three header fields are read, at the offsets a `BITMAPINFOHEADER`
//! file uses. Rows are assumed to be stored back to back with no padding to
//! a 4-byte boundary; images whose row byte count is not a multiple of 4
//! are therefore read skewed, exactly like the program this format was
//! chosen for.

use crate::error::BitmapError;
use crate::heightmap::{Heightmap, Landmark};

/// Byte offset of the little-endian `u32` pixel data offset.
pub const PIXEL_DATA_OFFSET_FIELD: usize = 10;
/// Byte offset of the little-endian `u32` image width.
pub const WIDTH_FIELD: usize = 18;
/// Byte offset of the little-endian `u32` image height.
pub const HEIGHT_FIELD: usize = 22;
/// Bytes per pixel in the 24-bit BGR layout.
pub const BYTES_PER_PIXEL: usize = 3;
/// Smallest buffer that contains all three header fields.
pub const MIN_HEADER_LEN: usize = HEIGHT_FIELD + 4;

/// The header fields this loader relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
    /// Start of the pixel array, from the beginning of the file.
    pub pixel_data_offset: u32,
    pub width: u32,
    pub height: u32,
}

impl BitmapHeader {
    /// Read the header fields from the start of a BMP file.
    pub fn parse(bytes: &[u8]) -> Result<Self, BitmapError> {
        if bytes.len() < MIN_HEADER_LEN {
            return Err(BitmapError::HeaderTruncated {
                len: bytes.len(),
                needed: MIN_HEADER_LEN,
            });
        }

        Ok(Self {
            pixel_data_offset: read_u32_le(bytes, PIXEL_DATA_OFFSET_FIELD),
            width: read_u32_le(bytes, WIDTH_FIELD),
            height: read_u32_le(bytes, HEIGHT_FIELD),
        })
    }

    /// Number of pixel bytes the header implies (`3 * width * height`).
    pub fn pixel_data_len(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * BYTES_PER_PIXEL as u64
    }

    /// Minimum file length for this header to be honest.
    pub fn required_file_len(&self) -> u64 {
        u64::from(self.pixel_data_offset) + self.pixel_data_len()
    }
}

/// Parse an in-memory BMP file into a single-channel heightmap.
///
/// Pixel `(x, y)` of the result is the first (blue) byte of source pixel
/// `(x, height - 1 - y)`. The landmark, if any, is painted last.
pub fn parse_bitmap(bytes: &[u8], landmark: Option<Landmark>) -> Result<Heightmap, BitmapError> {
    let header = BitmapHeader::parse(bytes)?;
    log::debug!(
        "BMP header: offset={}, {}x{}",
        header.pixel_data_offset,
        header.width,
        header.height
    );

    if header.width == 0 || header.height == 0 {
        return Err(BitmapError::ZeroDimensions {
            width: header.width,
            height: header.height,
        });
    }

    let needed = header.required_file_len();
    if (bytes.len() as u64) < needed {
        return Err(BitmapError::PixelDataTruncated {
            needed,
            actual: bytes.len(),
        });
    }

    let start = header.pixel_data_offset as usize;
    let end = start + header.pixel_data_len() as usize;
    let mut heightmap = Heightmap::from_bgr24(header.width, header.height, &bytes[start..end]);

    if let Some(landmark) = landmark {
        heightmap.apply_landmark(landmark);
    }

    Ok(heightmap)
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}


#[cfg(test)]
mod tests {
    use super::test_support::{HEADER_LEN, bmp_file};
    use super::*;

    #[test]
    fn test_header_fields_are_little_endian() {
        let mut bytes = vec![0u8; 64];
        bytes[10..14].copy_from_slice(&[0x36, 0x01, 0x00, 0x00]);
        bytes[18..22].copy_from_slice(&[0x00, 0x04, 0x00, 0x00]);
        bytes[22..26].copy_from_slice(&[0x02, 0x00, 0x01, 0x00]);

        let header = BitmapHeader::parse(&bytes).unwrap();
        assert_eq!(header.pixel_data_offset, 0x136);
        assert_eq!(header.width, 1024);
        assert_eq!(header.height, 0x1_0002);
    }

    #[test]
    fn test_header_truncated() {
        let bytes = [0u8; MIN_HEADER_LEN - 1];
        assert!(matches!(
            BitmapHeader::parse(&bytes),
            Err(BitmapError::HeaderTruncated { len: 25, needed: 26 })
        ));
    }

    #[test]
    fn test_required_file_len() {
        let header = BitmapHeader {
            pixel_data_offset: 54,
            width: 1024,
            height: 1024,
        };
        assert_eq!(header.pixel_data_len(), 3 * 1024 * 1024);
        assert_eq!(header.required_file_len(), 54 + 3 * 1024 * 1024);
    }

    #[test]
    fn test_crafted_4x4_with_landmark() {
        #[rustfmt::skip]
        let blue = [
            10, 11, 12, 13,
            20, 21, 22, 23,
            30, 31, 32, 33,
            40, 41, 42, 43,
        ];
        let file = bmp_file(4, 4, &blue);

        let heightmap = parse_bitmap(&file, Some(Landmark { x: 1, y: 1 })).unwrap();

        #[rustfmt::skip]
        let expected = [
            40,  41,  42,  43,
            30, 255, 255,  33,
            20, 255, 255,  23,
            10,  11,  12,  13,
        ];
        assert_eq!(heightmap.pixels(), &expected);
    }

    #[test]
    fn test_output_is_vertically_flipped_blue_channel() {
        let (width, height) = (5u32, 3u32);
        let blue: Vec<u8> = (0..width * height).map(|i| (i * 7 + 3) as u8).collect();
        let file = bmp_file(width, height, &blue);

        let heightmap = parse_bitmap(&file, None).unwrap();

        for y in 0..height {
            for x in 0..width {
                let source = blue[((height - 1 - y) * width + x) as usize];
                assert_eq!(heightmap.get(x, y), Some(source), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_reflipping_restores_file_row_order() {
        let (width, height) = (3u32, 4u32);
        let blue: Vec<u8> = (0..width * height).map(|i| i as u8 * 9).collect();
        let heightmap = parse_bitmap(&bmp_file(width, height, &blue), None).unwrap();

        let reflipped: Vec<u8> = (0..height)
            .rev()
            .flat_map(|y| heightmap.row(y).to_vec())
            .collect();
        assert_eq!(reflipped, blue);
    }

    #[test]
    fn test_pixel_data_offset_is_honored() {
        let mut file = bmp_file(2, 1, &[7, 8]);
        // Move the pixel array 6 bytes further and point the header at it.
        let pixels = file.split_off(HEADER_LEN as usize);
        file.extend_from_slice(&[0xee; 6]);
        file.extend_from_slice(&pixels);
        file[10..14].copy_from_slice(&(HEADER_LEN + 6).to_le_bytes());

        let heightmap = parse_bitmap(&file, None).unwrap();
        assert_eq!(heightmap.pixels(), &[7, 8]);
    }

    #[test]
    fn test_rows_are_read_without_padding() {
        // 3 pixels per row = 9 bytes; a padded file would insert 3 bytes
        // after each row. This loader reads the rows back to back.
        let file = bmp_file(3, 2, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(file.len(), HEADER_LEN as usize + 18);

        let heightmap = parse_bitmap(&file, None).unwrap();
        assert_eq!(heightmap.pixels(), &[4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_truncated_pixel_data_fails_fast() {
        let mut file = bmp_file(4, 4, &[0; 16]);
        file.truncate(file.len() - 1);

        match parse_bitmap(&file, None) {
            Err(BitmapError::PixelDataTruncated { needed, actual }) => {
                assert_eq!(needed, u64::from(HEADER_LEN) + 48);
                assert_eq!(actual, HEADER_LEN as usize + 47);
            }
            other => panic!("expected PixelDataTruncated, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_dimensions_do_not_overflow() {
        let mut file = bmp_file(1, 1, &[0]);
        file[18..22].copy_from_slice(&u32::MAX.to_le_bytes());
        file[22..26].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            parse_bitmap(&file, None),
            Err(BitmapError::PixelDataTruncated { .. })
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut file = bmp_file(1, 1, &[0]);
        file[18..22].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            parse_bitmap(&file, None),
            Err(BitmapError::ZeroDimensions { width: 0, height: 1 })
        ));
    }

    #[test]
    fn test_matches_reference_encoder_for_aligned_rows() {
        use image::ImageEncoder;
        use image::codecs::bmp::BmpEncoder;

        // 8 pixels * 3 bytes = 24 bytes per row, so the reference encoder
        // writes no padding and the layouts agree.
        let (width, height) = (8u32, 3u32);
        let grey: Vec<u8> = (0..width * height).map(|i| (i * 10) as u8).collect();
        let rgb: Vec<u8> = grey.iter().flat_map(|&g| [g, g, g]).collect();

        let mut file = Vec::new();
        BmpEncoder::new(&mut file)
            .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
            .unwrap();

        let heightmap = parse_bitmap(&file, None).unwrap();
        // The encoder stores the buffer's top row last in the file; the flip
        // brings it back to the front.
        for y in 0..height {
            let expected = &grey[(y * width) as usize..][..width as usize];
            assert_eq!(heightmap.row(y), expected, "row {y}");
        }
    }
}
