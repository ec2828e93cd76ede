//! Single-channel heightmap buffer and the landmark spire.

use crate::bmp::BYTES_PER_PIXEL;

/// Value written to landmark pixels.
pub const LANDMARK_VALUE: u8 = u8::MAX;

/// The spire location in the shipped 1024x1024 heightmap.
pub const DEFAULT_LANDMARK: Landmark = Landmark { x: 270, y: 962 };

/// Top-left corner of a 2x2 block of pixels forced to full brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landmark {
    pub x: u32,
    pub y: u32,
}

impl Landmark {
    /// The four pixels covered by the spire, in write order.
    ///
    /// A corner whose coordinate would pass `u32::MAX` is `None`.
    pub fn pixels(&self) -> [Option<(u32, u32)>; 4] {
        let right = self.x.checked_add(1);
        let below = self.y.checked_add(1);
        [
            Some((self.x, self.y)),
            below.map(|y| (self.x, y)),
            right.zip(below),
            right.map(|x| (x, self.y)),
        ]
    }
}

/// An 8-bit greyscale heightmap, row-major, one byte per texel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Heightmap {
    /// Wrap an existing single-channel buffer.
    ///
    /// Returns `None` if `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() as u64 == u64::from(width) * u64::from(height)).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Keep the first byte of every 3-byte pixel and reverse the row order.
    ///
    /// `bgr` must hold exactly `width * height` unpadded pixels.
    pub fn from_bgr24(width: u32, height: u32, bgr: &[u8]) -> Self {
        let (w, h) = (width as usize, height as usize);
        debug_assert_eq!(bgr.len(), w * h * BYTES_PER_PIXEL);

        let mut pixels = Vec::with_capacity(w * h);
        for y in 0..h {
            let src_row = &bgr[(h - y - 1) * w * BYTES_PER_PIXEL..][..w * BYTES_PER_PIXEL];
            pixels.extend(src_row.chunks_exact(BYTES_PER_PIXEL).map(|px| px[0]));
        }

        Self {
            width,
            height,
            pixels,
        }
    }

    /// Paint the spire. Pixels outside the image are skipped.
    ///
    /// Returns how many pixels were written.
    pub fn apply_landmark(&mut self, landmark: Landmark) -> usize {
        let mut written = 0;
        for pixel in landmark.pixels() {
            let Some((x, y)) = pixel else {
                log::warn!(
                    "Landmark at ({}, {}) extends past the coordinate range, corner skipped",
                    landmark.x,
                    landmark.y
                );
                continue;
            };
            match self.index(x, y) {
                Some(i) => {
                    self.pixels[i] = LANDMARK_VALUE;
                    written += 1;
                }
                None => log::warn!(
                    "Landmark pixel ({x}, {y}) outside {}x{} heightmap, skipped",
                    self.width,
                    self.height
                ),
            }
        }
        written
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All texels, row 0 first.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Texel at `(x, y)`, or `None` outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// One row of texels.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of range");
        let w = self.width as usize;
        &self.pixels[y as usize * w..][..w]
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, value: u8) -> Heightmap {
        Heightmap::new(width, height, vec![value; (width * height) as usize]).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(Heightmap::new(2, 2, vec![0; 3]).is_none());
        assert!(Heightmap::new(2, 2, vec![0; 4]).is_some());
    }

    #[test]
    fn test_from_bgr24_keeps_first_byte() {
        // One row, two pixels: (B, G, R) = (1, 2, 3), (4, 5, 6)
        let heightmap = Heightmap::from_bgr24(2, 1, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(heightmap.pixels(), &[1, 4]);
    }

    #[test]
    fn test_landmark_covers_2x2_block() {
        let mut heightmap = flat(4, 4, 0);
        assert_eq!(heightmap.apply_landmark(Landmark { x: 2, y: 0 }), 4);

        for (x, y) in [(2, 0), (3, 0), (2, 1), (3, 1)] {
            assert_eq!(heightmap.get(x, y), Some(LANDMARK_VALUE));
        }
        let lit = heightmap.pixels().iter().filter(|&&p| p == 255).count();
        assert_eq!(lit, 4);
    }

    #[test]
    fn test_landmark_is_idempotent_overwrite() {
        for value in [0u8, 17, 254, 255] {
            let mut heightmap = flat(3, 3, value);
            heightmap.apply_landmark(Landmark { x: 1, y: 1 });
            let once = heightmap.clone();
            heightmap.apply_landmark(Landmark { x: 1, y: 1 });
            assert_eq!(heightmap, once);
            for (x, y) in (Landmark { x: 1, y: 1 }).pixels().into_iter().flatten() {
                assert_eq!(heightmap.get(x, y), Some(255));
            }
        }
    }

    #[test]
    fn test_landmark_partially_outside_is_clipped() {
        let mut heightmap = flat(4, 4, 9);
        assert_eq!(heightmap.apply_landmark(Landmark { x: 3, y: 3 }), 1);
        assert_eq!(heightmap.get(3, 3), Some(255));
        assert_eq!(heightmap.pixels().iter().filter(|&&p| p == 9).count(), 15);
    }

    #[test]
    fn test_landmark_at_coordinate_limit_is_skipped() {
        let mut heightmap = flat(2, 2, 3);
        assert_eq!(heightmap.apply_landmark(Landmark { x: u32::MAX, y: 0 }), 0);
        assert_eq!(heightmap.apply_landmark(Landmark { x: 0, y: u32::MAX }), 0);
        assert_eq!(heightmap.apply_landmark(Landmark { x: u32::MAX, y: u32::MAX }), 0);
        assert!(heightmap.pixels().iter().all(|&p| p == 3));
    }

    #[test]
    fn test_landmark_pixels_drop_overflowing_corners() {
        let corners = Landmark { x: u32::MAX, y: 5 }.pixels();
        assert_eq!(corners, [Some((u32::MAX, 5)), Some((u32::MAX, 6)), None, None]);
        let corners = Landmark { x: 1, y: 2 }.pixels();
        assert_eq!(corners, [Some((1, 2)), Some((1, 3)), Some((2, 3)), Some((2, 2))]);
    }

    #[test]
    fn test_default_landmark_fits_shipped_map() {
        let mut heightmap = flat(1024, 1024, 0);
        assert_eq!(heightmap.apply_landmark(DEFAULT_LANDMARK), 4);
        // Same texels as `270 + 962 * 1024 (+1, +1024, +1025)`.
        let base = 270 + 962 * 1024;
        for i in [base, base + 1, base + 1024, base + 1025] {
            assert_eq!(heightmap.pixels()[i], 255);
        }
    }

    #[test]
    fn test_get_out_of_range() {
        let heightmap = flat(2, 2, 1);
        assert_eq!(heightmap.get(2, 0), None);
        assert_eq!(heightmap.get(0, 2), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_row_out_of_range_panics() {
        flat(2, 2, 0).row(2);
    }
}
