//! # Monochrome Bitmap Packing
//!
//! Packs a binarized grayscale raster into the row-major, byte-aligned,
//! MSB-first payload of the TSPL `BITMAP` command.
//!
//! ## Bit Packing
//!
//! - Bit 7 (MSB) = leftmost pixel
//! - Bit 0 (LSB) = rightmost pixel
//! - 1 = ink (printer marks the dot), 0 = no ink
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0x0F = 00001111 = ░░░░████
//! ```
//!
//! ## Padding
//!
//! Rows are padded to a whole byte with zero (no-ink) bits on the right.

use image::{GrayImage, Luma};

/// Threshold separating dark from light pixels.
pub const MIDPOINT: u8 = 128;

/// Which pixel value is treated as ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Pixels darker than the midpoint print.
    #[default]
    DarkIsInk,
    /// Pixels at or above the midpoint print.
    LightIsInk,
}

impl Polarity {
    #[inline]
    pub fn is_ink(self, value: u8) -> bool {
        match self {
            Self::DarkIsInk => value < MIDPOINT,
            Self::LightIsInk => value >= MIDPOINT,
        }
    }
}

/// A packed 1-bit image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MonoBitmap {
    /// Bytes per row for a given pixel width: `ceil(width / 8)`.
    #[inline]
    pub fn row_bytes(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        Self::row_bytes(self.width)
    }

    /// Packed rows, `bytes_per_row() * height()` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Whether the dot at (x, y) carries ink. Dots outside the bitmap never do.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte_idx = y as usize * self.bytes_per_row() + x as usize / 8;
        let bit_idx = 7 - (x % 8);
        (self.data[byte_idx] >> bit_idx) & 1 == 1
    }

    /// Unpack to grayscale: ink = black (0), no ink = white (255).
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.is_ink(x, y) { Luma([0]) } else { Luma([255]) }
        })
    }
}

/// Pack a row of pixels into bytes.
///
/// ## Example
///
/// ```
/// use labelbridge::render::bitmap::pack_row;
///
/// // 12 pixels pack into 2 bytes (4 bits padding)
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            let byte_idx = i / 8;
            let bit_idx = 7 - (i % 8); // MSB first
            bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    bytes
}

/// Encode a binarized raster.
///
/// The input is expected to be strictly black/white (the pipeline's output);
/// other gray values are classified by [`Polarity::is_ink`] against the
/// midpoint.
pub fn encode(image: &GrayImage, polarity: Polarity) -> MonoBitmap {
    let (width, height) = image.dimensions();
    let mut data = Vec::with_capacity(MonoBitmap::row_bytes(width) * height as usize);

    let mut row = Vec::with_capacity(width as usize);
    for y in 0..height {
        row.clear();
        row.extend((0..width).map(|x| polarity.is_ink(image.get_pixel(x, y)[0])));
        data.extend(pack_row(&row));
    }

    MonoBitmap {
        width,
        height,
        data,
    }
}

// ============================================================================
// TESTS
// ============================================================================
