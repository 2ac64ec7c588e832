//! # TSPL Bitmap Command
//!
//! Draws a 1-bit image into the label buffer.
//!
//! ## BITMAP Syntax
//!
//! ```text
//! BITMAP x,y,width_bytes,height,mode,<data>
//! ```
//!
//! - `x`, `y`: top-left corner in dots
//! - `width_bytes`: bytes per row, `ceil(width_dots / 8)`
//! - `height`: rows
//! - `mode`: 0 = overwrite, 1 = OR, 2 = XOR (this crate always overwrites)
//! - `data`: exactly `width_bytes * height` raw bytes
//!
//! The binary payload follows the trailing comma directly, with no
//! separator and no terminator. The printer reads a fixed byte count and
//! resumes parsing text afterwards.
//!
//! ## Bit Packing
//!
//! - Bit 7 (MSB) = leftmost dot
//! - 1 = ink, 0 = no ink

/// Overwrite mode for BITMAP
pub const MODE_OVERWRITE: u8 = 0;

/// # BITMAP Header
///
/// Returns the ASCII prefix that must be sent immediately before the
/// payload.
///
/// ## Example
///
/// ```
/// use labelbridge::protocol::graphics;
///
/// assert_eq!(graphics::bitmap_header(0, 0, 101, 1215), "BITMAP 0,0,101,1215,0,");
/// ```
pub fn bitmap_header(x: u32, y: u32, width_bytes: u32, height: u32) -> String {
    format!(
        "BITMAP {},{},{},{},{},",
        x, y, width_bytes, height, MODE_OVERWRITE
    )
}

/// # Full BITMAP Command
///
/// Header followed by the payload, as a single byte buffer.
pub fn bitmap(x: u32, y: u32, width_bytes: u32, height: u32, data: &[u8]) -> Vec<u8> {
    debug_assert!(
        data.len() == width_bytes as usize * height as usize,
        "Bitmap data must be exactly width_bytes * height bytes. Expected {}, got {}",
        width_bytes as usize * height as usize,
        data.len()
    );

    let header = bitmap_header(x, y, width_bytes, height);
    let mut cmd = Vec::with_capacity(header.len() + data.len());
    cmd.extend_from_slice(header.as_bytes());
    cmd.extend_from_slice(data);
    cmd
}
