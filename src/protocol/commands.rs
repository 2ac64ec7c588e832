//! # TSPL Setup and Print Commands
//!
//! This module implements the label-setup commands of the TSPL command
//! language used by TSC-compatible thermal label printers.
//!
//! ## Protocol Overview
//!
//! TSPL is line-oriented ASCII. Every command is a keyword followed by
//! comma-separated parameters and terminated by a single LF:
//!
//! ```text
//! SIZE 101 mm, 152 mm
//! GAP 2 mm, 0 mm
//! DIRECTION 1
//! CLS
//! ...
//! PRINT 1
//! ```
//!
//! The printers this crate targets accept LF but choke on CRLF, so no
//! carriage returns are ever emitted.

use crate::printer::LabelSpec;

/// LF (Line Feed) - Command terminator
pub const LF: u8 = 0x0A;

// ============================================================================
// LABEL SETUP
// ============================================================================

/// # Set Label Size (SIZE)
///
/// ## Protocol Details
///
/// | Format | `SIZE m mm, n mm` |
/// |--------|-------------------|
///
/// - `m`: label width in millimeters
/// - `n`: label height in millimeters
///
/// ## Example
///
/// ```
/// use labelbridge::protocol::commands;
///
/// assert_eq!(commands::size(101.0, 152.0), "SIZE 101 mm, 152 mm\n");
/// ```
pub fn size(width_mm: f32, height_mm: f32) -> String {
    format!("SIZE {} mm, {} mm\n", width_mm, height_mm)
}

/// # Set Gap Between Labels (GAP)
///
/// `GAP m mm, n mm` where `m` is the gap length and `n` the gap offset.
/// The offset is always 0 for die-cut labels.
pub fn gap(gap_mm: f32) -> String {
    format!("GAP {} mm, 0 mm\n", gap_mm)
}

/// Print direction relative to the feed direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Normal = 0,
    Rotate90 = 1,
    Rotate180 = 2,
    Rotate270 = 3,
}

/// Orientation this bridge always prints in.
pub const PRINT_DIRECTION: Direction = Direction::Rotate90;

/// # Set Print Direction (DIRECTION)
///
/// `DIRECTION n` with n in 0..=3.
pub fn direction(direction: Direction) -> String {
    format!("DIRECTION {}\n", direction as u8)
}

/// # Clear Image Buffer (CLS)
///
/// Must follow the setup commands and precede any drawing command.
pub fn cls() -> String {
    "CLS\n".to_string()
}

/// # Print Label (PRINT)
///
/// `PRINT n` prints `n` copies of the buffered label.
pub fn print(copies: u32) -> String {
    format!("PRINT {}\n", copies)
}

/// Label header: SIZE, GAP, DIRECTION and CLS for the given label.
///
/// ## Example
///
/// ```
/// use labelbridge::{printer::LabelSpec, protocol::commands};
///
/// let header = commands::header(&LabelSpec::SHIPPING_4X6);
/// assert_eq!(header, "SIZE 101 mm, 152 mm\nGAP 2 mm, 0 mm\nDIRECTION 1\nCLS\n");
/// ```
pub fn header(label: &LabelSpec) -> String {
    let mut cmd = String::new();
    cmd.push_str(&size(label.width_mm, label.height_mm));
    cmd.push_str(&gap(label.gap_mm));
    cmd.push_str(&direction(PRINT_DIRECTION));
    cmd.push_str(&cls());
    cmd
}

/// Label trailer: PRINT followed by one blank line.
pub fn trailer(copies: u32) -> String {
    let mut cmd = print(copies);
    cmd.push('\n');
    cmd
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(size(40.0, 30.0), "SIZE 40 mm, 30 mm\n");
        assert_eq!(size(101.6, 152.4), "SIZE 101.6 mm, 152.4 mm\n");
    }

    #[test]
    fn test_gap() {
        assert_eq!(gap(2.0), "GAP 2 mm, 0 mm\n");
    }

    #[test]
    fn test_direction_values() {
        assert_eq!(direction(Direction::Normal), "DIRECTION 0\n");
        assert_eq!(direction(Direction::Rotate90), "DIRECTION 1\n");
        assert_eq!(direction(Direction::Rotate180), "DIRECTION 2\n");
        assert_eq!(direction(Direction::Rotate270), "DIRECTION 3\n");
    }

    #[test]
    fn test_header_order() {
        let header = header(&LabelSpec::TEXT_DEFAULT);
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(
            lines,
            vec!["SIZE 40 mm, 30 mm", "GAP 2 mm, 0 mm", "DIRECTION 1", "CLS"]
        );
    }

    #[test]
    fn test_trailer_has_blank_line() {
        assert_eq!(trailer(1), "PRINT 1\n\n");
        assert_eq!(trailer(3), "PRINT 3\n\n");
    }

    #[test]
    fn test_no_carriage_returns() {
        let header = header(&LabelSpec::default());
        assert!(!header.contains('\r'));
        assert!(header.ends_with(LF as char));
    }
}
