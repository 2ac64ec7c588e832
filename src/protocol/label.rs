//! # Complete Label Commands
//!
//! Assembles the setup, drawing, and print commands into the exact byte
//! stream for one label.
//!
//! ## Stream Layout
//!
//! ```text
//! Text label (one write):
//!   SIZE / GAP / DIRECTION / CLS / TEXT... / PRINT n / <blank line>
//!
//! Bitmap label (three writes, in this order):
//!   1. SIZE / GAP / DIRECTION / CLS / "BITMAP x,y,wb,h,0,"
//!   2. wb * h raw bytes
//!   3. PRINT n / <blank line>
//! ```
//!
//! The printer parses header text, then a fixed-length binary block, then
//! trailing text. The write segments are kept separate so the transport
//! can send them in that order without re-framing.

use super::{commands, graphics, text};
use crate::printer::LabelSpec;
use crate::render::bitmap::MonoBitmap;

/// An immutable, fully rendered label command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCommand {
    segments: Vec<Vec<u8>>,
}

impl LabelCommand {
    /// Build a text label: one TEXT command per non-blank line.
    ///
    /// ## Example
    ///
    /// ```
    /// use labelbridge::printer::LabelSpec;
    /// use labelbridge::protocol::{label::LabelCommand, text::Position};
    ///
    /// let cmd = LabelCommand::text(&LabelSpec::TEXT_DEFAULT, "Hi", "2", Position::default(), 1);
    /// assert_eq!(
    ///     cmd.to_bytes(),
    ///     b"SIZE 40 mm, 30 mm\nGAP 2 mm, 0 mm\nDIRECTION 1\nCLS\nTEXT 10,10,\"2\",0,1,1,\"Hi\"\nPRINT 1\n\n"
    /// );
    /// ```
    pub fn text(
        label: &LabelSpec,
        content: &str,
        font: &str,
        position: text::Position,
        copies: u32,
    ) -> Self {
        let mut script = commands::header(label);
        script.push_str(&text::text_block(content, font, position));
        script.push_str(&commands::trailer(copies));
        Self {
            segments: vec![script.into_bytes()],
        }
    }

    /// Build a bitmap label with the image at the top-left corner.
    pub fn bitmap(label: &LabelSpec, bitmap: &MonoBitmap, copies: u32) -> Self {
        let mut head = commands::header(label);
        head.push_str(&graphics::bitmap_header(
            0,
            0,
            bitmap.bytes_per_row() as u32,
            bitmap.height(),
        ));
        Self {
            segments: vec![
                head.into_bytes(),
                bitmap.data().to_vec(),
                commands::trailer(copies).into_bytes(),
            ],
        }
    }

    /// Write segments in the order they must reach the printer.
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    /// Whether this command carries a binary payload.
    pub fn has_payload(&self) -> bool {
        self.segments.len() > 1
    }

    /// The whole stream as one buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.segments.concat()
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
