//! # TSPL Text Commands
//!
//! Draws resident-font text into the label buffer.
//!
//! ## TEXT Syntax
//!
//! ```text
//! TEXT x,y,"font",rotation,x-multiplication,y-multiplication,"content"
//! ```
//!
//! Multi-line input is split on `\n`; every non-blank line becomes its own
//! TEXT command, advancing downward by a fixed line pitch.

/// Vertical advance between consecutive text lines, in dots.
pub const LINE_ADVANCE: u32 = 40;

/// Default resident font ("2" is 12x20 dots on most TSPL printers).
pub const DEFAULT_FONT: &str = "2";

/// Position of the first text line in dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 10, y: 10 }
    }
}

/// Escape embedded double quotes as `\"`.
pub fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}

/// # Single TEXT Command
///
/// ## Example
///
/// ```
/// use labelbridge::protocol::text;
///
/// assert_eq!(
///     text::text_line(10, 10, "2", "Hello"),
///     "TEXT 10,10,\"2\",0,1,1,\"Hello\"\n"
/// );
/// ```
pub fn text_line(x: u32, y: u32, font: &str, content: &str) -> String {
    format!(
        "TEXT {},{},\"{}\",0,1,1,\"{}\"\n",
        x,
        y,
        font,
        escape(content)
    )
}

/// TEXT commands for every non-blank line of `text`.
///
/// Blank lines (empty or whitespace only) are skipped and do not consume
/// vertical space.
pub fn text_block(text: &str, font: &str, position: Position) -> String {
    let mut cmd = String::new();
    let mut y = position.y;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        cmd.push_str(&text_line(position.x, y, font, line));
        y += LINE_ADVANCE;
    }
    cmd
}
