//! # TSPL Protocol Implementation
//!
//! This module provides command builders for the TSPL label language used
//! by TSC-compatible thermal label printers. Builders are pure: they return
//! strings or byte buffers and perform no I/O.
//!
//! ## Module Structure
//!
//! - [`commands`]: Label setup and print (SIZE, GAP, DIRECTION, CLS, PRINT)
//! - [`text`]: Resident-font text (TEXT)
//! - [`graphics`]: 1-bit images (BITMAP)
//! - [`label`]: Complete label streams ready for the transport
//!
//! ## Usage Example
//!
//! ```
//! use labelbridge::printer::LabelSpec;
//! use labelbridge::protocol::{commands, text};
//!
//! let label = LabelSpec::TEXT_DEFAULT;
//! let mut script = commands::header(&label);
//! script.push_str(&text::text_block("Hello\nWorld", text::DEFAULT_FONT, text::Position::default()));
//! script.push_str(&commands::trailer(1));
//!
//! // Send `script` to printer via transport...
//! ```

pub mod commands;
pub mod graphics;
pub mod label;
pub mod text;

pub use label::LabelCommand;
