//! # Labelbridge - TSPL Label Printing Library
//!
//! Labelbridge prints labels on TSPL thermal label printers reachable over a
//! serial link (USB serial or a Bluetooth SPP virtual port). It provides:
//!
//! - **Protocol implementation**: byte-exact TSPL command builders
//! - **Image pipeline**: label border detection, rotation, scaling and
//!   thresholding of rendered documents
//! - **Bitmap packing**: MSB-first 1-bit payloads for `BITMAP`
//! - **Transport**: serial connection lifecycle
//! - **Session and worker**: one-call print jobs, optionally on a background task
//!
//! ## Quick Start
//!
//! ```no_run
//! use labelbridge::{
//!     printer::LabelSpec,
//!     session::{LabelSession, TextStyle},
//!     transport::{PortSettings, SerialConnection},
//! };
//!
//! let connection = SerialConnection::system(PortSettings::new("/dev/rfcomm0", 9600));
//! let mut session = LabelSession::new(connection);
//!
//! session.connect()?;
//! session.print_text_label(
//!     "Order #1234\nFragile",
//!     &LabelSpec::TEXT_DEFAULT,
//!     &TextStyle::default(),
//!     1,
//! )?;
//! session.disconnect();
//!
//! # Ok::<(), labelbridge::error::LabelError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | TSPL command builders |
//! | [`render`] | Image pipeline, cropping, bitmap packing |
//! | [`transport`] | Serial connection |
//! | [`page`] | Document page rasterizers |
//! | [`session`] | Print orchestration |
//! | [`worker`] | Background print worker |
//! | [`printer`] | Label geometry |
//! | [`config`] | Configuration file |
//! | [`error`] | Error types |

pub mod config;
pub mod error;
pub mod page;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod session;
pub mod transport;
pub mod worker;

// Re-exports for convenience
pub use config::BridgeConfig;
pub use error::LabelError;
pub use printer::LabelSpec;
pub use session::{LabelSession, PrintContent, PrintOutcome, PrintRequest};
pub use transport::SerialConnection;
