//! # Printer Transport Layer
//!
//! This module provides communication backends for sending data to printers.
//!
//! ## Available Transports
//!
//! - [`serial`]: Serial ports, including Bluetooth SPP virtual ports
//! - [`memory`]: Records traffic in memory (tests, dry runs)
//!
//! ## Bluetooth Setup (Linux)
//!
//! The printer must be paired and bound to an RFCOMM device first:
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# pair 00:11:62:XX:XX:XX
//! $ sudo rfcomm bind 0 00:11:62:XX:XX:XX
//! # This creates /dev/rfcomm0
//! ```
//!
//! On Windows the pairing dialog assigns an outgoing COM port (e.g. `COM5`).

pub mod memory;
pub mod serial;

pub use memory::MemoryPorts;
pub use serial::{
    PortInfo, PortOpener, PortSettings, SerialConnection, SystemPorts, list_ports, parse_hex,
};
