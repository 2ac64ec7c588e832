//! # Serial Transport
//!
//! Connection lifecycle for a label printer on a serial port. Bluetooth SPP
//! printers show up as virtual serial ports (`/dev/rfcomm0`, `COM5`), so
//! the same code path serves wired and wireless printers.
//!
//! ## Lifecycle
//!
//! ```text
//!   Disconnected ──connect()──► Connected ──disconnect()──► Disconnected
//!        ▲                          │
//!        └──────── drop ────────────┘
//! ```
//!
//! - `connect()` on an open connection succeeds without reopening.
//! - `disconnect()` on a closed connection is a no-op.
//! - Every write is flushed immediately; the printer gets no partial
//!   commands sitting in a host buffer.
//!
//! ## Framing
//!
//! 8 data bits, no parity, one stop bit, no flow control. Only the baud rate
//! is configurable. XON/XOFF stays off because 0x11 and 0x13 appear in
//! bitmap payloads.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPortType, StopBits};
use tracing::Span;

use crate::error::{ConfigError, ConnectionError, LabelError, RenderError, TransferError};

/// Default port name for the platform.
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM5";
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/rfcomm0";

/// Default baud rate (common for label printers).
pub const DEFAULT_BAUD: u32 = 9600;

/// Default read timeout. Nothing on the print path reads, so this only
/// bounds diagnostics.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause after opening before the port is declared ready. Some Bluetooth
/// bridges accept writes before the virtual port is actually connected and
/// silently drop them.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Parameters for opening a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub settle: Duration,
}

impl PortSettings {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Self::default()
        }
    }

    pub fn with_settle(self, settle: Duration) -> Self {
        Self { settle, ..self }
    }

    pub fn with_read_timeout(self, read_timeout: Duration) -> Self {
        Self {
            read_timeout,
            ..self
        }
    }
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD,
            read_timeout: DEFAULT_READ_TIMEOUT,
            settle: DEFAULT_SETTLE,
        }
    }
}

impl std::fmt::Display for PortSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {} baud", self.port, self.baud_rate)
    }
}

/// Opens byte streams for a [`SerialConnection`].
///
/// [`SystemPorts`] opens real devices; [`MemoryPorts`](super::MemoryPorts)
/// records everything in memory.
pub trait PortOpener {
    type Port: Write + Send;

    fn open(&self, settings: &PortSettings) -> Result<Self::Port, ConnectionError>;
}

/// Opens OS serial ports through the `serialport` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortOpener for SystemPorts {
    type Port = Box<dyn serialport::SerialPort>;

    fn open(&self, settings: &PortSettings) -> Result<Self::Port, ConnectionError> {
        serialport::new(&settings.port, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| open_error(&settings.port, e))
    }
}

fn open_error(port: &str, e: serialport::Error) -> ConnectionError {
    match e.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(_) => {
            ConnectionError::PortUnavailable {
                port: port.to_string(),
                reason: e.to_string(),
            }
        }
        _ => ConnectionError::UnexpectedFailure {
            port: port.to_string(),
            reason: e.to_string(),
        },
    }
}

/// # Serial Connection
///
/// Owns at most one open port.
///
/// ## Example
///
/// ```no_run
/// use labelbridge::transport::{PortSettings, SerialConnection};
///
/// let mut conn = SerialConnection::system(PortSettings::new("/dev/rfcomm0", 9600));
/// conn.connect()?;
/// conn.send_text("SIZE 40 mm, 30 mm\n")?;
/// conn.disconnect();
/// # Ok::<(), labelbridge::error::LabelError>(())
/// ```
pub struct SerialConnection<O: PortOpener = SystemPorts> {
    opener: O,
    settings: PortSettings,
    port: Option<O::Port>,
    span: Span,
}

impl SerialConnection<SystemPorts> {
    /// Connection to a real serial device.
    pub fn system(settings: PortSettings) -> Self {
        Self::new(SystemPorts, settings)
    }
}

impl<O: PortOpener> SerialConnection<O> {
    pub fn new(opener: O, settings: PortSettings) -> Self {
        let span = tracing::info_span!("connection", port = %settings.port);
        Self {
            opener,
            settings,
            port: None,
            span,
        }
    }

    /// Attach events to a caller-provided span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn settings(&self) -> &PortSettings {
        &self.settings
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Change the port settings used by the next `connect()`.
    ///
    /// Fails with `AlreadyOpenMismatch` if the port is open with different
    /// settings; disconnect first.
    pub fn set_settings(&mut self, settings: PortSettings) -> Result<(), ConnectionError> {
        if self.is_connected() && settings != self.settings {
            return Err(ConnectionError::AlreadyOpenMismatch {
                open: self.settings.to_string(),
                requested: settings.to_string(),
            });
        }
        self.settings = settings;
        Ok(())
    }

    /// Open the port. Succeeds immediately if already open.
    pub fn connect(&mut self) -> Result<(), ConnectionError> {
        let _enter = self.span.enter();

        if self.port.is_some() {
            tracing::info!("Already connected to {}", self.settings.port);
            return Ok(());
        }

        tracing::info!(
            "Connecting to {} at {} baud...",
            self.settings.port,
            self.settings.baud_rate
        );
        let port = self.opener.open(&self.settings).inspect_err(|e| {
            tracing::error!(error = %e, "connection failed");
        })?;

        if !self.settings.settle.is_zero() {
            thread::sleep(self.settings.settle);
        }

        self.port = Some(port);
        tracing::info!("Successfully connected to {}", self.settings.port);
        Ok(())
    }

    /// Close the port if open.
    pub fn disconnect(&mut self) {
        if let Some(mut port) = self.port.take() {
            let _enter = self.span.enter();
            // Best effort: the handle is closed on drop regardless
            let _ = port.flush();
            drop(port);
            tracing::info!("Disconnected from {}", self.settings.port);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    /// Write all bytes and flush. Returns the number of bytes written.
    pub fn send_raw(&mut self, data: &[u8]) -> Result<usize, TransferError> {
        let _enter = self.span.enter();

        let Some(port) = self.port.as_mut() else {
            tracing::error!("Printer not connected. Call connect() first.");
            return Err(TransferError::NotConnected);
        };

        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(hex = %hex_dump(data), "sending bytes");
        }

        port.write_all(data).map_err(write_error)?;
        port.flush().map_err(write_error)?;

        tracing::info!("Sent {} bytes to printer", data.len());
        Ok(data.len())
    }

    /// Send UTF-8 text.
    pub fn send_text(&mut self, text: &str) -> Result<usize, TransferError> {
        self.send_raw(text.as_bytes())
    }

    /// Send a file's bytes verbatim.
    pub fn send_file(&mut self, path: &Path) -> Result<usize, LabelError> {
        let data = fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                RenderError::FileNotFound(path.to_path_buf())
            } else {
                RenderError::ReadFailure {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        {
            let _enter = self.span.enter();
            tracing::info!("Reading {} bytes from {}", data.len(), path.display());
        }
        Ok(self.send_raw(&data)?)
    }

    /// Send plain text with no label commands, followed by three newlines.
    ///
    /// Useful for checking whether a port reaches a printer at all.
    pub fn send_plain(&mut self, text: &str) -> Result<usize, TransferError> {
        {
            let _enter = self.span.enter();
            tracing::info!("Sending plain text (no label commands)");
        }
        self.send_text(&format!("{}\n\n\n", text))
    }
}

impl<O: PortOpener> Drop for SerialConnection<O> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn write_error(e: io::Error) -> TransferError {
    if e.kind() == io::ErrorKind::TimedOut {
        TransferError::WriteTimeout(e)
    } else {
        TransferError::WriteFailure(e)
    }
}

/// Space-separated uppercase hex, e.g. `1B 40`.
pub fn hex_dump(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a hex byte string.
///
/// Accepts whitespace or comma separators and optional `0x` prefixes:
/// `"1B 40"`, `"1b,40"`, `"0x1B40"`, `"0x1B 0x40"`.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, ConfigError> {
    let mut digits = String::new();
    for token in input.split(|c: char| c.is_whitespace() || c == ',') {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits.push_str(token);
    }

    if digits.is_empty() {
        return Err(ConfigError::Invalid("empty hex string".to_string()));
    }
    if !digits.is_ascii() {
        return Err(ConfigError::Invalid(format!("invalid hex string: {}", input)));
    }
    if digits.len() % 2 != 0 {
        return Err(ConfigError::Invalid(format!(
            "hex string has an odd number of digits: {}",
            input
        )));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = &digits[i..i + 2];
            u8::from_str_radix(pair, 16)
                .map_err(|_| ConfigError::Invalid(format!("invalid hex byte: {}", pair)))
        })
        .collect()
}

// ============================================================================
// PORT ENUMERATION
// ============================================================================

/// A discovered serial port.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PortInfo {
    pub device: String,
    pub description: String,
    pub manufacturer: Option<String>,
    pub hardware_id: String,
}

/// List serial ports known to the OS.
pub fn list_ports() -> Result<Vec<PortInfo>, ConnectionError> {
    let ports = serialport::available_ports().map_err(|e| ConnectionError::UnexpectedFailure {
        port: "*".to_string(),
        reason: e.to_string(),
    })?;
    Ok(ports.into_iter().map(port_info).collect())
}

fn port_info(port: serialport::SerialPortInfo) -> PortInfo {
    let (description, manufacturer, hardware_id) = match port.port_type {
        SerialPortType::UsbPort(usb) => {
            let hwid = match &usb.serial_number {
                Some(serial) => {
                    format!("USB VID:PID={:04X}:{:04X} SER={}", usb.vid, usb.pid, serial)
                }
                None => format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid),
            };
            let description = usb.product.clone().unwrap_or_else(|| "USB Serial".to_string());
            (description, usb.manufacturer, hwid)
        }
        SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None, "BTHENUM".to_string()),
        SerialPortType::PciPort => ("PCI".to_string(), None, "PCI".to_string()),
        SerialPortType::Unknown => ("n/a".to_string(), None, "n/a".to_string()),
    };
    PortInfo {
        device: port.port_name,
        description,
        manufacturer,
        hardware_id,
    }
}

// ============================================================================
// TESTS
// ============================================================================
