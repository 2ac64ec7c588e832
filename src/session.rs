//! # Print Session
//!
//! Drives one print job end to end: label geometry and content in, bytes on
//! the wire out.
//!
//! ## Entry Points
//!
//! | Method | Writes |
//! |--------|--------|
//! | [`LabelSession::print_raw`] | the bytes, unchanged |
//! | [`LabelSession::print_text_label`] | one write: header, TEXT lines, PRINT |
//! | [`LabelSession::print_raster_label`] | three writes: header + BITMAP, payload, PRINT |
//! | [`LabelSession::print_document`] | rasterize page 0, then as a raster label |
//!
//! These require an open connection and never connect on their own. The
//! first failure aborts the job and closes the connection, so a session is
//! always left disconnected after an error.
//!
//! [`LabelSession::run`] is the front-end contract: it connects, prints one
//! [`PrintRequest`] and always disconnects, reporting a [`PrintOutcome`].

use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::error::{CapabilityUnavailable, LabelError, TransferError};
use crate::page::{self, SharedRasterizer};
use crate::printer::LabelSpec;
use crate::protocol::LabelCommand;
use crate::protocol::text::{DEFAULT_FONT, Position};
use crate::render::bitmap::{self, Polarity};
use crate::render::pipeline::{DEFAULT_WORKING_DPI, ImagePipeline, RasterOptions};
use crate::transport::{PortOpener, SerialConnection, SystemPorts};

/// Font and placement for text labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font: String,
    pub position: Position,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            position: Position::default(),
        }
    }
}

/// What to print.
#[derive(Debug, Clone)]
pub enum PrintContent {
    /// Bytes forwarded as-is.
    Raw(Vec<u8>),
    /// Text laid out with resident fonts.
    Text(String),
    /// A document file; its first page is rasterized.
    Document(PathBuf),
    /// An already-rendered page.
    Raster(DynamicImage),
}

impl PrintContent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Text(_) => "text",
            Self::Document(_) => "document",
            Self::Raster(_) => "raster",
        }
    }
}

/// A complete print request from a front end.
#[derive(Debug, Clone)]
pub struct PrintRequest {
    pub content: PrintContent,
    pub label: LabelSpec,
    pub options: RasterOptions,
    pub text: TextStyle,
    pub copies: u32,
}

impl PrintRequest {
    pub fn new(content: PrintContent, label: LabelSpec) -> Self {
        Self {
            content,
            label,
            options: RasterOptions::default(),
            text: TextStyle::default(),
            copies: 1,
        }
    }

    pub fn with_options(self, options: RasterOptions) -> Self {
        Self { options, ..self }
    }

    pub fn with_text_style(self, text: TextStyle) -> Self {
        Self { text, ..self }
    }

    pub fn with_copies(self, copies: u32) -> Self {
        Self { copies, ..self }
    }
}

/// Result reported back to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOutcome {
    pub success: bool,
    pub message: String,
}

impl PrintOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// # Label Session
///
/// Owns the printer connection and the page rasterizer.
///
/// ## Example
///
/// ```
/// use labelbridge::printer::LabelSpec;
/// use labelbridge::session::{LabelSession, PrintContent, PrintRequest};
/// use labelbridge::transport::{MemoryPorts, PortSettings, SerialConnection};
/// use std::time::Duration;
///
/// let ports = MemoryPorts::new();
/// let settings = PortSettings::new("mem0", 9600).with_settle(Duration::ZERO);
/// let mut session = LabelSession::new(SerialConnection::new(ports.clone(), settings));
///
/// let outcome = session.run(PrintRequest::new(
///     PrintContent::Text("Hello".into()),
///     LabelSpec::TEXT_DEFAULT,
/// ));
/// assert!(outcome.success);
/// assert!(!session.is_connected());
/// assert!(ports.bytes().ends_with(b"PRINT 1\n\n"));
/// ```
pub struct LabelSession<O: PortOpener = SystemPorts> {
    connection: SerialConnection<O>,
    rasterizer: Option<SharedRasterizer>,
    working_dpi: u32,
    span: Span,
}

impl<O: PortOpener> LabelSession<O> {
    /// Session using the rasterizer compiled into this build, if any.
    pub fn new(connection: SerialConnection<O>) -> Self {
        Self {
            connection,
            rasterizer: page::default_rasterizer().ok(),
            working_dpi: DEFAULT_WORKING_DPI,
            span: tracing::info_span!("session"),
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: SharedRasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// DPI documents are rendered at before cropping.
    pub fn with_working_dpi(mut self, working_dpi: u32) -> Self {
        self.working_dpi = working_dpi;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn connection(&self) -> &SerialConnection<O> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut SerialConnection<O> {
        &mut self.connection
    }

    pub fn connect(&mut self) -> Result<(), LabelError> {
        Ok(self.connection.connect()?)
    }

    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Forward bytes unchanged. Returns the number of bytes written.
    pub fn print_raw(&mut self, data: &[u8]) -> Result<usize, LabelError> {
        self.guarded(|session| {
            session.require_connected()?;
            Ok(session.connection.send_raw(data)?)
        })
    }

    /// Print `text` with one TEXT command per non-blank line.
    pub fn print_text_label(
        &mut self,
        text: &str,
        label: &LabelSpec,
        style: &TextStyle,
        copies: u32,
    ) -> Result<(), LabelError> {
        self.guarded(|session| {
            session.require_connected()?;
            label.validate()?;
            let command = LabelCommand::text(label, text, &style.font, style.position, copies);
            session.send(&command)
        })
    }

    /// Process `source` through the image pipeline and print it as a bitmap.
    pub fn print_raster_label(
        &mut self,
        source: &DynamicImage,
        label: &LabelSpec,
        options: &RasterOptions,
        copies: u32,
    ) -> Result<(), LabelError> {
        self.guarded(|session| {
            session.require_connected()?;
            let command = session.raster_command(source, label, options, copies)?;
            session.send(&command)
        })
    }

    /// Rasterize page 0 of `path` and print it as a bitmap.
    pub fn print_document(
        &mut self,
        path: &Path,
        label: &LabelSpec,
        options: &RasterOptions,
        copies: u32,
    ) -> Result<(), LabelError> {
        self.guarded(|session| {
            session.require_connected()?;
            let rasterizer = session
                .rasterizer
                .as_ref()
                .ok_or(CapabilityUnavailable("Raster document"))?;
            let page = rasterizer.render_first_page(path, session.working_dpi)?;
            let command = session.raster_command(&page, label, options, copies)?;
            session.send(&command)
        })
    }

    /// Connect, print one request, and disconnect.
    pub fn run(&mut self, request: PrintRequest) -> PrintOutcome {
        let span = self.span.clone();
        let _enter = span.enter();
        tracing::info!(kind = request.content.kind(), "print request");

        let result = self.connect().and_then(|()| self.dispatch(&request));
        self.disconnect();

        match result {
            Ok(message) => {
                tracing::info!("{}", message);
                PrintOutcome::success(message)
            }
            Err(e) => PrintOutcome::failure(format!("Print failed: {}", e)),
        }
    }

    fn dispatch(&mut self, request: &PrintRequest) -> Result<String, LabelError> {
        let PrintRequest {
            content,
            label,
            options,
            text,
            copies,
        } = request;
        match content {
            PrintContent::Raw(data) => {
                let sent = self.print_raw(data)?;
                Ok(format!("Sent {} bytes to printer", sent))
            }
            PrintContent::Text(body) => {
                self.print_text_label(body, label, text, *copies)?;
                Ok("Text label printed successfully".to_string())
            }
            PrintContent::Document(path) => {
                self.print_document(path, label, options, *copies)?;
                Ok(format!("Label printed from {}", path.display()))
            }
            PrintContent::Raster(image) => {
                self.print_raster_label(image, label, options, *copies)?;
                Ok("Image label printed successfully".to_string())
            }
        }
    }

    fn raster_command(
        &self,
        source: &DynamicImage,
        label: &LabelSpec,
        options: &RasterOptions,
        copies: u32,
    ) -> Result<LabelCommand, LabelError> {
        let raster = ImagePipeline::new(*label, *options)
            .with_working_dpi(self.working_dpi)
            .process(source)?;
        let bitmap = bitmap::encode(&raster, Polarity::DarkIsInk);
        tracing::info!(
            "Converting image to bitmap: {}x{} pixels, {} bytes per row",
            bitmap.width(),
            bitmap.height(),
            bitmap.bytes_per_row()
        );
        Ok(LabelCommand::bitmap(label, &bitmap, copies))
    }

    /// Send each segment in order; the first failure stops the rest.
    fn send(&mut self, command: &LabelCommand) -> Result<(), LabelError> {
        for segment in command.segments() {
            self.connection.send_raw(segment)?;
        }
        Ok(())
    }

    fn require_connected(&self) -> Result<(), TransferError> {
        if self.connection.is_connected() {
            Ok(())
        } else {
            Err(TransferError::NotConnected)
        }
    }

    /// Run `op`; on failure, log and close the connection.
    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, LabelError>,
    ) -> Result<T, LabelError> {
        let result = op(self);
        if let Err(e) = &result {
            let _enter = self.span.enter();
            tracing::error!(error = %e, "print failed");
            self.connection.disconnect();
        }
        result
    }
}

// ============================================================================
// TESTS
// ============================================================================
