//! # Error Types
//!
//! This module defines error types used throughout the labelbridge library.
//!
//! Each stage of a print request has its own family so callers can match on
//! exactly what went wrong; [`LabelError`] wraps them all for the
//! orchestration layer, which returns the first failure it meets.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while opening or configuring the serial link.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The device could not be opened (missing, busy, or permission denied).
    #[error("Port {port} is unavailable: {reason}")]
    PortUnavailable { port: String, reason: String },

    /// The connection is open with different settings than requested.
    #[error("Port {open} is already open; disconnect before switching to {requested}")]
    AlreadyOpenMismatch { open: String, requested: String },

    /// Any other transport-level failure while connecting.
    #[error("Unexpected error connecting to {port}: {reason}")]
    UnexpectedFailure { port: String, reason: String },
}

/// Failures while writing to an open link.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Printer not connected")]
    NotConnected,

    #[error("Write timed out: {0}")]
    WriteTimeout(std::io::Error),

    #[error("Write failed: {0}")]
    WriteFailure(std::io::Error),
}

/// Invalid geometry handed to the builders or the image pipeline.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Crop region with zero or negative area after clamping.
    #[error("Invalid crop region ({left}, {top}) to ({right}, {bottom})")]
    InvalidCropRegion {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    },

    /// Manual crop drawn at a reference resolution of zero.
    #[error("Invalid crop reference DPI: {dpi}")]
    InvalidCropReference { dpi: u32 },

    /// Label dimension that is not strictly positive, or too large to rasterize.
    #[error("Invalid label spec: {0}")]
    InvalidLabelSpec(String),
}

/// Failures loading documents or saving images.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Document not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Document has no pages: {}", .0.display())]
    EmptyDocument(PathBuf),

    #[error("Failed to decode {}: {reason}", path.display())]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("Failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Encoding or writing an output image failed.
    #[error("Failed to save {}: {reason}", path.display())]
    SaveFailure { path: PathBuf, reason: String },
}

/// A feature that was not compiled into this build.
#[derive(Debug, Error)]
#[error("{0} support is not available in this build")]
pub struct CapabilityUnavailable(pub &'static str);

/// Failures loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Main error type for labelbridge operations
#[derive(Debug, Error)]
pub enum LabelError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Capability(#[from] CapabilityUnavailable),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Background task failed to complete (panicked or was cancelled).
    #[error("Print task failed: {0}")]
    Task(String),
}
