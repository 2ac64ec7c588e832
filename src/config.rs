//! # Bridge Configuration
//!
//! Settings shared by every print job, loaded from a JSON file. Every field
//! is optional in the file; missing fields take the defaults below.
//!
//! ```json
//! {
//!   "port": "COM5",
//!   "baud_rate": 9600,
//!   "label": { "width_mm": 101, "height_mm": 152, "gap_mm": 2, "dpi": 203 },
//!   "raster": { "invert": false }
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::printer::LabelSpec;
use crate::render::crop::ManualCrop;
use crate::render::pipeline::{DEFAULT_WORKING_DPI, RasterOptions};
use crate::session::TextStyle;
use crate::transport::serial::{DEFAULT_BAUD, DEFAULT_PORT, PortSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Serial device (`/dev/rfcomm0`, `COM5`).
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout in seconds.
    pub read_timeout_secs: f64,
    /// Pause after opening the port, in milliseconds.
    pub settle_ms: u64,
    pub label: LabelSpec,
    pub text: TextStyle,
    pub copies: u32,
    pub raster: RasterOptions,
    /// DPI documents are rendered at before cropping.
    pub render_dpi: u32,
    /// DPI that manual crop coordinates are given in.
    pub reference_dpi: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD,
            read_timeout_secs: 5.0,
            settle_ms: 500,
            label: LabelSpec::default(),
            text: TextStyle::default(),
            copies: 1,
            raster: RasterOptions::default(),
            render_dpi: DEFAULT_WORKING_DPI,
            reference_dpi: ManualCrop::DEFAULT_REFERENCE_DPI,
        }
    }
}

impl BridgeConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("port must not be empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be positive".to_string()));
        }
        if !self.read_timeout_secs.is_finite() || self.read_timeout_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "read_timeout_secs must be a non-negative number, got {}",
                self.read_timeout_secs
            )));
        }
        if self.copies == 0 {
            return Err(ConfigError::Invalid("copies must be at least 1".to_string()));
        }
        if self.render_dpi == 0 || self.reference_dpi == 0 {
            return Err(ConfigError::Invalid("DPI values must be positive".to_string()));
        }
        self.label
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn port_settings(&self) -> PortSettings {
        PortSettings::new(self.port.clone(), self.baud_rate)
            .with_read_timeout(Duration::from_secs_f64(self.read_timeout_secs.max(0.0)))
            .with_settle(Duration::from_millis(self.settle_ms))
    }
}
