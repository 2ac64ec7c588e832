//! # Page Rasterizer
//!
//! Documents reach the image pipeline as a rendered first page. The
//! [`PageRasterizer`] trait is the seam: anything that can turn a path and a
//! DPI into a raster plugs in here (an image decoder, a PDF renderer).
//!
//! Whether raster input is available is decided at compile time by the
//! `raster` cargo feature and reported once through [`capabilities`].

use std::path::Path;

use image::DynamicImage;

use crate::error::{CapabilityUnavailable, RenderError};

/// Renders the first page of a document.
pub trait PageRasterizer {
    /// Page 0 of `path`, rendered at `dpi`.
    fn render_first_page(&self, path: &Path, dpi: u32) -> Result<DynamicImage, RenderError>;
}

/// Compile-time feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Capabilities {
    /// Image files can be decoded and printed as documents.
    pub raster: bool,
}

/// Report what this build supports.
pub const fn capabilities() -> Capabilities {
    Capabilities {
        raster: cfg!(feature = "raster"),
    }
}

/// A rasterizer that can move to a worker thread.
pub type SharedRasterizer = Box<dyn PageRasterizer + Send + Sync>;

/// The rasterizer compiled into this build.
#[cfg(feature = "raster")]
pub fn default_rasterizer() -> Result<SharedRasterizer, CapabilityUnavailable> {
    Ok(Box::new(ImageFileRasterizer::default()))
}

#[cfg(not(feature = "raster"))]
pub fn default_rasterizer() -> Result<SharedRasterizer, CapabilityUnavailable> {
    Err(CapabilityUnavailable("Raster document"))
}

/// Treats an image file (PNG, JPEG, ...) as an already-rendered page.
///
/// The file is assumed to have been produced at `native_dpi`; it is resampled
/// when a different DPI is requested.
#[cfg(feature = "raster")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFileRasterizer {
    pub native_dpi: u32,
}

#[cfg(feature = "raster")]
impl ImageFileRasterizer {
    pub fn new(native_dpi: u32) -> Self {
        Self { native_dpi }
    }
}

#[cfg(feature = "raster")]
impl Default for ImageFileRasterizer {
    fn default() -> Self {
        Self {
            native_dpi: crate::render::pipeline::DEFAULT_WORKING_DPI,
        }
    }
}

#[cfg(feature = "raster")]
impl PageRasterizer for ImageFileRasterizer {
    fn render_first_page(&self, path: &Path, dpi: u32) -> Result<DynamicImage, RenderError> {
        if !path.exists() {
            return Err(RenderError::FileNotFound(path.to_path_buf()));
        }

        let decode_failure = |reason: String| RenderError::DecodeFailure {
            path: path.to_path_buf(),
            reason,
        };

        let page = image::ImageReader::open(path)
            .map_err(|e| decode_failure(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_failure(e.to_string()))?
            .decode()
            .map_err(|e| decode_failure(e.to_string()))?;

        if page.width() == 0 || page.height() == 0 {
            return Err(RenderError::EmptyDocument(path.to_path_buf()));
        }

        tracing::debug!(
            path = %path.display(),
            width = page.width(),
            height = page.height(),
            native_dpi = self.native_dpi,
            dpi,
            "page decoded"
        );

        if dpi == self.native_dpi || self.native_dpi == 0 || dpi == 0 {
            return Ok(page);
        }

        let ratio = dpi as f64 / self.native_dpi as f64;
        let width = ((page.width() as f64 * ratio).round() as u32).max(1);
        let height = ((page.height() as f64 * ratio).round() as u32).max(1);
        Ok(page.resize_exact(width, height, image::imageops::FilterType::Lanczos3))
    }
}
