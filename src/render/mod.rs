//! # Rendering Module
//!
//! Turns pages into printable 1-bit label rasters.
//!
//! ## Modules
//!
//! - [`crop`]: Label border detection and whitespace trimming
//! - [`pipeline`]: Grayscale, crop, rotate, scale, center, and threshold
//! - [`bitmap`]: MSB-first packing for the TSPL `BITMAP` payload
//! - [`preview`]: PNG export of the final label
//!
//! ## Usage Example
//!
//! ```
//! use image::{DynamicImage, GrayImage, Luma};
//! use labelbridge::printer::LabelSpec;
//! use labelbridge::render::bitmap::{self, Polarity};
//! use labelbridge::render::pipeline::{ImagePipeline, RasterOptions};
//!
//! let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 600, Luma([255])));
//! let raster = ImagePipeline::new(LabelSpec::SHIPPING_4X6, RasterOptions::default())
//!     .process(&page)?;
//!
//! // Inverted output: the printer marks bits that were white before inversion
//! let payload = bitmap::encode(&raster, Polarity::DarkIsInk);
//! assert_eq!(payload.bytes_per_row(), 101);
//! # Ok::<(), labelbridge::error::FormatError>(())
//! ```

pub mod bitmap;
pub mod crop;
pub mod pipeline;
pub mod preview;

pub use bitmap::{MonoBitmap, Polarity};
pub use pipeline::{ImagePipeline, RasterOptions};
