//! # Label Image Pipeline
//!
//! Turns one rendered page into the exact black/white raster that will be
//! printed, at the label's dot resolution.
//!
//! ## Steps
//!
//! ```text
//! source ─► grayscale ─► crop ─► auto-rotate ─► flip ─► scale-to-fit
//!        ─► center on label canvas ─► threshold @128 ─► invert?
//! ```
//!
//! ## Resolutions
//!
//! Three coordinate spaces meet here:
//!
//! | Space | Typical DPI | Used for |
//! |-------|-------------|----------|
//! | Preview | 150 | manual crop rectangles drawn by the user |
//! | Working | 300 | the rendered page that gets cropped |
//! | Label | 203 | the output bitmap |
//!
//! Every step is a pure function from one raster to a new raster, so the
//! pipeline can run on any thread and be re-run whenever an option changes.

use image::{DynamicImage, GrayImage, Luma, imageops, imageops::FilterType};
use serde::{Deserialize, Serialize};

use super::bitmap::MIDPOINT;
use super::crop::{self, ManualCrop};
use crate::error::FormatError;
use crate::printer::LabelSpec;

/// Resolution pages are rendered at before cropping and scaling.
pub const DEFAULT_WORKING_DPI: u32 = 300;

/// Background value of the label canvas (no ink).
const BACKGROUND: u8 = 255;

/// Processing options supplied with a print request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Detect the label border (or content bounds) and crop to it.
    pub auto_crop: bool,

    /// Rotate 90° when the page and label orientations differ.
    pub auto_rotate: bool,

    /// Rotate 180° to correct top/bottom mounting.
    pub flip_vertical: bool,

    /// Flip every pixel's polarity before encoding.
    pub invert: bool,

    /// Explicit crop; takes precedence over `auto_crop`.
    pub manual_crop: Option<ManualCrop>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            auto_crop: true,
            auto_rotate: true,
            flip_vertical: false,
            invert: true,
            manual_crop: None,
        }
    }
}

/// # Image Pipeline
///
/// Holds the label geometry and options for one print request.
///
/// ## Example
///
/// ```
/// use image::{DynamicImage, GrayImage, Luma};
/// use labelbridge::printer::LabelSpec;
/// use labelbridge::render::pipeline::{ImagePipeline, RasterOptions};
///
/// let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(612, 792, Luma([255])));
/// let pipeline = ImagePipeline::new(LabelSpec::SHIPPING_4X6, RasterOptions::default());
/// let label = pipeline.process(&page)?;
/// assert_eq!(label.dimensions(), LabelSpec::SHIPPING_4X6.target_dots());
/// # Ok::<(), labelbridge::error::FormatError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ImagePipeline {
    label: LabelSpec,
    options: RasterOptions,
    working_dpi: u32,
}

impl ImagePipeline {
    pub fn new(label: LabelSpec, options: RasterOptions) -> Self {
        Self {
            label,
            options,
            working_dpi: DEFAULT_WORKING_DPI,
        }
    }

    /// Resolution the source raster was rendered at.
    pub fn with_working_dpi(self, working_dpi: u32) -> Self {
        Self {
            working_dpi,
            ..self
        }
    }

    pub fn label(&self) -> &LabelSpec {
        &self.label
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    pub fn working_dpi(&self) -> u32 {
        self.working_dpi
    }

    /// Run every step, including inversion.
    pub fn process(&self, source: &DynamicImage) -> Result<GrayImage, FormatError> {
        let image = self.preview(source)?;
        if self.options.invert {
            Ok(invert(&image))
        } else {
            Ok(image)
        }
    }

    /// Run every step except inversion: what the label should look like.
    pub fn preview(&self, source: &DynamicImage) -> Result<GrayImage, FormatError> {
        self.label.validate()?;
        let target = self.label.target_dots();

        let gray = to_grayscale(source);
        tracing::debug!(width = gray.width(), height = gray.height(), "source raster");

        let mut image = self.crop(&gray)?;
        tracing::debug!(width = image.width(), height = image.height(), "after crop");

        if self.options.auto_rotate {
            image = auto_rotate(&image, target);
        }
        if self.options.flip_vertical {
            image = flip_vertical(&image);
        }

        let scaled = scale_to_fit(&image, target);
        tracing::debug!(
            width = scaled.width(),
            height = scaled.height(),
            target_width = target.0,
            target_height = target.1,
            "scaled to label"
        );

        Ok(binarize(&compose(&scaled, target)))
    }

    fn crop(&self, image: &GrayImage) -> Result<GrayImage, FormatError> {
        if let Some(manual) = &self.options.manual_crop {
            let region = manual.resolve(self.working_dpi, image.width(), image.height())?;
            tracing::info!(?region, dpi = self.working_dpi, "manual crop applied");
            region.apply(image)
        } else if self.options.auto_crop {
            Ok(crop::crop_to_label(image))
        } else {
            Ok(image.clone())
        }
    }
}

// ============================================================================
// STEPS
// ============================================================================

/// Convert to single-channel 8-bit.
///
/// Transparent pixels are flattened onto white so that an RGBA export does
/// not come out as a black page.
pub fn to_grayscale(source: &DynamicImage) -> GrayImage {
    if !source.color().has_alpha() {
        return source.to_luma8();
    }
    let la = source.to_luma_alpha8();
    GrayImage::from_fn(la.width(), la.height(), |x, y| {
        let [l, a] = la.get_pixel(x, y).0;
        let (l, a) = (l as u32, a as u32);
        Luma([((l * a + BACKGROUND as u32 * (255 - a)) / 255) as u8])
    })
}

/// Rotate 90° counter-clockwise if the image and target orientations
/// differ. The canvas grows to fit; nothing is cut off.
pub fn auto_rotate(image: &GrayImage, target: (u32, u32)) -> GrayImage {
    let image_landscape = image.width() > image.height();
    let label_landscape = target.0 > target.1;
    if image_landscape != label_landscape {
        tracing::info!("rotating image 90 degrees to fit label orientation");
        imageops::rotate270(image)
    } else {
        image.clone()
    }
}

/// Turn the image upside down without mirroring it.
pub fn flip_vertical(image: &GrayImage) -> GrayImage {
    imageops::rotate180(image)
}

/// Size of `(width, height)` scaled uniformly to fit inside `target`.
pub fn fit_dimensions(width: u32, height: u32, target: (u32, u32)) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale_w = target.0 as f64 / width as f64;
    let scale_h = target.1 as f64 / height as f64;
    let scale = scale_w.min(scale_h);

    let w = ((width as f64 * scale).round() as u32).clamp(1, target.0.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, target.1.max(1));
    (w, h)
}

/// Resize to fit inside `target` without distortion (Lanczos3).
pub fn scale_to_fit(image: &GrayImage, target: (u32, u32)) -> GrayImage {
    let (w, h) = fit_dimensions(image.width(), image.height(), target);
    if (w, h) == (0, 0) {
        return GrayImage::new(0, 0);
    }
    imageops::resize(image, w, h, FilterType::Lanczos3)
}

/// Paste `image` centered on a blank label-sized canvas.
pub fn compose(image: &GrayImage, target: (u32, u32)) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(target.0, target.1, Luma([BACKGROUND]));
    let x = (target.0 as i64 - image.width() as i64) / 2;
    let y = (target.1 as i64 - image.height() as i64) / 2;
    imageops::overlay(&mut canvas, image, x, y);
    canvas
}

/// Threshold at the midpoint to strict black (0) and white (255).
pub fn binarize(image: &GrayImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] < MIDPOINT {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Flip every pixel's polarity.
pub fn invert(image: &GrayImage) -> GrayImage {
    let mut out = image.clone();
    imageops::invert(&mut out);
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::crop::CropRegion;
    use image::{LumaA, Rgb, RgbImage};

    fn page(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    fn no_crop() -> RasterOptions {
        RasterOptions {
            auto_crop: false,
            invert: false,
            ..RasterOptions::default()
        }
    }

    #[test]
    fn test_default_options() {
        let opts = RasterOptions::default();
        assert!(opts.auto_crop);
        assert!(opts.auto_rotate);
        assert!(!opts.flip_vertical);
        assert!(opts.invert);
        assert!(opts.manual_crop.is_none());
    }

    #[test]
    fn test_grayscale_from_rgb() {
        let rgb = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let gray = to_grayscale(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(gray.dimensions(), (4, 4));
        assert!(gray.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_grayscale_flattens_transparency_to_white() {
        let la = image::GrayAlphaImage::from_pixel(2, 2, LumaA([0, 0]));
        let gray = to_grayscale(&DynamicImage::ImageLumaA8(la));
        assert!(gray.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_auto_rotate_skipped_when_orientation_matches() {
        let img = page(612, 792);
        let out = auto_rotate(&img, (807, 1215));
        assert_eq!(out, img);
    }

    #[test]
    fn test_auto_rotate_landscape_to_portrait() {
        let mut img = page(300, 100);
        img.put_pixel(0, 0, Luma([0]));
        let out = auto_rotate(&img, (807, 1215));
        assert_eq!(out.dimensions(), (100, 300));
        // Counter-clockwise: top-left moves to bottom-left
        assert_eq!(out.get_pixel(0, 299)[0], 0);
    }

    #[test]
    fn test_flip_is_rotation_not_mirror() {
        let mut img = page(10, 20);
        img.put_pixel(1, 2, Luma([0]));
        let out = flip_vertical(&img);
        assert_eq!(out.dimensions(), (10, 20));
        assert_eq!(out.get_pixel(8, 17)[0], 0);
    }

    #[test]
    fn test_fit_dimensions_uses_smaller_ratio() {
        // min(807/612, 1215/792) = 807/612
        assert_eq!(fit_dimensions(612, 792, (807, 1215)), (807, 1044));
        assert_eq!(fit_dimensions(1000, 100, (500, 500)), (500, 50));
        assert_eq!(fit_dimensions(0, 100, (500, 500)), (0, 0));
    }

    #[test]
    fn test_compose_centers() {
        let img = GrayImage::from_pixel(4, 2, Luma([0]));
        let canvas = compose(&img, (10, 6));
        assert_eq!(canvas.dimensions(), (10, 6));
        assert_eq!(canvas.get_pixel(3, 2)[0], 0);
        assert_eq!(canvas.get_pixel(6, 3)[0], 0);
        assert_eq!(canvas.get_pixel(2, 2)[0], 255);
        assert_eq!(canvas.get_pixel(7, 2)[0], 255);
        assert_eq!(canvas.get_pixel(3, 1)[0], 255);
        assert_eq!(canvas.get_pixel(3, 4)[0], 255);
    }

    #[test]
    fn test_binarize_threshold() {
        let img = GrayImage::from_fn(4, 1, |x, _| Luma([[0, 127, 128, 255][x as usize]]));
        let out = binarize(&img);
        let values: Vec<u8> = out.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_invert() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }]));
        let out = invert(&img);
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_letter_page_on_shipping_label() {
        // 612x792 portrait page on a portrait 4x6 label: no rotation,
        // scaled by min(807/612, 1215/792) and centered vertically.
        let src = GrayImage::from_pixel(612, 792, Luma([0]));
        let pipeline = ImagePipeline::new(LabelSpec::SHIPPING_4X6, no_crop());
        let out = pipeline.process(&DynamicImage::ImageLuma8(src)).unwrap();

        assert_eq!(out.dimensions(), (807, 1215));
        let y_offset = (1215 - 1044) / 2;
        assert_eq!(out.get_pixel(403, y_offset - 1)[0], 255);
        assert_eq!(out.get_pixel(403, y_offset + 1)[0], 0);
        assert_eq!(out.get_pixel(0, 600)[0], 0);
        assert_eq!(out.get_pixel(806, 600)[0], 0);
        assert_eq!(out.get_pixel(403, y_offset + 1044 + 1)[0], 255);
    }

    #[test]
    fn test_output_is_strictly_monochrome() {
        let src = GrayImage::from_fn(300, 400, |x, y| Luma([((x + y) % 256) as u8]));
        let pipeline = ImagePipeline::new(LabelSpec::SMALL_2X1, RasterOptions::default());
        let out = pipeline.process(&DynamicImage::ImageLuma8(src)).unwrap();
        assert_eq!(out.dimensions(), (400, 200));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_invert_applies_after_binarize() {
        let src = page(100, 100);
        let opts = RasterOptions {
            invert: true,
            ..no_crop()
        };
        let pipeline = ImagePipeline::new(LabelSpec::SQUARE_4X4, opts);
        let out = pipeline.process(&DynamicImage::ImageLuma8(src.clone())).unwrap();
        assert!(out.pixels().all(|p| p[0] == 0));

        let preview = pipeline.preview(&DynamicImage::ImageLuma8(src)).unwrap();
        assert!(preview.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_manual_crop_takes_precedence() {
        let mut src = page(600, 600);
        // Dark block only inside the manual region (working space 100..200)
        for y in 100..200 {
            for x in 100..200 {
                src.put_pixel(x, y, Luma([0]));
            }
        }
        let opts = RasterOptions {
            manual_crop: Some(ManualCrop::new(CropRegion::new(50, 50, 100, 100), 150)),
            auto_crop: true,
            auto_rotate: false,
            invert: false,
            flip_vertical: false,
        };
        let pipeline = ImagePipeline::new(LabelSpec::SQUARE_4X4, opts);
        let out = pipeline.process(&DynamicImage::ImageLuma8(src)).unwrap();
        // The whole label is filled by the dark crop
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_manual_crop_outside_image_is_error() {
        let opts = RasterOptions {
            manual_crop: Some(ManualCrop::new(CropRegion::new(900, 900, 950, 950), 150)),
            ..no_crop()
        };
        let pipeline = ImagePipeline::new(LabelSpec::SQUARE_4X4, opts);
        let result = pipeline.process(&DynamicImage::ImageLuma8(page(600, 600)));
        assert!(matches!(result, Err(FormatError::InvalidCropRegion { .. })));
    }

    #[test]
    fn test_invalid_label_rejected() {
        let label = LabelSpec {
            width_mm: 0.0,
            ..LabelSpec::default()
        };
        let pipeline = ImagePipeline::new(label, no_crop());
        let result = pipeline.process(&DynamicImage::ImageLuma8(page(10, 10)));
        assert!(matches!(result, Err(FormatError::InvalidLabelSpec(_))));
    }

    #[test]
    fn test_oversized_label_rejected_before_allocating() {
        let label = LabelSpec {
            width_mm: 1.0e8,
            height_mm: 1.0e8,
            ..LabelSpec::default()
        };
        let pipeline = ImagePipeline::new(label, no_crop());
        let result = pipeline.process(&DynamicImage::ImageLuma8(page(10, 10)));
        assert!(matches!(result, Err(FormatError::InvalidLabelSpec(_))));
    }

    #[test]
    fn test_empty_source_yields_blank_label() {
        let pipeline = ImagePipeline::new(LabelSpec::SMALL_2X1, no_crop());
        let out = pipeline
            .process(&DynamicImage::ImageLuma8(GrayImage::new(0, 0)))
            .unwrap();
        assert_eq!(out.dimensions(), (400, 200));
        assert!(out.pixels().all(|p| p[0] == 255));
    }
}
