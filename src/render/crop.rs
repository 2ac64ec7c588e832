//! # Crop Detection
//!
//! Finds the part of a rendered page that belongs on the label.
//!
//! ## Strategies
//!
//! | Strategy | When | How |
//! |----------|------|-----|
//! | Manual | caller supplied a region | rescale from the reference DPI, clamp |
//! | Boundary | default for documents | scan for dense border lines |
//! | Whitespace | boundary scan failed | bounding box of non-white pixels |
//!
//! ## Boundary Heuristic
//!
//! Shipping-label PDFs usually draw the label as a (dashed) rectangle near
//! the top of the page, with return instructions or a packing slip below
//! it. The scan works on dark-pixel counts per row and per column:
//!
//! ```text
//!   ┌──────────────────────┐  <- top: first dense row past the top 2%
//!   │  SHIP TO ...         │
//!   │  ||||| barcode ||||  │
//!   └──────────────────────┘  <- bottom: start of the first >20px gap
//!                                 that begins >100px below the top
//!   Return instructions...
//! ```
//!
//! These thresholds are calibrated against common carrier label layouts
//! and are a best-effort heuristic, not a guarantee for arbitrary
//! templates. When the detected region is implausibly small, the
//! whitespace crop takes over.

use image::{GrayImage, imageops};
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Pixels darker than this count toward border lines.
const BOUNDARY_THRESHOLD: u8 = 180;

/// Fraction of dark pixels for a row/column to be a line candidate.
const LINE_DENSITY: f32 = 0.15;

/// Fraction of dark pixels for a row to count as content.
const CONTENT_DENSITY: f32 = 0.02;

/// Fraction of dark pixels for a strong horizontal border.
const STRONG_LINE_DENSITY: f32 = 0.3;

/// Fraction of dark pixels (within the left/right span) when refining the top.
const REFINE_DENSITY: f32 = 0.2;

/// Lines this close to the page edge (as a fraction) are ignored.
const EDGE_SKIP: f32 = 0.02;

/// Gap scan starts this many pixels below the top border.
const GAP_SCAN_OFFSET: u32 = 50;

/// A gap must be longer than this many rows to end the label.
const MIN_GAP: u32 = 20;

/// A gap must begin more than this many rows below the top border.
const MIN_GAP_OFFSET: u32 = 100;

/// The bottom-up fallback scan starts this far above the page bottom.
const BOTTOM_SCAN_OFFSET: u32 = 50;

/// Inward margin that excludes the border stroke.
pub const BORDER_MARGIN: u32 = 3;

/// Minimum width and height of a detected label.
const MIN_REGION: u32 = 100;

/// Pixels brighter than this are background for the whitespace crop.
const WHITESPACE_THRESHOLD: u8 = 250;

/// Margin added around the whitespace bounding box.
pub const WHITESPACE_MARGIN: u32 = 10;

/// # Crop Region
///
/// Rectangle in pixel coordinates of one specific raster. `right` and
/// `bottom` are exclusive. Values may lie outside the raster (or be
/// negative) until [`CropRegion::clamp_to`] is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropRegion {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Rescale into a raster of a different resolution.
    ///
    /// Coordinates are truncated toward zero after scaling.
    pub fn scale(&self, ratio: f64) -> Self {
        let s = |v: i32| (v as f64 * ratio) as i32;
        Self::new(s(self.left), s(self.top), s(self.right), s(self.bottom))
    }

    /// Clamp every edge to `[0, dimension]`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let w = width.min(i32::MAX as u32) as i32;
        let h = height.min(i32::MAX as u32) as i32;
        Self::new(
            self.left.clamp(0, w),
            self.top.clamp(0, h),
            self.right.clamp(0, w),
            self.bottom.clamp(0, h),
        )
    }

    /// Check that the region has positive area.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.right > self.left && self.bottom > self.top {
            Ok(())
        } else {
            Err(FormatError::InvalidCropRegion {
                left: self.left.max(0) as u32,
                top: self.top.max(0) as u32,
                right: self.right.max(0) as u32,
                bottom: self.bottom.max(0) as u32,
            })
        }
    }

    /// Cut this region out of `image` as a new raster.
    ///
    /// The region is clamped first; a region with no area after clamping is
    /// an error.
    pub fn apply(&self, image: &GrayImage) -> Result<GrayImage, FormatError> {
        let region = self.clamp_to(image.width(), image.height());
        region.validate()?;
        Ok(imageops::crop_imm(
            image,
            region.left as u32,
            region.top as u32,
            region.width() as u32,
            region.height() as u32,
        )
        .to_image())
    }
}

/// A crop region drawn on a preview rendered at `reference_dpi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCrop {
    pub region: CropRegion,
    pub reference_dpi: u32,
}

impl ManualCrop {
    /// Preview resolution used by the interactive front end.
    pub const DEFAULT_REFERENCE_DPI: u32 = 150;

    pub fn new(region: CropRegion, reference_dpi: u32) -> Self {
        Self {
            region,
            reference_dpi,
        }
    }

    /// The region in the coordinate space of a raster rendered at
    /// `working_dpi` with the given size, clamped to its bounds.
    pub fn resolve(
        &self,
        working_dpi: u32,
        width: u32,
        height: u32,
    ) -> Result<CropRegion, FormatError> {
        if self.reference_dpi == 0 {
            return Err(FormatError::InvalidCropReference {
                dpi: self.reference_dpi,
            });
        }
        let ratio = working_dpi as f64 / self.reference_dpi as f64;
        let region = self.region.scale(ratio).clamp_to(width, height);
        region.validate()?;
        Ok(region)
    }
}

// ============================================================================
// DENSITY SCANS
// ============================================================================

fn dark_in_row(image: &GrayImage, y: u32, x0: u32, x1: u32, threshold: u8) -> u32 {
    (x0..x1)
        .filter(|&x| image.get_pixel(x, y)[0] < threshold)
        .count() as u32
}

fn dark_in_column(image: &GrayImage, x: u32, threshold: u8) -> u32 {
    (0..image.height())
        .filter(|&y| image.get_pixel(x, y)[0] < threshold)
        .count() as u32
}

/// First row at which a content gap begins, scanning down from the top
/// border.
fn find_content_gap(row_dark: &[u32], width: u32, top: u32) -> Option<u32> {
    let start = top + GAP_SCAN_OFFSET;
    let min_content = width as f32 * CONTENT_DENSITY;
    let height = row_dark.len() as u32;
    if start >= height {
        return None;
    }

    let mut in_content = row_dark[start as usize] as f32 > min_content;
    let mut gap_start = start;

    for y in start + 1..height {
        let has_content = row_dark[y as usize] as f32 > min_content;
        if in_content && !has_content {
            gap_start = y;
            in_content = false;
        } else if !in_content && has_content {
            if y - gap_start > MIN_GAP && gap_start > top + MIN_GAP_OFFSET {
                return Some(gap_start);
            }
            in_content = true;
        }
    }
    None
}

/// Last strong horizontal line, scanning up from near the page bottom.
fn find_last_strong_line(row_dark: &[u32], width: u32, top: u32) -> Option<u32> {
    let height = row_dark.len() as u32;
    let upper = height.checked_sub(BOTTOM_SCAN_OFFSET)?;
    let lower = top + MIN_GAP_OFFSET;
    let min_dark = width as f32 * STRONG_LINE_DENSITY;
    (lower + 1..=upper)
        .rev()
        .find(|&y| row_dark[y as usize] as f32 > min_dark)
}

// ============================================================================
// STRATEGIES
// ============================================================================

/// Locate a printed label border inside a rendered page.
///
/// Returns the region inside the border (inset by [`BORDER_MARGIN`]), or
/// `None` if nothing at least 100x100 was found.
pub fn find_label_boundary(image: &GrayImage) -> Option<CropRegion> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let (w, h) = (width as f32, height as f32);

    let row_dark: Vec<u32> = (0..height)
        .map(|y| dark_in_row(image, y, 0, width, BOUNDARY_THRESHOLD))
        .collect();
    let col_dark: Vec<u32> = (0..width)
        .map(|x| dark_in_column(image, x, BOUNDARY_THRESHOLD))
        .collect();

    let horizontal: Vec<u32> = (0..height)
        .filter(|&y| row_dark[y as usize] as f32 / w > LINE_DENSITY)
        .collect();
    let vertical: Vec<u32> = (0..width)
        .filter(|&x| col_dark[x as usize] as f32 / h > LINE_DENSITY)
        .collect();

    let mut top = horizontal
        .iter()
        .copied()
        .find(|&y| y as f32 > h * EDGE_SKIP)
        .unwrap_or(0);

    let bottom = find_content_gap(&row_dark, width, top)
        .or_else(|| find_last_strong_line(&row_dark, width, top))
        .unwrap_or(height);

    let left = vertical
        .iter()
        .copied()
        .find(|&x| x as f32 > w * EDGE_SKIP)
        .unwrap_or(0);
    let right = vertical
        .iter()
        .rev()
        .copied()
        .find(|&x| (x as f32) < w * (1.0 - EDGE_SKIP))
        .unwrap_or(width);

    // The first dense row inside the left/right span is the actual border.
    if right > left {
        let span = (right - left) as f32;
        let limit = (top + GAP_SCAN_OFFSET).min(height);
        let dense = |y: u32| {
            dark_in_row(image, y, left, right, BOUNDARY_THRESHOLD) as f32 > span * REFINE_DENSITY
        };
        if let Some(y) = (0..limit).find(|&y| dense(y)) {
            top = y;
        }
    }

    let left = (left + BORDER_MARGIN).min(width);
    let top = (top + BORDER_MARGIN).min(height);
    let right = right.saturating_sub(BORDER_MARGIN);
    let bottom = bottom.saturating_sub(BORDER_MARGIN);

    if right > left + MIN_REGION && bottom > top + MIN_REGION {
        Some(CropRegion::new(
            left as i32,
            top as i32,
            right as i32,
            bottom as i32,
        ))
    } else {
        None
    }
}

/// Bounding box of non-background pixels, expanded by
/// [`WHITESPACE_MARGIN`] and clamped to the image.
pub fn find_content_bounds(image: &GrayImage) -> Option<CropRegion> {
    let (width, height) = image.dimensions();
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[0] > WHITESPACE_THRESHOLD {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x + 1, y + 1),
            Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x + 1), b.max(y + 1)),
        });
    }

    let (l, t, r, b) = bounds?;
    let margin = WHITESPACE_MARGIN;
    Some(CropRegion::new(
        l.saturating_sub(margin) as i32,
        t.saturating_sub(margin) as i32,
        (r + margin).min(width) as i32,
        (b + margin).min(height) as i32,
    ))
}

/// Crop to the content bounding box, or return the image unchanged if it
/// is blank.
pub fn crop_whitespace(image: &GrayImage) -> GrayImage {
    match find_content_bounds(image) {
        Some(region) => region.apply(image).unwrap_or_else(|_| image.clone()),
        None => image.clone(),
    }
}

/// Crop to the printed label border, falling back to the whitespace crop.
pub fn crop_to_label(image: &GrayImage) -> GrayImage {
    match find_label_boundary(image) {
        Some(region) => {
            tracing::debug!(?region, "label border found");
            region.apply(image).unwrap_or_else(|_| crop_whitespace(image))
        }
        None => {
            tracing::debug!("label border detection failed, using whitespace crop");
            crop_whitespace(image)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn white(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
    }

    #[test]
    fn test_whitespace_bounds_of_square() {
        let mut img = white(400, 600);
        fill(&mut img, 50, 50, 150, 150);
        let region = find_content_bounds(&img).unwrap();
        assert_eq!(region, CropRegion::new(40, 40, 160, 160));

        let cropped = crop_whitespace(&img);
        assert_eq!(cropped.dimensions(), (120, 120));
    }

    #[test]
    fn test_whitespace_margin_clamps_at_edges() {
        let mut img = white(400, 600);
        fill(&mut img, 0, 595, 5, 600);
        let region = find_content_bounds(&img).unwrap();
        assert_eq!(region, CropRegion::new(0, 585, 15, 600));
    }

    #[test]
    fn test_whitespace_blank_image_unchanged() {
        let img = white(30, 20);
        assert!(find_content_bounds(&img).is_none());
        assert_eq!(crop_whitespace(&img), img);
    }

    #[test]
    fn test_near_white_is_background() {
        let img = GrayImage::from_pixel(30, 20, Luma([251]));
        assert!(find_content_bounds(&img).is_none());
    }

    // Boundary tests are calibrations of a best-effort heuristic on
    // synthetic layouts, not a guarantee for every label template.

    #[test]
    fn test_boundary_box_inset_by_margin() {
        let mut img = white(1000, 1000);
        fill(&mut img, 0, 50, 1000, 51);
        fill(&mut img, 0, 950, 1000, 951);
        fill(&mut img, 40, 0, 41, 1000);
        fill(&mut img, 960, 0, 961, 1000);

        let region = find_label_boundary(&img).unwrap();
        let m = BORDER_MARGIN as i32;
        assert_eq!(region, CropRegion::new(40 + m, 50 + m, 960 - m, 950 - m));
    }

    #[test]
    fn test_boundary_stops_at_gap_before_trailing_text() {
        let mut img = white(800, 1200);
        // Label border
        fill(&mut img, 100, 60, 700, 62);
        fill(&mut img, 100, 700, 700, 702);
        fill(&mut img, 100, 60, 102, 702);
        fill(&mut img, 698, 60, 700, 702);
        // Text lines inside the label, never more than 20 rows apart
        for y0 in (70..690).step_by(20) {
            fill(&mut img, 150, y0, 650, y0 + 10);
        }
        // Return instructions below the label
        fill(&mut img, 100, 800, 600, 830);

        let region = find_label_boundary(&img).unwrap();
        assert_eq!(region.top, 60 + BORDER_MARGIN as i32);
        // Gap begins right after the bottom border stroke
        assert_eq!(region.bottom, 702 - BORDER_MARGIN as i32);
        assert_eq!(region.left, 100 + BORDER_MARGIN as i32);
        assert_eq!(region.right, 699 - BORDER_MARGIN as i32);
    }

    #[test]
    fn test_boundary_rejects_small_region() {
        let mut img = white(90, 300);
        fill(&mut img, 0, 100, 90, 102);
        assert!(find_label_boundary(&img).is_none());
    }

    #[test]
    fn test_crop_to_label_falls_back_to_whitespace() {
        let mut img = white(400, 600);
        fill(&mut img, 50, 50, 150, 150);
        let cropped = crop_to_label(&img);
        assert_eq!(cropped.dimensions(), (120, 120));
    }

    #[test]
    fn test_manual_crop_rescaled_from_reference_dpi() {
        let manual = ManualCrop::new(CropRegion::new(10, 20, 110, 220), 150);
        let region = manual.resolve(300, 2000, 3000).unwrap();
        assert_eq!(region, CropRegion::new(20, 40, 220, 440));

        let region = manual.resolve(203, 2000, 3000).unwrap();
        let ratio = 203.0 / 150.0;
        assert_eq!(region.left, (10.0 * ratio) as i32);
        assert_eq!(region.bottom, (220.0 * ratio) as i32);
    }

    #[test]
    fn test_manual_crop_clamps_out_of_bounds() {
        let manual = ManualCrop::new(CropRegion::new(-50, 100, 5000, 5000), 150);
        let region = manual.resolve(300, 1000, 1500).unwrap();
        assert_eq!(region, CropRegion::new(0, 200, 1000, 1500));
    }

    #[test]
    fn test_manual_crop_zero_reference_dpi_is_error() {
        let manual = ManualCrop::new(CropRegion::new(10, 10, 100, 100), 0);
        assert!(matches!(
            manual.resolve(300, 1000, 1000),
            Err(FormatError::InvalidCropReference { dpi: 0 })
        ));
    }

    #[test]
    fn test_manual_crop_zero_area_is_error() {
        let manual = ManualCrop::new(CropRegion::new(100, 100, 100, 300), 150);
        assert!(matches!(
            manual.resolve(300, 1000, 1000),
            Err(FormatError::InvalidCropRegion { .. })
        ));

        // Entirely outside the image collapses to zero width
        let manual = ManualCrop::new(CropRegion::new(2000, 0, 3000, 10), 150);
        assert!(manual.resolve(300, 1000, 1000).is_err());
    }

    #[test]
    fn test_apply_crops_exact_pixels() {
        let mut img = white(10, 10);
        img.put_pixel(3, 4, Luma([0]));
        let out = CropRegion::new(3, 4, 6, 8).apply(&img).unwrap();
        assert_eq!(out.dimensions(), (3, 4));
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }
}
