//! # Label Preview
//!
//! Saves what the printer will produce as a PNG, so a label can be checked
//! on screen before paper is spent.

use std::path::Path;

use image::GrayImage;

use super::bitmap::MonoBitmap;
use crate::error::RenderError;

/// Save a packed bitmap as a black-on-white PNG (ink = black).
pub fn save_bitmap_png(path: &Path, bitmap: &MonoBitmap) -> Result<(), RenderError> {
    save_png(path, &bitmap.to_gray())
}

/// Save a grayscale raster as PNG.
pub fn save_png(path: &Path, image: &GrayImage) -> Result<(), RenderError> {
    image.save(path).map_err(|e| RenderError::SaveFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "preview saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::bitmap::{Polarity, encode};
    use image::Luma;

    #[test]
    fn test_bitmap_png_matches_ink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");

        let mut img = GrayImage::from_pixel(20, 10, Luma([255]));
        img.put_pixel(5, 5, Luma([0]));
        let bitmap = encode(&img, Polarity::DarkIsInk);
        save_bitmap_png(&path, &bitmap).unwrap();

        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded, img);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("label.png");
        let img = GrayImage::new(4, 4);
        assert!(matches!(
            save_png(&path, &img),
            Err(RenderError::SaveFailure { .. })
        ));
    }
}
