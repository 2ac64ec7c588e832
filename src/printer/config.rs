//! # Label Geometry
//!
//! This module describes the physical label a print request targets.
//!
//! ## Common Label Sizes
//!
//! | Preset | Size (mm) | Dots @ 203 DPI |
//! |--------|-----------|----------------|
//! | `4x6`  | 101 × 152 | 807 × 1215     |
//! | `4x4`  | 101 × 101 | 807 × 807      |
//! | `2x1`  | 50 × 25   | 400 × 200      |
//!
//! ## Usage
//!
//! ```
//! use labelbridge::printer::LabelSpec;
//!
//! let label = LabelSpec::SHIPPING_4X6;
//! let (w, h) = label.target_dots();
//! println!("Label is {} x {} dots", w, h);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Millimeters per inch
const MM_PER_INCH: f32 = 25.4;

/// Default printer resolution (most TSPL label printers are 203 DPI)
pub const DEFAULT_DPI: u32 = 203;

/// Default gap between consecutive labels in millimeters
pub const DEFAULT_GAP_MM: f32 = 2.0;

/// Largest bitmap edge accepted, in dots (about 1 m at 203 DPI)
pub const MAX_LABEL_DOTS: u32 = 8192;

/// # Label Specification
///
/// Physical label size, inter-label gap, and printer resolution.
///
/// ## Calculations
///
/// ```text
/// dots = round(mm * dpi / 25.4)
///
/// For a 4x6 label at 203 DPI:
///   101 mm * 203 / 25.4 = 807.2  -> 807 dots
///   152 mm * 203 / 25.4 = 1214.8 -> 1215 dots
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSpec {
    /// Label width in millimeters
    pub width_mm: f32,

    /// Label height in millimeters
    pub height_mm: f32,

    /// Gap between labels in millimeters
    pub gap_mm: f32,

    /// Printer resolution in dots per inch
    pub dpi: u32,
}

impl LabelSpec {
    /// 4x6 inch shipping label
    pub const SHIPPING_4X6: Self = Self {
        width_mm: 101.0,
        height_mm: 152.0,
        gap_mm: DEFAULT_GAP_MM,
        dpi: DEFAULT_DPI,
    };

    /// 4x4 inch square label
    pub const SQUARE_4X4: Self = Self {
        width_mm: 101.0,
        height_mm: 101.0,
        gap_mm: DEFAULT_GAP_MM,
        dpi: DEFAULT_DPI,
    };

    /// 2x1 inch small label
    pub const SMALL_2X1: Self = Self {
        width_mm: 50.0,
        height_mm: 25.0,
        gap_mm: DEFAULT_GAP_MM,
        dpi: DEFAULT_DPI,
    };

    /// Default size for plain-text labels
    pub const TEXT_DEFAULT: Self = Self {
        width_mm: 40.0,
        height_mm: 30.0,
        gap_mm: DEFAULT_GAP_MM,
        dpi: DEFAULT_DPI,
    };

    /// Create a validated label spec.
    ///
    /// ## Errors
    ///
    /// Returns [`FormatError::InvalidLabelSpec`] if any dimension is not
    /// strictly positive and finite, or if the label is not between one and
    /// [`MAX_LABEL_DOTS`] dots along either axis.
    pub fn new(width_mm: f32, height_mm: f32, gap_mm: f32, dpi: u32) -> Result<Self, FormatError> {
        let spec = Self {
            width_mm,
            height_mm,
            gap_mm,
            dpi,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Check that all four values are strictly positive and the label
    /// rasterizes to a bounded bitmap.
    pub fn validate(&self) -> Result<(), FormatError> {
        let fields = [
            ("width_mm", self.width_mm),
            ("height_mm", self.height_mm),
            ("gap_mm", self.gap_mm),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(FormatError::InvalidLabelSpec(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.dpi == 0 {
            return Err(FormatError::InvalidLabelSpec(
                "dpi must be positive, got 0".to_string(),
            ));
        }
        let (w, h) = self.target_dots();
        if w == 0 || h == 0 {
            return Err(FormatError::InvalidLabelSpec(format!(
                "{} x {} mm is smaller than one dot at {} dpi",
                self.width_mm, self.height_mm, self.dpi
            )));
        }
        if w > MAX_LABEL_DOTS || h > MAX_LABEL_DOTS {
            return Err(FormatError::InvalidLabelSpec(format!(
                "{} x {} mm is {} x {} dots at {} dpi, limit is {} dots per side",
                self.width_mm, self.height_mm, w, h, self.dpi, MAX_LABEL_DOTS
            )));
        }
        Ok(())
    }

    /// Same label with a different resolution.
    pub fn with_dpi(self, dpi: u32) -> Self {
        Self { dpi, ..self }
    }

    /// Same label with a different gap.
    pub fn with_gap(self, gap_mm: f32) -> Self {
        Self { gap_mm, ..self }
    }

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / MM_PER_INCH
    }

    /// Convert millimeters to dots
    #[inline]
    pub fn mm_to_dots(&self, mm: f32) -> u32 {
        (mm * self.dots_per_mm()).round() as u32
    }

    /// Target bitmap size in dots as `(width, height)`.
    pub fn target_dots(&self) -> (u32, u32) {
        (self.mm_to_dots(self.width_mm), self.mm_to_dots(self.height_mm))
    }

    /// Whether the printed area is wider than it is tall.
    pub fn is_landscape(&self) -> bool {
        let (w, h) = self.target_dots();
        w > h
    }

    /// Parse a label size.
    ///
    /// Accepts a preset name (`4x6`, `4x4`, `2x1`) or millimeter dimensions
    /// as `WIDTHxHEIGHT` (e.g. `"62x29"`). Gap and DPI take the defaults.
    pub fn parse(s: &str) -> Result<Self, FormatError> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "4x6" => return Ok(Self::SHIPPING_4X6),
            "4x4" => return Ok(Self::SQUARE_4X4),
            "2x1" => return Ok(Self::SMALL_2X1),
            _ => {}
        }

        let (w, h) = s.split_once('x').ok_or_else(|| {
            FormatError::InvalidLabelSpec(format!(
                "expected a preset (4x6, 4x4, 2x1) or WIDTHxHEIGHT in mm, got '{}'",
                s
            ))
        })?;
        let width: f32 = w
            .trim()
            .parse()
            .map_err(|_| FormatError::InvalidLabelSpec(format!("Invalid width: {}", w)))?;
        let height: f32 = h
            .trim()
            .parse()
            .map_err(|_| FormatError::InvalidLabelSpec(format!("Invalid height: {}", h)))?;

        Self::new(width, height, DEFAULT_GAP_MM, DEFAULT_DPI)
    }

    /// Built-in presets with their display names.
    pub fn presets() -> Vec<(&'static str, Self)> {
        vec![
            ("4x6", Self::SHIPPING_4X6),
            ("4x4", Self::SQUARE_4X4),
            ("2x1", Self::SMALL_2X1),
        ]
    }
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self::SHIPPING_4X6
    }
}

// ============================================================================
// TESTS
// ============================================================================
