//! Physical and pixel geometry for label canvases.
//!
//! Labels are specified in millimetres and rasterized at a chosen DPI.
//! Every mm to pixel conversion in the crate goes through [`mm_to_px`] so the
//! rounding rule lives in one place.

use serde::{Deserialize, Serialize};

const MM_PER_INCH: f64 = 25.4;
const PT_PER_INCH: f64 = 72.0;

/// Converts millimetres to whole pixels at `dpi`, rounding to nearest.
pub fn mm_to_px(mm: f64, dpi: u32) -> u32 {
    (mm * dpi as f64 / MM_PER_INCH).round() as u32
}

/// Converts millimetres to PDF points (1/72 inch).
pub fn mm_to_pt(mm: f64) -> f32 {
    (mm * PT_PER_INCH / MM_PER_INCH) as f32
}

/// A rectangle defined in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct RectPx {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Returns the bottom edge coordinate (y + height).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Horizontal centre, rounded down.
    pub fn center_x(&self) -> u32 {
        self.x + self.width / 2
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Physical size of a label or sheet in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PhysicalSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PhysicalSize {
    pub const fn new(width_mm: f64, height_mm: f64) -> Self {
        Self { width_mm, height_mm }
    }

    /// Pixel dimensions of this size rasterized at `dpi`.
    pub fn to_pixels(&self, dpi: u32) -> SizePx {
        SizePx::new(mm_to_px(self.width_mm, dpi), mm_to_px(self.height_mm, dpi))
    }

    /// The same size turned a quarter turn.
    pub fn rotated(&self) -> Self {
        Self::new(self.height_mm, self.width_mm)
    }

    pub fn is_positive(&self) -> bool {
        self.width_mm > 0.0 && self.height_mm > 0.0
    }

    /// Whether `content` fits inside this size without turning it.
    pub fn contains(&self, content: PhysicalSize) -> bool {
        content.width_mm <= self.width_mm && content.height_mm <= self.height_mm
    }

    /// This sheet, turned a quarter turn when only the turned sheet holds
    /// `content`.
    pub fn oriented_for(&self, content: PhysicalSize) -> Self {
        let rotated = self.rotated();
        if !self.contains(content) && rotated.contains(content) {
            rotated
        } else {
            *self
        }
    }
}
