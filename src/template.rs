//! Fixed label layouts.
//!
//! A [`LabelTemplate`] holds every coordinate of one label family, expressed
//! in pixels at [`REFERENCE_DPI`]. [`LabelTemplate::at_dpi`] scales it to a
//! concrete [`LabelLayout`] so the printed label keeps its physical geometry
//! at any resolution.
//!
//! Vertical advances are fixed. Text is never measured, so very long values
//! can overlap neighbouring elements.

use serde::{Deserialize, Serialize};

use crate::geometry::{PhysicalSize, RectPx, SizePx};

/// Resolution at which template coordinates are expressed.
pub const REFERENCE_DPI: u32 = 300;

/// Physical size of the standard label stock.
pub const STANDARD_LABEL_SIZE: PhysicalSize = PhysicalSize::new(110.0, 85.0);

/// Layout of one label family at [`REFERENCE_DPI`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct LabelTemplate {
    pub size: PhysicalSize,
    pub font_family: String,

    /// Footprint the logo is scaled into. `x`/`y` is the default position.
    pub logo: RectPx,

    /// Left edge of the caption/value column.
    pub text_x: u32,
    /// Top of the first caption row.
    pub first_row_y: u32,
    /// Distance between consecutive caption rows.
    pub row_pitch: u32,
    pub caption_size: u32,
    pub value_size: u32,
    /// Baseline distance from a caption to its value.
    pub value_gap: u32,

    /// Square footprint of the matrix code.
    pub code: RectPx,
    /// Baseline distance from the bottom of the code to its label.
    pub code_label_gap: u32,
    pub code_label_size: u32,
}

impl Default for LabelTemplate {
    fn default() -> Self {
        Self::standard()
    }
}

impl LabelTemplate {
    /// 110 x 85 mm label: logo top-left, six field rows on the left,
    /// matrix code on the right.
    pub fn standard() -> Self {
        Self {
            size: STANDARD_LABEL_SIZE,
            font_family: "DejaVu Sans, Liberation Sans, Arial, Helvetica, sans-serif".into(),
            logo: RectPx::new(10, 10, 500, 120),
            text_x: 20,
            first_row_y: 150,
            row_pitch: 130,
            caption_size: 30,
            value_size: 38,
            value_gap: 44,
            code: RectPx::new(950, 170, 300, 300),
            code_label_gap: 50,
            code_label_size: 34,
        }
    }

    /// Scales every coordinate to `dpi`.
    pub fn at_dpi(&self, dpi: u32) -> LabelLayout {
        let s = |v: u32| scale(v, dpi);
        let rect = |r: RectPx| RectPx::new(s(r.x), s(r.y), s(r.width), s(r.height));

        LabelLayout {
            canvas: self.size.to_pixels(dpi),
            font_family: self.font_family.clone(),
            logo: rect(self.logo),
            text_x: s(self.text_x),
            first_row_y: s(self.first_row_y),
            row_pitch: s(self.row_pitch),
            caption_size: s(self.caption_size),
            value_size: s(self.value_size),
            value_gap: s(self.value_gap),
            code: rect(self.code),
            code_label_gap: s(self.code_label_gap),
            code_label_size: s(self.code_label_size),
        }
    }

    /// Serializes the template to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a template from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn scale(value: u32, dpi: u32) -> u32 {
    (value as f64 * dpi as f64 / REFERENCE_DPI as f64).round() as u32
}

/// A template resolved to pixel coordinates at one DPI.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub canvas: SizePx,
    pub font_family: String,
    pub logo: RectPx,
    pub text_x: u32,
    pub first_row_y: u32,
    pub row_pitch: u32,
    pub caption_size: u32,
    pub value_size: u32,
    pub value_gap: u32,
    pub code: RectPx,
    pub code_label_gap: u32,
    pub code_label_size: u32,
}

impl LabelLayout {
    /// Caption and value baselines for field row `index`.
    pub fn row_baselines(&self, index: usize) -> (u32, u32) {
        let caption = self.first_row_y + index as u32 * self.row_pitch + self.caption_size;
        (caption, caption + self.value_gap)
    }

    /// Baseline of the text centred under the matrix code.
    pub fn code_label_baseline(&self) -> u32 {
        self.code.bottom() + self.code_label_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_dpi_is_identity() {
        let template = LabelTemplate::standard();
        let layout = template.at_dpi(REFERENCE_DPI);
        assert_eq!(layout.canvas, SizePx::new(1299, 1004));
        assert_eq!(layout.logo, template.logo);
        assert_eq!(layout.code, template.code);
    }

    #[test]
    fn layout_scales_with_dpi() {
        let layout = LabelTemplate::standard().at_dpi(600);
        assert_eq!(layout.canvas, SizePx::new(2598, 2008));
        assert_eq!(layout.logo, RectPx::new(20, 20, 1000, 240));
        assert_eq!(layout.code.width, 600);
    }

    #[test]
    fn standard_layout_fits_canvas() {
        for dpi in [72, 150, 203, 300, 600] {
            let layout = LabelTemplate::standard().at_dpi(dpi);
            assert!(layout.code.right() <= layout.canvas.width, "code overflows at {dpi}");
            assert!(layout.code_label_baseline() <= layout.canvas.height);
            let (_, last_value) = layout.row_baselines(5);
            assert!(last_value <= layout.canvas.height, "rows overflow at {dpi}");
        }
    }

    #[test]
    fn rows_advance_by_fixed_pitch() {
        let layout = LabelTemplate::standard().at_dpi(300);
        assert_eq!(layout.row_baselines(0), (180, 224));
        assert_eq!(layout.row_baselines(1), (310, 354));
    }

    #[test]
    fn partial_template_json_keeps_defaults() {
        let template = LabelTemplate::from_json(r#"{"rowPitch": 120}"#).unwrap();
        assert_eq!(template.row_pitch, 120);
        assert_eq!(template.size, STANDARD_LABEL_SIZE);

        let json = template.to_json().unwrap();
        assert_eq!(LabelTemplate::from_json(&json).unwrap(), template);
    }
}
