//! Per-call render options.
//!
//! [`RenderOptions`] serializes to JSON so a front end can hand its choices
//! to the renderer as a single value.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "dpi": 300,
//!   "logoPosition": [10, 10],
//!   "textOffset": 0,
//!   "rotate90": false,
//!   "strictAssets": false,
//!   "symbology": "qr"
//! }
//! ```
//!
//! Every key is optional; missing keys take the defaults above
//! (`logoPosition` defaults to the template's logo position).

use serde::{Deserialize, Serialize};

use crate::encoder::Symbology;
use crate::error::{LabelError, LabelResult};

pub const DEFAULT_DPI: u32 = 300;
pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 1200;

/// How a single label is rasterized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct RenderOptions {
    /// Raster resolution in dots per inch.
    pub dpi: u32,

    /// Pixel offset of the logo's top-left corner. `None` uses the template
    /// position scaled to `dpi`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_position: Option<(i32, i32)>,

    /// Vertical nudge in pixels applied to the field rows.
    pub text_offset: i32,

    /// Rotate the finished label a quarter turn clockwise.
    #[serde(rename = "rotate90")]
    pub rotate_90: bool,

    /// Fail with [`LabelError::MissingAsset`] instead of skipping a missing
    /// logo or an empty font library.
    pub strict_assets: bool,

    pub symbology: Symbology,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            logo_position: None,
            text_offset: 0,
            rotate_90: false,
            strict_assets: false,
            symbology: Symbology::default(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_logo_position(mut self, x: i32, y: i32) -> Self {
        self.logo_position = Some((x, y));
        self
    }

    pub fn with_text_offset(mut self, offset: i32) -> Self {
        self.text_offset = offset;
        self
    }

    pub fn with_rotation(mut self, rotate_90: bool) -> Self {
        self.rotate_90 = rotate_90;
        self
    }

    pub fn with_strict_assets(mut self, strict: bool) -> Self {
        self.strict_assets = strict;
        self
    }

    pub fn with_symbology(mut self, symbology: Symbology) -> Self {
        self.symbology = symbology;
        self
    }

    /// Checks values that cannot be expressed in the type.
    pub fn validate(&self) -> LabelResult<()> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(LabelError::invalid(
                "dpi",
                format!("{} is outside {MIN_DPI}..={MAX_DPI}", self.dpi),
            ));
        }
        Ok(())
    }

    /// Serializes the options to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the options to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
