//! Error types for label composition and export.

use thiserror::Error;

/// Errors produced while resolving, composing or exporting a label.
#[derive(Debug, Error)]
pub enum LabelError {
    /// A logo or font could not be found or decoded.
    #[error("missing asset `{asset}`: {reason}")]
    MissingAsset { asset: String, reason: String },

    /// The payload cannot be represented by the chosen symbology.
    #[error("{symbology} encoding failed: {reason}")]
    Encoding { symbology: String, reason: String },

    /// A caller-supplied value is out of range or unknown.
    #[error("invalid `{field}`: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// The SVG rasterizer rejected the generated document.
    #[error("render error: {0}")]
    Render(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl LabelError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingAsset {
            asset: asset.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for label operations
pub type LabelResult<T> = Result<T, LabelError>;
