//! Rasterization building blocks for the label composer.
//!
//! - [`svg`]: text layout as SVG, rasterized with resvg, plus alpha compositing
//! - [`asset`]: logo and font loading

pub mod asset;
pub mod svg;

pub use asset::{FontLibrary, LogoAsset};
pub use svg::{Anchor, SvgDocument, Weight, composite_over, render_svg};
