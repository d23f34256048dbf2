//! Label composition.
//!
//! [`LabelComposer`] turns a [`LabelRecord`] into a finished [`LabelImage`]:
//!
//! 1. The caption/value rows and the code label are laid out as SVG and
//!    rasterized onto a white canvas sized from the template and DPI.
//! 2. The logo is scaled into its footprint and composited.
//! 3. The payload is encoded, scaled by a whole module factor and
//!    composited centred in the code footprint.
//! 4. The canvas is optionally rotated a quarter turn.
//!
//! Composition is pure: nothing touches the filesystem except reading a
//! path-based logo, and every call allocates its own canvas.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage, imageops};
use tracing::{debug, instrument, warn};

use crate::catalog::{LabelConfig, check_separator};
use crate::encoder::{self, Symbology};
use crate::error::{LabelError, LabelResult};
use crate::geometry::{PhysicalSize, SizePx};
use crate::options::RenderOptions;
use crate::record::{LabelDraft, LabelRecord};
use crate::render::{Anchor, FontLibrary, LogoAsset, SvgDocument, Weight, composite_over, render_svg};
use crate::template::{LabelLayout, LabelTemplate};

// ============================================================================
// LabelImage
// ============================================================================

/// A rendered label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelImage {
    /// Opaque RGBA pixels.
    pub data: RgbaImage,
    pub dpi: u32,
    /// Physical size of the label as oriented in `data`.
    pub size: PhysicalSize,
    /// Exact text carried by the matrix code.
    pub payload: String,
    pub symbology: Symbology,
}

impl LabelImage {
    pub fn dimensions(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }

    /// Downscaled copy for on-screen display, `display_width` pixels wide.
    pub fn preview(&self, display_width: u32) -> LabelResult<RgbaImage> {
        if display_width == 0 {
            return Err(LabelError::invalid("displayWidth", "must be at least 1 pixel"));
        }
        let ratio = display_width as f64 / self.data.width() as f64;
        let height = ((self.data.height() as f64 * ratio).round() as u32).max(1);
        Ok(imageops::resize(
            &self.data,
            display_width,
            height,
            imageops::FilterType::Triangle,
        ))
    }

    /// Encodes the label as PNG.
    pub fn to_png(&self) -> LabelResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.data.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }

    /// Packed 8-bit RGB samples, row-major.
    pub(crate) fn rgb_samples(&self) -> Vec<u8> {
        DynamicImage::ImageRgba8(self.data.clone()).to_rgb8().into_raw()
    }
}

// ============================================================================
// LabelComposer
// ============================================================================

/// Renders label records with one configuration, template and font set.
///
/// The composer holds only read-only state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct LabelComposer {
    config: LabelConfig,
    template: LabelTemplate,
    fonts: FontLibrary,
}

impl LabelComposer {
    /// Creates a composer using the standard template.
    pub fn new(config: LabelConfig, fonts: FontLibrary) -> Self {
        Self {
            config,
            template: LabelTemplate::standard(),
            fonts,
        }
    }

    pub fn with_template(mut self, template: LabelTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn template(&self) -> &LabelTemplate {
        &self.template
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// The payload encoded into the matrix code for `record`.
    pub fn payload(&self, record: &LabelRecord) -> String {
        record.payload(self.config.payload_date_format)
    }

    /// Resolves a draft against the catalog, then composes it.
    pub fn compose_draft(
        &self,
        draft: &LabelDraft,
        logo: &LogoAsset,
        options: &RenderOptions,
    ) -> LabelResult<LabelImage> {
        let record = self.config.resolve(draft)?;
        self.compose(&record, logo, options)
    }

    /// Renders `record` into a label image.
    #[instrument(skip_all, fields(part = %record.part_number, dpi = options.dpi, symbology = %options.symbology))]
    pub fn compose(
        &self,
        record: &LabelRecord,
        logo: &LogoAsset,
        options: &RenderOptions,
    ) -> LabelResult<LabelImage> {
        options.validate()?;
        check_separator(record)?;

        let payload = self.payload(record);
        let code = encoder::encode(&payload, options.symbology)?;
        let layout = self.template.at_dpi(options.dpi);

        let side = layout.code.width.min(layout.code.height);
        if !code.fits(side) {
            return Err(LabelError::Encoding {
                symbology: options.symbology.to_string(),
                reason: format!(
                    "a {}x{} module symbol does not fit the {side} px code area at {} dpi",
                    code.modules.0, code.modules.1, options.dpi
                ),
            });
        }

        let logo = match logo.resolve() {
            Ok(image) => Some(image),
            Err(_) if matches!(logo, LogoAsset::None) => None,
            Err(err) if options.strict_assets => return Err(err),
            Err(err) => {
                warn!(error = %err, "skipping logo");
                None
            }
        };

        if self.fonts.is_empty() {
            if options.strict_assets {
                return Err(LabelError::missing("font", "font library is empty"));
            }
            warn!("font library is empty, label text will not be drawn");
        }

        let svg = label_svg(record, &layout, options.text_offset);
        let mut canvas = render_svg(&svg, layout.canvas, &self.fonts)?;

        if let Some(logo) = logo {
            draw_logo(&mut canvas, &logo, &layout, options);
        }

        let symbol = code.scaled_to_fit(side);
        let symbol = DynamicImage::ImageLuma8(symbol).to_rgba8();
        let x = layout.code.x + layout.code.width.saturating_sub(symbol.width()) / 2;
        let y = layout.code.y + layout.code.height.saturating_sub(symbol.height()) / 2;
        composite_over(&mut canvas, &symbol, x as i32, y as i32);
        debug!(modules = ?code.modules, side = symbol.width(), "placed matrix code");

        let (data, size) = if options.rotate_90 {
            (imageops::rotate90(&canvas), self.template.size.rotated())
        } else {
            (canvas, self.template.size)
        };

        Ok(LabelImage {
            data,
            dpi: options.dpi,
            size,
            payload,
            symbology: options.symbology,
        })
    }
}

/// Scales the logo into its footprint and composites it.
fn draw_logo(canvas: &mut RgbaImage, logo: &DynamicImage, layout: &LabelLayout, options: &RenderOptions) {
    let footprint = layout.logo;
    let scaled = imageops::resize(
        &logo.to_rgba8(),
        footprint.width.max(1),
        footprint.height.max(1),
        imageops::FilterType::Triangle,
    );
    let (x, y) = options
        .logo_position
        .unwrap_or((footprint.x as i32, footprint.y as i32));
    composite_over(canvas, &scaled, x, y);
}

/// Lays out the field rows and the code label as an SVG document.
pub(crate) fn label_svg(record: &LabelRecord, layout: &LabelLayout, text_offset: i32) -> String {
    let mut doc = SvgDocument::new(layout.canvas, layout.font_family.clone());
    let x = layout.text_x as i32;

    for (index, (caption, value)) in record.printed_fields().iter().enumerate() {
        let (caption_y, value_y) = layout.row_baselines(index);
        let caption_y = caption_y as i32 + text_offset;
        let value_y = value_y as i32 + text_offset;
        doc.text(x, caption_y, layout.caption_size, Weight::Bold, Anchor::Start, caption);
        doc.text(x, value_y, layout.value_size, Weight::Regular, Anchor::Start, value);
    }

    doc.text(
        layout.code.center_x() as i32,
        layout.code_label_baseline() as i32,
        layout.code_label_size,
        Weight::Bold,
        Anchor::Middle,
        &record.matrix_code_label,
    );

    doc.finish()
}
