//! SVG text rasterization and image compositing.
//!
//! Label text is laid out as a small SVG document ([`SvgDocument`]) and
//! rasterized with resvg. Raster assets (logo, matrix code) are composited on
//! top with [`composite_over`].

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use super::asset::FontLibrary;
use crate::error::{LabelError, LabelResult};
use crate::geometry::SizePx;

// ============================================================================
// SvgDocument
// ============================================================================

/// Font weight of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Horizontal anchoring of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
}

/// A white canvas of fixed pixel size with positioned text runs.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    size: SizePx,
    font_family: String,
    body: String,
}

impl SvgDocument {
    pub fn new(size: SizePx, font_family: impl Into<String>) -> Self {
        Self {
            size,
            font_family: font_family.into(),
            body: String::new(),
        }
    }

    /// Adds a text run whose baseline starts (or is centred) at `(x, y)`.
    pub fn text(&mut self, x: i32, y: i32, font_size: u32, weight: Weight, anchor: Anchor, content: &str) {
        let weight = match weight {
            Weight::Regular => "normal",
            Weight::Bold => "bold",
        };
        let anchor = match anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
        };
        self.body.push_str(&format!(
            r##"<text x="{x}" y="{y}" font-size="{font_size}" font-weight="{weight}" text-anchor="{anchor}" fill="#000000">{}</text>"##,
            escape_xml(content)
        ));
        self.body.push('\n');
    }

    #[cfg(test)]
    fn text_count(&self) -> usize {
        self.body.lines().count()
    }

    pub fn finish(&self) -> String {
        let SizePx { width, height } = self.size;
        format!(
            concat!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
                "\n",
                r##"<rect x="0" y="0" width="{w}" height="{h}" fill="#ffffff"/>"##,
                "\n",
                r##"<g font-family="{family}">"##,
                "\n{body}</g>\n</svg>\n"
            ),
            w = width,
            h = height,
            family = escape_xml(&self.font_family),
            body = self.body,
        )
    }
}

/// Escapes text for use in XML character data and attribute values.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// SVG Rendering
// ============================================================================

/// Rasterizes an SVG document onto a canvas of exactly `size` pixels.
///
/// The document is scaled to the canvas if its own size differs.
pub fn render_svg(svg_data: &str, size: SizePx, fonts: &FontLibrary) -> LabelResult<RgbaImage> {
    let mut opts = Options::default();
    opts.fontdb = fonts.database();

    let tree = Tree::from_str(svg_data, &opts).map_err(|e| LabelError::Render(e.to_string()))?;

    let mut pixmap = Pixmap::new(size.width, size.height).ok_or_else(|| {
        LabelError::Render(format!("cannot allocate a {}x{} canvas", size.width, size.height))
    })?;

    let svg_size = tree.size();
    let transform = Transform::from_scale(
        size.width as f32 / svg_size.width(),
        size.height as f32 / svg_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let height = pixmap.height();
    let mut img = RgbaImage::new(width, height);

    for (i, pixel) in pixmap.pixels().iter().enumerate() {
        // tiny_skia uses premultiplied alpha
        let (r, g, b, a) = unpremultiply(pixel.red(), pixel.green(), pixel.blue(), pixel.alpha());
        let i = i as u32;
        img.put_pixel(i % width, i / width, Rgba([r, g, b, a]));
    }

    img
}

fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

// ============================================================================
// Compositing
// ============================================================================

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination). Pixels falling
/// outside the destination are clipped.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i32;
    let dest_height = dest.height() as i32;

    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = x + sx as i32;
        let dy = y + sy as i32;

        if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
            continue;
        }

        let dst_pixel = dest.get_pixel(dx as u32, dy as u32);
        let blended = alpha_blend(*src_pixel, *dst_pixel);
        dest.put_pixel(dx as u32, dy as u32, blended);
    }
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><rect width="100" height="50" fill="#ff0000"/></svg>"##;

    #[test]
    fn render_fills_requested_canvas() {
        let img = render_svg(SIMPLE_SVG, SizePx::new(200, 100), &FontLibrary::new()).unwrap();
        assert_eq!(img.dimensions(), (200, 100));
        assert_eq!(img.get_pixel(199, 99).0, [255, 0, 0, 255]);
    }

    #[test]
    fn invalid_svg_is_a_render_error() {
        let result = render_svg("<not-svg", SizePx::new(10, 10), &FontLibrary::new());
        assert!(matches!(result, Err(LabelError::Render(_))));
    }

    #[test]
    fn document_has_white_background() {
        let doc = SvgDocument::new(SizePx::new(40, 30), "sans-serif");
        let img = render_svg(&doc.finish(), SizePx::new(40, 30), &FontLibrary::new()).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(39, 29).0, [255, 255, 255, 255]);
    }

    #[test]
    fn text_runs_are_escaped() {
        let mut doc = SvgDocument::new(SizePx::new(100, 100), "sans-serif");
        doc.text(10, 20, 12, Weight::Bold, Anchor::Start, "A&B <C>");
        doc.text(50, 40, 12, Weight::Regular, Anchor::Middle, "\"q\"");
        let svg = doc.finish();

        assert_eq!(doc.text_count(), 2);
        assert!(svg.contains("A&amp;B &lt;C&gt;"));
        assert!(svg.contains("&quot;q&quot;"));
        assert!(svg.contains(r#"font-weight="bold""#));
        assert!(svg.contains(r#"text-anchor="middle""#));
        // Escaped output still parses
        assert!(render_svg(&svg, SizePx::new(100, 100), &FontLibrary::new()).is_ok());
    }

    #[test]
    fn composite_simple() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        composite_over(&mut dest, &src, 3, 3);

        assert_eq!(dest.get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_clips_at_edges() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));

        composite_over(&mut dest, &src, -2, 8);

        assert_eq!(dest.get_pixel(0, 9).0, [0, 0, 0, 255]);
        assert_eq!(dest.get_pixel(2, 9).0, [255, 255, 255, 255]);
        assert_eq!(dest.get_pixel(0, 7).0, [255, 255, 255, 255]);
    }

    #[test]
    fn composite_with_transparency() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 128]));

        composite_over(&mut dest, &src, 0, 0);

        let pixel = dest.get_pixel(0, 0);
        assert!(pixel[0] > 0, "Should have some red");
        assert!(pixel[2] > 0, "Should have some blue");
        assert_eq!(pixel[3], 255);
    }
}
