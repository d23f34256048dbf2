//! PDF export and print hand-off.
//!
//! [`export_pdf`] tiles one [`LabelImage`] across `copies` pages. The raster
//! is embedded once as an image XObject and drawn on every page at the
//! label's physical size, anchored at the bottom-left corner of the sheet.
//!
//! The document carries no timestamps, so identical inputs produce
//! identical bytes.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::{info, instrument, warn};

use crate::composer::LabelImage;
use crate::error::{LabelError, LabelResult};
use crate::geometry::{PhysicalSize, mm_to_pt};

/// MIME type of exported documents.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Suggested file name for exported documents.
pub const PDF_FILE_NAME: &str = "etiqueta.pdf";

/// Sheet size used by the label printer.
pub const DEFAULT_PAGE_SIZE: PhysicalSize = PhysicalSize::new(150.0, 100.0);

const IMAGE_NAME: &str = "Label";

/// A finished, paginated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintDocument {
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

impl PrintDocument {
    pub fn mime_type(&self) -> &'static str {
        PDF_MIME_TYPE
    }

    pub fn file_name(&self) -> &'static str {
        PDF_FILE_NAME
    }
}

/// Exports `copies` pages of `image`, one label per page.
///
/// Each page is `page_size`; the label is drawn at its own physical size
/// regardless of the sheet. Fails without producing any bytes when
/// `copies` is zero or the page size is not positive.
#[instrument(skip(image), fields(dpi = image.dpi))]
pub fn export_pdf(image: &LabelImage, copies: u32, page_size: PhysicalSize) -> LabelResult<PrintDocument> {
    if copies < 1 {
        return Err(LabelError::invalid("copies", "at least one copy is required"));
    }
    if !page_size.is_positive() {
        return Err(LabelError::invalid(
            "pageSize",
            format!("{} x {} mm is not a valid sheet", page_size.width_mm, page_size.height_mm),
        ));
    }
    if !page_size.contains(image.size) {
        warn!(
            label_mm = ?(image.size.width_mm, image.size.height_mm),
            page_mm = ?(page_size.width_mm, page_size.height_mm),
            "label is larger than the sheet and will be clipped"
        );
    }

    let mut doc = Document::with_version("1.5");
    let id_pages = doc.new_object_id();

    let (width, height) = image.data.dimensions();
    let id_image = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.rgb_samples(),
    ));

    let id_resources = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            IMAGE_NAME => id_image,
        },
    });

    let content = Content {
        operations: label_operations(image.size),
    };
    let id_content = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let mut pages: Vec<Object> = Vec::with_capacity(copies as usize);
    for _ in 0..copies {
        let id_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => id_pages,
            "Contents" => id_content,
            "Resources" => id_resources,
        });
        pages.push(id_page.into());
    }

    doc.set_object(
        id_pages,
        dictionary! {
            "Type" => "Pages",
            "Count" => copies as i64,
            "Kids" => pages,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                mm_to_pt(page_size.width_mm).into(),
                mm_to_pt(page_size.height_mm).into(),
            ],
        },
    );

    let id_catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => id_pages,
    });
    doc.trailer.set("Root", id_catalog);

    let id_info = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Etiqueta"),
        "Producer" => Object::string_literal(concat!("etiqueta-renderer ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Info", id_info);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;

    info!(pages = copies, bytes = bytes.len(), "exported label document");
    Ok(PrintDocument {
        bytes,
        page_count: copies,
    })
}

/// Draws the label image at the origin scaled to `size`.
fn label_operations(size: PhysicalSize) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                mm_to_pt(size.width_mm).into(),
                0.into(),
                0.into(),
                mm_to_pt(size.height_mm).into(),
                0.into(),
                0.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

// ============================================================================
// Print sinks
// ============================================================================

/// Destination for finished documents, supplied by the host environment.
pub trait PrintSink {
    fn send(&self, document: &PrintDocument) -> LabelResult<()>;
}

/// Writes documents to [`PDF_FILE_NAME`] inside a directory.
///
/// The file is written under a temporary name and renamed into place, so a
/// failed write never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the next document will be written to.
    pub fn target(&self) -> PathBuf {
        self.dir.join(PDF_FILE_NAME)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PrintSink for DirectorySink {
    #[instrument(skip(document), fields(dir = %self.dir.display(), pages = document.page_count))]
    fn send(&self, document: &PrintDocument) -> LabelResult<()> {
        let target = self.target();
        let partial = self.dir.join(format!("{PDF_FILE_NAME}.part"));

        fs::write(&partial, &document.bytes)?;
        if let Err(err) = fs::rename(&partial, &target) {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }

        info!(path = %target.display(), "document written");
        Ok(())
    }
}
