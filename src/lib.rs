//! etiqueta-renderer: printable part-identification labels
//!
//! This crate turns a small record of part data (manufacture date, part
//! number, release level, serial, supplier code, invoice number) into a
//! fixed-size label raster with a scannable matrix code, and tiles that
//! raster across the pages of a PDF for printing.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use etiqueta_renderer::{
//!     DEFAULT_PAGE_SIZE, FontLibrary, LabelComposer, LabelConfig, LabelDraft, LogoAsset,
//!     RenderOptions, export_pdf,
//! };
//!
//! let composer = LabelComposer::new(LabelConfig::default(), FontLibrary::bundled());
//!
//! let draft = LabelDraft::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), "7000448C93")
//!     .with_invoice("NF-9911");
//! let record = composer.config().resolve(&draft).unwrap();
//! assert_eq!(
//!     composer.payload(&record),
//!     "15/03/2024;7000448C93;A;13785;13785;NF-9911"
//! );
//!
//! let label = composer
//!     .compose(&record, &LogoAsset::None, &RenderOptions::default())
//!     .unwrap();
//! assert_eq!(label.data.dimensions(), (1299, 1004));
//!
//! let pdf = export_pdf(&label, 3, DEFAULT_PAGE_SIZE.oriented_for(label.size)).unwrap();
//! assert_eq!(pdf.page_count, 3);
//! ```
//!
//! # Serializable Configuration
//!
//! [`LabelConfig`], [`RenderOptions`] and [`LabelTemplate`] round-trip
//! through JSON with camelCase keys, so a front end can keep them in files
//! or send them across a process boundary:
//!
//! ```
//! use etiqueta_renderer::{RenderOptions, Symbology};
//!
//! let options = RenderOptions::from_json(r#"{"dpi": 203, "symbology": "data-matrix"}"#).unwrap();
//! assert_eq!(options.dpi, 203);
//! assert_eq!(options.symbology, Symbology::DataMatrix);
//! ```

mod catalog;
mod composer;
mod encoder;
mod error;
mod export;
mod geometry;
mod options;
mod record;
mod render;
mod template;

pub use catalog::{LabelConfig, PartCatalog, PartCatalogEntry, SUPPLIER_ID};
pub use composer::{LabelComposer, LabelImage};
pub use encoder::{MatrixCode, Symbology, encode};
pub use error::{LabelError, LabelResult};
pub use export::{
    DEFAULT_PAGE_SIZE, DirectorySink, PDF_FILE_NAME, PDF_MIME_TYPE, PrintDocument, PrintSink,
    export_pdf,
};
pub use geometry::{PhysicalSize, RectPx, SizePx, mm_to_pt, mm_to_px};
pub use options::{DEFAULT_DPI, MAX_DPI, MIN_DPI, RenderOptions};
pub use record::{LabelDraft, LabelRecord, PAYLOAD_SEPARATOR, PayloadDateFormat};
pub use render::{FontLibrary, LogoAsset};
pub use template::{LabelLayout, LabelTemplate, REFERENCE_DPI, STANDARD_LABEL_SIZE};
