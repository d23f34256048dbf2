//! Logo and font assets.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use resvg::usvg::fontdb::Database;
use tracing::debug;

use crate::error::{LabelError, LabelResult};

const DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

// ============================================================================
// LogoAsset
// ============================================================================

/// Where the label logo comes from.
#[derive(Debug, Clone, Default)]
pub enum LogoAsset {
    /// No logo supplied.
    #[default]
    None,
    /// An already decoded image.
    Image(DynamicImage),
    /// Encoded image bytes (PNG, JPEG, ...).
    Bytes(Vec<u8>),
    /// An image file on disk.
    Path(PathBuf),
}

impl LogoAsset {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Short description used in errors and logs.
    pub fn describe(&self) -> String {
        match self {
            Self::None => "logo".to_string(),
            Self::Image(_) => "logo (in-memory image)".to_string(),
            Self::Bytes(bytes) => format!("logo ({} bytes)", bytes.len()),
            Self::Path(path) => path.display().to_string(),
        }
    }

    /// Loads and decodes the logo.
    ///
    /// Fails with [`LabelError::MissingAsset`] when no logo is configured or
    /// the source cannot be read or decoded.
    pub fn resolve(&self) -> LabelResult<Cow<'_, DynamicImage>> {
        match self {
            Self::None => Err(LabelError::missing(self.describe(), "no logo supplied")),
            Self::Image(image) => Ok(Cow::Borrowed(image)),
            Self::Bytes(bytes) => image::load_from_memory(bytes)
                .map(Cow::Owned)
                .map_err(|e| LabelError::missing(self.describe(), e.to_string())),
            Self::Path(path) => image::open(path)
                .map(Cow::Owned)
                .map_err(|e| LabelError::missing(self.describe(), e.to_string())),
        }
    }
}

// ============================================================================
// FontLibrary
// ============================================================================

/// Fonts available to the label text renderer.
///
/// Cloning is cheap; the underlying database is shared and never modified
/// once the library has been handed to a composer.
#[derive(Clone, Default)]
pub struct FontLibrary {
    db: Arc<Database>,
}

impl FontLibrary {
    /// An empty library. Text renders as nothing until fonts are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// A library holding the fonts compiled into the crate (DejaVu Sans
    /// regular and bold). Always able to draw label text.
    pub fn bundled() -> Self {
        Self::new().with_bundled_fonts()
    }

    /// A library holding the fonts installed on this system.
    pub fn system() -> Self {
        Self::new().with_system_fonts()
    }

    pub fn with_bundled_fonts(self) -> Self {
        self.with_font_data(DEJAVU_SANS.to_vec())
            .with_font_data(DEJAVU_SANS_BOLD.to_vec())
    }

    pub fn with_system_fonts(mut self) -> Self {
        Arc::make_mut(&mut self.db).load_system_fonts();
        debug!(faces = self.db.len(), "loaded system fonts");
        self
    }

    /// Adds every face in a font file.
    pub fn with_font_file(mut self, path: impl AsRef<Path>) -> LabelResult<Self> {
        let path = path.as_ref();
        let before = self.db.len();
        Arc::make_mut(&mut self.db)
            .load_font_file(path)
            .map_err(|e| LabelError::missing(path.display().to_string(), e.to_string()))?;

        if self.db.len() == before {
            return Err(LabelError::missing(
                path.display().to_string(),
                "file contains no usable font faces",
            ));
        }
        debug!(path = %path.display(), faces = self.db.len() - before, "loaded font file");
        Ok(self)
    }

    /// Adds every face in an in-memory font.
    pub fn with_font_data(mut self, data: Vec<u8>) -> Self {
        Arc::make_mut(&mut self.db).load_font_data(data);
        self
    }

    /// Number of loaded font faces.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.len() == 0
    }

    pub(crate) fn database(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }
}

impl fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontLibrary")
            .field("faces", &self.db.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 2, Rgba([0, 128, 0, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn none_is_missing() {
        match LogoAsset::None.resolve() {
            Err(LabelError::MissingAsset { asset, .. }) => assert_eq!(asset, "logo"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn bytes_are_decoded() {
        let logo = LogoAsset::Bytes(png_bytes());
        let img = logo.resolve().unwrap();
        assert_eq!((img.width(), img.height()), (4, 2));
    }

    #[test]
    fn garbage_bytes_are_missing_asset() {
        let logo = LogoAsset::Bytes(vec![1, 2, 3]);
        assert!(matches!(logo.resolve(), Err(LabelError::MissingAsset { .. })));
    }

    #[test]
    fn missing_file_names_the_path() {
        let logo = LogoAsset::from_path("/definitely/not/here/logoPMK.png");
        match logo.resolve() {
            Err(LabelError::MissingAsset { asset, .. }) => assert!(asset.ends_with("logoPMK.png")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn file_logo_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let logo = LogoAsset::from_path(&path);
        let img = logo.resolve().unwrap();
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn missing_font_file_is_missing_asset() {
        let result = FontLibrary::new().with_font_file("/definitely/not/here.ttf");
        assert!(matches!(result, Err(LabelError::MissingAsset { .. })));
    }

    #[test]
    fn non_font_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-font.ttf");
        std::fs::write(&path, b"plain text").unwrap();

        let result = FontLibrary::new().with_font_file(&path);
        assert!(matches!(result, Err(LabelError::MissingAsset { .. })));
    }

    #[test]
    fn bundled_library_has_regular_and_bold() {
        let fonts = FontLibrary::bundled();
        assert_eq!(fonts.face_count(), 2);

        let db = fonts.database();
        let weights: Vec<u16> = db
            .faces()
            .filter(|face| face.families.iter().any(|(name, _)| name == "DejaVu Sans"))
            .map(|face| face.weight.0)
            .collect();
        assert!(weights.contains(&400), "regular face: {weights:?}");
        assert!(weights.contains(&700), "bold face: {weights:?}");
    }

    #[test]
    fn empty_library() {
        let fonts = FontLibrary::new();
        assert!(fonts.is_empty());
        assert_eq!(fonts.face_count(), 0);
        assert_eq!(format!("{fonts:?}"), "FontLibrary { faces: 0 }");
    }
}
