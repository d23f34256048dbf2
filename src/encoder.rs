//! Matrix-code encoding (QR and Data Matrix).
//!
//! [`encode`] produces a raster at the native module size: one pixel per
//! module, black on white, surrounded by the symbology's quiet zone. Callers
//! scale the result with [`MatrixCode::scaled_to_fit`].

use std::fmt;

use datamatrix::{DataMatrix, SymbolList};
use image::{GrayImage, Luma, imageops};
use qrcode::bits::Bits;
use qrcode::types::{QrError, QrResult, Version};
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};

use crate::error::{LabelError, LabelResult};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// ECI assignment number for UTF-8.
const ECI_UTF8: u32 = 26;

/// Supported 2D symbologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Symbology {
    #[default]
    Qr,
    DataMatrix,
}

impl Symbology {
    /// Quiet zone width in modules.
    pub fn quiet_zone(self) -> u32 {
        match self {
            Self::Qr => 4,
            Self::DataMatrix => 1,
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qr => f.write_str("QR"),
            Self::DataMatrix => f.write_str("Data Matrix"),
        }
    }
}

/// An encoded symbol rasterized at one pixel per module.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixCode {
    pub symbology: Symbology,
    /// Symbol size in modules, quiet zone excluded.
    pub modules: (u32, u32),
    pub image: GrayImage,
}

impl MatrixCode {
    /// Whether the native raster fits in a `side` x `side` square.
    pub fn fits(&self, side: u32) -> bool {
        self.image.width() <= side && self.image.height() <= side
    }

    /// Scales the raster by the largest whole factor that fits in a
    /// `side` x `side` square. Every module stays the same pixel size.
    ///
    /// Returns the unscaled raster when it is already larger than `side`;
    /// check [`MatrixCode::fits`] first.
    pub fn scaled_to_fit(&self, side: u32) -> GrayImage {
        let longest = self.image.width().max(self.image.height());
        let factor = (side / longest.max(1)).max(1);
        imageops::resize(
            &self.image,
            self.image.width() * factor,
            self.image.height() * factor,
            imageops::FilterType::Nearest,
        )
    }
}

/// Encodes `payload` as a matrix code of the given symbology.
///
/// Fails with [`LabelError::Encoding`] when the payload is empty or does not
/// fit the largest symbol. Data is never truncated.
pub fn encode(payload: &str, symbology: Symbology) -> LabelResult<MatrixCode> {
    if payload.is_empty() {
        return Err(encoding_error(symbology, "payload is empty"));
    }

    match symbology {
        Symbology::Qr => encode_qr(payload),
        Symbology::DataMatrix => encode_data_matrix(payload),
    }
}

fn encode_qr(payload: &str) -> LabelResult<MatrixCode> {
    let code = if payload.is_ascii() {
        QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
    } else {
        utf8_qr(payload.as_bytes(), EcLevel::M)
    }
    .map_err(|e| encoding_error(Symbology::Qr, e.to_string()))?;

    let width = code.width() as u32;
    let modules = code.to_colors();
    let dark = modules.iter().enumerate().filter_map(|(i, color)| {
        (*color == Color::Dark).then(|| (i as u32 % width, i as u32 / width))
    });

    Ok(rasterize(Symbology::Qr, (width, width), dark))
}

/// Byte-mode QR prefixed with a UTF-8 ECI, in the smallest version that
/// holds it.
fn utf8_qr(data: &[u8], ec_level: EcLevel) -> QrResult<QrCode> {
    for version in 1..=40 {
        match utf8_bits(data, Version::Normal(version), ec_level) {
            Ok(bits) => return QrCode::with_bits(bits, ec_level),
            Err(QrError::DataTooLong) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(QrError::DataTooLong)
}

fn utf8_bits(data: &[u8], version: Version, ec_level: EcLevel) -> QrResult<Bits> {
    let mut bits = Bits::new(version);
    bits.push_eci_designator(ECI_UTF8)?;
    bits.push_byte_data(data)?;
    bits.push_terminator(ec_level)?;
    Ok(bits)
}

fn encode_data_matrix(payload: &str) -> LabelResult<MatrixCode> {
    let code = DataMatrix::encode_str(payload, SymbolList::default())
        .map_err(|e| encoding_error(Symbology::DataMatrix, format!("{e:?}")))?;

    let bitmap = code.bitmap();
    let size = (bitmap.width() as u32, bitmap.height() as u32);
    let dark = bitmap.pixels().map(|(x, y)| (x as u32, y as u32));

    Ok(rasterize(Symbology::DataMatrix, size, dark))
}

/// Paints dark modules onto a white raster with the quiet zone applied.
fn rasterize(
    symbology: Symbology,
    modules: (u32, u32),
    dark: impl Iterator<Item = (u32, u32)>,
) -> MatrixCode {
    let quiet = symbology.quiet_zone();
    let mut image = GrayImage::from_pixel(modules.0 + 2 * quiet, modules.1 + 2 * quiet, LIGHT);
    for (x, y) in dark {
        image.put_pixel(x + quiet, y + quiet, DARK);
    }

    MatrixCode {
        symbology,
        modules,
        image,
    }
}

fn encoding_error(symbology: Symbology, reason: impl Into<String>) -> LabelError {
    LabelError::Encoding {
        symbology: symbology.to_string(),
        reason: reason.into(),
    }
}

/// Decodes the first readable QR symbol in `image` with an independent reader.
#[cfg(test)]
pub(crate) fn decode_qr(image: &GrayImage) -> String {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32)[0],
    );
    prepared
        .detect_grids()
        .iter()
        .find_map(|grid| grid.decode().ok())
        .map(|(_, content)| content)
        .expect("image should contain a decodable QR symbol")
}

/// Decodes a symbol of the given symbology with rxing. The raster is padded
/// with white first so the detector sees a generous quiet zone.
#[cfg(test)]
pub(crate) fn decode_symbol(image: &GrayImage, symbology: Symbology) -> String {
    const PAD: u32 = 16;
    let mut padded = GrayImage::from_pixel(image.width() + 2 * PAD, image.height() + 2 * PAD, LIGHT);
    imageops::replace(&mut padded, image, PAD as i64, PAD as i64);

    let format = match symbology {
        Symbology::Qr => rxing::BarcodeFormat::QR_CODE,
        Symbology::DataMatrix => rxing::BarcodeFormat::DATA_MATRIX,
    };
    rxing::helpers::detect_in_luma(padded.as_raw().clone(), padded.width(), padded.height(), Some(format))
        .expect("image should contain a decodable symbol")
        .getText()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = "15/03/2024;7000448C93;A;13785;13785;NF-9911";

    #[test]
    fn qr_raster_includes_quiet_zone() {
        let code = encode(PAYLOAD, Symbology::Qr).unwrap();
        let (w, h) = code.modules;
        assert_eq!(w, h);
        assert_eq!(code.image.width(), w + 8);
        // Quiet zone corners are white, finder pattern corner is black
        assert_eq!(code.image.get_pixel(0, 0), &LIGHT);
        assert_eq!(code.image.get_pixel(4, 4), &DARK);
    }

    #[test]
    fn qr_roundtrip_through_reader() {
        let code = encode(PAYLOAD, Symbology::Qr).unwrap();
        let scaled = code.scaled_to_fit(400);
        assert_eq!(decode_qr(&scaled), PAYLOAD);
    }

    #[test]
    fn qr_roundtrip_with_empty_trailing_field() {
        let payload = "15/03/2024;7000448C93;A;13785;13785;";
        let code = encode(payload, Symbology::Qr).unwrap();
        assert_eq!(decode_qr(&code.scaled_to_fit(400)), payload);
    }

    #[test]
    fn data_matrix_roundtrip_through_reader() {
        let code = encode(PAYLOAD, Symbology::DataMatrix).unwrap();
        let scaled = code.scaled_to_fit(200);
        assert_eq!(decode_symbol(&scaled, Symbology::DataMatrix), PAYLOAD);
    }

    #[test]
    fn non_ascii_payload_roundtrips() {
        let payload = "15/03/2024;7000448C93;Á;13785;13785;Nº 12";
        for symbology in [Symbology::Qr, Symbology::DataMatrix] {
            let code = encode(payload, symbology).unwrap();
            let decoded = decode_symbol(&code.scaled_to_fit(300), symbology);
            assert_eq!(decoded, payload, "{symbology}");
        }
    }

    #[test]
    fn non_ascii_qr_grows_only_as_needed() {
        let code = encode("Nº 1", Symbology::Qr).unwrap();
        assert_eq!(code.modules, (21, 21));
        assert_eq!(decode_symbol(&code.scaled_to_fit(200), Symbology::Qr), "Nº 1");
    }

    #[test]
    fn encoding_is_deterministic() {
        for symbology in [Symbology::Qr, Symbology::DataMatrix] {
            let a = encode(PAYLOAD, symbology).unwrap();
            let b = encode(PAYLOAD, symbology).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn data_matrix_has_finder_pattern() {
        let code = encode(PAYLOAD, Symbology::DataMatrix).unwrap();
        let (w, h) = code.modules;
        assert_eq!(code.image.width(), w + 2);
        assert_eq!(code.image.height(), h + 2);

        // Solid "L": left column and bottom row are all dark
        for y in 0..h {
            assert_eq!(code.image.get_pixel(1, y + 1), &DARK);
        }
        for x in 0..w {
            assert_eq!(code.image.get_pixel(x + 1, h), &DARK);
        }
    }

    #[test]
    fn empty_payload_fails() {
        for symbology in [Symbology::Qr, Symbology::DataMatrix] {
            match encode("", symbology) {
                Err(LabelError::Encoding { reason, .. }) => assert!(reason.contains("empty")),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn oversized_payload_fails_instead_of_truncating() {
        let payload = "9".repeat(10_000);
        assert!(matches!(
            encode(&payload, Symbology::Qr),
            Err(LabelError::Encoding { .. })
        ));
        assert!(matches!(
            encode(&payload, Symbology::DataMatrix),
            Err(LabelError::Encoding { .. })
        ));
    }

    #[test]
    fn scaling_uses_whole_module_factor() {
        let code = encode(PAYLOAD, Symbology::Qr).unwrap();
        let native = code.image.width();
        let scaled = code.scaled_to_fit(native * 3 + 1);
        assert_eq!(scaled.width(), native * 3);

        let tiny = code.scaled_to_fit(1);
        assert_eq!(tiny.width(), native);
        assert!(!code.fits(native - 1));
        assert!(code.fits(native));
    }
}
