//! Label records and the payload encoded into the matrix code.
//!
//! The payload is a contract with scanning consumers: six fields joined by
//! [`PAYLOAD_SEPARATOR`] in a fixed order. Changing the order or the date
//! format breaks every reader downstream.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Separator between payload fields.
pub const PAYLOAD_SEPARATOR: &str = ";";

/// Date format used for the printed manufacture date.
pub const PRINTED_DATE_FORMAT: &str = "%d/%m/%Y";

/// How the manufacture date is written inside the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum PayloadDateFormat {
    /// `dd/mm/yyyy`, identical to the printed text.
    #[default]
    Slashed,
    /// `ddmmyyyy`.
    Compact,
}

impl PayloadDateFormat {
    fn pattern(self) -> &'static str {
        match self {
            Self::Slashed => PRINTED_DATE_FORMAT,
            Self::Compact => "%d%m%Y",
        }
    }

    pub fn format(self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }
}

/// A fully resolved label. Every field is present.
///
/// Build one through [`LabelConfig::resolve`](crate::LabelConfig::resolve),
/// which fills catalog defaults and the supplier id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    pub manufacture_date: NaiveDate,
    pub part_number: String,
    pub release_level: String,
    pub manufacture_serial: String,
    pub supplier_id: String,
    pub invoice_number: String,
    pub matrix_code_label: String,
}

impl LabelRecord {
    /// Manufacture date as printed on the label.
    pub fn printed_date(&self) -> String {
        self.manufacture_date.format(PRINTED_DATE_FORMAT).to_string()
    }

    /// Builds the matrix-code payload.
    ///
    /// `date;partNumber;releaseLevel;manufactureSerial;supplierId;invoiceNumber`.
    /// An empty invoice number leaves a trailing empty field.
    pub fn payload(&self, date_format: PayloadDateFormat) -> String {
        let date = date_format.format(self.manufacture_date);
        let fields = [
            date.as_str(),
            self.part_number.as_str(),
            self.release_level.as_str(),
            self.manufacture_serial.as_str(),
            self.supplier_id.as_str(),
            self.invoice_number.as_str(),
        ];
        fields.join(PAYLOAD_SEPARATOR)
    }

    /// Caption/value rows in print order.
    pub fn printed_fields(&self) -> [(&'static str, String); 6] {
        [
            ("Data de Fabricação", self.printed_date()),
            ("Part Number MWM", self.part_number.clone()),
            ("Nível de Liberação", self.release_level.clone()),
            ("Serial de Fabricação", self.manufacture_serial.clone()),
            ("Código do Fornecedor", self.supplier_id.clone()),
            ("Número da NF", self.invoice_number.clone()),
        ]
    }
}

/// Values entered by the user before catalog defaults are applied.
///
/// `None` overrides are taken from the part catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDraft {
    pub manufacture_date: NaiveDate,
    pub part_number: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacture_serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_code_label: Option<String>,
}

impl LabelDraft {
    pub fn new(manufacture_date: NaiveDate, part_number: impl Into<String>) -> Self {
        Self {
            manufacture_date,
            part_number: part_number.into(),
            invoice_number: String::new(),
            release_level: None,
            manufacture_serial: None,
            matrix_code_label: None,
        }
    }

    pub fn with_invoice(mut self, invoice_number: impl Into<String>) -> Self {
        self.invoice_number = invoice_number.into();
        self
    }

    pub fn with_release_level(mut self, release_level: impl Into<String>) -> Self {
        self.release_level = Some(release_level.into());
        self
    }

    pub fn with_manufacture_serial(mut self, serial: impl Into<String>) -> Self {
        self.manufacture_serial = Some(serial.into());
        self
    }

    pub fn with_matrix_code_label(mut self, label: impl Into<String>) -> Self {
        self.matrix_code_label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(invoice: &str) -> LabelRecord {
        LabelRecord {
            manufacture_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            part_number: "7000448C93".into(),
            release_level: "A".into(),
            manufacture_serial: "13785".into(),
            supplier_id: "13785".into(),
            invoice_number: invoice.into(),
            matrix_code_label: "PR019".into(),
        }
    }

    #[test]
    fn payload_matches_scanner_contract() {
        assert_eq!(
            record("NF-9911").payload(PayloadDateFormat::Slashed),
            "15/03/2024;7000448C93;A;13785;13785;NF-9911"
        );
    }

    #[test]
    fn empty_invoice_leaves_trailing_field() {
        let payload = record("").payload(PayloadDateFormat::Slashed);
        assert_eq!(payload, "15/03/2024;7000448C93;A;13785;13785;");
        assert_eq!(payload.split(PAYLOAD_SEPARATOR).count(), 6);
    }

    #[test]
    fn compact_date_format() {
        assert_eq!(
            record("1").payload(PayloadDateFormat::Compact),
            "15032024;7000448C93;A;13785;13785;1"
        );
    }

    #[test]
    fn single_digit_days_are_zero_padded() {
        let mut rec = record("X");
        rec.manufacture_date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(rec.printed_date(), "02/01/2025");
    }

    #[test]
    fn printed_fields_follow_payload_order() {
        let rec = record("NF-1");
        let values: Vec<String> = rec.printed_fields().into_iter().map(|(_, v)| v).collect();
        assert_eq!(values.join(";"), rec.payload(PayloadDateFormat::Slashed));
    }

    #[test]
    fn draft_deserializes_without_overrides() {
        let json = r#"{"manufactureDate":"2024-03-15","partNumber":"7000666C93"}"#;
        let draft: LabelDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.part_number, "7000666C93");
        assert!(draft.invoice_number.is_empty());
        assert!(draft.release_level.is_none());
    }
}
