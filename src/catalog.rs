//! Part catalog and label configuration.
//!
//! A [`LabelConfig`] is built once and injected into the composer. It owns
//! the part catalog, the supplier id and the payload date format, and turns
//! user drafts into complete [`LabelRecord`]s.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "supplierId": "13785",
//!   "payloadDateFormat": "slashed",
//!   "catalog": {
//!     "7000448C93": {
//!       "releaseLevel": "A",
//!       "manufactureSerial": "13785",
//!       "matrixCodeLabel": "PR019"
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, LabelResult};
use crate::record::{LabelDraft, LabelRecord, PAYLOAD_SEPARATOR, PayloadDateFormat};

/// Supplier code printed on every label.
pub const SUPPLIER_ID: &str = "13785";

/// Default field values for one part number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PartCatalogEntry {
    pub release_level: String,
    pub manufacture_serial: String,
    pub matrix_code_label: String,
}

impl PartCatalogEntry {
    pub fn new(
        release_level: impl Into<String>,
        manufacture_serial: impl Into<String>,
        matrix_code_label: impl Into<String>,
    ) -> Self {
        Self {
            release_level: release_level.into(),
            manufacture_serial: manufacture_serial.into(),
            matrix_code_label: matrix_code_label.into(),
        }
    }
}

/// Read-only mapping from part number to its defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PartCatalog {
    entries: BTreeMap<String, PartCatalogEntry>,
}

impl PartCatalog {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, PartCatalogEntry)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The catalog shipped with the MWM label template.
    pub fn mwm() -> Self {
        Self::from_entries([
            ("7000448C93", PartCatalogEntry::new("A", "13785", "PR019")),
            ("7000666C93", PartCatalogEntry::new("A", "13785", "PR018")),
            ("961201150166", PartCatalogEntry::new("A", "13785", "PR020")),
            ("7000449C3", PartCatalogEntry::new("A", "13785", "PR023")),
        ])
    }

    pub fn get(&self, part_number: &str) -> Option<&PartCatalogEntry> {
        self.entries.get(part_number)
    }

    pub fn contains(&self, part_number: &str) -> bool {
        self.entries.contains_key(part_number)
    }

    /// Part numbers in sorted order.
    pub fn part_numbers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable configuration injected into the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct LabelConfig {
    #[serde(default = "default_supplier_id")]
    pub supplier_id: String,

    /// Owned by whoever maintains the scanning consumer.
    #[serde(default)]
    pub payload_date_format: PayloadDateFormat,

    #[serde(default = "PartCatalog::mwm")]
    pub catalog: PartCatalog,
}

fn default_supplier_id() -> String {
    SUPPLIER_ID.to_string()
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            supplier_id: default_supplier_id(),
            payload_date_format: PayloadDateFormat::default(),
            catalog: PartCatalog::mwm(),
        }
    }
}

impl LabelConfig {
    pub fn new(catalog: PartCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn with_supplier_id(mut self, supplier_id: impl Into<String>) -> Self {
        self.supplier_id = supplier_id.into();
        self
    }

    pub fn with_payload_date_format(mut self, format: PayloadDateFormat) -> Self {
        self.payload_date_format = format;
        self
    }

    /// Resolves a draft into a complete record.
    ///
    /// Missing overrides come from the catalog entry for the part number. A
    /// part number outside the catalog is accepted only when the draft
    /// overrides all three catalog fields.
    pub fn resolve(&self, draft: &LabelDraft) -> LabelResult<LabelRecord> {
        let part_number = draft.part_number.trim();
        if part_number.is_empty() {
            return Err(LabelError::invalid("partNumber", "part number is empty"));
        }

        let entry = self.catalog.get(part_number);
        let pick = |field: &str, value: &Option<String>, default: Option<&String>| {
            value
                .clone()
                .or_else(|| default.cloned())
                .ok_or_else(|| {
                    LabelError::invalid(
                        "partNumber",
                        format!("`{part_number}` is not in the part catalog and `{field}` was not supplied"),
                    )
                })
        };

        let record = LabelRecord {
            manufacture_date: draft.manufacture_date,
            part_number: part_number.to_string(),
            release_level: pick(
                "releaseLevel",
                &draft.release_level,
                entry.map(|e| &e.release_level),
            )?,
            manufacture_serial: pick(
                "manufactureSerial",
                &draft.manufacture_serial,
                entry.map(|e| &e.manufacture_serial),
            )?,
            supplier_id: self.supplier_id.clone(),
            invoice_number: draft.invoice_number.trim().to_string(),
            matrix_code_label: pick(
                "matrixCodeLabel",
                &draft.matrix_code_label,
                entry.map(|e| &e.matrix_code_label),
            )?,
        };

        check_separator(&record)?;
        Ok(record)
    }

    /// Serializes the config to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Rejects records whose fields would split the payload.
pub(crate) fn check_separator(record: &LabelRecord) -> LabelResult<()> {
    let fields = [
        ("partNumber", &record.part_number),
        ("releaseLevel", &record.release_level),
        ("manufactureSerial", &record.manufacture_serial),
        ("supplierId", &record.supplier_id),
        ("invoiceNumber", &record.invoice_number),
    ];
    for (name, value) in fields {
        if value.contains(PAYLOAD_SEPARATOR) {
            return Err(LabelError::invalid(
                name,
                format!("`{value}` contains the payload separator `{PAYLOAD_SEPARATOR}`"),
            ));
        }
    }
    Ok(())
}
