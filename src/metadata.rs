//! EXIF metadata extraction.

use std::collections::BTreeMap;
use std::io::Cursor;

use exif::{Context, Exif, Field, In, Tag, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sentinel for recognised fields that the image doesn't carry.
pub const NOT_AVAILABLE: &str = "Tidak tersedia";
/// Key of the note used when an image has no EXIF block.
pub const FIELD_INFO: &str = "Info";
/// Key of the diagnostic used when EXIF decoding fails.
pub const FIELD_ERROR: &str = "Error";
/// Capture timestamp key.
pub const FIELD_CAPTURED: &str = "Tanggal Pengambilan";
/// Camera model key.
pub const FIELD_CAMERA: &str = "Kamera";
/// GPS block key.
pub const FIELD_GPS: &str = "GPS";
/// Note stored under [`FIELD_INFO`].
pub const NO_METADATA_NOTE: &str = "Tidak ada metadata EXIF pada gambar.";

/// Heading of the metadata block appended to captions.
pub const METADATA_HEADING: &str = "[Metadata Gambar]";

/// One decoded metadata value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExifValue {
    /// Plain text.
    Text(String),
    /// GPS tag name to raw component text.
    Nested(BTreeMap<String, String>),
}

impl ExifValue {
    /// The text of a scalar value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExifValue::Text(text) => Some(text),
            ExifValue::Nested(_) => None,
        }
    }
}

/// Human-readable metadata fields for one image.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExifRecord {
    fields: BTreeMap<String, ExifValue>,
}

impl ExifRecord {
    /// A record carrying only the "no metadata" note.
    pub fn no_metadata() -> Self {
        Self::single(FIELD_INFO, NO_METADATA_NOTE)
    }

    /// A record carrying only a decoding diagnostic.
    pub fn failed(error: &MetadataError) -> Self {
        Self::single(FIELD_ERROR, &error.to_string())
    }

    fn single(key: &str, value: &str) -> Self {
        let mut record = Self::default();
        record.insert(key, ExifValue::Text(value.to_string()));
        record
    }

    fn insert(&mut self, key: &str, value: ExifValue) {
        self.fields.insert(key.to_string(), value);
    }

    /// Looks up a field.
    pub fn get(&self, key: &str) -> Option<&ExifValue> {
        self.fields.get(key)
    }

    /// Field names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// True when there are no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Scalar fields as `(name, value)` pairs; nested blocks are skipped.
    pub fn scalar_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(key, value)| value.as_text().map(|text| (key.as_str(), text)))
    }

    /// Every field as `(name, text)`, nested blocks flattened to
    /// `tag: value` pairs joined with `; `.
    pub fn display_lines(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    ExifValue::Text(text) => text.clone(),
                    ExifValue::Nested(block) => block
                        .iter()
                        .map(|(tag, raw)| format!("{tag}: {raw}"))
                        .collect::<Vec<_>>()
                        .join("; "),
                };
                (key.clone(), text)
            })
            .collect()
    }

    /// Renders the `[Metadata Gambar]` block, or `None` if there is nothing
    /// scalar to show.
    pub fn render_block(&self) -> Option<String> {
        let lines: Vec<String> = self
            .scalar_fields()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        if lines.is_empty() {
            return None;
        }
        Some(format!("{METADATA_HEADING}\n{}", lines.join("\n")))
    }
}

/// Why metadata couldn't be read.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The image has no EXIF block.
    #[error("no EXIF data found")]
    Missing,
    /// The EXIF block is there but unreadable.
    #[error("Gagal membaca metadata: {0}")]
    Decode(String),
}

/// Reads the recognised EXIF fields from encoded image bytes.
pub fn extract_metadata(bytes: &[u8]) -> Result<ExifRecord, MetadataError> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .map_err(|err| match err {
            exif::Error::NotFound(_) => MetadataError::Missing,
            other => MetadataError::Decode(other.to_string()),
        })?;
    Ok(record_from(&exif))
}

/// Like [`extract_metadata`], but folds failures into the record itself.
pub fn read_metadata(bytes: &[u8]) -> ExifRecord {
    match extract_metadata(bytes) {
        Ok(record) => record,
        Err(MetadataError::Missing) => ExifRecord::no_metadata(),
        Err(err) => {
            debug!("EXIF decoding failed: {}", err);
            ExifRecord::failed(&err)
        }
    }
}

fn record_from(exif: &Exif) -> ExifRecord {
    let mut record = ExifRecord::default();

    let captured = [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .find_map(|tag| exif.get_field(tag, In::PRIMARY))
        .map(|field| raw_value(&field.value));
    record.insert(
        FIELD_CAPTURED,
        ExifValue::Text(captured.unwrap_or_else(|| NOT_AVAILABLE.to_string())),
    );

    let camera = exif
        .get_field(Tag::Model, In::PRIMARY)
        .map(|field| raw_value(&field.value));
    record.insert(
        FIELD_CAMERA,
        ExifValue::Text(camera.unwrap_or_else(|| NOT_AVAILABLE.to_string())),
    );

    let gps: BTreeMap<String, String> = exif
        .fields()
        .filter(|field| is_gps(field))
        .map(|field| (field.tag.to_string(), raw_value(&field.value)))
        .collect();
    let gps = if gps.is_empty() {
        ExifValue::Text(NOT_AVAILABLE.to_string())
    } else {
        ExifValue::Nested(gps)
    };
    record.insert(FIELD_GPS, gps);

    record
}

fn is_gps(field: &Field) -> bool {
    field.ifd_num == In::PRIMARY && field.tag.context() == Context::Gps
}

/// Renders a value without unit conversion; rationals stay `num/denom`.
fn raw_value(value: &Value) -> String {
    fn join<T: ToString>(items: &[T]) -> String {
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    match value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|part| String::from_utf8_lossy(part).trim_end_matches('\0').trim().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Byte(items) => join(items),
        Value::Short(items) => join(items),
        Value::Long(items) => join(items),
        Value::SByte(items) => join(items),
        Value::SShort(items) => join(items),
        Value::SLong(items) => join(items),
        Value::Float(items) => join(items),
        Value::Double(items) => join(items),
        Value::Rational(items) => items
            .iter()
            .map(|item| format!("{}/{}", item.num, item.denom))
            .collect::<Vec<_>>()
            .join(", "),
        Value::SRational(items) => items
            .iter()
            .map(|item| format!("{}/{}", item.num, item.denom))
            .collect::<Vec<_>>()
            .join(", "),
        other => format!("{other:?}"),
    }
}
