//! Filling a PDF template's fields into a downloadable document layout.
//!
//! Generation takes a template's field collection plus user-supplied values
//! and produces a [`FilledDocument`]: one [`Placement`] per field with its
//! rectangle converted to PDF points (bottom-left origin, as PDF content
//! streams expect) and its value coerced to the field's type.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::pdf_field::{FieldType, PdfField};
use crate::whatsapp::format_phone_for_whatsapp;

/// Date values are accepted in ISO form.
pub const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date values are rendered day-first.
pub const OUTPUT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Font size used when a field does not specify one.
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

// ---------------------------------------------------------------------------
// Page size
// ---------------------------------------------------------------------------

/// Physical page size, in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            other => Err(format!("Unknown page size '{other}'. Must be one of: a4, letter")),
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A field's coerced value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilledContent {
    Text(String),
    Checked(bool),
    Signature(String),
    Empty,
}

/// One field laid out on its page in absolute coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub field_id: String,
    pub field_type: FieldType,
    /// Left edge in points.
    pub x: f64,
    /// Bottom edge in points, measured from the page bottom.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f32,
    pub content: FilledContent,
}

/// The result of filling a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilledDocument {
    pub page_size: PageSize,
    pub page_width: f64,
    pub page_height: f64,
    /// Placements grouped by 1-based page number.
    pub pages: BTreeMap<u32, Vec<Placement>>,
}

impl FilledDocument {
    pub fn placement(&self, field_id: &str) -> Option<&Placement> {
        self.pages
            .values()
            .flat_map(|p| p.iter())
            .find(|p| p.field_id == field_id)
    }
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

/// Why a single field could not be filled.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFillError {
    pub field_id: String,
    pub reason: String,
}

impl fmt::Display for FieldFillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_id, self.reason)
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a raw JSON value to the content for `field_type`.
///
/// Returns `Ok(FilledContent::Empty)` when the value is absent or blank.
pub fn coerce_value(field_type: FieldType, value: &Value) -> Result<FilledContent, String> {
    if field_type == FieldType::Checkbox {
        return match value {
            Value::Null => Ok(FilledContent::Empty),
            Value::Bool(b) => Ok(FilledContent::Checked(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(FilledContent::Empty),
                "true" | "on" | "yes" | "si" | "sí" | "1" => Ok(FilledContent::Checked(true)),
                "false" | "off" | "no" | "0" => Ok(FilledContent::Checked(false)),
                other => Err(format!("'{other}' is not a checkbox value")),
            },
            other => Err(format!("{other} is not a checkbox value")),
        };
    }

    if matches!(value, Value::Array(_) | Value::Object(_)) {
        return Err("expected a scalar value".to_string());
    }
    let Some(text) = value_as_text(value) else {
        return Ok(FilledContent::Empty);
    };

    match field_type {
        FieldType::Text => Ok(FilledContent::Text(text)),
        FieldType::Number => text
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|_| FilledContent::Text(text.clone()))
            .ok_or_else(|| format!("'{text}' is not a number")),
        FieldType::Email => {
            if text.contains('@') {
                Ok(FilledContent::Text(text))
            } else {
                Err(format!("'{text}' is not an email address"))
            }
        }
        FieldType::Phone => {
            let digits = format_phone_for_whatsapp(&text);
            if digits.is_empty() {
                Err(format!("'{text}' contains no digits"))
            } else {
                Ok(FilledContent::Text(digits))
            }
        }
        FieldType::Date => NaiveDate::parse_from_str(&text, INPUT_DATE_FORMAT)
            .map(|d| FilledContent::Text(d.format(OUTPUT_DATE_FORMAT).to_string()))
            .map_err(|_| format!("'{text}' is not a date in YYYY-MM-DD format")),
        FieldType::Signature => Ok(FilledContent::Signature(text)),
        FieldType::Checkbox => Err("checkbox values must be booleans".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Filling
// ---------------------------------------------------------------------------

/// Null and whitespace-only strings count as no value.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Fill `fields` with `values` (keyed by field id) on pages of `page_size`.
///
/// Missing values fall back to the field's `default_value`. Every field
/// that fails coercion, and every required field left empty, is collected
/// and reported together in a single validation error.
pub fn fill_pdf_fields(
    fields: &[PdfField],
    values: &HashMap<String, Value>,
    page_size: PageSize,
) -> Result<FilledDocument, CoreError> {
    let (page_width, page_height) = page_size.dimensions();
    let mut pages: BTreeMap<u32, Vec<Placement>> = BTreeMap::new();
    let mut errors: Vec<FieldFillError> = Vec::new();

    for field in fields {
        let raw = values
            .get(&field.id)
            .filter(|v| !is_blank(v))
            .cloned()
            .or_else(|| field.default_value.clone().map(Value::String))
            .unwrap_or(Value::Null);

        let content = match coerce_value(field.field_type, &raw) {
            Ok(content) => content,
            Err(reason) => {
                errors.push(FieldFillError {
                    field_id: field.id.clone(),
                    reason,
                });
                continue;
            }
        };

        if field.required && content == FilledContent::Empty {
            errors.push(FieldFillError {
                field_id: field.id.clone(),
                reason: "required field has no value".to_string(),
            });
            continue;
        }

        let width = field.width * page_width;
        let height = field.height * page_height;
        pages.entry(field.page).or_default().push(Placement {
            field_id: field.id.clone(),
            field_type: field.field_type,
            x: field.x * page_width,
            y: page_height - (field.y * page_height) - height,
            width,
            height,
            font_size: field.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            content,
        });
    }

    if !errors.is_empty() {
        let detail: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(CoreError::Validation(format!(
            "Cannot generate document: {}",
            detail.join("; ")
        )));
    }

    Ok(FilledDocument {
        page_size,
        page_width,
        page_height,
        pages,
    })
}
