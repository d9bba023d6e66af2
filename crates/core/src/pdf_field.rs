//! Interactive PDF field model.
//!
//! A [`PdfField`] is a positioned element (text box, checkbox, signature,
//! date, ...) overlaid on one page of a PDF template. Geometry is stored in
//! normalized page coordinates: `(0, 0)` is the top-left corner of the page
//! and `(1, 1)` the bottom-right, independent of the page's physical size.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Tolerance applied to the right/bottom page edge checks so that fields
/// snapped exactly to the edge survive float rounding.
pub const BOUNDS_EPSILON: f64 = 1e-9;

/// Smallest width or height a field may be resized to (normalized units).
pub const MIN_FIELD_SIZE: f64 = 0.01;

/// Maximum number of fields a single template may carry.
pub const MAX_FIELDS_PER_TEMPLATE: usize = 500;

/// Maximum length of a field id.
pub const MAX_FIELD_ID_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// The fixed set of interactive field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Email,
    Phone,
    Date,
    Checkbox,
    Signature,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Date,
        FieldType::Checkbox,
        FieldType::Signature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
            FieldType::Signature => "signature",
        }
    }

    /// Size (width, height) given to a freshly created field of this type.
    pub fn default_size(self) -> (f64, f64) {
        match self {
            FieldType::Checkbox => (0.03, 0.02),
            FieldType::Signature => (0.25, 0.06),
            FieldType::Date => (0.15, 0.03),
            FieldType::Text | FieldType::Number | FieldType::Email | FieldType::Phone => {
                (0.3, 0.03)
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
                format!("Invalid field type '{s}'. Must be one of: {}", valid.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in normalized page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// PdfField
// ---------------------------------------------------------------------------

fn default_page() -> u32 {
    1
}

/// A positioned interactive field on a PDF template page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfField {
    /// Unique within the owning template's field collection.
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl PdfField {
    /// Build a field of the given type at `origin` using the type's default size.
    pub fn new(id: impl Into<String>, field_type: FieldType, page: u32, origin: NormalizedPoint) -> Self {
        let (width, height) = field_type.default_size();
        Self {
            id: id.into(),
            field_type,
            page,
            x: origin.x,
            y: origin.y,
            width,
            height,
            label: None,
            default_value: None,
            required: false,
            font_size: None,
        }
    }

    pub fn origin(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.x, self.y)
    }

    /// Whether `point` lies inside this field's rectangle.
    pub fn contains(&self, point: NormalizedPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Move the field so that it lies entirely within the page, keeping its size.
    ///
    /// Fields wider or taller than the page are shrunk to the page first.
    pub fn clamp_to_page(&mut self) {
        self.width = self.width.clamp(MIN_FIELD_SIZE, 1.0);
        self.height = self.height.clamp(MIN_FIELD_SIZE, 1.0);
        self.x = self.x.clamp(0.0, 1.0 - self.width);
        self.y = self.y.clamp(0.0, 1.0 - self.height);
    }

    /// Merge the `Some` members of `patch` into this field.
    pub fn apply_patch(&mut self, patch: &FieldPatch) {
        if let Some(t) = patch.field_type {
            self.field_type = t;
        }
        if let Some(page) = patch.page {
            self.page = page;
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(w) = patch.width {
            self.width = w;
        }
        if let Some(h) = patch.height {
            self.height = h;
        }
        if let Some(label) = &patch.label {
            self.label = Some(label.clone());
        }
        if let Some(value) = &patch.default_value {
            self.default_value = Some(value.clone());
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        if let Some(size) = patch.font_size {
            self.font_size = Some(size);
        }
    }
}

/// Partial update for a [`PdfField`]. All members are optional; `id` is
/// never patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(rename = "type", default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub font_size: Option<f32>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a single field's id, page number, and normalized geometry.
pub fn validate_field(field: &PdfField) -> Result<(), CoreError> {
    let id = field.id.trim();
    if id.is_empty() {
        return Err(CoreError::Validation("Field id must not be empty".to_string()));
    }
    if id.len() > MAX_FIELD_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "Field id exceeds maximum length of {MAX_FIELD_ID_LENGTH} characters"
        )));
    }
    if field.page == 0 {
        return Err(CoreError::Validation(format!(
            "Field '{id}': page numbers start at 1"
        )));
    }

    let geometry = [field.x, field.y, field.width, field.height];
    if geometry.iter().any(|v| !v.is_finite()) {
        return Err(CoreError::Validation(format!(
            "Field '{id}': position and size must be finite numbers"
        )));
    }
    if field.x < 0.0 || field.y < 0.0 {
        return Err(CoreError::Validation(format!(
            "Field '{id}': position must be within the page (got x={}, y={})",
            field.x, field.y
        )));
    }
    if field.width <= 0.0 || field.height <= 0.0 {
        return Err(CoreError::Validation(format!(
            "Field '{id}': width and height must be positive"
        )));
    }
    if field.x + field.width > 1.0 + BOUNDS_EPSILON || field.y + field.height > 1.0 + BOUNDS_EPSILON
    {
        return Err(CoreError::Validation(format!(
            "Field '{id}': extends beyond the page edge"
        )));
    }
    if let Some(size) = field.font_size {
        if !(size.is_finite() && size > 0.0) {
            return Err(CoreError::Validation(format!(
                "Field '{id}': font size must be positive"
            )));
        }
    }
    Ok(())
}

/// Validate a template's full field collection: every field individually,
/// plus id uniqueness and the collection size limit.
pub fn validate_fields(fields: &[PdfField]) -> Result<(), CoreError> {
    if fields.len() > MAX_FIELDS_PER_TEMPLATE {
        return Err(CoreError::Validation(format!(
            "A template may contain at most {MAX_FIELDS_PER_TEMPLATE} fields (got {})",
            fields.len()
        )));
    }

    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        validate_field(field)?;
        if !seen.insert(field.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate field id '{}'",
                field.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn field(id: &str, x: f64, y: f64, w: f64, h: f64) -> PdfField {
        PdfField {
            id: id.to_string(),
            field_type: FieldType::Text,
            page: 1,
            x,
            y,
            width: w,
            height: h,
            label: None,
            default_value: None,
            required: false,
            font_size: None,
        }
    }

    #[test]
    fn field_type_round_trips_through_str() {
        for t in FieldType::ALL {
            assert_eq!(t.as_str().parse::<FieldType>().unwrap(), t);
        }
        assert!("radio".parse::<FieldType>().is_err());
    }

    #[test]
    fn field_deserializes_with_type_key_and_defaults() {
        let json = serde_json::json!({
            "id": "f1", "type": "signature", "x": 0.1, "y": 0.2, "width": 0.3, "height": 0.05
        });
        let f: PdfField = serde_json::from_value(json).unwrap();
        assert_eq!(f.field_type, FieldType::Signature);
        assert_eq!(f.page, 1);
        assert!(!f.required);
        assert!(f.label.is_none());
    }

    #[test]
    fn valid_field_passes() {
        assert!(validate_field(&field("a", 0.0, 0.0, 1.0, 1.0)).is_ok());
        assert!(validate_field(&field("a", 0.5, 0.5, 0.5, 0.5)).is_ok());
    }

    #[test]
    fn out_of_bounds_field_rejected() {
        assert_matches!(
            validate_field(&field("a", 0.8, 0.1, 0.3, 0.1)),
            Err(CoreError::Validation(msg)) if msg.contains("beyond the page edge")
        );
        assert_matches!(
            validate_field(&field("a", -0.1, 0.1, 0.3, 0.1)),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_field(&field("a", 0.1, 0.1, 0.0, 0.1)),
            Err(CoreError::Validation(msg)) if msg.contains("positive")
        );
        assert_matches!(
            validate_field(&field("a", f64::NAN, 0.1, 0.1, 0.1)),
            Err(CoreError::Validation(msg)) if msg.contains("finite")
        );
    }

    #[test]
    fn page_zero_rejected() {
        let mut f = field("a", 0.1, 0.1, 0.1, 0.1);
        f.page = 0;
        assert!(validate_field(&f).is_err());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let fields = vec![field("a", 0.1, 0.1, 0.1, 0.1), field("a", 0.2, 0.2, 0.1, 0.1)];
        assert_matches!(
            validate_fields(&fields),
            Err(CoreError::Validation(msg)) if msg.contains("Duplicate field id 'a'")
        );
    }

    #[test]
    fn clamp_to_page_keeps_size_and_moves_inside() {
        let mut f = field("a", 0.9, 0.95, 0.3, 0.1);
        f.clamp_to_page();
        assert!((f.x - 0.7).abs() < 1e-12);
        assert!((f.y - 0.9).abs() < 1e-12);
        assert!(validate_field(&f).is_ok());
    }

    #[test]
    fn patch_merges_only_present_members() {
        let mut f = field("a", 0.1, 0.1, 0.2, 0.2);
        f.label = Some("Name".into());
        f.apply_patch(&FieldPatch {
            x: Some(0.4),
            required: Some(true),
            ..Default::default()
        });
        assert_eq!(f.x, 0.4);
        assert_eq!(f.y, 0.1);
        assert!(f.required);
        assert_eq!(f.label.as_deref(), Some("Name"));
    }

    #[test]
    fn contains_checks_rectangle() {
        let f = field("a", 0.1, 0.1, 0.2, 0.2);
        assert!(f.contains(NormalizedPoint::new(0.2, 0.2)));
        assert!(!f.contains(NormalizedPoint::new(0.5, 0.2)));
    }
}
