//! HTML document templates with `{{ name }}` placeholders.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum size of template HTML content in bytes.
pub const MAX_DOCUMENT_CONTENT_LENGTH: usize = 500_000;

/// Maximum number of declared fields in a document template.
pub const MAX_DOCUMENT_FIELDS: usize = 200;

pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

static FIELD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentTemplateType {
    Contrato,
    Anexo,
    Declaracion,
}

impl DocumentTemplateType {
    pub const ALL: [DocumentTemplateType; 3] = [
        DocumentTemplateType::Contrato,
        DocumentTemplateType::Anexo,
        DocumentTemplateType::Declaracion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentTemplateType::Contrato => "contrato",
            DocumentTemplateType::Anexo => "anexo",
            DocumentTemplateType::Declaracion => "declaracion",
        }
    }
}

impl fmt::Display for DocumentTemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentTemplateType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentTemplateType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown document template type '{s}'")))
    }
}

/// A declared input of a document template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentField {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_document_fields(fields: &[DocumentField]) -> Result<(), CoreError> {
    if fields.len() > MAX_DOCUMENT_FIELDS {
        return Err(CoreError::Validation(format!(
            "Document template exceeds {MAX_DOCUMENT_FIELDS} fields"
        )));
    }
    let mut seen = HashSet::new();
    for f in fields {
        if !FIELD_NAME_RE.is_match(&f.name) {
            return Err(CoreError::Validation(format!(
                "Invalid document field name '{}'",
                f.name
            )));
        }
        if !seen.insert(f.name.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate document field name '{}'",
                f.name
            )));
        }
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.len() > MAX_DOCUMENT_CONTENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Template content exceeds maximum length of {MAX_DOCUMENT_CONTENT_LENGTH} bytes"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Placeholder names in order of first appearance, without duplicates.
pub fn extract_placeholders(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_RE
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Text form of a JSON value, or `None` when it should count as missing.
fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "Sí" } else { "No" }.to_string()),
        other => Some(other.to_string()),
    }
}

/// Substitute placeholders with HTML-escaped values.
///
/// Required fields without a value fail with a single validation error
/// naming every missing field. Unknown placeholders render empty.
pub fn render_document(
    content: &str,
    fields: &[DocumentField],
    values: &HashMap<String, Value>,
) -> Result<String, CoreError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|f| f.required && values.get(&f.name).and_then(value_text).is_none())
        .map(|f| f.label.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let rendered = PLACEHOLDER_RE.replace_all(content, |caps: &Captures| {
        values
            .get(&caps[1])
            .and_then(value_text)
            .map(|s| escape_html(&s))
            .unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn field(name: &str, required: bool) -> DocumentField {
        DocumentField {
            name: name.into(),
            label: name.to_uppercase(),
            required,
        }
    }

    fn values(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn substitutes_with_and_without_spaces() {
        let out = render_document(
            "<p>{{nombre}} / {{ plan }}</p>",
            &[field("nombre", true)],
            &values(&[("nombre", json!("Juan")), ("plan", json!("Oro"))]),
        )
        .unwrap();
        assert_eq!(out, "<p>Juan / Oro</p>");
    }

    #[test]
    fn values_are_escaped() {
        let out = render_document(
            "{{ x }}",
            &[],
            &values(&[("x", json!("<script>\"&'"))]),
        )
        .unwrap();
        assert_eq!(out, "&lt;script&gt;&quot;&amp;&#39;");
    }

    #[test]
    fn unknown_placeholders_render_empty() {
        let out = render_document("a{{ nope }}b", &[], &HashMap::new()).unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn missing_required_lists_all() {
        let err = render_document(
            "",
            &[field("a", true), field("b", true), field("c", false)],
            &values(&[("a", json!("  "))]),
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(ref m) if m.contains("A") && m.contains("B") && !m.contains("C"));
    }

    #[test]
    fn numbers_and_bools_render() {
        let out = render_document(
            "{{n}} {{b}}",
            &[],
            &values(&[("n", json!(1500.5)), ("b", json!(true))]),
        )
        .unwrap();
        assert_eq!(out, "1500.5 Sí");
    }

    #[test]
    fn placeholders_extracted_once() {
        assert_eq!(
            extract_placeholders("{{a}} {{ b }} {{a}}"),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn field_names_validated() {
        assert!(validate_document_fields(&[field("ok_name", false)]).is_ok());
        assert!(validate_document_fields(&[field("bad name", false)]).is_err());
        assert!(validate_document_fields(&[field("a", false), field("a", true)]).is_err());
    }

    #[test]
    fn template_type_parses() {
        assert_eq!("anexo".parse::<DocumentTemplateType>().unwrap(), DocumentTemplateType::Anexo);
        assert!("memo".parse::<DocumentTemplateType>().is_err());
    }
}
