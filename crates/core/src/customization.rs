//! Admin-managed branding settings.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::CoreError;

pub const MAX_CUSTOMIZATION_KEY_LENGTH: usize = 64;

pub const KEY_PRIMARY_COLOR: &str = "primary_color";
pub const KEY_WHATSAPP_NUMBER: &str = "whatsapp_number";

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid customization key regex")
});

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

pub fn validate_key(key: &str) -> Result<(), CoreError> {
    if key.len() > MAX_CUSTOMIZATION_KEY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Customization key exceeds maximum length of {MAX_CUSTOMIZATION_KEY_LENGTH} characters"
        )));
    }
    if !KEY_RE.is_match(key) {
        return Err(CoreError::Validation(format!(
            "Customization key '{key}' must be lowercase snake_case"
        )));
    }
    Ok(())
}

/// Validate a value for a known key. Unknown keys accept any JSON value.
pub fn validate_value(key: &str, value: &Value) -> Result<(), CoreError> {
    match key {
        KEY_PRIMARY_COLOR => match value.as_str() {
            Some(s) if HEX_COLOR_RE.is_match(s) => Ok(()),
            _ => Err(CoreError::Validation(
                "primary_color must be a #RRGGBB string".to_string(),
            )),
        },
        KEY_WHATSAPP_NUMBER => match value.as_str() {
            Some(s) if s.chars().any(|c| c.is_ascii_digit()) => Ok(()),
            _ => Err(CoreError::Validation(
                "whatsapp_number must contain digits".to_string(),
            )),
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keys_are_snake_case() {
        assert!(validate_key("primary_color").is_ok());
        assert!(validate_key("logo2_url").is_ok());
        assert!(validate_key("PrimaryColor").is_err());
        assert!(validate_key("2fast").is_err());
        assert!(validate_key("with-dash").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn known_values_checked() {
        assert!(validate_value("primary_color", &json!("#1A2b3C")).is_ok());
        assert!(validate_value("primary_color", &json!("red")).is_err());
        assert!(validate_value("primary_color", &json!(123)).is_err());
        assert!(validate_value("whatsapp_number", &json!("+54 11 5555")).is_ok());
        assert!(validate_value("whatsapp_number", &json!("none")).is_err());
        assert!(validate_value("company_name", &json!({"any": true})).is_ok());
    }
}
