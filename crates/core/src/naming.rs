//! Template naming rules.

use crate::error::CoreError;

/// Maximum length of a template display name.
pub const MAX_TEMPLATE_NAME_LENGTH: usize = 200;

/// Fallback when neither a name nor a usable file name is available.
pub const UNTITLED_TEMPLATE_NAME: &str = "Plantilla sin nombre";

/// Base name of an uploaded file: directory components and the final
/// extension are removed.
///
/// ```
/// use docflow_core::naming::file_base_name;
/// assert_eq!(file_base_name("contrato.pdf"), "contrato");
/// assert_eq!(file_base_name("C:\\docs\\anexo.v2.pdf"), "anexo.v2");
/// assert_eq!(file_base_name(".env"), ".env");
/// ```
pub fn file_base_name(file_name: &str) -> &str {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Resolve the name a template is stored under.
///
/// A non-blank explicit name wins (trimmed). Otherwise the uploaded file's
/// base name is used, and failing that a generic placeholder.
pub fn resolve_template_name(explicit: Option<&str>, file_name: &str) -> String {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    let base = file_base_name(file_name);
    if base.is_empty() {
        UNTITLED_TEMPLATE_NAME.to_string()
    } else {
        base.to_string()
    }
}

/// Validate a template name: non-empty and within the length limit.
pub fn validate_template_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Template name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_TEMPLATE_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Template name exceeds maximum length of {MAX_TEMPLATE_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_defaults_to_file_base_name() {
        assert_eq!(resolve_template_name(None, "Solicitud de alta.pdf"), "Solicitud de alta");
        assert_eq!(resolve_template_name(Some("   "), "anexo.pdf"), "anexo");
    }

    #[test]
    fn explicit_name_wins() {
        assert_eq!(resolve_template_name(Some(" Contrato 2024 "), "x.pdf"), "Contrato 2024");
    }

    #[test]
    fn only_last_extension_is_stripped() {
        assert_eq!(file_base_name("archive.tar.gz"), "archive.tar");
        assert_eq!(file_base_name("no_extension"), "no_extension");
        assert_eq!(file_base_name("uploads/2024/form.PDF"), "form");
    }

    #[test]
    fn empty_file_name_falls_back_to_placeholder() {
        assert_eq!(resolve_template_name(None, ""), UNTITLED_TEMPLATE_NAME);
    }

    #[test]
    fn long_names_rejected() {
        let long = "x".repeat(MAX_TEMPLATE_NAME_LENGTH + 1);
        assert!(validate_template_name(&long).is_err());
        assert!(validate_template_name("").is_err());
        assert!(validate_template_name("ok").is_ok());
    }
}
