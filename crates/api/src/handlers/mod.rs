pub mod admin;
pub mod auth;
pub mod customization;
pub mod document_template;
pub mod notification;
pub mod pdf_template;
pub mod sales_request;

use axum::http::header::CONTENT_DISPOSITION;
use axum::http::{HeaderName, HeaderValue};

/// Build a `Content-Disposition: attachment` header for a download.
///
/// Characters outside a conservative filename set are replaced with `_`
/// so the value is always a valid header.
pub(crate) fn attachment_header(base_name: &str, extension: &str) -> (HeaderName, HeaderValue) {
    let safe: String = base_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim();
    let safe = if safe.is_empty() { "documento" } else { safe };

    let value = format!("attachment; filename=\"{safe}.{extension}\"");
    let value = HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (CONTENT_DISPOSITION, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_names_are_sanitized() {
        let (_, value) = attachment_header("Contrato \"Oro\"/2024", "json");
        assert_eq!(
            value.to_str().expect("ascii header"),
            "attachment; filename=\"Contrato _Oro__2024.json\""
        );

        let (_, value) = attachment_header("ñ", "html");
        assert_eq!(
            value.to_str().expect("ascii header"),
            "attachment; filename=\"_.html\""
        );
    }
}
