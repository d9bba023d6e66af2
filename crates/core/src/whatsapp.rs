//! WhatsApp deep-link builders.
//!
//! Links point at `wa.me` with an `api.whatsapp.com` fallback for clients
//! where the short domain is blocked. Messages are percent-encoded with
//! URI-component semantics.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Characters left unescaped by URI-component encoding besides alphanumerics.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const WA_ME_BASE: &str = "https://wa.me";
pub const API_FALLBACK_BASE: &str = "https://api.whatsapp.com/send";

/// Both variants of a WhatsApp link for the same recipient and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhatsAppLinks {
    pub wa_me: String,
    pub api_fallback: String,
}

/// Normalize a phone number for WhatsApp by stripping every non-digit.
///
/// Idempotent: formatting an already formatted number returns it unchanged.
///
/// ```
/// use docflow_core::whatsapp::format_phone_for_whatsapp;
/// assert_eq!(format_phone_for_whatsapp("+54 9 (11) 2233-4455"), "5491122334455");
/// ```
pub fn format_phone_for_whatsapp(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Percent-encode a message the way `encodeURIComponent` does.
pub fn encode_message(message: &str) -> String {
    utf8_percent_encode(message, URI_COMPONENT).to_string()
}

/// Build the `wa.me` link and its `api.whatsapp.com` fallback.
///
/// ```
/// use docflow_core::whatsapp::build_whatsapp_links;
/// let links = build_whatsapp_links("5491122334455", "hi");
/// assert_eq!(links.wa_me, "https://wa.me/5491122334455?text=hi");
/// ```
pub fn build_whatsapp_links(phone: &str, message: &str) -> WhatsAppLinks {
    let digits = format_phone_for_whatsapp(phone);
    let text = encode_message(message);
    WhatsAppLinks {
        wa_me: format!("{WA_ME_BASE}/{digits}?text={text}"),
        api_fallback: format!("{API_FALLBACK_BASE}?phone={digits}&text={text}"),
    }
}
