//! Docflow domain core.
//!
//! Pure domain logic with no I/O: the PDF field model and its editor state
//! machine, document generation, the contract workflow, search helpers,
//! WhatsApp link building, and the shared error and id types used by the
//! storage and HTTP layers.

pub mod contract;
pub mod credentials;
pub mod customization;
pub mod document_render;
pub mod error;
pub mod feedback;
pub mod field_editor;
pub mod generation;
pub mod naming;
pub mod notification;
pub mod pdf_field;
pub mod roles;
pub mod search;
pub mod types;
pub mod whatsapp;
