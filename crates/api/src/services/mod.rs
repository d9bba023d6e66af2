//! Service layer sequencing store calls for multi-step actions.

pub mod template_actions;
