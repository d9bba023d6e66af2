//! Notification kinds and the status-to-kind mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contract::ContractStatus;
use crate::error::CoreError;

pub const MAX_NOTIFICATION_TITLE_LENGTH: usize = 200;
pub const MAX_NOTIFICATION_MESSAGE_LENGTH: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    #[default]
    Info,
    Warning,
    Error,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::Success,
        NotificationKind::Info,
        NotificationKind::Warning,
        NotificationKind::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown notification type '{s}'")))
    }
}

/// Kind of the notification sent to a sales request owner on a status change.
pub fn kind_for_status(status: ContractStatus) -> NotificationKind {
    match status {
        ContractStatus::Completed => NotificationKind::Success,
        ContractStatus::Rejected => NotificationKind::Error,
        _ => NotificationKind::Info,
    }
}

/// Title and message for a sales request status change.
pub fn status_change_text(client_name: &str, status: ContractStatus) -> (String, String) {
    let (title, message) = match status {
        ContractStatus::Draft => ("Solicitud en borrador", "volvió a borrador"),
        ContractStatus::PendingHealthDeclaration => (
            "Declaración de salud pendiente",
            "espera la declaración de salud",
        ),
        ContractStatus::PendingSignature => ("Firma pendiente", "espera la firma del cliente"),
        ContractStatus::Completed => ("Contrato completado", "fue firmada y completada"),
        ContractStatus::Rejected => ("Solicitud rechazada", "fue rechazada"),
    };
    (
        title.to_string(),
        format!("La solicitud de {client_name} {message}."),
    )
}

pub fn validate_notification_text(title: &str, message: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation(
            "Notification title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_NOTIFICATION_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Notification title exceeds maximum length of {MAX_NOTIFICATION_TITLE_LENGTH} characters"
        )));
    }
    if message.chars().count() > MAX_NOTIFICATION_MESSAGE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Notification message exceeds maximum length of {MAX_NOTIFICATION_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_kind() {
        assert_eq!(kind_for_status(ContractStatus::Completed), NotificationKind::Success);
        assert_eq!(kind_for_status(ContractStatus::Rejected), NotificationKind::Error);
        assert_eq!(kind_for_status(ContractStatus::PendingSignature), NotificationKind::Info);
        assert_eq!(
            kind_for_status(ContractStatus::PendingHealthDeclaration),
            NotificationKind::Info
        );
    }

    #[test]
    fn kind_parses() {
        assert_eq!("warning".parse::<NotificationKind>().unwrap(), NotificationKind::Warning);
        assert!("fatal".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn status_text_mentions_client() {
        let (title, message) = status_change_text("Juan Pérez", ContractStatus::Completed);
        assert_eq!(title, "Contrato completado");
        assert!(message.contains("Juan Pérez"));
    }

    #[test]
    fn blank_title_rejected() {
        assert!(validate_notification_text(" ", "x").is_err());
        assert!(validate_notification_text("Hola", "").is_ok());
    }
}
