//! Sales-request (contract) workflow.
//!
//! The status machine is linear:
//! `draft -> pending_health_declaration -> pending_signature -> completed`.
//! Any non-terminal status may be rejected. There are no back-transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a rejection reason.
pub const MAX_REJECTION_REASON_LENGTH: usize = 1000;

/// Maximum number of answers in a single health declaration.
pub const MAX_HEALTH_ANSWERS: usize = 100;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    PendingHealthDeclaration,
    PendingSignature,
    Completed,
    Rejected,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 5] = [
        ContractStatus::Draft,
        ContractStatus::PendingHealthDeclaration,
        ContractStatus::PendingSignature,
        ContractStatus::Completed,
        ContractStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::PendingHealthDeclaration => "pending_health_declaration",
            ContractStatus::PendingSignature => "pending_signature",
            ContractStatus::Completed => "completed",
            ContractStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ContractStatus::Completed | ContractStatus::Rejected)
    }

    /// The next status along the linear path, if any.
    pub fn successor(self) -> Option<ContractStatus> {
        match self {
            ContractStatus::Draft => Some(ContractStatus::PendingHealthDeclaration),
            ContractStatus::PendingHealthDeclaration => Some(ContractStatus::PendingSignature),
            ContractStatus::PendingSignature => Some(ContractStatus::Completed),
            ContractStatus::Completed | ContractStatus::Rejected => None,
        }
    }

    /// Whether moving from `self` to `to` is allowed.
    pub fn can_transition_to(self, to: ContractStatus) -> bool {
        if to == ContractStatus::Rejected {
            return !self.is_terminal();
        }
        self.successor() == Some(to)
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContractStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown contract status '{s}'")))
    }
}

/// Check a status transition, returning a conflict error when it is not
/// allowed.
pub fn transition(from: ContractStatus, to: ContractStatus) -> Result<ContractStatus, CoreError> {
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot move sales request from '{from}' to '{to}'"
        )))
    }
}

/// Client data can only be edited while the request is a draft.
pub fn ensure_editable(status: ContractStatus) -> Result<(), CoreError> {
    if status == ContractStatus::Draft {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Sales request is '{status}' and can no longer be edited"
        )))
    }
}

/// Signature requests are only valid while awaiting a signature.
pub fn ensure_signature_pending(status: ContractStatus) -> Result<(), CoreError> {
    if status == ContractStatus::PendingSignature {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Sales request is '{status}', expected '{}'",
            ContractStatus::PendingSignature
        )))
    }
}

// ---------------------------------------------------------------------------
// Health declaration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAnswer {
    pub question: String,
    pub answer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub fn validate_health_answers(answers: &[HealthAnswer]) -> Result<(), CoreError> {
    if answers.is_empty() {
        return Err(CoreError::Validation(
            "Health declaration must contain at least one answer".to_string(),
        ));
    }
    if answers.len() > MAX_HEALTH_ANSWERS {
        return Err(CoreError::Validation(format!(
            "Health declaration exceeds {MAX_HEALTH_ANSWERS} answers"
        )));
    }
    for (idx, a) in answers.iter().enumerate() {
        if a.question.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Answer {} is missing its question",
                idx + 1
            )));
        }
        let has_details = a.details.as_deref().is_some_and(|d| !d.trim().is_empty());
        if a.answer && !has_details {
            return Err(CoreError::Validation(format!(
                "Answer to '{}' requires details",
                a.question.trim()
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

/// Validate and trim a rejection reason.
pub fn validate_rejection_reason(reason: &str) -> Result<String, CoreError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(
            "Rejection reason must not be empty".to_string(),
        ));
    }
    if reason.chars().count() > MAX_REJECTION_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Rejection reason exceeds maximum length of {MAX_REJECTION_REASON_LENGTH} characters"
        )));
    }
    Ok(reason.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use ContractStatus::*;

    #[test]
    fn linear_path_is_allowed() {
        assert_eq!(transition(Draft, PendingHealthDeclaration).unwrap(), PendingHealthDeclaration);
        assert!(transition(PendingHealthDeclaration, PendingSignature).is_ok());
        assert!(transition(PendingSignature, Completed).is_ok());
    }

    #[test]
    fn skipping_or_going_back_is_rejected() {
        assert_matches!(transition(Draft, PendingSignature), Err(CoreError::Conflict(_)));
        assert_matches!(transition(Draft, Completed), Err(CoreError::Conflict(_)));
        assert_matches!(transition(PendingSignature, Draft), Err(CoreError::Conflict(_)));
        assert_matches!(transition(Completed, Draft), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn only_non_terminal_can_be_rejected() {
        for st in [Draft, PendingHealthDeclaration, PendingSignature] {
            assert!(st.can_transition_to(Rejected), "{st}");
        }
        assert!(!Completed.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Rejected));
    }

    #[test]
    fn status_round_trips_through_str() {
        for st in ContractStatus::ALL {
            assert_eq!(st.as_str().parse::<ContractStatus>().unwrap(), st);
        }
        assert!("signed".parse::<ContractStatus>().is_err());
    }

    #[test]
    fn editing_only_in_draft() {
        assert!(ensure_editable(Draft).is_ok());
        assert!(ensure_editable(PendingSignature).is_err());
    }

    #[test]
    fn yes_answers_need_details() {
        let ok = vec![
            HealthAnswer {
                question: "¿Fuma?".into(),
                answer: false,
                details: None,
            },
            HealthAnswer {
                question: "¿Cirugías?".into(),
                answer: true,
                details: Some("Apendicectomía 2019".into()),
            },
        ];
        assert!(validate_health_answers(&ok).is_ok());

        let missing = vec![HealthAnswer {
            question: "¿Cirugías?".into(),
            answer: true,
            details: Some("  ".into()),
        }];
        assert_matches!(validate_health_answers(&missing), Err(CoreError::Validation(_)));
        assert!(validate_health_answers(&[]).is_err());
    }

    #[test]
    fn rejection_reason_is_trimmed_and_required() {
        assert_eq!(validate_rejection_reason("  falta firma ").unwrap(), "falta firma");
        assert!(validate_rejection_reason("   ").is_err());
    }
}
