use thiserror::Error;

use crate::payload::StepKind;
use crate::violation::Violations;

/// Every failure a workflow step can report. All variants are
/// caller-correctable; none indicate a crash.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid token: {token} is unknown or expired; restart from the step that issued it")]
    InvalidToken { token: String },

    #[error("Wrong step: token {token} was issued by the {actual} step, this step expects a {expected} token")]
    WrongStepType {
        token: String,
        expected: StepKind,
        actual: StepKind,
    },

    #[error("Contract violation: {0}")]
    ContractViolation(Violations),

    #[error("Quota denied: {reason}")]
    QuotaDenied { reason: String },

    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },
}

impl WorkflowError {
    pub fn upstream(service: impl Into<String>, message: impl ToString) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Single-rule contract violation.
    pub fn violation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut violations = Violations::new();
        violations.push(field, message);
        Self::ContractViolation(violations)
    }

    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::ContractViolation(v) => Some(v),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
