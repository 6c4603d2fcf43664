//! Submission of validated payloads to the vault endpoint.
use crate::error::VaultResult;
use serde::Serialize;
use serde_json::Value;

mod mock;
mod paypal;

pub use mock::MockSubmitter;
pub use paypal::RemoteSubmitter;

/// Result of a delivered submission: accepted or rejected, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Accepted {
        status: u16,
        body: Value,
    },
    Rejected {
        /// Short error tag (`missing_field`, `INVALID_REQUEST`, `http_422`).
        category: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Error text handed to the repair round; `None` when accepted.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { message, .. } => Some(message),
        }
    }
}

pub trait Submitter {
    /// Deliver a payload. Remote business errors come back as
    /// [`SubmissionOutcome::Rejected`]; `Err` means auth, configuration, or
    /// transport failure.
    fn submit(&self, payload: &Value) -> VaultResult<SubmissionOutcome>;
}
