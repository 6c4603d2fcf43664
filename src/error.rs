//! Error taxonomy for the vault request workflow.
//!
//! Each stage reports its own variant and keeps the underlying diagnostic
//! text intact so the final report can show it verbatim.
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// The generative model was unreachable, failed, or returned nothing.
    #[error("generation failed: {0}")]
    Generation(String),
    /// No usable JSON object in the model output.
    #[error("extraction failed: {0}")]
    Extraction(String),
    /// The payload violates the vault schema.
    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },
    /// The client-credentials exchange was rejected.
    #[error("auth failed: {0}")]
    Auth(String),
    /// The submission could not be delivered.
    #[error("submission failed: {0}")]
    Submission(String),
    /// A required setting or secret is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generation(_) => ErrorKind::Generation,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Submission(_) => ErrorKind::Submission,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// The diagnostic without the category prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Generation(msg)
            | Self::Extraction(msg)
            | Self::Auth(msg)
            | Self::Submission(msg)
            | Self::Configuration(msg) => msg,
            Self::Validation { message, .. } => message,
        }
    }
}

/// Serializable error category used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Generation,
    Extraction,
    Validation,
    Auth,
    Submission,
    Configuration,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation => write!(f, "generation"),
            Self::Extraction => write!(f, "extraction"),
            Self::Validation => write!(f, "validation"),
            Self::Auth => write!(f, "auth"),
            Self::Submission => write!(f, "submission"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// A recorded failure: category plus the original diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&VaultError> for Failure {
    fn from(err: &VaultError) -> Self {
        Self {
            kind: err.kind(),
            message: err.detail().to_string(),
        }
    }
}

pub type VaultResult<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_original_diagnostic() {
        let err = VaultError::Auth("token endpoint returned 401: invalid_client".to_string());
        let failure = Failure::from(&err);
        assert_eq!(failure.kind, ErrorKind::Auth);
        assert_eq!(failure.message, "token endpoint returned 401: invalid_client");
        assert_eq!(err.to_string(), "auth failed: token endpoint returned 401: invalid_client");
    }

    #[test]
    fn validation_error_names_path() {
        let err = VaultError::Validation {
            path: "payment_source.card.security_code".to_string(),
            message: "required field security_code missing from payment_source.card".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("payment_source.card.security_code"));
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Configuration).unwrap();
        assert_eq!(json, "\"configuration\"");
    }
}
