//! Generate → extract → validate → submit, with one bounded repair round.
//!
//! States visited by a run:
//!
//! ```text
//! Start → Generated → Extracted → Validated → Submitted → Success → Done
//!                                      │           │
//!                                      └───────────┴→ RepairRequested → Done
//! ```
//!
//! Generation, extraction, auth, and configuration failures end the run.
//! Validation failures (under the blocking policy) and submission failures
//! trigger exactly one repair prompt; its output is returned as a suggestion
//! and is never validated or submitted by the same run.
use crate::config::ValidationPolicy;
use crate::error::{ErrorKind, Failure, VaultError};
use crate::extract::extract;
use crate::generate::{PayloadGenerator, RepairContext};
use crate::schema::{self, ValidationResult};
use crate::submit::{SubmissionOutcome, Submitter};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Start,
    Generated,
    Extracted,
    Validated,
    Submitted,
    Success,
    RepairRequested,
    Done,
}

/// Final classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    RepairSuggested,
    RepairFailed,
    GenerationFailed,
    ExtractionFailed,
    AuthFailed,
    ConfigurationFailed,
}

impl RunStatus {
    fn from_error(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Generation => Self::GenerationFailed,
            ErrorKind::Extraction => Self::ExtractionFailed,
            ErrorKind::Auth => Self::AuthFailed,
            ErrorKind::Configuration => Self::ConfigurationFailed,
            // Repairable errors only end a run when no suggestion came back.
            ErrorKind::Validation | ErrorKind::Submission => Self::RepairFailed,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::RepairSuggested => "repair_suggested",
            Self::RepairFailed => "repair_failed",
            Self::GenerationFailed => "generation_failed",
            Self::ExtractionFailed => "extraction_failed",
            Self::AuthFailed => "auth_failed",
            Self::ConfigurationFailed => "configuration_failed",
        };
        f.write_str(label)
    }
}

/// The single repair round of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RepairRound {
    /// The error fed back to the generator.
    pub trigger: Failure,
    /// Corrected model output, returned as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

/// Everything a run produced, for display.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub instruction: String,
    pub status: RunStatus,
    pub states: Vec<WorkflowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SubmissionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairRound>,
    /// The error that ended the run, when it did not end in a repair round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl WorkflowReport {
    fn new(instruction: &str) -> Self {
        Self {
            instruction: instruction.to_string(),
            status: RunStatus::Success,
            states: vec![WorkflowState::Start],
            raw_output: None,
            payload: None,
            validation: None,
            outcome: None,
            repair: None,
            failure: None,
        }
    }

    /// Report for a run that failed before the pipeline could start.
    pub fn aborted(instruction: &str, err: &VaultError) -> Self {
        Self::new(instruction).fail(err)
    }

    fn enter(&mut self, state: WorkflowState) {
        tracing::debug!(state = ?state, "workflow transition");
        self.states.push(state);
    }

    fn finish(mut self, status: RunStatus) -> Self {
        self.status = status;
        self.enter(WorkflowState::Done);
        tracing::info!(status = %status, "workflow finished");
        self
    }

    fn fail(mut self, err: &VaultError) -> Self {
        tracing::warn!(kind = %err.kind(), "{err}");
        self.failure = Some(Failure::from(err));
        self.finish(RunStatus::from_error(err.kind()))
    }
}

/// Orchestrates one instruction through the pipeline.
pub struct RepairLoop<'a> {
    generator: &'a dyn PayloadGenerator,
    submitter: &'a dyn Submitter,
    policy: ValidationPolicy,
}

impl<'a> RepairLoop<'a> {
    pub fn new(generator: &'a dyn PayloadGenerator, submitter: &'a dyn Submitter) -> Self {
        Self {
            generator,
            submitter,
            policy: ValidationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn run(&self, instruction: &str) -> WorkflowReport {
        let mut report = WorkflowReport::new(instruction);
        if instruction.trim().is_empty() {
            return report.fail(&VaultError::Generation("instruction is empty".to_string()));
        }

        let raw = match self.generator.generate(instruction, None) {
            Ok(raw) => raw,
            Err(err) => return report.fail(&err),
        };
        report.enter(WorkflowState::Generated);
        report.raw_output = Some(raw.clone());

        let payload = match extract(&raw) {
            Ok(payload) => payload,
            Err(err) => return report.fail(&err),
        };
        report.enter(WorkflowState::Extracted);
        report.payload = Some(payload.clone());

        let validation = schema::validate(&payload);
        report.enter(WorkflowState::Validated);
        let violation = validation.to_error();
        report.validation = Some(validation);
        if let Some(err) = violation {
            match self.policy {
                ValidationPolicy::Blocking => return self.repair(report, instruction, &raw, err),
                ValidationPolicy::Advisory => {
                    tracing::warn!("submitting despite schema violation: {err}");
                }
            }
        }

        let submitted = self.submitter.submit(&payload);
        report.enter(WorkflowState::Submitted);
        match submitted {
            Ok(outcome) if outcome.is_accepted() => {
                report.outcome = Some(outcome);
                report.enter(WorkflowState::Success);
                report.finish(RunStatus::Success)
            }
            Ok(outcome) => {
                let message = outcome.error_message().unwrap_or_default().to_string();
                report.outcome = Some(outcome);
                self.repair(report, instruction, &raw, VaultError::Submission(message))
            }
            Err(err) if err.kind() == ErrorKind::Submission => {
                self.repair(report, instruction, &raw, err)
            }
            Err(err) => report.fail(&err),
        }
    }

    fn repair(
        &self,
        mut report: WorkflowReport,
        instruction: &str,
        raw: &str,
        trigger: VaultError,
    ) -> WorkflowReport {
        report.enter(WorkflowState::RepairRequested);
        tracing::info!(kind = %trigger.kind(), "requesting repair: {}", trigger.detail());
        let context = RepairContext {
            error: trigger.detail().to_string(),
            previous_output: Some(raw.to_string()),
        };
        let (round, status) = match self.generator.generate(instruction, Some(&context)) {
            Ok(suggestion) => (
                RepairRound {
                    trigger: Failure::from(&trigger),
                    suggestion: Some(suggestion),
                    failure: None,
                },
                RunStatus::RepairSuggested,
            ),
            Err(err) => {
                tracing::warn!(kind = %err.kind(), "repair round failed: {err}");
                (
                    RepairRound {
                        trigger: Failure::from(&trigger),
                        suggestion: None,
                        failure: Some(Failure::from(&err)),
                    },
                    RunStatus::RepairFailed,
                )
            }
        };
        report.repair = Some(round);
        report.finish(status)
    }
}
