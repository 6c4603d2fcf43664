//! Human-readable and JSON rendering of workflow reports.
use crate::schema::ValidationResult;
use crate::submit::SubmissionOutcome;
use crate::workflow::WorkflowReport;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt::Write;

pub fn render_json(report: &WorkflowReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("serialize workflow report")
}

pub fn render_text(report: &WorkflowReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Instruction: {}", report.instruction);
    let _ = writeln!(out, "Status: {}", report.status);

    if let Some(raw) = &report.raw_output {
        section(&mut out, "Generated request");
        indent(&mut out, raw.trim());
    }
    if let Some(payload) = &report.payload {
        section(&mut out, "Extracted payload");
        indent(&mut out, &pretty(payload));
    }
    if let Some(validation) = &report.validation {
        section(&mut out, "Validation");
        indent(&mut out, &validation_line(validation));
    }
    if let Some(outcome) = &report.outcome {
        section(&mut out, "Vault response");
        render_outcome(&mut out, outcome);
    }
    if let Some(repair) = &report.repair {
        section(&mut out, "Suggested fix");
        let _ = writeln!(
            out,
            "  after {} error: {}",
            repair.trigger.kind, repair.trigger.message
        );
        match (&repair.suggestion, &repair.failure) {
            (Some(suggestion), _) => indent(&mut out, suggestion.trim()),
            (None, Some(failure)) => {
                let _ = writeln!(out, "  repair failed [{}]: {}", failure.kind, failure.message);
            }
            (None, None) => {}
        }
    }
    if let Some(failure) = &report.failure {
        section(&mut out, "Error");
        let _ = writeln!(out, "  [{}] {}", failure.kind, failure.message);
    }
    out
}

/// One-line verdict used by `validate` as well as full reports.
pub fn validation_line(validation: &ValidationResult) -> String {
    if validation.valid {
        "JSON is valid".to_string()
    } else {
        format!("Validation error: {}", validation.message())
    }
}

fn render_outcome(out: &mut String, outcome: &SubmissionOutcome) {
    match outcome {
        SubmissionOutcome::Accepted { status, body } => {
            let _ = writeln!(out, "  accepted (HTTP {status})");
            indent(out, &pretty(body));
        }
        SubmissionOutcome::Rejected {
            category,
            message,
            status,
            body,
        } => {
            match status {
                Some(status) => {
                    let _ = writeln!(out, "  rejected (HTTP {status}) {category}: {message}");
                }
                None => {
                    let _ = writeln!(out, "  rejected {category}: {message}");
                }
            }
            if let Some(body) = body {
                indent(out, &pretty(body));
            }
        }
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}:");
}

fn indent(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "  {line}");
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
