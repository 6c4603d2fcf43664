//! Offline submitter with fixed acceptance rules.
//!
//! Only card payloads are checked: a missing security code or a number that
//! does not start with the Visa prefix is rejected. Payloads for paypal,
//! venmo, or applepay are always accepted. It is a test double for the
//! workflow, not a payment simulator.
use super::{SubmissionOutcome, Submitter};
use crate::error::VaultResult;
use crate::schema::ROOT_KEY;
use serde_json::{json, Value};

const VISA_PREFIX: &str = "4";

#[derive(Debug, Default, Clone, Copy)]
pub struct MockSubmitter;

impl MockSubmitter {
    pub fn new() -> Self {
        Self
    }
}

fn rejected(category: &str, message: &str) -> SubmissionOutcome {
    SubmissionOutcome::Rejected {
        category: category.to_string(),
        message: message.to_string(),
        status: None,
        body: None,
    }
}

impl Submitter for MockSubmitter {
    fn submit(&self, payload: &Value) -> VaultResult<SubmissionOutcome> {
        if let Some(card) = payload.get(ROOT_KEY).and_then(|source| source.get("card")) {
            if card.get("security_code").is_none() {
                tracing::debug!("mock submit rejected: missing security_code");
                return Ok(rejected("missing_field", "missing_field: security_code"));
            }
            let number = card.get("number").and_then(Value::as_str).unwrap_or("");
            if !number.starts_with(VISA_PREFIX) {
                tracing::debug!("mock submit rejected: non-Visa number");
                return Ok(rejected("invalid_account_number", "invalid_account_number"));
            }
        }
        tracing::debug!("mock submit accepted");
        Ok(SubmissionOutcome::Accepted {
            status: 200,
            body: json!({"status": "success"}),
        })
    }
}
