//! Best-effort extraction of the payload object from model output.
//!
//! Models wrap JSON in prose, code fences, or return extra blocks (headers,
//! endpoint notes). The heuristic:
//!
//! 1. Opening marker: the first `{` whose first key is `"payment_source"`,
//!    falling back to the first `{` in the text.
//! 2. Closing marker: the last `}` in the text.
//! 3. Parse the span between them. If that fails, parse the first complete
//!    JSON value that starts at the opening marker, which covers trailing
//!    blocks and prose that contains braces.
//!
//! The parser message from step 3's span parse is kept in the error so a
//! malformed response can be debugged from the report alone.
use crate::error::{VaultError, VaultResult};
use crate::schema::ROOT_KEY;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

static ROOT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"\{{\s*"{ROOT_KEY}"\s*:"#)).expect("root marker pattern")
});

/// Extract the payload object from raw model text.
pub fn extract(raw: &str) -> VaultResult<Value> {
    let start = opening_marker(raw).ok_or_else(no_json)?;
    let end = raw
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(no_json)?;
    let candidate = &raw[start..=end];

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Some(value) = first_value(&raw[start..]) {
                tracing::debug!(
                    candidate_bytes = candidate.len(),
                    "span parse failed; using first complete object"
                );
                return Ok(value);
            }
            Err(VaultError::Extraction(format!("malformed JSON: {err}")))
        }
    }
}

fn opening_marker(raw: &str) -> Option<usize> {
    ROOT_MARKER
        .find(raw)
        .map(|found| found.start())
        .or_else(|| raw.find('{'))
}

fn first_value(text: &str) -> Option<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    Value::deserialize(&mut deserializer)
        .ok()
        .filter(Value::is_object)
}

fn no_json() -> VaultError {
    VaultError::Extraction("no JSON found".to_string())
}
