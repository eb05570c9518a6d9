//! Response classifier & error mapper

use serde_json::Value;
use tradelink_domain::constants::{ACK_FIELD, DUPLICATE_LISTING_ERROR_CODE, ERRORS_FIELD};
use tradelink_domain::{AckStatus, ApiError, RemoteErrorEntry, Result, Severity};

use crate::tree::{as_sequence, scalar_text};

/// Classify one normalized reply.
///
/// Only an exact `Failure` status fails; `Warning`, unknown and missing
/// statuses all pass through.
///
/// # Errors
/// Returns `ApiError::RemoteOperationFailed` carrying every error entry of
/// the reply when the status is `Failure`.
pub fn classify(operation: &str, reply: &Value) -> Result<AckStatus> {
    let status = AckStatus::from_wire(reply.get(ACK_FIELD).and_then(scalar_text).as_deref());
    if !status.is_failure() {
        return Ok(status);
    }

    let errors = error_entries(reply);
    Err(ApiError::RemoteOperationFailed {
        operation: operation.to_string(),
        message: failure_message(&errors),
        errors,
    })
}

/// Structured view of the reply's error list, which may be a single entry
/// or a sequence.
pub fn error_entries(reply: &Value) -> Vec<RemoteErrorEntry> {
    as_sequence(reply.get(ERRORS_FIELD)).into_iter().map(parse_entry).collect()
}

/// Comma-joined long messages of the `Error`-severity entries
pub fn failure_message(entries: &[RemoteErrorEntry]) -> String {
    entries.iter().filter(|entry| entry.is_error()).map(entry_text).collect::<Vec<_>>().join(",")
}

fn entry_text(entry: &RemoteErrorEntry) -> String {
    let message = entry.long_message.clone().unwrap_or_default();
    if entry.code.as_deref() != Some(DUPLICATE_LISTING_ERROR_CODE) || entry.parameters.is_empty() {
        return message;
    }
    std::iter::once(message).chain(entry.parameters.iter().cloned()).collect::<Vec<_>>().join(" | ")
}

fn parse_entry(value: &Value) -> RemoteErrorEntry {
    let text = |field: &str| value.get(field).and_then(scalar_text);
    RemoteErrorEntry {
        code: text("ErrorCode"),
        severity: text("SeverityCode").map(|severity| Severity::from_wire(&severity)),
        short_message: text("ShortMessage"),
        long_message: text("LongMessage"),
        parameters: as_sequence(value.get("ErrorParameters"))
            .into_iter()
            .flat_map(|parameter| as_sequence(parameter.get("Value")))
            .filter_map(scalar_text)
            .collect(),
    }
}
