//! Reply envelope types: acknowledgement status and remote error entries

use serde::{Deserialize, Serialize};

/// Acknowledgement status carried by every reply envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckStatus {
    Success,
    Warning,
    Failure,
    /// Any other value, e.g. `PartialFailure`
    Other(String),
    /// The reply carried no status field
    Missing,
}

impl AckStatus {
    /// Map a raw status value. Matching is exact, as sent by the server.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("Success") => Self::Success,
            Some("Warning") => Self::Warning,
            Some("Failure") => Self::Failure,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Missing,
        }
    }

    /// Only an exact `Failure` status fails a call.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }
}

/// Severity of one remote error entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Other(String),
}

impl Severity {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "Error" => Self::Error,
            "Warning" => Self::Warning,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One entry of a reply's error list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteErrorEntry {
    pub code: Option<String>,
    pub severity: Option<Severity>,
    pub short_message: Option<String>,
    pub long_message: Option<String>,
    /// Parameter values in document order
    pub parameters: Vec<String>,
}

impl RemoteErrorEntry {
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Some(Severity::Error))
    }
}
