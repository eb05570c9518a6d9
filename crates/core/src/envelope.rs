//! Request envelope builder
//!
//! An envelope is the XML declaration followed by a single
//! `{Operation}Request` root carrying the fixed namespace, with the options
//! tree serialized as its children. Element rules (mappings nest, sequences
//! repeat, scalars become text, `@`/`#` carry attributes and text) are
//! enforced by the injected [`XmlCodec`].

use serde_json::Value;
use tradelink_domain::constants::{REQUEST_SUFFIX, XMLNS};
use tradelink_domain::{ApiError, Result};

use crate::ports::XmlCodec;

/// Root element name for an operation's request
pub fn request_root(operation: &str) -> String {
    format!("{operation}{REQUEST_SUFFIX}")
}

/// Build the request document for `operation`.
///
/// # Errors
/// Returns `ApiError::InvalidOptions` when `options` is not a mapping, before
/// the codec is consulted, or when the codec cannot serialize it.
pub fn build_envelope(codec: &dyn XmlCodec, operation: &str, options: &Value) -> Result<String> {
    let Value::Object(body) = options else {
        return Err(ApiError::InvalidOptions(format!(
            "the options for {operation} must be a mapping, got {}",
            describe(options)
        )));
    };

    codec.to_xml(&request_root(operation), &[("xmlns", XMLNS)], body).map_err(|err| match err {
        ApiError::InvalidOptions(_) => err,
        other => ApiError::InvalidOptions(other.to_string()),
    })
}

pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => format!("boolean {flag}"),
        Value::Number(number) => format!("number {number}"),
        Value::String(text) => format!("string {text:?}"),
        Value::Array(items) => format!("a sequence of {} values", items.len()),
        Value::Object(_) => "a mapping".to_string(),
    }
}
