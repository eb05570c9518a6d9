//! Structured tree helpers
//!
//! Options and replies are both `serde_json` trees with insertion order
//! preserved. Two merge rules apply to them:
//! - [`merge_options`] layers caller options over catalog defaults. Mappings
//!   merge key by key, every other value (sequences included) is replaced.
//! - [`merge_page`] folds one reply page into the accumulated result.
//!   Sequences concatenate, mappings merge recursively, and any other
//!   conflict is won by the page merged last.

use serde_json::{Map, Value};
use tradelink_domain::constants::DECODED_TEXT_KEY;

/// Logical request body before serialization
pub type OptionsTree = Map<String, Value>;

/// Layer `overrides` over `base`, recursively.
pub fn merge_options(base: &mut OptionsTree, overrides: OptionsTree) {
    for (key, value) in overrides {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = base.get_mut(&key) {
                merge_options(existing, incoming);
                continue;
            }
            base.insert(key, Value::Object(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Fold `source` into `target` using the page merge rule.
pub fn merge_page(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Array(existing), Value::Array(items)) => existing.extend(items),
        (Value::Array(existing), item) => existing.push(item),
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_page(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Walk `path` through nested mappings.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Set `value` at `path`, creating or replacing intermediate mappings.
pub fn set_path(tree: &mut OptionsTree, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = tree;
    for key in parents {
        let slot = current.entry((*key).to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert((*last).to_string(), value);
}

/// Numeric reading of a reply field. Missing, non-numeric and NaN values
/// read as `None`.
pub fn parse_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Array(items) => return parse_number(items.first()),
        _ => None,
    }?;
    (!number.is_nan()).then_some(number)
}

/// Text of a scalar-ish reply field.
///
/// Handles plain strings and numbers, attributed elements carrying their
/// text under the decoded text key, and single-element sequences.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(map) => map.get(DECODED_TEXT_KEY).and_then(scalar_text),
        Value::Array(items) => items.first().and_then(scalar_text),
        Value::Null => None,
    }
}

/// Normalize a field that may be a single entry or a sequence of entries.
pub fn as_sequence(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

/// Unwrap a `json!` object literal into an options tree.
pub(crate) fn object(value: Value) -> OptionsTree {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
