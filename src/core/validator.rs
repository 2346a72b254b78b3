use crate::domain::model::{render_value, CodeRequest, ReasonCode, ReferenceTable, ValidationResult};
use serde_json::Value;

/// Code lengths allowed by the HSN hierarchy (chapter, heading, subheading, tariff item).
pub const VALID_LENGTHS: [usize; 4] = [2, 4, 6, 8];

/// Structural check on an already-trimmed code.
pub fn is_well_formed(clean_code: &str) -> bool {
    !clean_code.is_empty()
        && clean_code.bytes().all(|b| b.is_ascii_digit())
        && VALID_LENGTHS.contains(&clean_code.len())
}

/// Validate a batch of codes. One result per input, in input order.
pub fn validate<S: AsRef<str>>(inputs: &[S], table: &ReferenceTable) -> Vec<ValidationResult> {
    if table.is_empty() {
        let rendered = Value::Array(
            inputs
                .iter()
                .map(|s| Value::String(s.as_ref().to_string()))
                .collect(),
        );
        return vec![datastore_unavailable(rendered.to_string())];
    }

    inputs
        .iter()
        .map(|code| validate_code(code.as_ref(), table))
        .collect()
}

/// Validate a request whose shape is not known ahead of time.
///
/// A bare string is treated as a one-element batch. Any other non-array value
/// yields a single `INVALID_INPUT_TYPE` result.
pub fn validate_request(request: &CodeRequest, table: &ReferenceTable) -> Vec<ValidationResult> {
    if table.is_empty() {
        return vec![datastore_unavailable(request.display())];
    }

    match request {
        CodeRequest::Single(code) => vec![validate_code(code, table)],
        CodeRequest::Many(items) => items.iter().map(|item| validate_item(item, table)).collect(),
        CodeRequest::Unsupported(value) => vec![ValidationResult::invalid(
            render_value(value),
            ReasonCode::InvalidInputType,
        )],
    }
}

pub fn validate_value(value: &Value, table: &ReferenceTable) -> Vec<ValidationResult> {
    validate_request(&CodeRequest::from(value), table)
}

fn validate_item(item: &Value, table: &ReferenceTable) -> ValidationResult {
    match item {
        Value::String(code) => validate_code(code, table),
        other => ValidationResult::invalid(render_value(other), ReasonCode::InvalidItemType),
    }
}

/// Per-code rules; the first one that matches decides the outcome.
pub fn validate_code(code: &str, table: &ReferenceTable) -> ValidationResult {
    let clean_code = code.trim();

    if !is_well_formed(clean_code) {
        return ValidationResult::invalid(code, ReasonCode::InvalidFormat);
    }

    match table.get(clean_code) {
        Some(description) => ValidationResult::valid(code, description),
        None => ValidationResult::invalid(code, ReasonCode::NotFound),
    }
}

fn datastore_unavailable(input: String) -> ValidationResult {
    tracing::warn!("Validation requested while the reference table is empty");
    ValidationResult::invalid(input, ReasonCode::DatastoreUnavailable)
}
