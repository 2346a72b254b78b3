use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Closed set of rejection reasons reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    InvalidInputType,
    InvalidItemType,
    InvalidFormat,
    NotFound,
    DatastoreUnavailable,
    /// Only produced by the guardrail chain, never by the validator itself.
    BlockedByGuardrail,
}

impl ReasonCode {
    pub fn default_message(self) -> &'static str {
        match self {
            ReasonCode::InvalidInputType => "Error: Input must be a string or a list of strings.",
            ReasonCode::InvalidItemType => "Error: All items in the list must be strings.",
            ReasonCode::InvalidFormat => "Invalid format. HSN code must be 2, 4, 6, or 8 digits.",
            ReasonCode::NotFound => "HSN code not found in the master data.",
            ReasonCode::DatastoreUnavailable => {
                "The HSN master data failed to load at startup. Cannot perform validation."
            }
            ReasonCode::BlockedByGuardrail => "The request was blocked by a policy restriction.",
        }
    }
}

pub const VALID_MESSAGE: &str = "HSN code is valid.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub code: String,
    pub description: String,
}

/// Immutable code → description mapping. Keys are stored trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    entries: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl ReferenceTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from in-memory entries. The first occurrence of a code wins, matching
    /// the loader's default duplicate policy.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ReferenceEntry>,
    {
        let mut map = HashMap::new();
        for entry in entries {
            map.entry(entry.code.trim().to_string())
                .or_insert(entry.description);
        }
        Self {
            entries: map,
            source: None,
        }
    }

    pub(crate) fn from_map(entries: HashMap<String, String>) -> Self {
        Self {
            entries,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&std::path::Path> {
        self.source.as_deref()
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome for one input code, serialized in the shape existing callers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(rename = "input_hsn")]
    pub input: String,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<ReasonCode>,
    pub message: String,
}

impl ValidationResult {
    pub fn valid(input: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            is_valid: true,
            description: Some(description.into()),
            reason_code: None,
            message: VALID_MESSAGE.to_string(),
        }
    }

    pub fn invalid(input: impl Into<String>, reason: ReasonCode) -> Self {
        Self::invalid_with_message(input, reason, reason.default_message())
    }

    pub fn invalid_with_message(
        input: impl Into<String>,
        reason: ReasonCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            is_valid: false,
            description: None,
            reason_code: Some(reason),
            message: message.into(),
        }
    }
}

/// A request as received from a loosely typed caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeRequest {
    Single(String),
    Many(Vec<Value>),
    Unsupported(Value),
}

impl CodeRequest {
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CodeRequest::Many(codes.into_iter().map(|c| Value::String(c.into())).collect())
    }

    /// Text used for `input_hsn` when a result describes the whole request.
    pub fn display(&self) -> String {
        match self {
            CodeRequest::Single(code) => code.clone(),
            CodeRequest::Many(items) => Value::Array(items.clone()).to_string(),
            CodeRequest::Unsupported(value) => render_value(value),
        }
    }
}

impl From<&Value> for CodeRequest {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(code) => CodeRequest::Single(code.clone()),
            Value::Array(items) => CodeRequest::Many(items.clone()),
            other => CodeRequest::Unsupported(other.clone()),
        }
    }
}

impl From<Value> for CodeRequest {
    fn from(value: Value) -> Self {
        match value {
            Value::String(code) => CodeRequest::Single(code),
            Value::Array(items) => CodeRequest::Many(items),
            other => CodeRequest::Unsupported(other),
        }
    }
}

/// Strings render bare, everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
