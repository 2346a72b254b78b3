use crate::core::guardrail::{Blocked, GuardrailChain, VALIDATION_TOOL};
use crate::core::loader::TableSource;
use crate::core::store::TableStore;
use crate::core::validator;
use crate::domain::model::{CodeRequest, ValidationResult};
use crate::domain::ports::{Intercepted, Replacement};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// The last result set handed back to a caller, kept for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub recorded_at: DateTime<Utc>,
    pub request: String,
    pub results: Vec<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
}

/// Host around the validator: owns the table store, runs guardrails and
/// optionally remembers the most recent result set.
#[derive(Debug)]
pub struct ValidationService {
    store: TableStore,
    guardrails: GuardrailChain,
    audit_enabled: bool,
    last: Mutex<Option<AuditRecord>>,
}

impl ValidationService {
    pub fn new(store: TableStore, guardrails: GuardrailChain) -> Self {
        Self {
            store,
            guardrails,
            audit_enabled: true,
            last: Mutex::new(None),
        }
    }

    pub fn with_audit(mut self, enabled: bool) -> Self {
        self.audit_enabled = enabled;
        self
    }

    pub fn table_len(&self) -> usize {
        self.store.len()
    }

    pub fn reload(&self, source: &TableSource) -> usize {
        self.store.reload(source)
    }

    /// Screen a free-text message. `Some(reply)` means the message was refused.
    pub fn screen_message(&self, text: &str) -> Option<String> {
        match self.guardrails.evaluate(&Intercepted::Message(text)) {
            Some(Blocked {
                interceptor,
                replacement: Replacement::Reply(reply),
            }) => {
                tracing::info!("Message refused by '{}'", interceptor);
                Some(reply)
            }
            Some(Blocked { interceptor, .. }) => {
                tracing::warn!(
                    "Interceptor '{}' returned results for a message; ignoring",
                    interceptor
                );
                None
            }
            None => None,
        }
    }

    pub fn validate(&self, request: &Value) -> Vec<ValidationResult> {
        self.validate_request(&CodeRequest::from(request))
    }

    pub fn validate_codes<S: AsRef<str>>(&self, codes: &[S]) -> Vec<ValidationResult> {
        self.validate_request(&CodeRequest::from_codes(
            codes.iter().map(|c| c.as_ref().to_string()),
        ))
    }

    pub fn validate_request(&self, request: &CodeRequest) -> Vec<ValidationResult> {
        tracing::debug!("Validation requested for: {}", request.display());

        let call = Intercepted::ToolCall {
            tool: VALIDATION_TOOL,
            request,
        };

        let (results, blocked_by) = match self.guardrails.evaluate(&call) {
            Some(Blocked {
                interceptor,
                replacement: Replacement::Results(results),
            }) => (results, Some(interceptor)),
            Some(Blocked {
                interceptor,
                replacement: Replacement::Reply(reply),
            }) => {
                tracing::warn!(
                    "Interceptor '{}' replied with text to a tool call: {}",
                    interceptor,
                    reply
                );
                (self.run(request), None)
            }
            None => (self.run(request), None),
        };

        self.record(request, &results, blocked_by);
        results
    }

    pub fn last_audit(&self) -> Option<AuditRecord> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn run(&self, request: &CodeRequest) -> Vec<ValidationResult> {
        let table = self.store.snapshot();
        let results = validator::validate_request(request, &table);
        tracing::debug!(
            "Validated {} item(s) against {} codes, {} valid",
            results.len(),
            table.len(),
            results.iter().filter(|r| r.is_valid).count()
        );
        results
    }

    fn record(&self, request: &CodeRequest, results: &[ValidationResult], blocked_by: Option<String>) {
        if !self.audit_enabled {
            return;
        }

        let record = AuditRecord {
            recorded_at: Utc::now(),
            request: request.display(),
            results: results.to_vec(),
            blocked_by,
        };
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(record);
    }
}
