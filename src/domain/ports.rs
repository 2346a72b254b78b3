use crate::domain::model::{CodeRequest, ValidationResult};

/// What an interceptor is able to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Free-text user messages, before any lookup happens.
    Message,
    /// A validation call about to run against the reference table.
    ToolCall,
}

#[derive(Debug, Clone, Copy)]
pub enum Intercepted<'a> {
    Message(&'a str),
    ToolCall {
        tool: &'a str,
        request: &'a CodeRequest,
    },
}

impl Intercepted<'_> {
    pub fn capability(&self) -> Capability {
        match self {
            Intercepted::Message(_) => Capability::Message,
            Intercepted::ToolCall { .. } => Capability::ToolCall,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    Reply(String),
    Results(Vec<ValidationResult>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    PassThrough,
    Replace(Replacement),
}

pub trait Interceptor: Send + Sync {
    fn name(&self) -> &str;
    fn capability(&self) -> Capability;
    fn inspect(&self, call: &Intercepted<'_>) -> Verdict;
}
