use crate::domain::model::{CodeRequest, ReasonCode, ValidationResult};
use crate::domain::ports::{Capability, Intercepted, Interceptor, Replacement, Verdict};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Tool name under which the validator is exposed to interceptors.
pub const VALIDATION_TOOL: &str = "hsn_code_validation_tool";

pub const DEFAULT_BLOCKED_KEYWORDS: [&str; 2] = ["STUPID", "BLOCK"];
pub const DEFAULT_BLOCKED_PREFIXES: [&str; 1] = ["99"];

pub const DEFAULT_KEYWORD_REPLIES: [&str; 5] = [
    "I'm sorry, I cannot process this request as it contains inappropriate language.",
    "This query cannot be processed due to the presence of a blocked word.",
    "To maintain a respectful environment, I am unable to respond to messages containing certain terms.",
    "Your request has been flagged and cannot be completed.",
    "I cannot proceed with this request. Please rephrase your query without using blocked words.",
];

pub const DEFAULT_CODE_REPLIES: [&str; 7] = [
    "I'm sorry, but I cannot process the validation for the provided code due to a policy restriction.",
    "This particular HSN/SAC code cannot be validated using this tool. Please check the code or try a different method.",
    "The request was blocked. There is a restriction on processing this specific type of input.",
    "Validation for this category of codes is currently restricted. The operation could not be completed.",
    "I am unable to complete the validation as the provided code falls under a restricted category.",
    "This request could not be processed. The input is valid in format but is restricted by system policy.",
    "Processing for this code has been disabled. Please verify your input or contact support for more information on this category.",
];

/// Cycles through a fixed list of canned replies.
#[derive(Debug)]
struct Replies {
    messages: Vec<String>,
    next: AtomicUsize,
}

impl Replies {
    fn new(messages: Vec<String>, fallback: &str) -> Self {
        let messages = if messages.is_empty() {
            vec![fallback.to_string()]
        } else {
            messages
        };
        Self {
            messages,
            next: AtomicUsize::new(0),
        }
    }

    fn pick(&self) -> String {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.messages.len();
        self.messages[idx].clone()
    }
}

/// Blocks messages containing any of the configured keywords (case-insensitive).
#[derive(Debug)]
pub struct KeywordGuardrail {
    keywords: Vec<String>,
    replies: Replies,
}

impl KeywordGuardrail {
    pub fn new<I, S>(keywords: I, replies: Vec<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
            replies: Replies::new(replies, DEFAULT_KEYWORD_REPLIES[0]),
        }
    }

    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        let upper = text.to_uppercase();
        self.keywords
            .iter()
            .find(|keyword| upper.contains(keyword.as_str()))
            .map(String::as_str)
    }
}

impl Default for KeywordGuardrail {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLOCKED_KEYWORDS,
            DEFAULT_KEYWORD_REPLIES.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl Interceptor for KeywordGuardrail {
    fn name(&self) -> &str {
        "block_keyword"
    }

    fn capability(&self) -> Capability {
        Capability::Message
    }

    fn inspect(&self, call: &Intercepted<'_>) -> Verdict {
        let Intercepted::Message(text) = call else {
            return Verdict::PassThrough;
        };

        match self.matched_keyword(text) {
            Some(keyword) => {
                tracing::info!("Blocked keyword '{}' found in message", keyword);
                Verdict::Replace(Replacement::Reply(self.replies.pick()))
            }
            None => Verdict::PassThrough,
        }
    }
}

/// Refuses validation calls that include a code in a restricted range.
#[derive(Debug)]
pub struct CodePrefixGuardrail {
    tool: String,
    prefixes: Vec<String>,
    replies: Replies,
}

impl CodePrefixGuardrail {
    pub fn new<I, S>(tool: impl Into<String>, prefixes: I, replies: Vec<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tool: tool.into(),
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            replies: Replies::new(replies, ReasonCode::BlockedByGuardrail.default_message()),
        }
    }

    fn first_blocked<'a>(&self, request: &'a CodeRequest) -> Option<&'a str> {
        let is_blocked = |code: &str| {
            let clean = code.trim();
            self.prefixes.iter().any(|p| clean.starts_with(p.as_str()))
        };

        match request {
            CodeRequest::Single(code) => Some(code.as_str()).filter(|c| is_blocked(c)),
            CodeRequest::Many(items) => items
                .iter()
                .filter_map(Value::as_str)
                .find(|c| is_blocked(c)),
            CodeRequest::Unsupported(_) => None,
        }
    }
}

impl Default for CodePrefixGuardrail {
    fn default() -> Self {
        Self::new(
            VALIDATION_TOOL,
            DEFAULT_BLOCKED_PREFIXES,
            DEFAULT_CODE_REPLIES.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl Interceptor for CodePrefixGuardrail {
    fn name(&self) -> &str {
        "block_code_prefix"
    }

    fn capability(&self) -> Capability {
        Capability::ToolCall
    }

    fn inspect(&self, call: &Intercepted<'_>) -> Verdict {
        let Intercepted::ToolCall { tool, request } = call else {
            return Verdict::PassThrough;
        };
        if *tool != self.tool {
            return Verdict::PassThrough;
        }

        match self.first_blocked(request) {
            Some(code) => {
                tracing::info!("Blocked restricted HSN code '{}'", code);
                Verdict::Replace(Replacement::Results(vec![
                    ValidationResult::invalid_with_message(
                        code,
                        ReasonCode::BlockedByGuardrail,
                        self.replies.pick(),
                    ),
                ]))
            }
            None => Verdict::PassThrough,
        }
    }
}

/// A replacement together with the interceptor that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocked {
    pub interceptor: String,
    pub replacement: Replacement,
}

/// Interceptors evaluated in registration order; the first replacement wins.
#[derive(Default)]
pub struct GuardrailChain {
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl GuardrailChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.push(Box::new(interceptor));
        self
    }

    pub fn push(&mut self, interceptor: Box<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn evaluate(&self, call: &Intercepted<'_>) -> Option<Blocked> {
        let capability = call.capability();

        for interceptor in self
            .interceptors
            .iter()
            .filter(|i| i.capability() == capability)
        {
            tracing::debug!("Running interceptor '{}'", interceptor.name());
            if let Verdict::Replace(replacement) = interceptor.inspect(call) {
                return Some(Blocked {
                    interceptor: interceptor.name().to_string(),
                    replacement,
                });
            }
        }

        None
    }
}

impl std::fmt::Debug for GuardrailChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed {
        name: &'static str,
        capability: Capability,
        reply: Option<&'static str>,
    }

    impl Interceptor for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn capability(&self) -> Capability {
            self.capability
        }

        fn inspect(&self, _call: &Intercepted<'_>) -> Verdict {
            match self.reply {
                Some(text) => Verdict::Replace(Replacement::Reply(text.to_string())),
                None => Verdict::PassThrough,
            }
        }
    }

    #[test]
    fn test_keyword_guardrail_is_case_insensitive() {
        let guardrail = KeywordGuardrail::default();
        assert_eq!(guardrail.matched_keyword("please block this"), Some("BLOCK"));
        assert_eq!(guardrail.matched_keyword("Is 0101 valid?"), None);

        let verdict = guardrail.inspect(&Intercepted::Message("that was Stupid"));
        assert!(matches!(verdict, Verdict::Replace(Replacement::Reply(_))));
    }

    #[test]
    fn test_keyword_replies_rotate() {
        let guardrail = KeywordGuardrail::new(["block"], vec!["one".into(), "two".into()]);
        let replies: Vec<Verdict> = (0..3)
            .map(|_| guardrail.inspect(&Intercepted::Message("BLOCK")))
            .collect();
        assert_eq!(
            replies,
            vec![
                Verdict::Replace(Replacement::Reply("one".into())),
                Verdict::Replace(Replacement::Reply("two".into())),
                Verdict::Replace(Replacement::Reply("one".into())),
            ]
        );
    }

    #[test]
    fn test_prefix_guardrail_blocks_first_restricted_code() {
        let guardrail = CodePrefixGuardrail::new(VALIDATION_TOOL, ["99"], vec!["restricted".into()]);
        let request = CodeRequest::Many(vec![json!("0101"), json!(99), json!(" 998311 "), json!("9954")]);

        let verdict = guardrail.inspect(&Intercepted::ToolCall {
            tool: VALIDATION_TOOL,
            request: &request,
        });

        let expected = ValidationResult::invalid_with_message(
            " 998311 ",
            ReasonCode::BlockedByGuardrail,
            "restricted",
        );
        assert_eq!(verdict, Verdict::Replace(Replacement::Results(vec![expected])));
    }

    #[test]
    fn test_default_prefix_guardrail_cycles_all_replies() {
        let guardrail = CodePrefixGuardrail::default();
        let request = CodeRequest::Single("9954".to_string());

        let messages: Vec<String> = (0..DEFAULT_CODE_REPLIES.len() + 1)
            .map(|_| {
                match guardrail.inspect(&Intercepted::ToolCall {
                    tool: VALIDATION_TOOL,
                    request: &request,
                }) {
                    Verdict::Replace(Replacement::Results(results)) => results[0].message.clone(),
                    other => panic!("expected a blocked result, got {:?}", other),
                }
            })
            .collect();

        assert_eq!(DEFAULT_CODE_REPLIES.len(), 7);
        assert_eq!(&messages[..7], &DEFAULT_CODE_REPLIES[..]);
        assert_eq!(messages[7], DEFAULT_CODE_REPLIES[0]);
    }

    #[test]
    fn test_prefix_guardrail_ignores_other_tools_and_clean_requests() {
        let guardrail = CodePrefixGuardrail::default();
        let request = CodeRequest::Single("9954".to_string());

        let other_tool = Intercepted::ToolCall {
            tool: "weather",
            request: &request,
        };
        assert_eq!(guardrail.inspect(&other_tool), Verdict::PassThrough);

        let clean = CodeRequest::from_codes(["0101", "8471"]);
        let call = Intercepted::ToolCall {
            tool: VALIDATION_TOOL,
            request: &clean,
        };
        assert_eq!(guardrail.inspect(&call), Verdict::PassThrough);
    }

    #[test]
    fn test_chain_filters_by_capability_and_keeps_order() {
        let chain = GuardrailChain::new()
            .with(Fixed {
                name: "tool-only",
                capability: Capability::ToolCall,
                reply: Some("tool"),
            })
            .with(Fixed {
                name: "quiet",
                capability: Capability::Message,
                reply: None,
            })
            .with(Fixed {
                name: "first",
                capability: Capability::Message,
                reply: Some("first"),
            })
            .with(Fixed {
                name: "second",
                capability: Capability::Message,
                reply: Some("second"),
            });

        let blocked = chain.evaluate(&Intercepted::Message("hello")).unwrap();
        assert_eq!(blocked.interceptor, "first");
        assert_eq!(blocked.replacement, Replacement::Reply("first".into()));
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn test_empty_chain_passes_everything() {
        let chain = GuardrailChain::new();
        assert!(chain.is_empty());
        assert!(chain.evaluate(&Intercepted::Message("BLOCK")).is_none());
    }
}
