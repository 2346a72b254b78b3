use crate::core::loader::TableSource;
use crate::core::service::ValidationService;
use crate::domain::model::ValidationResult;
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One line of input, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ServeRequest {
    Message(String),
    Codes(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServeResponse {
    Results(Vec<ValidationResult>),
    Screened {
        blocked: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply: Option<String>,
    },
}

/// Lines that look like JSON (`[`, `{` or `"`) are decoded; anything else is a bare code.
///
/// Bare digits are never decoded as JSON numbers, so `12345` stays a code.
pub fn parse_line(line: &str) -> ServeRequest {
    let trimmed = line.trim();
    let looks_like_json = matches!(trimmed.as_bytes().first(), Some(b'[' | b'{' | b'"'));
    if !looks_like_json {
        return ServeRequest::Codes(Value::String(line.to_string()));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(mut map)) => {
            if let Some(Value::String(message)) = map.get("message") {
                return ServeRequest::Message(message.clone());
            }
            match map.remove("hsn_inputs") {
                Some(inputs) => ServeRequest::Codes(inputs),
                None => ServeRequest::Codes(Value::Object(map)),
            }
        }
        Ok(value) => ServeRequest::Codes(value),
        Err(e) => {
            tracing::debug!("Line is not valid JSON ({}); treating it as a code", e);
            ServeRequest::Codes(Value::String(line.to_string()))
        }
    }
}

pub fn handle(service: &ValidationService, request: &ServeRequest) -> ServeResponse {
    match request {
        ServeRequest::Message(text) => {
            let reply = service.screen_message(text);
            ServeResponse::Screened {
                blocked: reply.is_some(),
                reply,
            }
        }
        ServeRequest::Codes(value) => ServeResponse::Results(service.validate(value)),
    }
}

/// Answer every non-blank input line with one JSON line. Returns the number of requests served.
pub async fn run<R, W>(service: &ValidationService, reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut served = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle(service, &parse_line(&line));
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        served += 1;
    }

    tracing::info!("Input closed after {} requests", served);
    Ok(served)
}

/// Periodically reload the reference table in the background.
///
/// The first reload happens one full interval after start; the table loaded at
/// startup is already current.
pub fn spawn_reload_task(
    service: Arc<ValidationService>,
    source: TableSource,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let service = Arc::clone(&service);
            let source = source.clone();
            match tokio::task::spawn_blocking(move || service.reload(&source)).await {
                Ok(len) => tracing::debug!("Reload finished, {} codes published", len),
                Err(e) => tracing::error!("Reload task failed: {}", e),
            }
        }
    })
}
