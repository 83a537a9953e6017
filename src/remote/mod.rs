// src/remote/mod.rs

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result, Stage};

pub mod completion;
pub mod gemini;
pub mod tapas;

pub use completion::CompletionNarrative;
pub use gemini::GeminiNarrative;
pub use tapas::{TableQuery, TapasClient};

/// Longest slice of an error body carried into an error message.
const BODY_SNIPPET_LEN: usize = 200;

/// One HTTP client for every remote call; the timeout is the only deadline
/// a query is subject to.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::InvalidConfig {
            key: "REQUEST_TIMEOUT_SECS",
            value: format!("{:?} ({})", timeout, e),
        })
}

/// POST `body` as JSON and decode the reply into a JSON tree.
///
/// Transport failures, non-2xx statuses, undecodable bodies and inference-API
/// error objects all become [`Error::Remote`] tagged with `stage`.
pub(crate) async fn post_json<T>(request: RequestBuilder, body: &T, stage: Stage) -> Result<Value>
where
    T: Serialize + ?Sized,
{
    let resp = request
        .json(body)
        .send()
        .await
        .map_err(|e| Error::remote(stage, e))?;
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| Error::remote(stage, format!("reading body: {}", e)))?;
    debug!(%stage, %status, len = text.len(), "response received");

    if !status.is_success() {
        warn!(%stage, %status, "non-success status");
        return Err(Error::remote(
            stage,
            format!("HTTP {}: {}", status, snippet(&text)),
        ));
    }

    let value: Value = serde_json::from_str(&text)
        .map_err(|e| Error::remote(stage, format!("decoding response: {}", e)))?;

    if let Some(msg) = service_error(&value) {
        return Err(Error::remote(stage, format!("service error: {}", msg)));
    }
    Ok(value)
}

/// `{"error": "..."}` or `{"error": {"message": "..."}}`.
fn service_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
        ),
        _ => None,
    }
}

fn snippet(text: &str) -> &str {
    match text.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
