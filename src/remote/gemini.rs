// src/remote/gemini.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::post_json;
use crate::config::Credential;
use crate::error::{Error, Result, Stage};
use crate::orchestrator::{NarrativeContext, NarrativeStrategy};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini `generateContent`, prompted with the raw query and the full table.
#[derive(Debug, Clone)]
pub struct GeminiNarrative {
    client: Client,
    url: Url,
}

impl GeminiNarrative {
    pub fn new(client: Client, url: Url) -> Self {
        GeminiNarrative { client, url }
    }
}

#[async_trait]
impl NarrativeStrategy for GeminiNarrative {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn credential(&self) -> Credential {
        Credential::Gemini
    }

    fn prompt(&self, ctx: &NarrativeContext<'_>) -> String {
        // Table serialization cannot fail: string keys, string cells.
        let table = serde_json::to_string(ctx.table).unwrap_or_default();
        format!(
            "You are an energy-efficiency advisor. The following JSON object holds an \
             energy consumption table, one array of values per column:\n{}\n\n\
             Question: {}\n\n\
             Answer the question from the table, then recommend concrete ways to reduce \
             energy consumption.",
            table, ctx.query
        )
    }

    async fn generate(&self, prompt: &str, secret: &str) -> Result<String> {
        let req = self.client.post(self.url.clone()).query(&[("key", secret)]);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        let value = post_json(req, &body, Stage::Narrative).await?;

        let resp: GenerateResponse = serde_json::from_value(value)
            .map_err(|e| Error::remote(Stage::Narrative, format!("decoding response: {}", e)))?;
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::remote(Stage::Narrative, "no candidates in response"))?;
        Ok(candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{AggregatedQuantity, StructuredAnswer};
    use crate::table::Table;
    use httpmock::prelude::*;

    fn strategy_for(server: &MockServer) -> GeminiNarrative {
        GeminiNarrative::new(
            Client::new(),
            Url::parse(&server.url("/v1beta/models/gemini-pro:generateContent")).unwrap(),
        )
    }

    #[test]
    fn prompt_carries_query_and_table() {
        let table =
            Table::from_columns(vec![("day", vec!["Mon"]), ("kwh", vec!["3.5"])]).unwrap();
        let answer = StructuredAnswer {
            answer: "3.5".into(),
            coordinates: vec![(0, 1)],
            cells: vec!["3.5".into()],
            aggregator: "NONE".into(),
        };
        let strategy = GeminiNarrative::new(Client::new(), Url::parse("http://localhost/").unwrap());
        let prompt = strategy.prompt(&NarrativeContext {
            query: "What did Monday use?",
            table: &table,
            answer: &answer,
            quantity: AggregatedQuantity::new(3.5),
        });
        assert!(prompt.contains(r#"{"day":["Mon"],"kwh":["3.5"]}"#));
        assert!(prompt.contains("Question: What did Monday use?"));
    }

    #[tokio::test]
    async fn joins_parts_of_first_candidate() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-pro:generateContent")
                    .query_param("key", "gem_test")
                    .json_body(json!({"contents": [{"parts": [{"text": "p"}]}]}));
                then.status(200).json_body(json!({
                    "candidates": [
                        {"content": {"parts": [{"text": "Monday used 3.5 kWh."}, {"text": "* Lower the thermostat"}]}},
                        {"content": {"parts": [{"text": "second candidate"}]}}
                    ]
                }));
            })
            .await;

        let text = strategy_for(&server).generate("p", "gem_test").await.unwrap();
        mock.assert_async().await;
        assert_eq!(text, "Monday used 3.5 kWh.\n* Lower the thermostat");
    }

    #[tokio::test]
    async fn no_candidates_is_narrative_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1beta/models/gemini-pro:generateContent");
                then.status(200).json_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
            })
            .await;

        let err = strategy_for(&server).generate("p", "gem_test").await.unwrap_err();
        assert!(matches!(err, Error::Remote { stage: Stage::Narrative, .. }));
    }

    #[tokio::test]
    async fn rejected_key_is_narrative_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1beta/models/gemini-pro:generateContent");
                then.status(400)
                    .json_body(json!({"error": {"code": 400, "message": "API key not valid"}}));
            })
            .await;

        let err = strategy_for(&server).generate("p", "bad").await.unwrap_err();
        assert!(matches!(err, Error::Remote { stage: Stage::Narrative, .. }));
        assert!(err.to_string().contains("400"));
    }
}
