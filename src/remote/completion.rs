// src/remote/completion.rs

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
struct Generated {
    generated_text: String,
}

/// Hugging Face text-generation model prompted with the aggregated quantity.
#[derive(Debug, Clone)]
pub struct CompletionNarrative {
    client: Client,
    url: Url,
}

impl CompletionNarrative {
    pub fn new(client: Client, url: Url) -> Self {
        CompletionNarrative { client, url }
    }
}

#[async_trait]
impl NarrativeStrategy for CompletionNarrative {
    fn name(&self) -> &'static str {
        "completion"
    }

    fn credential(&self) -> Credential {
        Credential::HuggingFace
    }

    fn prompt(&self, ctx: &NarrativeContext<'_>) -> String {
        format!(
            "Based on the data provided, the total energy consumption is {}",
            ctx.quantity
        )
    }

    async fn generate(&self, prompt: &str, secret: &str) -> Result<String> {
        let req = self.client.post(self.url.clone()).bearer_auth(secret);
        let value = post_json(req, &json!({ "inputs": prompt }), Stage::Narrative).await?;

        let generated: Vec<Generated> = serde_json::from_value(value)
            .map_err(|e| Error::remote(Stage::Narrative, format!("decoding response: {}", e)))?;
        generated
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| Error::remote(Stage::Narrative, "empty response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{AggregatedQuantity, StructuredAnswer};
    use crate::table::Table;
    use httpmock::prelude::*;

    fn strategy_for(server: &MockServer) -> CompletionNarrative {
        CompletionNarrative::new(Client::new(), Url::parse(&server.url("/gpt2")).unwrap())
    }

    #[test]
    fn prompt_embeds_quantity() {
        let table = Table::from_columns(vec![("kwh", vec!["6"])]).unwrap();
        let answer = StructuredAnswer {
            answer: "SUM > 6".into(),
            coordinates: vec![(0, 0)],
            cells: vec!["6".into()],
            aggregator: "SUM".into(),
        };
        let strategy = CompletionNarrative::new(Client::new(), Url::parse("http://localhost/").unwrap());
        let prompt = strategy.prompt(&NarrativeContext {
            query: "how much?",
            table: &table,
            answer: &answer,
            quantity: AggregatedQuantity::new(6.0),
        });
        assert_eq!(
            prompt,
            "Based on the data provided, the total energy consumption is 6.0 kWh"
        );
    }

    #[tokio::test]
    async fn returns_first_generated_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/gpt2")
                    .header("authorization", "Bearer hf_test")
                    .json_body(json!({"inputs": "the total is 6.0 kWh"}));
                then.status(200).json_body(json!([
                    {"generated_text": "the total is 6.0 kWh, so turn the heater down."},
                    {"generated_text": "ignored"}
                ]));
            })
            .await;

        let text = strategy_for(&server)
            .generate("the total is 6.0 kWh", "hf_test")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(text, "the total is 6.0 kWh, so turn the heater down.");
    }

    #[tokio::test]
    async fn empty_list_is_narrative_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/gpt2");
                then.status(200).json_body(json!([]));
            })
            .await;

        let err = strategy_for(&server).generate("p", "hf_test").await.unwrap_err();
        assert!(matches!(err, Error::Remote { stage: Stage::Narrative, .. }));
        assert!(err.to_string().contains("empty response"));
    }

    #[tokio::test]
    async fn missing_field_is_narrative_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/gpt2");
                then.status(200).json_body(json!([{"text": "wrong field"}]));
            })
            .await;

        let err = strategy_for(&server).generate("p", "hf_test").await.unwrap_err();
        assert!(matches!(err, Error::Remote { stage: Stage::Narrative, .. }));
    }
}
