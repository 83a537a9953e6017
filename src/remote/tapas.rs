// src/remote/tapas.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::post_json;
use crate::error::{Result, Stage};
use crate::orchestrator::AnswerService;
use crate::table::Table;

/// Request body: `{"table": {<column>: [<cells>]}, "query": <text>}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TableQuery<'a> {
    pub table: &'a Table,
    pub query: &'a str,
}

/// TAPAS on the Hugging Face inference API.
#[derive(Debug, Clone)]
pub struct TapasClient {
    client: Client,
    url: Url,
}

impl TapasClient {
    pub fn new(client: Client, url: Url) -> Self {
        TapasClient { client, url }
    }
}

#[async_trait]
impl AnswerService for TapasClient {
    async fn answer(&self, request: &TableQuery<'_>, secret: &str) -> Result<Value> {
        debug!(url = %self.url, rows = request.table.num_rows(), "structured-answer request");
        let req = self.client.post(self.url.clone()).bearer_auth(secret);
        post_json(req, request, Stage::StructuredAnswer).await
    }
}
