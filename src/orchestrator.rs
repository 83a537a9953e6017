// src/orchestrator.rs

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::answer::{aggregate, normalize, AggregatedQuantity, StructuredAnswer};
use crate::config::{Config, Credential, Credentials, NarrativeBackend};
use crate::error::{Error, Result};
use crate::remote::{self, CompletionNarrative, GeminiNarrative, TableQuery, TapasClient};
use crate::table::Table;

/// The table-question-answering service.
#[async_trait]
pub trait AnswerService: Send + Sync {
    fn credential(&self) -> Credential {
        Credential::HuggingFace
    }

    /// Send the table and query; return the payload as received.
    async fn answer(&self, request: &TableQuery<'_>, secret: &str) -> Result<Value>;
}

/// Everything a narrative strategy may draw on when writing its prompt.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeContext<'a> {
    pub query: &'a str,
    pub table: &'a Table,
    pub answer: &'a StructuredAnswer,
    pub quantity: AggregatedQuantity,
}

/// A text-generation service that turns a query result into a recommendation.
#[async_trait]
pub trait NarrativeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn credential(&self) -> Credential;

    fn prompt(&self, ctx: &NarrativeContext<'_>) -> String;

    async fn generate(&self, prompt: &str, secret: &str) -> Result<String>;
}

/// Result of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub answer: StructuredAnswer,
    pub quantity: AggregatedQuantity,
    pub narrative: Option<String>,
}

#[derive(Clone)]
pub struct Orchestrator {
    answers: Arc<dyn AnswerService>,
    narrative: Option<Arc<dyn NarrativeStrategy>>,
}

impl Orchestrator {
    pub fn new(
        answers: Arc<dyn AnswerService>,
        narrative: Option<Arc<dyn NarrativeStrategy>>,
    ) -> Self {
        Orchestrator { answers, narrative }
    }

    /// Wire the production clients described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = remote::build_client(config.request_timeout)?;
        let answers = Arc::new(TapasClient::new(client.clone(), config.endpoints.tapas.clone()));
        let narrative: Option<Arc<dyn NarrativeStrategy>> = match config.narrative {
            NarrativeBackend::None => None,
            NarrativeBackend::Completion => Some(Arc::new(CompletionNarrative::new(
                client,
                config.endpoints.completion.clone(),
            ))),
            NarrativeBackend::Gemini => Some(Arc::new(GeminiNarrative::new(
                client,
                config.endpoints.gemini.clone(),
            ))),
        };
        Ok(Self::new(answers, narrative))
    }

    pub fn narrative_name(&self) -> Option<&'static str> {
        self.narrative.as_ref().map(|n| n.name())
    }

    /// Answer `query` against `table`: one structured-answer call, then the
    /// narrative call if a strategy is configured.
    ///
    /// Every precondition, credentials included, is checked before the first
    /// outbound request. `query` is forwarded exactly as given; whitespace only
    /// matters for the blank check.
    #[instrument(level = "info", skip(self, table, credentials), fields(narrative = ?self.narrative_name()))]
    pub async fn answer_query(
        &self,
        table: &Table,
        query: &str,
        credentials: &Credentials,
    ) -> Result<QueryOutcome> {
        if table.is_empty() {
            return Err(Error::EmptyTable);
        }
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        let answer_secret = credentials.require(self.answers.credential())?;
        let narrative = match &self.narrative {
            Some(strategy) => Some((strategy, credentials.require(strategy.credential())?)),
            None => None,
        };

        // 1) structured answer
        let payload = self
            .answers
            .answer(&TableQuery { table, query }, answer_secret)
            .await?;

        // 2) normalize + aggregate
        let answer = normalize(&payload)?;
        let quantity = aggregate(&answer.answer);
        info!(%quantity, aggregator = %answer.aggregator, cells = answer.cells.len(), "aggregated answer");

        // 3) narrative
        let narrative = match narrative {
            None => None,
            Some((strategy, secret)) => {
                let prompt = strategy.prompt(&NarrativeContext {
                    query,
                    table,
                    answer: &answer,
                    quantity,
                });
                let text = strategy.generate(&prompt, secret).await?;
                info!(strategy = strategy.name(), len = text.len(), "narrative generated");
                Some(text)
            }
        };

        Ok(QueryOutcome {
            answer,
            quantity,
            narrative,
        })
    }
}
