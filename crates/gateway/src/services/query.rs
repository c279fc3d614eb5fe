//! Query pipeline: load, answer, record

use docqa_common::{
    errors::{AppError, Result},
    metrics::record_query,
    types::ChatEntry,
    OrganizationStore, QuestionAnswerer,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Answer plus the organization's full history after recording it
#[derive(Debug, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub chat_history: Vec<ChatEntry>,
}

pub struct QueryPipeline {
    store: Arc<dyn OrganizationStore>,
    answerer: Arc<dyn QuestionAnswerer>,
}

impl QueryPipeline {
    pub fn new(store: Arc<dyn OrganizationStore>, answerer: Arc<dyn QuestionAnswerer>) -> Self {
        Self { store, answerer }
    }

    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn run(&self, organization_id: &str, question: &str) -> Result<QueryAnswer> {
        if question.trim().is_empty() {
            record_query("invalid");
            return Err(AppError::Validation {
                message: "question must not be blank".to_string(),
                field: Some("question".to_string()),
            });
        }

        let record = match self.store.get(organization_id).await? {
            Some(record) => record,
            None => {
                warn!("Query for unknown organization");
                record_query("not_found");
                return Err(AppError::OrganizationNotFound {
                    organization_id: organization_id.to_string(),
                });
            }
        };
        info!(context = record.extracted_data.kind(), "Query context loaded");

        let answer = match self.answerer.ask(question, &record.extracted_data).await {
            Ok(answer) => answer,
            Err(e) => {
                record_query("gateway_error");
                return Err(e);
            }
        };
        info!(provider = self.answerer.name(), "Question answered");

        // deleted out of band since the load
        let updated = self
            .store
            .append_exchange(organization_id, question, &answer)
            .await?
            .ok_or_else(|| AppError::OrganizationNotFound {
                organization_id: organization_id.to_string(),
            })?;
        record_query("answered");
        info!(history_len = updated.chat_history.len(), "Exchange recorded");

        Ok(QueryAnswer {
            answer,
            chat_history: updated.chat_history,
        })
    }
}
