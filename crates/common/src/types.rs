//! Domain types shared by the pipelines and the stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One spreadsheet row: column name to cell value, in column order
pub type Row = Map<String, Value>;

/// Content extracted from a single upload.
///
/// Serialized untagged so the stored and returned JSON is either an array of
/// row objects or a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    Tabular(Vec<Row>),
    Text(String),
}

impl ExtractionResult {
    /// Serialized form handed to the inference endpoint as context
    pub fn to_context(&self) -> String {
        match self {
            ExtractionResult::Text(text) => text.clone(),
            ExtractionResult::Tabular(rows) => {
                serde_json::to_string(rows).unwrap_or_default()
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionResult::Tabular(_) => "tabular",
            ExtractionResult::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Question,
    Answer,
}

/// A single chat history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(rename = "type")]
    pub role: ChatRole,
    pub text: String,
}

impl ChatEntry {
    pub fn question(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Question, text: text.into() }
    }

    pub fn answer(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Answer, text: text.into() }
    }

    /// The two entries recorded for one question/answer exchange, in order
    pub fn exchange(question: &str, answer: &str) -> [ChatEntry; 2] {
        [Self::question(question), Self::answer(answer)]
    }
}

/// Provenance of the upload that produced the current extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: String,
}

impl SourceFile {
    pub fn describe(filename: &str, bytes: &[u8]) -> Self {
        Self {
            filename: filename.to_string(),
            size_bytes: bytes.len() as u64,
            sha256: hex::encode(Sha256::digest(bytes)),
        }
    }
}

/// Everything stored for one organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// Internal identifier assigned by the store
    pub id: Uuid,
    pub organization_id: String,
    pub extracted_data: ExtractionResult,
    pub chat_history: Vec<ChatEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
