//! In-memory store for tests and single-process deployments.
//!
//! Records live in a `HashMap` behind a `RwLock`; every mutation happens
//! under the write lock, so history appends never lose an exchange.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::types::{ChatEntry, ExtractionResult, OrganizationRecord, SourceFile};

use super::{OrganizationStore, SnapshotStore};

pub struct InMemoryStore {
    records: RwLock<HashMap<String, OrganizationRecord>>,
    snapshot: RwLock<Option<serde_json::Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            snapshot: RwLock::new(None),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> AppError {
    AppError::Internal {
        message: "in-memory store lock poisoned".to_string(),
    }
}

#[async_trait]
impl OrganizationStore for InMemoryStore {
    async fn put_extraction(
        &self,
        organization_id: &str,
        data: &ExtractionResult,
        source: &SourceFile,
    ) -> Result<OrganizationRecord> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let now = Utc::now();
        let record = records
            .entry(organization_id.to_string())
            .and_modify(|existing| {
                existing.extracted_data = data.clone();
                existing.source = Some(source.clone());
                existing.updated_at = now;
            })
            .or_insert_with(|| OrganizationRecord {
                id: Uuid::new_v4(),
                organization_id: organization_id.to_string(),
                extracted_data: data.clone(),
                chat_history: Vec::new(),
                source: Some(source.clone()),
                created_at: now,
                updated_at: now,
            });
        Ok(record.clone())
    }

    async fn get(&self, organization_id: &str) -> Result<Option<OrganizationRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(organization_id).cloned())
    }

    async fn append_exchange(
        &self,
        organization_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<Option<OrganizationRecord>> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let Some(record) = records.get_mut(organization_id) else {
            return Ok(None);
        };
        record.chat_history.extend(ChatEntry::exchange(question, answer));
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn list_all(&self) -> Result<Vec<OrganizationRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by_key(|r| r.created_at);
        Ok(all)
    }

    async fn get_by_internal_id(&self, id: Uuid) -> Result<Option<OrganizationRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.values().find(|r| r.id == id).cloned())
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn latest_snapshot(&self) -> Result<Option<serde_json::Value>> {
        let snapshot = self.snapshot.read().map_err(|_| poisoned())?;
        Ok(snapshot.clone())
    }

    async fn insert_snapshot(&self, value: &serde_json::Value) -> Result<()> {
        let mut snapshot = self.snapshot.write().map_err(|_| poisoned())?;
        *snapshot = Some(value.clone());
        Ok(())
    }

    async fn replace_snapshot(&self, value: &serde_json::Value) -> Result<()> {
        self.insert_snapshot(value).await
    }
}
