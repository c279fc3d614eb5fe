//! Store abstractions
//!
//! The pipelines only see these traits, so the PostgreSQL [`Repository`]
//! and the [`InMemoryStore`] are interchangeable.
//!
//! [`Repository`]: crate::db::Repository

mod memory;

pub use memory::InMemoryStore;

use crate::errors::Result;
use crate::types::{ExtractionResult, OrganizationRecord, SourceFile};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for organization records.
///
/// `extracted_data` is replaced wholesale by [`put_extraction`] while
/// `chat_history` only ever grows through [`append_exchange`].
///
/// [`put_extraction`]: OrganizationStore::put_extraction
/// [`append_exchange`]: OrganizationStore::append_exchange
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Create the record with an empty history, or replace only its extracted data
    async fn put_extraction(
        &self,
        organization_id: &str,
        data: &ExtractionResult,
        source: &SourceFile,
    ) -> Result<OrganizationRecord>;

    /// Look up a record by organization id
    async fn get(&self, organization_id: &str) -> Result<Option<OrganizationRecord>>;

    /// Append a question entry followed by its answer entry as one write.
    ///
    /// Returns `None` when the organization has no record.
    async fn append_exchange(
        &self,
        organization_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<Option<OrganizationRecord>>;

    /// All records, oldest first
    async fn list_all(&self) -> Result<Vec<OrganizationRecord>>;

    /// Look up a record by its internal id
    async fn get_by_internal_id(&self, id: Uuid) -> Result<Option<OrganizationRecord>>;

    /// Readiness probe
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Persistence for the single browser telemetry snapshot
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The stored snapshot, if any
    async fn latest_snapshot(&self) -> Result<Option<serde_json::Value>>;

    /// Store the first snapshot
    async fn insert_snapshot(&self, snapshot: &serde_json::Value) -> Result<()>;

    /// Overwrite the stored snapshot
    async fn replace_snapshot(&self, snapshot: &serde_json::Value) -> Result<()>;
}
