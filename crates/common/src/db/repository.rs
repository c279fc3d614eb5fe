//! Repository pattern for database operations
//!
//! Implements [`OrganizationStore`] and [`SnapshotStore`] on PostgreSQL.
//! Upserts and history appends are single statements so concurrent requests
//! for the same organization cannot overwrite each other's exchanges.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use crate::store::{OrganizationStore, SnapshotStore};
use crate::types::{ChatEntry, ExtractionResult, OrganizationRecord, SourceFile};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, Set, Statement,
};
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }
}

#[async_trait]
impl OrganizationStore for Repository {
    async fn put_extraction(
        &self,
        organization_id: &str,
        data: &ExtractionResult,
        source: &SourceFile,
    ) -> Result<OrganizationRecord> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO organizations (
                id, organization_id, extracted_data, chat_history,
                source_filename, source_size_bytes, source_sha256, created_at, updated_at
            )
            VALUES ($1, $2, $3, '[]'::jsonb, $4, $5, $6, NOW(), NOW())
            ON CONFLICT (organization_id) DO UPDATE SET
                extracted_data = EXCLUDED.extracted_data,
                source_filename = EXCLUDED.source_filename,
                source_size_bytes = EXCLUDED.source_size_bytes,
                source_sha256 = EXCLUDED.source_sha256,
                updated_at = NOW()
            RETURNING *
            "#,
            vec![
                Uuid::new_v4().into(),
                organization_id.to_string().into(),
                serde_json::to_value(data)?.into(),
                source.filename.clone().into(),
                (source.size_bytes as i64).into(),
                source.sha256.clone().into(),
            ],
        );

        let model = OrganizationEntity::find()
            .from_raw_sql(stmt)
            .one(self.conn())
            .await?
            .ok_or_else(|| sea_orm::DbErr::RecordNotInserted)?;

        model.into_record()
    }

    async fn get(&self, organization_id: &str) -> Result<Option<OrganizationRecord>> {
        OrganizationEntity::find()
            .filter(OrganizationColumn::OrganizationId.eq(organization_id))
            .one(self.conn())
            .await?
            .map(Organization::into_record)
            .transpose()
    }

    async fn append_exchange(
        &self,
        organization_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<Option<OrganizationRecord>> {
        let entries = serde_json::to_value(ChatEntry::exchange(question, answer))?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            UPDATE organizations
            SET chat_history = chat_history || $2::jsonb,
                updated_at = NOW()
            WHERE organization_id = $1
            RETURNING *
            "#,
            vec![organization_id.to_string().into(), entries.into()],
        );

        OrganizationEntity::find()
            .from_raw_sql(stmt)
            .one(self.conn())
            .await?
            .map(Organization::into_record)
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<OrganizationRecord>> {
        OrganizationEntity::find()
            .order_by_asc(OrganizationColumn::CreatedAt)
            .all(self.conn())
            .await?
            .into_iter()
            .map(Organization::into_record)
            .collect()
    }

    async fn get_by_internal_id(&self, id: Uuid) -> Result<Option<OrganizationRecord>> {
        OrganizationEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .map(Organization::into_record)
            .transpose()
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

#[async_trait]
impl SnapshotStore for Repository {
    async fn latest_snapshot(&self) -> Result<Option<serde_json::Value>> {
        let snapshot = TelemetrySnapshotEntity::find()
            .order_by_desc(TelemetrySnapshotColumn::UpdatedAt)
            .one(self.conn())
            .await?;

        Ok(snapshot.map(|s| s.payload))
    }

    async fn insert_snapshot(&self, snapshot: &serde_json::Value) -> Result<()> {
        let now = chrono::Utc::now();

        let model = TelemetrySnapshotActiveModel {
            id: Set(Uuid::new_v4()),
            payload: Set(snapshot.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        model.insert(self.conn()).await?;
        Ok(())
    }

    async fn replace_snapshot(&self, snapshot: &serde_json::Value) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE telemetry_snapshots SET payload = $1, updated_at = NOW()",
            vec![snapshot.clone().into()],
        );

        self.conn().execute(stmt).await?;
        Ok(())
    }
}
