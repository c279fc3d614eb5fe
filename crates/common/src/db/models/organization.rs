//! Organization entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::Result as AppResult;
use crate::types::{OrganizationRecord, SourceFile};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// External organization identifier supplied by clients
    #[sea_orm(column_type = "Text", unique)]
    pub organization_id: String,

    /// Latest extraction, either an array of rows or a string
    #[sea_orm(column_type = "JsonBinary")]
    pub extracted_data: serde_json::Value,

    /// Append-only array of `{type, text}` entries
    #[sea_orm(column_type = "JsonBinary")]
    pub chat_history: serde_json::Value,

    #[sea_orm(column_type = "Text", nullable)]
    pub source_filename: Option<String>,

    pub source_size_bytes: Option<i64>,

    #[sea_orm(column_type = "Text", nullable)]
    pub source_sha256: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Decode the JSONB columns into the domain record
    pub fn into_record(self) -> AppResult<OrganizationRecord> {
        let source = match (self.source_filename, self.source_sha256) {
            (Some(filename), Some(sha256)) => Some(SourceFile {
                filename,
                size_bytes: self.source_size_bytes.unwrap_or_default().max(0) as u64,
                sha256,
            }),
            _ => None,
        };

        Ok(OrganizationRecord {
            id: self.id,
            organization_id: self.organization_id,
            extracted_data: serde_json::from_value(self.extracted_data)?,
            chat_history: serde_json::from_value(self.chat_history)?,
            source,
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
