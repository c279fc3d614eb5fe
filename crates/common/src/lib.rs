//! DocQA Common Library
//!
//! Shared code for the DocQA services including:
//! - Domain types for organization records and extraction results
//! - Store traits with PostgreSQL and in-memory implementations
//! - Inference (question answering) client abstraction
//! - Browser telemetry snapshot building
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod inference;
pub mod metrics;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::Repository;
pub use inference::QuestionAnswerer;
pub use store::{InMemoryStore, OrganizationStore, SnapshotStore};
pub use types::{ChatEntry, ChatRole, ExtractionResult, OrganizationRecord, SourceFile};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Answer recorded when the inference endpoint returns no answer field
pub const SENTINEL_ANSWER: &str = "No answer found";
