//! Upload pipeline: validate, extract, persist

use docqa_common::{
    errors::{AppError, Result},
    metrics::{record_extraction, record_upload},
    types::{ExtractionResult, SourceFile},
    OrganizationStore,
};
use docqa_ingestion::{Extractor, FileKind};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub struct UploadPipeline {
    store: Arc<dyn OrganizationStore>,
    extractor: Arc<Extractor>,
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn OrganizationStore>, extractor: Arc<Extractor>) -> Self {
        Self { store, extractor }
    }

    /// Extract `bytes` and store the result as the organization's data.
    ///
    /// Nothing is written unless extraction succeeds.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn run(
        &self,
        organization_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractionResult> {
        let kind = match FileKind::detect(filename) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(filename, "Rejected upload with unsupported file type");
                record_upload("unsupported", "rejected");
                return Err(e.into());
            }
        };
        info!(kind = kind.as_str(), "Upload validated");

        let source = SourceFile::describe(filename, &bytes);
        let extractor = self.extractor.clone();
        let name = filename.to_string();
        let start = Instant::now();

        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes, &name))
            .await
            .map_err(|e| AppError::Internal {
                message: format!("Extraction task failed: {}", e),
            })?;
        record_extraction(start.elapsed().as_secs_f64(), kind.as_str());

        let data = match extracted {
            Ok(data) => data,
            Err(e) => {
                record_upload(kind.as_str(), "failed");
                return Err(e.into());
            }
        };
        info!(result = data.kind(), "Upload extracted");

        let record = self.store.put_extraction(organization_id, &data, &source).await?;
        record_upload(kind.as_str(), "stored");
        info!(
            record_id = %record.id,
            sha256 = %source.sha256,
            history_len = record.chat_history.len(),
            "Upload persisted"
        );

        Ok(record.extracted_data)
    }
}
