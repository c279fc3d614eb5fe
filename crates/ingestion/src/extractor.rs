//! Upload extraction entry point

use crate::errors::ExtractionError;
use crate::image::{ImageTextExtractor, NullImageExtractor, TesseractCli};
use crate::kind::FileKind;
use crate::pdf::extract_text_from_pdf;
use crate::spreadsheet::extract_rows;
use crate::staging::StagedFile;
use docqa_common::config::IngestionConfig;
use docqa_common::types::ExtractionResult;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// Turns uploaded bytes into an [`ExtractionResult`], choosing the parser by
/// filename suffix.
#[derive(Clone)]
pub struct Extractor {
    scratch_dir: Option<PathBuf>,
    images: Arc<dyn ImageTextExtractor>,
}

impl Extractor {
    pub fn new(scratch_dir: Option<PathBuf>, images: Arc<dyn ImageTextExtractor>) -> Self {
        Self { scratch_dir, images }
    }

    /// Build from configuration; OCR is enabled only when a command is set
    pub fn from_config(config: &IngestionConfig) -> Result<Self, ExtractionError> {
        let images: Arc<dyn ImageTextExtractor> = match config.ocr_command.as_deref() {
            Some(command) => Arc::new(TesseractCli::new(command)?),
            None => Arc::new(NullImageExtractor),
        };

        Ok(Self::new(config.scratch_dir.clone(), images))
    }

    /// Extract `bytes` uploaded as `filename`.
    ///
    /// Unsupported suffixes are rejected before anything is written. The
    /// staged copy is gone when this returns, whatever the outcome.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn extract(&self, bytes: &[u8], filename: &str) -> Result<ExtractionResult, ExtractionError> {
        let kind = FileKind::detect(filename)?;
        let suffix = FileKind::suffix(filename).unwrap_or_default();

        let staged = StagedFile::write(self.scratch_dir.as_deref(), &suffix, bytes)?;

        let result = match kind {
            FileKind::Spreadsheet => extract_rows(staged.path()).map(ExtractionResult::Tabular),
            FileKind::Pdf => extract_text_from_pdf(staged.path()).map(ExtractionResult::Text),
            FileKind::Image => self.images.extract_text(staged.path()).map(ExtractionResult::Text),
        }?;

        info!(kind = kind.as_str(), result = result.kind(), "Extraction complete");
        Ok(result)
    }

    pub fn image_extractor(&self) -> &str {
        self.images.name()
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(None, Arc::new(NullImageExtractor))
    }
}
