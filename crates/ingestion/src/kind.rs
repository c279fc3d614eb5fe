//! File kind detection by filename suffix

use crate::errors::ExtractionError;
use std::path::Path;

/// Extraction strategy selected for an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Spreadsheet,
    Pdf,
    Image,
}

impl FileKind {
    /// Pick the strategy for `filename`.
    ///
    /// Only the suffix counts, compared case-insensitively; the declared
    /// content type is never consulted.
    pub fn detect(filename: &str) -> Result<Self, ExtractionError> {
        let suffix = Self::suffix(filename).unwrap_or_default();

        match suffix.as_str() {
            "xlsx" | "xls" => Ok(FileKind::Spreadsheet),
            "pdf" => Ok(FileKind::Pdf),
            "png" | "jpg" | "jpeg" | "gif" => Ok(FileKind::Image),
            _ => Err(ExtractionError::UnsupportedFileType {
                filename: filename.to_string(),
            }),
        }
    }

    /// Lowercased suffix without the dot
    pub fn suffix(filename: &str) -> Option<String> {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Pdf => "pdf",
            FileKind::Image => "image",
        }
    }
}
