//! Extraction error types

use docqa_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported file type: {filename}")]
    UnsupportedFileType { filename: String },

    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Spreadsheet parse error: {spreadsheet}; CSV fallback error: {csv}")]
    Spreadsheet { spreadsheet: String, csv: String },

    #[error("PDF parse error: {0}")]
    Pdf(String),

    #[error("Image text extraction error: {0}")]
    Image(String),
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::UnsupportedFileType { filename } => {
                AppError::UnsupportedFileType { filename }
            }
            other => AppError::Extraction {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_maps_to_client_error() {
        let err: AppError = ExtractionError::UnsupportedFileType {
            filename: "setup.exe".into(),
        }
        .into();
        assert!(matches!(err, AppError::UnsupportedFileType { ref filename } if filename == "setup.exe"));
    }

    #[test]
    fn test_parse_failure_keeps_both_messages() {
        let err: AppError = ExtractionError::Spreadsheet {
            spreadsheet: "not a zip".into(),
            csv: "bad utf-8".into(),
        }
        .into();
        match err {
            AppError::Extraction { message } => {
                assert!(message.contains("not a zip"));
                assert!(message.contains("bad utf-8"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
