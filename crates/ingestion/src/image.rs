//! Image text extraction
//!
//! OCR is pluggable. The default extractor yields no text; [`TesseractCli`]
//! shells out to an installed OCR binary.

use crate::errors::ExtractionError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Pulls text out of a staged image file
pub trait ImageTextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;

    fn name(&self) -> &str;
}

/// Extractor for deployments without OCR; every image yields empty text
#[derive(Debug, Default, Clone)]
pub struct NullImageExtractor;

impl ImageTextExtractor for NullImageExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        debug!(path = %path.display(), "No OCR configured, image yields empty text");
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Runs `<command> [args..] <image> stdout` and reads the recognized text
/// from standard output.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
    args: Vec<String>,
}

impl TesseractCli {
    /// Build from a command line such as `tesseract -l eng`
    pub fn new(command: &str) -> Result<Self, ExtractionError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ExtractionError::Image("OCR command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl ImageTextExtractor for TesseractCli {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .arg("stdout")
            .output()
            .map_err(|e| ExtractionError::Image(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(ExtractionError::Image(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
