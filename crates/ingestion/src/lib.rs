//! DocQA Ingestion
//!
//! Converts uploaded files into extraction results:
//! - `.xlsx` / `.xls` into header-keyed rows (with a CSV fallback)
//! - `.pdf` into page-ordered text
//! - `.png` / `.jpg` / `.jpeg` / `.gif` through a pluggable OCR step
//!
//! Uploads are staged in a scratch file that is removed when extraction ends.

pub mod cmap;
pub mod errors;
pub mod extractor;
pub mod image;
pub mod kind;
pub mod pdf;
pub mod spreadsheet;
pub mod staging;

pub use errors::ExtractionError;
pub use extractor::Extractor;
pub use image::{ImageTextExtractor, NullImageExtractor, TesseractCli};
pub use kind::FileKind;
