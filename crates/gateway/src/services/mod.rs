//! Request pipelines
//!
//! Each pipeline owns the collaborators it needs, so handlers stay thin and
//! tests can drive a pipeline against in-memory stores.

pub mod query;
pub mod telemetry;
pub mod upload;

pub use query::{QueryAnswer, QueryPipeline};
pub use telemetry::TelemetryPipeline;
pub use upload::UploadPipeline;
