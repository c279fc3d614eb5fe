//! Telemetry pipeline: build the snapshot and keep only the latest one

use docqa_common::{
    errors::Result,
    metrics::record_telemetry,
    telemetry::{build_snapshot, classify, SnapshotOutcome, TelemetryPayload},
    SnapshotStore,
};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct TelemetryPipeline {
    snapshots: Arc<dyn SnapshotStore>,
}

impl TelemetryPipeline {
    pub fn new(snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { snapshots }
    }

    #[instrument(skip_all, fields(url = %payload.current_url))]
    pub async fn ingest(&self, payload: &TelemetryPayload) -> Result<SnapshotOutcome> {
        let snapshot = build_snapshot(payload);
        let existing = self.snapshots.latest_snapshot().await?;

        let outcome = classify(existing.as_ref(), &snapshot);
        match outcome {
            SnapshotOutcome::Stored => self.snapshots.insert_snapshot(&snapshot).await?,
            SnapshotOutcome::Updated => self.snapshots.replace_snapshot(&snapshot).await?,
            SnapshotOutcome::Unchanged => {}
        }

        record_telemetry(outcome.as_label());
        info!(outcome = outcome.as_label(), "Telemetry snapshot processed");
        Ok(outcome)
    }
}
