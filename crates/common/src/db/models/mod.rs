//! SeaORM entity models
//!
//! Database entities for DocQA

mod organization;
mod telemetry_snapshot;

pub use organization::{
    Entity as OrganizationEntity,
    Model as Organization,
    ActiveModel as OrganizationActiveModel,
    Column as OrganizationColumn,
};

pub use telemetry_snapshot::{
    Entity as TelemetrySnapshotEntity,
    Model as TelemetrySnapshot,
    ActiveModel as TelemetrySnapshotActiveModel,
    Column as TelemetrySnapshotColumn,
};
