//! API handlers module

pub mod health;
pub mod metrics;
pub mod organizations;
pub mod query;
pub mod telemetry;
pub mod upload;
