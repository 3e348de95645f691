//! Canonical per-stage digests
//!
//! Each digest is SHA-256 over the compact JSON rendering of an object
//! holding exactly the stage's fields. Object keys are emitted sorted, so
//! the serialization does not depend on construction order.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tresor_core::{AggregationStatus, CorePayload, DomainFields};

fn digest_object(fields: Map<String, Value>) -> String {
    let canonical = Value::Object(fields).to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn opt(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::String(v.to_string()))
}

/// Digest of the domain fields. Amounts are scale-normalized first.
pub fn core_digest(payload: &CorePayload) -> String {
    let mut fields = Map::new();
    fields.insert("kind".to_string(), Value::String(payload.kind().as_str().to_string()));
    for (name, value) in payload.canonical_fields() {
        fields.insert(name.to_string(), Value::String(value));
    }
    digest_object(fields)
}

/// Digest of the Regional Treasurer decision
pub fn tr_digest(status: Option<AggregationStatus>, aggregated_by: Option<&str>) -> String {
    let mut fields = Map::new();
    fields.insert("aggregation_status".to_string(), opt(status.map(|s| s.as_str())));
    fields.insert("aggregated_by".to_string(), opt(aggregated_by));
    digest_object(fields)
}

/// Digest of the Principal Accountant decision
pub fn cpe_digest(status: Option<AggregationStatus>, cpe_validated_by: Option<&str>) -> String {
    let mut fields = Map::new();
    fields.insert("aggregation_status".to_string(), opt(status.map(|s| s.as_str())));
    fields.insert("cpe_validated_by".to_string(), opt(cpe_validated_by));
    digest_object(fields)
}
