//! Type coercion between BSON containers, host types and JSON.

use bson::{Bson, Document};
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

/// Copy a document into a plain ordered map, recursing into nested
/// documents and arrays.
pub fn document_to_map(doc: &Document) -> IndexMap<String, Bson> {
    doc.iter()
        .map(|(key, value)| (key.clone(), plain(value)))
        .collect()
}

/// Build a document from a plain ordered map.
pub fn map_to_document(map: IndexMap<String, Bson>) -> Document {
    map.into_iter().collect()
}

/// Copy an array into a plain vector, recursing into nested containers.
pub fn array_to_vec(values: &[Bson]) -> Vec<Bson> {
    values.iter().map(plain).collect()
}

fn plain(value: &Bson) -> Bson {
    match value {
        Bson::Document(doc) => Bson::Document(map_to_document(document_to_map(doc))),
        Bson::Array(values) => Bson::Array(array_to_vec(values)),
        other => other.clone(),
    }
}

/// Convert a host datetime to the wire datetime.
pub fn datetime_to_bson(dt: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(dt))
}

/// Convert a wire value to a host datetime.
///
/// Accepts native datetimes, timestamps, epoch milliseconds and RFC 3339
/// strings; anything else yields `None`.
pub fn bson_to_datetime(value: &Bson) -> Option<DateTime<Utc>> {
    match value {
        Bson::DateTime(dt) => Some(dt.to_chrono()),
        Bson::Timestamp(ts) => Utc.timestamp_opt(i64::from(ts.time), 0).single(),
        Bson::Int64(ms) => Utc.timestamp_millis_opt(*ms).single(),
        Bson::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

/// Project a BSON value into JSON that any JSON consumer can read.
///
/// Identifiers become their hex string, datetimes become string encoded
/// epoch milliseconds, containers are walked recursively. Remaining BSON
/// specific types fall back to relaxed extended JSON.
pub fn to_json_safe(value: &Bson) -> JsonValue {
    match value {
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        Bson::DateTime(dt) => JsonValue::String(dt.timestamp_millis().to_string()),
        Bson::Document(doc) => JsonValue::Object(document_to_json(doc)),
        Bson::Array(values) => JsonValue::Array(values.iter().map(to_json_safe).collect()),
        Bson::Null | Bson::Undefined => JsonValue::Null,
        Bson::Boolean(b) => JsonValue::Bool(*b),
        Bson::String(s) => JsonValue::String(s.clone()),
        Bson::Int32(i) => JsonValue::from(*i),
        Bson::Int64(i) => JsonValue::from(*i),
        Bson::Double(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        other => other.clone().into_relaxed_extjson(),
    }
}

/// Project a whole document, see [`to_json_safe`].
pub fn document_to_json(doc: &Document) -> Map<String, JsonValue> {
    doc.iter()
        .map(|(key, value)| (key.clone(), to_json_safe(value)))
        .collect()
}

/// Read a numeric BSON value as `f64`.
pub fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        _ => None,
    }
}
