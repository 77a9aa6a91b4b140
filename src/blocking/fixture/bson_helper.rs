//! Conversion between fixture json and bson documents.
//!
//! Fixtures carry identifiers as 24 character hex strings, the database stores them as
//! [ObjectId]. [normalize_ids] promotes the strings on identifier keys, [bson_to_json]
//! turns every ObjectId back into its hex form for exports.

use crate::ID_KEY;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use serde_json::{Map, Number, Value};

/// Keys holding a reference even though they don't end with `Id`.
pub const REFERENCE_KEYS: [&str; 9] = [
    "user",
    "author",
    "creator",
    "createdBy",
    "reviewedBy",
    "institution",
    "knowledgeBase",
    "knowledgePoint",
    "learningPath",
];

/// Does `key` name an identifier field?
///
/// # Example
/// ```
/// use mongo_fixture::blocking::fixture::bson_helper::is_id_key;
/// assert!(is_id_key("_id"));
/// assert!(is_id_key("teacherId"));
/// assert!(is_id_key("author"));
/// assert!(is_id_key("questionIds"));
/// assert!(!is_id_key("title"));
/// ```
pub fn is_id_key(key: &str) -> bool {
    key == ID_KEY || key.ends_with("Id") || key.ends_with("Ids") || REFERENCE_KEYS.contains(&key)
}

/// exactly 24 ascii hex digits.
pub fn looks_like_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Convert a parsed json value into bson, without touching identifiers.
///
/// Integers which fit in i32 become `Int32`, other integers `Int64`, everything else
/// numeric becomes `Double`.
pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => number_to_bson(&n),
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(k, v)| (k, json_to_bson(v)))
                .collect(),
        ),
    }
}

fn number_to_bson(n: &Number) -> Bson {
    match n.as_i64() {
        Some(i) => match i32::try_from(i) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(i),
        },
        // u64 above i64::MAX or a float.
        None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
    }
}

/// Promote identifier strings in `value` to [ObjectId].
///
/// A string is promoted when it is exactly 24 hex digits and sits under an identifier
/// key (see [is_id_key]), either directly or as an element of an array under that key.
/// Anything else passes through, and a string the parser rejects is kept as is.
/// Existing ObjectIds are left alone, so normalizing twice equals normalizing once.
pub fn normalize_ids(value: Bson) -> Bson {
    match value {
        Bson::Document(doc) => Bson::Document(normalize_document(doc)),
        Bson::Array(items) => Bson::Array(items.into_iter().map(normalize_ids).collect()),
        other => other,
    }
}

/// [normalize_ids] for a top level document.
pub fn normalize_document(doc: Document) -> Document {
    doc.into_iter()
        .map(|(key, value)| {
            let value = if is_id_key(&key) {
                promote(value)
            } else {
                normalize_ids(value)
            };
            (key, value)
        })
        .collect()
}

fn promote(value: Bson) -> Bson {
    match value {
        Bson::String(s) => to_object_id(s),
        Bson::Array(items) => Bson::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Bson::String(s) => to_object_id(s),
                    other => normalize_ids(other),
                })
                .collect(),
        ),
        other => normalize_ids(other),
    }
}

fn to_object_id(s: String) -> Bson {
    if !looks_like_object_id(&s) {
        return Bson::String(s);
    }
    match ObjectId::parse_str(&s) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(s),
    }
}

/// Convert a stored bson value into plain json for exports.
///
/// ObjectIds become hex strings and datetimes RFC 3339 strings; types json can't carry
/// natively fall back to relaxed extended json.
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(doc) => Value::Object(document_to_json(doc)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Double(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().to_rfc3339()),
        other => other.into_relaxed_extjson(),
    }
}

/// [bson_to_json] for a whole document.
pub fn document_to_json(doc: Document) -> Map<String, Value> {
    doc.into_iter()
        .map(|(k, v)| (k, bson_to_json(v)))
        .collect()
}
