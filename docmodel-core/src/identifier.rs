//! Object identifier normalization.
//!
//! Identifiers reach the mapping layer in several shapes: a 24 character hex
//! string, a native [`ObjectId`], or a wrapped document such as
//! `{ "$oid": "<hex>" }` (extended JSON) or `{ "oid": "<hex>" }`. Every
//! helper here maps all of them onto [`ObjectId`] and treats anything else
//! as absent rather than as an error.
//!
//! ```rust
//! use bson::doc;
//! use docmodel_core::identifier::{deduplicate, to_object_id};
//!
//! let hex = "65f1c0ffee0000000000beef";
//! let oid = to_object_id(hex).unwrap();
//! assert_eq!(to_object_id(doc! { "$oid": hex }), Some(oid));
//! assert_eq!(to_object_id("not an id"), None);
//!
//! let ids = deduplicate(vec![hex, "garbage", hex]);
//! assert_eq!(ids, vec![oid]);
//! ```

use bson::{Bson, oid::ObjectId};
use indexmap::IndexSet;

use crate::error::{ModelError, ModelResult};

/// Keys recognized on wrapped identifier documents.
pub const WRAPPED_KEYS: [&str; 2] = ["$oid", "oid"];

/// Normalize a value to an [`ObjectId`].
///
/// Returns `None` for any shape that is not a recognized identifier.
pub fn to_object_id(value: impl Into<Bson>) -> Option<ObjectId> {
    normalize(&value.into())
}

/// Borrowing variant of [`to_object_id`].
pub fn normalize(value: &Bson) -> Option<ObjectId> {
    match value {
        Bson::ObjectId(oid) => Some(*oid),
        Bson::String(s) => parse_hex(s),
        Bson::Document(doc) => WRAPPED_KEYS
            .iter()
            .find_map(|key| doc.get_str(key).ok())
            .and_then(parse_hex),
        _ => None,
    }
}

/// Normalize a value, failing when it is not an identifier.
pub fn require_object_id(value: impl Into<Bson>) -> ModelResult<ObjectId> {
    let value = value.into();
    normalize(&value).ok_or_else(|| ModelError::invalid_object_id(value.to_string()))
}

/// Normalize every element, drop unparseable ones and remove duplicates.
///
/// Duplicates are detected by hex form and the first occurrence wins, so the
/// output keeps the caller's ordering.
pub fn deduplicate<I, V>(ids: I) -> Vec<ObjectId>
where
    I: IntoIterator<Item = V>,
    V: Into<Bson>,
{
    let mut seen: IndexSet<String> = IndexSet::new();
    let mut out = Vec::new();
    for oid in ids.into_iter().filter_map(to_object_id) {
        if seen.insert(oid.to_hex()) {
            out.push(oid);
        }
    }
    out
}

fn parse_hex(s: &str) -> Option<ObjectId> {
    if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    ObjectId::parse_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;

    const HEX: &str = "65f1c0ffee0000000000beef";

    #[test]
    fn test_hex_string() {
        let oid = to_object_id(HEX).unwrap();
        assert_eq!(oid.to_hex(), HEX);
    }

    #[test]
    fn test_uppercase_hex_string() {
        let oid = to_object_id(HEX.to_uppercase()).unwrap();
        assert_eq!(oid.to_hex(), HEX);
    }

    #[test]
    fn test_native_object_id() {
        let oid = ObjectId::new();
        assert_eq!(to_object_id(oid), Some(oid));
    }

    #[test]
    fn test_wrapped_forms() {
        let expected = to_object_id(HEX);
        assert_eq!(to_object_id(doc! { "$oid": HEX }), expected);
        assert_eq!(to_object_id(doc! { "oid": HEX }), expected);
        assert_eq!(to_object_id(doc! { "id": HEX }), None);
        assert_eq!(to_object_id(doc! { "$oid": "short" }), None);
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(to_object_id("abc"), None);
        assert_eq!(to_object_id("zzzzzzzzzzzzzzzzzzzzzzzz"), None);
        assert_eq!(to_object_id(42), None);
        assert_eq!(to_object_id(Bson::Null), None);
    }

    #[test]
    fn test_idempotent() {
        let inputs: Vec<Bson> = vec![
            Bson::String(HEX.into()),
            Bson::ObjectId(ObjectId::new()),
            Bson::Document(doc! { "$oid": HEX }),
            Bson::Document(doc! { "oid": HEX }),
        ];
        for input in inputs {
            let once = normalize(&input).unwrap();
            assert_eq!(to_object_id(once), Some(once));
        }
    }

    #[test]
    fn test_require_object_id() {
        assert!(require_object_id(HEX).is_ok());
        let err = require_object_id("nope").unwrap_err();
        assert!(matches!(err, ModelError::InvalidObjectId(_)));
    }

    #[test]
    fn test_deduplicate_preserves_first_seen_order() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let input: Vec<Bson> = vec![
            Bson::ObjectId(b),
            Bson::String(a.to_hex()),
            Bson::String("bogus".into()),
            Bson::Document(doc! { "$oid": b.to_hex() }),
            Bson::ObjectId(a),
        ];
        assert_eq!(deduplicate(input), vec![b, a]);
    }

    #[test]
    fn test_deduplicate_empty() {
        let empty: Vec<Bson> = Vec::new();
        assert!(deduplicate(empty).is_empty());
    }
}
