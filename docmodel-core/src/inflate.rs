//! Inflation of raw documents into model state and back.
//!
//! Inflation runs in two passes. The first copies every wire key into the
//! attribute store under its attribute name, routing unmapped keys to the
//! side-bag. The second walks the schema's nested attributes and replaces raw
//! sub-documents with inflated sub-models, depth first.

use bson::{Bson, Document, doc};
use tracing::{trace, warn};

use crate::identifier;
use crate::model::{ModelState, Value};
use crate::schema::{NestedField, Schema};

/// Deepest nesting the engine will inflate; matches the BSON nesting limit.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Build the state for `schema` from a raw document.
///
/// With `identity` set, an `_id` holding an identifier becomes the state's
/// identifier. Any other `_id` is kept in the unmapped side-bag.
pub fn inflate_state(schema: &Schema, doc: Document, depth: usize, identity: bool) -> ModelState {
    let mut state = ModelState::new();

    for (wire, raw) in doc {
        if identity && wire == "_id" {
            match identifier::normalize(&raw) {
                Some(id) => state.load_id(id),
                None => {
                    state.unmapped_mut().insert(wire, raw);
                }
            }
            continue;
        }

        match schema.attribute_for(&wire) {
            Some(attribute) => {
                let attribute = attribute.to_string();
                state.load(attribute, Value::Bson(raw));
            }
            None => {
                state.unmapped_mut().insert(wire, raw);
            }
        }
    }

    for field in schema.nested() {
        let Some(slot) = state.value_mut(field.attribute()) else {
            continue;
        };
        let current = std::mem::replace(slot, Value::Bson(Bson::Null));
        *slot = inflate_nested(schema, field, current, depth);
    }

    trace!(model = %schema.name(), depth, "Inflated document");
    state
}

fn inflate_nested(schema: &Schema, field: &NestedField, value: Value, depth: usize) -> Value {
    let Value::Bson(raw) = value else {
        return value;
    };

    if depth >= MAX_NESTING_DEPTH {
        warn!(
            model = %schema.name(),
            attribute = %field.attribute(),
            depth,
            "Nesting limit reached, leaving value raw"
        );
        return Value::Bson(raw);
    }

    let target = field.target();
    match (field.is_repeated(), raw) {
        (false, Bson::Document(sub)) => Value::Embedded(target.inflate(sub, depth + 1)),
        (true, Bson::Array(items)) => Value::List(
            items
                .into_iter()
                .map(|item| match item {
                    Bson::Document(sub) => Value::Embedded(target.inflate(sub, depth + 1)),
                    other => Value::Bson(other),
                })
                .collect(),
        ),
        (_, other) => Value::Bson(other),
    }
}

/// Dehydrate a state to its wire document.
///
/// The identifier comes first, then attributes under their wire names, then
/// any unmapped keys not shadowed by an attribute.
pub fn dehydrate(schema: &Schema, state: &ModelState) -> Document {
    let mut doc = Document::new();
    if let Some(id) = state.id() {
        doc.insert("_id", id);
    }
    for (attribute, value) in state.values() {
        doc.insert(schema.wire_for(attribute), value.to_bson());
    }
    for (wire, raw) in state.unmapped() {
        if !doc.contains_key(wire) {
            doc.insert(wire.clone(), raw.clone());
        }
    }
    doc
}

/// Build the partial update for a state's dirty attributes.
///
/// Present attributes go to `$set`, removed ones to `$unset`. Returns `None`
/// when nothing is dirty.
pub fn dirty_update(schema: &Schema, state: &ModelState) -> Option<Document> {
    if state.dirty().is_empty() {
        return None;
    }

    let mut set = Document::new();
    let mut unset = Document::new();
    for attribute in state.dirty().iter() {
        let wire = schema.wire_for(attribute);
        match state.get(attribute) {
            Some(value) => {
                set.insert(wire, value.to_bson());
            }
            None => {
                unset.insert(wire, "");
            }
        }
    }

    let mut update = doc! {};
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    Some(update)
}
