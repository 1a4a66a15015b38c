//! Document and sub-document models.
//!
//! Models are thin typed wrappers over a [`ModelState`]: an ordered store of
//! attribute values, the identifier of root documents, a side-bag of unmapped
//! wire keys and the [`DirtyFields`] set. The [`SubModel`] trait supplies the
//! generic accessors; typed getters and setters are written on top of them.
//!
//! ```rust,ignore
//! use std::sync::OnceLock;
//! use docmodel_core::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! pub struct Address(ModelState);
//!
//! impl SubModel for Address {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| Schema::builder("Address").alias("c", "city").build())
//!     }
//!     fn from_state(state: ModelState) -> Self { Self(state) }
//!     fn state(&self) -> &ModelState { &self.0 }
//!     fn state_mut(&mut self) -> &mut ModelState { &mut self.0 }
//! }
//!
//! impl Address {
//!     pub fn city(&self) -> Option<&str> { self.get_str("city") }
//!     pub fn set_city(&mut self, city: &str) { self.set("city", city) }
//! }
//! ```

use std::any::Any;
use std::fmt;

use bson::{Bson, Document, oid::ObjectId};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::coerce;
use crate::dirty::DirtyFields;
use crate::error::{ModelError, ModelResult};
use crate::inflate;
use crate::schema::Schema;

/// Connection id used when a model does not name one.
pub const DEFAULT_CONNECTION: &str = "default";

/// An attribute value held by a model.
#[derive(Debug)]
pub enum Value {
    /// A plain BSON value, including raw nested documents.
    Bson(Bson),
    /// An inflated sub-model.
    Embedded(Box<dyn Embedded>),
    /// A repeated nested attribute. Elements that were not documents are
    /// kept as [`Value::Bson`].
    List(Vec<Value>),
}

impl Value {
    /// The plain BSON value, if this is not a sub-model.
    pub fn as_bson(&self) -> Option<&Bson> {
        match self {
            Self::Bson(b) => Some(b),
            _ => None,
        }
    }

    /// Downcast to a sub-model of type `T`.
    pub fn as_embedded<T: SubModel>(&self) -> Option<&T> {
        match self {
            Self::Embedded(e) => e.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Whether this is BSON null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Bson(Bson::Null))
    }

    /// Convert to the wire representation.
    pub fn to_bson(&self) -> Bson {
        match self {
            Self::Bson(b) => b.clone(),
            Self::Embedded(e) => Bson::Document(e.embedded_document()),
            Self::List(values) => Bson::Array(values.iter().map(Value::to_bson).collect()),
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Self::Bson(b) => Self::Bson(b.clone()),
            Self::Embedded(e) => Self::Embedded(e.clone_embedded()),
            Self::List(values) => Self::List(values.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bson(a), Self::Bson(b)) => a == b,
            (Self::Embedded(a), Self::Embedded(b)) => a.eq_embedded(b.as_ref()),
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Bson> for Value {
    fn from(value: Bson) -> Self {
        Self::Bson(value)
    }
}

/// Storage shared by every model type.
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    id: Option<ObjectId>,
    values: IndexMap<String, Value>,
    unmapped: Document,
    dirty: DirtyFields,
}

impl ModelState {
    /// An empty state with no identifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier, once persisted or loaded.
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Assign the identifier. An identifier is assigned once and never
    /// replaced.
    pub fn assign_id(&mut self, id: ObjectId) -> ModelResult<()> {
        match self.id {
            Some(existing) => Err(ModelError::IdentifierAssigned(existing.to_hex())),
            None => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    /// Get an attribute value.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Whether the attribute is present.
    pub fn contains(&self, attribute: &str) -> bool {
        self.values.contains_key(attribute)
    }

    /// Set an attribute and mark it dirty.
    pub fn put(&mut self, attribute: impl Into<String>, value: Value) {
        let attribute = attribute.into();
        self.dirty.mark(attribute.clone());
        self.values.insert(attribute, value);
    }

    /// Remove an attribute and mark it dirty.
    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.dirty.mark(attribute);
        self.values.shift_remove(attribute)
    }

    /// Set an attribute without marking it dirty, as done while loading.
    pub(crate) fn load(&mut self, attribute: impl Into<String>, value: Value) {
        self.values.insert(attribute.into(), value);
    }

    pub(crate) fn load_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    pub(crate) fn value_mut(&mut self, attribute: &str) -> Option<&mut Value> {
        self.values.get_mut(attribute)
    }

    pub(crate) fn unmapped_mut(&mut self) -> &mut Document {
        &mut self.unmapped
    }

    /// Attribute values in load/insertion order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Wire keys the schema did not map, kept for round-tripping.
    pub fn unmapped(&self) -> &Document {
        &self.unmapped
    }

    /// Mutated attributes.
    pub fn dirty(&self) -> &DirtyFields {
        &self.dirty
    }

    /// Record a mutation.
    pub fn mark_dirty(&mut self, attribute: impl Into<String>) {
        self.dirty.mark(attribute);
    }

    /// Forget recorded mutations.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}

/// Two states are equal when their data is equal; dirtiness is ignored.
impl PartialEq for ModelState {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.unmapped == other.unmapped
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

/// Object-safe view over any [`SubModel`], used for nested attributes.
pub trait Embedded: Any + Send + Sync + fmt::Debug {
    /// The underlying state.
    fn model_state(&self) -> &ModelState;

    /// The schema of the concrete type.
    fn model_schema(&self) -> &'static Schema;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Clone behind the box.
    fn clone_embedded(&self) -> Box<dyn Embedded>;

    /// Structural equality across the erased type.
    fn eq_embedded(&self, other: &dyn Embedded) -> bool;

    /// Dehydrate to a wire document.
    fn embedded_document(&self) -> Document {
        inflate::dehydrate(self.model_schema(), self.model_state())
    }
}

impl<T: SubModel> Embedded for T {
    fn model_state(&self) -> &ModelState {
        self.state()
    }

    fn model_schema(&self) -> &'static Schema {
        T::schema()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_embedded(&self) -> Box<dyn Embedded> {
        Box::new(self.clone())
    }

    fn eq_embedded(&self, other: &dyn Embedded) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// An embedded model: no identity, owned by its enclosing model.
pub trait SubModel: Sized + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Shape descriptor for this type.
    fn schema() -> &'static Schema;

    /// Wrap a state.
    fn from_state(state: ModelState) -> Self;

    /// Borrow the state.
    fn state(&self) -> &ModelState;

    /// Mutably borrow the state.
    fn state_mut(&mut self) -> &mut ModelState;

    /// An empty model.
    fn new() -> Self {
        Self::from_state(ModelState::new())
    }

    /// Inflate a raw document into this type, recursing into nested
    /// attributes.
    fn inflate(doc: Document) -> Self {
        Self::from_state(inflate::inflate_state(Self::schema(), doc, 0, false))
    }

    /// Dehydrate to a wire document.
    fn to_document(&self) -> Document {
        inflate::dehydrate(Self::schema(), self.state())
    }

    /// JSON-safe projection of the wire document.
    fn to_json(&self) -> serde_json::Value {
        coerce::to_json_safe(&Bson::Document(self.to_document()))
    }

    /// Raw value of a plain attribute.
    fn get(&self, attribute: &str) -> Option<&Bson> {
        self.state().get(attribute).and_then(Value::as_bson)
    }

    /// Deserialize a plain attribute into `V`.
    fn get_as<V: DeserializeOwned>(&self, attribute: &str) -> Option<V> {
        self.get(attribute)
            .and_then(|b| bson::from_bson(b.clone()).ok())
    }

    /// String attribute.
    fn get_str(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(Bson::as_str)
    }

    /// Datetime attribute as a host datetime.
    fn get_datetime(&self, attribute: &str) -> Option<DateTime<Utc>> {
        self.get(attribute).and_then(coerce::bson_to_datetime)
    }

    /// Set a plain attribute.
    fn set(&mut self, attribute: &str, value: impl Into<Bson>) {
        self.state_mut().put(attribute, Value::Bson(value.into()));
    }

    /// Set a datetime attribute.
    fn set_datetime(&mut self, attribute: &str, value: DateTime<Utc>) {
        self.set(attribute, coerce::datetime_to_bson(value));
    }

    /// Remove an attribute; a partial update will unset it.
    fn unset(&mut self, attribute: &str) {
        self.state_mut().remove(attribute);
    }

    /// Nested sub-model, if present and of type `E`.
    fn embedded<E: SubModel>(&self, attribute: &str) -> Option<&E> {
        self.state().get(attribute).and_then(Value::as_embedded::<E>)
    }

    /// Sub-models of a repeated attribute, skipping non-`E` elements.
    fn embedded_list<E: SubModel>(&self, attribute: &str) -> Vec<&E> {
        match self.state().get(attribute) {
            Some(Value::List(values)) => values.iter().filter_map(Value::as_embedded::<E>).collect(),
            _ => Vec::new(),
        }
    }

    /// Replace a nested sub-model wholesale; `None` stores null.
    fn set_embedded<E: SubModel>(&mut self, attribute: &str, value: Option<E>) {
        let value = match value {
            Some(model) => Value::Embedded(Box::new(model)),
            None => Value::Bson(Bson::Null),
        };
        self.state_mut().put(attribute, value);
    }

    /// Replace a repeated nested attribute wholesale.
    fn set_embedded_list<E: SubModel>(&mut self, attribute: &str, values: Vec<E>) {
        let values = values
            .into_iter()
            .map(|model| Value::Embedded(Box::new(model)))
            .collect();
        self.state_mut().put(attribute, Value::List(values));
    }

    /// Record a mutation made outside the setters.
    fn mark_dirty(&mut self, attribute: &str) {
        self.state_mut().mark_dirty(attribute);
    }

    /// Attributes mutated since load or the last save.
    fn dirty_fields(&self) -> Vec<&str> {
        self.state().dirty().iter().collect()
    }

    /// Whether any attribute was mutated.
    fn is_dirty(&self) -> bool {
        !self.state().dirty().is_empty()
    }

    /// Forget recorded mutations.
    fn clear_dirty(&mut self) {
        self.state_mut().clear_dirty();
    }
}

/// A root model bound to a collection.
pub trait DocumentModel: SubModel {
    /// Collection name.
    const COLLECTION: &'static str;

    /// Connection id the collection lives on.
    const CONNECTION: &'static str = DEFAULT_CONNECTION;

    /// Identifier, `None` until first insert.
    fn id(&self) -> Option<ObjectId> {
        self.state().id()
    }

    /// Inflate a stored document; its `_id` becomes the identifier.
    fn from_document(doc: Document) -> Self {
        Self::from_state(inflate::inflate_state(Self::schema(), doc, 0, true))
    }

    /// Partial update for the dirty attributes, `None` when clean.
    fn dirty_update(&self) -> Option<Document> {
        inflate::dirty_update(Self::schema(), self.state())
    }
}
