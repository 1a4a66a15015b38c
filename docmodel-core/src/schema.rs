//! Shape descriptors for models.
//!
//! A [`Schema`] tells the inflation engine how a raw document maps onto a
//! model: which wire keys are aliased, which attributes are declared, which
//! attributes hold nested sub-models and which are stored encrypted.
//!
//! ```rust,ignore
//! use std::sync::OnceLock;
//! use docmodel_core::schema::Schema;
//!
//! fn user_schema() -> &'static Schema {
//!     static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!     SCHEMA.get_or_init(|| {
//!         Schema::builder("User")
//!             .alias("fn", "first_name")
//!             .field("email")
//!             .one::<Address>("address")
//!             .many::<Phone>("phones")
//!             .encrypted("email")
//!             .build()
//!     })
//! }
//! ```

use std::fmt;

use bson::Document;
use indexmap::{IndexMap, IndexSet};

use crate::alias::AliasMap;
use crate::inflate;
use crate::model::{Embedded, SubModel};

/// Inflates a raw sub-document at the given depth into a boxed sub-model.
pub type InflateFn = fn(Document, usize) -> Box<dyn Embedded>;

/// The declared target type of a nested attribute.
///
/// Holds function pointers rather than the schema itself so a sub-model may
/// reference its own type.
#[derive(Clone, Copy)]
pub struct NestedTarget {
    schema: fn() -> &'static Schema,
    inflate: InflateFn,
}

impl NestedTarget {
    /// Target the sub-model type `T`.
    pub fn of<T: SubModel>() -> Self {
        Self {
            schema: T::schema,
            inflate: inflate_boxed::<T>,
        }
    }

    /// Schema of the target type.
    pub fn schema(&self) -> &'static Schema {
        (self.schema)()
    }

    /// Inflate a raw sub-document into the target type.
    pub fn inflate(&self, doc: Document, depth: usize) -> Box<dyn Embedded> {
        (self.inflate)(doc, depth)
    }
}

impl fmt::Debug for NestedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Resolving the schema here could recurse on self-referencing types.
        f.debug_struct("NestedTarget").finish_non_exhaustive()
    }
}

fn inflate_boxed<T: SubModel>(doc: Document, depth: usize) -> Box<dyn Embedded> {
    Box::new(T::from_state(inflate::inflate_state(
        T::schema(),
        doc,
        depth,
        false,
    )))
}

/// A nested attribute holding one sub-model or a sequence of them.
#[derive(Debug, Clone)]
pub struct NestedField {
    attribute: String,
    repeated: bool,
    target: NestedTarget,
}

impl NestedField {
    /// An attribute holding at most one `T`.
    pub fn one<T: SubModel>(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            repeated: false,
            target: NestedTarget::of::<T>(),
        }
    }

    /// An attribute holding an ordered sequence of `T`.
    pub fn many<T: SubModel>(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            repeated: true,
            target: NestedTarget::of::<T>(),
        }
    }

    /// Attribute name.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Whether the attribute holds a sequence.
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Declared target type.
    pub fn target(&self) -> &NestedTarget {
        &self.target
    }
}

/// Shape descriptor for a model type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: String,
    aliases: AliasMap,
    fields: IndexSet<String>,
    nested: IndexMap<String, NestedField>,
    encrypted: IndexSet<String>,
}

impl Schema {
    /// Start describing a model.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Model name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias map.
    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Nested attributes in declaration order.
    pub fn nested(&self) -> impl Iterator<Item = &NestedField> {
        self.nested.values()
    }

    /// Look up a nested attribute.
    pub fn nested_field(&self, attribute: &str) -> Option<&NestedField> {
        self.nested.get(attribute)
    }

    /// Attributes stored encrypted.
    pub fn encrypted(&self) -> impl Iterator<Item = &str> {
        self.encrypted.iter().map(String::as_str)
    }

    /// Whether any attribute is stored encrypted.
    pub fn has_encrypted(&self) -> bool {
        !self.encrypted.is_empty()
    }

    /// An open schema maps every wire key to an attribute of the same name.
    ///
    /// A schema is open while it declares neither aliases nor plain fields.
    pub fn is_open(&self) -> bool {
        self.aliases.is_empty() && self.fields.is_empty()
    }

    /// Whether `attribute` is declared by this schema.
    pub fn declares(&self, attribute: &str) -> bool {
        self.fields.contains(attribute)
            || self.nested.contains_key(attribute)
            || self.aliases.is_aliased_attribute(attribute)
    }

    /// Resolve a wire key to an attribute name.
    ///
    /// `None` means the key is unmapped and belongs in the side-bag.
    pub fn attribute_for<'a>(&'a self, wire: &'a str) -> Option<&'a str> {
        if let Some(attribute) = self.aliases.attribute_for(wire) {
            return Some(attribute);
        }
        if self.is_open() || self.declares(wire) {
            Some(wire)
        } else {
            None
        }
    }

    /// Resolve an attribute name to its wire key.
    pub fn wire_for<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.aliases.wire_for(attribute)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a builder for the named model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema {
                name: name.into(),
                ..Schema::default()
            },
        }
    }

    /// Map the short wire key `wire` to `attribute`.
    pub fn alias(mut self, wire: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.schema.aliases.insert(wire, attribute);
        self
    }

    /// Use a prepared alias map.
    pub fn aliases(mut self, aliases: AliasMap) -> Self {
        self.schema.aliases = aliases;
        self
    }

    /// Declare a plain attribute.
    pub fn field(mut self, attribute: impl Into<String>) -> Self {
        self.schema.fields.insert(attribute.into());
        self
    }

    /// Declare several plain attributes.
    pub fn fields<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema
            .fields
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Declare an attribute holding at most one `T`.
    pub fn one<T: SubModel>(self, attribute: impl Into<String>) -> Self {
        self.nested(NestedField::one::<T>(attribute))
    }

    /// Declare an attribute holding a sequence of `T`.
    pub fn many<T: SubModel>(self, attribute: impl Into<String>) -> Self {
        self.nested(NestedField::many::<T>(attribute))
    }

    /// Declare a nested attribute.
    pub fn nested(mut self, field: NestedField) -> Self {
        self.schema
            .nested
            .insert(field.attribute().to_string(), field);
        self
    }

    /// Store `attribute` encrypted through the configured field cipher.
    pub fn encrypted(mut self, attribute: impl Into<String>) -> Self {
        self.schema.encrypted.insert(attribute.into());
        self
    }

    /// Finish the schema.
    pub fn build(self) -> Schema {
        self.schema
    }
}
