//! Field aliasing between wire names and attribute names.
//!
//! Documents are often stored with short keys (`"fn"`) to save space while
//! the model exposes readable attribute names (`"first_name"`).

use indexmap::IndexMap;

/// Bidirectional map of short wire names to long attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    to_attribute: IndexMap<String, String>,
    to_wire: IndexMap<String, String>,
}

impl AliasMap {
    /// Create an empty alias map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias; re-aliasing either side replaces the previous pair.
    pub fn alias(mut self, wire: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.insert(wire, attribute);
        self
    }

    /// Add an alias in place.
    pub fn insert(&mut self, wire: impl Into<String>, attribute: impl Into<String>) {
        let wire = wire.into();
        let attribute = attribute.into();
        if let Some(old_attr) = self.to_attribute.shift_remove(&wire) {
            self.to_wire.shift_remove(&old_attr);
        }
        if let Some(old_wire) = self.to_wire.shift_remove(&attribute) {
            self.to_attribute.shift_remove(&old_wire);
        }
        self.to_attribute.insert(wire.clone(), attribute.clone());
        self.to_wire.insert(attribute, wire);
    }

    /// Resolve a wire name to its attribute name, if aliased.
    pub fn attribute_for(&self, wire: &str) -> Option<&str> {
        self.to_attribute.get(wire).map(String::as_str)
    }

    /// Resolve an attribute name to its wire name, falling back to the
    /// attribute name itself.
    pub fn wire_for<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.to_wire
            .get(attribute)
            .map(String::as_str)
            .unwrap_or(attribute)
    }

    /// Whether the attribute has an alias.
    pub fn is_aliased_attribute(&self, attribute: &str) -> bool {
        self.to_wire.contains_key(attribute)
    }

    /// Iterate `(wire, attribute)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.to_attribute
            .iter()
            .map(|(w, a)| (w.as_str(), a.as_str()))
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.to_attribute.len()
    }

    /// Whether no alias is defined.
    pub fn is_empty(&self) -> bool {
        self.to_attribute.is_empty()
    }
}

impl<W: Into<String>, A: Into<String>> FromIterator<(W, A)> for AliasMap {
    fn from_iter<T: IntoIterator<Item = (W, A)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (wire, attribute) in iter {
            map.insert(wire, attribute);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_both_ways() {
        let aliases = AliasMap::new().alias("fn", "first_name").alias("ln", "last_name");
        assert_eq!(aliases.attribute_for("fn"), Some("first_name"));
        assert_eq!(aliases.wire_for("last_name"), "ln");
        assert_eq!(aliases.wire_for("email"), "email");
        assert_eq!(aliases.attribute_for("email"), None);
    }

    #[test]
    fn test_realias_replaces_pair() {
        let aliases = AliasMap::new().alias("n", "name").alias("nm", "name");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.wire_for("name"), "nm");
        assert_eq!(aliases.attribute_for("n"), None);
    }

    #[test]
    fn test_from_iter() {
        let aliases: AliasMap = [("a", "alpha"), ("b", "beta")].into_iter().collect();
        assert_eq!(
            aliases.iter().collect::<Vec<_>>(),
            vec![("a", "alpha"), ("b", "beta")]
        );
        assert!(aliases.is_aliased_attribute("beta"));
    }
}
