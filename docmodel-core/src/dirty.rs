//! Mutation tracking for loaded models.

use indexmap::IndexSet;

/// The set of attributes mutated since load or the last successful save.
///
/// Setters record the top-level attribute they touch. Replacing a nested
/// sub-model marks the whole nested attribute, never its leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyFields {
    fields: IndexSet<String>,
}

impl DirtyFields {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation of `attribute`.
    pub fn mark(&mut self, attribute: impl Into<String>) {
        self.fields.insert(attribute.into());
    }

    /// Whether `attribute` has been mutated.
    pub fn contains(&self, attribute: &str) -> bool {
        self.fields.contains(attribute)
    }

    /// Forget every recorded mutation.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Iterate the mutated attribute names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Number of mutated attributes.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing has been mutated.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_semantics() {
        let mut dirty = DirtyFields::new();
        assert!(dirty.is_empty());

        dirty.mark("name");
        dirty.mark("name");
        dirty.mark("age");
        assert_eq!(dirty.len(), 2);
        assert!(dirty.contains("name"));
        assert!(!dirty.contains("email"));

        dirty.clear();
        assert!(dirty.is_empty());
    }
}
