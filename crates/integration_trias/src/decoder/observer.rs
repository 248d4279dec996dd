//! Observer table for scoped payload keys
//!
//! TRIAS reuses generic leaf tags (`trias:Text`) under several parents inside
//! one record. Only the parents named by scoped keys are tracked, so the
//! decoder never needs a full ancestor stack.

use std::collections::HashMap;

use super::schema::{FieldKey, ScopedKey};

/// `(parent, child)` pairs derived from a payload's scoped keys
#[derive(Debug, Clone, Default)]
pub struct ObserverTable {
    children_by_parent: HashMap<&'static str, Vec<&'static str>>,
}

impl ObserverTable {
    /// Build the table from a payload's declared keys
    ///
    /// # Panics
    ///
    /// Panics if a scoped key has an empty parent or child. That is a bug in
    /// the payload schema, not in the document.
    #[must_use]
    pub fn from_keys(keys: &[FieldKey]) -> Self {
        let mut children_by_parent: HashMap<&'static str, Vec<&'static str>> = HashMap::new();

        for key in keys {
            if let FieldKey::Scoped(ScopedKey { parent, child }) = *key {
                assert!(
                    !parent.is_empty() && !child.is_empty(),
                    "scoped key needs a parent and a child: {key}"
                );
                let children = children_by_parent.entry(parent).or_default();
                if !children.contains(&child) {
                    children.push(child);
                }
            }
        }

        Self { children_by_parent }
    }

    /// Returns true if `name` opens a disambiguation scope
    #[must_use]
    pub fn is_parent(&self, name: &str) -> bool {
        self.children_by_parent.contains_key(name)
    }

    /// Resolve `child` closing inside `parent` to its scoped key
    #[must_use]
    pub fn resolve(&self, parent: &str, child: &str) -> Option<ScopedKey> {
        let (parent, children) = self.children_by_parent.get_key_value(parent)?;
        children
            .iter()
            .find(|candidate| **candidate == child)
            .map(|child| ScopedKey {
                parent: *parent,
                child: *child,
            })
    }

    /// Number of `(parent, child)` entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.children_by_parent.values().map(Vec::len).sum()
    }

    /// Returns true if the payload declares no scoped keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children_by_parent.is_empty()
    }
}
