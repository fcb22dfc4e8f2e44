//! Component tables: named, reusable schemas that references point into.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use crate::dereferenced::DereferencedSchema;
use crate::error::DereferenceError;
use crate::resolver::dereference_in;
use crate::schema::JsonSchema;

/// Point lookup of a component schema by name.
///
/// The engine only ever calls `lookup`; it never iterates or mutates the
/// table.
pub trait ComponentLookup {
    fn lookup(&self, name: &str) -> Option<&JsonSchema>;
}

impl ComponentLookup for HashMap<String, JsonSchema> {
    fn lookup(&self, name: &str) -> Option<&JsonSchema> {
        self.get(name)
    }
}

impl ComponentLookup for BTreeMap<String, JsonSchema> {
    fn lookup(&self, name: &str) -> Option<&JsonSchema> {
        self.get(name)
    }
}

impl ComponentLookup for IndexMap<String, JsonSchema> {
    fn lookup(&self, name: &str) -> Option<&JsonSchema> {
        self.get(name)
    }
}

impl<T: ComponentLookup + ?Sized> ComponentLookup for &T {
    fn lookup(&self, name: &str) -> Option<&JsonSchema> {
        (**self).lookup(name)
    }
}

/// Insertion-ordered component table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    schemas: IndexMap<String, JsonSchema>,
}

impl Components {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_schema(mut self, name: impl Into<String>, schema: JsonSchema) -> Self {
        self.insert(name, schema);
        self
    }

    /// Insert a component, returning the schema it replaced.
    pub fn insert(&mut self, name: impl Into<String>, schema: JsonSchema) -> Option<JsonSchema> {
        self.schemas.insert(name.into(), schema)
    }

    pub fn get(&self, name: &str) -> Option<&JsonSchema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Component names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonSchema)> {
        self.schemas.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    /// Strictly dereference every component, in table order.
    ///
    /// # Errors
    ///
    /// Returns the first component's failure.
    pub fn dereference_all(&self) -> Result<IndexMap<String, DereferencedSchema>, DereferenceError> {
        self.schemas
            .iter()
            .map(|(name, schema)| Ok((name.clone(), dereference_in(schema, self)?)))
            .collect()
    }
}

impl ComponentLookup for Components {
    fn lookup(&self, name: &str) -> Option<&JsonSchema> {
        self.schemas.get(name)
    }
}

impl<K: Into<String>> FromIterator<(K, JsonSchema)> for Components {
    fn from_iter<I: IntoIterator<Item = (K, JsonSchema)>>(iter: I) -> Self {
        Self {
            schemas: iter
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        }
    }
}
