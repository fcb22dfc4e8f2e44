//! Core types shared by the schema models and the dereferencing engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The concrete JSON type a schema node describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl JsonType {
    /// Returns the JSON Schema `type` keyword value.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::String => "string",
        }
    }

    /// Parse a JSON Schema `type` keyword value.
    ///
    /// Returns `None` for `"null"` and unknown names (caller decides).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(JsonType::Boolean),
            "object" => Some(JsonType::Object),
            "array" => Some(JsonType::Array),
            "number" => Some(JsonType::Number),
            "integer" => Some(JsonType::Integer),
            "string" => Some(JsonType::String),
            _ => None,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical combinator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    AllOf,
    OneOf,
    AnyOf,
}

impl Combinator {
    /// Returns the JSON Schema keyword for this combinator.
    pub fn keyword(&self) -> &'static str {
        match self {
            Combinator::AllOf => "allOf",
            Combinator::OneOf => "oneOf",
            Combinator::AnyOf => "anyOf",
        }
    }
}

/// A single step taken while descending into a schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named property of an object schema.
    Property(String),
    /// Item schema of an array schema.
    Items,
    /// Schema-valued `additionalProperties` of an object schema.
    AdditionalProperties,
    /// Inner schema of a negation.
    Not,
    /// Branch of a combinator, by position.
    Branch { combinator: Combinator, index: usize },
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => {
                // JSON Pointer escaping (~ = ~0, / = ~1)
                write!(f, "properties/{}", name.replace('~', "~0").replace('/', "~1"))
            }
            PathSegment::Items => f.write_str("items"),
            PathSegment::AdditionalProperties => f.write_str("additionalProperties"),
            PathSegment::Not => f.write_str("not"),
            PathSegment::Branch { combinator, index } => {
                write!(f, "{}/{}", combinator.keyword(), index)
            }
        }
    }
}

/// Location of a node relative to the root of a dereference call.
///
/// Append-only: [`SchemaPath::join`] returns an extended copy and never
/// mutates the receiver. Only container descent extends a path; following a
/// reference does not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SchemaPath {
    segments: Vec<PathSegment>,
}

impl SchemaPath {
    /// The empty path (the resolution root).
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Shorthand for joining a property segment.
    pub fn property(&self, name: impl Into<String>) -> Self {
        self.join(PathSegment::Property(name.into()))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#")?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for SchemaPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_display() {
        assert_eq!(SchemaPath::root().to_string(), "#");
        assert!(SchemaPath::root().is_root());
    }

    #[test]
    fn join_does_not_mutate_parent() {
        let parent = SchemaPath::root().property("widget");
        let child = parent.join(PathSegment::Items);

        assert_eq!(parent.len(), 1);
        assert_eq!(child.len(), 2);
        assert_eq!(child.to_string(), "#/properties/widget/items");
    }

    #[test]
    fn branch_and_not_display() {
        let path = SchemaPath::root()
            .join(PathSegment::Branch {
                combinator: Combinator::AllOf,
                index: 1,
            })
            .join(PathSegment::Not)
            .join(PathSegment::AdditionalProperties);
        assert_eq!(path.to_string(), "#/allOf/1/not/additionalProperties");
    }

    #[test]
    fn property_names_are_pointer_escaped() {
        let path = SchemaPath::root().property("a/b~c");
        assert_eq!(path.to_string(), "#/properties/a~1b~0c");
    }

    #[test]
    fn json_type_parse() {
        assert_eq!(JsonType::parse("integer"), Some(JsonType::Integer));
        assert_eq!(JsonType::parse("null"), None);
        assert_eq!(JsonType::parse("widget"), None);
    }
}
