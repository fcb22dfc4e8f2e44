//! Input schema model.
//!
//! A [`JsonSchema`] may contain [`JsonSchema::Reference`] nodes anywhere in
//! its tree. Dereferencing turns it into a
//! [`DereferencedSchema`](crate::DereferencedSchema), which cannot.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Combinator, JsonType};

/// Names the property used to tell apart the concrete shapes of a
/// polymorphic schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<BTreeMap<String, String>>,
}

impl Discriminator {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            mapping: None,
        }
    }

    /// Add a discriminator value → component name mapping entry.
    pub fn map(mut self, value: impl Into<String>, target: impl Into<String>) -> Self {
        self.mapping
            .get_or_insert_with(BTreeMap::new)
            .insert(value.into(), target.into());
        self
    }
}

/// Metadata shared by every typed schema variant.
///
/// `required` describes whether the schema's value must be present where it
/// is used (e.g. as an object property) and defaults to `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreContext {
    pub required: bool,
    pub nullable: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub deprecated: bool,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub discriminator: Option<Discriminator>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub allowed_values: Option<Vec<Value>>,
}

impl Default for CoreContext {
    fn default() -> Self {
        Self {
            required: true,
            nullable: false,
            read_only: false,
            write_only: false,
            deprecated: false,
            format: None,
            title: None,
            description: None,
            discriminator: None,
            default: None,
            example: None,
            allowed_values: None,
        }
    }
}

impl CoreContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn allowed_values(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }
}

/// Core metadata written next to a combinator rather than inside a typed
/// schema, e.g. `{"allOf": [...], "nullable": true}`.
///
/// Only fields that are present override; absent fields leave the target
/// untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub nullable: Option<bool>,
    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
    pub deprecated: Option<bool>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub allowed_values: Option<Vec<Value>>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite every field of `core` that is present here.
    pub fn apply_to(&self, core: &mut CoreContext) {
        let flags = [
            (self.nullable, &mut core.nullable),
            (self.read_only, &mut core.read_only),
            (self.write_only, &mut core.write_only),
            (self.deprecated, &mut core.deprecated),
        ];
        for (value, slot) in flags {
            if let Some(value) = value {
                *slot = value;
            }
        }

        let strings = [
            (&self.format, &mut core.format),
            (&self.title, &mut core.title),
            (&self.description, &mut core.description),
        ];
        for (value, slot) in strings {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        if self.default.is_some() {
            core.default.clone_from(&self.default);
        }
        if self.example.is_some() {
            core.example.clone_from(&self.example);
        }
        if self.allowed_values.is_some() {
            core.allowed_values.clone_from(&self.allowed_values);
        }
    }
}

/// A numeric bound, optionally exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound<T> {
    pub value: T,
    pub exclusive: bool,
}

impl<T> Bound<T> {
    pub fn inclusive(value: T) -> Self {
        Self {
            value,
            exclusive: false,
        }
    }

    pub fn exclusive(value: T) -> Self {
        Self {
            value,
            exclusive: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericContext {
    pub multiple_of: Option<f64>,
    pub maximum: Option<Bound<f64>>,
    pub minimum: Option<Bound<f64>>,
}

impl NumericContext {
    pub fn minimum(mut self, value: f64, exclusive: bool) -> Self {
        self.minimum = Some(Bound { value, exclusive });
        self
    }

    pub fn maximum(mut self, value: f64, exclusive: bool) -> Self {
        self.maximum = Some(Bound { value, exclusive });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegerContext {
    pub multiple_of: Option<i64>,
    pub maximum: Option<Bound<i64>>,
    pub minimum: Option<Bound<i64>>,
}

impl IntegerContext {
    pub fn minimum(mut self, value: i64, exclusive: bool) -> Self {
        self.minimum = Some(Bound { value, exclusive });
        self
    }

    pub fn maximum(mut self, value: i64, exclusive: bool) -> Self {
        self.maximum = Some(Bound { value, exclusive });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringContext {
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub pattern: Option<String>,
}

impl StringContext {
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayContext {
    pub items: Option<Box<JsonSchema>>,
    pub max_items: Option<usize>,
    pub min_items: Option<usize>,
    pub unique_items: bool,
}

impl ArrayContext {
    pub fn items(mut self, items: JsonSchema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn unique_items(mut self, unique_items: bool) -> Self {
        self.unique_items = unique_items;
        self
    }
}

/// Policy for properties not named in an object's property map.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<JsonSchema>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectContext {
    /// Insertion-ordered; keys are unique.
    pub properties: IndexMap<String, JsonSchema>,
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,
    pub max_properties: Option<usize>,
    pub min_properties: Option<usize>,
}

impl ObjectContext {
    pub fn with_properties<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JsonSchema)>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
            ..Self::default()
        }
    }

    /// Mark a property name as required (no duplicates).
    pub fn require(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    pub fn additional_properties(mut self, policy: AdditionalProperties) -> Self {
        self.additional_properties = Some(policy);
        self
    }
}

/// A schema node that may contain references.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonSchema {
    Boolean(CoreContext),
    Object(CoreContext, ObjectContext),
    Array(CoreContext, ArrayContext),
    Number(CoreContext, NumericContext),
    Integer(CoreContext, IntegerContext),
    String(CoreContext, StringContext),
    /// No type information; only an optional description.
    Undefined {
        description: Option<String>,
    },
    /// Named pointer into a component table.
    Reference(String),
    Not(Box<JsonSchema>),
    /// Conjunction. `annotations` are applied to the collapsed result.
    AllOf {
        of: Vec<JsonSchema>,
        discriminator: Option<Discriminator>,
        annotations: Option<Annotations>,
    },
    OneOf {
        of: Vec<JsonSchema>,
        discriminator: Option<Discriminator>,
    },
    AnyOf {
        of: Vec<JsonSchema>,
        discriminator: Option<Discriminator>,
    },
}

impl JsonSchema {
    pub fn boolean() -> Self {
        JsonSchema::Boolean(CoreContext::default())
    }

    pub fn number() -> Self {
        JsonSchema::Number(CoreContext::default(), NumericContext::default())
    }

    pub fn integer() -> Self {
        JsonSchema::Integer(CoreContext::default(), IntegerContext::default())
    }

    pub fn string() -> Self {
        JsonSchema::String(CoreContext::default(), StringContext::default())
    }

    /// Object schema with no properties.
    pub fn object() -> Self {
        JsonSchema::Object(CoreContext::default(), ObjectContext::default())
    }

    pub fn object_of<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JsonSchema)>,
    {
        JsonSchema::Object(
            CoreContext::default(),
            ObjectContext::with_properties(properties),
        )
    }

    /// Array schema with no item schema.
    pub fn array() -> Self {
        JsonSchema::Array(CoreContext::default(), ArrayContext::default())
    }

    pub fn array_of(items: JsonSchema) -> Self {
        JsonSchema::Array(CoreContext::default(), ArrayContext::default().items(items))
    }

    pub fn undefined(description: Option<String>) -> Self {
        JsonSchema::Undefined { description }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        JsonSchema::Reference(name.into())
    }

    pub fn not(inner: JsonSchema) -> Self {
        JsonSchema::Not(Box::new(inner))
    }

    pub fn all_of(of: Vec<JsonSchema>) -> Self {
        JsonSchema::AllOf {
            of,
            discriminator: None,
            annotations: None,
        }
    }

    pub fn one_of(of: Vec<JsonSchema>) -> Self {
        JsonSchema::OneOf {
            of,
            discriminator: None,
        }
    }

    pub fn any_of(of: Vec<JsonSchema>) -> Self {
        JsonSchema::AnyOf {
            of,
            discriminator: None,
        }
    }

    /// Build a combinator node of the given kind.
    pub fn combinator(
        kind: Combinator,
        of: Vec<JsonSchema>,
        discriminator: Option<Discriminator>,
    ) -> Self {
        match kind {
            Combinator::AllOf => JsonSchema::AllOf {
                of,
                discriminator,
                annotations: None,
            },
            Combinator::OneOf => JsonSchema::OneOf { of, discriminator },
            Combinator::AnyOf => JsonSchema::AnyOf { of, discriminator },
        }
    }

    /// Returns a copy with `required` set to false.
    ///
    /// Variants without a core context are returned unchanged.
    pub fn optional(mut self) -> Self {
        if let Some(core) = self.core_context_mut() {
            core.required = false;
        }
        self
    }

    /// Returns a copy with the given discriminator.
    ///
    /// Typed variants store it in the core context; combinators store it at
    /// the combinator level. Other variants are returned unchanged.
    pub fn with_discriminator(mut self, discriminator: Discriminator) -> Self {
        match &mut self {
            JsonSchema::AllOf { discriminator: d, .. }
            | JsonSchema::OneOf { discriminator: d, .. }
            | JsonSchema::AnyOf { discriminator: d, .. } => *d = Some(discriminator),
            other => {
                if let Some(core) = other.core_context_mut() {
                    core.discriminator = Some(discriminator);
                }
            }
        }
        self
    }

    /// Returns a copy with the given annotations.
    ///
    /// Typed variants apply them to the core context at once; `allOf` keeps
    /// them for its collapsed result. Other variants are returned unchanged.
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        match &mut self {
            JsonSchema::AllOf { annotations: a, .. } => *a = Some(annotations),
            other => {
                if let Some(core) = other.core_context_mut() {
                    annotations.apply_to(core);
                }
            }
        }
        self
    }

    pub fn core_context(&self) -> Option<&CoreContext> {
        match self {
            JsonSchema::Boolean(core)
            | JsonSchema::Object(core, _)
            | JsonSchema::Array(core, _)
            | JsonSchema::Number(core, _)
            | JsonSchema::Integer(core, _)
            | JsonSchema::String(core, _) => Some(core),
            JsonSchema::Undefined { .. }
            | JsonSchema::Reference(_)
            | JsonSchema::Not(_)
            | JsonSchema::AllOf { .. }
            | JsonSchema::OneOf { .. }
            | JsonSchema::AnyOf { .. } => None,
        }
    }

    fn core_context_mut(&mut self) -> Option<&mut CoreContext> {
        match self {
            JsonSchema::Boolean(core)
            | JsonSchema::Object(core, _)
            | JsonSchema::Array(core, _)
            | JsonSchema::Number(core, _)
            | JsonSchema::Integer(core, _)
            | JsonSchema::String(core, _) => Some(core),
            _ => None,
        }
    }

    /// The concrete type this node declares, if it is a typed variant.
    pub fn json_type(&self) -> Option<JsonType> {
        match self {
            JsonSchema::Boolean(_) => Some(JsonType::Boolean),
            JsonSchema::Object(..) => Some(JsonType::Object),
            JsonSchema::Array(..) => Some(JsonType::Array),
            JsonSchema::Number(..) => Some(JsonType::Number),
            JsonSchema::Integer(..) => Some(JsonType::Integer),
            JsonSchema::String(..) => Some(JsonType::String),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, JsonSchema::Reference(_))
    }

    /// Discriminator at the node level (core context or combinator).
    pub fn discriminator(&self) -> Option<&Discriminator> {
        match self {
            JsonSchema::AllOf { discriminator, .. }
            | JsonSchema::OneOf { discriminator, .. }
            | JsonSchema::AnyOf { discriminator, .. } => discriminator.as_ref(),
            other => other.core_context().and_then(|c| c.discriminator.as_ref()),
        }
    }
}
