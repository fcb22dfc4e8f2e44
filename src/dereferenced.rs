//! Resolved schema model.
//!
//! [`DereferencedSchema`] mirrors [`JsonSchema`] without the `Reference` and
//! `AllOf` variants. Every schema reachable from a `DereferencedSchema` is
//! itself dereferenced, so consumers can match exhaustively without handling
//! indirection.

use indexmap::IndexMap;

use crate::components::Components;
use crate::schema::{
    ArrayContext, CoreContext, Discriminator, IntegerContext, JsonSchema, NumericContext,
    ObjectContext, StringContext,
};
use crate::types::JsonType;

/// Resolved form of [`AdditionalProperties`](crate::AdditionalProperties).
#[derive(Debug, Clone, PartialEq)]
pub enum DereferencedAdditionalProperties {
    Allowed(bool),
    Schema(Box<DereferencedSchema>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DereferencedObjectContext {
    pub properties: IndexMap<String, DereferencedSchema>,
    pub required: Vec<String>,
    pub additional_properties: Option<DereferencedAdditionalProperties>,
    pub max_properties: Option<usize>,
    pub min_properties: Option<usize>,
}

impl DereferencedObjectContext {
    /// Build from a reference-free object context.
    ///
    /// Returns `None` if any nested schema holds a reference.
    pub fn new(context: &ObjectContext) -> Option<Self> {
        let schema = JsonSchema::Object(CoreContext::default(), context.clone());
        match schema.dereferenced_in(&Components::default()).ok()? {
            DereferencedSchema::Object(_, resolved) => Some(resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DereferencedArrayContext {
    pub items: Option<Box<DereferencedSchema>>,
    pub max_items: Option<usize>,
    pub min_items: Option<usize>,
    pub unique_items: bool,
}

impl DereferencedArrayContext {
    /// Build from a reference-free array context.
    ///
    /// Returns `None` if the item schema holds a reference.
    pub fn new(context: &ArrayContext) -> Option<Self> {
        let schema = JsonSchema::Array(CoreContext::default(), context.clone());
        match schema.dereferenced_in(&Components::default()).ok()? {
            DereferencedSchema::Array(_, resolved) => Some(resolved),
            _ => None,
        }
    }
}

/// A schema node with no references anywhere in its subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum DereferencedSchema {
    Boolean(CoreContext),
    Object(CoreContext, DereferencedObjectContext),
    Array(CoreContext, DereferencedArrayContext),
    Number(CoreContext, NumericContext),
    Integer(CoreContext, IntegerContext),
    String(CoreContext, StringContext),
    Undefined {
        description: Option<String>,
    },
    Not(Box<DereferencedSchema>),
    OneOf {
        of: Vec<DereferencedSchema>,
        discriminator: Option<Discriminator>,
    },
    AnyOf {
        of: Vec<DereferencedSchema>,
        discriminator: Option<Discriminator>,
    },
}

impl DereferencedSchema {
    /// Common metadata; absent for `Undefined`, `Not` and the combinators.
    pub fn core_context(&self) -> Option<&CoreContext> {
        match self {
            DereferencedSchema::Boolean(core)
            | DereferencedSchema::Object(core, _)
            | DereferencedSchema::Array(core, _)
            | DereferencedSchema::Number(core, _)
            | DereferencedSchema::Integer(core, _)
            | DereferencedSchema::String(core, _) => Some(core),
            DereferencedSchema::Undefined { .. }
            | DereferencedSchema::Not(_)
            | DereferencedSchema::OneOf { .. }
            | DereferencedSchema::AnyOf { .. } => None,
        }
    }

    pub(crate) fn core_context_mut(&mut self) -> Option<&mut CoreContext> {
        match self {
            DereferencedSchema::Boolean(core)
            | DereferencedSchema::Object(core, _)
            | DereferencedSchema::Array(core, _)
            | DereferencedSchema::Number(core, _)
            | DereferencedSchema::Integer(core, _)
            | DereferencedSchema::String(core, _) => Some(core),
            _ => None,
        }
    }

    /// The nested object context if this is an object schema.
    pub fn object_context(&self) -> Option<&DereferencedObjectContext> {
        match self {
            DereferencedSchema::Object(_, context) => Some(context),
            _ => None,
        }
    }

    /// The nested array context if this is an array schema.
    pub fn array_context(&self) -> Option<&DereferencedArrayContext> {
        match self {
            DereferencedSchema::Array(_, context) => Some(context),
            _ => None,
        }
    }

    /// Discriminator at the node level (core context or combinator).
    pub fn discriminator(&self) -> Option<&Discriminator> {
        match self {
            DereferencedSchema::OneOf { discriminator, .. }
            | DereferencedSchema::AnyOf { discriminator, .. } => discriminator.as_ref(),
            other => other.core_context().and_then(|c| c.discriminator.as_ref()),
        }
    }

    /// Whether the value must be present. Nodes without a core context
    /// carry no such restriction and report the default (`true`).
    pub fn required(&self) -> bool {
        self.core_context().map_or(true, |core| core.required)
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            DereferencedSchema::Undefined { description } => description.as_deref(),
            other => other.core_context().and_then(|c| c.description.as_deref()),
        }
    }

    pub fn json_type(&self) -> Option<JsonType> {
        match self {
            DereferencedSchema::Boolean(_) => Some(JsonType::Boolean),
            DereferencedSchema::Object(..) => Some(JsonType::Object),
            DereferencedSchema::Array(..) => Some(JsonType::Array),
            DereferencedSchema::Number(..) => Some(JsonType::Number),
            DereferencedSchema::Integer(..) => Some(JsonType::Integer),
            DereferencedSchema::String(..) => Some(JsonType::String),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            DereferencedSchema::Undefined { .. } => "undefined",
            DereferencedSchema::Not(_) => "not",
            DereferencedSchema::OneOf { .. } => "oneOf",
            DereferencedSchema::AnyOf { .. } => "anyOf",
            typed => typed.json_type().map_or("unknown", |t| t.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_has_no_core_context() {
        let schema = DereferencedSchema::Undefined {
            description: Some("anything".into()),
        };
        assert!(schema.core_context().is_none());
        assert!(schema.discriminator().is_none());
        assert_eq!(schema.description(), Some("anything"));
    }

    #[test]
    fn object_and_array_accessors_are_exclusive() {
        let object = DereferencedSchema::Object(
            CoreContext::default().required(false),
            DereferencedObjectContext::default(),
        );
        assert!(object.object_context().is_some());
        assert!(object.array_context().is_none());
        assert!(!object.required());

        let array = DereferencedSchema::Array(
            CoreContext::default(),
            DereferencedArrayContext::default(),
        );
        assert!(array.array_context().is_some());
        assert!(array.object_context().is_none());
        assert!(array.required());
    }

    #[test]
    fn object_context_from_reference_free_input() {
        let context = ObjectContext::with_properties([("name", JsonSchema::string())]);
        let resolved = DereferencedObjectContext::new(&context).unwrap();
        assert_eq!(
            resolved.properties.get("name"),
            Some(&DereferencedSchema::String(
                CoreContext::default(),
                StringContext::default()
            ))
        );
    }

    #[test]
    fn object_context_with_reference_is_none() {
        let context = ObjectContext::with_properties([("name", JsonSchema::reference("Name"))]);
        assert!(DereferencedObjectContext::new(&context).is_none());
    }

    #[test]
    fn array_context_with_reference_is_none() {
        let context = ArrayContext::default().items(JsonSchema::reference("Item"));
        assert!(DereferencedArrayContext::new(&context).is_none());
        assert_eq!(
            DereferencedArrayContext::new(&ArrayContext::default()),
            Some(DereferencedArrayContext::default())
        );
    }

    #[test]
    fn combinator_discriminator_is_reported() {
        let schema = DereferencedSchema::OneOf {
            of: vec![DereferencedSchema::Boolean(CoreContext::default())],
            discriminator: Some(Discriminator::new("kind")),
        };
        assert_eq!(schema.discriminator(), Some(&Discriminator::new("kind")));
        assert!(schema.core_context().is_none());
    }
}
