//! Schema dereferencing - rebuilds a schema tree with every reference
//! replaced by the component it names and every `allOf` collapsed.
//!
//! There is one algorithm. The strict entry point ([`dereference_in`])
//! reports why resolution failed; the best-effort entry points
//! ([`dereference`], [`dereference_with`]) discard that detail.

use indexmap::IndexMap;
use log::{debug, trace};

use crate::components::{ComponentLookup, Components};
use crate::dereferenced::{
    DereferencedAdditionalProperties, DereferencedArrayContext, DereferencedObjectContext,
    DereferencedSchema,
};
use crate::error::DereferenceError;
use crate::merge::{apply_annotations, collapse_all_of};
use crate::schema::{AdditionalProperties, ArrayContext, JsonSchema, ObjectContext};
use crate::types::{Combinator, PathSegment, SchemaPath};

/// Best-effort dereference with no components.
///
/// Any reference makes the whole result `None`.
pub fn dereference(schema: &JsonSchema) -> Option<DereferencedSchema> {
    dereference_with(schema, &Components::default())
}

/// Best-effort dereference against a component table.
///
/// Returns `None` if any reachable reference is missing or cyclic, or if an
/// `allOf` cannot be collapsed.
pub fn dereference_with<C>(schema: &JsonSchema, components: &C) -> Option<DereferencedSchema>
where
    C: ComponentLookup + ?Sized,
{
    dereference_in(schema, components).ok()
}

/// Strict dereference against a component table.
///
/// # Errors
///
/// Returns the first failure met in depth-first, declaration order:
/// - `MissingReference` if a reference names no component
/// - `CyclicReference` if a reference re-enters a component already being
///   resolved on the current descent
/// - `InconsistentCombinator` if an `allOf` cannot be collapsed
pub fn dereference_in<C>(
    schema: &JsonSchema,
    components: &C,
) -> Result<DereferencedSchema, DereferenceError>
where
    C: ComponentLookup + ?Sized,
{
    Resolver { components }.resolve(schema, &SchemaPath::root(), &[])
}

impl JsonSchema {
    /// Best-effort dereference with no components. See [`dereference`].
    pub fn dereferenced(&self) -> Option<DereferencedSchema> {
        dereference(self)
    }

    /// Strict dereference. See [`dereference_in`].
    pub fn dereferenced_in<C>(&self, components: &C) -> Result<DereferencedSchema, DereferenceError>
    where
        C: ComponentLookup + ?Sized,
    {
        dereference_in(self, components)
    }
}

// --- Internal implementation ---

struct Resolver<'c, C: ?Sized> {
    components: &'c C,
}

impl<C: ComponentLookup + ?Sized> Resolver<'_, C> {
    /// `chain` holds the component names currently being expanded on this
    /// descent, outermost first.
    fn resolve(
        &self,
        schema: &JsonSchema,
        path: &SchemaPath,
        chain: &[String],
    ) -> Result<DereferencedSchema, DereferenceError> {
        match schema {
            // Scalars carry no nested schemas
            JsonSchema::Boolean(core) => Ok(DereferencedSchema::Boolean(core.clone())),
            JsonSchema::Number(core, context) => {
                Ok(DereferencedSchema::Number(core.clone(), context.clone()))
            }
            JsonSchema::Integer(core, context) => {
                Ok(DereferencedSchema::Integer(core.clone(), context.clone()))
            }
            JsonSchema::String(core, context) => {
                Ok(DereferencedSchema::String(core.clone(), context.clone()))
            }
            JsonSchema::Undefined { description } => Ok(DereferencedSchema::Undefined {
                description: description.clone(),
            }),

            JsonSchema::Object(core, context) => Ok(DereferencedSchema::Object(
                core.clone(),
                self.resolve_object(context, path, chain)?,
            )),
            JsonSchema::Array(core, context) => Ok(DereferencedSchema::Array(
                core.clone(),
                self.resolve_array(context, path, chain)?,
            )),

            JsonSchema::Reference(name) => self.resolve_reference(name, path, chain),

            JsonSchema::Not(inner) => {
                let resolved = self.resolve(inner, &path.join(PathSegment::Not), chain)?;
                Ok(DereferencedSchema::Not(Box::new(resolved)))
            }
            JsonSchema::AllOf {
                of,
                discriminator,
                annotations,
            } => {
                let branches = self.resolve_branches(Combinator::AllOf, of, path, chain)?;
                let mut collapsed = collapse_all_of(branches, discriminator.as_ref(), path)?;
                if let Some(annotations) = annotations {
                    apply_annotations(&mut collapsed, annotations);
                }
                Ok(collapsed)
            }
            JsonSchema::OneOf { of, discriminator } => Ok(DereferencedSchema::OneOf {
                of: self.resolve_branches(Combinator::OneOf, of, path, chain)?,
                discriminator: discriminator.clone(),
            }),
            JsonSchema::AnyOf { of, discriminator } => Ok(DereferencedSchema::AnyOf {
                of: self.resolve_branches(Combinator::AnyOf, of, path, chain)?,
                discriminator: discriminator.clone(),
            }),
        }
    }

    fn resolve_reference(
        &self,
        name: &str,
        path: &SchemaPath,
        chain: &[String],
    ) -> Result<DereferencedSchema, DereferenceError> {
        if chain.iter().any(|active| active == name) {
            return Err(DereferenceError::CyclicReference {
                name: name.to_string(),
                path: path.clone(),
            });
        }

        let Some(target) = self.components.lookup(name) else {
            return Err(DereferenceError::MissingReference {
                name: name.to_string(),
                path: path.clone(),
            });
        };

        debug!("resolving component '{}' at {}", name, path);

        let mut next = chain.to_vec();
        next.push(name.to_string());
        // Same path: following a reference is not a descent
        self.resolve(target, path, &next)
    }

    fn resolve_object(
        &self,
        context: &ObjectContext,
        path: &SchemaPath,
        chain: &[String],
    ) -> Result<DereferencedObjectContext, DereferenceError> {
        let mut properties = IndexMap::with_capacity(context.properties.len());

        for (name, schema) in &context.properties {
            let prop_path = path.property(name.clone());
            trace!("descending into {}", prop_path);
            let resolved = self.resolve(schema, &prop_path, chain)?;
            properties.insert(name.clone(), resolved);
        }

        let additional_properties = match &context.additional_properties {
            None => None,
            Some(AdditionalProperties::Allowed(allowed)) => {
                Some(DereferencedAdditionalProperties::Allowed(*allowed))
            }
            Some(AdditionalProperties::Schema(schema)) => {
                let resolved =
                    self.resolve(schema, &path.join(PathSegment::AdditionalProperties), chain)?;
                Some(DereferencedAdditionalProperties::Schema(Box::new(resolved)))
            }
        };

        Ok(DereferencedObjectContext {
            properties,
            required: context.required.clone(),
            additional_properties,
            max_properties: context.max_properties,
            min_properties: context.min_properties,
        })
    }

    fn resolve_array(
        &self,
        context: &ArrayContext,
        path: &SchemaPath,
        chain: &[String],
    ) -> Result<DereferencedArrayContext, DereferenceError> {
        let items = match &context.items {
            Some(items) => {
                let resolved = self.resolve(items, &path.join(PathSegment::Items), chain)?;
                Some(Box::new(resolved))
            }
            None => None,
        };

        Ok(DereferencedArrayContext {
            items,
            max_items: context.max_items,
            min_items: context.min_items,
            unique_items: context.unique_items,
        })
    }

    fn resolve_branches(
        &self,
        combinator: Combinator,
        branches: &[JsonSchema],
        path: &SchemaPath,
        chain: &[String],
    ) -> Result<Vec<DereferencedSchema>, DereferenceError> {
        branches
            .iter()
            .enumerate()
            .map(|(index, branch)| {
                let branch_path = path.join(PathSegment::Branch { combinator, index });
                self.resolve(branch, &branch_path, chain)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CoreContext, Discriminator, StringContext};

    fn boolean() -> DereferencedSchema {
        DereferencedSchema::Boolean(CoreContext::default())
    }

    #[test]
    fn scalar_resolves_to_itself() {
        let schema = JsonSchema::String(
            CoreContext::default().description("name"),
            StringContext::default().min_length(5),
        );
        let resolved = dereference(&schema).unwrap();
        assert_eq!(
            resolved,
            DereferencedSchema::String(
                CoreContext::default().description("name"),
                StringContext::default().min_length(5)
            )
        );
    }

    #[test]
    fn reference_without_components_is_none() {
        assert!(dereference(&JsonSchema::reference("test")).is_none());
    }

    #[test]
    fn reference_hit_resolves_target() {
        let components = Components::new().with_schema("test", JsonSchema::boolean());
        let resolved = dereference_in(&JsonSchema::reference("test"), &components).unwrap();
        assert_eq!(resolved, boolean());
    }

    #[test]
    fn reference_does_not_extend_path() {
        let components = Components::new()
            .with_schema("Outer", JsonSchema::reference("Inner"));
        let schema = JsonSchema::object_of([("x", JsonSchema::reference("Outer"))]);

        let err = dereference_in(&schema, &components).unwrap_err();
        assert_eq!(
            err,
            DereferenceError::MissingReference {
                name: "Inner".into(),
                path: SchemaPath::root().property("x"),
            }
        );
    }

    #[test]
    fn self_reference_is_cyclic() {
        let components = Components::new().with_schema(
            "Node",
            JsonSchema::object_of([("next", JsonSchema::reference("Node"))]),
        );
        let err = dereference_in(&JsonSchema::reference("Node"), &components).unwrap_err();
        assert_eq!(
            err,
            DereferenceError::CyclicReference {
                name: "Node".into(),
                path: SchemaPath::root().property("next"),
            }
        );
    }

    #[test]
    fn mutual_reference_is_cyclic() {
        let components = Components::new()
            .with_schema("A", JsonSchema::array_of(JsonSchema::reference("B")))
            .with_schema("B", JsonSchema::not(JsonSchema::reference("A")));
        let err = dereference_in(&JsonSchema::reference("A"), &components).unwrap_err();
        assert!(matches!(err, DereferenceError::CyclicReference { ref name, .. } if name == "A"));
        assert_eq!(err.path().to_string(), "#/items/not");
        assert!(dereference_with(&JsonSchema::reference("A"), &components).is_none());
    }

    #[test]
    fn sibling_reuse_is_not_a_cycle() {
        let components = Components::new().with_schema("Id", JsonSchema::integer());
        let schema = JsonSchema::object_of([
            ("a", JsonSchema::reference("Id")),
            ("b", JsonSchema::reference("Id")),
        ]);
        let resolved = dereference_in(&schema, &components).unwrap();
        assert_eq!(resolved.object_context().unwrap().properties.len(), 2);
    }

    #[test]
    fn additional_properties_schema_is_resolved() {
        let components = Components::new().with_schema("Value", JsonSchema::number());
        let schema = JsonSchema::Object(
            CoreContext::default(),
            ObjectContext::default().additional_properties(AdditionalProperties::Schema(
                Box::new(JsonSchema::reference("Value")),
            )),
        );
        let resolved = dereference_in(&schema, &components).unwrap();
        let context = resolved.object_context().unwrap();
        assert!(matches!(
            &context.additional_properties,
            Some(DereferencedAdditionalProperties::Schema(inner))
                if inner.json_type() == Some(crate::JsonType::Number)
        ));
    }

    #[test]
    fn additional_properties_missing_reference_path() {
        let schema = JsonSchema::Object(
            CoreContext::default(),
            ObjectContext::default().additional_properties(AdditionalProperties::Schema(
                Box::new(JsonSchema::reference("Value")),
            )),
        );
        let err = dereference_in(&schema, &Components::new()).unwrap_err();
        assert_eq!(err.path().last(), Some(&PathSegment::AdditionalProperties));
    }

    #[test]
    fn branch_failure_path_names_combinator_and_index() {
        let schema = JsonSchema::any_of(vec![JsonSchema::boolean(), JsonSchema::reference("Gone")]);
        let err = dereference_in(&schema, &Components::new()).unwrap_err();
        assert_eq!(err.path().to_string(), "#/anyOf/1");
    }

    #[test]
    fn one_of_keeps_combinator_discriminator() {
        let schema = JsonSchema::one_of(vec![JsonSchema::boolean(), JsonSchema::string()])
            .with_discriminator(Discriminator::new("kind"));
        let resolved = dereference(&schema).unwrap();
        match resolved {
            DereferencedSchema::OneOf { of, discriminator } => {
                assert_eq!(of.len(), 2);
                assert_eq!(discriminator, Some(Discriminator::new("kind")));
            }
            other => panic!("expected oneOf, got {:?}", other),
        }
    }
}
