//! `allOf` collapse.
//!
//! Resolved `allOf` branches are folded left to right into one schema:
//! - no branches: `undefined` with no description
//! - one branch: that branch unchanged
//! - several branches: all typed branches must share one JSON type. Core
//!   metadata is last-writer-wins (an absent optional field does not
//!   overwrite). Numeric and string constraints are last-writer-wins too.
//!   Array and object constraints are unioned, keeping the most permissive
//!   bound. `undefined` branches only contribute their description.
//!
//! A discriminator on the `allOf` node itself overrides whatever the
//! collapsed schema carries. Annotations written next to the `allOf` keyword
//! are applied last.

use log::debug;

use crate::dereferenced::{
    DereferencedAdditionalProperties, DereferencedArrayContext, DereferencedObjectContext,
    DereferencedSchema,
};
use crate::error::DereferenceError;
use crate::schema::{
    Annotations, CoreContext, Discriminator, IntegerContext, NumericContext, StringContext,
};
use crate::types::{PathSegment, SchemaPath};

/// Collapse already-resolved `allOf` branches into one schema.
pub(crate) fn collapse_all_of(
    branches: Vec<DereferencedSchema>,
    discriminator: Option<&Discriminator>,
    path: &SchemaPath,
) -> Result<DereferencedSchema, DereferenceError> {
    debug!("collapsing allOf with {} branch(es) at {}", branches.len(), path);

    let mut iter = branches.into_iter();
    let Some(first) = iter.next() else {
        return Ok(DereferencedSchema::Undefined { description: None });
    };

    let mut merged = first;
    for branch in iter {
        merged = merge_schemas(merged, branch, path)?;
    }

    if let Some(discriminator) = discriminator {
        apply_discriminator(&mut merged, discriminator);
    }

    Ok(merged)
}

/// Apply core metadata written next to the `allOf` keyword.
///
/// Typed results take every present field; `undefined` only takes the
/// description. `not`, `oneOf` and `anyOf` have no core context and are left
/// unchanged.
pub(crate) fn apply_annotations(schema: &mut DereferencedSchema, annotations: &Annotations) {
    match schema {
        DereferencedSchema::Undefined { description } => {
            if annotations.description.is_some() {
                description.clone_from(&annotations.description);
            }
        }
        other => {
            if let Some(core) = other.core_context_mut() {
                annotations.apply_to(core);
            }
        }
    }
}

fn apply_discriminator(schema: &mut DereferencedSchema, discriminator: &Discriminator) {
    match schema {
        DereferencedSchema::OneOf { discriminator: d, .. }
        | DereferencedSchema::AnyOf { discriminator: d, .. } => {
            *d = Some(discriminator.clone());
        }
        other => {
            // undefined and not have nowhere to keep it, so it is dropped
            if let Some(core) = other.core_context_mut() {
                core.discriminator = Some(discriminator.clone());
            }
        }
    }
}

fn merge_schemas(
    acc: DereferencedSchema,
    next: DereferencedSchema,
    path: &SchemaPath,
) -> Result<DereferencedSchema, DereferenceError> {
    use DereferencedSchema as S;

    match (acc, next) {
        (S::Undefined { description: a }, S::Undefined { description: b }) => {
            Ok(S::Undefined {
                description: b.or(a),
            })
        }
        (S::Undefined { description }, mut typed) => {
            // Earlier write; the typed branch's own description wins
            if let Some(core) = typed.core_context_mut() {
                if core.description.is_none() {
                    core.description = description;
                }
            }
            Ok(typed)
        }
        (mut typed, S::Undefined { description }) => {
            if let (Some(core), Some(description)) = (typed.core_context_mut(), description) {
                core.description = Some(description);
            }
            Ok(typed)
        }

        (S::Boolean(a), S::Boolean(b)) => Ok(S::Boolean(merge_core(a, b))),
        (S::Number(ca, a), S::Number(cb, b)) => {
            Ok(S::Number(merge_core(ca, cb), merge_numeric(a, b)))
        }
        (S::Integer(ca, a), S::Integer(cb, b)) => {
            Ok(S::Integer(merge_core(ca, cb), merge_integer(a, b)))
        }
        (S::String(ca, a), S::String(cb, b)) => {
            Ok(S::String(merge_core(ca, cb), merge_string(a, b)))
        }
        (S::Array(ca, a), S::Array(cb, b)) => {
            Ok(S::Array(merge_core(ca, cb), merge_array(a, b, path)?))
        }
        (S::Object(ca, a), S::Object(cb, b)) => {
            Ok(S::Object(merge_core(ca, cb), merge_object(a, b, path)?))
        }

        (a, b) => Err(DereferenceError::InconsistentCombinator {
            path: path.clone(),
            detail: format!(
                "allOf cannot combine a {} fragment with a {} fragment",
                a.kind_name(),
                b.kind_name()
            ),
        }),
    }
}

fn merge_core(mut acc: CoreContext, next: CoreContext) -> CoreContext {
    acc.required = next.required;
    acc.nullable = next.nullable;
    acc.read_only = next.read_only;
    acc.write_only = next.write_only;
    acc.deprecated = next.deprecated;
    acc.format = next.format.or(acc.format);
    acc.title = next.title.or(acc.title);
    acc.description = next.description.or(acc.description);
    acc.discriminator = next.discriminator.or(acc.discriminator);
    acc.default = next.default.or(acc.default);
    acc.example = next.example.or(acc.example);
    acc.allowed_values = next.allowed_values.or(acc.allowed_values);
    acc
}

fn merge_numeric(acc: NumericContext, next: NumericContext) -> NumericContext {
    NumericContext {
        multiple_of: next.multiple_of.or(acc.multiple_of),
        maximum: next.maximum.or(acc.maximum),
        minimum: next.minimum.or(acc.minimum),
    }
}

fn merge_integer(acc: IntegerContext, next: IntegerContext) -> IntegerContext {
    IntegerContext {
        multiple_of: next.multiple_of.or(acc.multiple_of),
        maximum: next.maximum.or(acc.maximum),
        minimum: next.minimum.or(acc.minimum),
    }
}

fn merge_string(acc: StringContext, next: StringContext) -> StringContext {
    StringContext {
        max_length: next.max_length.or(acc.max_length),
        min_length: next.min_length.or(acc.min_length),
        pattern: next.pattern.or(acc.pattern),
    }
}

fn merge_array(
    acc: DereferencedArrayContext,
    next: DereferencedArrayContext,
    path: &SchemaPath,
) -> Result<DereferencedArrayContext, DereferenceError> {
    let items = match (acc.items, next.items) {
        (Some(a), Some(b)) => Some(Box::new(merge_schemas(
            *a,
            *b,
            &path.join(PathSegment::Items),
        )?)),
        (a, b) => a.or(b),
    };

    Ok(DereferencedArrayContext {
        items,
        max_items: loosest_upper(acc.max_items, next.max_items),
        min_items: loosest_lower(acc.min_items, next.min_items),
        unique_items: acc.unique_items && next.unique_items,
    })
}

fn merge_object(
    mut acc: DereferencedObjectContext,
    next: DereferencedObjectContext,
    path: &SchemaPath,
) -> Result<DereferencedObjectContext, DereferenceError> {
    for (name, schema) in next.properties {
        let merged = match acc.properties.get(&name) {
            Some(existing) => merge_schemas(existing.clone(), schema, &path.property(name.clone()))?,
            None => schema,
        };
        // Re-inserting an existing key keeps its original position
        acc.properties.insert(name, merged);
    }

    for name in next.required {
        if !acc.required.contains(&name) {
            acc.required.push(name);
        }
    }

    Ok(DereferencedObjectContext {
        properties: acc.properties,
        required: acc.required,
        additional_properties: merge_additional_properties(
            acc.additional_properties,
            next.additional_properties,
            path,
        )?,
        max_properties: loosest_upper(acc.max_properties, next.max_properties),
        min_properties: loosest_lower(acc.min_properties, next.min_properties),
    })
}

fn merge_additional_properties(
    acc: Option<DereferencedAdditionalProperties>,
    next: Option<DereferencedAdditionalProperties>,
    path: &SchemaPath,
) -> Result<Option<DereferencedAdditionalProperties>, DereferenceError> {
    use DereferencedAdditionalProperties::{Allowed, Schema};

    match (acc, next) {
        // Unspecified already allows anything
        (None, _) | (_, None) => Ok(None),
        (Some(Allowed(true)), _) | (_, Some(Allowed(true))) => Ok(Some(Allowed(true))),
        (Some(Allowed(false)), Some(other)) | (Some(other), Some(Allowed(false))) => {
            Ok(Some(other))
        }
        (Some(Schema(a)), Some(Schema(b))) => {
            let merged = merge_schemas(*a, *b, &path.join(PathSegment::AdditionalProperties))?;
            Ok(Some(Schema(Box::new(merged))))
        }
    }
}

/// Missing means unbounded, which is the loosest upper bound.
fn loosest_upper(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        _ => None,
    }
}

fn loosest_lower(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        _ => None,
    }
}
