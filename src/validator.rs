//! Payload validation against dereferenced schemas.

use serde_json::Value;

use crate::components::ComponentLookup;
use crate::dereferenced::DereferencedSchema;
use crate::error::{SchemaError, ValidateError};
use crate::render::to_json_schema;
use crate::resolver::dereference_in;
use crate::schema::JsonSchema;

/// Validate a payload against a schema that may contain references.
///
/// Dereferences the schema strictly, then validates the payload against the
/// result.
///
/// # Errors
///
/// Returns `ValidateError::Dereference` if the schema cannot be dereferenced,
/// or `ValidateError::Invalid` if the payload doesn't match the schema.
pub fn validate<C>(schema: &JsonSchema, components: &C, payload: &Value) -> Result<(), ValidateError>
where
    C: ComponentLookup + ?Sized,
{
    let dereferenced = dereference_in(schema, components)?;
    validate_instance(&dereferenced, payload)
}

/// Validate a payload against an already-dereferenced schema.
///
/// Use this when validating many payloads against one schema.
pub fn validate_instance(schema: &DereferencedSchema, payload: &Value) -> Result<(), ValidateError> {
    let rendered = to_json_schema(schema);
    let validator = jsonschema::validator_for(&rendered).map_err(|e| {
        ValidateError::InvalidSchema {
            message: e.to_string(),
        }
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
