//! Render dereferenced schemas back to plain JSON Schema.

use serde_json::{Map, Value};

use crate::dereferenced::{
    DereferencedAdditionalProperties, DereferencedArrayContext, DereferencedObjectContext,
    DereferencedSchema,
};
use crate::schema::{Bound, CoreContext, Discriminator, IntegerContext, NumericContext, StringContext};
use crate::types::JsonType;

/// Convert a dereferenced schema into a JSON Schema document.
///
/// `nullable` becomes a `["type", "null"]` type array; the OpenAPI
/// `discriminator` keyword is kept as-is.
pub fn to_json_schema(schema: &DereferencedSchema) -> Value {
    let mut map = Map::new();

    match schema {
        DereferencedSchema::Boolean(core) => {
            write_core(&mut map, JsonType::Boolean, core);
        }
        DereferencedSchema::Number(core, context) => {
            write_core(&mut map, JsonType::Number, core);
            write_numeric(&mut map, context);
        }
        DereferencedSchema::Integer(core, context) => {
            write_core(&mut map, JsonType::Integer, core);
            write_integer(&mut map, context);
        }
        DereferencedSchema::String(core, context) => {
            write_core(&mut map, JsonType::String, core);
            write_string(&mut map, context);
        }
        DereferencedSchema::Array(core, context) => {
            write_core(&mut map, JsonType::Array, core);
            write_array(&mut map, context);
        }
        DereferencedSchema::Object(core, context) => {
            write_core(&mut map, JsonType::Object, core);
            write_object(&mut map, context);
        }
        DereferencedSchema::Undefined { description } => {
            if let Some(description) = description {
                map.insert("description".into(), Value::String(description.clone()));
            }
        }
        DereferencedSchema::Not(inner) => {
            map.insert("not".into(), to_json_schema(inner));
        }
        DereferencedSchema::OneOf { of, discriminator } => {
            map.insert("oneOf".into(), Value::Array(of.iter().map(to_json_schema).collect()));
            if let Some(discriminator) = discriminator {
                write_discriminator(&mut map, discriminator);
            }
        }
        DereferencedSchema::AnyOf { of, discriminator } => {
            map.insert("anyOf".into(), Value::Array(of.iter().map(to_json_schema).collect()));
            if let Some(discriminator) = discriminator {
                write_discriminator(&mut map, discriminator);
            }
        }
    }

    Value::Object(map)
}

fn write_core(map: &mut Map<String, Value>, json_type: JsonType, core: &CoreContext) {
    let type_value = if core.nullable {
        Value::Array(vec![json_type.as_str().into(), "null".into()])
    } else {
        json_type.as_str().into()
    };
    map.insert("type".into(), type_value);

    let strings = [
        ("format", &core.format),
        ("title", &core.title),
        ("description", &core.description),
    ];
    for (key, value) in strings {
        if let Some(value) = value {
            map.insert(key.into(), Value::String(value.clone()));
        }
    }

    let flags = [
        ("deprecated", core.deprecated),
        ("readOnly", core.read_only),
        ("writeOnly", core.write_only),
    ];
    for (key, set) in flags {
        if set {
            map.insert(key.into(), Value::Bool(true));
        }
    }

    if let Some(default) = &core.default {
        map.insert("default".into(), default.clone());
    }
    if let Some(example) = &core.example {
        map.insert("example".into(), example.clone());
    }
    if let Some(values) = &core.allowed_values {
        map.insert("enum".into(), Value::Array(values.clone()));
    }
    if let Some(discriminator) = &core.discriminator {
        write_discriminator(map, discriminator);
    }
}

fn write_discriminator(map: &mut Map<String, Value>, discriminator: &Discriminator) {
    if let Ok(value) = serde_json::to_value(discriminator) {
        map.insert("discriminator".into(), value);
    }
}

fn write_bound<T: Into<Value> + Copy>(
    map: &mut Map<String, Value>,
    bound: Option<Bound<T>>,
    key: &str,
    exclusive_key: &str,
) {
    if let Some(bound) = bound {
        let key = if bound.exclusive { exclusive_key } else { key };
        map.insert(key.into(), bound.value.into());
    }
}

fn write_numeric(map: &mut Map<String, Value>, context: &NumericContext) {
    if let Some(multiple_of) = context.multiple_of {
        map.insert("multipleOf".into(), multiple_of.into());
    }
    write_bound(map, context.minimum, "minimum", "exclusiveMinimum");
    write_bound(map, context.maximum, "maximum", "exclusiveMaximum");
}

fn write_integer(map: &mut Map<String, Value>, context: &IntegerContext) {
    if let Some(multiple_of) = context.multiple_of {
        map.insert("multipleOf".into(), multiple_of.into());
    }
    write_bound(map, context.minimum, "minimum", "exclusiveMinimum");
    write_bound(map, context.maximum, "maximum", "exclusiveMaximum");
}

fn write_string(map: &mut Map<String, Value>, context: &StringContext) {
    if let Some(min) = context.min_length {
        map.insert("minLength".into(), min.into());
    }
    if let Some(max) = context.max_length {
        map.insert("maxLength".into(), max.into());
    }
    if let Some(pattern) = &context.pattern {
        map.insert("pattern".into(), Value::String(pattern.clone()));
    }
}

fn write_array(map: &mut Map<String, Value>, context: &DereferencedArrayContext) {
    if let Some(items) = &context.items {
        map.insert("items".into(), to_json_schema(items));
    }
    if let Some(min) = context.min_items {
        map.insert("minItems".into(), min.into());
    }
    if let Some(max) = context.max_items {
        map.insert("maxItems".into(), max.into());
    }
    if context.unique_items {
        map.insert("uniqueItems".into(), Value::Bool(true));
    }
}

fn write_object(map: &mut Map<String, Value>, context: &DereferencedObjectContext) {
    let properties: Map<String, Value> = context
        .properties
        .iter()
        .map(|(name, schema)| (name.clone(), to_json_schema(schema)))
        .collect();
    map.insert("properties".into(), Value::Object(properties));

    if !context.required.is_empty() {
        map.insert(
            "required".into(),
            Value::Array(context.required.iter().cloned().map(Value::String).collect()),
        );
    }

    match &context.additional_properties {
        Some(DereferencedAdditionalProperties::Allowed(allowed)) => {
            map.insert("additionalProperties".into(), Value::Bool(*allowed));
        }
        Some(DereferencedAdditionalProperties::Schema(schema)) => {
            map.insert("additionalProperties".into(), to_json_schema(schema));
        }
        None => {}
    }

    if let Some(min) = context.min_properties {
        map.insert("minProperties".into(), min.into());
    }
    if let Some(max) = context.max_properties {
        map.insert("maxProperties".into(), max.into());
    }
}
