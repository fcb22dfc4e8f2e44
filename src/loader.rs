//! Document loading - reads OpenAPI / JSON Schema documents into the schema
//! model.
//!
//! Components are collected from `components.schemas`, `$defs` and
//! `definitions`. Only local component references are understood:
//! `#/components/schemas/Name`, `#/$defs/Name` and `#/definitions/Name`.

use std::path::Path;

use indexmap::IndexMap;
use log::warn;
use serde_json::{Map, Value};

use crate::components::Components;
use crate::error::LoadError;
use crate::schema::{
    AdditionalProperties, Annotations, ArrayContext, Bound, CoreContext, Discriminator,
    IntegerContext, JsonSchema, NumericContext, ObjectContext, StringContext,
};
use crate::types::{Combinator, JsonType};

/// Prefixes of `$ref` values that name a component.
const COMPONENT_PREFIXES: &[&str] = &["#/components/schemas/", "#/$defs/", "#/definitions/"];

/// A loaded document: its component table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub components: Components,
}

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// `LoadError::InvalidJson` if it isn't valid JSON, or a schema error if a
/// component cannot be parsed.
pub fn load_document(path: &Path) -> Result<Document, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content)
}

/// Load a document from a JSON string.
pub fn load_document_str(content: &str) -> Result<Document, LoadError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    parse_document(&value)
}

/// Read a JSON payload (for validation) from a file path.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

/// Collect every component schema of a parsed document.
pub fn parse_document(value: &Value) -> Result<Document, LoadError> {
    let Some(root) = value.as_object() else {
        return Err(invalid("#", format!("expected object, got {}", json_type_name(value))));
    };

    let mut components = Components::new();

    let sources = [
        (
            root.get("components").and_then(|c| c.get("schemas")),
            "#/components/schemas",
        ),
        (root.get("$defs"), "#/$defs"),
        (root.get("definitions"), "#/definitions"),
    ];

    for (source, base) in sources {
        let Some(source) = source else {
            continue;
        };
        let Some(schemas) = source.as_object() else {
            return Err(invalid(
                base,
                format!("expected object, got {}", json_type_name(source)),
            ));
        };
        for (name, schema) in schemas {
            let path = format!("{}/{}", base, escape(name));
            // All three sections share one namespace
            if components.contains(name) {
                return Err(invalid(
                    &path,
                    format!("component '{}' is defined more than once", name),
                ));
            }
            components.insert(name.clone(), parse_schema_at(schema, &path)?);
        }
    }

    Ok(Document { components })
}

/// Parse a single schema value.
pub fn parse_schema(value: &Value) -> Result<JsonSchema, LoadError> {
    parse_schema_at(value, "#")
}

// --- Internal implementation ---

fn parse_schema_at(value: &Value, path: &str) -> Result<JsonSchema, LoadError> {
    match value {
        Value::Bool(true) => Ok(JsonSchema::undefined(None)),
        Value::Bool(false) => Ok(JsonSchema::not(JsonSchema::undefined(None))),
        Value::Object(map) => parse_schema_object(map, path),
        other => Err(invalid(
            path,
            format!("expected object or boolean, got {}", json_type_name(other)),
        )),
    }
}

fn parse_schema_object(map: &Map<String, Value>, path: &str) -> Result<JsonSchema, LoadError> {
    if let Some(reference) = map.get("$ref") {
        let Some(reference) = reference.as_str() else {
            return Err(invalid(
                &format!("{}/$ref", path),
                format!("expected string, got {}", json_type_name(reference)),
            ));
        };
        return parse_reference(reference, path);
    }

    if let Some(combinator) = parse_combinator(map, path)? {
        return Ok(combinator);
    }

    if let Some(inner) = map.get("not") {
        return Ok(JsonSchema::not(parse_schema_at(inner, &format!("{}/not", path))?));
    }

    let (json_type, nullable) = parse_type(map, path)?;
    let Some(json_type) = json_type else {
        let description = get_str(map, "description", path)?.map(String::from);
        return Ok(JsonSchema::Undefined { description });
    };

    let mut core = parse_core(map, path)?;
    core.nullable = core.nullable || nullable;

    Ok(match json_type {
        JsonType::Boolean => JsonSchema::Boolean(core),
        JsonType::Number => JsonSchema::Number(core, parse_numeric(map, path)?),
        JsonType::Integer => JsonSchema::Integer(core, parse_integer(map, path)?),
        JsonType::String => JsonSchema::String(core, parse_string(map, path)?),
        JsonType::Array => JsonSchema::Array(core, parse_array(map, path)?),
        JsonType::Object => JsonSchema::Object(core, parse_object(map, path)?),
    })
}

fn parse_reference(reference: &str, path: &str) -> Result<JsonSchema, LoadError> {
    COMPONENT_PREFIXES
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))
        .filter(|name| !name.is_empty() && !name.contains('/'))
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        .map(|name| JsonSchema::reference(name.replace("~1", "/").replace("~0", "~")))
        .ok_or_else(|| LoadError::UnsupportedReference {
            path: path.to_string(),
            reference: reference.to_string(),
        })
}

fn parse_combinator(
    map: &Map<String, Value>,
    path: &str,
) -> Result<Option<JsonSchema>, LoadError> {
    let present: Vec<Combinator> = [Combinator::AllOf, Combinator::OneOf, Combinator::AnyOf]
        .into_iter()
        .filter(|c| map.contains_key(c.keyword()))
        .collect();

    let kind = match present.as_slice() {
        [] => return Ok(None),
        [kind] => *kind,
        _ => {
            return Err(invalid(
                path,
                "only one of allOf, oneOf and anyOf may appear on a schema".to_string(),
            ))
        }
    };

    let keyword_path = format!("{}/{}", path, kind.keyword());
    let Some(branches) = map.get(kind.keyword()).and_then(Value::as_array) else {
        return Err(invalid(&keyword_path, "expected array".to_string()));
    };

    let mut of = branches
        .iter()
        .enumerate()
        .map(|(i, branch)| parse_schema_at(branch, &format!("{}/{}", keyword_path, i)))
        .collect::<Result<Vec<_>, _>>()?;

    let discriminator = parse_discriminator(map, path)?;

    let rest: Map<String, Value> = map
        .iter()
        .filter(|(k, _)| k.as_str() != kind.keyword() && k.as_str() != "discriminator")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    // Sibling constraints are one more conjunct; sibling metadata is kept apart
    let constraints: Map<String, Value> = rest
        .iter()
        .filter(|(k, _)| !ANNOTATION_KEYWORDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let conjunct = if constraints.is_empty() {
        None
    } else {
        Some(parse_schema_object(&constraints, path)?)
    };
    let annotations = parse_annotations(&rest, path)?;

    if kind == Combinator::AllOf {
        of.extend(conjunct);
        return Ok(Some(JsonSchema::AllOf {
            of,
            discriminator,
            annotations,
        }));
    }

    if annotations.is_some() {
        warn!(
            "ignoring metadata next to {} at {}: the combinator has no core context",
            kind.keyword(),
            path
        );
    }

    // S and (A or B) is (S and A) or (S and B)
    if let Some(conjunct) = conjunct {
        of = of
            .into_iter()
            .map(|branch| JsonSchema::all_of(vec![conjunct.clone(), branch]))
            .collect();
    }

    Ok(Some(JsonSchema::combinator(kind, of, discriminator)))
}

/// Keywords that describe a schema without constraining it by themselves.
/// Next to a combinator they become [`Annotations`].
const ANNOTATION_KEYWORDS: &[&str] = &[
    "title",
    "description",
    "example",
    "examples",
    "$comment",
    "deprecated",
    "nullable",
    "readOnly",
    "writeOnly",
    "default",
    "format",
    "enum",
];

fn parse_annotations(
    map: &Map<String, Value>,
    path: &str,
) -> Result<Option<Annotations>, LoadError> {
    let annotations = Annotations {
        nullable: get_bool(map, "nullable", path)?,
        read_only: get_bool(map, "readOnly", path)?,
        write_only: get_bool(map, "writeOnly", path)?,
        deprecated: get_bool(map, "deprecated", path)?,
        format: get_str(map, "format", path)?.map(String::from),
        title: get_str(map, "title", path)?.map(String::from),
        description: get_str(map, "description", path)?.map(String::from),
        default: map.get("default").cloned(),
        example: map.get("example").cloned(),
        allowed_values: parse_enum(map, path)?,
    };
    Ok((!annotations.is_empty()).then_some(annotations))
}

/// Keywords that only apply to objects; an untyped schema using one is an
/// object schema.
const OBJECT_KEYWORDS: &[&str] = &[
    "properties",
    "additionalProperties",
    "required",
    "maxProperties",
    "minProperties",
];

const ARRAY_KEYWORDS: &[&str] = &["items", "maxItems", "minItems", "uniqueItems"];

/// Returns the declared type and whether `"null"` was among the types.
fn parse_type(
    map: &Map<String, Value>,
    path: &str,
) -> Result<(Option<JsonType>, bool), LoadError> {
    let type_path = format!("{}/type", path);

    match map.get("type") {
        Some(Value::String(name)) => match JsonType::parse(name) {
            Some(t) => Ok((Some(t), false)),
            None => Err(invalid(&type_path, format!("unknown type \"{}\"", name))),
        },
        Some(Value::Array(names)) => {
            let mut nullable = false;
            let mut types = Vec::new();
            for name in names {
                match name.as_str() {
                    Some("null") => nullable = true,
                    Some(other) => match JsonType::parse(other) {
                        Some(t) => types.push(t),
                        None => {
                            return Err(invalid(&type_path, format!("unknown type \"{}\"", other)))
                        }
                    },
                    None => {
                        return Err(invalid(
                            &type_path,
                            format!("expected string, got {}", json_type_name(name)),
                        ))
                    }
                }
            }
            match types.as_slice() {
                [t] => Ok((Some(*t), nullable)),
                [] => Err(invalid(&type_path, "a null-only type is not supported".to_string())),
                _ => Err(invalid(
                    &type_path,
                    "multiple non-null types are not supported; use oneOf".to_string(),
                )),
            }
        }
        Some(other) => Err(invalid(
            &type_path,
            format!("expected string or array, got {}", json_type_name(other)),
        )),
        None => {
            // Infer from structural keywords
            let has_any = |keys: &[&str]| keys.iter().any(|k| map.contains_key(*k));
            if has_any(OBJECT_KEYWORDS) {
                Ok((Some(JsonType::Object), false))
            } else if has_any(ARRAY_KEYWORDS) {
                Ok((Some(JsonType::Array), false))
            } else {
                Ok((None, false))
            }
        }
    }
}

fn parse_core(map: &Map<String, Value>, path: &str) -> Result<CoreContext, LoadError> {
    let mut core = CoreContext::default();
    core.nullable = get_bool(map, "nullable", path)?.unwrap_or(false);
    core.read_only = get_bool(map, "readOnly", path)?.unwrap_or(false);
    core.write_only = get_bool(map, "writeOnly", path)?.unwrap_or(false);
    core.deprecated = get_bool(map, "deprecated", path)?.unwrap_or(false);
    core.format = get_str(map, "format", path)?.map(String::from);
    core.title = get_str(map, "title", path)?.map(String::from);
    core.description = get_str(map, "description", path)?.map(String::from);
    core.discriminator = parse_discriminator(map, path)?;
    core.default = map.get("default").cloned();
    core.example = map.get("example").cloned();
    core.allowed_values = parse_enum(map, path)?;
    Ok(core)
}

fn parse_enum(map: &Map<String, Value>, path: &str) -> Result<Option<Vec<Value>>, LoadError> {
    match map.get("enum") {
        None => Ok(None),
        Some(Value::Array(values)) => Ok(Some(values.clone())),
        Some(other) => Err(invalid(
            &format!("{}/enum", path),
            format!("expected array, got {}", json_type_name(other)),
        )),
    }
}

fn parse_discriminator(
    map: &Map<String, Value>,
    path: &str,
) -> Result<Option<Discriminator>, LoadError> {
    map.get("discriminator")
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|e| {
                invalid(&format!("{}/discriminator", path), e.to_string())
            })
        })
        .transpose()
}

fn parse_numeric(map: &Map<String, Value>, path: &str) -> Result<NumericContext, LoadError> {
    Ok(NumericContext {
        multiple_of: get_f64(map, "multipleOf", path)?,
        maximum: parse_bound(map, Side::Upper, path, get_f64)?,
        minimum: parse_bound(map, Side::Lower, path, get_f64)?,
    })
}

fn parse_integer(map: &Map<String, Value>, path: &str) -> Result<IntegerContext, LoadError> {
    Ok(IntegerContext {
        multiple_of: get_i64(map, "multipleOf", path)?,
        maximum: parse_bound(map, Side::Upper, path, get_i64)?,
        minimum: parse_bound(map, Side::Lower, path, get_i64)?,
    })
}

#[derive(Clone, Copy)]
enum Side {
    Lower,
    Upper,
}

/// Reads `key` plus its exclusive flag in either form: the boolean modifier
/// (OpenAPI 3.0) or a standalone numeric bound (JSON Schema 2020-12). When
/// both an inclusive and a numeric exclusive bound are given, the tighter
/// one is kept.
fn parse_bound<T: PartialOrd>(
    map: &Map<String, Value>,
    side: Side,
    path: &str,
    read: fn(&Map<String, Value>, &str, &str) -> Result<Option<T>, LoadError>,
) -> Result<Option<Bound<T>>, LoadError> {
    let (key, exclusive_key) = match side {
        Side::Lower => ("minimum", "exclusiveMinimum"),
        Side::Upper => ("maximum", "exclusiveMaximum"),
    };
    let value = read(map, key, path)?;
    match map.get(exclusive_key) {
        Some(Value::Bool(exclusive)) => Ok(value.map(|value| Bound {
            value,
            exclusive: *exclusive,
        })),
        Some(Value::Number(_)) => {
            let exclusive = read(map, exclusive_key, path)?;
            Ok(match (value, exclusive) {
                (Some(inclusive), Some(exclusive)) => {
                    let exclusive_is_tighter = match side {
                        Side::Lower => exclusive >= inclusive,
                        Side::Upper => exclusive <= inclusive,
                    };
                    if exclusive_is_tighter {
                        Some(Bound::exclusive(exclusive))
                    } else {
                        Some(Bound::inclusive(inclusive))
                    }
                }
                (inclusive, exclusive) => exclusive
                    .map(Bound::exclusive)
                    .or(inclusive.map(Bound::inclusive)),
            })
        }
        Some(other) => Err(invalid(
            &format!("{}/{}", path, exclusive_key),
            format!("expected boolean or number, got {}", json_type_name(other)),
        )),
        None => Ok(value.map(Bound::inclusive)),
    }
}

fn parse_string(map: &Map<String, Value>, path: &str) -> Result<StringContext, LoadError> {
    Ok(StringContext {
        max_length: get_usize(map, "maxLength", path)?,
        min_length: get_usize(map, "minLength", path)?,
        pattern: get_str(map, "pattern", path)?.map(String::from),
    })
}

fn parse_array(map: &Map<String, Value>, path: &str) -> Result<ArrayContext, LoadError> {
    let items = map
        .get("items")
        .map(|items| parse_schema_at(items, &format!("{}/items", path)))
        .transpose()?
        .map(Box::new);

    Ok(ArrayContext {
        items,
        max_items: get_usize(map, "maxItems", path)?,
        min_items: get_usize(map, "minItems", path)?,
        unique_items: get_bool(map, "uniqueItems", path)?.unwrap_or(false),
    })
}

fn parse_object(map: &Map<String, Value>, path: &str) -> Result<ObjectContext, LoadError> {
    let required: Vec<String> = match map.get("required") {
        None => Vec::new(),
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| {
                name.as_str().map(String::from).ok_or_else(|| {
                    invalid(
                        &format!("{}/required", path),
                        format!("expected string, got {}", json_type_name(name)),
                    )
                })
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(invalid(
                &format!("{}/required", path),
                format!("expected array, got {}", json_type_name(other)),
            ))
        }
    };

    let mut properties = IndexMap::new();
    if let Some(props) = map.get("properties") {
        let props_path = format!("{}/properties", path);
        let Some(props) = props.as_object() else {
            return Err(invalid(
                &props_path,
                format!("expected object, got {}", json_type_name(props)),
            ));
        };
        for (name, schema) in props {
            let mut parsed = parse_schema_at(schema, &format!("{}/{}", props_path, escape(name)))?;
            if !required.contains(name) {
                parsed = parsed.optional();
            }
            properties.insert(name.clone(), parsed);
        }
    }

    let additional_properties = match map.get("additionalProperties") {
        None => None,
        Some(Value::Bool(allowed)) => Some(AdditionalProperties::Allowed(*allowed)),
        Some(schema) => Some(AdditionalProperties::Schema(Box::new(parse_schema_at(
            schema,
            &format!("{}/additionalProperties", path),
        )?))),
    };

    Ok(ObjectContext {
        properties,
        required,
        additional_properties,
        max_properties: get_usize(map, "maxProperties", path)?,
        min_properties: get_usize(map, "minProperties", path)?,
    })
}

fn get_str<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'a str>, LoadError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(wrong_type(path, key, "string", other)),
    }
}

fn get_bool(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<bool>, LoadError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(wrong_type(path, key, "boolean", other)),
    }
}

fn get_f64(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<f64>, LoadError> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| wrong_type(path, key, "number", value)),
    }
}

fn get_i64(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<i64>, LoadError> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| wrong_type(path, key, "integer", value)),
    }
}

fn get_usize(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<usize>, LoadError> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| wrong_type(path, key, "non-negative integer", value)),
    }
}

fn wrong_type(path: &str, key: &str, expected: &str, actual: &Value) -> LoadError {
    invalid(
        &format!("{}/{}", path, key),
        format!("expected {}, got {}", expected, json_type_name(actual)),
    )
}

fn invalid(path: &str, message: String) -> LoadError {
    LoadError::InvalidSchema {
        path: path.to_string(),
        message,
    }
}

/// JSON Pointer escaping (~ = ~0, / = ~1).
fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
