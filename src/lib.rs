//! Schema Dereferencer
//!
//! Produces reference-free views of OpenAPI / JSON Schema component schemas
//! for consumers that cannot deal with indirection (code generators,
//! validators, documentation renderers).
//!
//! Dereferencing replaces every reference with the component it names,
//! transitively, and collapses every `allOf` into one representative schema.
//! `oneOf`, `anyOf` and `not` keep their shape with resolved branches.
//!
//! # Example
//!
//! ```
//! use schema_deref::{Components, DereferencedSchema, JsonSchema};
//!
//! let components = Components::new().with_schema("Name", JsonSchema::string());
//! let schema = JsonSchema::object_of([("name", JsonSchema::reference("Name"))]);
//!
//! let resolved = schema.dereferenced_in(&components).unwrap();
//! let properties = &resolved.object_context().unwrap().properties;
//! assert!(matches!(properties["name"], DereferencedSchema::String(..)));
//!
//! // Without components the reference cannot be followed
//! assert!(schema.dereferenced().is_none());
//! ```
//!
//! # Modes
//!
//! | Entry point | Result on failure |
//! |-------------|-------------------|
//! | [`dereference`] / [`JsonSchema::dereferenced`] | `None` (no components) |
//! | [`dereference_with`] | `None` |
//! | [`dereference_in`] / [`JsonSchema::dereferenced_in`] | [`DereferenceError`] with path |
//!
//! Both modes run the same algorithm and produce equal trees whenever both
//! succeed. Resolution is all-or-nothing.

mod checker;
mod components;
mod dereferenced;
mod error;
mod loader;
mod merge;
mod render;
mod resolver;
mod schema;
mod types;
mod validator;

pub use checker::{check_components, CheckReport, ComponentResult, ComponentStatus, Diagnostic};
pub use components::{ComponentLookup, Components};
pub use dereferenced::{
    DereferencedAdditionalProperties, DereferencedArrayContext, DereferencedObjectContext,
    DereferencedSchema,
};
pub use error::{DereferenceError, LoadError, SchemaError, ValidateError};
pub use loader::{load_document, load_document_str, load_json, parse_document, parse_schema, Document};
pub use render::to_json_schema;
pub use resolver::{dereference, dereference_in, dereference_with};
pub use schema::{
    AdditionalProperties, Annotations, ArrayContext, Bound, CoreContext, Discriminator,
    IntegerContext, JsonSchema, NumericContext, ObjectContext, StringContext,
};
pub use types::{Combinator, JsonType, PathSegment, SchemaPath};
pub use validator::{validate, validate_instance};
