//! Error types for dereferencing, document loading and payload validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::SchemaPath;

/// Why a schema could not be fully dereferenced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DereferenceError {
    #[error("component '{name}' referenced at {path} not found")]
    MissingReference { name: String, path: SchemaPath },

    #[error("inconsistent combinator at {path}: {detail}")]
    InconsistentCombinator { path: SchemaPath, detail: String },

    #[error("cyclic reference to component '{name}' at {path}")]
    CyclicReference { name: String, path: SchemaPath },
}

impl DereferenceError {
    /// Location of the failing node, relative to the resolution root.
    pub fn path(&self) -> &SchemaPath {
        match self {
            DereferenceError::MissingReference { path, .. }
            | DereferenceError::InconsistentCombinator { path, .. }
            | DereferenceError::CyclicReference { path, .. } => path,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            DereferenceError::MissingReference { .. } => "missing-reference",
            DereferenceError::InconsistentCombinator { .. } => "inconsistent-combinator",
            DereferenceError::CyclicReference { .. } => "cyclic-reference",
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while reading a schema document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },

    #[error("unsupported $ref \"{reference}\" at {path}: only local component references are supported")]
    UnsupportedReference { path: String, reference: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Dereference(#[from] DereferenceError),

    #[error("rendered schema rejected by validator: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Dereference(e) => e.exit_code(),
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
