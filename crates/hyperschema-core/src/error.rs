//! # Error Types
//!
//! One enum covers every failure the core can report. Each variant maps to
//! exactly one HTTP outcome at the API layer:
//!
//! | Variant                 | Meaning                                        |
//! |-------------------------|------------------------------------------------|
//! | `UnsupportedMediaType`  | request body type is not consumed (415)        |
//! | `NotAcceptable`         | strict negotiation found no overlap (406)      |
//! | `SchemaNotFound`        | no schema file with that name (404)            |
//! | `PayloadParse`          | request body is not decodable JSON (400)       |
//! | `Validation`            | body violates its schema (400)                 |
//! | `Schema` / `SchemaParse`| schema document itself is broken (500)         |
//! | `Io`                    | backing store could not be read (500)          |

use serde_json::Value;
use thiserror::Error;

/// A request payload that violated a rule of its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    /// Human-readable description of the violation.
    pub message: String,
    /// The schema the payload was validated against.
    pub schema: Value,
    /// JSON Pointer to the violated rule inside `schema`.
    pub schema_path: String,
    /// JSON Pointer to the offending location inside the payload.
    pub instance_path: String,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationFailure {}

/// A schema document that is not itself a valid schema.
///
/// Raised when the document fails its meta-schema, which is an authoring bug
/// on the server side rather than a client error.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFailure {
    /// Human-readable description of the defect.
    pub message: String,
    /// The offending schema document.
    pub schema: Value,
    /// JSON Pointer to the defective keyword.
    pub schema_path: String,
    /// Diagnostic trace for operators.
    pub trace: String,
}

impl std::fmt::Display for SchemaFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SchemaFailure {}

/// Errors returned by schema loading, negotiation and body validation.
#[derive(Error, Debug)]
pub enum HyperSchemaError {
    /// The request's declared media type is not one the endpoint consumes.
    #[error("unsupported media type: {0:?}")]
    UnsupportedMediaType(String),

    /// None of the client's acceptable media types is offered.
    #[error("none of the accepted media types [{}] is offered", .0.join(", "))]
    NotAcceptable(Vec<String>),

    /// No schema with the given name exists in the backing store.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// The schema file exists but its substituted text is not valid JSON.
    #[error("failed to parse schema {name}: {reason}")]
    SchemaParse {
        /// Schema name.
        name: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The request payload could not be decoded.
    #[error("malformed payload: {0}")]
    PayloadParse(String),

    /// The request payload violates its schema.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    /// The schema document is invalid against its meta-schema.
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaFailure),

    /// I/O error reading the backing store.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl HyperSchemaError {
    /// Whether this error describes a server-side defect rather than a bad request.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaParse { .. } | Self::Schema(_) | Self::Io { .. }
        )
    }
}
