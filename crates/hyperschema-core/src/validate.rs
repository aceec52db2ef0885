//! # Request Body Validation
//!
//! Decodes a request payload according to its declared media type and
//! validates it against the schema mapped to that media type.
//!
//! ## Pipeline
//!
//! ```text
//! declared type ∈ offered?  ──no──▶ UnsupportedMediaType
//!        │ yes
//! decode (raw JSON, or form field `payload`)  ──fail──▶ PayloadParse
//!        │
//! schema mapped?  ──no──▶ accept as-is
//!        │ yes
//! load via SchemaStore, compile  ──fail──▶ Schema / SchemaParse / SchemaNotFound
//!        │
//! first violation?  ──yes──▶ Validation
//!        │ no
//! ValidatedBody
//! ```

use jsonschema::{Draft, Retrieve, Uri};
use serde_json::Value;

use crate::error::{HyperSchemaError, SchemaFailure, ValidationFailure};
use crate::media_type::{MediaTypeMap, MIME_FORM_URLENCODED};
use crate::store::SchemaStore;

/// Form field that carries the JSON document in URL-encoded submissions.
pub const FORM_PAYLOAD_FIELD: &str = "payload";

/// Default mount point of the schema resource; `$ref` targets under
/// `{base_url}{schema_uri}/` are served from the store.
pub const DEFAULT_SCHEMA_URI: &str = "/schemas";

/// Base URI jsonschema assigns to documents without an absolute `$id`.
const DEFAULT_ROOT_URI: &str = "json-schema://";

/// A request body that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBody {
    /// The declared request media type.
    pub media_type: String,
    /// The decoded JSON document.
    pub data: Value,
}

/// Validates request bodies against schemas served by a [`SchemaStore`].
#[derive(Debug, Clone)]
pub struct BodyValidator {
    store: SchemaStore,
    schema_uri: String,
}

impl BodyValidator {
    /// Create a validator backed by `store`, resolving `$ref`s under
    /// [`DEFAULT_SCHEMA_URI`].
    pub fn new(store: SchemaStore) -> Self {
        Self {
            store,
            schema_uri: DEFAULT_SCHEMA_URI.to_string(),
        }
    }

    /// Builder: set the path under which sibling schemas are referenced.
    pub fn with_schema_uri(mut self, schema_uri: impl Into<String>) -> Self {
        self.schema_uri = schema_uri.into();
        self
    }

    /// The backing store.
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Path under which sibling schemas are referenced.
    pub fn schema_uri(&self) -> &str {
        &self.schema_uri
    }

    /// Decode and validate a request body.
    ///
    /// `declared_media_type` must already be reduced to its essence (no
    /// parameters). `base_url` is passed through to the store for
    /// `${base_url}` substitution.
    pub fn validate(
        &self,
        declared_media_type: &str,
        payload: &[u8],
        offered: &MediaTypeMap,
        base_url: Option<&str>,
    ) -> Result<ValidatedBody, HyperSchemaError> {
        if !offered.contains(declared_media_type) {
            return Err(HyperSchemaError::UnsupportedMediaType(
                declared_media_type.to_string(),
            ));
        }

        let data = decode_payload(declared_media_type, payload)?;

        if let Some(schema_name) = offered.schema_for(declared_media_type) {
            let schema = self.store.load(base_url, schema_name)?;
            let retriever = StoreRetriever::new(
                self.store.clone(),
                self.store.resolve_base_url(base_url),
                &self.schema_uri,
            );
            check_instance(&schema, &data, Some(retriever))?;
            tracing::debug!(
                schema = schema_name,
                media_type = declared_media_type,
                "request body validated"
            );
        }

        Ok(ValidatedBody {
            media_type: declared_media_type.to_string(),
            data,
        })
    }
}

/// Decode a payload as JSON.
///
/// URL-encoded forms carry the document in the `payload` field; every other
/// media type is decoded from the raw bytes.
pub fn decode_payload(media_type: &str, payload: &[u8]) -> Result<Value, HyperSchemaError> {
    if media_type.eq_ignore_ascii_case(MIME_FORM_URLENCODED) {
        let field = url::form_urlencoded::parse(payload)
            .find(|(key, _)| key == FORM_PAYLOAD_FIELD)
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| {
                HyperSchemaError::PayloadParse(format!(
                    "form field `{FORM_PAYLOAD_FIELD}` is missing"
                ))
            })?;
        return serde_json::from_str(&field)
            .map_err(|e| HyperSchemaError::PayloadParse(format!("form field `payload`: {e}")));
    }

    serde_json::from_slice(payload).map_err(|e| HyperSchemaError::PayloadParse(e.to_string()))
}

/// Validate `instance` against `schema`, reporting the first violation.
///
/// External `$ref`s are not retrieved; use [`BodyValidator`] to resolve
/// references to sibling schemas in a store.
///
/// # Errors
///
/// - [`HyperSchemaError::Schema`] if `schema` fails its meta-schema or
///   references a document that cannot be resolved.
/// - [`HyperSchemaError::Validation`] if `instance` violates `schema`.
pub fn validate_instance(schema: &Value, instance: &Value) -> Result<(), HyperSchemaError> {
    check_instance(schema, instance, None::<StoreRetriever>)
}

fn check_instance<R: Retrieve + 'static>(
    schema: &Value,
    instance: &Value,
    retriever: Option<R>,
) -> Result<(), HyperSchemaError> {
    let mut options = jsonschema::options();
    options.with_draft(draft_for(schema));
    if let Some(retriever) = retriever {
        options.with_retriever(retriever);
    }
    let validator = options.build(schema).map_err(|e| {
        tracing::error!(error = %e, schema_path = %e.schema_path, "schema failed to compile");
        SchemaFailure {
            message: e.to_string(),
            schema: schema.clone(),
            schema_path: e.schema_path.to_string(),
            trace: format!("{e:#?}"),
        }
    })?;

    let first = validator.iter_errors(instance).next();
    match first {
        None => Ok(()),
        Some(err) => Err(ValidationFailure {
            message: err.to_string(),
            schema: schema.clone(),
            schema_path: err.schema_path.to_string(),
            instance_path: err.instance_path.to_string(),
        }
        .into()),
    }
}

/// Resolves `$ref`s that point into the schema resource by loading the
/// named schema from the store. Every other URI is refused, so validation
/// never touches the network or the wider filesystem.
struct StoreRetriever {
    store: SchemaStore,
    base_url: String,
    prefixes: Vec<String>,
}

impl StoreRetriever {
    fn new(store: SchemaStore, base_url: &str, schema_uri: &str) -> Self {
        let mut prefixes = vec![format!("{base_url}{schema_uri}/")];
        if base_url.is_empty() {
            // `${base_url}` became "", leaving a root-relative reference.
            prefixes.push(format!("{DEFAULT_ROOT_URI}{schema_uri}/"));
        }
        Self {
            store,
            base_url: base_url.to_string(),
            prefixes,
        }
    }

    fn schema_name<'a>(&self, uri: &'a str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .find_map(|prefix| uri.strip_prefix(prefix.as_str()))
            .and_then(|rest| rest.split(['#', '?']).next())
            .filter(|name| !name.is_empty())
    }
}

impl Retrieve for StoreRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri = uri.as_str();
        let name = self
            .schema_name(uri)
            .ok_or_else(|| format!("refusing to retrieve {uri}: not served by the schema store"))?;
        tracing::debug!(schema = name, uri, "resolving schema reference from store");
        let schema = self.store.load(Some(&self.base_url), name)?;
        Ok(schema.as_ref().clone())
    }
}

/// Pick the JSON Schema draft from a document's `$schema` URI.
///
/// Hyper-schema URIs share their draft with the plain meta-schema; unknown
/// or absent URIs use the latest draft.
pub fn draft_for(schema: &Value) -> Draft {
    let uri = schema.get("$schema").and_then(Value::as_str).unwrap_or_default();
    if uri.contains("draft-04") {
        Draft::Draft4
    } else if uri.contains("draft-06") {
        Draft::Draft6
    } else if uri.contains("draft-07") {
        Draft::Draft7
    } else if uri.contains("2019-09") {
        Draft::Draft201909
    } else {
        Draft::Draft202012
    }
}
