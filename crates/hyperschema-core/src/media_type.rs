//! # Media Types
//!
//! The per-endpoint Media-Type Mapping and the small amount of header parsing
//! the negotiator and validator need. Keys are exact, case-sensitive media
//! type strings; the only wildcard understood anywhere is a leading `*/*` in
//! the Accept list.

/// `application/json`, the default response representation.
pub const MIME_JSON: &str = "application/json";

/// URL-encoded form bodies carry their JSON in the `payload` field.
pub const MIME_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Accept-anything wildcard.
pub const MEDIA_TYPE_WILDCARD: &str = "*/*";

/// Ordered mapping from media type to the name of the schema that describes it.
///
/// A `None` schema means the media type is offered without a schema
/// annotation. Insertion order is preserved; inserting an existing media type
/// replaces its schema in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTypeMap {
    entries: Vec<(String, Option<String>)>,
}

impl MediaTypeMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: offer `media_type` described by schema `schema`.
    pub fn with_schema(mut self, media_type: impl Into<String>, schema: impl Into<String>) -> Self {
        self.insert(media_type, Some(schema.into()));
        self
    }

    /// Builder: offer `media_type` with no schema annotation.
    pub fn without_schema(mut self, media_type: impl Into<String>) -> Self {
        self.insert(media_type, None);
        self
    }

    /// Insert or replace a mapping entry. An empty schema name counts as none.
    pub fn insert(&mut self, media_type: impl Into<String>, schema: Option<String>) {
        let media_type = media_type.into();
        let schema = schema.filter(|s| !s.is_empty());
        match self.entries.iter_mut().find(|(mt, _)| *mt == media_type) {
            Some(entry) => entry.1 = schema,
            None => self.entries.push((media_type, schema)),
        }
    }

    /// Whether `media_type` is offered.
    pub fn contains(&self, media_type: &str) -> bool {
        self.entries.iter().any(|(mt, _)| mt == media_type)
    }

    /// Schema name for `media_type`, or `None` if it is not offered or unannotated.
    pub fn schema_for(&self, media_type: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(mt, _)| mt == media_type)
            .and_then(|(_, schema)| schema.as_deref())
    }

    /// Offered media types in insertion order.
    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(mt, _)| mt.as_str())
    }

    /// Number of offered media types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is offered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MediaTypeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (media_type, schema) in iter {
            map.insert(media_type, Some(schema.into()));
        }
        map
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for MediaTypeMap {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Strip parameters and surrounding whitespace from a media type.
///
/// `application/json; charset=utf-8` becomes `application/json`.
pub fn essence(media_type: &str) -> &str {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

/// Parse an Accept header value into media types in client order.
///
/// Parameters are discarded, entries with `q=0` are dropped (the client
/// explicitly refuses them), and duplicates keep their first position.
pub fn parse_accept(header: &str) -> Vec<String> {
    let mut accepted: Vec<String> = Vec::new();
    for item in header.split(',') {
        let media_type = essence(item);
        if media_type.is_empty() || is_refused(item) {
            continue;
        }
        if !accepted.iter().any(|seen| seen == media_type) {
            accepted.push(media_type.to_string());
        }
    }
    accepted
}

/// Whether an Accept item carries a zero quality value.
fn is_refused(item: &str) -> bool {
    item.split(';').skip(1).any(|param| {
        let mut kv = param.splitn(2, '=');
        let key = kv.next().unwrap_or_default().trim();
        let value = kv.next().unwrap_or_default().trim();
        key.eq_ignore_ascii_case("q")
            && value.parse::<f32>().map(|q| q <= 0.0).unwrap_or(false)
    })
}
