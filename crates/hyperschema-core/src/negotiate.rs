//! # Content Negotiation
//!
//! Basic accept/offer intersection. Quality values are not weighed; the
//! client's declared order decides ties.

use crate::error::HyperSchemaError;
use crate::media_type::{essence, parse_accept, MediaTypeMap, MEDIA_TYPE_WILDCARD};

/// The representation chosen for a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// Selected response media type.
    pub media_type: String,
    /// Schema describing that media type, if any.
    pub schema: Option<String>,
}

/// Select the response media type.
///
/// 1. No accepted types, or a leading `*/*`, selects `default_media_type`.
/// 2. Otherwise the first accepted type that is offered wins.
/// 3. With no overlap, `strict` fails with
///    [`HyperSchemaError::NotAcceptable`]; lenient mode falls back to the
///    default.
///
/// The schema is looked up in `offered` for whichever type is selected, so a
/// default that is not itself offered carries no schema.
pub fn negotiate<S: AsRef<str>>(
    accepted: &[S],
    offered: &MediaTypeMap,
    default_media_type: &str,
    strict: bool,
) -> Result<Negotiated, HyperSchemaError> {
    let selected = match accepted.first() {
        None => default_media_type,
        Some(first) if first.as_ref() == MEDIA_TYPE_WILDCARD => default_media_type,
        Some(_) => match accepted
            .iter()
            .map(|media_type| media_type.as_ref())
            .find(|media_type| offered.contains(media_type))
        {
            Some(media_type) => media_type,
            None if strict => {
                return Err(HyperSchemaError::NotAcceptable(
                    accepted.iter().map(|s| s.as_ref().to_string()).collect(),
                ));
            }
            None => default_media_type,
        },
    };

    tracing::debug!(media_type = selected, "negotiated response media type");
    Ok(Negotiated {
        media_type: selected.to_string(),
        schema: offered.schema_for(selected).map(str::to_string),
    })
}

/// Negotiate from a raw Accept header value.
///
/// An absent or blank header accepts anything. A header whose every entry is
/// refused (`q=0`) is not the same: nothing it names is acceptable, so it
/// behaves like an accept list with no overlap (406 when `strict`).
pub fn negotiate_accept(
    accept_header: Option<&str>,
    offered: &MediaTypeMap,
    default_media_type: &str,
    strict: bool,
) -> Result<Negotiated, HyperSchemaError> {
    let header = accept_header.unwrap_or_default();
    let accepted = parse_accept(header);
    if !accepted.is_empty() {
        return negotiate(accepted.as_slice(), offered, default_media_type, strict);
    }

    let refused: Vec<String> = header
        .split(',')
        .map(essence)
        .filter(|media_type| !media_type.is_empty())
        .map(str::to_string)
        .collect();
    if refused.is_empty() {
        return negotiate::<&str>(&[], offered, default_media_type, strict);
    }
    if strict {
        return Err(HyperSchemaError::NotAcceptable(refused));
    }

    tracing::debug!(
        media_type = default_media_type,
        "every listed media type was refused; using default"
    );
    Ok(Negotiated {
        media_type: default_media_type.to_string(),
        schema: offered.schema_for(default_media_type).map(str::to_string),
    })
}
