//! Hand-written OpenAPI fragments
//!
//! `#[schemars(...)]` attributes cover plain length limits. Everything that
//! needs CEL rules or list-map markers is built here and attached with
//! `schema_with`.

use crate::validation::Format;
use schemars::{Schema, json_schema};

/// String constrained to `format` with an optional length range
pub(crate) fn pattern_string(format: Format, min: Option<usize>, max: usize) -> Schema {
    let mut schema = json_schema!({
        "type": "string",
        "pattern": format.pattern(),
        "maxLength": max,
    });
    if let Some(min) = min {
        schema.insert("minLength".to_string(), min.into());
    }
    schema
}

/// Pattern-constrained string that cannot change after creation
pub(crate) fn immutable_pattern_string(format: Format, message: &str) -> Schema {
    json_schema!({
        "type": "string",
        "pattern": format.pattern(),
        "x-kubernetes-validations": [{
            "rule": "self == oldSelf",
            "message": message,
        }],
    })
}

/// Array of pattern-constrained strings
pub(crate) fn pattern_string_list(format: Format, item_max: usize, max_items: usize) -> Schema {
    json_schema!({
        "type": "array",
        "maxItems": max_items,
        "items": {
            "type": "string",
            "pattern": format.pattern(),
            "maxLength": item_max,
        },
    })
}

/// Array of objects keyed by `key`, merged per-entry by server-side apply
pub(crate) fn list_map(items: Schema, key: &str, max_items: usize) -> Schema {
    json_schema!({
        "type": "array",
        "maxItems": max_items,
        "items": items,
        "x-kubernetes-list-type": "map",
        "x-kubernetes-list-map-keys": [key],
    })
}
