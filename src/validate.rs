//! Primitive wire-value validators
//!
//! Three checks reused by every message kind: identifier validity, URI
//! validity, and options-mapping validity. Each message parse routine is
//! composed from these plus the `optional_*` probes for recognized
//! options/details keys.

use serde_json::{Map, Value};

use crate::{ProtocolError, Result};

/// Largest valid WAMP ID (2^53)
pub const MAX_ID: u64 = 9_007_199_254_740_992;

/// Validate a WAMP ID: an integer in `0..=MAX_ID`
///
/// `field` names the position being checked, e.g. `'session' in SUBSCRIBE`;
/// it is embedded verbatim in the error.
pub fn validate_id(value: &Value, field: &str) -> Result<u64> {
    let Value::Number(number) = value else {
        return Err(ProtocolError::InvalidType {
            field: field.to_owned(),
            expected: "integer",
        });
    };
    if let Some(id) = number.as_u64() {
        if id > MAX_ID {
            return Err(ProtocolError::InvalidValue {
                field: field.to_owned(),
                reason: format!("{id} exceeds 2^53"),
            });
        }
        Ok(id)
    } else if number.is_i64() {
        Err(ProtocolError::InvalidValue {
            field: field.to_owned(),
            reason: format!("{number} is negative"),
        })
    } else {
        // a float is not an identifier
        Err(ProtocolError::InvalidType {
            field: field.to_owned(),
            expected: "integer",
        })
    }
}

/// Validate a URI: a non-empty string
pub fn validate_uri(value: &Value, field: &str) -> Result<String> {
    let Value::String(uri) = value else {
        return Err(ProtocolError::InvalidType {
            field: field.to_owned(),
            expected: "string",
        });
    };
    if uri.is_empty() {
        return Err(ProtocolError::InvalidValue {
            field: field.to_owned(),
            reason: "empty URI".to_owned(),
        });
    }
    Ok(uri.clone())
}

/// Validate an options/details mapping: a string-keyed object
///
/// `serde_json` objects are string-keyed by construction, so the object
/// check subsumes the per-key type check.
pub fn validate_options<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>> {
    let Value::Object(map) = value else {
        return Err(ProtocolError::InvalidType {
            field: field.to_owned(),
            expected: "dict",
        });
    };
    Ok(map)
}

/// Probe a recognized bool-valued options key
///
/// Absent keys yield `Ok(None)`; present keys of the wrong type fail.
/// Unrecognized keys in the mapping are never touched.
pub(crate) fn optional_bool(
    options: &Map<String, Value>,
    key: &str,
    message: &'static str,
) -> Result<Option<bool>> {
    match options.get(key) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(ProtocolError::InvalidType {
            field: format!("'{key}' option in {message}"),
            expected: "bool",
        }),
    }
}

/// Probe a recognized ID-valued options key
pub(crate) fn optional_id(
    options: &Map<String, Value>,
    key: &str,
    message: &'static str,
) -> Result<Option<u64>> {
    match options.get(key) {
        None => Ok(None),
        Some(value) => validate_id(value, &format!("'{key}' option in {message}")).map(Some),
    }
}

/// Probe a recognized options key holding a list of IDs
pub(crate) fn optional_id_list(
    options: &Map<String, Value>,
    key: &str,
    message: &'static str,
) -> Result<Option<Vec<u64>>> {
    let Some(value) = options.get(key) else {
        return Ok(None);
    };
    let field = format!("'{key}' option in {message}");
    let Value::Array(items) = value else {
        return Err(ProtocolError::InvalidType {
            field,
            expected: "list",
        });
    };
    items
        .iter()
        .map(|item| validate_id(item, &field))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Probe a recognized string-valued options key
pub(crate) fn optional_string(
    options: &Map<String, Value>,
    key: &str,
    message: &'static str,
) -> Result<Option<String>> {
    match options.get(key) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(ProtocolError::InvalidType {
            field: format!("'{key}' option in {message}"),
            expected: "string",
        }),
    }
}
