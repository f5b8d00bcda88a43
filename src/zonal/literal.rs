//! Inline zone-map literals.
//!
//! A literal maps zone identifiers to attribute rows:
//!
//! ```text
//! { "1": [[9, 9]], "2": [[3, null], [4, 4]] }
//! ```
//!
//! A zone may also map straight to a single row (`{ "1": [9, 9] }`).
//! Keys that look like integers become [`ZoneId::Int`]. An empty string is
//! the empty map.

use crate::core::error::LiteralError;
use crate::zonal::{AttributeRow, ZonalAttributesMap, ZoneId};
use serde_json::Value as Json;

/// Parse a zone-map literal.
///
/// An error means the text is not a literal; callers treat it as a table
/// reference instead.
pub fn parse_zone_map(text: &str) -> Result<ZonalAttributesMap, LiteralError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(ZonalAttributesMap::new());
    }

    let json: Json = serde_json::from_str(text)?;
    let object = json.as_object().ok_or(LiteralError::NotAnObject)?;

    let mut map = ZonalAttributesMap::new();
    for (key, value) in object {
        let rows = parse_rows(value).ok_or_else(|| LiteralError::InvalidRows { zone: key.clone() })?;
        map.insert(ZoneId::from_key(key), rows);
    }
    Ok(map)
}

fn parse_rows(value: &Json) -> Option<Vec<AttributeRow>> {
    match value {
        Json::Null => Some(Vec::new()),
        Json::Array(items) if items.iter().all(|item| item.is_array()) => {
            items.iter().map(parse_row).collect()
        }
        Json::Array(_) => parse_row(value).map(|row| vec![row]),
        _ => None,
    }
}

fn parse_row(value: &Json) -> Option<AttributeRow> {
    value
        .as_array()?
        .iter()
        .map(|cell| match cell {
            Json::Null => Some(None),
            Json::Number(n) => n.as_f64().map(Some),
            _ => None,
        })
        .collect()
}
