//! Conversion of attribute records into a zone map.
//!
//! Shared by every connector: a record is a JSON object of field → value.

use crate::zonal::{AttributeRow, ZonalAttributesMap, ZoneId, ZoneSelection};
use serde_json::{Map, Value as Json};

/// A single attribute record.
pub type Record = Map<String, Json>;

/// Zone of a record, read from its id field.
///
/// Integers and integral floats become [`ZoneId::Int`]; strings go through
/// [`ZoneId::from_key`]. Records without an id field belong to the default
/// zone. Any other id value yields `None` and the record is skipped.
pub fn record_zone(record: &Record, id_field: Option<&str>) -> Option<ZoneId> {
    let Some(field) = id_field else {
        return Some(ZoneId::DEFAULT);
    };
    match lookup(record, field)? {
        Json::Number(n) => match n.as_i64() {
            Some(i) => Some(ZoneId::Int(i)),
            None => n.as_f64().and_then(ZoneId::from_pixel),
        },
        Json::String(s) => Some(ZoneId::from_key(s)),
        _ => None,
    }
}

/// Attribute values of a record, in the requested order.
pub fn record_row(record: &Record, attributes: &[String]) -> AttributeRow {
    attributes
        .iter()
        .map(|name| match lookup(record, name) {
            Some(Json::Number(n)) => n.as_f64(),
            Some(Json::String(s)) => s.trim().parse::<f64>().ok(),
            Some(Json::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        })
        .collect()
}

/// Build a zone map from records, keeping only selected zones.
pub fn to_zone_map<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    id_field: Option<&str>,
    attributes: &[String],
    selection: &ZoneSelection,
) -> ZonalAttributesMap {
    let mut map = ZonalAttributesMap::new();
    for record in records {
        let Some(zone) = record_zone(record, id_field) else {
            continue;
        };
        if id_field.is_some() && !selection.contains(&zone) {
            continue;
        }
        map.push_row(zone, record_row(record, attributes));
    }
    map
}

// Field names in attribute tables are case-insensitive.
fn lookup<'a>(record: &'a Record, field: &str) -> Option<&'a Json> {
    record.get(field).or_else(|| {
        record
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
    })
}
