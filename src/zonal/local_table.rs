//! Zonal attributes from a local JSON table.
//!
//! The table is either an array of attribute objects or a feature-set
//! document (`{"features": [{"attributes": {...}}]}`). It is read on the
//! first query and kept for the rest of the run. Tables carry no geometry,
//! so the query extent is ignored.

use crate::core::error::ConnectorError;
use crate::zonal::connector::ZonalAttributesConnector;
use crate::zonal::filter::WhereClause;
use crate::zonal::records::{to_zone_map, Record};
use crate::zonal::{ZonalAttributesMap, ZoneQuery};
use parking_lot::Mutex;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Connector over a JSON attribute table on disk.
pub struct LocalTableConnector {
    path: PathBuf,
    id_field: Option<String>,
    attributes: Vec<String>,
    records: Mutex<Option<Arc<Vec<Record>>>>,
}

impl LocalTableConnector {
    pub fn new(path: impl AsRef<Path>, id_field: Option<&str>, attributes: Vec<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            id_field: id_field.map(str::to_string),
            attributes,
            records: Mutex::new(None),
        }
    }

    /// Whether the table has been read yet.
    pub fn is_loaded(&self) -> bool {
        self.records.lock().is_some()
    }

    fn records(&self) -> Result<Arc<Vec<Record>>, ConnectorError> {
        let mut guard = self.records.lock();
        if let Some(records) = guard.as_ref() {
            return Ok(Arc::clone(records));
        }
        let records = Arc::new(self.load()?);
        log::debug!("Loaded {} record(s) from {}", records.len(), self.path.display());
        *guard = Some(Arc::clone(&records));
        Ok(records)
    }

    fn load(&self) -> Result<Vec<Record>, ConnectorError> {
        let path = self.path.display().to_string();
        let text = std::fs::read_to_string(&self.path).map_err(|e| ConnectorError::Io {
            path: path.clone(),
            error: e.to_string(),
        })?;
        let json: Json = serde_json::from_str(&text).map_err(|e| ConnectorError::Parse(format!("{}: {}", path, e)))?;
        parse_table(json).ok_or_else(|| {
            ConnectorError::Parse(format!("{}: expected an array of records or a feature set", path))
        })
    }
}

fn parse_table(json: Json) -> Option<Vec<Record>> {
    let items = match json {
        Json::Array(items) => items,
        Json::Object(mut object) => match object.remove("features")? {
            Json::Array(features) => features
                .into_iter()
                .map(|feature| match feature {
                    Json::Object(mut f) => f.remove("attributes"),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?,
            _ => return None,
        },
        _ => return None,
    };
    items
        .into_iter()
        .map(|item| match item {
            Json::Object(record) => Some(record),
            _ => None,
        })
        .collect()
}

impl ZonalAttributesConnector for LocalTableConnector {
    fn query(&self, query: &ZoneQuery) -> Result<ZonalAttributesMap, ConnectorError> {
        let clause = WhereClause::parse(query.filter.as_deref().unwrap_or(""))?;
        let records = self.records()?;
        Ok(to_zone_map(
            records.iter().filter(|r| clause.matches(r)),
            self.id_field.as_deref(),
            &self.attributes,
            &query.ids,
        ))
    }

    fn describe(&self) -> String {
        format!("local table {}", self.path.display())
    }
}
