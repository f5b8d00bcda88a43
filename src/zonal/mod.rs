//! Zonal attributes: zone identifiers, attribute rows and their sources.
//!
//! A zonal attributes map associates each zone identifier with one or more
//! rows of attribute values. It comes either from an inline literal parsed
//! once per run, or from a connector queried once per tile.

pub mod connector;
pub mod feature_service;
pub mod filter;
pub mod literal;
pub mod local_table;
pub mod records;

pub use connector::{ConnectorFactory, DefaultConnectorFactory, ZonalAttributesConnector};
pub use feature_service::{FeatureServiceConfig, FeatureServiceConnector};
pub use literal::parse_zone_map;
pub use local_table::LocalTableConnector;

use crate::core::types::{Extent, SpatialReference};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Identifier of a zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneId {
    Int(i64),
    Text(String),
}

impl ZoneId {
    /// The zone every pixel belongs to when no zone raster is configured.
    pub const DEFAULT: ZoneId = ZoneId::Int(0);

    /// Parse a textual key; integer-looking text becomes [`ZoneId::Int`].
    pub fn from_key(key: &str) -> Self {
        match key.trim().parse::<i64>() {
            Ok(i) => ZoneId::Int(i),
            Err(_) => ZoneId::Text(key.to_string()),
        }
    }

    /// Zone of a zone-raster pixel. Only finite integral values name a zone.
    pub fn from_pixel(value: f64) -> Option<Self> {
        if value.is_finite() && value.fract() == 0.0 {
            Some(ZoneId::Int(value as i64))
        } else {
            None
        }
    }

    /// The pixel value that selects this zone in a zone raster.
    pub fn pixel_value(&self) -> Option<f64> {
        match self {
            ZoneId::Int(i) => Some(*i as f64),
            ZoneId::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneId::Int(i) => write!(f, "{}", i),
            ZoneId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row of attribute values; `None` leaves the background in place.
pub type AttributeRow = Vec<Option<f64>>;

/// Zone identifier → attribute rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZonalAttributesMap {
    zones: HashMap<ZoneId, Vec<AttributeRow>>,
}

impl ZonalAttributesMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row for a zone, keeping earlier rows first.
    pub fn push_row(&mut self, zone: ZoneId, row: AttributeRow) {
        self.zones.entry(zone).or_default().push(row);
    }

    /// Replace all rows of a zone.
    pub fn insert(&mut self, zone: ZoneId, rows: Vec<AttributeRow>) {
        self.zones.insert(zone, rows);
    }

    /// Rows of a zone.
    pub fn rows(&self, zone: &ZoneId) -> Option<&[AttributeRow]> {
        self.zones.get(zone).map(Vec::as_slice)
    }

    /// First row of a zone, if the zone has any rows.
    ///
    /// Only the first row is ever rasterized.
    pub fn first_row(&self, zone: &ZoneId) -> Option<&AttributeRow> {
        self.zones.get(zone).and_then(|rows| rows.first())
    }

    /// Number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the map has no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Iterate over zones and their rows.
    pub fn iter(&self) -> impl Iterator<Item = (&ZoneId, &Vec<AttributeRow>)> {
        self.zones.iter()
    }
}

/// Which zones a query asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneSelection {
    /// Every zone
    All,
    /// Only the listed zones
    Ids(BTreeSet<ZoneId>),
}

impl ZoneSelection {
    /// Whether a zone is selected.
    pub fn contains(&self, zone: &ZoneId) -> bool {
        match self {
            ZoneSelection::All => true,
            ZoneSelection::Ids(ids) => ids.contains(zone),
        }
    }
}

/// Argument to a zonal attributes connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneQuery {
    /// Zones to resolve
    pub ids: ZoneSelection,
    /// Optional filter expression applied by the connector
    pub filter: Option<String>,
    /// Extent of the tile being processed
    pub extent: Extent,
    /// Spatial reference of the extent
    pub spatial_reference: SpatialReference,
}

/// Where a run's zonal attributes come from.
#[derive(Clone)]
pub enum ZonalSource {
    /// Parsed once from an inline literal and shared by all tiles
    Literal(Arc<ZonalAttributesMap>),
    /// Queried once per tile
    Connector(Arc<dyn ZonalAttributesConnector>),
}

impl ZonalSource {
    /// Resolve the attributes for one tile.
    ///
    /// Literal maps are returned as-is; connectors are queried and their
    /// failures propagate.
    pub fn resolve(&self, query: &ZoneQuery) -> Result<Arc<ZonalAttributesMap>, crate::core::error::ConnectorError> {
        match self {
            ZonalSource::Literal(map) => Ok(Arc::clone(map)),
            ZonalSource::Connector(connector) => connector.query(query).map(Arc::new),
        }
    }
}

impl fmt::Debug for ZonalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZonalSource::Literal(map) => f.debug_tuple("Literal").field(&map.len()).finish(),
            ZonalSource::Connector(connector) => {
                f.debug_tuple("Connector").field(&connector.describe()).finish()
            }
        }
    }
}
