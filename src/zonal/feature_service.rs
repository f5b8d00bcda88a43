//! Zonal attributes from a feature-service query endpoint.
//!
//! Each tile issues one `GET {uri}/query` restricted to the zones present in
//! the tile and, when known, to the tile's extent. Responses are cached per
//! distinct request, so neighbouring tiles that cover the same zones reuse
//! one round trip.

use crate::core::error::ConnectorError;
use crate::core::types::{Extent, SpatialReference};
use crate::zonal::connector::ZonalAttributesConnector;
use crate::zonal::records::{to_zone_map, Record};
use crate::zonal::{ZonalAttributesMap, ZoneId, ZoneQuery, ZoneSelection};
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value as Json;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

/// Tuning for feature-service requests.
#[derive(Debug, Clone)]
pub struct FeatureServiceConfig {
    /// Timeout of a single request
    pub timeout: Duration,
    /// Retries after a transient failure
    pub max_retries: u32,
    /// Delay before the first retry; later retries wait proportionally longer
    pub retry_delay: Duration,
    /// Number of responses kept; 0 disables caching
    pub cache_capacity: usize,
}

impl Default for FeatureServiceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_millis(250),
            cache_capacity: 64,
        }
    }
}

/// Query parameters of one request, in order.
pub type QueryParams = Vec<(String, String)>;

/// Performs a GET request and returns the decoded JSON body.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, params: &[(String, String)]) -> Result<Json, ConnectorError>;
}

/// Blocking HTTP transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, params: &[(String, String)]) -> Result<Json, ConnectorError> {
        let mut request = self.agent.get(url);
        for (key, value) in params {
            request = request.query(key, value);
        }
        match request.call() {
            Ok(response) => response
                .into_json::<Json>()
                .map_err(|e| ConnectorError::Parse(format!("{}: {}", url, e))),
            Err(ureq::Error::Status(status, _)) => Err(ConnectorError::Status {
                url: url.to_string(),
                status,
            }),
            Err(ureq::Error::Transport(transport)) => Err(ConnectorError::Http {
                url: url.to_string(),
                error: transport.to_string(),
            }),
        }
    }
}

/// Connector over a feature-service layer.
pub struct FeatureServiceConnector {
    url: String,
    id_field: Option<String>,
    attributes: Vec<String>,
    config: FeatureServiceConfig,
    transport: Arc<dyn Transport>,
    cache: Option<Mutex<LruCache<QueryParams, Arc<ZonalAttributesMap>>>>,
}

impl FeatureServiceConnector {
    /// Create a connector for the layer at `uri`. No request is made until
    /// the first query.
    pub fn new(uri: &str, id_field: Option<&str>, attributes: Vec<String>, config: FeatureServiceConfig) -> Self {
        let transport = Arc::new(UreqTransport::new(config.timeout));
        Self::with_transport(uri, id_field, attributes, config, transport)
    }

    /// Create a connector that sends requests through `transport`.
    pub fn with_transport(
        uri: &str,
        id_field: Option<&str>,
        attributes: Vec<String>,
        config: FeatureServiceConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let cache = NonZeroUsize::new(config.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            url: format!("{}/query", uri.trim().trim_end_matches('/')),
            id_field: id_field.map(str::to_string),
            attributes,
            config,
            transport,
            cache,
        }
    }

    /// Number of cached responses.
    pub fn cached_responses(&self) -> usize {
        self.cache.as_ref().map(|c| c.lock().len()).unwrap_or(0)
    }

    /// Request parameters for a query.
    pub fn query_params(&self, query: &ZoneQuery) -> QueryParams {
        let mut params = vec![
            ("where".to_string(), self.where_clause(query)),
            ("outFields".to_string(), self.out_fields()),
            ("returnGeometry".to_string(), "false".to_string()),
            ("f".to_string(), "json".to_string()),
        ];
        if !query.extent.is_empty() {
            params.push(("geometry".to_string(), envelope(&query.extent)));
            params.push(("geometryType".to_string(), "esriGeometryEnvelope".to_string()));
            params.push(("spatialRel".to_string(), "esriSpatialRelIntersects".to_string()));
            if let Some(sr) = spatial_reference(&query.spatial_reference) {
                params.push(("inSR".to_string(), sr));
            }
        }
        params
    }

    /// Combine the user filter with the zone restriction.
    pub fn where_clause(&self, query: &ZoneQuery) -> String {
        let filter = query.filter.as_deref().map(str::trim).filter(|f| !f.is_empty());
        let restriction = match (&self.id_field, &query.ids) {
            (Some(field), ZoneSelection::Ids(ids)) => {
                let list: Vec<String> = ids.iter().map(sql_literal).collect();
                Some(format!("{} IN ({})", field, list.join(", ")))
            }
            _ => None,
        };
        match (filter, restriction) {
            (Some(f), Some(r)) => format!("({}) AND {}", f, r),
            (Some(f), None) => f.to_string(),
            (None, Some(r)) => r,
            (None, None) => "1=1".to_string(),
        }
    }

    fn out_fields(&self) -> String {
        let mut fields: Vec<&str> = Vec::new();
        if let Some(id) = &self.id_field {
            fields.push(id);
        }
        fields.extend(self.attributes.iter().map(String::as_str));
        if fields.is_empty() {
            "*".to_string()
        } else {
            fields.join(",")
        }
    }

    fn fetch(&self, params: &QueryParams) -> Result<Json, ConnectorError> {
        let mut attempt = 0;
        loop {
            match self.transport.get(&self.url, params) {
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "Feature service request failed ({}), retry {}/{}",
                        e,
                        attempt,
                        self.config.max_retries
                    );
                    std::thread::sleep(self.config.retry_delay * attempt);
                }
                result => return result,
            }
        }
    }
}

/// Extract attribute records from a query response.
pub fn parse_response(body: Json) -> Result<Vec<Record>, ConnectorError> {
    let Json::Object(mut body) = body else {
        return Err(ConnectorError::Parse("response is not a JSON object".to_string()));
    };
    if let Some(error) = body.get("error") {
        return Err(ConnectorError::Service {
            code: error.get("code").and_then(Json::as_i64).unwrap_or(0),
            message: error
                .get("message")
                .and_then(Json::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    if body.get("exceededTransferLimit").and_then(Json::as_bool) == Some(true) {
        log::warn!("Feature service truncated the response; some zones may be missing");
    }
    let Some(Json::Array(features)) = body.remove("features") else {
        return Err(ConnectorError::Parse("response has no 'features' array".to_string()));
    };
    features
        .into_iter()
        .map(|feature| match feature {
            Json::Object(mut f) => match f.remove("attributes") {
                Some(Json::Object(attributes)) => Ok(attributes),
                _ => Err(ConnectorError::Parse("feature has no 'attributes' object".to_string())),
            },
            _ => Err(ConnectorError::Parse("feature is not an object".to_string())),
        })
        .collect()
}

fn sql_literal(zone: &ZoneId) -> String {
    match zone {
        ZoneId::Int(i) => i.to_string(),
        ZoneId::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

fn envelope(extent: &Extent) -> String {
    format!("{},{},{},{}", extent.xmin, extent.ymin, extent.xmax, extent.ymax)
}

fn spatial_reference(sr: &SpatialReference) -> Option<String> {
    match (sr.wkid, &sr.wkt) {
        (Some(wkid), _) => Some(wkid.to_string()),
        (None, Some(wkt)) => Some(serde_json::json!({ "wkt": wkt }).to_string()),
        (None, None) => None,
    }
}

impl ZonalAttributesConnector for FeatureServiceConnector {
    fn query(&self, query: &ZoneQuery) -> Result<ZonalAttributesMap, ConnectorError> {
        if matches!(&query.ids, ZoneSelection::Ids(ids) if ids.is_empty()) {
            return Ok(ZonalAttributesMap::new());
        }

        let params = self.query_params(query);
        if let Some(cache) = &self.cache {
            if let Some(map) = cache.lock().get(&params) {
                return Ok(map.as_ref().clone());
            }
        }

        let records = parse_response(self.fetch(&params)?)?;
        let map = to_zone_map(&records, self.id_field.as_deref(), &self.attributes, &query.ids);
        log::debug!("{}: {} record(s), {} zone(s)", self.url, records.len(), map.len());

        if let Some(cache) = &self.cache {
            cache.lock().put(params, Arc::new(map.clone()));
        }
        Ok(map)
    }

    fn describe(&self) -> String {
        format!("feature service {}", self.url)
    }
}
