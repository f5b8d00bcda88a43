//! Connector contract and the default factory.

use crate::core::error::ConnectorError;
use crate::zonal::feature_service::{FeatureServiceConfig, FeatureServiceConnector};
use crate::zonal::local_table::LocalTableConnector;
use crate::zonal::{ZonalAttributesMap, ZoneQuery};
use std::sync::Arc;

/// Resolves zone identifiers to attribute rows from an external table.
///
/// Connectors are built once per run and queried once per tile, possibly
/// from many threads.
pub trait ZonalAttributesConnector: Send + Sync {
    /// Fetch the attribute rows for the zones in `query`.
    fn query(&self, query: &ZoneQuery) -> Result<ZonalAttributesMap, ConnectorError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Builds connectors from a table reference.
///
/// Factories never perform I/O; the connector does that lazily when it is
/// first queried.
pub trait ConnectorFactory: Send + Sync {
    fn create(
        &self,
        uri: &str,
        id_field: Option<&str>,
        attributes: &[String],
    ) -> Result<Arc<dyn ZonalAttributesConnector>, ConnectorError>;
}

/// Picks a feature-service connector for `http(s)` URLs and a local table
/// connector for everything else.
#[derive(Debug, Clone, Default)]
pub struct DefaultConnectorFactory {
    pub feature_service: FeatureServiceConfig,
}

impl DefaultConnectorFactory {
    pub fn new(feature_service: FeatureServiceConfig) -> Self {
        Self { feature_service }
    }
}

fn is_url(uri: &str) -> bool {
    let lower = uri.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl ConnectorFactory for DefaultConnectorFactory {
    fn create(
        &self,
        uri: &str,
        id_field: Option<&str>,
        attributes: &[String],
    ) -> Result<Arc<dyn ZonalAttributesConnector>, ConnectorError> {
        let uri = uri.trim();
        let connector: Arc<dyn ZonalAttributesConnector> = if is_url(uri) {
            Arc::new(FeatureServiceConnector::new(
                uri,
                id_field,
                attributes.to_vec(),
                self.feature_service.clone(),
            ))
        } else {
            Arc::new(LocalTableConnector::new(uri, id_field, attributes.to_vec()))
        };
        log::info!("Created zonal attributes connector: {}", connector.describe());
        Ok(connector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_by_scheme() {
        let factory = DefaultConnectorFactory::default();
        let attributes = vec!["height".to_string()];

        let service = factory
            .create("https://example.com/arcgis/rest/services/Zones/FeatureServer/0", Some("zid"), &attributes)
            .unwrap();
        assert!(service.describe().starts_with("feature service"));

        let table = factory.create("/data/zones.json", Some("zid"), &attributes).unwrap();
        assert!(table.describe().starts_with("local table"));
    }

    #[test]
    fn test_factory_does_not_touch_missing_table() {
        let factory = DefaultConnectorFactory::default();
        assert!(factory.create("/does/not/exist.json", None, &[]).is_ok());
    }
}
