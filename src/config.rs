//! Run files.
//!
//! A run file names a function, its scalar parameters and a description of
//! each input raster, which is everything needed to prepare a run without
//! any pixels:
//!
//! ```toml
//! function = "ndvi"
//!
//! [params]
//! red = 3
//! ir = 4
//! method = "Raw"
//!
//! [rasters.raster]
//! band_count = 4
//! pixel_type = "u16"
//! ```
//!
//! An optional `[connector]` table tunes feature-service lookups.

use crate::core::context::ScalarParams;
use crate::core::error::{RasterFnError, RasterFnResult};
use crate::core::plan::{prepare, RunPlan};
use crate::core::raster::RasterInfoSet;
use crate::functions::builtin::RasterizeAttributes;
use crate::functions::registry::{FunctionRegistry, RegistryBuilder};
use crate::zonal::{DefaultConnectorFactory, FeatureServiceConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Feature-service settings of a run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub cache_capacity: usize,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        let defaults = FeatureServiceConfig::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            max_retries: defaults.max_retries,
            retry_delay_ms: defaults.retry_delay.as_millis() as u64,
            cache_capacity: defaults.cache_capacity,
        }
    }
}

impl From<&ConnectorSettings> for FeatureServiceConfig {
    fn from(settings: &ConnectorSettings) -> Self {
        FeatureServiceConfig {
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            cache_capacity: settings.cache_capacity,
        }
    }
}

/// A parsed run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Id of the function to run
    pub function: String,
    /// Scalar parameters
    #[serde(default)]
    pub params: ScalarParams,
    /// Input rasters keyed by raster parameter name
    #[serde(default)]
    pub rasters: RasterInfoSet,
    /// Feature-service settings
    #[serde(default)]
    pub connector: ConnectorSettings,
}

impl RunConfig {
    /// Parse a run file from TOML text.
    pub fn from_toml_str(text: &str) -> RasterFnResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a run file.
    pub fn from_file(path: impl AsRef<Path>) -> RasterFnResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Registry whose functions use this run's connector settings.
    pub fn registry(&self) -> FunctionRegistry {
        let factory = Arc::new(DefaultConnectorFactory::new((&self.connector).into()));
        RegistryBuilder::new()
            .register(move || Box::new(RasterizeAttributes::with_connector_factory(factory.clone())))
            .build()
    }

    /// Prepare the run described by this file.
    pub fn prepare(&self) -> RasterFnResult<RunPlan> {
        let registry = self.registry();
        let function = registry
            .create(&self.function)
            .ok_or_else(|| RasterFnError::UnknownFunction(self.function.clone()))?;
        log::debug!("Preparing '{}' with {} input raster(s)", self.function, self.rasters.len());
        prepare(function.as_ref(), &self.params, &self.rasters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConfigurationError;
    use crate::core::types::{PixelType, Value};
    use std::io::Write;

    const NDVI_RUN: &str = r#"
function = "ndvi"

[params]
red = 3
ir = 4
method = "Raw"

[rasters.raster]
band_count = 4
pixel_type = "u16"
"#;

    #[test]
    fn test_parse_run_file() {
        let config = RunConfig::from_toml_str(NDVI_RUN).unwrap();
        assert_eq!(config.function, "ndvi");
        assert_eq!(config.params.get("red"), Some(&Value::Integer(3)));
        assert_eq!(config.params.get_string("method"), Some("Raw"));
        assert_eq!(config.rasters["raster"].band_count, 4);
        assert_eq!(config.rasters["raster"].pixel_type, PixelType::U16);
        assert_eq!(config.connector, ConnectorSettings::default());
    }

    #[test]
    fn test_prepare_from_run_file() {
        let plan = RunConfig::from_toml_str(NDVI_RUN).unwrap().prepare().unwrap();
        assert_eq!(plan.configuration.extract_bands, Some(vec![2, 3]));
        assert_eq!(plan.output_info.pixel_type, PixelType::F32);
    }

    #[test]
    fn test_rasterize_run_file_with_connector_settings() {
        let text = r#"
function = "rasterize_attributes"

[params]
ztable = '{"0": [[7, null]]}'
attribs = "a,b"
background = 5

[rasters.vraster]
band_count = 1
pixel_type = "u8"

[connector]
timeout_secs = 5
max_retries = 0
"#;
        let config = RunConfig::from_toml_str(text).unwrap();
        assert_eq!(config.connector.timeout_secs, 5);
        assert_eq!(config.connector.cache_capacity, ConnectorSettings::default().cache_capacity);
        let plan = config.prepare().unwrap();
        assert_eq!(plan.output_info.band_count, 3);
    }

    #[test]
    fn test_unknown_function_and_bad_bands() {
        let config = RunConfig::from_toml_str("function = \"sepia\"").unwrap();
        assert!(matches!(config.prepare(), Err(RasterFnError::UnknownFunction(_))));

        let text = NDVI_RUN.replace("ir = 4", "ir = 5");
        let err = RunConfig::from_toml_str(&text).unwrap().prepare().unwrap_err();
        assert!(matches!(
            err,
            RasterFnError::Configuration(ConfigurationError::BandOutOfRange { band: 5, band_count: 4 })
        ));
    }

    #[test]
    fn test_invalid_run_files() {
        assert!(matches!(
            RunConfig::from_toml_str("function = "),
            Err(RasterFnError::RunFile(_))
        ));
        assert!(matches!(
            RunConfig::from_file("/does/not/exist.toml"),
            Err(RasterFnError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(NDVI_RUN.as_bytes()).unwrap();
        assert_eq!(RunConfig::from_file(file.path()).unwrap().function, "ndvi");
    }
}
