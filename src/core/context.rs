//! Scalar parameters, tile requests and key metadata.
//!
//! These are the values a host hands to a raster function: the scalar
//! parameters once per run, a [`TileRequest`] once per tile, and a
//! [`KeyMetadata`] record when it asks the function to patch metadata.

use crate::core::error::{ConfigurationError, TileError};
use crate::core::port::ParameterSpec;
use crate::core::raster::{PixelBlock, TileProperties};
use crate::core::types::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key metadata of a raster or one of its bands.
///
/// A `Value::None` entry clears the key.
pub type KeyMetadata = IndexMap<String, Value>;

/// Scalar parameter values chosen for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalarParams {
    values: HashMap<String, Value>,
}

impl ScalarParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a parameter.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get all values.
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// Check if a parameter was supplied with a non-empty value.
    pub fn has(&self, name: &str) -> bool {
        self.values.get(name).map(|v| !v.is_none()).unwrap_or(false)
    }

    /// Get a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_none())
    }

    /// Copy of these parameters with declared defaults filled in.
    ///
    /// Every supplied scalar is validated against its declaration; unknown
    /// names are kept but logged, since hosts pass through extra keys.
    pub fn resolve(&self, specs: &[ParameterSpec]) -> Result<ScalarParams, ConfigurationError> {
        let mut resolved = self.clone();
        for (name, value) in &self.values {
            match specs.iter().find(|s| &s.name == name) {
                Some(spec) => spec.validate(value).map_err(|error| {
                    ConfigurationError::InvalidParameter {
                        parameter: name.clone(),
                        error,
                    }
                })?,
                None => log::debug!("Ignoring undeclared parameter '{}'", name),
            }
        }
        for spec in specs {
            if !resolved.has(&spec.name) && !spec.default_value.is_none() {
                resolved.set(spec.name.clone(), spec.default_value.clone());
            }
        }
        Ok(resolved)
    }

    // ========================================================================
    // Typed Getters
    // ========================================================================

    /// Get a parameter as an integer, or `default` when absent.
    pub fn get_integer(&self, name: &str, default: i64) -> Result<i64, ConfigurationError> {
        match self.get(name) {
            None => Ok(default),
            Some(v) => v.as_integer().ok_or_else(|| ConfigurationError::InvalidParameter {
                parameter: name.to_string(),
                error: format!("expected an integer, got {}", v),
            }),
        }
    }

    /// Get a parameter as a float, or `default` when absent.
    pub fn get_float(&self, name: &str, default: f64) -> Result<f64, ConfigurationError> {
        match self.get(name) {
            None => Ok(default),
            Some(v) => v.as_float().ok_or_else(|| ConfigurationError::InvalidParameter {
                parameter: name.to_string(),
                error: format!("expected a number, got {}", v),
            }),
        }
    }

    /// Get a string parameter, or `None` when absent.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_string())
    }

    /// Get a string parameter trimmed, treating blank text as absent.
    pub fn get_trimmed(&self, name: &str) -> Option<&str> {
        self.get_string(name).map(str::trim).filter(|s| !s.is_empty())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ScalarParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ScalarParams::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

/// Everything a function receives for one tile.
#[derive(Debug, Clone)]
pub struct TileRequest {
    /// `(row, col)` of the tile's top-left pixel in the output raster
    pub origin: (usize, usize),
    /// `(rows, cols)` of the tile
    pub shape: (usize, usize),
    /// Properties of the output tile
    pub props: TileProperties,
    /// Pixel blocks keyed by raster parameter name
    pub inputs: IndexMap<String, PixelBlock>,
}

impl TileRequest {
    /// Create a request for a tile at `origin`.
    pub fn new(origin: (usize, usize), shape: (usize, usize), props: TileProperties) -> Self {
        Self {
            origin,
            shape,
            props,
            inputs: IndexMap::new(),
        }
    }

    /// Attach a pixel block for a raster parameter, builder style.
    pub fn with_input(mut self, name: impl Into<String>, block: PixelBlock) -> Self {
        self.inputs.insert(name.into(), block);
        self
    }

    /// Get the pixel block for a raster parameter.
    pub fn input(&self, name: &str) -> Result<&PixelBlock, TileError> {
        self.inputs
            .get(name)
            .ok_or_else(|| TileError::MissingInput(name.to_string()))
    }

    /// Get the pixel block for a raster parameter, checking its band count.
    pub fn input_with_bands(&self, name: &str, min_bands: usize) -> Result<&PixelBlock, TileError> {
        let block = self.input(name)?;
        if block.band_count() < min_bands {
            return Err(TileError::BandCountMismatch {
                input: name.to_string(),
                expected: min_bands,
                got: block.band_count(),
            });
        }
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ParamType, PixelType};

    fn specs() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::new("red", ParamType::Numeric, Value::Integer(1)),
            ParameterSpec::new("method", ParamType::String, Value::from("Colormap"))
                .with_domain(["Raw", "Grayscale", "Colormap"]),
            ParameterSpec::new("where", ParamType::String, Value::None),
        ]
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let params = ScalarParams::new().with("method", "Raw");
        let resolved = params.resolve(&specs()).unwrap();
        assert_eq!(resolved.get_integer("red", 0).unwrap(), 1);
        assert_eq!(resolved.get_string("method"), Some("Raw"));
        assert!(!resolved.has("where"));
    }

    #[test]
    fn test_resolve_rejects_out_of_domain() {
        let params = ScalarParams::new().with("method", "Sepia");
        let err = params.resolve(&specs()).unwrap_err();
        assert_eq!(err.parameter(), Some("method"));
    }

    #[test]
    fn test_typed_getters() {
        let params: ScalarParams = [("red", Value::from("3")), ("bg", Value::Float(2.5))]
            .into_iter()
            .collect();
        assert_eq!(params.get_integer("red", 1).unwrap(), 3);
        assert_eq!(params.get_float("bg", 0.0).unwrap(), 2.5);
        assert_eq!(params.get_float("missing", 9.0).unwrap(), 9.0);
        assert!(params.get_integer("bg", 0).is_err());
    }

    #[test]
    fn test_get_trimmed_treats_blank_as_absent() {
        let params = ScalarParams::new().with("zid", "  ").with("attribs", " a,b ");
        assert_eq!(params.get_trimmed("zid"), None);
        assert_eq!(params.get_trimmed("attribs"), Some("a,b"));
    }

    #[test]
    fn test_tile_request_inputs() {
        let block = PixelBlock::filled(PixelType::F32, 1, (2, 2), 0.0);
        let request = TileRequest::new((0, 0), (2, 2), TileProperties::default())
            .with_input("raster", block);

        assert!(request.input("raster").is_ok());
        assert!(matches!(request.input("zraster"), Err(TileError::MissingInput(_))));
        assert!(matches!(
            request.input_with_bands("raster", 2),
            Err(TileError::BandCountMismatch { expected: 2, got: 1, .. })
        ));
    }
}
