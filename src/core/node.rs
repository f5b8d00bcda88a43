//! RasterFunction trait and function metadata.
//!
//! The RasterFunction trait is the contract every transform implements. It
//! uses a two-phase design: configuration (derivation and negotiation, once
//! per run) and per-tile computation (any number of times).

use crate::core::context::{KeyMetadata, ScalarParams, TileRequest};
use crate::core::error::{ConfigurationError, TileError};
use crate::core::info::{Configuration, OutputInfo};
use crate::core::plan::RunPlan;
use crate::core::port::ParameterSpec;
use crate::core::raster::{PixelBlock, RasterInfoSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Category for organizing functions in a host's UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Band arithmetic and spectral indices
    BandMath,
    /// Conversion of tabular data into raster bands
    Rasterization,
    /// Custom/user-defined
    #[default]
    Custom,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::BandMath => "Band Math",
            Category::Rasterization => "Rasterization",
            Category::Custom => "Custom",
        }
    }
}

/// Metadata describing a raster function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionMetadata {
    /// Unique identifier for this function (e.g., "ndvi")
    pub id: String,
    /// Human-readable name (e.g., "NDVI Function")
    pub name: String,
    /// Category for UI organization
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Version string
    pub version: String,
    /// Parameter declarations, in display order
    pub parameters: Vec<ParameterSpec>,
    /// Searchable tags
    pub tags: Vec<String>,
}

impl FunctionMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> FunctionMetadataBuilder {
        FunctionMetadataBuilder::new(id, name)
    }

    /// Get all parameter names.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Find a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Builder for FunctionMetadata.
pub struct FunctionMetadataBuilder {
    id: String,
    name: String,
    category: Category,
    description: String,
    version: String,
    parameters: Vec<ParameterSpec>,
    tags: Vec<String>,
}

impl FunctionMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Category::Custom,
            description: String::new(),
            version: "1.0.0".to_string(),
            parameters: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add multiple tags.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(|t| t.into()));
        self
    }

    /// Build the metadata.
    pub fn build(self) -> FunctionMetadata {
        FunctionMetadata {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            version: self.version,
            parameters: self.parameters,
            tags: self.tags,
        }
    }
}

/// Result of output-metadata negotiation.
pub struct Negotiation {
    /// Declared output properties
    pub output_info: OutputInfo,
    /// Per-tile computation bound to the negotiated run state
    pub kernel: Arc<dyn TileKernel>,
}

/// Per-tile computation holding a run's immutable state.
///
/// Kernels are shared by every tile call of a run, possibly from many
/// threads at once, and must not mutate themselves.
pub trait TileKernel: Send + Sync {
    /// Compute the output block for one tile.
    fn compute_tile(&self, tile: &TileRequest) -> Result<PixelBlock, TileError>;
}

/// The core trait for raster functions.
///
/// # Design
///
/// 1. **Configuration** (`derive_configuration`, `negotiate_output_info`):
///    Called once per run, before any tile. Produces an immutable
///    [`Configuration`], an [`OutputInfo`] and a [`TileKernel`] holding
///    everything per-tile code needs. [`prepare`](crate::core::plan::prepare)
///    runs both steps and bundles the results in a [`RunPlan`].
///
/// 2. **Per-tile computation** (`compute_tile`): Called once per tile with
///    the run plan. A pure function of the plan and the tile.
///
/// # Thread Safety
///
/// `Send + Sync` bounds let hosts drive tiles from many threads.
pub trait RasterFunction: Send + Sync {
    /// Get the metadata for this function.
    fn metadata(&self) -> FunctionMetadata;

    /// Get the parameter declarations.
    fn parameter_specs(&self) -> Vec<ParameterSpec> {
        self.metadata().parameters
    }

    /// Derive the run configuration from scalar parameters.
    fn derive_configuration(&self, params: &ScalarParams) -> Result<Configuration, ConfigurationError>;

    /// Declare the output properties and bind the per-tile state.
    fn negotiate_output_info(
        &self,
        inputs: &RasterInfoSet,
        params: &ScalarParams,
        config: &Configuration,
    ) -> Result<Negotiation, ConfigurationError>;

    /// Compute the output block for one tile.
    fn compute_tile(&self, plan: &RunPlan, tile: &TileRequest) -> Result<PixelBlock, TileError> {
        plan.kernel.compute_tile(tile)
    }

    /// Patch key metadata of the output raster (`band_index == -1`) or one
    /// of its bands. The default leaves it unchanged.
    fn patch_key_metadata(&self, _band_index: i32, metadata: KeyMetadata) -> KeyMetadata {
        metadata
    }

    /// Clone this function into a boxed trait object.
    fn clone_box(&self) -> Box<dyn RasterFunction>;
}

// Allow cloning Box<dyn RasterFunction>
impl Clone for Box<dyn RasterFunction> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ParamType, Value};

    #[test]
    fn test_metadata_builder() {
        let metadata = FunctionMetadata::builder("test_function", "Test Function")
            .category(Category::BandMath)
            .description("A test function")
            .parameter(ParameterSpec::raster("raster").required())
            .parameter(ParameterSpec::new("scale", ParamType::Numeric, Value::Float(1.0)))
            .tags(["test", "debug"])
            .build();

        assert_eq!(metadata.id, "test_function");
        assert_eq!(metadata.name, "Test Function");
        assert_eq!(metadata.category, Category::BandMath);
        assert_eq!(metadata.version, "1.0.0");
        assert_eq!(metadata.parameter_names(), vec!["raster", "scale"]);
        assert!(metadata.get_parameter("scale").is_some());
        assert_eq!(metadata.tags.len(), 2);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::BandMath.display_name(), "Band Math");
        assert_eq!(Category::default(), Category::Custom);
    }
}
