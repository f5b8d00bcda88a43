//! # rasterfn - Tiled Raster Functions
//!
//! rasterfn computes derived raster bands, one tile at a time, for a tiled
//! raster host. It ships two functions:
//!
//! - **ndvi**: Normalized Difference Vegetation Index from a red and an
//!   infrared band, as raw values, scaled grayscale or a colormapped image
//! - **rasterize_attributes**: one extra band per attribute of a zonal
//!   attributes table, looked up by the zone each pixel falls in
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rasterfn::prelude::*;
//!
//! let registry = FunctionRegistry::with_builtins();
//! let ndvi = registry.create("ndvi").unwrap();
//!
//! // Once per run
//! let mut inputs = RasterInfoSet::new();
//! inputs.insert("raster".to_string(), RasterInfo::new(4, PixelType::U16));
//! let params = ScalarParams::new().with("red", 3).with("ir", 4).with("method", "Raw");
//! let plan = prepare(ndvi.as_ref(), &params, &inputs)?;
//!
//! // Once per tile, from any thread
//! let output = plan.compute_tile(&tile)?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Core types, the [`RasterFunction`](core::RasterFunction) trait,
//!   run preparation and error handling
//! - [`zonal`]: Zone maps, literals and connectors to external tables
//! - [`functions`]: Function registry and built-in functions
//! - [`config`]: TOML run files
//!
//! ## Creating Custom Functions
//!
//! Implement [`RasterFunction`](core::RasterFunction) and return a
//! [`TileKernel`](core::TileKernel) from negotiation that holds whatever
//! the per-tile computation needs:
//!
//! ```rust,ignore
//! use rasterfn::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct Invert;
//!
//! struct InvertKernel;
//!
//! impl TileKernel for InvertKernel {
//!     fn compute_tile(&self, tile: &TileRequest) -> Result<PixelBlock, TileError> {
//!         let input = tile.input("raster")?;
//!         Ok(PixelBlock::new(input.pixel_type, input.bands.iter().map(|b| b.mapv(|v| -v)).collect())
//!             .expect("bands share a shape"))
//!     }
//! }
//!
//! impl RasterFunction for Invert {
//!     fn metadata(&self) -> FunctionMetadata {
//!         FunctionMetadata::builder("invert", "Invert")
//!             .parameter(ParameterSpec::raster("raster").required())
//!             .build()
//!     }
//!
//!     fn derive_configuration(&self, _: &ScalarParams) -> Result<Configuration, ConfigurationError> {
//!         Ok(Configuration { input_rasters: vec!["raster".to_string()], ..Default::default() })
//!     }
//!
//!     fn negotiate_output_info(
//!         &self,
//!         inputs: &RasterInfoSet,
//!         _: &ScalarParams,
//!         _: &Configuration,
//!     ) -> Result<Negotiation, ConfigurationError> {
//!         let raster = &inputs["raster"];
//!         Ok(Negotiation {
//!             output_info: OutputInfo::new(raster.band_count, raster.pixel_type),
//!             kernel: Arc::new(InvertKernel),
//!         })
//!     }
//!
//!     fn clone_box(&self) -> Box<dyn RasterFunction> {
//!         Box::new(self.clone())
//!     }
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod functions;
pub mod zonal;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use rasterfn::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{Extent, ParamType, PixelType, SpatialReference, Value};

    // Function contract
    pub use crate::core::node::{Category, FunctionMetadata, Negotiation, RasterFunction, TileKernel};
    pub use crate::core::plan::{prepare, RunPlan};

    // Parameters
    pub use crate::core::port::ParameterSpec;

    // Per-run and per-tile data
    pub use crate::core::context::{KeyMetadata, ScalarParams, TileRequest};
    pub use crate::core::info::{Colormap, Configuration, InheritFlags, InvalidateFlags, OutputInfo};
    pub use crate::core::raster::{PixelBlock, RasterInfo, RasterInfoSet, TileProperties};

    // Errors
    pub use crate::core::error::{
        ConfigurationError, ConnectorError, RasterFnError, RasterFnResult, TileError,
    };

    // Zonal attributes
    pub use crate::zonal::{
        ConnectorFactory, DefaultConnectorFactory, ZonalAttributesConnector, ZonalAttributesMap,
        ZonalSource, ZoneId, ZoneQuery, ZoneSelection,
    };

    // Functions
    pub use crate::functions::registry::{FunctionFactory, FunctionRegistry, RegistryBuilder};
    pub use crate::functions::builtin::{Ndvi, RasterizeAttributes};

    // Run files
    pub use crate::config::RunConfig;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use ndarray::Array2;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "rasterfn");
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry.contains("ndvi"));
        assert!(registry.contains("rasterize_attributes"));
    }

    #[test]
    fn test_prepare_and_compute_through_registry() {
        let registry = FunctionRegistry::with_builtins();
        let function = registry.create("ndvi").unwrap();

        let mut inputs = RasterInfoSet::new();
        inputs.insert("raster".to_string(), RasterInfo::new(4, PixelType::U16));
        let params = ScalarParams::new().with("red", 3).with("ir", 4).with("method", "Raw");
        let plan = prepare(function.as_ref(), &params, &inputs).unwrap();

        // Band extraction is the host's job.
        let raw = PixelBlock::new(
            PixelType::U16,
            vec![
                Array2::from_elem((2, 2), 1.0),
                Array2::from_elem((2, 2), 2.0),
                Array2::from_elem((2, 2), 10.0),
                Array2::from_elem((2, 2), 30.0),
            ],
        )
        .unwrap();
        let block = plan.configuration.extract(&raw).unwrap();
        let tile = TileRequest::new((0, 0), (2, 2), TileProperties::default()).with_input("raster", block);

        let output = function.compute_tile(&plan, &tile).unwrap();
        assert!(output.bands[0].iter().all(|&v| v == 0.5));
    }
}
