//! Run preparation.
//!
//! [`prepare`] performs everything that happens once per run and returns a
//! [`RunPlan`] that hosts share, read-only, across all tile calls.

use crate::core::context::{ScalarParams, TileRequest};
use crate::core::error::{ConfigurationError, RasterFnError, TileError};
use crate::core::info::{Configuration, OutputInfo};
use crate::core::node::{RasterFunction, TileKernel};
use crate::core::raster::{PixelBlock, RasterInfoSet};
use std::fmt;
use std::sync::Arc;

/// Immutable state of one run.
#[derive(Clone)]
pub struct RunPlan {
    /// Function the plan was prepared for
    pub function_id: String,
    /// Scalar parameters with defaults filled in
    pub params: ScalarParams,
    /// Derived configuration
    pub configuration: Configuration,
    /// Declared output properties
    pub output_info: OutputInfo,
    /// Per-tile computation
    pub kernel: Arc<dyn TileKernel>,
}

impl RunPlan {
    /// Compute one tile with the plan's kernel.
    pub fn compute_tile(&self, tile: &TileRequest) -> Result<PixelBlock, TileError> {
        let block = self.kernel.compute_tile(tile)?;
        log::trace!(
            "{}: tile at {:?} produced {} band(s) of {:?}",
            self.function_id,
            tile.origin,
            block.band_count(),
            block.shape()
        );
        Ok(block)
    }
}

impl fmt::Debug for RunPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunPlan")
            .field("function_id", &self.function_id)
            .field("params", &self.params)
            .field("configuration", &self.configuration)
            .field("output_info", &self.output_info)
            .field("kernel", &"<kernel>")
            .finish()
    }
}

/// Derive the configuration, validate it against the inputs and negotiate
/// the output.
///
/// Any failure aborts the run before a tile is processed.
pub fn prepare(
    function: &dyn RasterFunction,
    params: &ScalarParams,
    inputs: &RasterInfoSet,
) -> Result<RunPlan, RasterFnError> {
    let metadata = function.metadata();
    let params = params.resolve(&metadata.parameters)?;

    let configuration = function.derive_configuration(&params)?;
    log::debug!("{}: derived {:?}", metadata.id, configuration);

    for name in &configuration.input_rasters {
        if !inputs.contains_key(name) {
            return Err(ConfigurationError::MissingRaster(name.clone()).into());
        }
    }
    if let Some(primary) = configuration
        .input_rasters
        .first()
        .and_then(|name| inputs.get(name))
    {
        configuration.validate_bands(primary)?;
    }

    let negotiation = function.negotiate_output_info(inputs, &params, &configuration)?;
    log::debug!("{}: negotiated {:?}", metadata.id, negotiation.output_info);

    Ok(RunPlan {
        function_id: metadata.id,
        params,
        configuration,
        output_info: negotiation.output_info,
        kernel: negotiation.kernel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::RasterInfo;
    use crate::core::types::PixelType;
    use crate::functions::builtin::Ndvi;

    fn four_band_inputs() -> RasterInfoSet {
        let mut inputs = RasterInfoSet::new();
        inputs.insert("raster".to_string(), RasterInfo::new(4, PixelType::U16));
        inputs
    }

    #[test]
    fn test_prepare_fills_defaults() {
        let plan = prepare(&Ndvi, &ScalarParams::new(), &four_band_inputs()).unwrap();
        assert_eq!(plan.function_id, "ndvi");
        assert_eq!(plan.configuration.extract_bands, Some(vec![0, 1]));
        assert_eq!(plan.params.get_string("method"), Some("Colormap"));
    }

    #[test]
    fn test_prepare_rejects_band_out_of_range() {
        let params = ScalarParams::new().with("red", 3).with("ir", 5);
        let err = prepare(&Ndvi, &params, &four_band_inputs()).unwrap_err();
        assert!(matches!(
            err,
            RasterFnError::Configuration(ConfigurationError::BandOutOfRange { band: 5, band_count: 4 })
        ));
    }

    #[test]
    fn test_prepare_rejects_missing_raster() {
        let err = prepare(&Ndvi, &ScalarParams::new(), &RasterInfoSet::new()).unwrap_err();
        assert!(matches!(
            err,
            RasterFnError::Configuration(ConfigurationError::MissingRaster(ref name)) if name == "raster"
        ));
    }

    #[test]
    fn test_prepare_rejects_invalid_parameter() {
        let params = ScalarParams::new().with("method", "Sepia");
        let err = prepare(&Ndvi, &params, &four_band_inputs()).unwrap_err();
        assert!(err.to_string().contains("method"));
    }
}
