//! Normalized Difference Vegetation Index.

use crate::core::context::{KeyMetadata, ScalarParams, TileRequest};
use crate::core::error::{ConfigurationError, TileError};
use crate::core::info::{BandStatistics, Configuration, InheritFlags, InvalidateFlags, OutputInfo};
use crate::core::node::{Category, FunctionMetadata, Negotiation, RasterFunction, TileKernel};
use crate::core::port::ParameterSpec;
use crate::core::raster::{PixelBlock, RasterInfoSet};
use crate::core::types::{ParamType, PixelType, Value};
use super::colormap::vegetation_ramp;
use ndarray::Zip;
use std::sync::Arc;

/// How the index is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMethod {
    /// The index itself, in [-1, 1]
    Raw,
    /// The index scaled to [0, 200]
    Grayscale,
    /// The scaled index as 8-bit palette indices into the vegetation ramp
    Colormap,
}

impl OutputMethod {
    fn parse(method: &str) -> Self {
        match method.trim().to_lowercase().as_str() {
            "colormap" => OutputMethod::Colormap,
            "grayscale" => OutputMethod::Grayscale,
            _ => OutputMethod::Raw,
        }
    }

    fn scales(self) -> bool {
        self != OutputMethod::Raw
    }
}

/// Computes NDVI from a raster's red and infrared bands.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ndvi;

impl RasterFunction for Ndvi {
    fn metadata(&self) -> FunctionMetadata {
        FunctionMetadata::builder("ndvi", "NDVI")
            .category(Category::BandMath)
            .description("Computes Normalized Difference Vegetation Index given a raster's red and infrared band")
            .parameter(
                ParameterSpec::raster("raster")
                    .required()
                    .with_description("The primary multi-band input raster containing red and infrared bands"),
            )
            .parameter(
                ParameterSpec::new("red", ParamType::Numeric, Value::Integer(1))
                    .required()
                    .with_display_name("Red Band Index")
                    .with_description("The index of the red band. The first band has index 1"),
            )
            .parameter(
                ParameterSpec::new("ir", ParamType::Numeric, Value::Integer(2))
                    .required()
                    .with_display_name("Infrared Band Index")
                    .with_description("The index of the infrared band. The first band has index 1"),
            )
            .parameter(
                ParameterSpec::new("method", ParamType::String, Value::from("Colormap"))
                    .with_display_name("Output Image Type")
                    .with_domain(["Raw", "Grayscale", "Colormap"])
                    .with_description(
                        "Raw for scientific analysis; Grayscale or Colormap for visualization",
                    ),
            )
            .tags(["vegetation", "index", "band math", "spectral"])
            .build()
    }

    fn derive_configuration(&self, params: &ScalarParams) -> Result<Configuration, ConfigurationError> {
        let red = band_index(params, "red", 1)?;
        let ir = band_index(params, "ir", 2)?;

        Ok(Configuration {
            extract_bands: Some(vec![red, ir]),
            composite_rasters: false,
            inherit_properties: InheritFlags::DIMENSIONS | InheritFlags::RESAMPLING,
            invalidate_properties: InvalidateFlags::STATISTICS
                | InvalidateFlags::HISTOGRAM
                | InvalidateFlags::KEY_PROPERTIES,
            input_mask: false,
            input_rasters: vec!["raster".to_string()],
        })
    }

    fn negotiate_output_info(
        &self,
        _inputs: &RasterInfoSet,
        params: &ScalarParams,
        _config: &Configuration,
    ) -> Result<Negotiation, ConfigurationError> {
        let method = OutputMethod::parse(params.get_string("method").unwrap_or("Colormap"));
        let apply_scaling = method.scales();
        let apply_colormap = method == OutputMethod::Colormap;

        let pixel_type = if apply_colormap { PixelType::U8 } else { PixelType::F32 };
        let mut output_info = OutputInfo::new(1, pixel_type);
        output_info.statistics = vec![BandStatistics {
            minimum: 0.0,
            maximum: if apply_scaling { 200.0 } else { 1.0 },
        }];
        output_info.colormap = apply_colormap.then(vegetation_ramp);

        log::debug!("ndvi: method {:?}, output {}", method, pixel_type);

        Ok(Negotiation {
            output_info,
            kernel: Arc::new(NdviKernel {
                apply_scaling,
                pixel_type,
            }),
        })
    }

    fn patch_key_metadata(&self, band_index: i32, mut metadata: KeyMetadata) -> KeyMetadata {
        match band_index {
            -1 => {
                metadata.insert("datatype".to_string(), Value::from("Processed"));
            }
            0 => {
                metadata.insert("wavelengthmin".to_string(), Value::None);
                metadata.insert("wavelengthmax".to_string(), Value::None);
                metadata.insert("bandname".to_string(), Value::from("NDVI"));
            }
            _ => {}
        }
        metadata
    }

    fn clone_box(&self) -> Box<dyn RasterFunction> {
        Box::new(*self)
    }
}

/// Zero-based band from a one-based band parameter.
fn band_index(params: &ScalarParams, name: &str, default: i64) -> Result<usize, ConfigurationError> {
    let band = params.get_integer(name, default)?;
    if band < 1 {
        return Err(ConfigurationError::InvalidParameter {
            parameter: name.to_string(),
            error: format!("band index must be at least 1, got {}", band),
        });
    }
    Ok((band - 1) as usize)
}

/// Per-tile NDVI state.
#[derive(Debug)]
struct NdviKernel {
    apply_scaling: bool,
    pixel_type: PixelType,
}

impl TileKernel for NdviKernel {
    fn compute_tile(&self, tile: &TileRequest) -> Result<PixelBlock, TileError> {
        // Band extraction delivers red first and infrared second, and nothing else.
        let block = tile.input("raster")?;
        if block.band_count() != 2 {
            return Err(TileError::BandCountMismatch {
                input: "raster".to_string(),
                expected: 2,
                got: block.band_count(),
            });
        }
        let (red, ir) = (&block.bands[0], &block.bands[1]);

        // Division by zero yields inf or NaN and is kept as is.
        let index = Zip::from(red).and(ir).map_collect(|&red, &ir| {
            let (red, ir) = (red as f32, ir as f32);
            let mut value = (ir - red) / (ir + red);
            if self.apply_scaling {
                value = value * 100.0 + 100.0;
            }
            self.pixel_type.narrow(value as f64)
        });

        Ok(PixelBlock {
            pixel_type: self.pixel_type,
            bands: vec![index],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::{prepare, RunPlan};
    use crate::core::raster::{RasterInfo, TileProperties};
    use ndarray::Array2;
    use proptest::prelude::*;

    fn plan(method: &str) -> RunPlan {
        let mut inputs = RasterInfoSet::new();
        inputs.insert("raster".to_string(), RasterInfo::new(2, PixelType::U16));
        prepare(&Ndvi, &ScalarParams::new().with("method", method), &inputs).unwrap()
    }

    fn tile(red: Array2<f64>, ir: Array2<f64>) -> TileRequest {
        let shape = red.dim();
        let block = PixelBlock::new(PixelType::F32, vec![red, ir]).unwrap();
        TileRequest::new((0, 0), shape, TileProperties::default()).with_input("raster", block)
    }

    fn uniform(value: f64) -> TileRequest {
        tile(Array2::from_elem((4, 5), value), Array2::from_elem((4, 5), value))
    }

    #[test]
    fn test_raw_uniform_raster_is_zero() {
        let plan = plan("Raw");
        assert_eq!(plan.output_info.band_count, 1);
        assert_eq!(plan.output_info.pixel_type, PixelType::F32);
        assert!(plan.output_info.colormap.is_none());
        assert_eq!(plan.output_info.statistics[0].maximum, 1.0);

        let out = Ndvi.compute_tile(&plan, &uniform(10.0)).unwrap();
        assert_eq!(out.band_count(), 1);
        assert_eq!(out.pixel_type, PixelType::F32);
        assert!(out.bands[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_colormap_uniform_raster_is_100() {
        let plan = plan("Colormap");
        assert_eq!(plan.output_info.pixel_type, PixelType::U8);
        assert_eq!(plan.output_info.colormap.as_ref().map(|c| c.len()), Some(256));
        assert_eq!(plan.output_info.statistics[0].maximum, 200.0);

        let out = plan.compute_tile(&uniform(10.0)).unwrap();
        assert_eq!(out.pixel_type, PixelType::U8);
        assert!(out.bands[0].iter().all(|&v| v == 100.0));
    }

    #[test]
    fn test_grayscale_scales_without_colormap() {
        let plan = plan("grayscale");
        assert_eq!(plan.output_info.pixel_type, PixelType::F32);
        assert!(plan.output_info.colormap.is_none());

        let out = plan
            .compute_tile(&tile(Array2::from_elem((2, 2), 0.0), Array2::from_elem((2, 2), 5.0)))
            .unwrap();
        assert!(out.bands[0].iter().all(|&v| v == 200.0));
    }

    #[test]
    fn test_division_by_zero_is_not_an_error() {
        let out = plan("Raw").compute_tile(&uniform(0.0)).unwrap();
        assert!(out.bands[0].iter().all(|v| v.is_nan()));

        let out = plan("Grayscale")
            .compute_tile(&tile(Array2::from_elem((1, 1), -3.0), Array2::from_elem((1, 1), 3.0)))
            .unwrap();
        assert!(out.bands[0][[0, 0]].is_infinite());

        // NaN narrows to 0 in the 8-bit colormap output.
        let out = plan("Colormap").compute_tile(&uniform(0.0)).unwrap();
        assert!(out.bands[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_band_selection() {
        let params = ScalarParams::new().with("red", 3).with("ir", 4);
        let config = Ndvi.derive_configuration(&params).unwrap();
        assert_eq!(config.extract_bands, Some(vec![2, 3]));
        assert_eq!(config.inherit_properties.bits(), 4 | 8);
        assert_eq!(config.invalidate_properties.bits(), 2 | 4 | 8);
        assert!(!config.input_mask);

        let err = Ndvi.derive_configuration(&ScalarParams::new().with("red", 0)).unwrap_err();
        assert_eq!(err.parameter(), Some("red"));
    }

    #[test]
    fn test_missing_band_in_tile() {
        let block = PixelBlock::filled(PixelType::U16, 1, (2, 2), 1.0);
        let request = TileRequest::new((0, 0), (2, 2), TileProperties::default()).with_input("raster", block);
        assert!(matches!(
            plan("Raw").compute_tile(&request),
            Err(TileError::BandCountMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_unextracted_block_is_rejected() {
        let mut inputs = RasterInfoSet::new();
        inputs.insert("raster".to_string(), RasterInfo::new(4, PixelType::U16));
        let params = ScalarParams::new().with("red", 3).with("ir", 4).with("method", "Raw");
        let plan = prepare(&Ndvi, &params, &inputs).unwrap();

        let raw = PixelBlock::new(
            PixelType::U16,
            vec![
                Array2::from_elem((2, 2), 10.0),
                Array2::from_elem((2, 2), 10.0),
                Array2::from_elem((2, 2), 10.0),
                Array2::from_elem((2, 2), 30.0),
            ],
        )
        .unwrap();
        let request = |block: PixelBlock| {
            TileRequest::new((0, 0), (2, 2), TileProperties::default()).with_input("raster", block)
        };

        assert!(matches!(
            plan.compute_tile(&request(raw.clone())),
            Err(TileError::BandCountMismatch { expected: 2, got: 4, .. })
        ));

        let extracted = plan.configuration.extract(&raw).unwrap();
        let out = plan.compute_tile(&request(extracted)).unwrap();
        assert!(out.bands[0].iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_fractional_band_index_is_rejected() {
        let err = Ndvi
            .derive_configuration(&ScalarParams::new().with("red", 2.5))
            .unwrap_err();
        assert_eq!(err.parameter(), Some("red"));

        let config = Ndvi
            .derive_configuration(&ScalarParams::new().with("red", 3.0).with("ir", "4"))
            .unwrap();
        assert_eq!(config.extract_bands, Some(vec![2, 3]));
    }

    #[test]
    fn test_unknown_method_falls_back_to_raw() {
        let negotiation = Ndvi
            .negotiate_output_info(
                &RasterInfoSet::new(),
                &ScalarParams::new().with("method", "Sepia"),
                &Configuration::default(),
            )
            .unwrap();
        assert_eq!(negotiation.output_info.pixel_type, PixelType::F32);
        assert!(negotiation.output_info.colormap.is_none());
        assert_eq!(negotiation.output_info.statistics[0].maximum, 1.0);

        let defaulted = Ndvi
            .negotiate_output_info(&RasterInfoSet::new(), &ScalarParams::new(), &Configuration::default())
            .unwrap();
        assert_eq!(defaulted.output_info.pixel_type, PixelType::U8);
    }

    #[test]
    fn test_key_metadata() {
        let mut metadata = KeyMetadata::new();
        metadata.insert("wavelengthmin".to_string(), Value::Float(630.0));
        metadata.insert("sensor".to_string(), Value::from("OLI"));

        let raster = Ndvi.patch_key_metadata(-1, metadata.clone());
        assert_eq!(raster.get("datatype"), Some(&Value::from("Processed")));

        let band = Ndvi.patch_key_metadata(0, metadata.clone());
        assert_eq!(band.get("wavelengthmin"), Some(&Value::None));
        assert_eq!(band.get("wavelengthmax"), Some(&Value::None));
        assert_eq!(band.get("bandname"), Some(&Value::from("NDVI")));
        assert_eq!(band.get("sensor"), Some(&Value::from("OLI")));

        assert_eq!(Ndvi.patch_key_metadata(1, metadata.clone()), metadata);
    }

    #[test]
    fn test_tile_shape_independence() {
        let red = Array2::from_shape_fn((7, 9), |(r, c)| (r * 9 + c) as f64);
        let ir = Array2::from_shape_fn((7, 9), |(r, c)| (r * c + 3) as f64);
        let plan = plan("Grayscale");
        let whole = plan.compute_tile(&tile(red.clone(), ir.clone())).unwrap();

        let full = PixelBlock::new(PixelType::F32, vec![red, ir]).unwrap();
        let mut mosaic = PixelBlock::filled(PixelType::F32, 1, (7, 9), -1.0);
        for row in (0..7).step_by(3) {
            for col in (0..9).step_by(4) {
                let origin = (row, col);
                let shape = (3usize.min(7 - row), 4usize.min(9 - col));
                let request = TileRequest::new(origin, shape, TileProperties::default())
                    .with_input("raster", full.window(origin, shape));
                mosaic.paste(origin, &plan.compute_tile(&request).unwrap());
            }
        }
        assert_eq!(mosaic, whole);
    }

    proptest! {
        #[test]
        fn prop_equal_bands_give_zero(value in 1u16..u16::MAX) {
            let out = plan("Raw").compute_tile(&uniform(value as f64)).unwrap();
            prop_assert!(out.bands[0].iter().all(|&v| v == 0.0));
        }

        #[test]
        fn prop_opposite_bands_are_non_finite(value in 1i16..i16::MAX) {
            let v = value as f64;
            let out = plan("Raw")
                .compute_tile(&tile(Array2::from_elem((2, 2), -v), Array2::from_elem((2, 2), v)))
                .unwrap();
            prop_assert!(out.bands[0].iter().all(|v| !v.is_finite()));
        }

        #[test]
        fn prop_scaled_index_stays_in_range(red in 0u16..u16::MAX, ir in 0u16..u16::MAX) {
            prop_assume!(red as u32 + ir as u32 > 0);
            let out = plan("Grayscale")
                .compute_tile(&tile(Array2::from_elem((1, 1), red as f64), Array2::from_elem((1, 1), ir as f64)))
                .unwrap();
            let v = out.bands[0][[0, 0]];
            prop_assert!((0.0..=200.0).contains(&v));
        }
    }
}
