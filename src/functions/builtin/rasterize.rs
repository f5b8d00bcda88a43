//! Rasterization of zonal attributes into extra bands.
//!
//! The output keeps the value raster as band 0 and adds one band per
//! requested attribute. Each pixel takes the attribute values of its zone,
//! read from the zone raster, or of the default zone when no zone raster is
//! configured.

use crate::core::context::{ScalarParams, TileRequest};
use crate::core::error::{ConfigurationError, TileError};
use crate::core::info::{Configuration, InheritFlags, InvalidateFlags, OutputInfo};
use crate::core::node::{Category, FunctionMetadata, Negotiation, RasterFunction, TileKernel};
use crate::core::port::ParameterSpec;
use crate::core::raster::{PixelBlock, RasterInfoSet};
use crate::core::types::{ParamType, PixelType, Value};
use crate::zonal::{
    parse_zone_map, AttributeRow, ConnectorFactory, DefaultConnectorFactory, ZonalSource, ZoneId,
    ZoneQuery, ZoneSelection,
};
use ndarray::{Array2, Zip};
use std::collections::BTreeSet;
use std::sync::Arc;

const VALUE_RASTER: &str = "vraster";
const ZONE_RASTER: &str = "zraster";

/// Adds bands derived from zonal attributes to a raster.
#[derive(Clone)]
pub struct RasterizeAttributes {
    connectors: Arc<dyn ConnectorFactory>,
}

impl RasterizeAttributes {
    /// Create the function with the default connectors.
    pub fn new() -> Self {
        Self::with_connector_factory(Arc::new(DefaultConnectorFactory::default()))
    }

    /// Create the function with custom connectors for table references.
    pub fn with_connector_factory(connectors: Arc<dyn ConnectorFactory>) -> Self {
        Self { connectors }
    }
}

impl Default for RasterizeAttributes {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterFunction for RasterizeAttributes {
    fn metadata(&self) -> FunctionMetadata {
        FunctionMetadata::builder("rasterize_attributes", "Rasterize Attributes")
            .category(Category::Rasterization)
            .description(
                "Enriches a raster with bands derived from attributes of an external table or a \
                 feature service. An optional zone raster and zone ID field enable region-based look-up",
            )
            .parameter(
                ParameterSpec::raster(VALUE_RASTER)
                    .required()
                    .with_display_name("Input Raster")
                    .with_description("The primary input raster"),
            )
            .parameter(
                ParameterSpec::raster(ZONE_RASTER)
                    .with_display_name("Zone Raster")
                    .with_description(
                        "Optional single-band raster whose pixels hold the zone ID used to look up attribute rows",
                    ),
            )
            .parameter(
                ParameterSpec::new("ztable", ParamType::String, Value::None)
                    .with_display_name("Zonal Attributes Table")
                    .with_description(
                        "A JSON zone map like {\"zoneId\": [[f1, f2, ...]]}, a path to a local table, \
                         or the URL of a feature service layer",
                    ),
            )
            .parameter(
                ParameterSpec::new("zid", ParamType::String, Value::None)
                    .with_display_name("Zone ID Field Name")
                    .with_description("Field holding the zone ID. Only used with a table path or URL"),
            )
            .parameter(
                ParameterSpec::new("attribs", ParamType::String, Value::None)
                    .with_display_name("Attribute Field Names")
                    .with_description("Comma-separated attribute fields; each becomes one output band"),
            )
            .parameter(
                ParameterSpec::new("background", ParamType::Numeric, Value::Integer(0))
                    .with_display_name("Background Value")
                    .with_description("Initial value of the attribute bands"),
            )
            .parameter(
                ParameterSpec::new("where", ParamType::String, Value::None)
                    .with_display_name("Where Clause")
                    .with_description("Additional query applied to the zonal attributes table"),
            )
            .tags(["zonal", "attributes", "feature service", "table"])
            .build()
    }

    fn derive_configuration(&self, params: &ScalarParams) -> Result<Configuration, ConfigurationError> {
        let mut input_rasters = vec![VALUE_RASTER.to_string()];
        if params.get_trimmed("zid").is_some() {
            input_rasters.push(ZONE_RASTER.to_string());
        }

        Ok(Configuration {
            extract_bands: None,
            composite_rasters: false,
            inherit_properties: InheritFlags::NO_DATA | InheritFlags::DIMENSIONS | InheritFlags::RESAMPLING,
            invalidate_properties: InvalidateFlags::STATISTICS
                | InvalidateFlags::HISTOGRAM
                | InvalidateFlags::KEY_PROPERTIES,
            input_mask: false,
            input_rasters,
        })
    }

    fn negotiate_output_info(
        &self,
        _inputs: &RasterInfoSet,
        params: &ScalarParams,
        config: &Configuration,
    ) -> Result<Negotiation, ConfigurationError> {
        let zid = params.get_trimmed("zid");
        let attributes: Vec<String> = params
            .get_string("attribs")
            .unwrap_or("")
            .split(',')
            .map(|name| name.trim().to_string())
            .collect();
        let table = params.get_trimmed("ztable").unwrap_or("{}");

        let source = match parse_zone_map(table) {
            Ok(map) => {
                log::debug!("rasterize_attributes: literal zone map with {} zone(s)", map.len());
                ZonalSource::Literal(Arc::new(map))
            }
            Err(reason) => {
                log::debug!("rasterize_attributes: '{}' is a table reference ({})", table, reason);
                let connector = self
                    .connectors
                    .create(table, zid, &attributes)
                    .map_err(|e| ConfigurationError::InvalidParameter {
                        parameter: "ztable".to_string(),
                        error: e.to_string(),
                    })?;
                ZonalSource::Connector(connector)
            }
        };

        let output_info = OutputInfo::new(1 + attributes.len(), PixelType::F32);

        Ok(Negotiation {
            output_info,
            kernel: Arc::new(RasterizeKernel {
                source,
                zoned: config.input_rasters.iter().any(|r| r == ZONE_RASTER),
                attribute_count: attributes.len(),
                background: params.get_float("background", 0.0)?,
                filter: params.get_trimmed("where").map(str::to_string),
            }),
        })
    }

    fn clone_box(&self) -> Box<dyn RasterFunction> {
        Box::new(self.clone())
    }
}

/// Per-tile rasterization state.
#[derive(Debug)]
struct RasterizeKernel {
    source: ZonalSource,
    zoned: bool,
    attribute_count: usize,
    background: f64,
    filter: Option<String>,
}

impl RasterizeKernel {
    /// Write one attribute row into the attribute bands, at every pixel when
    /// `mask` is `None`, else where the zone raster equals the zone's value.
    fn paint(&self, out: &mut PixelBlock, row: &AttributeRow, mask: Option<(&Array2<f64>, f64)>) {
        let pixel_type = out.pixel_type;
        for (band, value) in out.bands[1..].iter_mut().zip(row) {
            let Some(value) = value.map(|v| pixel_type.narrow(v)) else {
                continue;
            };
            match mask {
                None => band.fill(value),
                Some((zones, zone)) => Zip::from(band).and(zones).for_each(|o, &z| {
                    if z == zone {
                        *o = value;
                    }
                }),
            }
        }
    }
}

impl TileKernel for RasterizeKernel {
    fn compute_tile(&self, tile: &TileRequest) -> Result<PixelBlock, TileError> {
        let values = &tile.input_with_bands(VALUE_RASTER, 1)?.bands[0];
        let shape = values.dim();

        let zones = if self.zoned {
            let zones = &tile.input_with_bands(ZONE_RASTER, 1)?.bands[0];
            if zones.dim() != shape {
                return Err(TileError::ShapeMismatch {
                    expected: shape,
                    got: zones.dim(),
                });
            }
            Some(zones)
        } else {
            None
        };

        // Only zones present in the tile are ever looked up.
        let present: Option<BTreeSet<ZoneId>> =
            zones.map(|z| z.iter().filter_map(|&p| ZoneId::from_pixel(p)).collect());

        let mut out = PixelBlock::filled(PixelType::F32, 1 + self.attribute_count, shape, self.background);
        out.bands[0] = values.mapv(|v| PixelType::F32.narrow(v));

        if present.as_ref().is_some_and(BTreeSet::is_empty) {
            return Ok(out);
        }

        let attributes = self.source.resolve(&ZoneQuery {
            ids: present.clone().map_or(ZoneSelection::All, ZoneSelection::Ids),
            filter: self.filter.clone(),
            extent: tile.props.extent,
            spatial_reference: tile.props.spatial_reference.clone(),
        })?;

        match (zones, present) {
            (Some(zones), Some(present)) => {
                for zone in &present {
                    if let (Some(row), Some(value)) = (attributes.first_row(zone), zone.pixel_value()) {
                        self.paint(&mut out, row, Some((zones, value)));
                    }
                }
                log::trace!("rasterize_attributes: {} zone(s) in tile at {:?}", present.len(), tile.origin);
            }
            _ => {
                if let Some(row) = attributes.first_row(&ZoneId::DEFAULT) {
                    self.paint(&mut out, row, None);
                }
            }
        }

        Ok(out)
    }
}
