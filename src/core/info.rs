//! Run configuration and declared output metadata.
//!
//! Both are produced once per run, before the first tile, and are read-only
//! afterwards.

use crate::core::error::ConfigurationError;
use crate::core::raster::{PixelBlock, RasterInfo};
use crate::core::types::PixelType;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Raster properties the output inherits from the primary input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InheritFlags(pub u8);

impl InheritFlags {
    pub const NONE: Self = Self(0);
    pub const PIXEL_TYPE: Self = Self(1);
    pub const NO_DATA: Self = Self(2);
    pub const DIMENSIONS: Self = Self(4);
    pub const RESAMPLING: Self = Self(8);
    pub const ALL: Self = Self(1 | 2 | 4 | 8);

    /// Whether every flag in `other` is set.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bitmask.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for InheritFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Properties of the parent dataset the output invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvalidateFlags(pub u8);

impl InvalidateFlags {
    pub const NONE: Self = Self(0);
    pub const XFORM: Self = Self(1);
    pub const STATISTICS: Self = Self(2);
    pub const HISTOGRAM: Self = Self(4);
    pub const KEY_PROPERTIES: Self = Self(8);

    /// Whether every flag in `other` is set.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bitmask.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for InvalidateFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Configuration derived once per run from the scalar parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Zero-based bands to extract from the primary raster, in order.
    /// `None` delivers every band.
    pub extract_bands: Option<Vec<usize>>,
    /// Whether multiple input rasters are composited into one block
    pub composite_rasters: bool,
    /// Properties inherited from the primary input
    pub inherit_properties: InheritFlags,
    /// Properties invalidated on the output
    pub invalidate_properties: InvalidateFlags,
    /// Whether tiles need the input validity mask
    pub input_mask: bool,
    /// Raster parameters whose pixel blocks are read per tile
    pub input_rasters: Vec<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            extract_bands: None,
            composite_rasters: false,
            inherit_properties: InheritFlags::ALL,
            invalidate_properties: InvalidateFlags::NONE,
            input_mask: false,
            input_rasters: Vec::new(),
        }
    }
}

impl Configuration {
    /// Check band extraction against the primary raster.
    pub fn validate_bands(&self, primary: &RasterInfo) -> Result<(), ConfigurationError> {
        if let Some(bands) = &self.extract_bands {
            if let Some(&band) = bands.iter().find(|&&b| b >= primary.band_count) {
                return Err(ConfigurationError::BandOutOfRange {
                    band: band + 1,
                    band_count: primary.band_count,
                });
            }
        }
        Ok(())
    }

    /// Apply band extraction to a block read from the primary raster.
    ///
    /// Returns `None` if an extracted band is missing from the block.
    pub fn extract(&self, block: &PixelBlock) -> Option<PixelBlock> {
        match &self.extract_bands {
            None => Some(block.clone()),
            Some(bands) => {
                let bands = bands
                    .iter()
                    .map(|&i| block.band(i).cloned())
                    .collect::<Option<Vec<_>>>()?;
                Some(PixelBlock {
                    pixel_type: block.pixel_type,
                    bands,
                })
            }
        }
    }
}

/// Minimum and maximum of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandStatistics {
    pub minimum: f64,
    pub maximum: f64,
}

/// Histogram of one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub minimum: f64,
    pub maximum: f64,
    pub counts: Vec<u64>,
}

/// Palette for 8-bit single-band output: four parallel 256-entry sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colormap {
    pub values: Vec<i32>,
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

impl Colormap {
    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the palette has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Color for a palette index.
    pub fn rgb(&self, index: usize) -> Option<(u8, u8, u8)> {
        Some((
            *self.red.get(index)?,
            *self.green.get(index)?,
            *self.blue.get(index)?,
        ))
    }
}

/// Output raster properties declared once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputInfo {
    /// Number of output bands (always positive)
    pub band_count: usize,
    /// Pixel type of the output
    pub pixel_type: PixelType,
    /// Known statistics per band; empty when unknown
    pub statistics: Vec<BandStatistics>,
    /// Known histograms; empty when unknown
    pub histogram: Vec<Histogram>,
    /// Palette, only for 8-bit unsigned output
    pub colormap: Option<Colormap>,
}

impl OutputInfo {
    /// Declare an output with unknown statistics, histogram and colormap.
    pub fn new(band_count: usize, pixel_type: PixelType) -> Self {
        Self {
            band_count,
            pixel_type,
            statistics: Vec::new(),
            histogram: Vec::new(),
            colormap: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_flags() {
        let inherit = InheritFlags::DIMENSIONS | InheritFlags::RESAMPLING;
        assert_eq!(inherit.bits(), 12);
        assert!(!inherit.contains(InheritFlags::PIXEL_TYPE));
        assert!(InheritFlags::ALL.contains(inherit));

        let invalidate = InvalidateFlags::STATISTICS | InvalidateFlags::HISTOGRAM;
        assert_eq!(invalidate.bits(), 6);
    }

    #[test]
    fn test_validate_bands() {
        let config = Configuration {
            extract_bands: Some(vec![0, 3]),
            ..Configuration::default()
        };
        assert!(config.validate_bands(&RasterInfo::new(4, PixelType::U16)).is_ok());
        assert_eq!(
            config.validate_bands(&RasterInfo::new(3, PixelType::U16)),
            Err(ConfigurationError::BandOutOfRange { band: 4, band_count: 3 })
        );
    }

    #[test]
    fn test_extract_reorders_bands() {
        let block = PixelBlock::new(
            PixelType::F32,
            vec![array![[1.0]], array![[2.0]], array![[3.0]]],
        )
        .unwrap();
        let config = Configuration {
            extract_bands: Some(vec![2, 0]),
            ..Configuration::default()
        };
        let extracted = config.extract(&block).unwrap();
        assert_eq!(extracted.bands, vec![array![[3.0]], array![[1.0]]]);

        let config = Configuration {
            extract_bands: Some(vec![5]),
            ..Configuration::default()
        };
        assert!(config.extract(&block).is_none());
    }

    #[test]
    fn test_flags_serialize_as_bitmask() {
        let json = serde_json::to_string(&(InheritFlags::NO_DATA | InheritFlags::DIMENSIONS)).unwrap();
        assert_eq!(json, "6");
    }
}
