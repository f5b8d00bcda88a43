//! Pixel blocks and raster descriptions.
//!
//! A [`PixelBlock`] is the unit of data exchanged per tile: an ordered list
//! of 2-D bands sharing one shape. A [`RasterInfo`] describes a whole input
//! raster without any pixels, which is all configuration and negotiation
//! ever see.

use crate::core::info::{BandStatistics, Histogram};
use crate::core::types::{Extent, PixelType, SpatialReference};
use indexmap::IndexMap;
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

/// A multi-band block of pixels.
///
/// Values are stored as `f64` and are always within the domain of
/// `pixel_type` (see [`PixelType::narrow`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelBlock {
    /// Pixel type of every band
    pub pixel_type: PixelType,
    /// Bands in order, each `rows x cols`
    pub bands: Vec<Array2<f64>>,
}

impl PixelBlock {
    /// Create a block from bands, narrowing every value to `pixel_type`.
    ///
    /// Returns `None` if the bands do not share one shape.
    pub fn new(pixel_type: PixelType, mut bands: Vec<Array2<f64>>) -> Option<Self> {
        if let Some(first) = bands.first() {
            let dim = first.dim();
            if bands.iter().any(|b| b.dim() != dim) {
                return None;
            }
        }
        for band in &mut bands {
            band.mapv_inplace(|v| pixel_type.narrow(v));
        }
        Some(Self { pixel_type, bands })
    }

    /// Create a block of `band_count` bands filled with one value.
    pub fn filled(pixel_type: PixelType, band_count: usize, shape: (usize, usize), value: f64) -> Self {
        let value = pixel_type.narrow(value);
        Self {
            pixel_type,
            bands: (0..band_count).map(|_| Array2::from_elem(shape, value)).collect(),
        }
    }

    /// Number of bands.
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Shape `(rows, cols)` shared by all bands; `(0, 0)` for a block without bands.
    pub fn shape(&self) -> (usize, usize) {
        self.bands.first().map(|b| b.dim()).unwrap_or((0, 0))
    }

    /// Get a band by zero-based index.
    pub fn band(&self, index: usize) -> Option<&Array2<f64>> {
        self.bands.get(index)
    }

    /// Copy a rectangular window out of every band.
    ///
    /// `origin` is `(row, col)` of the window's top-left pixel. The window is
    /// clipped to the block.
    pub fn window(&self, origin: (usize, usize), shape: (usize, usize)) -> PixelBlock {
        let (rows, cols) = self.shape();
        let r0 = origin.0.min(rows);
        let c0 = origin.1.min(cols);
        let r1 = (origin.0 + shape.0).min(rows);
        let c1 = (origin.1 + shape.1).min(cols);
        PixelBlock {
            pixel_type: self.pixel_type,
            bands: self
                .bands
                .iter()
                .map(|b| b.slice(s![r0..r1, c0..c1]).to_owned())
                .collect(),
        }
    }

    /// Write another block's bands into this block at `origin`.
    ///
    /// Used by hosts to mosaic tile results; values outside this block are
    /// dropped.
    pub fn paste(&mut self, origin: (usize, usize), tile: &PixelBlock) {
        let (rows, cols) = self.shape();
        let (tile_rows, tile_cols) = tile.shape();
        let r1 = (origin.0 + tile_rows).min(rows);
        let c1 = (origin.1 + tile_cols).min(cols);
        if origin.0 >= r1 || origin.1 >= c1 {
            return;
        }
        for (dst, src) in self.bands.iter_mut().zip(&tile.bands) {
            dst.slice_mut(s![origin.0..r1, origin.1..c1])
                .assign(&src.slice(s![..r1 - origin.0, ..c1 - origin.1]));
        }
    }
}

/// Properties of the tile being processed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileProperties {
    /// Pixel type the host expects back
    pub pixel_type: PixelType,
    /// Extent of the tile
    pub extent: Extent,
    /// Spatial reference of the tile
    pub spatial_reference: SpatialReference,
    /// Validity mask, when the function asked for one
    pub mask: Option<Array2<bool>>,
}

/// Description of a whole input raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterInfo {
    /// Number of bands
    pub band_count: usize,
    /// Pixel type of the bands
    #[serde(default)]
    pub pixel_type: PixelType,
    /// Full extent
    #[serde(default)]
    pub extent: Extent,
    /// Spatial reference
    #[serde(default)]
    pub spatial_reference: SpatialReference,
    /// Known per-band statistics
    #[serde(default)]
    pub statistics: Vec<BandStatistics>,
    /// Known per-band histograms
    #[serde(default)]
    pub histogram: Vec<Histogram>,
}

impl RasterInfo {
    /// Describe a raster by band count and pixel type.
    pub fn new(band_count: usize, pixel_type: PixelType) -> Self {
        Self {
            band_count,
            pixel_type,
            extent: Extent::default(),
            spatial_reference: SpatialReference::default(),
            statistics: Vec::new(),
            histogram: Vec::new(),
        }
    }
}

/// Input rasters keyed by raster parameter name, in declaration order.
pub type RasterInfoSet = IndexMap<String, RasterInfo>;
