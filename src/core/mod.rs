//! Core types and traits for rasterfn.
//!
//! This module contains the foundational types shared by every raster
//! function:
//! - Scalar values, parameter types and pixel types
//! - Parameter declarations
//! - Pixel blocks and raster descriptions
//! - Configuration and output metadata
//! - The RasterFunction trait and run preparation
//! - Error types

pub mod types;
pub mod port;
pub mod error;
pub mod context;
pub mod raster;
pub mod info;
pub mod node;
pub mod plan;

// Re-export commonly used types
pub use types::{Value, ParamType, PixelType, Extent, SpatialReference};
pub use port::ParameterSpec;
pub use error::{RasterFnError, ConfigurationError, TileError, ConnectorError};
pub use context::{KeyMetadata, ScalarParams, TileRequest};
pub use raster::{PixelBlock, RasterInfo, RasterInfoSet, TileProperties};
pub use info::{Configuration, OutputInfo, Colormap, InheritFlags, InvalidateFlags};
pub use node::{RasterFunction, TileKernel, FunctionMetadata, Negotiation, Category};
pub use plan::{prepare, RunPlan};
