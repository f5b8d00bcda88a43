//! Built-in raster functions.

mod colormap;
mod ndvi;
mod rasterize;

use crate::functions::registry::FunctionRegistry;

/// Register all built-in functions.
pub fn register_all(registry: &mut FunctionRegistry) {
    registry.register(|| Box::new(Ndvi));
    registry.register(|| Box::new(RasterizeAttributes::new()));
}

// Re-export for direct access
pub use colormap::vegetation_ramp;
pub use ndvi::Ndvi;
pub use rasterize::RasterizeAttributes;
