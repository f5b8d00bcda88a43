//! Raster functions.
//!
//! Contains the function registry and the built-in function implementations.

pub mod registry;
pub mod builtin;

pub use registry::{FunctionRegistry, FunctionFactory, RegistryBuilder};
